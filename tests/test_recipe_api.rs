//! Tags, ingredients and recipes over HTTP.

mod common;

use common::{png_bytes, TestResult, TestServer};
use reqwest::Method;
use serde_json::{json, Value};

fn ids(list: &Value) -> Vec<i64> {
    list.as_array()
        .map(|items| items.iter().filter_map(|i| i["id"].as_i64()).collect())
        .unwrap_or_default()
}

fn names(list: &Value) -> Vec<String> {
    list.as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|i| i["name"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

async fn create(
    server: &TestServer,
    token: &str,
    path: &str,
    body: Value,
) -> Result<i64, Box<dyn std::error::Error>> {
    let (status, body) = server.post(token, path, body).await?;
    assert_eq!(status, 201, "create on {path} failed: {body}");
    Ok(body["data"]["id"].as_i64().ok_or("id missing")?)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_recipe_endpoints_require_auth() -> TestResult {
    let server = TestServer::start().await?;
    for path in ["/api/recipe/tags", "/api/recipe/ingredients", "/api/recipe/recipes"] {
        let resp = server.client.get(server.url(path)).send().await?;
        assert_eq!(resp.status(), 401, "{path}");
    }
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_tags_are_private_and_sorted() -> TestResult {
    let server = TestServer::start().await?;
    let alice = server.signup_and_login("alice@x.com", "pw123").await?;
    let bob = server.signup_and_login("bob@x.com", "pw123").await?;

    create(&server, &alice, "/api/recipe/tags", json!({"name": "Vegan"})).await?;
    create(&server, &alice, "/api/recipe/tags", json!({"name": "Dessert"})).await?;
    let bobs = create(&server, &bob, "/api/recipe/tags", json!({"name": "Vegan"})).await?;

    let (status, body) = server.get(&alice, "/api/recipe/tags").await?;
    assert_eq!(status, 200);
    assert_eq!(names(&body["data"]), vec!["Vegan", "Dessert"]);

    let (_, body) = server.get(&bob, "/api/recipe/tags").await?;
    assert_eq!(ids(&body["data"]), vec![bobs]);

    let (status, body) = server.post(&alice, "/api/recipe/tags", json!({"name": ""})).await?;
    assert_eq!(status, 400);
    assert!(body["data"]["errors"]["name"].is_array());

    let long = "x".repeat(256);
    let (status, _) = server.post(&alice, "/api/recipe/ingredients", json!({"name": long})).await?;
    assert_eq!(status, 400);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_ingredients_are_private() -> TestResult {
    let server = TestServer::start().await?;
    let alice = server.signup_and_login("alice@x.com", "pw123").await?;
    let bob = server.signup_and_login("bob@x.com", "pw123").await?;

    let path = "/api/recipe/ingredients";
    create(&server, &alice, path, json!({"name": "Kale"})).await?;
    create(&server, &alice, path, json!({"name": "Salt"})).await?;
    let bobs = create(&server, &bob, path, json!({"name": "Vinegar"})).await?;

    let (status, body) = server.get(&alice, path).await?;
    assert_eq!(status, 200);
    assert_eq!(names(&body["data"]), vec!["Salt", "Kale"]);

    let (status, body) = server.get(&bob, path).await?;
    assert_eq!(status, 200);
    assert_eq!(body["data"], json!([{"id": bobs, "name": "Vinegar"}]));
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_assigned_only_tags() -> TestResult {
    let server = TestServer::start().await?;
    let token = server.signup_and_login("cook@x.com", "pw123").await?;

    let path = "/api/recipe/tags";
    let breakfast = create(&server, &token, path, json!({"name": "Breakfast"})).await?;
    let lunch = create(&server, &token, path, json!({"name": "Lunch"})).await?;
    create(
        &server,
        &token,
        "/api/recipe/recipes",
        json!({"title": "Apple crumble", "time_minutes": 5, "price": "10.00", "tags": [breakfast]}),
    )
    .await?;

    let (status, assigned) = server.get(&token, "/api/recipe/tags?assigned_only=1").await?;
    assert_eq!(status, 200);
    assert_eq!(ids(&assigned["data"]), vec![breakfast]);

    let (_, unfiltered) = server.get(&token, "/api/recipe/tags?assigned_only=0").await?;
    assert_eq!(ids(&unfiltered["data"]), vec![lunch, breakfast]);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_assigned_only_lists_each_used_entry_once() -> TestResult {
    let server = TestServer::start().await?;
    let token = server.signup_and_login("cook@x.com", "pw123").await?;

    let eggs = create(&server, &token, "/api/recipe/ingredients", json!({"name": "Eggs"})).await?;
    create(&server, &token, "/api/recipe/ingredients", json!({"name": "Cheese"})).await?;

    for title in ["Eggs Benedict", "Coriander eggs on toast"] {
        create(
            &server,
            &token,
            "/api/recipe/recipes",
            json!({"title": title, "time_minutes": 30, "price": "12.00", "ingredients": [eggs]}),
        )
        .await?;
    }

    let (_, all) = server.get(&token, "/api/recipe/ingredients").await?;
    assert_eq!(names(&all["data"]), vec!["Eggs", "Cheese"]);

    let (status, assigned) = server
        .get(&token, "/api/recipe/ingredients?assigned_only=1")
        .await?;
    assert_eq!(status, 200);
    assert_eq!(ids(&assigned["data"]), vec![eggs]);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_pizza_detail_has_no_relations() -> TestResult {
    let server = TestServer::start().await?;
    let token = server.signup_and_login("a@x.com", "pw123").await?;

    let id = create(
        &server,
        &token,
        "/api/recipe/recipes",
        json!({"title": "Pizza", "time_minutes": 5, "price": 5.00}),
    )
    .await?;

    let (status, body) = server.get(&token, &format!("/api/recipe/recipes/{id}")).await?;
    assert_eq!(status, 200);
    let detail = &body["data"];
    assert_eq!(detail["title"], "Pizza");
    assert_eq!(detail["time_minutes"], 5);
    assert_eq!(detail["price"], "5.00");
    assert_eq!(detail["link"], "");
    assert_eq!(detail["tags"], json!([]));
    assert_eq!(detail["ingredients"], json!([]));
    assert!(detail["image"].is_null());
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_recipe_detail_expands_relations() -> TestResult {
    let server = TestServer::start().await?;
    let token = server.signup_and_login("a@x.com", "pw123").await?;

    let tag = create(&server, &token, "/api/recipe/tags", json!({"name": "Dinner"})).await?;
    let ing = create(&server, &token, "/api/recipe/ingredients", json!({"name": "Salt"})).await?;
    let id = create(
        &server,
        &token,
        "/api/recipe/recipes",
        json!({
            "title": "Steak",
            "time_minutes": 20,
            "price": "9.50",
            "tags": [tag],
            "ingredients": [ing],
        }),
    )
    .await?;

    let (_, list) = server.get(&token, "/api/recipe/recipes").await?;
    assert_eq!(list["data"][0]["tags"], json!([tag]));

    let (_, body) = server.get(&token, &format!("/api/recipe/recipes/{id}")).await?;
    assert_eq!(body["data"]["tags"], json!([{"id": tag, "name": "Dinner"}]));
    assert_eq!(body["data"]["ingredients"], json!([{"id": ing, "name": "Salt"}]));
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_recipe_validation() -> TestResult {
    let server = TestServer::start().await?;
    let alice = server.signup_and_login("alice@x.com", "pw123").await?;
    let bob = server.signup_and_login("bob@x.com", "pw123").await?;
    let bobs_tag = create(&server, &bob, "/api/recipe/tags", json!({"name": "Bob"})).await?;

    let (status, body) = server
        .post(&alice, "/api/recipe/recipes", json!({"title": "Soup"}))
        .await?;
    assert_eq!(status, 400);
    assert!(body["data"]["errors"]["time_minutes"].is_array());
    assert!(body["data"]["errors"]["price"].is_array());

    let (status, body) = server
        .post(
            &alice,
            "/api/recipe/recipes",
            json!({"title": "Soup", "time_minutes": 5, "price": "123456"}),
        )
        .await?;
    assert_eq!(status, 400);
    assert!(body["data"]["errors"]["price"].is_array());

    let (status, body) = server
        .post(
            &alice,
            "/api/recipe/recipes",
            json!({"title": "Soup", "time_minutes": 5, "price": "1.00", "tags": [bobs_tag]}),
        )
        .await?;
    assert_eq!(status, 400);
    assert_eq!(
        body["data"]["errors"]["tags"][0],
        format!("Invalid pk \"{bobs_tag}\" - object does not exist.")
    );
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_recipes_are_private() -> TestResult {
    let server = TestServer::start().await?;
    let alice = server.signup_and_login("alice@x.com", "pw123").await?;
    let bob = server.signup_and_login("bob@x.com", "pw123").await?;

    let recipe = |title: &str| json!({"title": title, "time_minutes": 1, "price": 1});
    let first = create(&server, &alice, "/api/recipe/recipes", recipe("A")).await?;
    let second = create(&server, &alice, "/api/recipe/recipes", recipe("B")).await?;
    create(&server, &bob, "/api/recipe/recipes", recipe("C")).await?;

    let (_, body) = server.get(&alice, "/api/recipe/recipes").await?;
    assert_eq!(ids(&body["data"]), vec![second, first]);

    let (status, body) = server.get(&bob, &format!("/api/recipe/recipes/{first}")).await?;
    assert_eq!(status, 404);
    assert_eq!(body["success"], false);

    let path = format!("/api/recipe/recipes/{first}");
    let (status, _) = server
        .send_json(Method::PATCH, &bob, &path, json!({"title": "Mine"}))
        .await?;
    assert_eq!(status, 404);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_unparsable_recipe_id_is_not_found() -> TestResult {
    let server = TestServer::start().await?;
    let token = server.signup_and_login("a@x.com", "pw123").await?;

    for id in ["abc", "99999999999999999999", "1.5"] {
        let path = format!("/api/recipe/recipes/{id}");
        let (status, body) = server.get(&token, &path).await?;
        assert_eq!(status, 404, "{path}");
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Not found");

        let (status, body) = server
            .send_json(Method::PATCH, &token, &path, json!({"title": "x"}))
            .await?;
        assert_eq!(status, 404, "{path}");
        assert_eq!(body["success"], false);
    }

    let (status, body) = server
        .post(&token, "/api/recipe/recipes/abc/upload-image", json!({}))
        .await?;
    assert_eq!(status, 404);
    assert_eq!(body["success"], false);

    // Authentication is still checked first.
    let resp = server.client.get(server.url("/api/recipe/recipes/abc")).send().await?;
    assert_eq!(resp.status(), 401);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_put_clears_relations_patch_keeps_them() -> TestResult {
    let server = TestServer::start().await?;
    let token = server.signup_and_login("a@x.com", "pw123").await?;

    let curry = create(&server, &token, "/api/recipe/tags", json!({"name": "Curry"})).await?;
    let spicy = create(&server, &token, "/api/recipe/tags", json!({"name": "Spicy"})).await?;
    let id = create(
        &server,
        &token,
        "/api/recipe/recipes",
        json!({
            "title": "Chicken tikka",
            "time_minutes": 45,
            "price": "7.00",
            "tags": [curry],
            "link": "https://x.com/tikka",
        }),
    )
    .await?;
    let path = format!("/api/recipe/recipes/{id}");

    let (status, body) = server
        .send_json(Method::PATCH, &token, &path, json!({"title": "Chicken curry", "tags": [spicy]}))
        .await?;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["title"], "Chicken curry");
    assert_eq!(body["data"]["tags"], json!([spicy]));
    assert_eq!(body["data"]["link"], "https://x.com/tikka");

    let (status, body) = server
        .send_json(Method::PATCH, &token, &path, json!({"time_minutes": 50}))
        .await?;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["tags"], json!([spicy]));

    let (status, body) = server
        .send_json(
            Method::PUT,
            &token,
            &path,
            json!({"title": "Spaghetti carbonara", "time_minutes": 25, "price": "5.00"}),
        )
        .await?;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["tags"], json!([]));
    assert_eq!(body["data"]["link"], "");

    let (status, _) = server
        .send_json(Method::PUT, &token, &path, json!({"title": "Only a title"}))
        .await?;
    assert_eq!(status, 400);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_filters_combine_with_and() -> TestResult {
    let server = TestServer::start().await?;
    let token = server.signup_and_login("a@x.com", "pw123").await?;

    let vegan = create(&server, &token, "/api/recipe/tags", json!({"name": "Vegan"})).await?;
    let veggie = create(&server, &token, "/api/recipe/tags", json!({"name": "Vegetarian"})).await?;
    let feta = create(&server, &token, "/api/recipe/ingredients", json!({"name": "Feta"})).await?;

    let curry = create(
        &server,
        &token,
        "/api/recipe/recipes",
        json!({"title": "Thai curry", "time_minutes": 20, "price": "5.00", "tags": [vegan]}),
    )
    .await?;
    let tahini = create(
        &server,
        &token,
        "/api/recipe/recipes",
        json!({
            "title": "Aubergine",
            "time_minutes": 20,
            "price": "5.00",
            "tags": [veggie],
            "ingredients": [feta],
        }),
    )
    .await?;
    let fish = create(
        &server,
        &token,
        "/api/recipe/recipes",
        json!({"title": "Fish and chips", "time_minutes": 20, "price": "5.00"}),
    )
    .await?;

    let (_, body) = server
        .get(&token, &format!("/api/recipe/recipes?tags={vegan},{veggie}"))
        .await?;
    assert_eq!(ids(&body["data"]), vec![tahini, curry]);

    let (_, body) = server
        .get(&token, &format!("/api/recipe/recipes?tags={vegan},{veggie}&ingredients={feta}"))
        .await?;
    assert_eq!(ids(&body["data"]), vec![tahini]);

    let (_, body) = server.get(&token, "/api/recipe/recipes?tags=").await?;
    assert_eq!(ids(&body["data"]), vec![fish, tahini, curry]);

    let (status, body) = server.get(&token, "/api/recipe/recipes?tags=abc").await?;
    assert_eq!(status, 400);
    assert!(body["data"]["errors"]["tags"].is_array());
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_upload_image() -> TestResult {
    let server = TestServer::start().await?;
    let token = server.signup_and_login("a@x.com", "pw123").await?;
    let id = create(
        &server,
        &token,
        "/api/recipe/recipes",
        json!({"title": "Pizza", "time_minutes": 5, "price": "5.00"}),
    )
    .await?;
    let path = format!("/api/recipe/recipes/{id}/upload-image");

    // Non-image bytes are refused and nothing is written.
    let form = reqwest::multipart::Form::new().part(
        "image",
        reqwest::multipart::Part::bytes(b"notimage".to_vec()).file_name("image.jpg"),
    );
    let resp = server
        .client
        .post(server.url(&path))
        .bearer_auth(&token)
        .multipart(form)
        .send()
        .await?;
    assert_eq!(resp.status(), 400);
    let body = resp.json::<Value>().await?;
    assert!(body["data"]["errors"]["image"].is_array());
    assert_eq!(server.media_file_count(), 0);

    // Missing field.
    let form = reqwest::multipart::Form::new().text("other", "x");
    let resp = server
        .client
        .post(server.url(&path))
        .bearer_auth(&token)
        .multipart(form)
        .send()
        .await?;
    assert_eq!(resp.status(), 400);

    // A real PNG is stored and linked.
    let form = reqwest::multipart::Form::new().part(
        "image",
        reqwest::multipart::Part::bytes(png_bytes()).file_name("pizza.png"),
    );
    let resp = server
        .client
        .post(server.url(&path))
        .bearer_auth(&token)
        .multipart(form)
        .send()
        .await?;
    assert_eq!(resp.status(), 200);
    let body = resp.json::<Value>().await?;
    assert_eq!(body["data"]["id"], id);
    let url = body["data"]["image"].as_str().ok_or("image url missing")?.to_string();
    assert!(url.starts_with("/media/uploads/recipe/"));
    assert!(url.ends_with(".png"));
    assert_eq!(server.media_file_count(), 1);

    // The stored file is served back.
    let served = server.client.get(server.url(&url)).send().await?;
    assert_eq!(served.status(), 200);
    assert_eq!(served.bytes().await?.to_vec(), png_bytes());

    let (_, detail) = server.get(&token, &format!("/api/recipe/recipes/{id}")).await?;
    assert_eq!(detail["data"]["image"], url.as_str());
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_upload_to_foreign_recipe_is_not_found() -> TestResult {
    let server = TestServer::start().await?;
    let alice = server.signup_and_login("alice@x.com", "pw123").await?;
    let bob = server.signup_and_login("bob@x.com", "pw123").await?;
    let id = create(
        &server,
        &alice,
        "/api/recipe/recipes",
        json!({"title": "Pizza", "time_minutes": 5, "price": "5.00"}),
    )
    .await?;

    let form = reqwest::multipart::Form::new().part(
        "image",
        reqwest::multipart::Part::bytes(png_bytes()).file_name("pizza.png"),
    );
    let resp = server
        .client
        .post(server.url(&format!("/api/recipe/recipes/{id}/upload-image")))
        .bearer_auth(&bob)
        .multipart(form)
        .send()
        .await?;
    assert_eq!(resp.status(), 404);
    assert_eq!(server.media_file_count(), 0);
    Ok(())
}
