//! Shared harness: boots the real router on an ephemeral port.

#![allow(dead_code)]

use recipe_api::{transport, AppConfig, MemoryStore, Store};
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;

pub type TestResult = Result<(), Box<dyn std::error::Error>>;

pub struct TestServer {
    pub base_url: String,
    pub client: reqwest::Client,
    pub store: Arc<dyn Store>,
    pub media: TempDir,
    handle: tokio::task::JoinHandle<()>,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

impl TestServer {
    /// Starts a server backed by the in-memory store.
    pub async fn start() -> Result<Self, Box<dyn std::error::Error>> {
        Self::start_with(Arc::new(MemoryStore::new())).await
    }

    pub async fn start_with(store: Arc<dyn Store>) -> Result<Self, Box<dyn std::error::Error>> {
        let media = tempfile::tempdir()?;
        let state = transport::http::AppState::new(
            store.clone(),
            AppConfig::with_media_root(media.path()),
        );
        let router = transport::http::create_router(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let handle = tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;

        Ok(Self {
            base_url: format!("http://{}", addr),
            client,
            store,
            media,
            handle,
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Signs up `email` and returns a fresh token for it.
    pub async fn signup_and_login(
        &self,
        email: &str,
        password: &str,
    ) -> Result<String, Box<dyn std::error::Error>> {
        let created = self
            .client
            .post(self.url("/api/user/create"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;
        assert_eq!(created.status(), 201, "signup of {email} failed");

        self.login(email, password).await
    }

    pub async fn login(
        &self,
        email: &str,
        password: &str,
    ) -> Result<String, Box<dyn std::error::Error>> {
        let body = self
            .client
            .post(self.url("/api/user/token"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?
            .json::<Value>()
            .await?;
        Ok(body["data"]["token"]
            .as_str()
            .ok_or("token missing from response")?
            .to_string())
    }

    pub async fn get(
        &self,
        token: &str,
        path: &str,
    ) -> Result<(u16, Value), Box<dyn std::error::Error>> {
        let resp = self
            .client
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await?;
        let status = resp.status().as_u16();
        Ok((status, resp.json::<Value>().await.unwrap_or(Value::Null)))
    }

    pub async fn send_json(
        &self,
        method: reqwest::Method,
        token: &str,
        path: &str,
        body: Value,
    ) -> Result<(u16, Value), Box<dyn std::error::Error>> {
        let resp = self
            .client
            .request(method, self.url(path))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;
        let status = resp.status().as_u16();
        Ok((status, resp.json::<Value>().await.unwrap_or(Value::Null)))
    }

    pub async fn post(
        &self,
        token: &str,
        path: &str,
        body: Value,
    ) -> Result<(u16, Value), Box<dyn std::error::Error>> {
        self.send_json(reqwest::Method::POST, token, path, body).await
    }

    /// Number of files under the media root.
    pub fn media_file_count(&self) -> usize {
        fn walk(dir: &std::path::Path) -> usize {
            let Ok(entries) = std::fs::read_dir(dir) else {
                return 0;
            };
            entries
                .flatten()
                .map(|e| {
                    let path = e.path();
                    if path.is_dir() {
                        walk(&path)
                    } else {
                        1
                    }
                })
                .sum()
        }
        walk(self.media.path())
    }
}

/// A small valid PNG.
pub fn png_bytes() -> Vec<u8> {
    let img = image::RgbImage::from_pixel(8, 8, image::Rgb([200, 40, 40]));
    let mut buf = Vec::new();
    img.write_to(&mut std::io::Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}
