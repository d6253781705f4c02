use recipe_api::infra::config;
use recipe_api::{AppConfig, AppError, PgStore, UserService};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn usage_and_exit() -> ! {
    eprintln!(
        "Usage: cargo run --bin create_superuser -- <email> <password>\n\
         \n\
         The email and password may instead come from\n\
           SUPERUSER_EMAIL, SUPERUSER_PASSWORD\n\
         Requires env vars:\n\
           DATABASE_URL\n"
    );
    std::process::exit(2);
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.iter().any(|a| a == "-h" || a == "--help") {
        usage_and_exit();
    }

    let email = args
        .first()
        .cloned()
        .or_else(|| std::env::var("SUPERUSER_EMAIL").ok());
    let password = args
        .get(1)
        .cloned()
        .or_else(|| std::env::var("SUPERUSER_PASSWORD").ok());
    let Some(password) = password else {
        usage_and_exit();
    };

    let store =
        PgStore::connect(&config::database_url(), config::database_max_connections()).await?;
    let users = UserService::new(Arc::new(store), &AppConfig::from_env());

    match users.create_superuser(email.as_deref(), &password).await {
        Ok(user) => {
            println!("> Superuser created: id={} email={}", user.id, user.email);
            Ok(())
        }
        Err(AppError::Validation(errors)) => {
            eprintln!("> Could not create superuser: {}", errors);
            std::process::exit(1);
        }
        Err(e) => Err(e.into()),
    }
}
