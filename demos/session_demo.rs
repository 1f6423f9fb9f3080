//! Log in, call an authenticated endpoint, log out
//!
//! Usage:
//!   API_URL=http://localhost:8000/api USERNAME=alice PASSWORD=secret \
//!     cargo run --example session_demo

use serde_json::Value;
use session_rest_client::{session, ClientConfig, Credentials, FileTokenStore, RestClient};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = ClientConfig::from_env()?;
    let store_path =
        std::env::var("SESSION_FILE").unwrap_or_else(|_| "session.json".to_string());
    let username = std::env::var("USERNAME").unwrap_or_else(|_| "alice".to_string());
    let password = std::env::var("PASSWORD").unwrap_or_default();
    let resource = std::env::var("RESOURCE").unwrap_or_else(|_| "/widgets".to_string());

    println!("=== Session REST Client Example ===");
    println!("API URL: {}", config.api_url);
    println!("Session file: {}", store_path);
    println!();

    let store = FileTokenStore::open(&store_path)?;
    session::bootstrap(&store)?;
    let client = RestClient::new(config, store)?;

    if !session::is_logged_in(client.token_store()) {
        println!("Logging in as {}...", username);
        match session::login(&client, &Credentials::login(&username, &password)).await {
            Ok(grant) => {
                session::persist(client.token_store(), &grant)?;
                println!("✓ Successfully logged in!");
            }
            Err(e) => {
                println!("! {}", e.user_message());
                return Ok(());
            }
        }
    } else {
        println!(
            "✓ Reusing stored session for {}",
            session::current_username(client.token_store())
        );
    }
    println!();

    println!("Fetching {}...", resource);
    match client.get::<Value>(&resource, true).await {
        Ok(payload) => println!("✓ {}", payload),
        Err(e) if e.is_session_expired() => {
            println!("! {}", e.message);
            session::logout(client.token_store())?;
        }
        Err(e) => println!("! {}", e),
    }

    Ok(())
}
