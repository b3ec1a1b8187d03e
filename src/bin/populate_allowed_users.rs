//! Loads the allow-list JSON file (`ALLOWED_USERS_FILE`) into `allowedUsers`.

use anyhow::Context;
use firestore_admin_tools::{config::AdminConfig, seeds, services, utils::logger};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    logger::init();

    let config = AdminConfig::from_env();
    let Some(db) = services::open_session(&config).await else {
        return Ok(());
    };

    let entries = seeds::load_allowed_users_file(&config.allowed_users_file)
        .await
        .with_context(|| format!("loading {}", config.allowed_users_file.display()))?;

    let report = seeds::populate_allowed_users(&db, entries).await;
    println!();
    println!("{}", report);

    Ok(())
}
