//! Promotes the people listed in `LEADERS_FILE` to the `leader` role.
//!
//! The file is a JSON array: `[{"name": "Jane Doe", "emails": ["jane@example.com"]}]`.

use anyhow::Context;
use firestore_admin_tools::{config::AdminConfig, services, utils::logger};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    logger::init();

    let config = AdminConfig::from_env();
    let leaders = services::load_leader_targets(&config.leaders_file)
        .await
        .with_context(|| format!("loading {}", config.leaders_file.display()))?;

    let Some(db) = services::open_session(&config).await else {
        return Ok(());
    };

    let report = services::update_leader_roles(&db, &leaders).await;
    println!();
    println!("{}", report);

    Ok(())
}
