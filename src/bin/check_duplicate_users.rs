//! Checks the `users` collection for documents that share an email.
//!
//! ```bash
//! cargo run --bin check_duplicate_users
//! ```

use firestore_admin_tools::{config::AdminConfig, services, utils::logger};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    logger::init();

    let config = AdminConfig::from_env();
    let Some(db) = services::open_session(&config).await else {
        return Ok(());
    };

    let report = services::scan_duplicate_users(&db).await?;
    println!();
    println!("{}", report);

    Ok(())
}
