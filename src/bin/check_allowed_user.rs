//! Reports whether an email is on the allow-list.
//!
//! ```bash
//! cargo run --bin check_allowed_user -- someone@example.com
//! ```

use anyhow::bail;
use firestore_admin_tools::{config::AdminConfig, services, utils::logger};
use std::env;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    logger::init();

    let email = match env::args().nth(1).or_else(|| env::var("CHECK_EMAIL").ok()) {
        Some(email) if !email.trim().is_empty() => email,
        _ => bail!("Usage: check_allowed_user <email> (or set CHECK_EMAIL)"),
    };

    let config = AdminConfig::from_env();
    let Some(db) = services::open_session(&config).await else {
        return Ok(());
    };

    let report = services::check_allowed_email(&db, &email).await?;
    println!();
    println!("{}", report);

    Ok(())
}
