//! Creates (or merges into) the test user document with the `leader` role.
//!
//! Set `TEST_USER_EMAIL` / `TEST_USER_DISPLAY_NAME` to change the user.

use firestore_admin_tools::{config::AdminConfig, seeds, services, utils::logger};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    logger::init();

    let config = AdminConfig::from_env();
    let Some(db) = services::open_session(&config).await else {
        return Ok(());
    };

    match seeds::seed_test_user(&db, &config.test_user_display_name, &config.test_user_email).await {
        Ok(report) => {
            println!();
            println!("{}", report);
        }
        Err(e) => println!("\n❌ Error creating test user: {}", e),
    }

    Ok(())
}
