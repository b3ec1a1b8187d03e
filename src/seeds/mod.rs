pub mod allowed_users_seed;
pub mod test_user_seed;

pub use allowed_users_seed::*;
pub use test_user_seed::*;
