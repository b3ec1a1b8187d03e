pub mod allowed_user;
pub mod leader;
pub mod user;

pub use allowed_user::*;
pub use leader::*;
pub use user::*;
