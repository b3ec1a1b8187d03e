pub mod allow_check_service;
pub mod credentials_service;
pub mod duplicate_scan_service;
pub mod role_update_service;

pub use allow_check_service::*;
pub use credentials_service::{initialize_firestore, open_session, REMEDIATION};
pub use duplicate_scan_service::*;
pub use role_update_service::*;
