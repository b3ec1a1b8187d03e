use crate::utils::email::{allowed_user_doc_id, normalize_email};
use serde::{Deserialize, Serialize};

pub const ALLOWED_USERS_COLLECTION: &str = "allowedUsers";

/// One element of the allow-list JSON file.
#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AllowedUserEntry {
    pub display_name: String,
    pub primary_email: String,
    pub alternative_emails: Vec<String>,
}

/// Fields stored in `allowedUsers/{doc_id}` (plus a server-side `createdAt`).
#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AllowedUserRecord {
    pub display_name: String,
    pub primary_email: String,
    pub alternative_emails: Vec<String>,
}

impl AllowedUserEntry {
    pub fn doc_id(&self) -> String {
        allowed_user_doc_id(&self.primary_email)
    }

    pub fn to_record(&self) -> AllowedUserRecord {
        AllowedUserRecord {
            display_name: self.display_name.clone(),
            primary_email: normalize_email(&self.primary_email),
            alternative_emails: self
                .alternative_emails
                .iter()
                .map(|email| normalize_email(email))
                .collect(),
        }
    }
}
