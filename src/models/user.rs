use crate::database::Document;
use crate::utils::error::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const USERS_COLLECTION: &str = "users";
pub const ROLE_LEADER: &str = "leader";

/// Profile fields of a `users/{uid}` document.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(rename = "photoURL", default)]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

impl UserProfile {
    /// Reads the profile fields, ignoring everything else on the document.
    pub fn from_document(document: &Document) -> Result<Self> {
        Ok(serde_json::from_value(Value::Object(document.fields.clone()))?)
    }
}

/// Diagnostic flags reported for each document of a duplicate group.
#[derive(Debug, Clone, PartialEq)]
pub struct UserDiagnostics {
    pub id: String,
    pub created: String,
    pub has_family_id: bool,
    pub has_gender: bool,
    pub prepopulated: bool,
    pub migrated: bool,
}

impl UserDiagnostics {
    pub fn from_document(document: &Document) -> Self {
        let created = match document.fields.get("createdAt") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => "Unknown".to_string(),
            Some(other) => other.to_string(),
        };

        Self {
            id: document.id.clone(),
            created,
            has_family_id: document.has_field("familyId"),
            has_gender: document.has_field("gender"),
            prepopulated: document.get_bool("prepopulated").unwrap_or(false),
            migrated: document.has_field("migratedFrom"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_diagnostics_flags() {
        let doc = Document::new(
            "uid-1",
            json!({
                "email": "j@x.com",
                "familyId": null,
                "prepopulated": true,
                "migratedFrom": "j_x_com",
                "createdAt": "2024-02-01T12:00:00Z"
            })
            .as_object()
            .cloned()
            .unwrap(),
        );

        let diag = UserDiagnostics::from_document(&doc);
        assert_eq!(diag.created, "2024-02-01T12:00:00Z");
        assert!(diag.has_family_id);
        assert!(!diag.has_gender);
        assert!(diag.prepopulated);
        assert!(diag.migrated);
    }

    #[test]
    fn test_diagnostics_defaults() {
        let doc = Document::new("uid-2", json!({ "prepopulated": "yes" }).as_object().cloned().unwrap());
        let diag = UserDiagnostics::from_document(&doc);
        assert_eq!(diag.created, "Unknown");
        assert!(!diag.prepopulated);
    }

    #[test]
    fn test_profile_from_document_ignores_other_fields() {
        let doc = Document::new(
            "uid-3",
            json!({
                "displayName": "Test",
                "email": "t@x.com",
                "photoURL": null,
                "role": "leader",
                "familyId": "fam-1",
                "lastLogin": "2024-02-01T12:00:00Z"
            })
            .as_object()
            .cloned()
            .unwrap(),
        );

        let profile = UserProfile::from_document(&doc).unwrap();
        assert_eq!(profile.display_name.as_deref(), Some("Test"));
        assert_eq!(profile.photo_url, None);
        assert_eq!(profile.role.as_deref(), Some(ROLE_LEADER));

        let partial = Document::new("uid-4", json!({ "email": "p@x.com" }).as_object().cloned().unwrap());
        assert_eq!(
            UserProfile::from_document(&partial).unwrap(),
            UserProfile { email: Some("p@x.com".to_string()), ..UserProfile::default() }
        );

        let mistyped = Document::new("uid-5", json!({ "role": 7 }).as_object().cloned().unwrap());
        assert!(UserProfile::from_document(&mistyped).is_err());
    }

    #[test]
    fn test_profile_serializes_null_photo() {
        let profile = UserProfile {
            display_name: Some("Test".to_string()),
            email: Some(String::new()),
            photo_url: None,
            role: Some(ROLE_LEADER.to_string()),
        };
        let value = serde_json::to_value(&profile).unwrap();
        assert_eq!(value["photoURL"], Value::Null);
        assert_eq!(value["displayName"], "Test");
    }
}
