use crate::database::{value::to_fields, DocumentStore, Write};
use crate::models::{UserProfile, ROLE_LEADER, USERS_COLLECTION};
use crate::utils::email::generate_uid;
use crate::utils::error::Result;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct SeedReport {
    pub uid: String,
    pub requested: UserProfile,
    /// Profile read back after the write; `None` if the document was not found.
    pub verified: Option<UserProfile>,
}

/// Cria (ou atualiza via merge) o usuário de teste com role `leader`.
///
/// The document id is derived from the email, so re-running targets the same
/// document and only the fields written here change.
pub async fn seed_test_user<S>(db: &S, display_name: &str, email: &str) -> Result<SeedReport>
where
    S: DocumentStore + ?Sized,
{
    let uid = generate_uid(email);
    let requested = UserProfile {
        display_name: Some(display_name.to_string()),
        email: Some(email.to_string()),
        photo_url: None,
        role: Some(ROLE_LEADER.to_string()),
    };

    log::info!("📋 Creating test user...");
    log::info!("   UID: {}", uid);

    let write = Write {
        fields: to_fields(&requested)?,
        ..Write::merge(USERS_COLLECTION, &uid)
    }
    .server_timestamp("createdAt")
    .server_timestamp("lastLogin");
    db.apply(write).await?;
    log::info!("   ✅ Test user written: {}/{}", USERS_COLLECTION, uid);

    let verified = match db.get_document(USERS_COLLECTION, &uid).await? {
        Some(doc) => Some(UserProfile::from_document(&doc)?),
        None => None,
    };

    Ok(SeedReport { uid, requested, verified })
}

impl fmt::Display for SeedReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let show = |value: &Option<String>| value.clone().unwrap_or_else(|| "None".to_string());

        writeln!(f, "📋 Test user")?;
        writeln!(f, "   UID: {}", self.uid)?;
        writeln!(f, "   Display Name: {}", show(&self.requested.display_name))?;
        writeln!(f, "   Email: {}", show(&self.requested.email))?;
        writeln!(f, "   Role: {}", show(&self.requested.role))?;
        writeln!(f)?;
        writeln!(f, "✅ Successfully created test user with leader role!")?;
        writeln!(f, "   Document ID: {}", self.uid)?;
        writeln!(f)?;

        match &self.verified {
            Some(profile) => {
                writeln!(f, "✓ Verified: User document exists in Firestore")?;
                writeln!(f, "   - Display Name: {}", show(&profile.display_name))?;
                writeln!(f, "   - Email: {}", show(&profile.email))?;
                write!(f, "   - Role: {}", show(&profile.role))
            }
            None => write!(f, "⚠️  Verification failed: user document not found after write"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;
    use serde_json::json;

    #[tokio::test]
    async fn test_seed_creates_leader_with_stable_uid() {
        let store = MemoryStore::new();

        let report = seed_test_user(&store, "Test", "").await.unwrap();

        assert_eq!(report.uid, "e3b0c44298fc1c149afbf4c8996f");
        let verified = report.verified.clone().unwrap();
        assert_eq!(verified.display_name.as_deref(), Some("Test"));
        assert_eq!(verified.email.as_deref(), Some(""));
        assert_eq!(verified.role.as_deref(), Some("leader"));

        let doc = store.document("users", &report.uid).unwrap();
        assert_eq!(doc.fields.get("photoURL"), Some(&serde_json::Value::Null));
        assert!(doc.get_str("createdAt").is_some());
        assert!(doc.get_str("lastLogin").is_some());
    }

    #[tokio::test]
    async fn test_reseed_merges_into_existing_document() {
        let store = MemoryStore::new();
        let uid = generate_uid("tester@example.com");
        store
            .insert("users", &uid, json!({ "displayName": "Old", "role": "member", "familyId": "fam-9" }))
            .unwrap();

        let first = seed_test_user(&store, "Test", "tester@example.com").await.unwrap();
        let second = seed_test_user(&store, "Test", "tester@example.com").await.unwrap();

        assert_eq!(first.uid, uid);
        assert_eq!(second.uid, uid);
        assert_eq!(store.count("users"), 1);

        let doc = store.document("users", &uid).unwrap();
        assert_eq!(doc.get_str("role"), Some("leader"));
        assert_eq!(doc.get_str("familyId"), Some("fam-9"));
    }

    #[test]
    fn test_display_reports_verification() {
        let report = SeedReport {
            uid: "abc".to_string(),
            requested: UserProfile::default(),
            verified: None,
        };
        assert!(report.to_string().contains("Verification failed"));
    }
}
