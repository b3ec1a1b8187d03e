// ==================== ROLE UPDATE ====================
// Promove usuários para `leader` buscando cada email candidato em `users`.
// Falhas são contadas por email/documento e não interrompem o restante.

use crate::{
    database::{DocumentStore, FieldFilter, Write},
    models::{LeaderTarget, ROLE_LEADER, USERS_COLLECTION},
    utils::{
        email::normalize_email,
        error::{AdminError, Result},
        report::{ItemOutcome, Summary},
    },
};
use std::fmt;
use std::path::Path;

pub const LOGIN_NOTE: &str = "\
📝 Note: Users need to log in at least once to have a user document created.
   If a user wasn't found, ask them to log in first, then run this script again.";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoleUpdateReport {
    pub outcomes: Vec<ItemOutcome>,
    /// People with no user document for any of their emails.
    pub not_found: Vec<String>,
}

impl RoleUpdateReport {
    pub fn summary(&self) -> Summary {
        Summary::from_outcomes(&self.outcomes)
    }
}

/// Reads the leader list (`[{"name": "...", "emails": ["..."]}]`).
pub async fn load_leader_targets(path: &Path) -> Result<Vec<LeaderTarget>> {
    let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
        AdminError::InvalidRequest(format!("cannot read leader list {}: {}", path.display(), e))
    })?;
    Ok(serde_json::from_str(&raw)?)
}

/// Sets `role = "leader"` on every user document matching a candidate email.
pub async fn update_leader_roles<S>(db: &S, leaders: &[LeaderTarget]) -> RoleUpdateReport
where
    S: DocumentStore + ?Sized,
{
    log::info!("🔄 Updating user roles to '{}'...", ROLE_LEADER);
    let mut report = RoleUpdateReport::default();

    for leader in leaders {
        log::info!("Looking for {}...", leader.name);
        let mut user_found = false;

        for candidate in &leader.emails {
            let email = normalize_email(candidate);
            if email.is_empty() {
                log::warn!("  ⚠️  Skipping blank email for {}", leader.name);
                continue;
            }

            let filter = FieldFilter::equal("email", email.as_str());
            let matches = match db.run_query(USERS_COLLECTION, &filter, None).await {
                Ok(docs) => docs,
                Err(e) => {
                    log::error!("  ❌ Error updating {}: {}", email, e);
                    report.outcomes.push(ItemOutcome::failure(email.clone(), e.to_string()));
                    continue;
                }
            };

            for doc in matches {
                user_found = true;
                let display_name = doc.get_str("displayName").unwrap_or("Unknown").to_string();
                log::info!("  Found user: {} ({})", display_name, email);

                let write = Write::update(USERS_COLLECTION, &doc.id)
                    .field("role", ROLE_LEADER)
                    .server_timestamp("updatedAt");
                let label = format!("{} <{}> [{}]", display_name, email, doc.id);

                match db.apply(write).await {
                    Ok(()) => {
                        log::info!("  ✅ Updated role to '{}'", ROLE_LEADER);
                        report.outcomes.push(ItemOutcome::success(label));
                    }
                    Err(e) => {
                        log::error!("  ❌ Error updating {}: {}", email, e);
                        report.outcomes.push(ItemOutcome::failure(label, e.to_string()));
                    }
                }
            }
        }

        if !user_found {
            log::warn!(
                "  ⚠️  No user found for {} - they may need to log in first to create their user document",
                leader.name
            );
            report.not_found.push(leader.name.clone());
        }
    }

    report
}

impl fmt::Display for RoleUpdateReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for outcome in self.outcomes.iter().filter(|o| !o.is_success()) {
            writeln!(f, "{}", outcome)?;
        }
        for name in &self.not_found {
            writeln!(f, "⚠️  No user found for {} - they may need to log in first", name)?;
        }
        writeln!(f)?;
        writeln!(f, "{}", self.summary().render("updated"))?;
        writeln!(f)?;
        write!(f, "{}", LOGIN_NOTE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;
    use serde_json::json;
    use std::io::Write as _;

    fn leader(name: &str, emails: &[&str]) -> LeaderTarget {
        LeaderTarget {
            name: name.to_string(),
            emails: emails.iter().map(|e| e.to_string()).collect(),
        }
    }

    #[tokio::test]
    async fn test_updates_every_matching_document() {
        let store = MemoryStore::new();
        store
            .insert("users", "uid-1", json!({ "email": "dup@x.com", "displayName": "Dee", "role": "member", "familyId": "f1" }))
            .unwrap();
        store
            .insert("users", "dup_x_com", json!({ "email": "dup@x.com", "role": "member" }))
            .unwrap();

        let report = update_leader_roles(&store, &[leader("Dee", &["DUP@x.com"])]).await;

        assert_eq!(report.summary(), Summary { succeeded: 2, failed: 0 });
        assert!(report.not_found.is_empty());
        for id in ["uid-1", "dup_x_com"] {
            let doc = store.document("users", id).unwrap();
            assert_eq!(doc.get_str("role"), Some("leader"));
            assert!(doc.get_str("updatedAt").is_some());
        }
        assert_eq!(store.document("users", "uid-1").unwrap().get_str("familyId"), Some("f1"));
    }

    #[tokio::test]
    async fn test_unmatched_person_warns_once() {
        let store = MemoryStore::new();
        store.insert("users", "someone", json!({ "email": "someone@x.com" })).unwrap();

        let report =
            update_leader_roles(&store, &[leader("Ghost", &["ghost@x.com", "ghost2@x.com"])]).await;

        assert_eq!(report.summary(), Summary::default());
        assert_eq!(report.not_found, vec!["Ghost".to_string()]);
        assert_eq!(store.document("users", "someone").unwrap().get_str("role"), None);
    }

    #[tokio::test]
    async fn test_query_failure_does_not_block_other_emails() {
        let store = MemoryStore::new();
        store.insert("users", "u2", json!({ "email": "ok@x.com" })).unwrap();
        store.insert("users", "u3", json!({ "email": "next@x.com" })).unwrap();
        store.fail_queries_for("broken@x.com");

        let report = update_leader_roles(
            &store,
            &[leader("Pat", &["broken@x.com", "ok@x.com"]), leader("Sam", &["next@x.com"])],
        )
        .await;

        assert_eq!(report.summary(), Summary { succeeded: 2, failed: 1 });
        assert!(report.not_found.is_empty());
        assert_eq!(store.document("users", "u3").unwrap().get_str("role"), Some("leader"));
    }

    #[tokio::test]
    async fn test_blank_emails_are_skipped() {
        let store = MemoryStore::new();
        let report = update_leader_roles(&store, &[leader("", &[""])]).await;

        assert!(report.outcomes.is_empty());
        assert_eq!(report.not_found, vec![String::new()]);
    }

    #[tokio::test]
    async fn test_load_leader_targets() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"[{{"name": "Ana", "emails": ["ana@x.com", "Ana.Alt@y.org"]}}, {{"name": "Bo"}}]"#).unwrap();

        let leaders = load_leader_targets(file.path()).await.unwrap();
        assert_eq!(leaders.len(), 2);
        assert_eq!(leaders[0].emails.len(), 2);
        assert!(leaders[1].emails.is_empty());
    }

    #[test]
    fn test_display_includes_summary_and_note() {
        let report = RoleUpdateReport {
            outcomes: vec![ItemOutcome::success("a"), ItemOutcome::failure("b@x.com", "503")],
            not_found: vec!["Ghost".to_string()],
        };
        let text = report.to_string();
        assert!(text.contains("❌ b@x.com: 503"));
        assert!(text.contains("No user found for Ghost"));
        assert!(text.contains("=== SUMMARY ==="));
        assert!(text.contains("Successfully updated: 1 users"));
        assert!(text.contains("log in at least once"));
    }
}
