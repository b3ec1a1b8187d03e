// ==================== ALLOW-LIST CHECK ====================
// Mesma verificação feita no login: primaryEmail primeiro, depois
// alternativeEmails (array-contains, precisa do índice composto).

use crate::{
    database::{DocumentStore, FieldFilter},
    models::ALLOWED_USERS_COLLECTION,
    utils::{
        email::normalize_email,
        error::{AdminError, Result},
    },
};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllowCheck {
    Primary { doc_id: String },
    Alternative { doc_id: String },
    NotAllowed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowCheckReport {
    pub email: String,
    pub result: AllowCheck,
}

impl AllowCheckReport {
    pub fn is_allowed(&self) -> bool {
        !matches!(self.result, AllowCheck::NotAllowed)
    }
}

pub async fn check_allowed_email<S>(db: &S, email: &str) -> Result<AllowCheckReport>
where
    S: DocumentStore + ?Sized,
{
    let email = normalize_email(email);
    if email.is_empty() {
        return Err(AdminError::InvalidRequest("an email address is required".to_string()));
    }
    log::info!("🔍 Checking authorization for email: {}", email);

    let primary = db
        .run_query(
            ALLOWED_USERS_COLLECTION,
            &FieldFilter::equal("primaryEmail", email.as_str()),
            Some(1),
        )
        .await?;
    if let Some(doc) = primary.into_iter().next() {
        return Ok(AllowCheckReport {
            email,
            result: AllowCheck::Primary { doc_id: doc.id },
        });
    }

    let alternative = db
        .run_query(
            ALLOWED_USERS_COLLECTION,
            &FieldFilter::array_contains("alternativeEmails", email.as_str()),
            Some(1),
        )
        .await?;
    let result = match alternative.into_iter().next() {
        Some(doc) => AllowCheck::Alternative { doc_id: doc.id },
        None => AllowCheck::NotAllowed,
    };

    Ok(AllowCheckReport { email, result })
}

impl fmt::Display for AllowCheckReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.result {
            AllowCheck::Primary { doc_id } => write!(
                f,
                "✅ {} is authorized via primary email (allowedUsers/{})",
                self.email, doc_id
            ),
            AllowCheck::Alternative { doc_id } => write!(
                f,
                "✅ {} is authorized via alternative email (allowedUsers/{})",
                self.email, doc_id
            ),
            AllowCheck::NotAllowed => write!(f, "❌ {} is not in the allowed users list", self.email),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;
    use serde_json::json;

    fn store() -> MemoryStore {
        let store = MemoryStore::new();
        store
            .insert(
                "allowedUsers",
                "ana_x_com",
                json!({
                    "displayName": "Ana",
                    "primaryEmail": "ana@x.com",
                    "alternativeEmails": ["ana.work@y.org"]
                }),
            )
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_primary_match_is_case_insensitive() {
        let report = check_allowed_email(&store(), "ANA@x.com").await.unwrap();
        assert_eq!(report.result, AllowCheck::Primary { doc_id: "ana_x_com".to_string() });
        assert!(report.is_allowed());
    }

    #[tokio::test]
    async fn test_alternative_match() {
        let report = check_allowed_email(&store(), "ana.work@y.org").await.unwrap();
        assert_eq!(report.result, AllowCheck::Alternative { doc_id: "ana_x_com".to_string() });
        assert!(report.to_string().contains("alternative email"));
    }

    #[tokio::test]
    async fn test_not_allowed_and_blank() {
        let report = check_allowed_email(&store(), "stranger@x.com").await.unwrap();
        assert!(!report.is_allowed());

        let blank = check_allowed_email(&store(), "  ").await;
        assert!(matches!(blank, Err(AdminError::InvalidRequest(_))));
    }
}
