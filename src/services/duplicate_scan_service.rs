// ==================== DUPLICATE USER SCAN ====================
// Agrupa os documentos de `users` por email (minúsculo) e lista os grupos
// com mais de um documento. Somente leitura.

use crate::{
    database::{Document, DocumentStore},
    models::{UserDiagnostics, USERS_COLLECTION},
    utils::error::Result,
};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct DuplicateGroup {
    pub email: String,
    pub documents: Vec<UserDiagnostics>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DuplicateReport {
    pub groups: Vec<DuplicateGroup>,
    pub total_documents: usize,
    pub distinct_emails: usize,
    pub documents_without_email: usize,
}

/// Groups documents by lowercase email; only groups with more than one document are kept.
pub fn find_duplicates(documents: &[Document]) -> DuplicateReport {
    let mut by_email: BTreeMap<String, Vec<&Document>> = BTreeMap::new();
    let mut documents_without_email = 0;

    for document in documents {
        match document.get_str("email").map(str::to_lowercase) {
            Some(email) if !email.is_empty() => by_email.entry(email).or_default().push(document),
            _ => documents_without_email += 1,
        }
    }

    let distinct_emails = by_email.len();
    let groups = by_email
        .into_iter()
        .filter(|(_, docs)| docs.len() > 1)
        .map(|(email, docs)| DuplicateGroup {
            email,
            documents: docs.into_iter().map(UserDiagnostics::from_document).collect(),
        })
        .collect();

    DuplicateReport {
        groups,
        total_documents: documents.len(),
        distinct_emails,
        documents_without_email,
    }
}

/// Reads the whole `users` collection and reports duplicate emails.
///
/// A read failure aborts the scan; nothing is retried.
pub async fn scan_duplicate_users<S>(db: &S) -> Result<DuplicateReport>
where
    S: DocumentStore + ?Sized,
{
    log::info!("🔍 Checking for duplicate user documents...");
    let documents = db.list_documents(USERS_COLLECTION).await?;
    log::info!("📄 Loaded {} documents from '{}'", documents.len(), USERS_COLLECTION);

    let report = find_duplicates(&documents);
    for group in &report.groups {
        log::warn!("⚠️  {} has {} documents", group.email, group.documents.len());
    }
    Ok(report)
}

impl fmt::Display for DuplicateReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.groups.is_empty() {
            writeln!(f, "✅ No duplicate user documents found!")?;
        } else {
            writeln!(f, "Found {} users with duplicate documents:", self.groups.len())?;
            writeln!(f)?;
            for group in &self.groups {
                writeln!(f, "📧 {}", group.email)?;
                for doc in &group.documents {
                    writeln!(f, "  • Document ID: {}", doc.id)?;
                    writeln!(f, "    - Created: {}", doc.created)?;
                    writeln!(f, "    - Has familyId: {}", doc.has_family_id)?;
                    writeln!(f, "    - Has gender: {}", doc.has_gender)?;
                    writeln!(f, "    - Is prepopulated: {}", doc.prepopulated)?;
                    writeln!(f, "    - Was migrated: {}", doc.migrated)?;
                    writeln!(f)?;
                }
            }
        }

        writeln!(f)?;
        writeln!(f, "Total users: {}", self.distinct_emails)?;
        write!(f, "Total documents: {}", self.total_documents)?;
        if self.documents_without_email > 0 {
            write!(f, "\nDocuments without email: {}", self.documents_without_email)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;
    use serde_json::json;

    #[tokio::test]
    async fn test_reports_case_insensitive_duplicate() {
        let store = MemoryStore::new();
        store
            .insert("users", "uid-google", json!({ "email": "J@X.com", "familyId": "fam-1" }))
            .unwrap();
        store
            .insert("users", "j_x_com", json!({ "email": "j@x.com", "prepopulated": true, "gender": "f" }))
            .unwrap();
        store.insert("users", "other", json!({ "email": "k@x.com" })).unwrap();

        let report = scan_duplicate_users(&store).await.unwrap();

        assert_eq!(report.groups.len(), 1);
        let group = &report.groups[0];
        assert_eq!(group.email, "j@x.com");
        assert_eq!(group.documents.len(), 2);
        assert_eq!(report.total_documents, 3);
        assert_eq!(report.distinct_emails, 2);

        let prepopulated = group.documents.iter().find(|d| d.id == "j_x_com").unwrap();
        assert!(prepopulated.prepopulated);
        assert!(prepopulated.has_gender);
        assert!(!prepopulated.has_family_id);
    }

    #[test]
    fn test_group_sizes_add_up_to_total() {
        let docs: Vec<Document> = ["a@x.com", "A@x.com", "b@x.com", "c@x.com", "C@X.COM", "c@x.com", ""]
            .iter()
            .enumerate()
            .map(|(i, email)| {
                Document::new(format!("doc-{}", i), json!({ "email": email }).as_object().cloned().unwrap())
            })
            .collect();

        let report = find_duplicates(&docs);

        assert_eq!(report.groups.len(), 2);
        assert_eq!(report.distinct_emails, 3);
        assert_eq!(report.documents_without_email, 1);
        let grouped: usize = report.groups.iter().map(|g| g.documents.len()).sum();
        // b@x.com fica fora dos grupos (só 1 documento)
        assert_eq!(grouped + 1 + report.documents_without_email, report.total_documents);
    }

    #[test]
    fn test_display_without_duplicates() {
        let report = find_duplicates(&[]);
        let text = report.to_string();
        assert!(text.contains("No duplicate user documents found"));
        assert!(text.contains("Total documents: 0"));
    }

    #[test]
    fn test_display_lists_flags() {
        let docs = vec![
            Document::new("a", json!({ "email": "j@x.com", "migratedFrom": "old" }).as_object().cloned().unwrap()),
            Document::new("b", json!({ "email": "j@x.com" }).as_object().cloned().unwrap()),
        ];
        let text = find_duplicates(&docs).to_string();
        assert!(text.contains("Found 1 users with duplicate documents:"));
        assert!(text.contains("📧 j@x.com"));
        assert!(text.contains("  • Document ID: a"));
        assert!(text.contains("    - Was migrated: true"));
        assert!(text.contains("    - Created: Unknown"));
    }
}
