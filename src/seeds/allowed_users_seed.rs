use crate::database::{value::to_fields, DocumentStore, Write, WriteBatch};
use crate::models::{AllowedUserEntry, ALLOWED_USERS_COLLECTION};
use crate::utils::error::{AdminError, Result};
use crate::utils::report::{ItemOutcome, Summary};
use serde_json::Value;
use std::fmt;
use std::path::Path;

pub const INDEX_NOTE: &str = "\
📝 Note: You may need to create a composite index for the alternativeEmails array-contains query.
   If you see index errors, follow the link in the error message to create the index.";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    pub outcomes: Vec<ItemOutcome>,
    /// Number of batch commits issued (successful or not).
    pub commits: usize,
}

impl LoadReport {
    pub fn summary(&self) -> Summary {
        Summary::from_outcomes(&self.outcomes)
    }
}

/// Lê o arquivo JSON da allow-list; cada elemento é validado depois, individualmente.
pub async fn load_allowed_users_file(path: &Path) -> Result<Vec<Value>> {
    let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
        AdminError::InvalidRequest(format!("cannot read allow-list {}: {}", path.display(), e))
    })?;
    match serde_json::from_str::<Value>(&raw)? {
        Value::Array(entries) => Ok(entries),
        _ => Err(AdminError::InvalidRequest(format!(
            "{} must contain a JSON array of users",
            path.display()
        ))),
    }
}

fn entry_label(raw: &Value, index: usize) -> String {
    match (
        raw.get("displayName").and_then(Value::as_str),
        raw.get("primaryEmail").and_then(Value::as_str),
    ) {
        (Some(name), Some(email)) => format!("{} ({})", name, email),
        (Some(name), None) => name.to_string(),
        (None, Some(email)) => email.to_string(),
        (None, None) => format!("entry #{}", index + 1),
    }
}

fn prepare_write(raw: Value) -> Result<Write> {
    let entry: AllowedUserEntry = serde_json::from_value(raw)?;
    if entry.primary_email.trim().is_empty() {
        return Err(AdminError::InvalidRequest("primaryEmail is empty".to_string()));
    }

    Ok(Write {
        fields: to_fields(&entry.to_record())?,
        ..Write::set(ALLOWED_USERS_COLLECTION, &entry.doc_id())
    }
    .server_timestamp("createdAt"))
}

async fn flush<S>(db: &S, batch: &mut WriteBatch, queued: &mut Vec<String>, outcomes: &mut Vec<ItemOutcome>)
where
    S: DocumentStore + ?Sized,
{
    match batch.commit(db).await {
        Ok(count) => {
            log::info!("💾 Committed batch of {} users", count);
            outcomes.extend(queued.drain(..).map(ItemOutcome::success));
        }
        Err(e) => {
            log::error!("❌ Batch commit failed ({} users not written): {}", queued.len(), e);
            let reason = format!("batch commit failed: {}", e);
            outcomes.extend(queued.drain(..).map(|label| ItemOutcome::failure(label, reason.clone())));
        }
    }
}

/// Grava a allow-list em `allowedUsers`, em batches de até 500 operações.
///
/// Invalid entries are reported and skipped. A failed flush marks every entry
/// of that batch as failed; it is not retried.
pub async fn populate_allowed_users<S>(db: &S, entries: Vec<Value>) -> LoadReport
where
    S: DocumentStore + ?Sized,
{
    log::info!("📋 Found {} users to populate...", entries.len());

    let mut report = LoadReport::default();
    let mut batch = WriteBatch::new();
    let mut queued: Vec<String> = Vec::new();

    for (index, raw) in entries.into_iter().enumerate() {
        let label = entry_label(&raw, index);
        match prepare_write(raw) {
            Ok(write) => {
                batch.push(write);
                log::info!("✅ Queued: {}", label);
                queued.push(label);
            }
            Err(e) => {
                log::error!("❌ Error with {}: {}", label, e);
                report.outcomes.push(ItemOutcome::failure(label, e.to_string()));
            }
        }

        if batch.is_full() {
            report.commits += 1;
            flush(db, &mut batch, &mut queued, &mut report.outcomes).await;
        }
    }

    if !batch.is_empty() {
        report.commits += 1;
        flush(db, &mut batch, &mut queued, &mut report.outcomes).await;
    }

    report
}

impl fmt::Display for LoadReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for outcome in self.outcomes.iter().filter(|o| !o.is_success()) {
            writeln!(f, "{}", outcome)?;
        }
        writeln!(f, "📦 Batch commits: {}", self.commits)?;
        writeln!(f)?;
        writeln!(f, "{}", self.summary().render("added"))?;
        writeln!(f)?;
        write!(f, "{}", INDEX_NOTE)
    }
}
