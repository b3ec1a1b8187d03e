use std::fmt;

/// Result of processing a single item inside a bulk loop.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemOutcome {
    pub label: String,
    pub result: Result<(), String>,
}

impl ItemOutcome {
    pub fn success(label: impl Into<String>) -> Self {
        Self { label: label.into(), result: Ok(()) }
    }

    pub fn failure(label: impl Into<String>, reason: impl Into<String>) -> Self {
        Self { label: label.into(), result: Err(reason.into()) }
    }

    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Success/error tally printed as the `=== SUMMARY ===` block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub succeeded: usize,
    pub failed: usize,
}

impl Summary {
    pub fn from_outcomes(outcomes: &[ItemOutcome]) -> Self {
        let succeeded = outcomes.iter().filter(|o| o.is_success()).count();
        Self { succeeded, failed: outcomes.len() - succeeded }
    }

    /// Renders the block with a verb describing what succeeded ("added", "updated").
    pub fn render(&self, verb: &str) -> String {
        format!(
            "=== SUMMARY ===\n✅ Successfully {}: {} users\n❌ Errors: {}",
            verb, self.succeeded, self.failed
        )
    }
}

impl fmt::Display for ItemOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.result {
            Ok(()) => write!(f, "✅ {}", self.label),
            Err(reason) => write!(f, "❌ {}: {}", self.label, reason),
        }
    }
}
