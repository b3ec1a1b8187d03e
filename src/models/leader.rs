use serde::{Deserialize, Serialize};

/// A person to promote to leader, with every email they might have signed in with.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct LeaderTarget {
    pub name: String,
    #[serde(default)]
    pub emails: Vec<String>,
}
