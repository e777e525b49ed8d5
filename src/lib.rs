pub mod checker;
pub mod cli;
pub mod config;
pub mod editor;
pub mod error;
pub mod overlay;
pub mod popup;
pub mod schedule;
pub mod session;
pub mod store;

pub use checker::CheckerClient;
pub use config::Config;
pub use editor::{ChangeOrigin, EditorAdapter, MarkerAttrs, MemoryEditor, TextChange};
pub use error::{CheckError, OverlayError};
pub use session::{CheckApplied, CheckTicket, SessionOptions, SpellCheckSession};
pub use store::MatchStore;

use serde::{Deserialize, Serialize};

/// A flagged span of the document, in char offsets of the checked text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    pub offset: usize,
    pub length: usize,
    pub message: String,
    pub short_message: String,
    pub replacements: Vec<String>,
    pub rule: Rule,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    pub id: String,
    pub description: String,
    pub category: Option<Category>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
}

/// Address of a match: what a marker carries so the popup can find it again.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MatchKey {
    pub offset: usize,
    pub length: usize,
    pub rule_id: String,
}

impl Match {
    pub fn key(&self) -> MatchKey {
        MatchKey {
            offset: self.offset,
            length: self.length,
            rule_id: self.rule.id.clone(),
        }
    }

    pub fn end(&self) -> usize {
        self.offset + self.length
    }

    pub fn matches_key(&self, key: &MatchKey) -> bool {
        self.offset == key.offset && self.length == key.length && self.rule.id == key.rule_id
    }
}
