use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// The three possible credit decision outcomes. Unlike the source this was
/// distilled from, `Review` is stored as its own value rather than collapsed
/// into `Reject` at the persistence boundary — see DESIGN.md.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DecisionType {
    Approved,
    Rejected,
    Review,
}

impl DecisionType {
    /// Parses the case-insensitive wire/storage representation, accepting
    /// the three recognized enumerators per the external interface contract.
    pub fn parse_case_insensitive(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            "review" => Some(Self::Review),
            _ => None,
        }
    }
}
