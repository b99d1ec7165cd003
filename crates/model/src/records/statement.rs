use serde::{Deserialize, Serialize};

/// How row values end up in the generated INSERT statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StatementMode {
    /// Values are bound as `?` parameters.
    Prepared,
    /// Values are rendered inline as SQL literals.
    #[default]
    Raw,
}

impl StatementMode {
    /// Only `prepared` selects bound parameters; anything else is literal.
    pub fn from_tag(tag: &str) -> Self {
        if tag.trim().eq_ignore_ascii_case("prepared") {
            StatementMode::Prepared
        } else {
            StatementMode::Raw
        }
    }

    pub fn is_prepared(&self) -> bool {
        matches!(self, StatementMode::Prepared)
    }
}
