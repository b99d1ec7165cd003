use serde::{Deserialize, Serialize};
use std::fmt;

/// Which pagination strategy drives the source query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PaginationKind {
    /// The query is executed once, exactly as written.
    #[default]
    Simple,
    /// `LIMIT <n> OFFSET <m>` is appended to the query.
    LimitOffset,
    /// `{{id}}` is replaced with the last seen value of the first column.
    OrderById,
    /// `{{start}}`/`{{end}}` are replaced with a sliding window.
    Range,
}

impl PaginationKind {
    /// Maps a configuration tag to a kind. Unknown and empty tags select
    /// [`PaginationKind::Simple`].
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "limitoffset" => PaginationKind::LimitOffset,
            "orderbyid" => PaginationKind::OrderById,
            "between" => PaginationKind::Range,
            _ => PaginationKind::Simple,
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            PaginationKind::Simple => "simple",
            PaginationKind::LimitOffset => "limitoffset",
            PaginationKind::OrderById => "orderbyid",
            PaginationKind::Range => "between",
        }
    }
}

impl fmt::Display for PaginationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}
