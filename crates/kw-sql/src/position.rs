//! Source positions attached to every node

use serde::{Deserialize, Serialize};
use std::fmt;

/// Line/column span of a node in its source text.
///
/// Nodes synthesized by the analyzer (injected ordering terms) carry
/// [`Position::UNKNOWN`], with every field set to `-1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub start_line: i32,
    pub start_col: i32,
    pub end_line: i32,
    pub end_col: i32,
}

impl Position {
    pub const UNKNOWN: Position = Position {
        start_line: -1,
        start_col: -1,
        end_line: -1,
        end_col: -1,
    };

    pub fn new(start_line: i32, start_col: i32, end_line: i32, end_col: i32) -> Self {
        Self {
            start_line,
            start_col,
            end_line,
            end_col,
        }
    }

    pub fn is_unknown(&self) -> bool {
        *self == Self::UNKNOWN
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::UNKNOWN
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unknown() {
            return write!(f, "unknown position");
        }
        write!(
            f,
            "{}:{}-{}:{}",
            self.start_line, self.start_col, self.end_line, self.end_col
        )
    }
}
