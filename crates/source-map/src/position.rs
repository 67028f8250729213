//! 0-indexed line/column positions.

use serde::{Deserialize, Serialize};

/// A location in a file as stored in a [`SourceMap`](crate::SourceMap).
///
/// Both fields are 0-indexed. `column` counts characters within the line.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Position {
    /// 0-indexed line number.
    pub line: u32,
    /// 0-indexed column, in characters.
    pub column: u32,
}

impl Position {
    /// Creates a new position.
    #[inline]
    pub const fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }

    /// Converts a 1-indexed line/column pair (as used in the parse tree and in
    /// compiler diagnostics) into a 0-indexed position.
    #[inline]
    pub fn from_one_based(line: u32, column: u32) -> Self {
        Self {
            line: line.saturating_sub(1),
            column: column.saturating_sub(1),
        }
    }

    /// Returns the 1-indexed `(line, column)` pair for display.
    #[inline]
    pub fn to_one_based(self) -> (u32, u32) {
        (self.line + 1, self.column + 1)
    }

    /// Returns the position reached after walking over `text` from `self`.
    ///
    /// A newline advances the line and resets the column to zero.
    pub fn advance(self, text: &str) -> Self {
        let mut pos = self;
        for c in text.chars() {
            if c == '\n' {
                pos.line += 1;
                pos.column = 0;
            } else {
                pos.column += 1;
            }
        }
        pos
    }
}
