//! Bidirectional source map between `.gox` and generated `.go` positions.

use crate::Position;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// How many columns a forward lookup may search backward on a miss.
pub const FORWARD_SEARCH_WINDOW: u32 = 5;

/// Nested `line -> column -> position` index used for both directions.
pub type LineMap = BTreeMap<u32, BTreeMap<u32, Position>>;

/// Errors from (de)serializing a source map.
#[derive(Debug, Error)]
pub enum SourceMapError {
    /// The JSON form could not be produced or read.
    #[error("invalid source map json: {0}")]
    Json(#[from] serde_json::Error),
}

/// A character-granular, bidirectional mapping between a source file and the
/// file generated from it.
///
/// Every mapping is stored twice, once per direction, and both entries are
/// always written together by [`SourceMap::add_mapping`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceMap {
    /// Absolute path of the original `.gox` file.
    #[serde(default)]
    pub source_file: String,
    /// Absolute path of the generated `.go` file.
    #[serde(default)]
    pub target_file: String,
    #[serde(default)]
    source_to_target: LineMap,
    #[serde(default)]
    target_to_source: LineMap,
}

impl SourceMap {
    /// Creates an empty source map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the two file identities this map relates.
    pub fn set_files(&mut self, source: impl Into<String>, target: impl Into<String>) {
        self.source_file = source.into();
        self.target_file = target.into();
    }

    /// Returns true if at least one mapping has been recorded.
    pub fn has_mappings(&self) -> bool {
        !self.source_to_target.is_empty() || !self.target_to_source.is_empty()
    }

    /// Returns the number of source-side entries.
    pub fn mapping_count(&self) -> usize {
        self.source_to_target.values().map(BTreeMap::len).sum()
    }

    /// Returns the `source -> target` index.
    pub fn source_to_target(&self) -> &LineMap {
        &self.source_to_target
    }

    /// Returns the `target -> source` index.
    pub fn target_to_source(&self) -> &LineMap {
        &self.target_to_source
    }

    /// Adds one mapping and its reciprocal.
    pub fn add_mapping(&mut self, source: Position, target: Position) {
        self.source_to_target
            .entry(source.line)
            .or_default()
            .insert(source.column, target);
        self.target_to_source
            .entry(target.line)
            .or_default()
            .insert(target.column, source);
    }

    /// Maps `text`, copied verbatim from `source_start` to `target_start`,
    /// one character at a time.
    ///
    /// Each line also gets a mapping at its end column. A newline moves both
    /// sides to the next line and resets both columns to zero, even though the
    /// two starting columns usually differ.
    pub fn add_expression(&mut self, text: &str, source_start: Position, target_start: Position) {
        let mut source = source_start;
        let mut target = target_start;

        for (index, line) in text.split('\n').enumerate() {
            if index > 0 {
                source = Position::new(source.line + 1, 0);
                target = Position::new(target.line + 1, 0);
            }
            for _ in line.chars() {
                self.add_mapping(source, target);
                source.column += 1;
                target.column += 1;
            }
            self.add_mapping(source, target);
        }
    }

    /// Looks up the generated position for a source position.
    ///
    /// An exact hit wins. Otherwise the nearest mapped column at most
    /// [`FORWARD_SEARCH_WINDOW`]` - 1` columns to the left on the same line is
    /// used, and the target column is pushed right by the same distance.
    pub fn target_position_from_source(&self, source: Position) -> Option<Position> {
        let columns = self.source_to_target.get(&source.line)?;
        if let Some(target) = columns.get(&source.column) {
            return Some(*target);
        }

        let lowest = source.column.saturating_sub(FORWARD_SEARCH_WINDOW - 1);
        let (&column, target) = columns.range(lowest..source.column).next_back()?;
        Some(Position::new(
            target.line,
            target.column + (source.column - column),
        ))
    }

    /// Looks up the source position for a generated position.
    ///
    /// An exact hit wins. Otherwise the nearest mapped column to the left on
    /// the same line is used (down to column 0). When nothing on the line
    /// qualifies, the highest-column mapping on the nearest preceding mapped
    /// line is returned.
    pub fn source_position_from_target(&self, target: Position) -> Option<Position> {
        if let Some(columns) = self.target_to_source.get(&target.line) {
            if let Some((_, source)) = columns.range(..=target.column).next_back() {
                return Some(*source);
            }
        }

        self.target_to_source
            .range(..target.line)
            .rev()
            .find_map(|(_, columns)| columns.values().next_back().copied())
    }

    /// Returns the target line of the first (lowest-column) mapping on a
    /// source line.
    pub fn find_target_line(&self, source_line: u32) -> Option<u32> {
        self.source_to_target
            .get(&source_line)?
            .values()
            .next()
            .map(|position| position.line)
    }

    /// Returns the source line of the first (lowest-column) mapping on a
    /// target line.
    pub fn find_source_line(&self, target_line: u32) -> Option<u32> {
        self.target_to_source
            .get(&target_line)?
            .values()
            .next()
            .map(|position| position.line)
    }

    /// Moves every target position on a line greater than `after_line` down by
    /// `delta` lines.
    ///
    /// Used when lines are inserted into generated text after mapping it.
    pub fn shift_target_lines(&mut self, after_line: u32, delta: u32) {
        if delta == 0 {
            return;
        }

        for columns in self.source_to_target.values_mut() {
            for target in columns.values_mut() {
                if target.line > after_line {
                    target.line += delta;
                }
            }
        }

        let shifted = self.target_to_source.split_off(&(after_line + 1));
        for (line, columns) in shifted {
            self.target_to_source.insert(line + delta, columns);
        }
    }

    /// Serializes the map to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, SourceMapError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reads a map from its JSON form.
    pub fn from_json(json: &str) -> Result<Self, SourceMapError> {
        Ok(serde_json::from_str(json)?)
    }
}
