//! Source position tracking and mapping for gox.
//!
//! This crate provides the bidirectional [`SourceMap`] that links every
//! character of a generated `.go` file back to its origin in the `.gox` source,
//! plus the byte [`Span`] type shared by the lexer and parser.
//!
//! Positions stored in a source map are 0-indexed; columns count characters,
//! not bytes.

mod map;
mod position;
mod span;

pub use map::{LineMap, SourceMap, SourceMapError, FORWARD_SEARCH_WINDOW};
pub use position::Position;
pub use span::{ByteOffset, Span};
