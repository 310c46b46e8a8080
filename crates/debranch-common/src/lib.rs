//! Common types and utilities for the debranch transform.
//!
//! This crate provides foundational types used across all debranch crates:
//! - Source spans (`Span`)
//! - Line/column lookup for byte offsets (`LineMap`)
//! - Source map generation (`SourceMapGenerator`, VLQ and base64 encoding)

// Span - Source location tracking (byte offsets)
pub mod span;
pub use span::Span;

// Position/Range types for line/column source locations
pub mod position;
pub use position::LineMap;

// Source Map generation
pub mod source_map;
pub use source_map::SourceMapGenerator;
