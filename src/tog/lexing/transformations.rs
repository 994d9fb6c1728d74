//! Transformations from raw tokens to Python tokens
//!
//! There is a single transformation: raw physical tokens become logical-line tokens with
//! indentation structure. See [logical_lines].

pub mod logical_lines;

pub use logical_lines::LogicalLines;
