//! # tokenorder
//!
//! Links Python syntax trees to the tokens that produced them.
//!
//! A tokenizer and a parser look at the same source text but disagree on almost everything
//! else: the tokenizer sees whitespace, comments, commas and parens, the parser sees none of
//! them and only keeps approximate positions. This crate reconciles the two views by replaying
//! the order in which the grammar emits tokens for each node, and matching each emitted token
//! against the real token list. The result is a two-way link between every node and the
//! significant tokens it owns.
//!
//! On top of the links sit two source rewriters: an f-string converter and a beautifier.
//!
//! See the [tog](tog) module for the full pipeline.

pub mod tog;
