//! Token order generation: tokens, trees and the links between them
//!
//! Pipeline
//!
//!     source -> [lexing] -> tokens -> [balance] -> tokens with paren links
//!     source -> [parsing] -> tree
//!     (tokens, tree) -> [synchronizer] -> links
//!     links -> [fstringify] | [beautify]
//!
//! The tokenizer is lossless: concatenating token values reproduces the input byte for byte.
//! The synchronizer never trusts tree positions for matching, it walks the tree in the order
//! the grammar emits tokens and scans forward through the token list for each expected token.

pub mod ast;
pub mod balance;
pub mod beautify;
pub mod config;
pub mod formats;
pub mod fstringify;
pub mod lexing;
pub mod parsing;
pub mod processor;
pub mod synchronizer;
pub mod token;
pub mod traversal;

pub use ast::{Ast, NodeId, NodeKind};
pub use balance::balance_parens;
pub use lexing::make_tokens;
pub use parsing::parse;
pub use synchronizer::{synchronize, synchronize_with, Driver, Links};
pub use token::{Token, TokenKind};
