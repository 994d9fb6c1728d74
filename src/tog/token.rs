//! Token types shared by the tokenizer, the synchronizer and the rewriters.
//!
//!     Tokens follow the contracts of Python's own tokenizer, with one addition: every run of
//!     text between two real tokens becomes a `ws` token. With that, the token list is a
//!     complete partition of the source and can be turned back into it by concatenation.
//!
//! Token Kinds
//!
//!     name, number, string, op, comment:
//!         Lexical units, value is the exact source text.
//!     newline:
//!         Ends a logical line. Synthesized with an empty value at end of file when the last
//!         line has no line break.
//!     nl:
//!         A line break that does not end a logical line: blank lines, comment-only lines and
//!         line breaks inside brackets.
//!     indent, dedent:
//!         Indentation changes. An indent carries the leading whitespace of its line, a dedent
//!         is empty.
//!     ws:
//!         Inter-token text: blanks, tabs and backslash continuations.
//!     endmarker:
//!         Always the last token, empty.
//!     killed:
//!         A token removed by a rewriter. Its value is empty so the source stays consistent.
//!
//! Link Fields
//!
//!     Tokens start unlinked. The synchronizer sets `node` on significant tokens and
//!     `statement_node` on line breaks, the balancer sets `matching_paren` on parens.

pub mod core;
pub mod formatting;

pub use core::{is_significant, Token, TokenKind};
pub use formatting::{detokenize, show_val, ToPythonSource};
