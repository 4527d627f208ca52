//! Heuristic analysis engine for Crystal source text.
//!
//! Everything here works on plain `&str` documents and zero-based
//! `(line, character)` positions in UTF-16 units. Nothing is cached between
//! calls: each query re-derives what it needs from the text it is given.

pub mod blocks;
pub mod infer;
pub mod lang;
pub mod structure;
pub mod text;
pub mod token;
pub mod util;

pub use structure::{parse, SymbolTable};
pub use token::{Position, Token, TokenKind, Tokenizer};
