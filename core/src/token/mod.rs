mod lexer;
mod span;

pub use lexer::{Token, TokenKind, Tokenizer};
pub use span::Position;
