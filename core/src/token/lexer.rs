use serde::Serialize;

use super::Position;
use crate::lang;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TokenKind {
    Keyword,
    Identifier,
    String,
    Number,
    Comment,
    Operator,
    Symbol,
    Constant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    pub value: String,
    /// Start of the token; multi-line strings report their first line.
    pub position: Position,
    /// Length in UTF-16 code units.
    pub length: u32,
}

impl Token {
    /// Column one past the last code unit on the token's start line.
    pub fn end_character(&self) -> u32 {
        self.position.character + self.length
    }

    pub fn is_operator(&self, op: &str) -> bool {
        self.kind == TokenKind::Operator && self.value == op
    }
}

// Single-character operators and punctuation. `:` is deliberately absent so
// it can start a symbol literal.
const OPERATOR_CHARS: &str = "+-*/%=<>!&|^~.,;()[]{}@";

/// Single forward scan with one character of lookahead. Never fails:
/// unterminated strings run to end of input and unknown characters are
/// skipped.
pub struct Tokenizer<'a> {
    text: &'a str,
    chars: Vec<(usize, char)>,
    pos: usize,
    line: u32,
    column: u32,
    tokens: Vec<Token>,
}

impl<'a> Tokenizer<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            text,
            chars: text.char_indices().collect(),
            pos: 0,
            line: 0,
            column: 0,
            tokens: Vec::new(),
        }
    }

    pub fn tokenize(text: &str) -> Vec<Token> {
        Tokenizer::new(text).run()
    }

    pub fn run(mut self) -> Vec<Token> {
        while let Some(ch) = self.peek() {
            match ch {
                c if c.is_whitespace() => self.advance(),
                '#' => self.read_comment(),
                '"' | '\'' => self.read_string(ch),
                c if c.is_ascii_digit() => self.read_number(),
                c if c.is_ascii_alphabetic() || c == '_' => self.read_word(),
                c if OPERATOR_CHARS.contains(c) => self.read_operator(),
                ':' => self.read_symbol(),
                _ => self.advance(),
            }
        }
        self.tokens
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).map(|(_, c)| *c)
    }

    fn peek_at(&self, ahead: usize) -> Option<char> {
        self.chars.get(self.pos + ahead).map(|(_, c)| *c)
    }

    fn byte_offset(&self, pos: usize) -> usize {
        self.chars.get(pos).map(|(b, _)| *b).unwrap_or(self.text.len())
    }

    fn advance(&mut self) {
        if let Some(ch) = self.peek() {
            self.pos += 1;
            if ch == '\n' {
                self.line += 1;
                self.column = 0;
            } else {
                self.column += ch.len_utf16() as u32;
            }
        }
    }

    fn advance_while(&mut self, pred: impl Fn(char) -> bool) {
        while let Some(ch) = self.peek() {
            if !pred(ch) {
                break;
            }
            self.advance();
        }
    }

    fn push(&mut self, kind: TokenKind, start: usize, line: u32, column: u32) {
        let value = &self.text[self.byte_offset(start)..self.byte_offset(self.pos)];
        let length = value.encode_utf16().count() as u32;
        self.tokens.push(Token {
            kind,
            value: value.to_string(),
            position: Position::new(line, column),
            length,
        });
    }

    fn read_comment(&mut self) {
        let (start, line, column) = (self.pos, self.line, self.column);
        self.advance_while(|c| c != '\n');
        self.push(TokenKind::Comment, start, line, column);
    }

    fn read_string(&mut self, quote: char) {
        let (start, line, column) = (self.pos, self.line, self.column);
        self.advance();
        while let Some(ch) = self.peek() {
            if ch == quote {
                self.advance();
                break;
            }
            if ch == '\\' && self.peek_at(1).is_some() {
                self.advance();
            }
            self.advance();
        }
        self.push(TokenKind::String, start, line, column);
    }

    fn read_number(&mut self) {
        let (start, line, column) = (self.pos, self.line, self.column);
        self.advance_while(|c| c.is_ascii_digit() || c == '.');
        self.push(TokenKind::Number, start, line, column);
    }

    fn read_word(&mut self) {
        let (start, line, column) = (self.pos, self.line, self.column);
        self.advance_while(|c| c.is_ascii_alphanumeric() || c == '_');
        // `empty?` and `save!` are single words; `a!=b` is not.
        if matches!(self.peek(), Some('?') | Some('!')) && self.peek_at(1) != Some('=') {
            self.advance();
        }
        let value = &self.text[self.byte_offset(start)..self.byte_offset(self.pos)];
        let kind = if lang::is_keyword(value) {
            TokenKind::Keyword
        } else if value.starts_with(|c: char| c.is_ascii_uppercase()) {
            TokenKind::Constant
        } else {
            TokenKind::Identifier
        };
        self.push(kind, start, line, column);
    }

    fn read_operator(&mut self) {
        let (start, line, column) = (self.pos, self.line, self.column);
        self.advance();
        self.push(TokenKind::Operator, start, line, column);
    }

    fn read_symbol(&mut self) {
        let (start, line, column) = (self.pos, self.line, self.column);
        self.advance();
        self.advance_while(|c| c.is_ascii_alphanumeric() || c == '_');
        self.push(TokenKind::Symbol, start, line, column);
    }
}
