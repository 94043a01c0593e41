use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

use crate::error::{CompileError, CompileResult};
use crate::lexer::token::{Token, TokenKind};

lazy_static! {
    static ref WHITESPACE_RE: Regex = Regex::new(r"^\s+").unwrap();
    static ref COMMENT_RE: Regex = Regex::new(r"^(?://[^\n]*|/\*(?s:.*?)\*/)").unwrap();
    static ref NUMBER_RE: Regex = Regex::new(r"^[0-9]+(?:\.[0-9]+)?").unwrap();
    static ref IDENTIFIER_RE: Regex = Regex::new(r"^[a-zA-Z_][a-zA-Z0-9_]*").unwrap();
    static ref PUNCTUATION_RE: Regex = Regex::new(r"^[-+*/=(){},;]").unwrap();
}

/// What to do with a character no rule matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LexMode {
    #[default]
    Strict,
    Skip,
}

pub struct Lexer {
    src: String,
    pos: usize,
    line: usize,
    line_start: usize,
    mode: LexMode,
    finished: bool,
}

impl Lexer {
    pub fn new(src: impl Into<String>, mode: LexMode) -> Lexer {
        Lexer {
            src: src.into(),
            pos: 0,
            line: 1,
            line_start: 0,
            mode,
            finished: false,
        }
    }

    /// Skips whitespace and comments, keeping line tracking in step with any
    /// newlines they contain.
    fn skip_trivia(&mut self) {
        loop {
            let rest = &self.src[self.pos..];
            let Some(m) = WHITESPACE_RE
                .find(rest)
                .or_else(|| COMMENT_RE.find(rest))
            else {
                break;
            };

            let text = m.as_str();
            if let Some(last_newline) = text.rfind('\n') {
                self.line += text.matches('\n').count();
                self.line_start = self.pos + last_newline + 1;
            }
            self.pos += text.len();
        }
    }

    fn column(&self) -> usize {
        self.pos - self.line_start
    }

    fn punctuation(lexeme: &str) -> TokenKind {
        match lexeme {
            "+" => TokenKind::Plus,
            "-" => TokenKind::Minus,
            "*" => TokenKind::Star,
            "/" => TokenKind::Slash,
            "=" => TokenKind::Assign,
            "(" => TokenKind::LParen,
            ")" => TokenKind::RParen,
            "{" => TokenKind::LBrace,
            "}" => TokenKind::RBrace,
            "," => TokenKind::Comma,
            ";" => TokenKind::Semicolon,
            _ => unreachable!(),
        }
    }
}

impl Iterator for Lexer {
    type Item = CompileResult<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        loop {
            self.skip_trivia();

            let src = &self.src[self.pos..];
            let column = self.column();

            let token = if src.is_empty() {
                self.finished = true;
                Token::new(TokenKind::EndOfInput, "", self.line, 0)
            } else if let Some(m) = NUMBER_RE.find(src) {
                self.pos += m.as_str().len();
                Token::new(TokenKind::Number, m.as_str(), self.line, column)
            } else if let Some(m) = IDENTIFIER_RE.find(src) {
                self.pos += m.as_str().len();
                let kind = TokenKind::keyword(m.as_str()).unwrap_or(TokenKind::Identifier);
                Token::new(kind, m.as_str(), self.line, column)
            } else if let Some(m) = PUNCTUATION_RE.find(src) {
                self.pos += m.as_str().len();
                Token::new(Lexer::punctuation(m.as_str()), m.as_str(), self.line, column)
            } else {
                let ch = src.chars().next()?;
                self.pos += ch.len_utf8();
                match self.mode {
                    LexMode::Skip => continue,
                    LexMode::Strict => {
                        return Some(Err(CompileError::Lexical {
                            ch,
                            line: self.line,
                            column,
                        }))
                    }
                }
            };

            return Some(Ok(token));
        }
    }
}

/// Runs the lexer to completion. The result always ends with exactly one
/// `EndOfInput` token.
pub fn tokenize(src: &str, mode: LexMode) -> CompileResult<Vec<Token>> {
    let tokens = Lexer::new(src, mode).collect::<CompileResult<Vec<_>>>()?;
    debug!(count = tokens.len(), "tokenized source");
    Ok(tokens)
}
