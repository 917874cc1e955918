use std::io::BufRead;

use crate::error::{CompileResult, UnexpectedEndOfInputSnafu};
use crate::lexer::{Lexer, Token};

/// Token stream with a single pushback slot.
///
/// Disambiguating a term needs the token after an identifier; when that token
/// belongs to the enclosing construct it is handed back here.
#[derive(Debug)]
pub struct TokenCursor<R> {
    lexer: Lexer<R>,
    pushed_back: Option<Token>,
}

impl<R: BufRead> TokenCursor<R> {
    pub fn new(lexer: Lexer<R>) -> Self {
        Self {
            lexer,
            pushed_back: None,
        }
    }

    pub fn line(&self) -> usize {
        self.lexer.line()
    }

    /// Takes the next token; running out of input means `expected` never came.
    pub fn next_token(&mut self, expected: &str) -> CompileResult<Token> {
        match self.next_or_eof()? {
            Some(token) => Ok(token),
            None => UnexpectedEndOfInputSnafu { expected }.fail(),
        }
    }

    pub fn next_or_eof(&mut self) -> CompileResult<Option<Token>> {
        if let Some(token) = self.pushed_back.take() {
            return Ok(Some(token));
        }
        self.lexer.next().transpose()
    }

    pub fn peek(&mut self) -> CompileResult<Option<&Token>> {
        if self.pushed_back.is_none() {
            self.pushed_back = self.lexer.next().transpose()?;
        }
        Ok(self.pushed_back.as_ref())
    }

    pub fn push_back(&mut self, token: Token) {
        debug_assert!(self.pushed_back.is_none(), "pushback slot already taken");
        self.pushed_back = Some(token);
    }
}
