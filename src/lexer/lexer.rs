use std::collections::VecDeque;
use std::io::{BufRead, Lines};

use snafu::ResultExt;

use crate::error::{
    CompileResult, IntegerOutOfRangeSnafu, InvalidIdentifierSnafu, InvalidStringCharacterSnafu,
    IoSnafu, StringTooLongSnafu, UnterminatedCommentSnafu, UnterminatedStringSnafu,
};

use super::{
    token::{KEYWORDS, SYMBOLS},
    Token,
};

const MAX_INTEGER: u16 = 32767;

/// Lazy token stream over a line-oriented source.
///
/// A line is only read once every token produced by the previous one has been
/// handed out, so the whole file never needs to be in memory. Once an error is
/// returned the stream is exhausted.
#[derive(Debug)]
pub struct Lexer<R> {
    lines: Lines<R>,
    pending: VecDeque<Token>,
    line: usize,
    in_block_comment: bool,
    /// Line the open block comment started on.
    comment_line: usize,
    done: bool,
}

impl<R: BufRead> Lexer<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            pending: VecDeque::new(),
            line: 0,
            in_block_comment: false,
            comment_line: 0,
            done: false,
        }
    }

    /// 1-based number of the line the most recent token came from.
    pub fn line(&self) -> usize {
        self.line
    }

    fn new_token(&mut self, token: Token) {
        self.pending.push_back(token);
    }

    fn parse_word(&mut self, word: &str) -> CompileResult<()> {
        if word.chars().all(|c| c.is_ascii_digit()) {
            let value = match word.parse::<u16>() {
                Ok(value) if value <= MAX_INTEGER => value,
                _ => {
                    return IntegerOutOfRangeSnafu {
                        text: word,
                        line: self.line,
                    }
                    .fail()
                }
            };
            self.new_token(Token::IntegerConstant(value));
        } else if let Some(kind) = KEYWORDS.get(word) {
            self.new_token(Token::Keyword(*kind));
        } else if is_identifier(word) {
            self.new_token(Token::Identifier(word.to_string()));
        } else {
            return InvalidIdentifierSnafu {
                text: word,
                line: self.line,
            }
            .fail();
        }
        Ok(())
    }

    /// String constants are built from integer constants, so their length
    /// and every character code share the integer bound.
    fn check_string(&self, s: &str) -> CompileResult<()> {
        let length = s.chars().count();
        if length > usize::from(MAX_INTEGER) {
            return StringTooLongSnafu {
                length,
                line: self.line,
            }
            .fail();
        }
        if let Some(character) = s.chars().find(|&c| c as u32 > u32::from(MAX_INTEGER)) {
            return InvalidStringCharacterSnafu {
                character,
                line: self.line,
            }
            .fail();
        }
        Ok(())
    }

    fn tokenize_line(&mut self, line: &str) -> CompileResult<()> {
        let chars: Vec<_> = line.chars().collect();
        let mut index = 0;

        while index < chars.len() {
            let c = chars[index];
            let next = chars.get(index + 1).copied();

            if self.in_block_comment {
                if c == '*' && next == Some('/') {
                    self.in_block_comment = false;
                    index += 2;
                } else {
                    index += 1;
                }
            } else if c.is_whitespace() {
                index += 1;
            } else if c == '/' && next == Some('/') {
                break;
            } else if c == '/' && next == Some('*') {
                self.in_block_comment = true;
                self.comment_line = self.line;
                index += 2;
            } else if c == '"' {
                let Some(len) = chars[index + 1..].iter().position(|&c| c == '"') else {
                    return UnterminatedStringSnafu { line: self.line }.fail();
                };
                let s: String = chars[index + 1..index + 1 + len].iter().collect();
                self.check_string(&s)?;
                self.new_token(Token::StringConstant(s));
                index += len + 2;
            } else if let Some(symbol) = SYMBOLS.get(&c) {
                self.new_token(Token::Symbol(*symbol));
                index += 1;
            } else {
                let word: String = chars[index..]
                    .iter()
                    .take_while(|&&c| !c.is_whitespace() && c != '"' && !SYMBOLS.contains_key(&c))
                    .collect();
                index += word.chars().count();
                self.parse_word(&word)?;
            }
        }

        Ok(())
    }
}

impl<R: BufRead> Iterator for Lexer<R> {
    type Item = CompileResult<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(token) = self.pending.pop_front() {
                return Some(Ok(token));
            }
            if self.done {
                return None;
            }

            let line = match self.lines.next() {
                Some(line) => line.context(IoSnafu),
                None => {
                    self.done = true;
                    if self.in_block_comment {
                        return Some(
                            UnterminatedCommentSnafu {
                                line: self.comment_line,
                            }
                            .fail(),
                        );
                    }
                    return None;
                }
            };
            self.line += 1;

            if let Err(e) = line.and_then(|line| self.tokenize_line(&line)) {
                self.done = true;
                self.pending.clear();
                return Some(Err(e));
            }
        }
    }
}

fn is_identifier(word: &str) -> bool {
    let mut chars = word.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

/// Lexes a whole in-memory source into a token vector.
pub fn tokenize(source: &str) -> CompileResult<Vec<Token>> {
    Lexer::new(source.as_bytes()).collect()
}
