//! Errors shared by every stage of the pipeline.
//!
//! Each stage fails fast: the first violation aborts the unit and is carried
//! up to the driver, which attaches the path of the file being compiled.

use std::path::PathBuf;

use snafu::Snafu;

use crate::analyzer::Scope;

pub type CompileResult<T> = Result<T, CompileError>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum CompileError {
    #[snafu(display("line {line}: invalid identifier '{text}'"))]
    InvalidIdentifier { text: String, line: usize },

    #[snafu(display("line {line}: integer constant {text} exceeds 32767"))]
    IntegerOutOfRange { text: String, line: usize },

    #[snafu(display("line {line}: unterminated string constant"))]
    UnterminatedString { line: usize },

    #[snafu(display("line {line}: string constant of {length} characters exceeds 32767"))]
    StringTooLong { length: usize, line: usize },

    #[snafu(display("line {line}: character {character:?} in string constant exceeds 32767"))]
    InvalidStringCharacter { character: char, line: usize },

    #[snafu(display("line {line}: block comment is never closed"))]
    UnterminatedComment { line: usize },

    #[snafu(display("line {line}: expected {expected}, got {found} instead"))]
    SyntaxError {
        expected: String,
        found: String,
        line: usize,
    },

    #[snafu(display("unexpected end of input, expected {expected}"))]
    UnexpectedEndOfInput { expected: String },

    #[snafu(display("'{name}' is already defined in {scope} scope"))]
    DuplicateSymbol { name: String, scope: Scope },

    #[snafu(display("unknown symbol '{name}' in subroutine '{subroutine}'"))]
    UnknownSymbol { name: String, subroutine: String },

    #[snafu(display("failed to read source: {source}"))]
    Io { source: std::io::Error },

    #[snafu(display("{}: {}", path.display(), source))]
    File {
        path: PathBuf,
        source: Box<CompileError>,
    },
}

impl CompileError {
    /// Attaches the path of the unit that failed.
    pub fn in_file(self, path: impl Into<PathBuf>) -> Self {
        CompileError::File {
            path: path.into(),
            source: Box::new(self),
        }
    }

    /// The underlying error with any file context stripped.
    pub fn root(&self) -> &CompileError {
        match self {
            CompileError::File { source, .. } => source.root(),
            e => e,
        }
    }
}
