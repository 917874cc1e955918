//! Compiler for the Jack teaching language, producing stack-machine code.
//!
//! - `lexer` turns source lines into tokens lazily.
//! - `parser` builds one typed syntax tree per class.
//! - `analyzer` holds the class/subroutine symbol table.
//! - `codegen` walks the tree and emits VM instructions.
//! - `xml` and `driver` provide the analyzer output and the file handling.

pub mod analyzer;
pub mod codegen;
pub mod driver;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod xml;

use std::io::BufRead;

use codegen::Codegen;
use lexer::Lexer;
use parser::{Class, Parser};

pub use error::{CompileError, CompileResult};

pub fn parse<R: BufRead>(reader: R) -> CompileResult<Class> {
    let mut parser = Parser::new(Lexer::new(reader));
    parser.parse()
}

pub fn compile_reader<R: BufRead>(reader: R) -> CompileResult<String> {
    let class = parse(reader)?;
    let instructions = Codegen::generate(&class)?;
    Ok(codegen::render(&instructions))
}

/// Compiles the source of one class into VM code, one instruction per line.
pub fn compile(source: &str) -> CompileResult<String> {
    compile_reader(source.as_bytes())
}
