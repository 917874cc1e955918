mod ast;
mod cursor;
mod expr;
mod parser;
mod printer;

pub use ast::*;
pub use expr::*;
pub use parser::*;
pub use printer::*;
