mod codegen;
mod vm;

pub use codegen::*;
pub use vm::*;
