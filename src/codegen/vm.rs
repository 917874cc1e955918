use std::fmt::{self, Display, Formatter};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Segment {
    Constant,
    Argument,
    Local,
    Static,
    This,
    That,
    Pointer,
    Temp,
}

impl Segment {
    pub fn as_str(self) -> &'static str {
        match self {
            Segment::Constant => "constant",
            Segment::Argument => "argument",
            Segment::Local => "local",
            Segment::Static => "static",
            Segment::This => "this",
            Segment::That => "that",
            Segment::Pointer => "pointer",
            Segment::Temp => "temp",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Arithmetic {
    Add,
    Sub,
    Neg,
    Eq,
    Gt,
    Lt,
    And,
    Or,
    Not,
}

impl Arithmetic {
    pub fn as_str(self) -> &'static str {
        match self {
            Arithmetic::Add => "add",
            Arithmetic::Sub => "sub",
            Arithmetic::Neg => "neg",
            Arithmetic::Eq => "eq",
            Arithmetic::Gt => "gt",
            Arithmetic::Lt => "lt",
            Arithmetic::And => "and",
            Arithmetic::Or => "or",
            Arithmetic::Not => "not",
        }
    }
}

/// One line of stack-machine code.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Instruction {
    Push(Segment, usize),
    Pop(Segment, usize),
    Arithmetic(Arithmetic),
    Label(String),
    Goto(String),
    IfGoto(String),
    Function(String, usize),
    Call(String, usize),
    Return,
}

impl Display for Instruction {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Push(segment, index) => write!(f, "push {} {}", segment.as_str(), index),
            Instruction::Pop(segment, index) => write!(f, "pop {} {}", segment.as_str(), index),
            Instruction::Arithmetic(op) => write!(f, "{}", op.as_str()),
            Instruction::Label(name) => write!(f, "label {name}"),
            Instruction::Goto(name) => write!(f, "goto {name}"),
            Instruction::IfGoto(name) => write!(f, "if-goto {name}"),
            Instruction::Function(name, locals) => write!(f, "function {name} {locals}"),
            Instruction::Call(name, args) => write!(f, "call {name} {args}"),
            Instruction::Return => write!(f, "return"),
        }
    }
}

/// Renders instructions one per line, newline-terminated.
pub fn render(instructions: &[Instruction]) -> String {
    let mut out = String::new();
    for instruction in instructions {
        out.push_str(&instruction.to_string());
        out.push('\n');
    }
    out
}
