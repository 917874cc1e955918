use crate::lexer::{Keyword, Symbol};

/// `term (op term)*`, kept flat: operators apply strictly left to right.
#[derive(Clone, Debug, PartialEq)]
pub struct Expression {
    pub term: Term,
    pub rest: Vec<(BinaryOp, Term)>,
}

impl Expression {
    pub fn new(term: Term) -> Self {
        Self { term, rest: vec![] }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    And,
    Or,
    LessThan,
    GreaterThan,
    Equal,
}

impl BinaryOp {
    pub fn from_symbol(symbol: Symbol) -> Option<Self> {
        match symbol {
            Symbol::Plus => Some(BinaryOp::Add),
            Symbol::Minus => Some(BinaryOp::Sub),
            Symbol::Star => Some(BinaryOp::Mul),
            Symbol::Slash => Some(BinaryOp::Div),
            Symbol::Ampersand => Some(BinaryOp::And),
            Symbol::Pipe => Some(BinaryOp::Or),
            Symbol::LessThan => Some(BinaryOp::LessThan),
            Symbol::GreaterThan => Some(BinaryOp::GreaterThan),
            Symbol::Equal => Some(BinaryOp::Equal),
            _ => None,
        }
    }

    pub fn symbol(self) -> Symbol {
        match self {
            BinaryOp::Add => Symbol::Plus,
            BinaryOp::Sub => Symbol::Minus,
            BinaryOp::Mul => Symbol::Star,
            BinaryOp::Div => Symbol::Slash,
            BinaryOp::And => Symbol::Ampersand,
            BinaryOp::Or => Symbol::Pipe,
            BinaryOp::LessThan => Symbol::LessThan,
            BinaryOp::GreaterThan => Symbol::GreaterThan,
            BinaryOp::Equal => Symbol::Equal,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}

impl UnaryOp {
    pub fn symbol(self) -> Symbol {
        match self {
            UnaryOp::Neg => Symbol::Minus,
            UnaryOp::Not => Symbol::Tilde,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeywordConstant {
    True,
    False,
    Null,
    This,
}

impl KeywordConstant {
    pub fn from_keyword(keyword: Keyword) -> Option<Self> {
        match keyword {
            Keyword::True => Some(KeywordConstant::True),
            Keyword::False => Some(KeywordConstant::False),
            Keyword::Null => Some(KeywordConstant::Null),
            Keyword::This => Some(KeywordConstant::This),
            _ => None,
        }
    }

    pub fn keyword(self) -> Keyword {
        match self {
            KeywordConstant::True => Keyword::True,
            KeywordConstant::False => Keyword::False,
            KeywordConstant::Null => Keyword::Null,
            KeywordConstant::This => Keyword::This,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Term {
    IntegerConstant(u16),
    StringConstant(String),
    KeywordConstant(KeywordConstant),
    Variable(String),
    Index(String, Box<Expression>),
    Call(SubroutineCall),
    Parenthesized(Box<Expression>),
    Unary(UnaryOp, Box<Term>),
}

/// `name(args)` or `receiver.name(args)`; the receiver is either a variable
/// or a class name, which only the symbol table can tell apart.
#[derive(Clone, Debug, PartialEq)]
pub struct SubroutineCall {
    pub receiver: Option<String>,
    pub name: String,
    pub args: ExpressionList,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExpressionList(pub Vec<Expression>);
