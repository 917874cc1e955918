use super::{Expression, SubroutineCall};

#[derive(Clone, Debug, PartialEq)]
pub struct Class {
    pub name: String,
    pub vars: Vec<ClassVarDec>,
    pub subroutines: Vec<SubroutineDec>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClassVarKind {
    Static,
    Field,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ClassVarDec {
    pub kind: ClassVarKind,
    pub ty: Type,
    pub names: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Type {
    Int,
    Char,
    Boolean,
    Class(String),
}

impl Type {
    pub fn name(&self) -> &str {
        match self {
            Type::Int => "int",
            Type::Char => "char",
            Type::Boolean => "boolean",
            Type::Class(name) => name,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubroutineKind {
    Constructor,
    Function,
    Method,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SubroutineDec {
    pub kind: SubroutineKind,
    /// `None` for `void`.
    pub return_type: Option<Type>,
    pub name: String,
    pub params: ParameterList,
    pub body: SubroutineBody,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParameterList(pub Vec<Parameter>);

#[derive(Clone, Debug, PartialEq)]
pub struct Parameter {
    pub ty: Type,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SubroutineBody {
    pub vars: Vec<VarDec>,
    pub statements: Statements,
}

#[derive(Clone, Debug, PartialEq)]
pub struct VarDec {
    pub ty: Type,
    pub names: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Statements(pub Vec<Statement>);

#[derive(Clone, Debug, PartialEq)]
pub enum Statement {
    Let(LetStatement),
    If(IfStatement),
    While(WhileStatement),
    Do(DoStatement),
    Return(ReturnStatement),
}

#[derive(Clone, Debug, PartialEq)]
pub struct LetStatement {
    pub name: String,
    pub index: Option<Expression>,
    pub value: Expression,
}

#[derive(Clone, Debug, PartialEq)]
pub struct IfStatement {
    pub condition: Expression,
    pub then_branch: Statements,
    pub else_branch: Option<Statements>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct WhileStatement {
    pub condition: Expression,
    pub body: Statements,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DoStatement(pub SubroutineCall);

#[derive(Clone, Debug, PartialEq)]
pub struct ReturnStatement(pub Option<Expression>);
