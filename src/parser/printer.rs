//! Walks a syntax tree back into its token sequence.
//!
//! The walk reports every grammar production it enters and leaves, so the
//! same traversal drives both the source printer below and the XML output of
//! the syntax analyzer.

use std::fmt::{self, Display, Formatter};

use crate::lexer::{Keyword, Symbol, Token};

use super::{
    Class, ClassVarDec, ClassVarKind, Expression, ExpressionList, ParameterList, Statement,
    Statements, SubroutineBody, SubroutineCall, SubroutineDec, SubroutineKind, Term, Type, VarDec,
};

pub trait TreeSink {
    fn open(&mut self, production: &'static str);
    fn close(&mut self, production: &'static str);
    fn token(&mut self, token: Token);
}

fn keyword(sink: &mut dyn TreeSink, k: Keyword) {
    sink.token(Token::Keyword(k));
}

fn symbol(sink: &mut dyn TreeSink, s: Symbol) {
    sink.token(Token::Symbol(s));
}

fn ident(sink: &mut dyn TreeSink, name: &str) {
    sink.token(Token::Identifier(name.to_string()));
}

fn ty(sink: &mut dyn TreeSink, t: &Type) {
    match t {
        Type::Int => keyword(sink, Keyword::Int),
        Type::Char => keyword(sink, Keyword::Char),
        Type::Boolean => keyword(sink, Keyword::Boolean),
        Type::Class(name) => ident(sink, name),
    }
}

fn names(sink: &mut dyn TreeSink, names: &[String]) {
    for (i, name) in names.iter().enumerate() {
        if i > 0 {
            symbol(sink, Symbol::Comma);
        }
        ident(sink, name);
    }
}

pub fn walk_class(class: &Class, sink: &mut dyn TreeSink) {
    sink.open("class");
    keyword(sink, Keyword::Class);
    ident(sink, &class.name);
    symbol(sink, Symbol::OpenCurlyBrace);
    for var in &class.vars {
        walk_class_var_dec(var, sink);
    }
    for subroutine in &class.subroutines {
        walk_subroutine_dec(subroutine, sink);
    }
    symbol(sink, Symbol::CloseCurlyBrace);
    sink.close("class");
}

fn walk_class_var_dec(var: &ClassVarDec, sink: &mut dyn TreeSink) {
    sink.open("classVarDec");
    keyword(
        sink,
        match var.kind {
            ClassVarKind::Static => Keyword::Static,
            ClassVarKind::Field => Keyword::Field,
        },
    );
    ty(sink, &var.ty);
    names(sink, &var.names);
    symbol(sink, Symbol::SemiColon);
    sink.close("classVarDec");
}

pub fn walk_subroutine_dec(subroutine: &SubroutineDec, sink: &mut dyn TreeSink) {
    sink.open("subroutineDec");
    keyword(
        sink,
        match subroutine.kind {
            SubroutineKind::Constructor => Keyword::Constructor,
            SubroutineKind::Function => Keyword::Function,
            SubroutineKind::Method => Keyword::Method,
        },
    );
    match &subroutine.return_type {
        Some(t) => ty(sink, t),
        None => keyword(sink, Keyword::Void),
    }
    ident(sink, &subroutine.name);
    symbol(sink, Symbol::OpenParen);
    walk_parameter_list(&subroutine.params, sink);
    symbol(sink, Symbol::CloseParen);
    walk_subroutine_body(&subroutine.body, sink);
    sink.close("subroutineDec");
}

fn walk_parameter_list(params: &ParameterList, sink: &mut dyn TreeSink) {
    sink.open("parameterList");
    for (i, param) in params.0.iter().enumerate() {
        if i > 0 {
            symbol(sink, Symbol::Comma);
        }
        ty(sink, &param.ty);
        ident(sink, &param.name);
    }
    sink.close("parameterList");
}

fn walk_subroutine_body(body: &SubroutineBody, sink: &mut dyn TreeSink) {
    sink.open("subroutineBody");
    symbol(sink, Symbol::OpenCurlyBrace);
    for var in &body.vars {
        walk_var_dec(var, sink);
    }
    walk_statements(&body.statements, sink);
    symbol(sink, Symbol::CloseCurlyBrace);
    sink.close("subroutineBody");
}

fn walk_var_dec(var: &VarDec, sink: &mut dyn TreeSink) {
    sink.open("varDec");
    keyword(sink, Keyword::Var);
    ty(sink, &var.ty);
    names(sink, &var.names);
    symbol(sink, Symbol::SemiColon);
    sink.close("varDec");
}

fn walk_statements(statements: &Statements, sink: &mut dyn TreeSink) {
    sink.open("statements");
    for stmt in &statements.0 {
        walk_stmt(stmt, sink);
    }
    sink.close("statements");
}

fn walk_block(statements: &Statements, sink: &mut dyn TreeSink) {
    symbol(sink, Symbol::OpenCurlyBrace);
    walk_statements(statements, sink);
    symbol(sink, Symbol::CloseCurlyBrace);
}

fn walk_condition(condition: &Expression, sink: &mut dyn TreeSink) {
    symbol(sink, Symbol::OpenParen);
    walk_expr(condition, sink);
    symbol(sink, Symbol::CloseParen);
}

pub fn walk_stmt(stmt: &Statement, sink: &mut dyn TreeSink) {
    match stmt {
        Statement::Let(s) => {
            sink.open("letStatement");
            keyword(sink, Keyword::Let);
            ident(sink, &s.name);
            if let Some(index) = &s.index {
                symbol(sink, Symbol::OpenSquareBrace);
                walk_expr(index, sink);
                symbol(sink, Symbol::CloseSquareBrace);
            }
            symbol(sink, Symbol::Equal);
            walk_expr(&s.value, sink);
            symbol(sink, Symbol::SemiColon);
            sink.close("letStatement");
        }
        Statement::If(s) => {
            sink.open("ifStatement");
            keyword(sink, Keyword::If);
            walk_condition(&s.condition, sink);
            walk_block(&s.then_branch, sink);
            if let Some(else_branch) = &s.else_branch {
                keyword(sink, Keyword::Else);
                walk_block(else_branch, sink);
            }
            sink.close("ifStatement");
        }
        Statement::While(s) => {
            sink.open("whileStatement");
            keyword(sink, Keyword::While);
            walk_condition(&s.condition, sink);
            walk_block(&s.body, sink);
            sink.close("whileStatement");
        }
        Statement::Do(s) => {
            sink.open("doStatement");
            keyword(sink, Keyword::Do);
            walk_call(&s.0, sink);
            symbol(sink, Symbol::SemiColon);
            sink.close("doStatement");
        }
        Statement::Return(s) => {
            sink.open("returnStatement");
            keyword(sink, Keyword::Return);
            if let Some(expr) = &s.0 {
                walk_expr(expr, sink);
            }
            symbol(sink, Symbol::SemiColon);
            sink.close("returnStatement");
        }
    }
}

pub fn walk_expr(expr: &Expression, sink: &mut dyn TreeSink) {
    sink.open("expression");
    walk_term(&expr.term, sink);
    for (op, term) in &expr.rest {
        symbol(sink, op.symbol());
        walk_term(term, sink);
    }
    sink.close("expression");
}

pub fn walk_term(term: &Term, sink: &mut dyn TreeSink) {
    sink.open("term");
    match term {
        Term::IntegerConstant(n) => sink.token(Token::IntegerConstant(*n)),
        Term::StringConstant(s) => sink.token(Token::StringConstant(s.clone())),
        Term::KeywordConstant(c) => keyword(sink, c.keyword()),
        Term::Variable(name) => ident(sink, name),
        Term::Index(name, index) => {
            ident(sink, name);
            symbol(sink, Symbol::OpenSquareBrace);
            walk_expr(index, sink);
            symbol(sink, Symbol::CloseSquareBrace);
        }
        Term::Call(call) => walk_call(call, sink),
        Term::Parenthesized(expr) => {
            symbol(sink, Symbol::OpenParen);
            walk_expr(expr, sink);
            symbol(sink, Symbol::CloseParen);
        }
        Term::Unary(op, inner) => {
            symbol(sink, op.symbol());
            walk_term(inner, sink);
        }
    }
    sink.close("term");
}

/// A call is not a production of its own; its tokens belong to the
/// enclosing `doStatement` or `term`.
fn walk_call(call: &SubroutineCall, sink: &mut dyn TreeSink) {
    if let Some(receiver) = &call.receiver {
        ident(sink, receiver);
        symbol(sink, Symbol::Dot);
    }
    ident(sink, &call.name);
    symbol(sink, Symbol::OpenParen);
    walk_expression_list(&call.args, sink);
    symbol(sink, Symbol::CloseParen);
}

fn walk_expression_list(list: &ExpressionList, sink: &mut dyn TreeSink) {
    sink.open("expressionList");
    for (i, expr) in list.0.iter().enumerate() {
        if i > 0 {
            symbol(sink, Symbol::Comma);
        }
        walk_expr(expr, sink);
    }
    sink.close("expressionList");
}

/// Renders tokens back to source text, one statement per line.
#[derive(Debug)]
pub struct SourcePrinter {
    out: String,
    indent: usize,
    line_start: bool,
}

impl SourcePrinter {
    pub fn new() -> Self {
        Self {
            out: String::new(),
            indent: 0,
            line_start: true,
        }
    }

    pub fn finish(self) -> String {
        self.out
    }
}

impl Default for SourcePrinter {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeSink for SourcePrinter {
    fn open(&mut self, _production: &'static str) {}

    fn close(&mut self, _production: &'static str) {}

    fn token(&mut self, token: Token) {
        if token == Token::Symbol(Symbol::CloseCurlyBrace) {
            self.indent = self.indent.saturating_sub(1);
        }
        if self.line_start {
            self.out.push_str(&"    ".repeat(self.indent));
            self.line_start = false;
        } else {
            self.out.push(' ');
        }

        match &token {
            Token::StringConstant(s) => {
                self.out.push('"');
                self.out.push_str(s);
                self.out.push('"');
            }
            t => self.out.push_str(&t.lexeme()),
        }

        if let Token::Symbol(s @ (Symbol::SemiColon | Symbol::OpenCurlyBrace | Symbol::CloseCurlyBrace)) =
            token
        {
            if s == Symbol::OpenCurlyBrace {
                self.indent += 1;
            }
            self.out.push('\n');
            self.line_start = true;
        }
    }
}

fn print_with(f: &mut Formatter<'_>, walk: impl FnOnce(&mut dyn TreeSink)) -> fmt::Result {
    let mut printer = SourcePrinter::new();
    walk(&mut printer);
    f.write_str(printer.finish().trim_end())
}

impl Display for Class {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        print_with(f, |sink| walk_class(self, sink))
    }
}

impl Display for SubroutineDec {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        print_with(f, |sink| walk_subroutine_dec(self, sink))
    }
}

impl Display for Statement {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        print_with(f, |sink| walk_stmt(self, sink))
    }
}

impl Display for Expression {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        print_with(f, |sink| walk_expr(self, sink))
    }
}

impl Display for Term {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        print_with(f, |sink| walk_term(self, sink))
    }
}
