use std::io::BufRead;

use crate::error::{CompileResult, SyntaxSnafu};
use crate::lexer::{Keyword, Lexer, Symbol, Token};

use super::{
    cursor::TokenCursor, BinaryOp, Class, ClassVarDec, ClassVarKind, DoStatement, Expression,
    ExpressionList, IfStatement, KeywordConstant, LetStatement, Parameter, ParameterList,
    ReturnStatement, Statement, Statements, SubroutineBody, SubroutineCall, SubroutineDec,
    SubroutineKind, Term, Type, UnaryOp, VarDec, WhileStatement,
};

#[derive(Debug)]
pub struct Parser<R> {
    cursor: TokenCursor<R>,
}

impl<R: BufRead> Parser<R> {
    pub fn new(lexer: Lexer<R>) -> Self {
        Self {
            cursor: TokenCursor::new(lexer),
        }
    }

    /// Parses exactly one class; anything after its closing brace is an error.
    pub fn parse(&mut self) -> CompileResult<Class> {
        let class = self.parse_class()?;
        if let Some(token) = self.cursor.next_or_eof()? {
            return self.unexpected("end of input after class", &token);
        }
        Ok(class)
    }

    fn unexpected<T>(&self, expected: &str, found: &Token) -> CompileResult<T> {
        SyntaxSnafu {
            expected,
            found: found.to_string(),
            line: self.cursor.line(),
        }
        .fail()
    }

    fn consume(&mut self, expected: impl Into<Token>) -> CompileResult<bool> {
        let expected = expected.into();
        if self.cursor.peek()? == Some(&expected) {
            self.cursor.next_or_eof()?;
            return Ok(true);
        }
        Ok(false)
    }

    fn expect(&mut self, expected: impl Into<Token>, construct: &str) -> CompileResult<()> {
        let expected = expected.into();
        let description = format!("{} in {}", expected, construct);
        let token = self.cursor.next_token(&description)?;
        if token != expected {
            return self.unexpected(&description, &token);
        }
        Ok(())
    }

    fn expect_ident(&mut self, what: &str, construct: &str) -> CompileResult<String> {
        let description = format!("{} in {}", what, construct);
        match self.cursor.next_token(&description)? {
            Token::Identifier(name) => Ok(name),
            t => self.unexpected(&description, &t),
        }
    }

    fn peek_keyword(&mut self) -> CompileResult<Option<Keyword>> {
        match self.cursor.peek()? {
            Some(Token::Keyword(k)) => Ok(Some(*k)),
            _ => Ok(None),
        }
    }

    /// class = "class" className "{" classVarDec* subroutineDec* "}"
    fn parse_class(&mut self) -> CompileResult<Class> {
        self.expect(Keyword::Class, "class")?;
        let name = self.expect_ident("class name", "class")?;
        self.expect(Symbol::OpenCurlyBrace, "class")?;

        let mut vars = vec![];
        while let Some(kind) = self.parse_class_var_kind()? {
            vars.push(self.parse_class_var_dec(kind)?);
        }

        let mut subroutines = vec![];
        while let Some(kind) = self.parse_subroutine_kind()? {
            subroutines.push(self.parse_subroutine_dec(kind)?);
        }

        self.expect(Symbol::CloseCurlyBrace, "class")?;
        Ok(Class {
            name,
            vars,
            subroutines,
        })
    }

    fn parse_class_var_kind(&mut self) -> CompileResult<Option<ClassVarKind>> {
        if self.consume(Keyword::Static)? {
            Ok(Some(ClassVarKind::Static))
        } else if self.consume(Keyword::Field)? {
            Ok(Some(ClassVarKind::Field))
        } else {
            Ok(None)
        }
    }

    /// classVarDec = ("static" | "field") type varName ("," varName)* ";"
    fn parse_class_var_dec(&mut self, kind: ClassVarKind) -> CompileResult<ClassVarDec> {
        let ty = self.parse_type()?;
        let names = self.parse_var_names("classVarDec")?;
        Ok(ClassVarDec { kind, ty, names })
    }

    /// varName ("," varName)* ";"
    fn parse_var_names(&mut self, construct: &str) -> CompileResult<Vec<String>> {
        let mut names = vec![self.expect_ident("variable name", construct)?];
        while self.consume(Symbol::Comma)? {
            names.push(self.expect_ident("variable name", construct)?);
        }
        self.expect(Symbol::SemiColon, construct)?;
        Ok(names)
    }

    /// type = "int" | "char" | "boolean" | className
    fn parse_type(&mut self) -> CompileResult<Type> {
        match self.cursor.next_token("type")? {
            Token::Keyword(Keyword::Int) => Ok(Type::Int),
            Token::Keyword(Keyword::Char) => Ok(Type::Char),
            Token::Keyword(Keyword::Boolean) => Ok(Type::Boolean),
            Token::Identifier(name) => Ok(Type::Class(name)),
            t => self.unexpected("type", &t),
        }
    }

    fn parse_subroutine_kind(&mut self) -> CompileResult<Option<SubroutineKind>> {
        if self.consume(Keyword::Constructor)? {
            Ok(Some(SubroutineKind::Constructor))
        } else if self.consume(Keyword::Function)? {
            Ok(Some(SubroutineKind::Function))
        } else if self.consume(Keyword::Method)? {
            Ok(Some(SubroutineKind::Method))
        } else {
            Ok(None)
        }
    }

    /// subroutineDec = ("constructor" | "function" | "method") ("void" | type)
    ///                 subroutineName "(" parameterList ")" subroutineBody
    fn parse_subroutine_dec(&mut self, kind: SubroutineKind) -> CompileResult<SubroutineDec> {
        let return_type = if self.consume(Keyword::Void)? {
            None
        } else {
            Some(self.parse_type()?)
        };
        let name = self.expect_ident("subroutine name", "subroutineDec")?;
        self.expect(Symbol::OpenParen, "subroutineDec")?;
        let params = self.parse_parameter_list()?;
        self.expect(Symbol::CloseParen, "subroutineDec")?;
        let body = self.parse_subroutine_body()?;

        Ok(SubroutineDec {
            kind,
            return_type,
            name,
            params,
            body,
        })
    }

    /// parameterList = (type varName ("," type varName)*)?
    fn parse_parameter_list(&mut self) -> CompileResult<ParameterList> {
        let mut params = vec![];
        if self.cursor.peek()? == Some(&Token::Symbol(Symbol::CloseParen)) {
            return Ok(ParameterList(params));
        }

        loop {
            let ty = self.parse_type()?;
            let name = self.expect_ident("parameter name", "parameterList")?;
            params.push(Parameter { ty, name });
            if !self.consume(Symbol::Comma)? {
                break;
            }
        }
        Ok(ParameterList(params))
    }

    /// subroutineBody = "{" varDec* statements "}"
    fn parse_subroutine_body(&mut self) -> CompileResult<SubroutineBody> {
        self.expect(Symbol::OpenCurlyBrace, "subroutineBody")?;
        let mut vars = vec![];
        while self.consume(Keyword::Var)? {
            vars.push(self.parse_var_dec()?);
        }
        let statements = self.parse_statements()?;
        self.expect(Symbol::CloseCurlyBrace, "subroutineBody")?;
        Ok(SubroutineBody { vars, statements })
    }

    /// varDec = "var" type varName ("," varName)* ";"
    fn parse_var_dec(&mut self) -> CompileResult<VarDec> {
        let ty = self.parse_type()?;
        let names = self.parse_var_names("varDec")?;
        Ok(VarDec { ty, names })
    }

    /// statements = statement*
    fn parse_statements(&mut self) -> CompileResult<Statements> {
        let mut stmts = vec![];
        while let Some(stmt) = self.parse_stmt()? {
            stmts.push(stmt);
        }
        Ok(Statements(stmts))
    }

    /// stmt = letStatement | ifStatement | whileStatement | doStatement | returnStatement
    fn parse_stmt(&mut self) -> CompileResult<Option<Statement>> {
        let stmt = match self.peek_keyword()? {
            Some(Keyword::Let) => Statement::Let(self.parse_let()?),
            Some(Keyword::If) => Statement::If(self.parse_if()?),
            Some(Keyword::While) => Statement::While(self.parse_while()?),
            Some(Keyword::Do) => Statement::Do(self.parse_do()?),
            Some(Keyword::Return) => Statement::Return(self.parse_return()?),
            _ => return Ok(None),
        };
        Ok(Some(stmt))
    }

    /// letStatement = "let" varName ("[" expr "]")? "=" expr ";"
    fn parse_let(&mut self) -> CompileResult<LetStatement> {
        self.expect(Keyword::Let, "letStatement")?;
        let name = self.expect_ident("variable name", "letStatement")?;
        let index = if self.consume(Symbol::OpenSquareBrace)? {
            let index = self.parse_expr()?;
            self.expect(Symbol::CloseSquareBrace, "letStatement")?;
            Some(index)
        } else {
            None
        };
        self.expect(Symbol::Equal, "letStatement")?;
        let value = self.parse_expr()?;
        self.expect(Symbol::SemiColon, "letStatement")?;
        Ok(LetStatement { name, index, value })
    }

    /// ifStatement = "if" "(" expr ")" "{" statements "}" ("else" "{" statements "}")?
    fn parse_if(&mut self) -> CompileResult<IfStatement> {
        self.expect(Keyword::If, "ifStatement")?;
        let condition = self.parse_condition("ifStatement")?;
        let then_branch = self.parse_block("ifStatement")?;
        let else_branch = if self.consume(Keyword::Else)? {
            Some(self.parse_block("ifStatement")?)
        } else {
            None
        };
        Ok(IfStatement {
            condition,
            then_branch,
            else_branch,
        })
    }

    /// whileStatement = "while" "(" expr ")" "{" statements "}"
    fn parse_while(&mut self) -> CompileResult<WhileStatement> {
        self.expect(Keyword::While, "whileStatement")?;
        let condition = self.parse_condition("whileStatement")?;
        let body = self.parse_block("whileStatement")?;
        Ok(WhileStatement { condition, body })
    }

    fn parse_condition(&mut self, construct: &str) -> CompileResult<Expression> {
        self.expect(Symbol::OpenParen, construct)?;
        let condition = self.parse_expr()?;
        self.expect(Symbol::CloseParen, construct)?;
        Ok(condition)
    }

    fn parse_block(&mut self, construct: &str) -> CompileResult<Statements> {
        self.expect(Symbol::OpenCurlyBrace, construct)?;
        let statements = self.parse_statements()?;
        self.expect(Symbol::CloseCurlyBrace, construct)?;
        Ok(statements)
    }

    /// doStatement = "do" subroutineCall ";"
    fn parse_do(&mut self) -> CompileResult<DoStatement> {
        self.expect(Keyword::Do, "doStatement")?;
        let name = self.expect_ident("subroutine name", "doStatement")?;
        let call = match self.cursor.next_token("'.' or '(' in subroutine call")? {
            t @ Token::Symbol(Symbol::Dot | Symbol::OpenParen) => self.parse_call(name, t)?,
            t => return self.unexpected("'.' or '(' in subroutine call", &t),
        };
        self.expect(Symbol::SemiColon, "doStatement")?;
        Ok(DoStatement(call))
    }

    /// returnStatement = "return" expr? ";"
    fn parse_return(&mut self) -> CompileResult<ReturnStatement> {
        self.expect(Keyword::Return, "returnStatement")?;
        if self.consume(Symbol::SemiColon)? {
            return Ok(ReturnStatement(None));
        }
        let expr = self.parse_expr()?;
        self.expect(Symbol::SemiColon, "returnStatement")?;
        Ok(ReturnStatement(Some(expr)))
    }

    /// expr = term (op term)*
    ///
    /// No precedence: the operators are recorded in the order they appear.
    fn parse_expr(&mut self) -> CompileResult<Expression> {
        let mut expr = Expression::new(self.parse_term()?);
        while let Some(op) = self.parse_binary_op()? {
            expr.rest.push((op, self.parse_term()?));
        }
        Ok(expr)
    }

    fn parse_binary_op(&mut self) -> CompileResult<Option<BinaryOp>> {
        let op = match self.cursor.peek()? {
            Some(Token::Symbol(s)) => BinaryOp::from_symbol(*s),
            _ => None,
        };
        if op.is_some() {
            self.cursor.next_or_eof()?;
        }
        Ok(op)
    }

    /// term = integerConstant | stringConstant | keywordConstant
    ///      | unaryOp term
    ///      | "(" expr ")"
    ///      | varName
    ///      | varName "[" expr "]"
    ///      | subroutineCall
    fn parse_term(&mut self) -> CompileResult<Term> {
        match self.cursor.next_token("term")? {
            Token::IntegerConstant(n) => Ok(Term::IntegerConstant(n)),
            Token::StringConstant(s) => Ok(Term::StringConstant(s)),
            Token::Keyword(k) => match KeywordConstant::from_keyword(k) {
                Some(c) => Ok(Term::KeywordConstant(c)),
                None => self.unexpected("term", &Token::Keyword(k)),
            },
            Token::Symbol(Symbol::Minus) => {
                Ok(Term::Unary(UnaryOp::Neg, Box::new(self.parse_term()?)))
            }
            Token::Symbol(Symbol::Tilde) => {
                Ok(Term::Unary(UnaryOp::Not, Box::new(self.parse_term()?)))
            }
            Token::Symbol(Symbol::OpenParen) => {
                let expr = self.parse_expr()?;
                self.expect(Symbol::CloseParen, "term")?;
                Ok(Term::Parenthesized(Box::new(expr)))
            }
            Token::Identifier(name) => self.parse_ident(name),
            t => self.unexpected("term", &t),
        }
    }

    /// Classifies a term starting with an identifier from the token after it.
    fn parse_ident(&mut self, name: String) -> CompileResult<Term> {
        match self.cursor.next_token("token after identifier")? {
            Token::Symbol(Symbol::OpenSquareBrace) => {
                let index = self.parse_expr()?;
                self.expect(Symbol::CloseSquareBrace, "term")?;
                Ok(Term::Index(name, Box::new(index)))
            }
            t @ Token::Symbol(Symbol::Dot | Symbol::OpenParen) => {
                Ok(Term::Call(self.parse_call(name, t)?))
            }
            t => {
                // Belongs to the enclosing construct.
                self.cursor.push_back(t);
                Ok(Term::Variable(name))
            }
        }
    }

    /// subroutineCall = subroutineName "(" expressionList ")"
    ///                | (className | varName) "." subroutineName "(" expressionList ")"
    ///
    /// `first` is the identifier already read, `after` the '.' or '(' following it.
    fn parse_call(&mut self, first: String, after: Token) -> CompileResult<SubroutineCall> {
        let (receiver, name) = if after == Token::Symbol(Symbol::Dot) {
            let name = self.expect_ident("subroutine name", "subroutineCall")?;
            self.expect(Symbol::OpenParen, "subroutineCall")?;
            (Some(first), name)
        } else {
            (None, first)
        };
        let args = self.parse_expression_list()?;
        self.expect(Symbol::CloseParen, "subroutineCall")?;
        Ok(SubroutineCall {
            receiver,
            name,
            args,
        })
    }

    /// expressionList = (expr ("," expr)*)?
    fn parse_expression_list(&mut self) -> CompileResult<ExpressionList> {
        let mut exprs = vec![];
        if self.cursor.peek()? == Some(&Token::Symbol(Symbol::CloseParen)) {
            return Ok(ExpressionList(exprs));
        }
        exprs.push(self.parse_expr()?);
        while self.consume(Symbol::Comma)? {
            exprs.push(self.parse_expr()?);
        }
        Ok(ExpressionList(exprs))
    }
}
