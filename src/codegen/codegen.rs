use log::debug;

use crate::{
    analyzer::{SymbolKind, SymbolTable},
    error::CompileResult,
    parser::{
        BinaryOp, Class, ClassVarKind, DoStatement, Expression, IfStatement, KeywordConstant,
        LetStatement, ReturnStatement, Statement, Statements, SubroutineCall, SubroutineDec,
        SubroutineKind, Term, UnaryOp, WhileStatement,
    },
};

use super::{Arithmetic, Instruction, Segment};

pub struct Codegen {
    label_index: usize,
    symbol_table: SymbolTable,
    instructions: Vec<Instruction>,
}

impl Codegen {
    pub fn new(class_name: &str) -> Self {
        Self {
            label_index: 0,
            symbol_table: SymbolTable::new(class_name),
            instructions: vec![],
        }
    }

    /// Compiles one class. Nothing is returned unless every subroutine compiled.
    pub fn generate(class: &Class) -> CompileResult<Vec<Instruction>> {
        let mut codegen = Codegen::new(&class.name);
        codegen.gen_class(class)?;
        Ok(codegen.instructions)
    }

    fn emit(&mut self, instruction: Instruction) {
        self.instructions.push(instruction);
    }

    fn push(&mut self, segment: Segment, index: usize) {
        self.emit(Instruction::Push(segment, index));
    }

    fn pop(&mut self, segment: Segment, index: usize) {
        self.emit(Instruction::Pop(segment, index));
    }

    fn arithmetic(&mut self, op: Arithmetic) {
        self.emit(Instruction::Arithmetic(op));
    }

    fn call(&mut self, name: impl Into<String>, args: usize) {
        self.emit(Instruction::Call(name.into(), args));
    }

    fn new_label(&mut self) -> String {
        let s = format!("{}${}", self.symbol_table.subroutine_name(), self.label_index);
        self.label_index += 1;
        s
    }

    fn var_location(&self, name: &str) -> CompileResult<(Segment, usize)> {
        let kind = self.symbol_table.kind_of(name)?;
        Ok((kind.segment(), self.symbol_table.index_of(name)?))
    }

    fn push_var(&mut self, name: &str) -> CompileResult<()> {
        let (segment, index) = self.var_location(name)?;
        self.push(segment, index);
        Ok(())
    }

    fn pop_var(&mut self, name: &str) -> CompileResult<()> {
        let (segment, index) = self.var_location(name)?;
        self.pop(segment, index);
        Ok(())
    }

    fn gen_class(&mut self, class: &Class) -> CompileResult<()> {
        for var in &class.vars {
            let kind = match var.kind {
                ClassVarKind::Static => SymbolKind::Static,
                ClassVarKind::Field => SymbolKind::Field,
            };
            for name in &var.names {
                self.symbol_table.define(name, var.ty.name(), kind)?;
            }
        }

        for subroutine in &class.subroutines {
            self.gen_subroutine(subroutine)?;
        }
        Ok(())
    }

    fn gen_subroutine(&mut self, subroutine: &SubroutineDec) -> CompileResult<()> {
        debug!(
            "compiling {}.{}",
            self.symbol_table.class_name(),
            subroutine.name
        );
        self.symbol_table.start_subroutine(&subroutine.name);
        self.label_index = 0;

        for param in &subroutine.params.0 {
            self.symbol_table
                .define(&param.name, param.ty.name(), SymbolKind::Argument)?;
        }
        for var in &subroutine.body.vars {
            for name in &var.names {
                self.symbol_table
                    .define(name, var.ty.name(), SymbolKind::Local)?;
            }
        }

        let name = format!("{}.{}", self.symbol_table.class_name(), subroutine.name);
        let locals = self.symbol_table.var_count(SymbolKind::Local);
        self.emit(Instruction::Function(name, locals));

        match subroutine.kind {
            SubroutineKind::Constructor => {
                // Memory.alloc(0) is not a valid allocation.
                let size = self.symbol_table.var_count(SymbolKind::Field).max(1);
                self.push(Segment::Constant, size);
                self.call("Memory.alloc", 1);
                self.pop(Segment::Pointer, 0);
            }
            SubroutineKind::Method => {
                self.push(Segment::Argument, 0);
                self.pop(Segment::Pointer, 0);
                self.symbol_table.shift_arguments();
            }
            SubroutineKind::Function => (),
        }

        debug!("{}", self.symbol_table);
        self.gen_statements(&subroutine.body.statements)
    }

    fn gen_statements(&mut self, statements: &Statements) -> CompileResult<()> {
        for stmt in &statements.0 {
            self.gen_stmt(stmt)?;
        }
        Ok(())
    }

    fn gen_stmt(&mut self, stmt: &Statement) -> CompileResult<()> {
        match stmt {
            Statement::Let(s) => self.gen_let(s),
            Statement::If(s) => self.gen_if(s),
            Statement::While(s) => self.gen_while(s),
            Statement::Do(s) => self.gen_do(s),
            Statement::Return(s) => self.gen_return(s),
        }
    }

    fn gen_let(&mut self, stmt: &LetStatement) -> CompileResult<()> {
        match &stmt.index {
            None => {
                self.gen_expr(&stmt.value)?;
                self.pop_var(&stmt.name)
            }
            Some(index) => {
                // index, value, then base: the address is formed last.
                self.gen_expr(index)?;
                self.gen_expr(&stmt.value)?;
                self.push_var(&stmt.name)?;
                self.arithmetic(Arithmetic::Add);
                self.pop(Segment::Pointer, 1);
                self.pop(Segment::That, 0);
                Ok(())
            }
        }
    }

    fn gen_if(&mut self, stmt: &IfStatement) -> CompileResult<()> {
        self.gen_expr(&stmt.condition)?;
        self.arithmetic(Arithmetic::Not);

        match &stmt.else_branch {
            None => {
                let end_label = self.new_label();
                self.emit(Instruction::IfGoto(end_label.clone()));
                self.gen_statements(&stmt.then_branch)?;
                self.emit(Instruction::Label(end_label));
            }
            Some(else_branch) => {
                let else_label = self.new_label();
                let end_label = self.new_label();
                self.emit(Instruction::IfGoto(else_label.clone()));
                self.gen_statements(&stmt.then_branch)?;
                self.emit(Instruction::Goto(end_label.clone()));
                self.emit(Instruction::Label(else_label));
                self.gen_statements(else_branch)?;
                self.emit(Instruction::Label(end_label));
            }
        }
        Ok(())
    }

    fn gen_while(&mut self, stmt: &WhileStatement) -> CompileResult<()> {
        let begin_label = self.new_label();
        let end_label = self.new_label();

        self.emit(Instruction::Label(begin_label.clone()));
        self.gen_expr(&stmt.condition)?;
        self.arithmetic(Arithmetic::Not);
        self.emit(Instruction::IfGoto(end_label.clone()));
        self.gen_statements(&stmt.body)?;
        self.emit(Instruction::Goto(begin_label));
        self.emit(Instruction::Label(end_label));
        Ok(())
    }

    /// Every call leaves exactly one value behind; a `do` leaves it there.
    fn gen_do(&mut self, stmt: &DoStatement) -> CompileResult<()> {
        self.gen_call(&stmt.0)
    }

    fn gen_return(&mut self, stmt: &ReturnStatement) -> CompileResult<()> {
        if let Some(expr) = &stmt.0 {
            self.gen_expr(expr)?;
        }
        self.emit(Instruction::Return);
        Ok(())
    }

    /// Operands are evaluated and combined strictly left to right.
    fn gen_expr(&mut self, expr: &Expression) -> CompileResult<()> {
        self.gen_term(&expr.term)?;
        for (op, term) in &expr.rest {
            self.gen_term(term)?;
            self.gen_binary_op(*op);
        }
        Ok(())
    }

    fn gen_binary_op(&mut self, op: BinaryOp) {
        match op {
            BinaryOp::Add => self.arithmetic(Arithmetic::Add),
            BinaryOp::Sub => self.arithmetic(Arithmetic::Sub),
            BinaryOp::Mul => self.call("Math.multiply", 2),
            BinaryOp::Div => self.call("Math.divide", 2),
            BinaryOp::And => self.arithmetic(Arithmetic::And),
            BinaryOp::Or => self.arithmetic(Arithmetic::Or),
            BinaryOp::LessThan => self.arithmetic(Arithmetic::Lt),
            BinaryOp::GreaterThan => self.arithmetic(Arithmetic::Gt),
            BinaryOp::Equal => self.arithmetic(Arithmetic::Eq),
        }
    }

    fn gen_term(&mut self, term: &Term) -> CompileResult<()> {
        match term {
            Term::IntegerConstant(n) => self.push(Segment::Constant, usize::from(*n)),
            Term::StringConstant(s) => self.gen_string(s),
            Term::KeywordConstant(c) => self.gen_keyword_constant(*c),
            Term::Variable(name) => self.push_var(name)?,
            Term::Index(name, index) => {
                self.push_var(name)?;
                self.gen_expr(index)?;
                self.arithmetic(Arithmetic::Add);
                self.pop(Segment::Pointer, 1);
                self.push(Segment::That, 0);
            }
            Term::Call(call) => self.gen_call(call)?,
            Term::Parenthesized(expr) => self.gen_expr(expr)?,
            Term::Unary(op, inner) => {
                self.gen_term(inner)?;
                match op {
                    UnaryOp::Neg => self.arithmetic(Arithmetic::Neg),
                    UnaryOp::Not => self.arithmetic(Arithmetic::Not),
                }
            }
        }
        Ok(())
    }

    fn gen_string(&mut self, s: &str) {
        self.push(Segment::Constant, s.chars().count());
        self.call("String.new", 1);
        for c in s.chars() {
            self.push(Segment::Constant, c as usize);
            self.call("String.appendChar", 2);
        }
    }

    fn gen_keyword_constant(&mut self, c: KeywordConstant) {
        match c {
            KeywordConstant::True => {
                self.push(Segment::Constant, 0);
                self.arithmetic(Arithmetic::Not);
            }
            KeywordConstant::False | KeywordConstant::Null => self.push(Segment::Constant, 0),
            KeywordConstant::This => self.push(Segment::Pointer, 0),
        }
    }

    /// A receiver the symbol table knows is an object: it is pushed as the
    /// hidden first argument and its declared type names the class. Any other
    /// receiver is taken as a class name. Without a receiver the call is a
    /// method on the current object.
    fn gen_call(&mut self, call: &SubroutineCall) -> CompileResult<()> {
        let (target, receiver_args) = match &call.receiver {
            None => {
                self.push(Segment::Pointer, 0);
                let class_name = self.symbol_table.class_name();
                (format!("{}.{}", class_name, call.name), 1)
            }
            Some(receiver) => match self.symbol_table.get(receiver) {
                Some(symbol) => {
                    let (segment, index) = (symbol.kind.segment(), symbol.index);
                    let target = format!("{}.{}", symbol.ty, call.name);
                    self.push(segment, index);
                    (target, 1)
                }
                None => (format!("{}.{}", receiver, call.name), 0),
            },
        };

        for arg in &call.args.0 {
            self.gen_expr(arg)?;
        }
        self.call(target, call.args.0.len() + receiver_args);
        Ok(())
    }
}
