//! Tree-walking compiler: lowers a [`Program`] to a flat bytecode stream,
//! seeding the constant pool from literals and the global list from `let`
//! bindings and the builtin prelude.

use crate::ast::{Block, Expr, Program, Statement, Term};
use crate::artifact::CompiledArtifact;
use crate::builtins::BUILTINS;
use crate::context::CompileContext;
use crate::error::EarlError;
use crate::opcode::Opcode;
use crate::pool::{ConstantPool, GlobalTable};
use crate::token::{Token, TokenKind};
use crate::value::Value;
use tracing::debug;

pub struct Compiler {
    code: Vec<u8>,
    constants: ConstantPool,
    globals: GlobalTable,
    context: CompileContext,
}

impl Compiler {
    pub fn new() -> Result<Self, EarlError> {
        let mut globals = GlobalTable::new();
        // Builtin prelude: reserve global indices 0..B-1 in canonical order,
        // mirrored by the VM's init so compiler and runtime indices agree.
        for (name, _) in BUILTINS {
            globals.push(*name)?;
        }
        Ok(Compiler {
            code: Vec::new(),
            constants: ConstantPool::new(),
            globals,
            context: CompileContext::new(),
        })
    }

    pub fn compile(mut self, program: &Program) -> Result<CompiledArtifact, EarlError> {
        for stmt in &program.statements {
            self.compile_statement(stmt)?;
        }
        self.emit(Opcode::Halt);
        Ok(CompiledArtifact {
            code: self.code,
            constants: self.constants,
            globals: self.globals,
        })
    }

    // --- emission helpers ----------------------------------------------------

    fn emit(&mut self, op: Opcode) {
        self.code.push(op.to_byte());
    }

    fn emit_operand(&mut self, byte: u8) {
        self.code.push(byte);
    }

    fn global_index_of(&self, name: &str) -> Result<u8, EarlError> {
        self.globals
            .as_slice()
            .iter()
            .position(|n| n == name)
            .map(|i| i as u8)
            .ok_or_else(|| EarlError::Name(format!("identifier `{}` was not defined", name)))
    }

    fn unsupported(&self, what: &str) -> EarlError {
        EarlError::Name(format!("{} is not yet compiled", what))
    }

    // --- statements ------------------------------------------------------------

    fn compile_statement(&mut self, stmt: &Statement) -> Result<(), EarlError> {
        match stmt {
            Statement::Let { name, value } => self.compile_let(name, value),
            Statement::Fn { .. } => Err(self.unsupported("function definitions")),
            Statement::Block(block) => self.compile_block(block),
            Statement::Mut { left, op, right } => self.compile_mut(left, op, right),
            Statement::ExprStmt(expr) => self.compile_expr(expr),
            Statement::Return(_) => Err(self.unsupported("return statements")),
            Statement::If { .. } => Err(self.unsupported("if/else")),
        }
    }

    fn compile_let(&mut self, name: &Token, value: &Expr) -> Result<(), EarlError> {
        self.context.assert_not_defined(&self.globals, &name.lexeme)?;
        self.compile_expr(value)?;
        let idx = self.globals.push(name.lexeme.clone())?;
        self.context.declare(&name.lexeme);
        debug!(name = %name.lexeme, index = idx, "declared global");
        self.emit(Opcode::DefGlobal);
        self.emit_operand(idx);
        Ok(())
    }

    fn compile_block(&mut self, block: &Block) -> Result<(), EarlError> {
        self.context.open_scope();
        for stmt in &block.statements {
            if let Err(e) = self.compile_statement(stmt) {
                self.context.close_scope();
                return Err(e);
            }
        }
        self.context.close_scope();
        Ok(())
    }

    fn compile_mut(&mut self, left: &Expr, op: &Token, right: &Expr) -> Result<(), EarlError> {
        let Expr::Term(Term::Identifier(name_tok)) = left else {
            return Err(EarlError::Name(
                "left-hand side of an assignment must be an identifier".to_string(),
            ));
        };
        self.context
            .assert_defined(&self.globals, &name_tok.lexeme)?;
        let idx = self.global_index_of(&name_tok.lexeme)?;

        match op.kind {
            TokenKind::Equals => {
                self.compile_expr(right)?;
            }
            TokenKind::PlusEquals
            | TokenKind::MinusEquals
            | TokenKind::AsteriskEquals
            | TokenKind::ForwardSlashEquals => {
                self.emit(Opcode::LoadGlobal);
                self.emit_operand(idx);
                self.compile_expr(right)?;
                self.emit(arithmetic_opcode_for_compound(op.kind));
            }
            _ => {
                return Err(EarlError::Parse(format!(
                    "'{}' is not a valid assignment operator",
                    op.lexeme
                )));
            }
        }

        self.emit(Opcode::SetGlobal);
        self.emit_operand(idx);
        Ok(())
    }

    // --- expressions -------------------------------------------------------

    fn compile_expr(&mut self, expr: &Expr) -> Result<(), EarlError> {
        match expr {
            Expr::Term(term) => self.compile_term(term),
            Expr::Binary { left, op, right } => self.compile_binary(left, op, right),
            Expr::Unary { .. } => Err(self.unsupported("unary operators")),
        }
    }

    fn compile_binary(&mut self, left: &Expr, op: &Token, right: &Expr) -> Result<(), EarlError> {
        self.compile_expr(left)?;
        self.compile_expr(right)?;
        let opcode = match op.kind {
            TokenKind::Plus => Opcode::Add,
            TokenKind::Minus => Opcode::Sub,
            TokenKind::Asterisk => Opcode::Mul,
            TokenKind::ForwardSlash => Opcode::Div,
            TokenKind::Percent => Opcode::Mod,
            _ => {
                return Err(EarlError::Name(format!(
                    "operator '{}' is not yet compiled",
                    op.lexeme
                )));
            }
        };
        self.emit(opcode);
        Ok(())
    }

    fn compile_term(&mut self, term: &Term) -> Result<(), EarlError> {
        match term {
            Term::Identifier(tok) => {
                self.context.assert_defined(&self.globals, &tok.lexeme)?;
                let idx = self.global_index_of(&tok.lexeme)?;
                self.emit(Opcode::LoadGlobal);
                self.emit_operand(idx);
                Ok(())
            }
            Term::IntegerLiteral(tok) => {
                let n: i32 = tok.lexeme.parse().map_err(|_| {
                    EarlError::Parse(format!("'{}' is not a valid integer literal", tok.lexeme))
                })?;
                let idx = self.constants.push(Value::Integer(n))?;
                self.emit(Opcode::Const);
                self.emit_operand(idx);
                Ok(())
            }
            Term::StringLiteral(tok) => {
                let idx = self.constants.push(Value::new_string(tok.lexeme.clone()))?;
                self.emit(Opcode::Const);
                self.emit_operand(idx);
                Ok(())
            }
            Term::CharacterLiteral(tok) => {
                let ch = tok.lexeme.chars().next().ok_or_else(|| {
                    EarlError::Parse("empty character literal".to_string())
                })?;
                let idx = self.constants.push(Value::Integer(ch as i32))?;
                self.emit(Opcode::Const);
                self.emit_operand(idx);
                Ok(())
            }
            Term::FunctionCall { callee, args } => {
                if args.len() > u8::MAX as usize {
                    return Err(EarlError::Parse("too many call arguments".to_string()));
                }
                for arg in args {
                    self.compile_expr(arg)?;
                }
                self.compile_expr(callee)?;
                self.emit(Opcode::Call);
                self.emit_operand(args.len() as u8);
                Ok(())
            }
        }
    }
}

fn arithmetic_opcode_for_compound(kind: TokenKind) -> Opcode {
    match kind {
        TokenKind::PlusEquals => Opcode::Add,
        TokenKind::MinusEquals => Opcode::Sub,
        TokenKind::AsteriskEquals => Opcode::Mul,
        TokenKind::ForwardSlashEquals => Opcode::Div,
        _ => unreachable!("caller only passes compound assignment kinds"),
    }
}
