//! The stack-based VM: fetch/decode/dispatch over the compiled artifact's
//! opcode stream, operating on a fixed-capacity value stack and a flat
//! globals map.

use std::collections::HashMap;

use crate::artifact::CompiledArtifact;
use crate::builtins::{self, BUILTINS};
use crate::error::EarlError;
use crate::identifier::IdentifierRecord;
use crate::opcode::Opcode;
use crate::value::Value;
use tracing::trace;

/// Matches `original_source`'s `STACK_LIM`: pushing past this is a
/// `StackError`, not a resize.
const STACK_LIMIT: usize = 512;

pub struct Vm<'a> {
    artifact: &'a CompiledArtifact,
    stack: Vec<Value>,
    globals: HashMap<String, IdentifierRecord>,
    ip: usize,
}

impl<'a> Vm<'a> {
    pub fn new(artifact: &'a CompiledArtifact) -> Self {
        let mut globals = HashMap::new();
        for (name, _) in BUILTINS {
            let builtin_ref = builtins::lookup(*name).expect("name came from BUILTINS itself");
            globals.insert(
                name.to_string(),
                IdentifierRecord::new(*name, Value::BuiltinFunctionRef(builtin_ref)),
            );
        }
        Vm {
            artifact,
            stack: Vec::with_capacity(STACK_LIMIT),
            globals,
            ip: 0,
        }
    }

    /// Runs to `HALT`, returning the value left on top of the stack (or
    /// `Unit` if the stack is empty at that point).
    pub fn run(&mut self) -> Result<Value, EarlError> {
        loop {
            let ip = self.ip;
            let opcode = self.read_opcode()?;
            trace!(ip, ?opcode, stack_depth = self.stack.len(), "dispatch");
            match opcode {
                Opcode::Halt => break,
                Opcode::Const => {
                    let idx = self.read_byte()?;
                    let value = self.artifact.constants.get(idx)?.clone();
                    self.push(value)?;
                }
                Opcode::Add => self.binary_op(Value::add)?,
                Opcode::Sub => self.binary_op(Value::sub)?,
                Opcode::Mul => self.binary_op(Value::mul)?,
                Opcode::Div => self.binary_op(Value::div)?,
                Opcode::Mod => self.binary_op(Value::rem)?,
                Opcode::Store | Opcode::Load => {
                    return Err(EarlError::Decode(
                        "STORE/LOAD are reserved for local bindings, which the compiler never emits"
                            .to_string(),
                    ));
                }
                Opcode::DefGlobal => {
                    let idx = self.read_byte()?;
                    let name = self.artifact.globals.name(idx)?.to_string();
                    let value = self.pop()?;
                    self.globals.insert(name.clone(), IdentifierRecord::new(name, value));
                }
                Opcode::LoadGlobal => {
                    let idx = self.read_byte()?;
                    let name = self.artifact.globals.name(idx)?;
                    let value = self
                        .globals
                        .get(name)
                        .map(|rec| rec.value.clone())
                        .ok_or_else(|| {
                            EarlError::Name(format!("identifier `{}` was not defined", name))
                        })?;
                    self.push(value)?;
                }
                Opcode::SetGlobal => {
                    let idx = self.read_byte()?;
                    let name = self.artifact.globals.name(idx)?.to_string();
                    let value = self.pop()?;
                    let record = self.globals.get_mut(&name).ok_or_else(|| {
                        EarlError::Name(format!("identifier `{}` was not defined", name))
                    })?;
                    record.value.mutate(&value)?;
                }
                Opcode::Call => {
                    let argc = self.read_byte()? as usize;
                    self.call(argc)?;
                }
            }
        }
        Ok(self.stack.last().cloned().unwrap_or(Value::Unit))
    }

    fn call(&mut self, argc: usize) -> Result<(), EarlError> {
        let callee = self.pop()?;
        if self.stack.len() < argc {
            return Err(EarlError::Stack("not enough arguments on the stack for call".to_string()));
        }
        let args: Vec<Value> = self.stack.split_off(self.stack.len() - argc);
        match callee {
            Value::BuiltinFunctionRef(builtin) => {
                let result = (builtin.func)(&args)?;
                self.push(result)
            }
            other => Err(EarlError::Type(format!(
                "value of type {:?} is not callable",
                other
            ))),
        }
    }

    fn binary_op(
        &mut self,
        op: impl Fn(&Value, &Value) -> Result<Value, EarlError>,
    ) -> Result<(), EarlError> {
        let b = self.pop()?;
        let a = self.pop()?;
        let result = op(&a, &b)?;
        self.push(result)
    }

    fn push(&mut self, value: Value) -> Result<(), EarlError> {
        if self.stack.len() >= STACK_LIMIT {
            return Err(EarlError::Stack(format!(
                "value stack exceeded its {} entry limit",
                STACK_LIMIT
            )));
        }
        self.stack.push(value);
        Ok(())
    }

    fn pop(&mut self) -> Result<Value, EarlError> {
        self.stack
            .pop()
            .ok_or_else(|| EarlError::Stack("pop from an empty value stack".to_string()))
    }

    fn read_byte(&mut self) -> Result<u8, EarlError> {
        let byte = *self
            .artifact
            .code
            .get(self.ip)
            .ok_or_else(|| EarlError::Decode("unexpected end of bytecode stream".to_string()))?;
        self.ip += 1;
        Ok(byte)
    }

    fn read_opcode(&mut self) -> Result<Opcode, EarlError> {
        let byte = self.read_byte()?;
        Opcode::from_byte(byte)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::Compiler;
    use crate::lexer::Lexer;
    use crate::parser::Parser;

    fn run(src: &str) -> Result<Value, EarlError> {
        let tokens = Lexer::new(src).tokenize().unwrap();
        let program = Parser::new(tokens).parse_program().unwrap();
        let artifact = Compiler::new().unwrap().compile(&program).unwrap();
        Vm::new(&artifact).run()
    }

    #[test]
    fn s2_arithmetic_leaves_final_value_on_stack() {
        let result = run("let a = 10; let b = 20; a + b;").unwrap();
        assert_eq!(result, Value::Integer(30));
    }

    #[test]
    fn s6_compound_assignment_mutates_global() {
        let result = run("let x = 1; x += 41; x;").unwrap();
        assert_eq!(result, Value::Integer(42));
    }

    #[test]
    fn s7_string_concat_via_plus() {
        let result = run("let a = \"foo\"; let b = \"bar\"; a + b;").unwrap();
        assert_eq!(result.to_display_string(), "foobar");
    }

    #[test]
    fn s8_stack_overflow_is_stack_error() {
        // Each bare `a;` statement loads the same global and leaves it on
        // the stack; past the 512-entry limit this must fail cleanly
        // rather than grow the stack unboundedly.
        let mut src = String::from("let a = 1;\n");
        for _ in 0..600 {
            src.push_str("a;\n");
        }
        let err = run(&src).unwrap_err();
        assert!(matches!(err, EarlError::Stack(_)));
    }

    #[test]
    fn s9_division_by_zero_is_arith_error() {
        let err = run("let x = 1 / 0;").unwrap_err();
        assert!(matches!(err, EarlError::Arith(_)));
    }

    #[test]
    fn calling_a_non_callable_value_is_type_error() {
        let err = run("let x = 1; x();").unwrap_err();
        assert!(matches!(err, EarlError::Type(_)));
    }

    #[test]
    fn println_returns_unit() {
        let result = run("println(\"hi\");").unwrap();
        assert_eq!(result, Value::Unit);
    }

    #[test]
    fn empty_program_halts_with_unit() {
        let result = run("").unwrap();
        assert_eq!(result, Value::Unit);
    }
}
