//! EARL: lexer, parser, tree-walking compiler, flat bytecode, stack VM.

pub mod artifact;
pub mod ast;
pub mod builtins;
pub mod compiler;
pub mod context;
pub mod error;
pub mod identifier;
pub mod lexer;
pub mod opcode;
pub mod parser;
pub mod pool;
pub mod token;
pub mod value;
pub mod vm;

use compiler::Compiler;
use error::EarlError;
use lexer::Lexer;
use parser::Parser;
use value::Value;
use vm::Vm;

/// Runs a complete source string through the full pipeline: lex, parse,
/// compile, execute. Returns the value left on top of the VM's stack when
/// the program halts.
pub fn run_source(source: &str) -> Result<Value, EarlError> {
    let tokens = Lexer::new(source).tokenize()?;
    let program = Parser::new(tokens).parse_program()?;
    let artifact = Compiler::new()?.compile(&program)?;
    let mut vm = Vm::new(&artifact);
    vm.run()
}
