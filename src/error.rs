//! Error taxonomy shared by every compilation and execution stage.
//!
//! Every non-[`EarlError::Halt`] variant is fatal: the CLI prints a single
//! `EARL: [KIND] message` diagnostic line and exits non-zero. There is no
//! recovery and no partial result.

use std::fmt;

/// The kinds of failure the toolchain can report.
#[derive(Debug, Clone, PartialEq)]
pub enum EarlError {
    /// Lexical analysis failed (unterminated literal, unrecognized byte).
    Lex(String),
    /// Parsing failed (unexpected token, malformed statement).
    Parse(String),
    /// A name was used before definition, or redefined in a visible scope.
    Name(String),
    /// A binary or unary operation was applied to incompatible tags.
    Type(String),
    /// Division or modulo by zero.
    Arith(String),
    /// Operand stack overflow or underflow.
    Stack(String),
    /// Malformed bytecode: unknown opcode, truncated operand, out-of-range index.
    Decode(String),
    /// Normal termination. Never printed as a diagnostic.
    Halt,
}

impl EarlError {
    /// The bracketed tag used in the diagnostic line, e.g. `"TypeError"`.
    fn kind_tag(&self) -> &'static str {
        match self {
            EarlError::Lex(_) => "LexError",
            EarlError::Parse(_) => "ParseError",
            EarlError::Name(_) => "NameError",
            EarlError::Type(_) => "TypeError",
            EarlError::Arith(_) => "ArithError",
            EarlError::Stack(_) => "StackError",
            EarlError::Decode(_) => "DecodeError",
            EarlError::Halt => "Halt",
        }
    }

    fn message(&self) -> &str {
        match self {
            EarlError::Lex(m)
            | EarlError::Parse(m)
            | EarlError::Name(m)
            | EarlError::Type(m)
            | EarlError::Arith(m)
            | EarlError::Stack(m)
            | EarlError::Decode(m) => m,
            EarlError::Halt => "",
        }
    }
}

impl fmt::Display for EarlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EARL: [{}] {}", self.kind_tag(), self.message())
    }
}

impl std::error::Error for EarlError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostic_line_format() {
        let e = EarlError::Name("identifier `x` was not defined".to_string());
        assert_eq!(
            e.to_string(),
            "EARL: [NameError] identifier `x` was not defined"
        );
    }

    #[test]
    fn each_kind_has_a_distinct_tag() {
        let kinds = [
            EarlError::Lex("".into()),
            EarlError::Parse("".into()),
            EarlError::Name("".into()),
            EarlError::Type("".into()),
            EarlError::Arith("".into()),
            EarlError::Stack("".into()),
            EarlError::Decode("".into()),
        ];
        let tags: std::collections::HashSet<_> = kinds.iter().map(|e| e.kind_tag()).collect();
        assert_eq!(tags.len(), kinds.len());
    }
}
