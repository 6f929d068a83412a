//! The VM's mutable global binding.

use crate::value::Value;

/// `{name, value, refcount}` from the spec's glossary. `refcount` is
/// reserved for future sharing (closures) once user-defined functions
/// land; a single-owner model (the globals map owns the record) is
/// sufficient today, so it is always 1.
#[derive(Debug, Clone, PartialEq)]
pub struct IdentifierRecord {
    pub name: String,
    pub value: Value,
    pub refcount: u32,
}

impl IdentifierRecord {
    pub fn new(name: impl Into<String>, value: Value) -> Self {
        IdentifierRecord {
            name: name.into(),
            value,
            refcount: 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_record_starts_with_refcount_one() {
        let rec = IdentifierRecord::new("x", Value::Integer(1));
        assert_eq!(rec.refcount, 1);
        assert_eq!(rec.name, "x");
    }
}
