//! The compiled artifact ("CC" in the spec's glossary): opcode bytes plus
//! the constant pool and global symbol list it indexes into. Read-only
//! once compilation finishes; the VM only ever reads from it.

use crate::pool::{ConstantPool, GlobalTable};

pub struct CompiledArtifact {
    pub code: Vec<u8>,
    pub constants: ConstantPool,
    pub globals: GlobalTable,
}
