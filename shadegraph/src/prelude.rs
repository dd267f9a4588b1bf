//! Exports everything you probably want to have in scope to get started with shadegraph

pub use crate::builder::{Builtin, Session, Settings};
pub use crate::errors::{Error, ErrorKind, Result};
pub use crate::graph::Value;
pub use crate::operations::{BinaryOp, UnaryOp};
pub use crate::pointer::Pointer;
pub use crate::types::*;

pub use spirv_headers::ExecutionModel as ShaderType;

/// Compile a session to the bytes of a SPIR-V module
pub fn build_program(session: &mut Session) -> Result<Vec<u8>> {
    session.compile_binary()
}

/// Compile a session to SPIR-V assembly
pub fn build_program_assembly(session: &mut Session) -> Result<String> {
    session.compile_assembly()
}
