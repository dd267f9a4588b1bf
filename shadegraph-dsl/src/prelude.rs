//! Exports everything you need to have in scope for the DSL to work

pub use shadegraph::prelude::{Builtin, Error, ErrorKind, Result, Settings, ShaderType, TypeName};

pub use crate::module::Module;
pub use crate::operations::*;
pub use crate::pointer::Pointer;
pub use crate::types::*;
pub use crate::value::{IntoValue, Value};
