//! Compile an in-memory shader expression graph to a SPIR-V module
//!
//! A `Session` is built for a shader stage and a list of input types. Values
//! are combined through the session methods, which check the operand types
//! as soon as a node is built; loads, stores and control flow blocks are
//! recorded in program order. `compile` then lowers everything to a list of
//! SPIR-V words and resets the session for the next shader.
//!
//! ```
//! # extern crate shadegraph;
//! # use shadegraph::prelude::*;
//! # fn main() -> shadegraph::errors::Result<()> {
//! // A vec3 normal at input location 0
//! let mut session = Session::with_inputs(ShaderType::Fragment, &[TypeName::vec(3)])?;
//! let normal = session.input(0)?;
//!
//! // A constant light direction
//! let x = session.float(0.3)?;
//! let y = session.float(-0.5)?;
//! let z = session.float(0.2)?;
//! let light_dir = session.construct(TypeName::vec(3), &[x, y, z])?;
//!
//! // Light intensity, scaled by a constant factor
//! let intensity = session.dot(normal, light_dir)?;
//! let factor = session.float(0.8)?;
//! let light = session.mul(intensity, factor)?;
//!
//! // Written to the output at location 0
//! session.output(light)?;
//!
//! let words = session.compile()?;
//! assert_eq!(words[0], 0x0723_0203);
//! # Ok(())
//! # }
//! ```

#![warn(clippy::pedantic)]

#[macro_use]
extern crate error_chain;

mod builder;
mod encoder;
mod events;
mod graph;
mod node;
mod pointer;

pub mod errors;
pub mod operations;
pub mod prelude;
pub mod types;

pub use crate::builder::{Builtin, Session, Settings};
pub use crate::encoder::string_word_count;
pub use crate::graph::Value;
pub use crate::pointer::Pointer;
