//! Exposes a simple typed DSL for the construction of shader graphs for the shadegraph compiler
//!
//! ```
//! # extern crate shadegraph_dsl;
//! # use shadegraph_dsl::prelude::*;
//! # fn main() {
//! let module = Module::build(ShaderType::Fragment, |module| {
//!     let normal = module.input::<Vec3>();
//!     let light = module.vec3(0.3f32, -0.5f32, 0.2f32);
//!     let color = module.vec4(0.25f32, 0.625f32, 1.0f32, 1.0f32);
//!
//!     let intensity = dot(&normal, light) * 0.8f32;
//!     module.output(color * intensity);
//! });
//!
//! # #[allow(unused_variables)]
//! let bytecode = module.compile_binary().unwrap();
//! # }
//! ```

#![warn(clippy::all, clippy::pedantic)]

pub mod module;
pub mod operations;
pub mod pointer;
pub mod prelude;
pub mod types;
pub mod value;
