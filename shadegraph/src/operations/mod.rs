pub(crate) mod flow;
pub(crate) mod math;

pub use self::math::{BinaryOp, UnaryOp};
