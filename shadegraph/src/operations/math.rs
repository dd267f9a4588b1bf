//! Opcode selection for arithmetic and comparison nodes
//!
//! The same operator lowers to different opcodes depending on the kinds of
//! its operands. Any pair not listed here is refused rather than guessed.

use spirv_headers::Op;

use crate::errors::*;
use crate::types::TypeName;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    /// Dot product, vector-matrix and matrix-matrix products
    Dot,
    Equal,
    NotEqual,
    Less,
    Greater,
    LessEqual,
    GreaterEqual,
    /// Component extraction or texture sampling
    Lookup,
}

impl BinaryOp {
    pub fn name(self) -> &'static str {
        match self {
            BinaryOp::Add => "add",
            BinaryOp::Sub => "sub",
            BinaryOp::Mul => "mul",
            BinaryOp::Div => "div",
            BinaryOp::Dot => "dot",
            BinaryOp::Equal => "equal",
            BinaryOp::NotEqual => "not_equal",
            BinaryOp::Less => "less",
            BinaryOp::Greater => "greater",
            BinaryOp::LessEqual => "less_equal",
            BinaryOp::GreaterEqual => "greater_equal",
            BinaryOp::Lookup => "lookup",
        }
    }

    #[inline]
    pub fn is_comparison(self) -> bool {
        match self {
            BinaryOp::Equal
            | BinaryOp::NotEqual
            | BinaryOp::Less
            | BinaryOp::Greater
            | BinaryOp::LessEqual
            | BinaryOp::GreaterEqual => true,
            _ => false,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum UnaryOp {
    Negate,
}

impl UnaryOp {
    pub fn name(self) -> &'static str {
        match self {
            UnaryOp::Negate => "negate",
        }
    }
}

/// Result of the opcode selection for a binary node
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Lowering {
    pub op: Op,
    pub result: TypeName,
    /// Operands are emitted in reverse order
    pub swap: bool,
}

impl Lowering {
    fn new(op: Op, result: TypeName) -> Self {
        Self {
            op,
            result,
            swap: false,
        }
    }

    fn swapped(op: Op, result: TypeName) -> Self {
        Self {
            op,
            result,
            swap: true,
        }
    }
}

fn invalid(op: BinaryOp, lhs: &TypeName, rhs: &TypeName) -> Error {
    ErrorKind::InvalidOperandKind(op.name(), Box::new([lhs.clone(), rhs.clone()])).into()
}

fn unsupported(op: BinaryOp, lhs: &TypeName, rhs: &TypeName) -> Error {
    ErrorKind::UnsupportedOperation(op.name(), Box::new([lhs.clone(), rhs.clone()])).into()
}

/// Scalar or vector, the shapes elementwise opcodes accept
#[inline]
fn is_elementwise(ty: &TypeName) -> bool {
    ty.is_scalar() || ty.is_vector()
}

fn arithmetic(op: BinaryOp, lhs: &TypeName, rhs: &TypeName) -> Result<Lowering> {
    if lhs == rhs && lhs.is_matrix() {
        return Err(unsupported(op, lhs, rhs));
    }

    if lhs == rhs && is_elementwise(lhs) {
        let scalar = lhs.scalar().ok_or_else(|| invalid(op, lhs, rhs))?;
        let code = match (op, scalar) {
            (BinaryOp::Add, TypeName::Int { .. }) => Op::IAdd,
            (BinaryOp::Sub, TypeName::Int { .. }) => Op::ISub,
            (BinaryOp::Mul, TypeName::Int { .. }) => Op::IMul,
            (BinaryOp::Div, TypeName::Int { signed: true, .. }) => Op::SDiv,
            (BinaryOp::Div, TypeName::Int { signed: false, .. }) => Op::UDiv,
            (BinaryOp::Add, TypeName::Float { .. }) => Op::FAdd,
            (BinaryOp::Sub, TypeName::Float { .. }) => Op::FSub,
            (BinaryOp::Mul, TypeName::Float { .. }) => Op::FMul,
            (BinaryOp::Div, TypeName::Float { .. }) => Op::FDiv,
            _ => return Err(invalid(op, lhs, rhs)),
        };

        return Ok(Lowering::new(code, lhs.clone()));
    }

    if op == BinaryOp::Mul {
        // float scaling of a vector or a matrix, in either order
        let scale = |scalar: &TypeName, aggregate: &TypeName| -> Option<Op> {
            match *aggregate {
                TypeName::Matrix {
                    ref component,
                    columns,
                    ..
                } if scalar.is_float() && **component == *scalar => Some(if columns == 1 {
                    Op::VectorTimesScalar
                } else {
                    Op::MatrixTimesScalar
                }),
                _ => None,
            }
        };

        if let Some(code) = scale(rhs, lhs) {
            return Ok(Lowering::new(code, lhs.clone()));
        }
        if let Some(code) = scale(lhs, rhs) {
            return Ok(Lowering::swapped(code, rhs.clone()));
        }
    }

    Err(invalid(op, lhs, rhs))
}

fn dot(lhs: &TypeName, rhs: &TypeName) -> Result<Lowering> {
    let op = BinaryOp::Dot;

    match (lhs, rhs) {
        (
            &TypeName::Matrix {
                component: ref l_component,
                rows: l_rows,
                columns: l_columns,
            },
            &TypeName::Matrix {
                component: ref r_component,
                rows: r_rows,
                columns: r_columns,
            },
        ) => {
            if l_component != r_component {
                return Err(invalid(op, lhs, rhs));
            }

            match (l_columns, r_columns) {
                (1, 1) => {
                    if l_rows != r_rows || !l_component.is_float() {
                        return Err(invalid(op, lhs, rhs));
                    }
                    Ok(Lowering::new(Op::Dot, (**l_component).clone()))
                }
                (1, _) => {
                    if l_rows != r_rows {
                        return Err(invalid(op, lhs, rhs));
                    }
                    Ok(Lowering::new(
                        Op::VectorTimesMatrix,
                        TypeName::vector((**l_component).clone(), r_columns),
                    ))
                }
                (_, 1) => Err(unsupported(op, lhs, rhs)),
                _ => {
                    if l_columns != r_rows {
                        return Err(invalid(op, lhs, rhs));
                    }
                    Ok(Lowering::new(
                        Op::MatrixTimesMatrix,
                        TypeName::Matrix {
                            component: l_component.clone(),
                            rows: l_rows,
                            columns: r_columns,
                        },
                    ))
                }
            }
        }
        _ => Err(invalid(op, lhs, rhs)),
    }
}

fn comparison(op: BinaryOp, lhs: &TypeName, rhs: &TypeName) -> Result<Lowering> {
    if lhs != rhs || !is_elementwise(lhs) {
        return Err(invalid(op, lhs, rhs));
    }

    let scalar = lhs.scalar().ok_or_else(|| invalid(op, lhs, rhs))?;
    let code = match *scalar {
        TypeName::Float { .. } => match op {
            BinaryOp::Equal => Op::FOrdEqual,
            BinaryOp::NotEqual => Op::FOrdNotEqual,
            BinaryOp::Less => Op::FOrdLessThan,
            BinaryOp::Greater => Op::FOrdGreaterThan,
            BinaryOp::LessEqual => Op::FOrdLessThanEqual,
            _ => Op::FOrdGreaterThanEqual,
        },
        TypeName::Int { signed, .. } => match op {
            BinaryOp::Equal => Op::IEqual,
            BinaryOp::NotEqual => Op::INotEqual,
            BinaryOp::Less if signed => Op::SLessThan,
            BinaryOp::Less => Op::ULessThan,
            BinaryOp::Greater if signed => Op::SGreaterThan,
            BinaryOp::Greater => Op::UGreaterThan,
            BinaryOp::LessEqual if signed => Op::SLessThanEqual,
            BinaryOp::LessEqual => Op::ULessThanEqual,
            _ if signed => Op::SGreaterThanEqual,
            _ => Op::UGreaterThanEqual,
        },
        TypeName::Bool => match op {
            BinaryOp::Equal => Op::LogicalEqual,
            BinaryOp::NotEqual => Op::LogicalNotEqual,
            _ => return Err(invalid(op, lhs, rhs)),
        },
        _ => return Err(invalid(op, lhs, rhs)),
    };

    Ok(Lowering::new(code, lhs.to_bool()))
}

/// Select the opcode of an arithmetic, dot or comparison node
pub(crate) fn lower_binary(op: BinaryOp, lhs: &TypeName, rhs: &TypeName) -> Result<Lowering> {
    match op {
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div => {
            arithmetic(op, lhs, rhs)
        }
        BinaryOp::Dot => dot(lhs, rhs),
        BinaryOp::Lookup => Err(invalid(op, lhs, rhs)),
        _ => comparison(op, lhs, rhs),
    }
}

/// Result type of a lookup into `lhs` at `rhs`
///
/// A texture is sampled with a float coordinate vector, a vector is indexed
/// with an integer scalar and a matrix returns one of its columns.
pub(crate) fn lookup_result(lhs: &TypeName, rhs: &TypeName) -> Result<TypeName> {
    let op = BinaryOp::Lookup;

    match *lhs {
        TypeName::Texture { ref image } => {
            let coordinates = match **image {
                TypeName::Image { dim, .. } => dim.coordinates(),
                _ => return Err(invalid(op, lhs, rhs)),
            };

            if *rhs != TypeName::vec(coordinates) {
                return Err(invalid(op, lhs, rhs));
            }

            Ok(TypeName::vec(4))
        }
        TypeName::Matrix {
            ref component,
            columns,
            ..
        } if rhs.is_integer() => {
            if columns == 1 {
                Ok((**component).clone())
            } else {
                lhs.column().ok_or_else(|| invalid(op, lhs, rhs))
            }
        }
        _ => Err(invalid(op, lhs, rhs)),
    }
}

/// Select the opcode of a unary node
pub(crate) fn lower_unary(op: UnaryOp, arg: &TypeName) -> Result<(Op, TypeName)> {
    let scalar = if is_elementwise(arg) { arg.scalar() } else { None };

    match (op, scalar) {
        (UnaryOp::Negate, Some(&TypeName::Float { .. })) => Ok((Op::FNegate, arg.clone())),
        (UnaryOp::Negate, Some(&TypeName::Int { signed: true, .. })) => {
            Ok((Op::SNegate, arg.clone()))
        }
        _ => bail!(ErrorKind::InvalidOperandKind(
            op.name(),
            Box::new([arg.clone()])
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn op(op: BinaryOp, lhs: TypeName, rhs: TypeName) -> Result<Lowering> {
        lower_binary(op, &lhs, &rhs)
    }

    #[test]
    fn scalar_arithmetic() {
        assert_eq!(
            op(BinaryOp::Add, TypeName::int(), TypeName::int()).unwrap().op,
            Op::IAdd
        );
        assert_eq!(
            op(BinaryOp::Mul, TypeName::float(), TypeName::float())
                .unwrap()
                .op,
            Op::FMul
        );
        assert_eq!(
            op(BinaryOp::Div, TypeName::int(), TypeName::int()).unwrap().op,
            Op::SDiv
        );
        assert_eq!(
            op(BinaryOp::Div, TypeName::uint(), TypeName::uint())
                .unwrap()
                .op,
            Op::UDiv
        );
        assert!(op(BinaryOp::Add, TypeName::int(), TypeName::float()).is_err());
    }

    #[test]
    fn matrices_are_not_elementwise() {
        assert_eq!(
            op(BinaryOp::Add, TypeName::vec(3), TypeName::vec(3)).unwrap().op,
            Op::FAdd
        );
        match op(BinaryOp::Add, TypeName::mat(3, 3), TypeName::mat(3, 3)) {
            Err(Error(ErrorKind::UnsupportedOperation("add", _), _)) => {}
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn scaling_depends_on_column_count() {
        let vector = op(BinaryOp::Mul, TypeName::float(), TypeName::vec(3)).unwrap();
        assert_eq!(vector.op, Op::VectorTimesScalar);
        assert!(vector.swap);
        assert_eq!(vector.result, TypeName::vec(3));

        let matrix = op(BinaryOp::Mul, TypeName::mat(4, 4), TypeName::float()).unwrap();
        assert_eq!(matrix.op, Op::MatrixTimesScalar);
        assert!(!matrix.swap);
    }

    #[test]
    fn dot_products() {
        let scalar = op(BinaryOp::Dot, TypeName::vec(3), TypeName::vec(3)).unwrap();
        assert_eq!(scalar.op, Op::Dot);
        assert_eq!(scalar.result, TypeName::float());

        let vector = op(BinaryOp::Dot, TypeName::vec(4), TypeName::mat(4, 2)).unwrap();
        assert_eq!(vector.op, Op::VectorTimesMatrix);
        assert_eq!(vector.result, TypeName::vec(2));

        let matrix = op(BinaryOp::Dot, TypeName::mat(4, 4), TypeName::mat(4, 4)).unwrap();
        assert_eq!(matrix.op, Op::MatrixTimesMatrix);
        assert_eq!(matrix.result, TypeName::mat(4, 4));

        assert!(op(BinaryOp::Dot, TypeName::ivec(2), TypeName::ivec(2)).is_err());
    }

    #[test]
    fn matrix_times_vector_is_not_implemented() {
        match op(BinaryOp::Dot, TypeName::mat(4, 4), TypeName::vec(4)) {
            Err(Error(ErrorKind::UnsupportedOperation("dot", _), _)) => {}
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn comparisons_pick_a_family() {
        let float = op(BinaryOp::Less, TypeName::float(), TypeName::float()).unwrap();
        assert_eq!(float.op, Op::FOrdLessThan);
        assert_eq!(float.result, TypeName::Bool);

        assert_eq!(
            op(BinaryOp::Less, TypeName::int(), TypeName::int()).unwrap().op,
            Op::SLessThan
        );
        assert_eq!(
            op(BinaryOp::GreaterEqual, TypeName::uint(), TypeName::uint())
                .unwrap()
                .op,
            Op::UGreaterThanEqual
        );
        assert_eq!(
            op(BinaryOp::Equal, TypeName::vec(2), TypeName::vec(2))
                .unwrap()
                .result,
            TypeName::bvec(2)
        );
        assert!(op(BinaryOp::Less, TypeName::Bool, TypeName::Bool).is_err());
    }

    #[test]
    fn lookups() {
        assert_eq!(
            lookup_result(&TypeName::vec(4), &TypeName::int()).unwrap(),
            TypeName::float()
        );
        assert_eq!(
            lookup_result(&TypeName::mat(3, 3), &TypeName::uint()).unwrap(),
            TypeName::vec(3)
        );
        assert_eq!(
            lookup_result(
                &TypeName::texture(crate::types::Dim::Dim2D),
                &TypeName::vec(2)
            )
            .unwrap(),
            TypeName::vec(4)
        );
        assert!(lookup_result(&TypeName::vec(4), &TypeName::float()).is_err());
    }

    #[test]
    fn negation() {
        assert_eq!(
            lower_unary(UnaryOp::Negate, &TypeName::vec(2)).unwrap().0,
            Op::FNegate
        );
        assert!(lower_unary(UnaryOp::Negate, &TypeName::uint()).is_err());
    }
}
