//! Operators and functions available on shader values

use std::ops::{Add, Div, Mul, Neg, Sub};

use shadegraph::operations::BinaryOp;

use crate::{
    types::*,
    value::{IntoValue, Value},
};

macro_rules! impl_arithmetic {
    ( $( $trait:ident, $method:ident => $op:ident ; )* ) => {
        $(
            impl<T: Numerical> $trait<Value<T>> for Value<T> {
                type Output = Value<T>;

                fn $method(self, rhs: Value<T>) -> Value<T> {
                    let rhs = IntoValue::<T>::into_node(rhs, &self.module);
                    self.binary(BinaryOp::$op, rhs)
                }
            }

            impl_arithmetic!(@literal $trait, $method => $op, f32, Float);
            impl_arithmetic!(@literal $trait, $method => $op, i32, Int);
            impl_arithmetic!(@literal $trait, $method => $op, u32, UInt);
        )*
    };

    (@literal $trait:ident, $method:ident => $op:ident, $rust:ty, $ty:ident) => {
        impl $trait<$rust> for Value<$ty> {
            type Output = Value<$ty>;

            fn $method(self, rhs: $rust) -> Value<$ty> {
                let rhs = IntoValue::<$ty>::into_node(rhs, &self.module);
                self.binary(BinaryOp::$op, rhs)
            }
        }

        impl $trait<Value<$ty>> for $rust {
            type Output = Value<$ty>;

            fn $method(self, rhs: Value<$ty>) -> Value<$ty> {
                let lhs: Value<$ty> = rhs.module.constant(self);
                let rhs = IntoValue::<$ty>::into_node(rhs, &lhs.module);
                lhs.binary(BinaryOp::$op, rhs)
            }
        }
    };
}

impl_arithmetic! {
    Add, add => Add;
    Sub, sub => Sub;
    Mul, mul => Mul;
    Div, div => Div;
}

macro_rules! impl_product {
    ( $( $lhs:ident * $rhs:ident => $res:ident ; )* ) => {
        $(
            impl Mul<Value<$rhs>> for Value<$lhs> {
                type Output = Value<$res>;

                fn mul(self, rhs: Value<$rhs>) -> Value<$res> {
                    let op = if <$lhs>::type_name().is_matrix() || <$rhs>::type_name().is_matrix() {
                        BinaryOp::Dot
                    } else {
                        BinaryOp::Mul
                    };

                    let rhs = IntoValue::<$rhs>::into_node(rhs, &self.module);
                    self.binary(op, rhs)
                }
            }
        )*
    };
}

// Scaling by a float, on either side
impl_product! {
    Vec2 * Float => Vec2;
    Vec3 * Float => Vec3;
    Vec4 * Float => Vec4;
    Float * Vec2 => Vec2;
    Float * Vec3 => Vec3;
    Float * Vec4 => Vec4;
}

// Linear algebra products
impl_product! {
    Vec2 * Mat2 => Vec2;
    Vec3 * Mat3 => Vec3;
    Vec4 * Mat4 => Vec4;
    Mat2 * Mat2 => Mat2;
    Mat3 * Mat3 => Mat3;
    Mat4 * Mat4 => Mat4;
}

macro_rules! impl_scale_literal {
    ( $( $ty:ident ),* ) => {
        $(
            impl Mul<f32> for Value<$ty> {
                type Output = Value<$ty>;

                fn mul(self, rhs: f32) -> Value<$ty> {
                    let rhs = IntoValue::<Float>::into_node(rhs, &self.module);
                    self.binary(BinaryOp::Mul, rhs)
                }
            }

            impl Mul<Value<$ty>> for f32 {
                type Output = Value<$ty>;

                fn mul(self, rhs: Value<$ty>) -> Value<$ty> {
                    let lhs: Value<Float> = rhs.module.constant(self);
                    let rhs = IntoValue::<$ty>::into_node(rhs, &lhs.module);
                    lhs.binary(BinaryOp::Mul, rhs)
                }
            }
        )*
    };
}

impl_scale_literal!(Vec2, Vec3, Vec4);

impl<T: Signed> Neg for Value<T> {
    type Output = Value<T>;

    fn neg(self) -> Value<T> {
        self.map(|session, node| session.negate(node))
    }
}

/// Pairs of types with a dot product, and the type of its result
pub trait Dot<Rhs: Type>: Type {
    type Output: Type;
}

macro_rules! impl_dot {
    ( $( $lhs:ident . $rhs:ident => $res:ident ; )* ) => {
        $(
            impl Dot<$rhs> for $lhs {
                type Output = $res;
            }
        )*
    };
}

impl_dot! {
    Vec2 . Vec2 => Float;
    Vec3 . Vec3 => Float;
    Vec4 . Vec4 => Float;
    Vec2 . Mat2 => Vec2;
    Vec3 . Mat3 => Vec3;
    Vec4 . Mat4 => Vec4;
    Mat2 . Mat2 => Mat2;
    Mat3 . Mat3 => Mat3;
    Mat4 . Mat4 => Mat4;
}

/// Dot product of two vectors, or product of a row vector or a matrix by a matrix
pub fn dot<L, R>(lhs: &Value<L>, rhs: impl IntoValue<R>) -> Value<L::Output>
where
    L: Dot<R>,
    R: Type,
{
    let rhs = rhs.into_node(&lhs.module);
    lhs.binary(BinaryOp::Dot, rhs)
}

macro_rules! impl_comparison {
    ( $( $(#[$attr:meta])* $name:ident => $op:ident, $bound:ident ; )* ) => {
        $(
            $(#[$attr])*
            pub fn $name<T>(lhs: &Value<T>, rhs: impl IntoValue<T>) -> Value<Bool>
            where
                T: Scalar + $bound,
            {
                let rhs = rhs.into_node(&lhs.module);
                lhs.binary(BinaryOp::$op, rhs)
            }
        )*
    };
}

impl_comparison! {
    equal => Equal, Scalar;
    not_equal => NotEqual, Scalar;
    less => Less, Numerical;
    greater => Greater, Numerical;
    less_equal => LessEqual, Numerical;
    greater_equal => GreaterEqual, Numerical;
}

/// Pick `accept` when `condition` holds, `reject` otherwise
pub fn select<T: Type>(
    condition: &Value<Bool>,
    accept: impl IntoValue<T>,
    reject: impl IntoValue<T>,
) -> Value<T> {
    let module = &condition.module;
    let nodes = (
        condition.node,
        accept.into_node(module),
        reject.into_node(module),
    );

    let node = match nodes {
        (Some(condition), Some(accept), Some(reject)) => {
            module.with(|session| session.select(condition, accept, reject))
        }
        _ => None,
    };
    module.value(node)
}

/// Sample a texture at level of detail 0
pub fn sample<S: Sampler>(
    texture: &Value<S>,
    coordinates: impl IntoValue<S::Coordinates>,
) -> Value<Vec4> {
    let coordinates = coordinates.into_node(&texture.module);
    texture.binary(BinaryOp::Lookup, coordinates)
}

impl<V: Vector> Value<V> {
    /// Component at a possibly dynamic `index`
    pub fn component(&self, index: impl IntoValue<Int>) -> Value<Float> {
        let index = index.into_node(&self.module);
        self.binary(BinaryOp::Lookup, index)
    }
}

impl<M: Matrix> Value<M> {
    /// Column at a constant `index`
    pub fn column(&self, index: i32) -> Value<M::Column> {
        let index = IntoValue::<Int>::into_node(index, &self.module);
        self.binary(BinaryOp::Lookup, index)
    }
}
