//! Rust counterparts of the shader types, along with a few marker traits
//!
//! The types are never instantiated: they only tag a `Value` or a `Pointer`
//! with the shader type it holds, so that invalid combinations are rejected
//! by the Rust compiler instead of at shader build time.

use shadegraph::types::{Dim, TypeName};

/// A type a shader value can have
pub trait Type: 'static {
    fn type_name() -> TypeName;
}

/// Types supporting the arithmetic operators elementwise
pub trait Numerical: Type {}

/// Scalar types
pub trait Scalar: Type {}

/// Types supporting the unary minus operator
pub trait Signed: Numerical {}

/// Float vector types, scaled by a `Float`
pub trait Vector: Numerical {}

/// Float matrix types
pub trait Matrix: Type {
    type Column: Vector;
}

macro_rules! decl_types {
    ( $( $(#[$attr:meta])* $name:ident => $ty:expr ; )* ) => {
        $(
            $(#[$attr])*
            #[derive(Copy, Clone, Debug)]
            pub enum $name {}

            impl Type for $name {
                fn type_name() -> TypeName {
                    $ty
                }
            }
        )*
    };
}

decl_types! {
    Bool => TypeName::Bool;
    Int => TypeName::int();
    UInt => TypeName::uint();
    Float => TypeName::float();

    Vec2 => TypeName::vec(2);
    Vec3 => TypeName::vec(3);
    Vec4 => TypeName::vec(4);

    Mat2 => TypeName::mat(2, 2);
    Mat3 => TypeName::mat(3, 3);
    Mat4 => TypeName::mat(4, 4);

    /// Combined 2D image sampler
    Sampler2D => TypeName::texture(Dim::Dim2D);
    /// Combined 3D image sampler
    Sampler3D => TypeName::texture(Dim::Dim3D);
    /// Combined cube image sampler
    SamplerCube => TypeName::texture(Dim::Cube);
}

impl Scalar for Bool {}
impl Scalar for Int {}
impl Scalar for UInt {}
impl Scalar for Float {}

impl Numerical for Int {}
impl Numerical for UInt {}
impl Numerical for Float {}
impl Numerical for Vec2 {}
impl Numerical for Vec3 {}
impl Numerical for Vec4 {}

impl Signed for Int {}
impl Signed for Float {}
impl Signed for Vec2 {}
impl Signed for Vec3 {}
impl Signed for Vec4 {}

impl Vector for Vec2 {}
impl Vector for Vec3 {}
impl Vector for Vec4 {}

impl Matrix for Mat2 {
    type Column = Vec2;
}
impl Matrix for Mat3 {
    type Column = Vec3;
}
impl Matrix for Mat4 {
    type Column = Vec4;
}

/// Samplers, with the vector type of their coordinates
pub trait Sampler: Type {
    const DIM: Dim;
    type Coordinates: Vector;
}

impl Sampler for Sampler2D {
    const DIM: Dim = Dim::Dim2D;
    type Coordinates = Vec2;
}
impl Sampler for Sampler3D {
    const DIM: Dim = Dim::Dim3D;
    type Coordinates = Vec3;
}
impl Sampler for SamplerCube {
    const DIM: Dim = Dim::Cube;
    type Coordinates = Vec3;
}

/// Fixed size array of `N` elements of type `T`
///
/// The length is carried by a marker implementing `Length`, such as `N4`.
pub struct Array<T, N> {
    _data: std::marker::PhantomData<(T, N)>,
}

/// Array lengths
pub trait Length: 'static {
    const LENGTH: u32;
}

macro_rules! decl_lengths {
    ( $( $name:ident = $value:expr ),* ) => {
        $(
            #[derive(Copy, Clone, Debug)]
            pub enum $name {}

            impl Length for $name {
                const LENGTH: u32 = $value;
            }
        )*
    };
}

decl_lengths!(N1 = 1, N2 = 2, N3 = 3, N4 = 4, N8 = 8, N16 = 16);

impl<T: Type, N: Length> Type for Array<T, N> {
    fn type_name() -> TypeName {
        TypeName::array(T::type_name(), N::LENGTH)
    }
}

/// Runtime-sized array, only found as the last member of a storage buffer
pub struct RuntimeArray<T> {
    _data: std::marker::PhantomData<T>,
}

impl<T: Type> Type for RuntimeArray<T> {
    fn type_name() -> TypeName {
        TypeName::runtime_array(T::type_name())
    }
}

/// Types a pointer can be indexed into, with the type of their elements
pub trait Indexable {
    type Element: Type;
}

impl<T: Type, N: Length> Indexable for Array<T, N> {
    type Element = T;
}
impl<T: Type> Indexable for RuntimeArray<T> {
    type Element = T;
}
impl Indexable for Vec2 {
    type Element = Float;
}
impl Indexable for Vec3 {
    type Element = Float;
}
impl Indexable for Vec4 {
    type Element = Float;
}

/// Untyped struct, whose member types are checked when a member pointer is built
#[derive(Copy, Clone, Debug)]
pub enum Block {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marker_types() {
        assert_eq!(Vec3::type_name(), TypeName::vec(3));
        assert_eq!(Mat4::type_name(), TypeName::mat(4, 4));
        assert_eq!(
            <Array<Float, N4>>::type_name(),
            TypeName::array(TypeName::float(), 4)
        );
        assert_eq!(
            <<Sampler2D as Sampler>::Coordinates as Type>::type_name(),
            TypeName::vec(2)
        );
    }
}
