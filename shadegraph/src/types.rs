//! Static description of the types a shader manipulates

use std::fmt;

use spirv_headers as spirv;
use spirv_headers::Word;

/// Storage class of a pointer type
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum StorageClass {
    UniformConstant,
    Input,
    Uniform,
    Output,
    Function,
}

impl StorageClass {
    #[inline]
    pub(crate) fn word(self) -> Word {
        let class = match self {
            StorageClass::UniformConstant => spirv::StorageClass::UniformConstant,
            StorageClass::Input => spirv::StorageClass::Input,
            StorageClass::Uniform => spirv::StorageClass::Uniform,
            StorageClass::Output => spirv::StorageClass::Output,
            StorageClass::Function => spirv::StorageClass::Function,
        };

        class as Word
    }
}

/// Dimensionality of an image
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Dim {
    Dim2D,
    Dim3D,
    Cube,
}

impl Dim {
    #[inline]
    pub(crate) fn word(self) -> Word {
        let dim = match self {
            Dim::Dim2D => spirv::Dim::Dim2D,
            Dim::Dim3D => spirv::Dim::Dim3D,
            Dim::Cube => spirv::Dim::DimCube,
        };

        dim as Word
    }

    /// Number of float components in a sampling coordinate
    #[inline]
    pub fn coordinates(self) -> u32 {
        match self {
            Dim::Dim2D => 2,
            Dim::Dim3D | Dim::Cube => 3,
        }
    }
}

/// Describes a shader type
///
/// Two descriptors are equal when their kind, their parameters and all their
/// inner descriptors are equal, which makes `TypeName` usable as the key of
/// the per-compilation declaration table.
#[derive(Clone, Eq, PartialEq, Hash)]
pub enum TypeName {
    Void,
    Bool,
    /// Integer type, only 32 bits wide integers can be declared
    Int { width: u32, signed: bool },
    /// Floating-point type, only 32 bits wide floats can be declared
    Float { width: u32 },
    /// Matrix of `columns` columns of `rows` components; a single column matrix is a vector
    Matrix {
        component: Box<TypeName>,
        rows: u32,
        columns: u32,
    },
    Array { element: Box<TypeName>, length: u32 },
    RuntimeArray { element: Box<TypeName> },
    Pointer {
        storage: StorageClass,
        pointee: Box<TypeName>,
    },
    Struct { members: Vec<TypeName> },
    /// Sampled float image
    Image { dim: Dim, depth: bool, arrayed: bool },
    /// Combined image and sampler
    Texture { image: Box<TypeName> },
}

impl TypeName {
    #[inline]
    pub fn bool() -> Self {
        TypeName::Bool
    }

    #[inline]
    pub fn int() -> Self {
        TypeName::Int {
            width: 32,
            signed: true,
        }
    }

    #[inline]
    pub fn uint() -> Self {
        TypeName::Int {
            width: 32,
            signed: false,
        }
    }

    #[inline]
    pub fn float() -> Self {
        TypeName::Float { width: 32 }
    }

    /// Float vector of `rows` components
    #[inline]
    pub fn vec(rows: u32) -> Self {
        TypeName::vector(TypeName::float(), rows)
    }

    #[inline]
    pub fn ivec(rows: u32) -> Self {
        TypeName::vector(TypeName::int(), rows)
    }

    #[inline]
    pub fn uvec(rows: u32) -> Self {
        TypeName::vector(TypeName::uint(), rows)
    }

    #[inline]
    pub fn bvec(rows: u32) -> Self {
        TypeName::vector(TypeName::Bool, rows)
    }

    pub fn vector(component: TypeName, rows: u32) -> Self {
        TypeName::Matrix {
            component: Box::new(component),
            rows,
            columns: 1,
        }
    }

    /// Float matrix of `rows` x `columns`
    pub fn mat(rows: u32, columns: u32) -> Self {
        TypeName::Matrix {
            component: Box::new(TypeName::float()),
            rows,
            columns,
        }
    }

    pub fn array(element: TypeName, length: u32) -> Self {
        TypeName::Array {
            element: Box::new(element),
            length,
        }
    }

    pub fn runtime_array(element: TypeName) -> Self {
        TypeName::RuntimeArray {
            element: Box::new(element),
        }
    }

    pub fn pointer(storage: StorageClass, pointee: TypeName) -> Self {
        TypeName::Pointer {
            storage,
            pointee: Box::new(pointee),
        }
    }

    pub fn structure(members: Vec<TypeName>) -> Self {
        TypeName::Struct { members }
    }

    pub fn image(dim: Dim) -> Self {
        TypeName::Image {
            dim,
            depth: false,
            arrayed: false,
        }
    }

    pub fn texture(dim: Dim) -> Self {
        TypeName::Texture {
            image: Box::new(TypeName::image(dim)),
        }
    }

    #[inline]
    pub fn is_bool(&self) -> bool {
        match *self {
            TypeName::Bool => true,
            _ => false,
        }
    }

    #[inline]
    pub fn is_integer(&self) -> bool {
        match *self {
            TypeName::Int { .. } => true,
            _ => false,
        }
    }

    #[inline]
    pub fn is_signed(&self) -> bool {
        match *self {
            TypeName::Int { signed, .. } => signed,
            _ => false,
        }
    }

    #[inline]
    pub fn is_float(&self) -> bool {
        match *self {
            TypeName::Float { .. } => true,
            _ => false,
        }
    }

    #[inline]
    pub fn is_scalar(&self) -> bool {
        self.is_bool() || self.is_integer() || self.is_float()
    }

    /// A single column matrix
    #[inline]
    pub fn is_vector(&self) -> bool {
        match *self {
            TypeName::Matrix { columns, .. } => columns == 1,
            _ => false,
        }
    }

    /// A matrix with more than one column
    #[inline]
    pub fn is_matrix(&self) -> bool {
        match *self {
            TypeName::Matrix { columns, .. } => columns > 1,
            _ => false,
        }
    }

    #[inline]
    pub fn is_texture(&self) -> bool {
        match *self {
            TypeName::Texture { .. } => true,
            _ => false,
        }
    }

    /// Scalar type of the components of a scalar, vector or matrix
    pub fn scalar(&self) -> Option<&TypeName> {
        match *self {
            TypeName::Bool | TypeName::Int { .. } | TypeName::Float { .. } => Some(self),
            TypeName::Matrix { ref component, .. } => Some(component),
            _ => None,
        }
    }

    /// Type of a single column of a matrix
    pub fn column(&self) -> Option<TypeName> {
        match *self {
            TypeName::Matrix {
                ref component,
                rows,
                columns,
            } if columns > 1 => Some(TypeName::vector((**component).clone(), rows)),
            _ => None,
        }
    }

    /// Number of components of a vector, 1 for a scalar
    pub fn rows(&self) -> Option<u32> {
        match *self {
            TypeName::Matrix { rows, .. } => Some(rows),
            _ if self.is_scalar() => Some(1),
            _ => None,
        }
    }

    /// Number of columns of a matrix, 1 for a vector or a scalar
    pub fn columns(&self) -> Option<u32> {
        match *self {
            TypeName::Matrix { columns, .. } => Some(columns),
            _ if self.is_scalar() => Some(1),
            _ => None,
        }
    }

    /// Same shape with its components replaced by booleans
    pub fn to_bool(&self) -> TypeName {
        match *self {
            TypeName::Matrix { rows, columns, .. } => TypeName::Matrix {
                component: Box::new(TypeName::Bool),
                rows,
                columns,
            },
            _ => TypeName::Bool,
        }
    }

    /// Size in bytes of a value of this type, without any padding
    pub fn size(&self) -> u32 {
        match *self {
            TypeName::Bool => 4,
            TypeName::Int { width, .. } | TypeName::Float { width } => width / 8,
            TypeName::Matrix {
                ref component,
                rows,
                columns,
            } => rows * columns * component.size(),
            TypeName::Array {
                ref element,
                length,
            } => length * element.size(),
            TypeName::Struct { ref members } => members.iter().map(TypeName::size).sum(),
            TypeName::Void
            | TypeName::RuntimeArray { .. }
            | TypeName::Pointer { .. }
            | TypeName::Image { .. }
            | TypeName::Texture { .. } => 0,
        }
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            TypeName::Void => write!(f, "void"),
            TypeName::Bool => write!(f, "bool"),
            TypeName::Int {
                width: 32,
                signed: true,
            } => write!(f, "int"),
            TypeName::Int {
                width: 32,
                signed: false,
            } => write!(f, "uint"),
            TypeName::Int { width, signed } => {
                write!(f, "{}{}", if signed { "i" } else { "u" }, width)
            }
            TypeName::Float { width: 32 } => write!(f, "float"),
            TypeName::Float { width } => write!(f, "f{}", width),

            TypeName::Matrix {
                ref component,
                rows,
                columns: 1,
            } => match **component {
                TypeName::Bool => write!(f, "bvec{}", rows),
                TypeName::Int { signed: true, .. } => write!(f, "ivec{}", rows),
                TypeName::Int { signed: false, .. } => write!(f, "uvec{}", rows),
                _ => write!(f, "vec{}", rows),
            },
            TypeName::Matrix { rows, columns, .. } if rows == columns => {
                write!(f, "mat{}", rows)
            }
            TypeName::Matrix { rows, columns, .. } => write!(f, "mat{}x{}", columns, rows),

            TypeName::Array {
                ref element,
                length,
            } => write!(f, "{}[{}]", element, length),
            TypeName::RuntimeArray { ref element } => write!(f, "{}[]", element),
            TypeName::Pointer {
                storage,
                ref pointee,
            } => write!(f, "ptr<{:?}, {}>", storage, pointee),
            TypeName::Struct { ref members } => {
                write!(f, "struct {{ ")?;
                for (index, member) in members.iter().enumerate() {
                    if index > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", member)?;
                }
                write!(f, " }}")
            }
            TypeName::Image { dim, .. } => write!(f, "image{:?}", dim),
            TypeName::Texture { ref image } => match **image {
                TypeName::Image { dim, .. } => write!(f, "sampler{:?}", dim),
                _ => write!(f, "sampler<{}>", image),
            },
        }
    }
}

impl fmt::Debug for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// Host scalar turned into a shader constant
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Literal {
    Int(i32),
    UInt(u32),
    Float(f32),
}

impl Literal {
    pub fn type_name(&self) -> TypeName {
        match *self {
            Literal::Int(_) => TypeName::int(),
            Literal::UInt(_) => TypeName::uint(),
            Literal::Float(_) => TypeName::float(),
        }
    }

    /// Bit pattern of the literal as a single word
    #[inline]
    #[allow(clippy::cast_sign_loss)]
    pub(crate) fn word(&self) -> Word {
        match *self {
            Literal::Int(value) => value as Word,
            Literal::UInt(value) => value,
            Literal::Float(value) => value.to_bits(),
        }
    }
}

impl From<i32> for Literal {
    fn from(value: i32) -> Self {
        Literal::Int(value)
    }
}

impl From<u32> for Literal {
    fn from(value: u32) -> Self {
        Literal::UInt(value)
    }
}

impl From<f32> for Literal {
    fn from(value: f32) -> Self {
        Literal::Float(value)
    }
}
