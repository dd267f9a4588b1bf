//! Variables and access chains
//!
//! A pointer is either a base variable, declared by the compile driver, or
//! an access chain derived from another pointer by a struct member or an
//! element index. Chains are flattened to their root variable when they are
//! emitted, so the encoded instruction carries one index per link.
//!
//! Pointer handles are never reused: clearing the table moves the first
//! handle past every one given out before.

use spirv_headers::{Op, Word};

use crate::builder::{Builder, Session};
use crate::errors::*;
use crate::events::Position;
use crate::graph::Value;
use crate::node;
use crate::types::{Literal, StorageClass, TypeName};

/// Handle to a memory location of the shader
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Pointer(pub(crate) usize);

#[derive(Copy, Clone, Debug)]
pub(crate) enum Link {
    Member(u32),
    Index(Value),
}

#[derive(Copy, Clone, Debug)]
pub(crate) enum PointerKind {
    Variable,
    Chain { parent: Pointer, link: Link },
}

#[derive(Debug)]
pub(crate) struct PointerData {
    pub id: Word,
    pub storage: StorageClass,
    pub pointee: TypeName,
    pub kind: PointerKind,
    /// 1 for a variable, one more than the parent for a chain
    pub chain_length: u32,
    pub writable: bool,
    pub emitted: bool,
    /// Where the pointer was built in program order
    pub position: Position,
    /// Whether a load or a store goes through this pointer
    pub accessed: bool,
}

impl PointerData {
    pub fn type_name(&self) -> TypeName {
        TypeName::pointer(self.storage, self.pointee.clone())
    }
}

#[derive(Debug, Default)]
pub(crate) struct Pointers {
    data: Vec<PointerData>,
    /// Handle of the first entry of `data`
    base: usize,
}

impl Pointers {
    pub fn add_variable(
        &mut self,
        id: Word,
        storage: StorageClass,
        pointee: TypeName,
        writable: bool,
    ) -> Pointer {
        self.data.push(PointerData {
            id,
            storage,
            pointee,
            kind: PointerKind::Variable,
            chain_length: 1,
            writable,
            emitted: false,
            position: Position::default(),
            accessed: false,
        });

        self.last()
    }

    fn last(&self) -> Pointer {
        Pointer(self.base + self.data.len() - 1)
    }

    pub fn add_chain(
        &mut self,
        id: Word,
        parent: Pointer,
        link: Link,
        pointee: TypeName,
    ) -> Result<Pointer> {
        let (storage, chain_length, writable) = {
            let parent = self.get(parent)?;
            (parent.storage, parent.chain_length + 1, parent.writable)
        };

        self.data.push(PointerData {
            id,
            storage,
            pointee,
            kind: PointerKind::Chain { parent, link },
            chain_length,
            writable,
            emitted: false,
            position: Position::default(),
            accessed: false,
        });

        Ok(self.last())
    }

    pub fn get(&self, pointer: Pointer) -> Result<&PointerData> {
        let data = pointer
            .0
            .checked_sub(self.base)
            .and_then(|index| self.data.get(index));
        match data {
            Some(data) => Ok(data),
            None => bail!(ErrorKind::UnknownPointer(pointer.0)),
        }
    }

    pub fn get_mut(&mut self, pointer: Pointer) -> Result<&mut PointerData> {
        let data = match pointer.0.checked_sub(self.base) {
            Some(index) => self.data.get_mut(index),
            None => None,
        };
        match data {
            Some(data) => Ok(data),
            None => bail!(ErrorKind::UnknownPointer(pointer.0)),
        }
    }

    /// Every access chain of the table, in creation order
    pub fn chains(&self) -> Vec<Pointer> {
        self.data
            .iter()
            .enumerate()
            .filter_map(|(index, data)| match data.kind {
                PointerKind::Chain { .. } => Some(Pointer(self.base + index)),
                PointerKind::Variable => None,
            })
            .collect()
    }

    /// Root variable of a pointer and the links leading from it to the
    /// pointer, outermost first
    pub fn flatten(&self, pointer: Pointer) -> Result<(Pointer, Vec<Link>)> {
        let mut links = Vec::new();
        let mut current = pointer;

        loop {
            match self.get(current)?.kind {
                PointerKind::Variable => break,
                PointerKind::Chain { parent, link } => {
                    links.push(link);
                    current = parent;
                }
            }
        }

        links.reverse();
        Ok((current, links))
    }

    pub fn clear(&mut self) {
        self.base += self.data.len();
        self.data.clear();
    }
}

/// Type reached by following a struct member
pub(crate) fn member_type(pointee: &TypeName, member: u32) -> Result<TypeName> {
    match *pointee {
        TypeName::Struct { ref members } => match members.get(member as usize) {
            Some(ty) => Ok(ty.clone()),
            None => bail!(ErrorKind::IndexOutOfBound(member, members.len() as u32)),
        },
        _ => bail!(ErrorKind::NotAPointerTarget(pointee.clone())),
    }
}

/// Type reached by indexing an array or a vector
pub(crate) fn element_type(pointee: &TypeName) -> Result<TypeName> {
    match *pointee {
        TypeName::Array { ref element, .. } | TypeName::RuntimeArray { ref element } => {
            Ok((**element).clone())
        }
        TypeName::Matrix {
            ref component,
            columns: 1,
            ..
        } => Ok((**component).clone()),
        TypeName::Matrix { .. } => pointee
            .column()
            .ok_or_else(|| ErrorKind::NotAPointerTarget(pointee.clone()).into()),
        _ => bail!(ErrorKind::NotAPointerTarget(pointee.clone())),
    }
}

/// Emit the access chain of a pointer if needed and return its id
///
/// Base variables are declared by the compile driver; reaching one that was
/// not is an error.
pub(crate) fn ensure_pointer(session: &mut Session, pointer: Pointer) -> Result<Word> {
    let (id, emitted, type_name) = {
        let data = session.pointers.get(pointer)?;
        (data.id, data.emitted, data.type_name())
    };

    if emitted {
        return Ok(id);
    }

    let (base, links) = session.pointers.flatten(pointer)?;
    if links.is_empty() {
        bail!(ErrorKind::UndeclaredPointer(id));
    }

    let base_id = ensure_pointer(session, base)?;

    let mut operands = Vec::with_capacity(links.len() + 3);
    operands.push(session.register_type(&type_name)?);
    operands.push(id);
    operands.push(base_id);

    for link in links {
        let index_id = match link {
            Link::Member(member) => session.register_constant(Literal::Int(member as i32))?,
            Link::Index(value) => node::ensure_defined(session, value)?,
        };
        operands.push(index_id);
    }

    session
        .sections
        .body
        .instruction(Op::AccessChain, &operands);

    session.pointers.get_mut(pointer)?.emitted = true;
    Ok(id)
}
