//! Per-compilation declaration state of every type
//!
//! Each distinct `TypeName` owns one `Declaration`. A type is emitted at
//! most once, after all the types it depends on; whether it was already
//! emitted is read from its own state, so shared dependencies anywhere in
//! the graph are naturally deduplicated.

use fnv::FnvHashMap as HashMap;
use log::trace;
use spirv_headers::{Decoration, ImageFormat, Op, Word};

use super::constants::ConstantRegistry;
use crate::encoder::{Encoder, IdAllocator};
use crate::errors::*;
use crate::types::{Literal, TypeName};

/// Declaration state of a single type
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct Declaration {
    pub id: Option<Word>,
    pub defined: bool,
    pub decorated: bool,
}

#[derive(Debug, Default)]
pub(crate) struct TypeRegistry {
    states: HashMap<TypeName, Declaration>,
    touched: Vec<TypeName>,
}

impl TypeRegistry {
    pub fn state(&self, ty: &TypeName) -> Declaration {
        self.states.get(ty).cloned().unwrap_or_default()
    }

    fn state_mut(&mut self, ty: &TypeName) -> &mut Declaration {
        if !self.states.contains_key(ty) {
            self.touched.push(ty.clone());
        }

        self.states.entry(ty.clone()).or_default()
    }

    /// Assign an id to a type without declaring it
    pub fn ensure_init_id(&mut self, ty: &TypeName, ids: &mut IdAllocator) -> Word {
        let state = self.state_mut(ty);
        match state.id {
            Some(id) => id,
            None => {
                let id = ids.next();
                state.id = Some(id);
                id
            }
        }
    }

    /// Id of a type that was already assigned one
    pub fn get_id(&self, ty: &TypeName) -> Result<Word> {
        match self.states.get(ty).and_then(|state| state.id) {
            Some(id) => Ok(id),
            None => bail!(ErrorKind::UndeclaredType(ty.clone())),
        }
    }

    /// Emit the declaration of a type and its dependencies, once
    pub fn ensure_defined(
        &mut self,
        ty: &TypeName,
        constants: &mut ConstantRegistry,
        ids: &mut IdAllocator,
        out: &mut Encoder,
    ) -> Result<Word> {
        let state = self.state(ty);
        if state.defined {
            if let Some(id) = state.id {
                return Ok(id);
            }
        }

        let operands = match *ty {
            TypeName::Void | TypeName::Bool => Vec::new(),

            TypeName::Int { width, signed } => {
                if width != 32 {
                    bail!(ErrorKind::UnsupportedType(ty.clone()));
                }
                vec![width, if signed { 1 } else { 0 }]
            }
            TypeName::Float { width } => {
                if width != 32 {
                    bail!(ErrorKind::UnsupportedType(ty.clone()));
                }
                vec![width]
            }

            TypeName::Matrix {
                ref component,
                rows,
                columns,
            } => {
                if !component.is_scalar() || rows < 2 || rows > 4 || columns > 4 {
                    bail!(ErrorKind::UnsupportedType(ty.clone()));
                }

                if columns == 1 {
                    let component_id = self.ensure_defined(component, constants, ids, out)?;
                    vec![component_id, rows]
                } else {
                    if !component.is_float() || columns < 2 {
                        bail!(ErrorKind::UnsupportedType(ty.clone()));
                    }

                    let column = TypeName::vector((**component).clone(), rows);
                    let column_id = self.ensure_defined(&column, constants, ids, out)?;
                    vec![column_id, columns]
                }
            }

            TypeName::Array {
                ref element,
                length,
            } => {
                let element_id = self.ensure_defined(element, constants, ids, out)?;
                let length_id =
                    constants.ensure_defined(Literal::UInt(length), None, self, ids, out)?;
                vec![element_id, length_id]
            }
            TypeName::RuntimeArray { ref element } => {
                vec![self.ensure_defined(element, constants, ids, out)?]
            }

            TypeName::Pointer {
                storage,
                ref pointee,
            } => {
                let pointee_id = self.ensure_defined(pointee, constants, ids, out)?;
                vec![storage.word(), pointee_id]
            }

            TypeName::Struct { ref members } => {
                let mut operands = Vec::with_capacity(members.len());
                for member in members {
                    operands.push(self.ensure_defined(member, constants, ids, out)?);
                }
                operands
            }

            TypeName::Image {
                dim,
                depth,
                arrayed,
            } => {
                let sampled_id = self.ensure_defined(&TypeName::float(), constants, ids, out)?;
                vec![
                    sampled_id,
                    dim.word(),
                    if depth { 1 } else { 0 },
                    if arrayed { 1 } else { 0 },
                    0,
                    1,
                    ImageFormat::Unknown as Word,
                ]
            }
            TypeName::Texture { ref image } => {
                match **image {
                    TypeName::Image { .. } => {}
                    _ => bail!(ErrorKind::UnsupportedType(ty.clone())),
                }
                vec![self.ensure_defined(image, constants, ids, out)?]
            }
        };

        let op = match *ty {
            TypeName::Void => Op::TypeVoid,
            TypeName::Bool => Op::TypeBool,
            TypeName::Int { .. } => Op::TypeInt,
            TypeName::Float { .. } => Op::TypeFloat,
            TypeName::Matrix { columns: 1, .. } => Op::TypeVector,
            TypeName::Matrix { .. } => Op::TypeMatrix,
            TypeName::Array { .. } => Op::TypeArray,
            TypeName::RuntimeArray { .. } => Op::TypeRuntimeArray,
            TypeName::Pointer { .. } => Op::TypePointer,
            TypeName::Struct { .. } => Op::TypeStruct,
            TypeName::Image { .. } => Op::TypeImage,
            TypeName::Texture { .. } => Op::TypeSampledImage,
        };

        let id = self.ensure_init_id(ty, ids);
        trace!("declare %{} = {}", id, ty);

        out.push(crate::encoder::header(operands.len() + 2, op));
        out.push(id);
        out.extend(&operands);

        self.state_mut(ty).defined = true;
        Ok(id)
    }

    /// Emit the layout decorations of a struct type and its nested aggregates, once
    ///
    /// The byte offset of a member is the sum of the sizes of the members
    /// before it.
    pub fn ensure_decorated(&mut self, ty: &TypeName, out: &mut Encoder) -> Result<()> {
        if self.state(ty).decorated {
            return Ok(());
        }

        match *ty {
            TypeName::Struct { ref members } => {
                let struct_id = self.get_id(ty)?;

                let mut offset = 0;
                for (index, member) in members.iter().enumerate() {
                    let index = index as Word;
                    out.instruction(
                        Op::MemberDecorate,
                        &[struct_id, index, Decoration::Offset as Word, offset],
                    );

                    if let TypeName::Matrix {
                        ref component,
                        rows,
                        columns,
                    } = *member
                    {
                        if columns > 1 {
                            out.instruction(
                                Op::MemberDecorate,
                                &[struct_id, index, Decoration::ColMajor as Word],
                            );
                            out.instruction(
                                Op::MemberDecorate,
                                &[
                                    struct_id,
                                    index,
                                    Decoration::MatrixStride as Word,
                                    rows * component.size(),
                                ],
                            );
                        }
                    }

                    self.ensure_decorated(member, out)?;
                    offset += member.size();
                }
            }

            TypeName::Array { ref element, .. } | TypeName::RuntimeArray { ref element } => {
                let array_id = self.get_id(ty)?;
                out.instruction(
                    Op::Decorate,
                    &[array_id, Decoration::ArrayStride as Word, element.size()],
                );
                self.ensure_decorated(element, out)?;
            }

            _ => return Ok(()),
        }

        self.state_mut(ty).decorated = true;
        Ok(())
    }

    /// Forget every declaration made during the compilation
    pub fn reset(&mut self) {
        for ty in self.touched.drain(..) {
            if let Some(state) = self.states.get_mut(&ty) {
                *state = Declaration::default();
            }
        }
    }
}
