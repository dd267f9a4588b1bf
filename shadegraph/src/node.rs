//! Definition of the value nodes
//!
//! A node is emitted at most once: its operands are defined first, then its
//! own instruction is appended to the function body and the resulting id is
//! cached on the node.

use spirv_headers::{ImageOperands, Op, Word};

use crate::builder::{Builder, Session};
use crate::errors::*;
use crate::events;
use crate::graph::Value;
use crate::operations::math::{self, BinaryOp, UnaryOp};
use crate::types::{Literal, TypeName};

#[derive(Copy, Clone, Debug)]
pub(crate) enum NodeKind {
    /// Scalar literal, declared through the constant registry
    Constant(Literal),
    /// Value of an input slot
    Input(usize),
    /// Value read by the load event at the given index
    Load(usize),
    Unary(UnaryOp),
    Binary(BinaryOp),
    /// Vector, matrix or array built from its components
    Construct,
    /// Condition followed by the two candidates
    Select,
}

/// Literal index of a constant node, if `value` is one
pub(crate) fn constant_index(session: &Session, value: Value) -> Result<Option<u32>> {
    match session.graph.node(value)?.kind {
        NodeKind::Constant(Literal::Int(index)) if index >= 0 => Ok(Some(index as u32)),
        NodeKind::Constant(Literal::Int(index)) => {
            bail!(ErrorKind::IndexOutOfBound(index as u32, 0))
        }
        NodeKind::Constant(Literal::UInt(index)) => Ok(Some(index)),
        _ => Ok(None),
    }
}

fn define_all(session: &mut Session, args: &[Value]) -> Result<Vec<Word>> {
    args.iter()
        .map(|arg| ensure_defined(session, *arg))
        .collect()
}

fn argument_types(session: &Session, args: &[Value]) -> Result<Vec<TypeName>> {
    args.iter()
        .map(|arg| Ok(session.graph.node(*arg)?.ty.clone()))
        .collect()
}

fn check_count(args: &[Value], expected: usize) -> Result<()> {
    if args.len() != expected {
        bail!(ErrorKind::WrongArgumentsCount(args.len(), expected));
    }
    Ok(())
}

/// Emit the instructions computing a node if needed and return the id
/// holding its value
pub(crate) fn ensure_defined(session: &mut Session, value: Value) -> Result<Word> {
    let (id, ty, kind) = {
        let node = session.graph.node(value)?;
        if let Some(result) = node.result {
            return Ok(result);
        }

        (node.id, node.ty.clone(), node.kind)
    };

    let args = session.graph.arguments(value);

    let result = match kind {
        NodeKind::Constant(literal) => session.define_constant(literal, id)?,

        NodeKind::Input(slot) => {
            let pointer = session.input_pointer(slot)?;
            let type_id = session.register_type(&ty)?;
            session.push_instruction(Op::Load, &[type_id, id, pointer]);
            id
        }

        NodeKind::Load(event) => {
            events::ensure_written(session, event)?;
            match session.graph.node(value)?.result {
                Some(result) => result,
                None => bail!(ErrorKind::ControlFlow("load used before being replayed")),
            }
        }

        NodeKind::Unary(op) => {
            check_count(&args, 1)?;
            let types = argument_types(session, &args)?;
            let (code, _) = math::lower_unary(op, &types[0])?;

            let operands = define_all(session, &args)?;
            let type_id = session.register_type(&ty)?;
            session.push_instruction(code, &[type_id, id, operands[0]]);
            id
        }

        NodeKind::Binary(BinaryOp::Lookup) => {
            check_count(&args, 2)?;
            define_lookup(session, id, &ty, args[0], args[1])?
        }

        NodeKind::Binary(op) => {
            check_count(&args, 2)?;
            let types = argument_types(session, &args)?;
            let lowering = math::lower_binary(op, &types[0], &types[1])?;

            let operands = define_all(session, &args)?;
            let (lhs, rhs) = if lowering.swap {
                (operands[1], operands[0])
            } else {
                (operands[0], operands[1])
            };

            let type_id = session.register_type(&ty)?;
            session.push_instruction(lowering.op, &[type_id, id, lhs, rhs]);
            id
        }

        NodeKind::Construct => {
            let mut operands = Vec::with_capacity(args.len() + 2);
            operands.push(session.register_type(&ty)?);
            operands.push(id);
            operands.extend(define_all(session, &args)?);

            session.push_instruction(Op::CompositeConstruct, &operands);
            id
        }

        NodeKind::Select => {
            check_count(&args, 3)?;
            let operands = define_all(session, &args)?;
            let type_id = session.register_type(&ty)?;
            session.push_instruction(
                Op::Select,
                &[type_id, id, operands[0], operands[1], operands[2]],
            );
            id
        }
    };

    session.graph.node_mut(value)?.result = Some(result);
    Ok(result)
}

/// Sample a texture or extract a component
fn define_lookup(
    session: &mut Session,
    id: Word,
    ty: &TypeName,
    source: Value,
    index: Value,
) -> Result<Word> {
    let source_type = session.graph.node(source)?.ty.clone();
    let type_id = session.register_type(ty)?;

    if source_type.is_texture() {
        let image = ensure_defined(session, source)?;
        let coordinates = ensure_defined(session, index)?;
        let lod = session.register_constant(Literal::Float(0.0))?;

        session.push_instruction(
            Op::ImageSampleExplicitLod,
            &[
                type_id,
                id,
                image,
                coordinates,
                ImageOperands::LOD.bits(),
                lod,
            ],
        );
    } else if source_type.is_matrix() {
        let column = match constant_index(session, index)? {
            Some(column) => column,
            None => bail!(ErrorKind::UnsupportedOperation(
                BinaryOp::Lookup.name(),
                Box::new([source_type, session.graph.node(index)?.ty.clone()])
            )),
        };

        let matrix = ensure_defined(session, source)?;
        session.push_instruction(Op::CompositeExtract, &[type_id, id, matrix, column]);
    } else {
        let vector = ensure_defined(session, source)?;
        let component = ensure_defined(session, index)?;
        session.push_instruction(Op::VectorExtractDynamic, &[type_id, id, vector, component]);
    }

    Ok(id)
}
