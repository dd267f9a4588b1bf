//! Compilation session and the graph building API
//!
//! A `Session` owns everything a compilation needs: the id allocator, the
//! expression graph, pointers, the event list, type and constant tables.
//! Nothing is shared between sessions, so independent sessions can live on
//! different threads.

use log::warn;
use spirv_headers::{BuiltIn, Capability, ExecutionModel as ShaderType, Op, Word};

use crate::encoder::{Encoder, IdAllocator};
use crate::errors::*;
use crate::events::{EventRegistry, FlowEvent};
use crate::graph::{Graph, Node, Value};
use crate::node::{self, NodeKind};
use crate::operations::flow::{ForLoop, IfBlock};
use crate::operations::math::{self, BinaryOp, UnaryOp};
use crate::pointer::{self, Link, Pointer, Pointers};
use crate::types::{Dim, Literal, StorageClass, TypeName};

mod constants;
mod declarations;
mod module;

pub(crate) use self::constants::ConstantRegistry;
pub(crate) use self::declarations::TypeRegistry;
pub use self::module::Settings;

/// Emission primitives shared by the session and the blocks it writes
pub(crate) trait Builder {
    /// Acquire a new identifier to be used in the module
    fn get_id(&mut self) -> Word;

    /// Declare a type if needed, returning its ID
    fn register_type(&mut self, ty: &TypeName) -> Result<Word>;

    /// Declare a constant if needed, returning its canonical ID
    fn register_constant(&mut self, literal: Literal) -> Result<Word>;

    /// Append an instruction to the function body
    fn push_instruction(&mut self, op: Op, operands: &[Word]);
}

/// Fixed-role vertex outputs
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Builtin {
    Position,
    PointSize,
    ClipDistance,
    CullDistance,
}

impl Builtin {
    pub(crate) fn word(self) -> Word {
        let builtin = match self {
            Builtin::Position => BuiltIn::Position,
            Builtin::PointSize => BuiltIn::PointSize,
            Builtin::ClipDistance => BuiltIn::ClipDistance,
            Builtin::CullDistance => BuiltIn::CullDistance,
        };

        builtin as Word
    }

    /// Capability the module must declare to write this builtin
    pub(crate) fn capability(self) -> Option<Capability> {
        match self {
            Builtin::ClipDistance => Some(Capability::ClipDistance),
            Builtin::CullDistance => Some(Capability::CullDistance),
            _ => None,
        }
    }

    fn check(self, ty: &TypeName) -> Result<()> {
        let valid = match self {
            Builtin::Position => *ty == TypeName::vec(4),
            Builtin::PointSize => *ty == TypeName::float(),
            Builtin::ClipDistance | Builtin::CullDistance => match *ty {
                TypeName::Array { ref element, .. } => **element == TypeName::float(),
                _ => false,
            },
        };

        if !valid {
            let expected = match self {
                Builtin::Position => TypeName::vec(4),
                Builtin::PointSize => TypeName::float(),
                _ => TypeName::runtime_array(TypeName::float()),
            };
            bail!(ErrorKind::TypeMismatch(expected, ty.clone()));
        }

        Ok(())
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum BindingKind {
    Uniform,
    Storage,
    Texture,
}

#[derive(Debug)]
pub(crate) struct Binding {
    pub set: u32,
    pub binding: u32,
    pub kind: BindingKind,
    pub ty: TypeName,
    pub pointer: Pointer,
}

#[derive(Debug)]
pub(crate) struct Input {
    pub ty: TypeName,
    pub pointer: Pointer,
    pub value: Value,
}

#[derive(Debug)]
pub(crate) struct Output {
    pub value: Value,
    pub pointer: Pointer,
}

#[derive(Debug)]
pub(crate) struct BuiltinOutput {
    pub builtin: Builtin,
    pub value: Value,
    pub pointer: Pointer,
}

#[derive(Copy, Clone, Debug)]
enum Scope {
    If(usize),
    Loop(usize),
}

/// Output buffers of a compilation, concatenated by the driver
#[derive(Debug, Default)]
pub(crate) struct Sections {
    pub annotations: Encoder,
    pub declarations: Encoder,
    pub locals: Encoder,
    pub body: Encoder,
}

impl Sections {
    fn clear(&mut self) {
        self.annotations.clear();
        self.declarations.clear();
        self.locals.clear();
        self.body.clear();
    }
}

/// Compilation session of a single shader
#[derive(Debug)]
pub struct Session {
    settings: Settings,

    pub(crate) ids: IdAllocator,
    pub(crate) graph: Graph,
    pub(crate) pointers: Pointers,
    pub(crate) events: EventRegistry,
    pub(crate) types: TypeRegistry,
    pub(crate) constants: ConstantRegistry,
    pub(crate) sections: Sections,

    ifs: Vec<IfBlock>,
    loops: Vec<ForLoop>,
    scopes: Vec<Scope>,

    inputs: Vec<Input>,
    outputs: Vec<Output>,
    bindings: Vec<Binding>,
    builtins: Vec<BuiltinOutput>,
    locals: Vec<Pointer>,
}

impl Session {
    pub fn new<S: Into<Settings>>(settings: S) -> Self {
        Self {
            settings: settings.into(),

            ids: IdAllocator::default(),
            graph: Graph::default(),
            pointers: Pointers::default(),
            events: EventRegistry::default(),
            types: TypeRegistry::default(),
            constants: ConstantRegistry::default(),
            sections: Sections::default(),

            ifs: Vec::new(),
            loops: Vec::new(),
            scopes: Vec::new(),

            inputs: Vec::new(),
            outputs: Vec::new(),
            bindings: Vec::new(),
            builtins: Vec::new(),
            locals: Vec::new(),
        }
    }

    /// Create a session with an input slot for each type, in order
    pub fn with_inputs<S: Into<Settings>>(settings: S, inputs: &[TypeName]) -> Result<Self> {
        let mut session = Self::new(settings);
        for ty in inputs {
            session.add_input(ty.clone())?;
        }

        Ok(session)
    }

    #[inline]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    fn push_node(&mut self, ty: TypeName, kind: NodeKind, args: &[Value]) -> Result<Value> {
        let id = self.ids.next();
        let mut node = Node::new(id, ty, kind);
        node.position = self.events.position();
        self.graph.add_node(node, args)
    }

    fn push_chain(&mut self, parent: Pointer, link: Link, ty: TypeName) -> Result<Pointer> {
        let id = self.ids.next();
        let pointer = self.pointers.add_chain(id, parent, link, ty)?;
        self.pointers.get_mut(pointer)?.position = self.events.position();
        Ok(pointer)
    }

    /// Type of the value held by a node
    pub fn type_of(&self, value: Value) -> Result<TypeName> {
        Ok(self.graph.node(value)?.ty.clone())
    }

    /// Number of live nodes in the expression graph
    #[inline]
    pub fn node_count(&self) -> usize {
        self.graph.len()
    }

    // Inputs and constants

    /// Declare the next input slot, returning its value
    pub fn add_input(&mut self, ty: TypeName) -> Result<Value> {
        let slot = self.inputs.len();

        let id = self.ids.next();
        let pointer = self
            .pointers
            .add_variable(id, StorageClass::Input, ty.clone(), false);

        let value = self.push_node(ty.clone(), NodeKind::Input(slot), &[])?;
        self.graph.retain(value)?;

        self.inputs.push(Input { ty, pointer, value });
        Ok(value)
    }

    pub fn input(&self, slot: usize) -> Result<Value> {
        match self.inputs.get(slot) {
            Some(input) => Ok(input.value),
            None => bail!(ErrorKind::UnknownInput(slot)),
        }
    }

    pub(crate) fn input_pointer(&mut self, slot: usize) -> Result<Word> {
        let pointer = match self.inputs.get(slot) {
            Some(input) => input.pointer,
            None => bail!(ErrorKind::UnknownInput(slot)),
        };

        pointer::ensure_pointer(self, pointer)
    }

    /// Build a constant node
    ///
    /// The constant registry is only consulted when the node is defined.
    pub fn constant<L: Into<Literal>>(&mut self, literal: L) -> Result<Value> {
        let literal = literal.into();
        self.push_node(literal.type_name(), NodeKind::Constant(literal), &[])
    }

    #[inline]
    pub fn float(&mut self, value: f32) -> Result<Value> {
        self.constant(value)
    }

    #[inline]
    pub fn int(&mut self, value: i32) -> Result<Value> {
        self.constant(value)
    }

    #[inline]
    pub fn uint(&mut self, value: u32) -> Result<Value> {
        self.constant(value)
    }

    pub(crate) fn define_constant(&mut self, literal: Literal, proposed: Word) -> Result<Word> {
        self.constants.ensure_defined(
            literal,
            Some(proposed),
            &mut self.types,
            &mut self.ids,
            &mut self.sections.declarations,
        )
    }

    // Expressions

    /// Build a binary node, checking its operand kinds
    pub fn binary(&mut self, op: BinaryOp, lhs: Value, rhs: Value) -> Result<Value> {
        if op == BinaryOp::Lookup {
            return self.lookup(lhs, rhs);
        }

        let lowering = math::lower_binary(op, &self.type_of(lhs)?, &self.type_of(rhs)?)?;
        self.push_node(lowering.result, NodeKind::Binary(op), &[lhs, rhs])
    }

    pub fn add(&mut self, lhs: Value, rhs: Value) -> Result<Value> {
        self.binary(BinaryOp::Add, lhs, rhs)
    }

    pub fn sub(&mut self, lhs: Value, rhs: Value) -> Result<Value> {
        self.binary(BinaryOp::Sub, lhs, rhs)
    }

    pub fn mul(&mut self, lhs: Value, rhs: Value) -> Result<Value> {
        self.binary(BinaryOp::Mul, lhs, rhs)
    }

    pub fn div(&mut self, lhs: Value, rhs: Value) -> Result<Value> {
        self.binary(BinaryOp::Div, lhs, rhs)
    }

    /// Dot product of two vectors, or vector-matrix and matrix-matrix product
    pub fn dot(&mut self, lhs: Value, rhs: Value) -> Result<Value> {
        self.binary(BinaryOp::Dot, lhs, rhs)
    }

    pub fn equal(&mut self, lhs: Value, rhs: Value) -> Result<Value> {
        self.binary(BinaryOp::Equal, lhs, rhs)
    }

    pub fn not_equal(&mut self, lhs: Value, rhs: Value) -> Result<Value> {
        self.binary(BinaryOp::NotEqual, lhs, rhs)
    }

    pub fn less(&mut self, lhs: Value, rhs: Value) -> Result<Value> {
        self.binary(BinaryOp::Less, lhs, rhs)
    }

    pub fn greater(&mut self, lhs: Value, rhs: Value) -> Result<Value> {
        self.binary(BinaryOp::Greater, lhs, rhs)
    }

    pub fn less_equal(&mut self, lhs: Value, rhs: Value) -> Result<Value> {
        self.binary(BinaryOp::LessEqual, lhs, rhs)
    }

    pub fn greater_equal(&mut self, lhs: Value, rhs: Value) -> Result<Value> {
        self.binary(BinaryOp::GreaterEqual, lhs, rhs)
    }

    /// Sample a texture at a coordinate, or extract a component of a vector
    /// or a column of a matrix
    ///
    /// Matrix columns can only be selected with a constant index.
    pub fn lookup(&mut self, source: Value, index: Value) -> Result<Value> {
        let source_type = self.type_of(source)?;
        let index_type = self.type_of(index)?;
        let ty = math::lookup_result(&source_type, &index_type)?;

        if source_type.is_texture() {
            if self.constants.get(Literal::Float(0.0)).is_none() {
                let id = self.ids.next();
                self.constants.register_float(32, 0.0, id)?;
            }
        } else {
            let len = if source_type.is_matrix() {
                source_type.columns()
            } else {
                source_type.rows()
            };
            let len = len.unwrap_or_default();

            match node::constant_index(self, index)? {
                Some(index) if index >= len => bail!(ErrorKind::IndexOutOfBound(index, len)),
                None if source_type.is_matrix() => bail!(ErrorKind::UnsupportedOperation(
                    BinaryOp::Lookup.name(),
                    Box::new([source_type, index_type])
                )),
                _ => {}
            }
        }

        self.push_node(ty, NodeKind::Binary(BinaryOp::Lookup), &[source, index])
    }

    pub fn negate(&mut self, value: Value) -> Result<Value> {
        let (_, ty) = math::lower_unary(UnaryOp::Negate, &self.type_of(value)?)?;
        self.push_node(ty, NodeKind::Unary(UnaryOp::Negate), &[value])
    }

    /// Pick `accept` where `condition` holds and `reject` elsewhere
    pub fn select(&mut self, condition: Value, accept: Value, reject: Value) -> Result<Value> {
        let condition_type = self.type_of(condition)?;
        let ty = self.type_of(accept)?;
        let reject_type = self.type_of(reject)?;

        if ty != reject_type {
            bail!(ErrorKind::TypeMismatch(ty, reject_type));
        }

        let expected = if ty.is_vector() {
            ty.to_bool()
        } else {
            TypeName::Bool
        };
        if condition_type != TypeName::Bool && condition_type != expected {
            bail!(ErrorKind::TypeMismatch(expected, condition_type));
        }

        self.push_node(ty, NodeKind::Select, &[condition, accept, reject])
    }

    /// Build a vector from scalars, a matrix from columns or an array from
    /// elements
    pub fn construct(&mut self, ty: TypeName, components: &[Value]) -> Result<Value> {
        let (count, component) = match ty {
            TypeName::Matrix {
                ref component,
                rows,
                columns: 1,
            } => (rows, (**component).clone()),
            TypeName::Matrix { columns, .. } => match ty.column() {
                Some(column) => (columns, column),
                None => bail!(ErrorKind::UnsupportedType(ty.clone())),
            },
            TypeName::Array {
                ref element,
                length,
            } => (length, (**element).clone()),
            _ => bail!(ErrorKind::InvalidOperandKind(
                "construct",
                Box::new([ty.clone()])
            )),
        };

        if components.len() != count as usize {
            bail!(ErrorKind::WrongArgumentsCount(
                components.len(),
                count as usize
            ));
        }

        for value in components {
            let found = self.type_of(*value)?;
            if found != component {
                bail!(ErrorKind::TypeMismatch(component, found));
            }
        }

        self.push_node(ty, NodeKind::Construct, components)
    }

    // Memory

    fn bind(&mut self, set: u32, binding: u32, kind: BindingKind, ty: TypeName) -> Result<Pointer> {
        if let Some(existing) = self
            .bindings
            .iter()
            .find(|existing| existing.set == set && existing.binding == binding)
        {
            if existing.kind == kind && existing.ty == ty {
                return Ok(existing.pointer);
            }
            bail!(ErrorKind::BindingMismatch(set, binding));
        }

        let storage = match kind {
            BindingKind::Uniform | BindingKind::Storage => match ty {
                TypeName::Struct { .. } => StorageClass::Uniform,
                _ => bail!(ErrorKind::UnsupportedType(ty)),
            },
            BindingKind::Texture => StorageClass::UniformConstant,
        };

        let id = self.ids.next();
        let pointer =
            self.pointers
                .add_variable(id, storage, ty.clone(), kind == BindingKind::Storage);

        self.bindings.push(Binding {
            set,
            binding,
            kind,
            ty,
            pointer,
        });

        Ok(pointer)
    }

    /// Read-only uniform block bound at `set` and `binding`
    ///
    /// Asking twice for the same binding with the same block returns the
    /// same pointer.
    pub fn uniform(&mut self, set: u32, binding: u32, ty: TypeName) -> Result<Pointer> {
        self.bind(set, binding, BindingKind::Uniform, ty)
    }

    /// Writable storage buffer bound at `set` and `binding`
    pub fn storage(&mut self, set: u32, binding: u32, ty: TypeName) -> Result<Pointer> {
        self.bind(set, binding, BindingKind::Storage, ty)
    }

    /// Combined image sampler bound at `set` and `binding`
    pub fn texture(&mut self, set: u32, binding: u32, dim: Dim) -> Result<Value> {
        let pointer = self.bind(set, binding, BindingKind::Texture, TypeName::texture(dim))?;
        self.load(pointer)
    }

    /// Function-local variable
    pub fn local(&mut self, ty: TypeName) -> Result<Pointer> {
        let id = self.ids.next();
        let pointer = self
            .pointers
            .add_variable(id, StorageClass::Function, ty, true);

        self.locals.push(pointer);
        Ok(pointer)
    }

    /// Pointer to a member of the struct `pointer` points to
    pub fn member(&mut self, pointer: Pointer, member: u32) -> Result<Pointer> {
        let ty = pointer::member_type(&self.pointers.get(pointer)?.pointee, member)?;
        self.push_chain(pointer, Link::Member(member), ty)
    }

    /// Pointer to an element of the array or vector `pointer` points to
    pub fn index(&mut self, pointer: Pointer, index: Value) -> Result<Pointer> {
        let pointee = self.pointers.get(pointer)?.pointee.clone();
        let index_type = self.type_of(index)?;
        if !index_type.is_integer() {
            bail!(ErrorKind::InvalidOperandKind(
                "index",
                Box::new([pointee, index_type])
            ));
        }

        let ty = pointer::element_type(&pointee)?;
        self.graph.retain(index)?;
        self.push_chain(pointer, Link::Index(index), ty)
    }

    /// Type of the data `pointer` points to
    pub fn pointee(&self, pointer: Pointer) -> Result<TypeName> {
        Ok(self.pointers.get(pointer)?.pointee.clone())
    }

    /// Record a load, returning the loaded value
    pub fn load(&mut self, pointer: Pointer) -> Result<Value> {
        let ty = self.pointers.get(pointer)?.pointee.clone();

        let event = self.events.next_index();
        let value = self.push_node(ty, NodeKind::Load(event), &[])?;
        self.pointers.get_mut(pointer)?.accessed = true;
        self.events.push_load(pointer, value);

        Ok(value)
    }

    /// Record a store of `value` through `pointer`
    pub fn store(&mut self, pointer: Pointer, value: Value) -> Result<()> {
        let (writable, pointee, pointer_type) = {
            let data = self.pointers.get(pointer)?;
            (data.writable, data.pointee.clone(), data.type_name())
        };

        if !writable {
            bail!(ErrorKind::ReadOnlyPointer(pointer_type));
        }

        let ty = self.type_of(value)?;
        if ty != pointee {
            bail!(ErrorKind::TypeMismatch(pointee, ty));
        }

        self.graph.retain(value)?;
        self.pointers.get_mut(pointer)?.accessed = true;
        self.events.push_store(pointer, value);
        Ok(())
    }

    // Control flow

    pub(crate) fn if_block(&self, index: usize) -> Result<IfBlock> {
        match self.ifs.get(index) {
            Some(block) => Ok(*block),
            None => bail!(ErrorKind::ControlFlow("unknown if block")),
        }
    }

    pub(crate) fn set_if_block(&mut self, index: usize, block: IfBlock) -> Result<()> {
        match self.ifs.get_mut(index) {
            Some(slot) => {
                *slot = block;
                Ok(())
            }
            None => bail!(ErrorKind::ControlFlow("unknown if block")),
        }
    }

    pub(crate) fn for_loop(&self, index: usize) -> Result<ForLoop> {
        match self.loops.get(index) {
            Some(block) => Ok(*block),
            None => bail!(ErrorKind::ControlFlow("unknown loop")),
        }
    }

    pub(crate) fn set_for_loop(&mut self, index: usize, block: ForLoop) -> Result<()> {
        match self.loops.get_mut(index) {
            Some(slot) => {
                *slot = block;
                Ok(())
            }
            None => bail!(ErrorKind::ControlFlow("unknown loop")),
        }
    }

    /// Open a selection block executed when `condition` holds
    pub fn begin_if(&mut self, condition: Value) -> Result<()> {
        let ty = self.type_of(condition)?;
        if ty != TypeName::Bool {
            bail!(ErrorKind::TypeMismatch(TypeName::Bool, ty));
        }

        self.graph.retain(condition)?;
        let block = IfBlock::new(condition, self);
        self.ifs.push(block);

        let index = self.ifs.len() - 1;
        self.scopes.push(Scope::If(index));
        self.events.push_flow(FlowEvent::IfBegin(index));
        Ok(())
    }

    /// Switch the innermost selection block to its else branch
    pub fn begin_else(&mut self) -> Result<()> {
        let index = match self.scopes.last() {
            Some(&Scope::If(index)) => index,
            _ => bail!(ErrorKind::ControlFlow("else without an open if")),
        };

        match self.ifs.get_mut(index) {
            Some(block) if !block.has_else => block.has_else = true,
            _ => bail!(ErrorKind::ControlFlow("if already has an else branch")),
        }

        self.events.push_flow(FlowEvent::IfElse(index));
        Ok(())
    }

    pub fn end_if(&mut self) -> Result<()> {
        match self.scopes.last() {
            Some(&Scope::If(index)) => {
                self.scopes.pop();
                self.events.push_flow(FlowEvent::IfEnd(index));
                Ok(())
            }
            _ => bail!(ErrorKind::ControlFlow("end_if without an open if")),
        }
    }

    fn loop_bounds(&self, start: i32, end: i32) -> Result<(i32, i32)> {
        if end >= start {
            return Ok((start, end));
        }

        if self.settings.strict_loop_bounds {
            bail!(ErrorKind::InvalidLoopBounds(start, end));
        }

        if end == 0 {
            return Ok((0, start));
        }

        warn!(
            "loop end {} is lower than its start {}, the body will never run",
            end, start
        );
        Ok((start, end))
    }

    /// Open a loop counting from `start` up to `end` excluded, returning the
    /// value of the counter in the loop body
    ///
    /// A `(start, 0)` pair with a positive `start` counts from 0 to `start`.
    pub fn begin_for(&mut self, start: i32, end: i32) -> Result<Value> {
        let (start, end) = self.loop_bounds(start, end)?;

        let start = self.int(start)?;
        let end = self.int(end)?;
        let step = self.int(1)?;
        for value in &[start, end, step] {
            self.graph.retain(*value)?;
        }

        let counter = self.local(TypeName::int())?;
        let block = ForLoop::new(start, end, step, counter, self);
        self.loops.push(block);

        let index = self.loops.len() - 1;
        self.scopes.push(Scope::Loop(index));
        self.events.push_flow(FlowEvent::LoopStart(index));

        self.load(counter)
    }

    pub fn end_for(&mut self) -> Result<()> {
        match self.scopes.last() {
            Some(&Scope::Loop(index)) => {
                self.scopes.pop();
                self.events.push_flow(FlowEvent::LoopEnd(index));
                Ok(())
            }
            _ => bail!(ErrorKind::ControlFlow("end_for without an open loop")),
        }
    }

    fn innermost_loop(&self) -> Option<usize> {
        self.scopes.iter().rev().find_map(|scope| match *scope {
            Scope::Loop(index) => Some(index),
            Scope::If(_) => None,
        })
    }

    /// Leave the innermost loop
    pub fn break_loop(&mut self) -> Result<()> {
        let index = match self.innermost_loop() {
            Some(index) => index,
            None => bail!(ErrorKind::ControlFlow("break outside of a loop")),
        };

        let label = self.ids.next();
        self.events.push_flow(FlowEvent::Break(index, label));
        Ok(())
    }

    /// Skip to the next iteration of the innermost loop
    pub fn continue_loop(&mut self) -> Result<()> {
        let index = match self.innermost_loop() {
            Some(index) => index,
            None => bail!(ErrorKind::ControlFlow("continue outside of a loop")),
        };

        let label = self.ids.next();
        self.events.push_flow(FlowEvent::Continue(index, label));
        Ok(())
    }

    // Outputs

    /// Write `value` to the next output location
    pub fn output(&mut self, value: Value) -> Result<()> {
        let ty = self.type_of(value)?;
        self.graph.retain(value)?;

        let id = self.ids.next();
        let pointer = self.pointers.add_variable(id, StorageClass::Output, ty, true);

        self.outputs.push(Output { value, pointer });
        Ok(())
    }

    /// Write `value` to a builtin output of a vertex shader, at most once
    pub fn builtin(&mut self, builtin: Builtin, value: Value) -> Result<()> {
        if self.settings.stage != ShaderType::Vertex {
            bail!(ErrorKind::UnsupportedBuiltin(
                builtin,
                format!("{:?}", self.settings.stage)
            ));
        }

        if self.builtins.iter().any(|slot| slot.builtin == builtin) {
            bail!(ErrorKind::BuiltinRedefined(builtin));
        }

        let ty = self.type_of(value)?;
        builtin.check(&ty)?;
        self.graph.retain(value)?;

        let id = self.ids.next();
        let pointer = self.pointers.add_variable(id, StorageClass::Output, ty, true);

        self.builtins.push(BuiltinOutput {
            builtin,
            value,
            pointer,
        });
        Ok(())
    }

    /// Take a reference on a node so that it outlives its consumers
    pub fn retain(&mut self, value: Value) -> Result<()> {
        self.graph.retain(value)
    }

    /// Release a reference on a node, freeing it and the operands nothing
    /// else references when it was the last one
    pub fn unref_tree(&mut self, value: Value) -> Result<()> {
        self.graph.unref_tree(value)
    }
}

impl Builder for Session {
    fn get_id(&mut self) -> Word {
        self.ids.next()
    }

    fn register_type(&mut self, ty: &TypeName) -> Result<Word> {
        self.types.ensure_defined(
            ty,
            &mut self.constants,
            &mut self.ids,
            &mut self.sections.declarations,
        )
    }

    fn register_constant(&mut self, literal: Literal) -> Result<Word> {
        self.constants.ensure_defined(
            literal,
            None,
            &mut self.types,
            &mut self.ids,
            &mut self.sections.declarations,
        )
    }

    fn push_instruction(&mut self, op: Op, operands: &[Word]) {
        self.sections.body.instruction(op, operands);
    }
}
