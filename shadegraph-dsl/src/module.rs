//! Module builder utility

use std::{cell::RefCell, fmt, marker::PhantomData, rc::Rc};

use shadegraph::{
    errors::{Error, Result},
    types::TypeName,
    Builtin, Session, Settings, Value as Node,
};

use crate::{
    pointer::Pointer,
    types::{Array, Block, Bool, Float, Int, Length, Sampler, Type, Vec2, Vec3, Vec4},
    value::{IntoValue, Value},
};

struct State {
    session: Session,
    /// First error raised while building the graph
    error: Option<Error>,
}

/// The Module builder, a lightweight wrapper around a shared compilation session
///
/// Operators cannot fail, so building a node that the session rejects
/// produces an empty `Value` and records the error. The first recorded
/// error is returned by the next `compile` call.
#[derive(Clone)]
pub struct Module {
    state: Rc<RefCell<State>>,
}

impl fmt::Debug for Module {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("Module")
            .field("settings", state.session.settings())
            .field("nodes", &state.session.node_count())
            .field("error", &state.error)
            .finish()
    }
}

impl Module {
    pub fn new<S: Into<Settings>>(settings: S) -> Self {
        Self {
            state: Rc::new(RefCell::new(State {
                session: Session::new(settings),
                error: None,
            })),
        }
    }

    /// Create a module and fill it by calling `thunk`
    pub fn build<S, F>(settings: S, thunk: F) -> Self
    where
        S: Into<Settings>,
        F: FnOnce(&Module),
    {
        let module = Self::new(settings);
        thunk(&module);
        module
    }

    /// Run `f` on the session, recording its error if it fails
    pub(crate) fn with<R, F>(&self, f: F) -> Option<R>
    where
        F: FnOnce(&mut Session) -> Result<R>,
    {
        let mut state = self.state.borrow_mut();
        match f(&mut state.session) {
            Ok(res) => Some(res),
            Err(err) => {
                if state.error.is_none() {
                    state.error = Some(err);
                }
                None
            }
        }
    }

    pub(crate) fn same(&self, other: &Module) -> bool {
        Rc::ptr_eq(&self.state, &other.state)
    }

    /// Whether building the graph failed
    pub fn has_error(&self) -> bool {
        self.state.borrow().error.is_some()
    }

    pub(crate) fn value<T>(&self, node: Option<Node>) -> Value<T> {
        Value::new(self.clone(), node)
    }

    pub(crate) fn pointer<T>(&self, pointer: Option<shadegraph::Pointer>) -> Pointer<T> {
        Pointer {
            module: self.clone(),
            pointer,
            ty: PhantomData,
        }
    }

    // Interface

    /// Shader attribute at the next input location
    pub fn input<T: Type>(&self) -> Value<T> {
        let node = self.with(|session| session.add_input(T::type_name()));
        self.value(node)
    }

    /// Write `value` to the next output location
    pub fn output<T: Type>(&self, value: impl IntoValue<T>) {
        if let Some(node) = value.into_node(self) {
            self.with(|session| session.output(node));
        }
    }

    /// Write `value` to a builtin output of a vertex shader
    pub fn builtin<T: Type>(&self, builtin: Builtin, value: impl IntoValue<T>) {
        if let Some(node) = value.into_node(self) {
            self.with(|session| session.builtin(builtin, node));
        }
    }

    pub fn position(&self, value: impl IntoValue<Vec4>) {
        self.builtin(Builtin::Position, value);
    }

    pub fn point_size(&self, value: impl IntoValue<Float>) {
        self.builtin(Builtin::PointSize, value);
    }

    pub fn clip_distance<N: Length>(&self, value: impl IntoValue<Array<Float, N>>) {
        self.builtin(Builtin::ClipDistance, value);
    }

    pub fn cull_distance<N: Length>(&self, value: impl IntoValue<Array<Float, N>>) {
        self.builtin(Builtin::CullDistance, value);
    }

    /// Uniform block made of `members`, bound at `set` and `binding`
    pub fn uniform(&self, set: u32, binding: u32, members: Vec<TypeName>) -> Pointer<Block> {
        let pointer =
            self.with(|session| session.uniform(set, binding, TypeName::structure(members)));
        self.pointer(pointer)
    }

    /// Storage buffer made of `members`, bound at `set` and `binding`
    pub fn storage(&self, set: u32, binding: u32, members: Vec<TypeName>) -> Pointer<Block> {
        let pointer =
            self.with(|session| session.storage(set, binding, TypeName::structure(members)));
        self.pointer(pointer)
    }

    /// Combined image sampler bound at `set` and `binding`
    pub fn texture<S: Sampler>(&self, set: u32, binding: u32) -> Value<S> {
        let node = self.with(|session| session.texture(set, binding, S::DIM));
        self.value(node)
    }

    /// Function-local variable
    pub fn local<T: Type>(&self) -> Pointer<T> {
        let pointer = self.with(|session| session.local(T::type_name()));
        self.pointer(pointer)
    }

    // Values

    /// Build a value from a literal
    pub fn constant<T, V: IntoValue<T>>(&self, value: V) -> Value<T> {
        let node = value.into_node(self);
        self.value(node)
    }

    fn construct<T: Type>(&self, components: Vec<Option<Node>>) -> Value<T> {
        let components: Option<Vec<_>> = components.into_iter().collect();
        let node = components.and_then(|components| {
            self.with(|session| session.construct(T::type_name(), &components))
        });
        self.value(node)
    }

    pub fn vec2(&self, x: impl IntoValue<Float>, y: impl IntoValue<Float>) -> Value<Vec2> {
        self.construct(vec![x.into_node(self), y.into_node(self)])
    }

    pub fn vec3(
        &self,
        x: impl IntoValue<Float>,
        y: impl IntoValue<Float>,
        z: impl IntoValue<Float>,
    ) -> Value<Vec3> {
        self.construct(vec![x.into_node(self), y.into_node(self), z.into_node(self)])
    }

    pub fn vec4(
        &self,
        x: impl IntoValue<Float>,
        y: impl IntoValue<Float>,
        z: impl IntoValue<Float>,
        w: impl IntoValue<Float>,
    ) -> Value<Vec4> {
        self.construct(vec![
            x.into_node(self),
            y.into_node(self),
            z.into_node(self),
            w.into_node(self),
        ])
    }

    /// Build an array from its elements
    pub fn array<T: Type, N: Length>(&self, elements: Vec<Value<T>>) -> Value<Array<T, N>> {
        let elements = elements
            .into_iter()
            .map(|element| element.into_node(self))
            .collect();
        self.construct(elements)
    }

    // Control flow

    /// Run `then` in a block executed when `condition` holds
    pub fn if_then<F>(&self, condition: impl IntoValue<Bool>, then: F)
    where
        F: FnOnce(&Module),
    {
        self.if_impl(condition, then, None::<fn(&Module)>);
    }

    /// Run `then` in a block executed when `condition` holds, and `otherwise`
    /// in a block executed when it does not
    pub fn if_then_else<F, G>(&self, condition: impl IntoValue<Bool>, then: F, otherwise: G)
    where
        F: FnOnce(&Module),
        G: FnOnce(&Module),
    {
        self.if_impl(condition, then, Some(otherwise));
    }

    fn if_impl<F, G>(&self, condition: impl IntoValue<Bool>, then: F, otherwise: Option<G>)
    where
        F: FnOnce(&Module),
        G: FnOnce(&Module),
    {
        let condition = match condition.into_node(self) {
            Some(condition) => condition,
            None => return,
        };
        if self.with(|session| session.begin_if(condition)).is_none() {
            return;
        }

        then(self);
        if let Some(otherwise) = otherwise {
            self.with(Session::begin_else);
            otherwise(self);
        }

        self.with(Session::end_if);
    }

    /// Run `body` once for each counter value from `start` up to `end` excluded
    pub fn for_range<F>(&self, start: i32, end: i32, body: F)
    where
        F: FnOnce(&Module, Value<Int>),
    {
        let counter = match self.with(|session| session.begin_for(start, end)) {
            Some(counter) => counter,
            None => return,
        };

        body(self, self.value(Some(counter)));
        self.with(Session::end_for);
    }

    /// Leave the innermost loop
    pub fn break_loop(&self) {
        self.with(Session::break_loop);
    }

    /// Skip to the next iteration of the innermost loop
    pub fn continue_loop(&self) {
        self.with(Session::continue_loop);
    }

    // Compilation

    fn take_error(&self) -> Result<()> {
        let mut state = self.state.borrow_mut();
        match state.error.take() {
            Some(err) => {
                state.session.reset();
                Err(err)
            }
            None => Ok(()),
        }
    }

    /// Compile the module to a list of SPIR-V words
    pub fn compile(&self) -> Result<Vec<u32>> {
        self.take_error()?;
        self.state.borrow_mut().session.compile()
    }

    /// Compile the module to the bytes of a SPIR-V binary
    pub fn compile_binary(&self) -> Result<Vec<u8>> {
        self.take_error()?;
        self.state.borrow_mut().session.compile_binary()
    }

    /// Compile the module to SPIR-V assembly
    pub fn compile_assembly(&self) -> Result<String> {
        self.take_error()?;
        self.state.borrow_mut().session.compile_assembly()
    }
}

/// Error recorded when values from two different modules are combined
pub(crate) fn foreign_value() -> Error {
    Error::from("value belongs to another module")
}

#[cfg(test)]
mod tests {
    use super::*;
    use shadegraph::prelude::{ErrorKind, ShaderType};

    #[test]
    fn first_error_is_kept() {
        let module = Module::new(ShaderType::Fragment);
        module.with(|session| session.end_if());
        module.with(|session| session.end_for());

        match module.compile() {
            Err(Error(ErrorKind::ControlFlow(message), _)) => {
                assert_eq!(message, "end_if without an open if");
            }
            other => panic!("unexpected result {:?}", other),
        }

        // the error is reported once
        assert!(module.compile().is_ok());
    }

    #[test]
    fn builtins_need_a_vertex_stage() {
        let module = Module::new(ShaderType::Fragment);
        let one: Value<Float> = module.constant(1.0f32);
        module.point_size(one);
        assert!(module.has_error());
    }
}
