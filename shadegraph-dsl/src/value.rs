//! Definitions for the Value type

use std::{fmt, marker::PhantomData};

use shadegraph::{operations::BinaryOp, Session, Value as Node};

use crate::{
    module::{self, Module},
    types::{Float, Int, UInt},
};

/// Representation of a shader value of type `T`
///
/// A value that failed to build holds no node; anything built from it is
/// empty as well.
pub struct Value<T> {
    pub(crate) module: Module,
    pub(crate) node: Option<Node>,
    ty: PhantomData<T>,
}

impl<T> Value<T> {
    pub(crate) fn new(module: Module, node: Option<Node>) -> Self {
        Self {
            module,
            node,
            ty: PhantomData,
        }
    }

    /// The module this value belongs to
    pub fn module(&self) -> &Module {
        &self.module
    }

    /// The node of the underlying graph, if this value was built
    pub fn node(&self) -> Option<Node> {
        self.node
    }

    /// Build a node from this value and `other`, if both exist
    pub(crate) fn map2<U, F>(&self, other: Option<Node>, f: F) -> Value<U>
    where
        F: FnOnce(&mut Session, Node, Node) -> shadegraph::errors::Result<Node>,
    {
        let node = match (self.node, other) {
            (Some(lhs), Some(rhs)) => self.module.with(|session| f(session, lhs, rhs)),
            _ => None,
        };
        self.module.value(node)
    }

    /// Build a node from this value alone
    pub(crate) fn map<U, F>(&self, f: F) -> Value<U>
    where
        F: FnOnce(&mut Session, Node) -> shadegraph::errors::Result<Node>,
    {
        let node = match self.node {
            Some(node) => self.module.with(|session| f(session, node)),
            None => None,
        };
        self.module.value(node)
    }

    pub(crate) fn binary<U>(&self, op: BinaryOp, rhs: Option<Node>) -> Value<U> {
        self.map2(rhs, |session, lhs, rhs| session.binary(op, lhs, rhs))
    }
}

impl<T> Clone for Value<T> {
    fn clone(&self) -> Self {
        Self::new(self.module.clone(), self.node)
    }
}

impl<T> fmt::Debug for Value<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.node {
            Some(node) => write!(f, "Value({})", node.index()),
            None => write!(f, "Value(<error>)"),
        }
    }
}

/// Anything the DSL can turn into a value of type `T`: values and literals
pub trait IntoValue<T> {
    /// Register this value into `module` and return its node
    fn into_node(self, module: &Module) -> Option<Node>;
}

impl<T> IntoValue<T> for Value<T> {
    fn into_node(self, module: &Module) -> Option<Node> {
        (&self).into_node(module)
    }
}

impl<'a, T> IntoValue<T> for &'a Value<T> {
    fn into_node(self, module: &Module) -> Option<Node> {
        if !self.module.same(module) {
            let error = module::foreign_value();
            module.with(|_| Err::<(), _>(error));
            return None;
        }

        self.node
    }
}

macro_rules! impl_literal {
    ( $( $rust:ty => $ty:ident, $ctor:ident ; )* ) => {
        $(
            impl IntoValue<$ty> for $rust {
                fn into_node(self, module: &Module) -> Option<Node> {
                    module.with(|session| session.$ctor(self))
                }
            }
        )*
    };
}

impl_literal! {
    f32 => Float, float;
    i32 => Int, int;
    u32 => UInt, uint;
}
