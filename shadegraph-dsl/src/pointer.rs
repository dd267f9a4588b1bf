//! Typed pointers to variables and their members

use std::{fmt, marker::PhantomData};

use shadegraph::errors::ErrorKind;

use crate::{
    module::Module,
    types::{Indexable, Int, Type},
    value::{IntoValue, Value},
};

/// Pointer to a shader variable holding a `T`
pub struct Pointer<T> {
    pub(crate) module: Module,
    pub(crate) pointer: Option<shadegraph::Pointer>,
    pub(crate) ty: PhantomData<T>,
}

impl<T> Clone for Pointer<T> {
    fn clone(&self) -> Self {
        self.module.pointer(self.pointer)
    }
}

impl<T> fmt::Debug for Pointer<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.pointer {
            Some(pointer) => write!(f, "Pointer({:?})", pointer),
            None => write!(f, "Pointer(<error>)"),
        }
    }
}

impl<T> Pointer<T> {
    /// Pointer to the member `index` of a struct, which must be a `M`
    pub fn member<M: Type>(&self, index: u32) -> Pointer<M> {
        let pointer = self.pointer.and_then(|pointer| {
            self.module.with(|session| {
                let member = session.member(pointer, index)?;
                let found = session.pointee(member)?;
                if found != M::type_name() {
                    return Err(ErrorKind::TypeMismatch(M::type_name(), found).into());
                }
                Ok(member)
            })
        });

        self.module.pointer(pointer)
    }
}

impl<T: Indexable> Pointer<T> {
    /// Pointer to the element at a possibly dynamic `index`
    pub fn index(&self, index: impl IntoValue<Int>) -> Pointer<T::Element> {
        let index = index.into_node(&self.module);
        let pointer = match (self.pointer, index) {
            (Some(pointer), Some(index)) => self
                .module
                .with(|session| session.index(pointer, index)),
            _ => None,
        };

        self.module.pointer(pointer)
    }
}

impl<T: Type> Pointer<T> {
    /// Read the current content of the variable
    pub fn load(&self) -> Value<T> {
        let node = self
            .pointer
            .and_then(|pointer| self.module.with(|session| session.load(pointer)));
        self.module.value(node)
    }

    /// Replace the content of the variable
    pub fn store(&self, value: impl IntoValue<T>) {
        let value = value.into_node(&self.module);
        if let (Some(pointer), Some(value)) = (self.pointer, value) {
            self.module.with(|session| session.store(pointer, value));
        }
    }
}
