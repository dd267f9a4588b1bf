//! Error types returned by the shader builder and the compiler

use spirv_headers::Word;

use crate::builder::Builtin;
use crate::types::TypeName;

fn list(types: &[TypeName]) -> String {
    types
        .iter()
        .map(TypeName::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

error_chain! {
    errors {
        ConstantRedefined(key: String) {
            description("constant registered twice")
            display("constant {} is already registered", key)
        }
        UnsupportedConstantWidth(width: u32) {
            description("unsupported constant width")
            display("constants of {} bits are not supported, only 32 bits constants are", width)
        }
        UndeclaredType(ty: TypeName) {
            description("type used before being declared")
            display("type {} has no id yet", ty)
        }
        UnsupportedType(ty: TypeName) {
            description("unsupported type")
            display("type {} cannot be declared", ty)
        }
        BuiltinRedefined(builtin: Builtin) {
            description("builtin output set twice")
            display("builtin {:?} is already set", builtin)
        }
        UnsupportedBuiltin(builtin: Builtin, stage: String) {
            description("unsupported builtin")
            display("builtin {:?} is not supported in {} shaders", builtin, stage)
        }
        InvalidOperandKind(op: &'static str, args: Box<[TypeName]>) {
            description("invalid operands")
            display("invalid operands for {}: ({})", op, list(args))
        }
        UnsupportedOperation(op: &'static str, args: Box<[TypeName]>) {
            description("unsupported operation")
            display("{} is not implemented for ({})", op, list(args))
        }
        WrongArgumentsCount(actual: usize, expected: usize) {
            description("wrong number of arguments")
            display("got {} arguments, expected {}", actual, expected)
        }
        IndexOutOfBound(index: u32, len: u32) {
            description("index out of bound")
            display("index {} is out of bound for a length of {}", index, len)
        }
        TypeMismatch(expected: TypeName, found: TypeName) {
            description("type mismatch")
            display("expected a value of type {}, found {}", expected, found)
        }
        StaleValue(index: usize) {
            description("value was released")
            display("node {} was released and cannot be used anymore", index)
        }
        UnknownPointer(index: usize) {
            description("unknown pointer")
            display("pointer {} does not belong to this session", index)
        }
        UndeclaredPointer(id: Word) {
            description("pointer used before its variable is declared")
            display("variable %{} is not declared", id)
        }
        ReadOnlyPointer(ty: TypeName) {
            description("store to a read-only pointer")
            display("cannot store through a pointer of type {}", ty)
        }
        UnknownInput(index: usize) {
            description("unknown input")
            display("shader has no input {}", index)
        }
        BindingMismatch(set: u32, binding: u32) {
            description("binding redeclared with a different type")
            display("set {} binding {} is already bound to another resource", set, binding)
        }
        NotAPointerTarget(ty: TypeName) {
            description("invalid access chain")
            display("cannot take a member or an element of {}", ty)
        }
        ControlFlow(message: &'static str) {
            description("invalid control flow")
            display("invalid control flow: {}", message)
        }
        InvalidLoopBounds(start: i32, end: i32) {
            description("invalid loop bounds")
            display("loop end {} is lower than its start {}", end, start)
        }
        Disassembly(message: String) {
            description("disassembly failed")
            display("could not disassemble the module: {}", message)
        }
    }
}
