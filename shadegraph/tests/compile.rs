#[macro_use]
extern crate pretty_assertions;

use shadegraph::prelude::*;
use spirv_headers::{Decoration, Op, Word};

mod data;
use data::*;

#[test]
fn test_scalar_expression() {
    let mut session = Session::with_inputs(ShaderType::Fragment, &[TypeName::float()]).unwrap();
    let a = session.input(0).unwrap();

    // folded by the host before any node is built
    let factor = session.float(3.0 * 3.0 * 4.0 + 5.0).unwrap();
    let res = session.mul(a, factor).unwrap();
    session.output(res).unwrap();

    let words = session.compile().unwrap();

    let constants = find(&words, Op::Constant);
    assert_eq!(constants.len(), 1);
    assert_eq!(constants[0].operands[2], 41.0f32.to_bits());

    let muls = find(&words, Op::FMul);
    assert_eq!(muls.len(), 1);
    assert_eq!(muls[0].operands[3], constants[0].operands[1]);

    assert_eq!(count(&words, Op::Store), 1);
}

#[test]
fn test_module_layout() {
    let mut session = Session::with_inputs(ShaderType::Fragment, &[TypeName::vec(4)]).unwrap();
    let color = session.input(0).unwrap();
    session.output(color).unwrap();

    let words = session.compile().unwrap();
    assert_eq!(words[0], spirv_headers::MAGIC_NUMBER);
    assert_eq!(words[1], 0x0001_0000);
    assert_eq!(words[2], 0);
    assert_eq!(words[4], 0);

    // every id is below the bound
    let bound = words[3];
    for inst in find(&words, Op::Variable) {
        assert!(inst.operands[1] < bound);
    }

    let ops: Vec<_> = instructions(&words).iter().take(5).map(|inst| inst.op).collect();
    assert_eq!(
        ops,
        vec![
            Op::Capability as Word,
            Op::ExtInstImport as Word,
            Op::MemoryModel as Word,
            Op::EntryPoint as Word,
            Op::ExecutionMode as Word,
        ]
    );

    let entry = &find(&words, Op::EntryPoint)[0];
    // execution model, function id, "main" on two words, input, output
    assert_eq!(entry.word_count(), 7);
    assert_eq!(entry.operands[0], ShaderType::Fragment as Word);

    let last = instructions(&words);
    let tail: Vec<_> = last[last.len() - 2..].iter().map(|inst| inst.op).collect();
    assert_eq!(tail, vec![Op::Return as Word, Op::FunctionEnd as Word]);
}

#[test]
fn test_locations() {
    let mut session = Session::with_inputs(
        ShaderType::Vertex,
        &[TypeName::vec(3), TypeName::vec(2)],
    )
    .unwrap();

    let uv = session.input(1).unwrap();
    session.output(uv).unwrap();

    let words = session.compile().unwrap();
    let locations: Vec<_> = find(&words, Op::Decorate)
        .into_iter()
        .filter(|inst| inst.operands[1] == Decoration::Location as Word)
        .map(|inst| inst.operands[2])
        .collect();

    assert_eq!(locations, vec![0, 1, 0]);
}

#[test]
fn test_types_are_deduplicated() {
    let mut session = Session::with_inputs(
        ShaderType::Fragment,
        &[TypeName::vec(4), TypeName::vec(4)],
    )
    .unwrap();

    let a = session.input(0).unwrap();
    let b = session.input(1).unwrap();
    let sum = session.add(a, b).unwrap();
    let diff = session.sub(a, b).unwrap();
    session.output(sum).unwrap();
    session.output(diff).unwrap();

    let words = session.compile().unwrap();
    assert_eq!(count(&words, Op::TypeFloat), 1);
    assert_eq!(count(&words, Op::TypeVector), 1);
    // input and output pointer types
    assert_eq!(count(&words, Op::TypePointer), 2);
}

#[test]
fn test_constants_are_deduplicated() {
    let mut session = Session::with_inputs(ShaderType::Fragment, &[TypeName::float()]).unwrap();
    let a = session.input(0).unwrap();

    let two = session.float(2.0).unwrap();
    let scaled = session.mul(a, two).unwrap();
    let two_again = session.float(2.0).unwrap();
    let shifted = session.add(scaled, two_again).unwrap();
    let one = session.float(1.0).unwrap();
    let res = session.sub(shifted, one).unwrap();
    session.output(res).unwrap();

    let words = session.compile().unwrap();
    assert_eq!(count(&words, Op::Constant), 2);

    let two_id = constant_id(&words, 2.0f32.to_bits()).unwrap();
    assert_eq!(find(&words, Op::FMul)[0].operands[3], two_id);
    assert_eq!(find(&words, Op::FAdd)[0].operands[3], two_id);
}

#[test]
fn test_signed_and_unsigned_constants_differ() {
    let mut session = Session::new(ShaderType::Fragment);
    let a = session.int(7).unwrap();
    let b = session.uint(7).unwrap();
    session.output(a).unwrap();
    session.output(b).unwrap();

    let words = session.compile().unwrap();
    assert_eq!(count(&words, Op::Constant), 2);
    assert_eq!(count(&words, Op::TypeInt), 2);
}

#[test]
fn test_scale_operand_order() {
    let mut session = Session::with_inputs(ShaderType::Vertex, &[TypeName::vec(3)]).unwrap();
    let v = session.input(0).unwrap();
    let half = session.float(0.5).unwrap();
    let scaled = session.mul(half, v).unwrap();
    session.output(scaled).unwrap();

    let words = session.compile().unwrap();
    let scale = &find(&words, Op::VectorTimesScalar)[0];
    // vector first, scalar second
    assert_eq!(scale.operands[3], constant_id(&words, 0.5f32.to_bits()).unwrap());
}

#[test]
fn test_matrix_products() {
    let mut session = Session::with_inputs(
        ShaderType::Vertex,
        &[TypeName::mat(4, 4), TypeName::mat(4, 4), TypeName::vec(4)],
    )
    .unwrap();

    let projection = session.input(0).unwrap();
    let view = session.input(1).unwrap();
    let position = session.input(2).unwrap();

    let mvp = session.dot(projection, view).unwrap();
    let transformed = session.dot(position, mvp).unwrap();
    session.output(transformed).unwrap();

    let words = session.compile().unwrap();
    assert_eq!(count(&words, Op::MatrixTimesMatrix), 1);
    assert_eq!(count(&words, Op::VectorTimesMatrix), 1);
    assert_eq!(count(&words, Op::TypeMatrix), 1);
}

#[test]
fn test_matrix_vector_dot_is_unsupported() {
    let mut session = Session::with_inputs(
        ShaderType::Vertex,
        &[TypeName::mat(4, 4), TypeName::vec(4)],
    )
    .unwrap();

    let matrix = session.input(0).unwrap();
    let vector = session.input(1).unwrap();

    match session.dot(matrix, vector) {
        Err(Error(ErrorKind::UnsupportedOperation("dot", _), _)) => {}
        other => panic!("unexpected result {:?}", other),
    }
}

#[test]
fn test_comparison_and_select() {
    let mut session = Session::with_inputs(
        ShaderType::Fragment,
        &[TypeName::int(), TypeName::uint()],
    )
    .unwrap();

    let signed = session.input(0).unwrap();
    let unsigned = session.input(1).unwrap();

    let zero = session.int(0).unwrap();
    let negative = session.less(signed, zero).unwrap();
    let limit = session.uint(16).unwrap();
    let small = session.less_equal(unsigned, limit).unwrap();
    let both = session.equal(negative, small).unwrap();

    let yes = session.float(1.0).unwrap();
    let no = session.float(0.0).unwrap();
    let res = session.select(both, yes, no).unwrap();
    session.output(res).unwrap();

    let words = session.compile().unwrap();
    assert_eq!(count(&words, Op::SLessThan), 1);
    assert_eq!(count(&words, Op::ULessThanEqual), 1);
    assert_eq!(count(&words, Op::LogicalEqual), 1);
    assert_eq!(count(&words, Op::Select), 1);
    assert_eq!(count(&words, Op::TypeBool), 1);
}

#[test]
fn test_negate_and_extract() {
    let mut session = Session::with_inputs(
        ShaderType::Fragment,
        &[TypeName::vec(4), TypeName::mat(3, 3), TypeName::int()],
    )
    .unwrap();

    let vector = session.input(0).unwrap();
    let matrix = session.input(1).unwrap();
    let index = session.input(2).unwrap();

    let component = session.lookup(vector, index).unwrap();
    let negated = session.negate(component).unwrap();
    session.output(negated).unwrap();

    let column_index = session.int(2).unwrap();
    let column = session.lookup(matrix, column_index).unwrap();
    session.output(column).unwrap();

    let words = session.compile().unwrap();
    assert_eq!(count(&words, Op::VectorExtractDynamic), 1);
    assert_eq!(count(&words, Op::FNegate), 1);

    let extract = &find(&words, Op::CompositeExtract)[0];
    assert_eq!(extract.operands[3], 2);
    // the column index is a literal, not a constant
    assert_eq!(count(&words, Op::Constant), 0);
}

#[test]
fn test_composite_construct() {
    let mut session = Session::with_inputs(ShaderType::Vertex, &[TypeName::vec(2)]).unwrap();
    let uv = session.input(0).unwrap();
    let zero = session.int(0).unwrap();
    let one = session.int(1).unwrap();

    let u = session.lookup(uv, zero).unwrap();
    let v = session.lookup(uv, one).unwrap();
    let z = session.float(0.0).unwrap();
    let w = session.float(1.0).unwrap();
    let position = session.construct(TypeName::vec(4), &[u, v, z, w]).unwrap();
    session.builtin(Builtin::Position, position).unwrap();

    let words = session.compile().unwrap();
    let construct = &find(&words, Op::CompositeConstruct)[0];
    assert_eq!(construct.word_count(), 7);

    let builtins: Vec<_> = find(&words, Op::Decorate)
        .into_iter()
        .filter(|inst| inst.operands[1] == Decoration::BuiltIn as Word)
        .collect();
    assert_eq!(builtins.len(), 1);
    assert_eq!(builtins[0].operands[2], spirv_headers::BuiltIn::Position as Word);
}

#[test]
fn test_clip_distance_capability() {
    let mut session = Session::new(ShaderType::Vertex);
    let a = session.float(1.0).unwrap();
    let b = session.float(-1.0).unwrap();
    let distances = session
        .construct(TypeName::array(TypeName::float(), 2), &[a, b])
        .unwrap();
    session.builtin(Builtin::ClipDistance, distances).unwrap();

    let words = session.compile().unwrap();
    let capabilities: Vec<_> = find(&words, Op::Capability)
        .into_iter()
        .map(|inst| inst.operands[0])
        .collect();
    assert_eq!(
        capabilities,
        vec![
            spirv_headers::Capability::Shader as Word,
            spirv_headers::Capability::ClipDistance as Word,
        ]
    );
    assert_eq!(count(&words, Op::TypeArray), 1);
}

#[test]
fn test_builtin_position_twice() {
    let mut session = Session::with_inputs(ShaderType::Vertex, &[TypeName::vec(4)]).unwrap();
    let position = session.input(0).unwrap();
    session.builtin(Builtin::Position, position).unwrap();

    match session.builtin(Builtin::Position, position) {
        Err(Error(ErrorKind::BuiltinRedefined(Builtin::Position), _)) => {}
        other => panic!("unexpected result {:?}", other),
    }
}

#[test]
fn test_compute_local_size() {
    let mut settings = Settings::from(ShaderType::GLCompute);
    settings.local_size = [8, 8, 1];
    let mut session = Session::new(settings);

    let words = session.compile().unwrap();
    let mode = &find(&words, Op::ExecutionMode)[0];
    assert_eq!(
        &mode.operands[1..],
        &[spirv_headers::ExecutionMode::LocalSize as Word, 8, 8, 1]
    );
}

#[test]
fn test_outputs_parse() {
    let mut session = Session::with_inputs(
        ShaderType::Vertex,
        &[TypeName::vec(4), TypeName::mat(4, 4)],
    )
    .unwrap();

    let position = session.input(0).unwrap();
    let transform = session.input(1).unwrap();
    let res = session.dot(position, transform).unwrap();
    session.builtin(Builtin::Position, res).unwrap();

    let words = session.compile().unwrap();
    assert!(rspirv::mr::load_words(&words).is_ok());
}

#[test]
fn test_assembly() {
    let mut session = Session::with_inputs(ShaderType::Fragment, &[TypeName::float()]).unwrap();
    let a = session.input(0).unwrap();
    let b = session.float(2.0).unwrap();
    let res = session.mul(a, b).unwrap();
    session.output(res).unwrap();

    let assembly = session.compile_assembly().unwrap();
    assert!(assembly.contains("OpFMul"));
    assert!(assembly.contains("OpEntryPoint Fragment"));
}

#[test]
fn test_binary_is_little_endian() {
    let mut session = Session::new(ShaderType::Fragment);
    let bytes = session.compile_binary().unwrap();
    assert_eq!(&bytes[..4], &[0x03, 0x02, 0x23, 0x07]);
    assert_eq!(bytes.len() % 4, 0);
}

#[test]
fn test_session_is_reusable() {
    let mut session = Session::with_inputs(ShaderType::Fragment, &[TypeName::vec(2)]).unwrap();

    let uv = session.input(0).unwrap();
    session.output(uv).unwrap();
    let first = session.compile().unwrap();

    // inputs survive, everything else starts over
    let uv = session.input(0).unwrap();
    let two = session.float(2.0).unwrap();
    let scaled = session.mul(uv, two).unwrap();
    session.output(scaled).unwrap();
    let second = session.compile().unwrap();

    assert_eq!(count(&first, Op::Constant), 0);
    assert_eq!(count(&second, Op::Constant), 1);
    assert_eq!(count(&second, Op::TypeVector), 1);
}

#[test]
fn test_handles_do_not_outlive_a_compilation() {
    let mut session = Session::new(ShaderType::Fragment);
    let stale = session.float(1.0).unwrap();
    let local = session.local(TypeName::float()).unwrap();
    session.output(stale).unwrap();
    session.compile().unwrap();

    let fresh = session.int(7).unwrap();
    assert_eq!(session.type_of(fresh).unwrap(), TypeName::int());
    match session.type_of(stale) {
        Err(Error(ErrorKind::StaleValue(_), _)) => {}
        other => panic!("unexpected result {:?}", other),
    }

    let other = session.local(TypeName::int()).unwrap();
    assert_ne!(local, other);
    match session.load(local) {
        Err(Error(ErrorKind::UnknownPointer(_), _)) => {}
        other => panic!("unexpected result {:?}", other),
    }
}

#[test]
fn test_sessions_on_threads() {
    let handles: Vec<_> = (0..4)
        .map(|_| {
            std::thread::spawn(|| {
                let mut session =
                    Session::with_inputs(ShaderType::Fragment, &[TypeName::float()]).unwrap();
                let a = session.input(0).unwrap();
                let b = session.float(41.0).unwrap();
                let res = session.mul(a, b).unwrap();
                session.output(res).unwrap();
                session.compile().unwrap()
            })
        })
        .collect();

    let modules: Vec<_> = handles
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .collect();
    for module in &modules[1..] {
        assert_eq!(module, &modules[0]);
    }
}
