#[macro_use]
extern crate pretty_assertions;

use shadegraph::prelude::*;
use spirv_headers::{Op, Word};

mod data;
use data::*;

/// Sum `1.0` once per iteration of a loop over `start..end`
fn counting_loop(start: i32, end: i32) -> Result<Vec<Word>> {
    let mut session = Session::new(ShaderType::Fragment);
    let sum = session.local(TypeName::float())?;
    let zero = session.float(0.0)?;
    session.store(sum, zero)?;

    session.begin_for(start, end)?;
    let current = session.load(sum)?;
    let one = session.float(1.0)?;
    let next = session.add(current, one)?;
    session.store(sum, next)?;
    session.end_for()?;

    let total = session.load(sum)?;
    session.output(total)?;
    session.compile()
}

#[test]
fn test_reversed_bounds_from_zero() {
    let reversed = counting_loop(5, 0).unwrap();
    let forward = counting_loop(0, 5).unwrap();
    assert_eq!(reversed, forward);
}

#[test]
fn test_reversed_bounds_are_kept() {
    let words = counting_loop(5, 2).unwrap();
    let check = find(&words, Op::SLessThan);
    assert_eq!(check.len(), 1);

    // the counter starts at 5 and is compared against 2
    let store = body(&words)
        .into_iter()
        .find(|inst| inst.is(Op::Store) && inst.operands[1] == constant_id(&words, 5).unwrap());
    assert!(store.is_some());
    assert_eq!(check[0].operands[3], constant_id(&words, 2).unwrap());
}

#[test]
fn test_strict_bounds() {
    let mut settings = Settings::from(ShaderType::Fragment);
    settings.strict_loop_bounds = true;

    for &(start, end) in &[(5, 0), (3, 1)] {
        let mut session = Session::new(settings.clone());
        match session.begin_for(start, end) {
            Err(Error(ErrorKind::InvalidLoopBounds(s, e), _)) => {
                assert_eq!((s, e), (start, end));
            }
            other => panic!("unexpected result {:?}", other),
        }
    }
}

#[test]
fn test_loop_structure() {
    let words = counting_loop(0, 4).unwrap();

    // entry, header, check, body, increment and post
    assert_eq!(count(&words, Op::Label), 6);
    assert_eq!(count(&words, Op::LoopMerge), 1);
    assert_eq!(count(&words, Op::IAdd), 1);
    assert_eq!(count(&words, Op::FAdd), 1);

    let labels: Vec<_> = find(&words, Op::Label)
        .into_iter()
        .map(|inst| inst.operands[0])
        .collect();
    let merge = &find(&words, Op::LoopMerge)[0];
    // merge on the post block, continue on the increment block
    assert_eq!(merge.operands[0], labels[5]);
    assert_eq!(merge.operands[1], labels[4]);

    let check = &find(&words, Op::BranchConditional)[0];
    assert_eq!(&check.operands[1..], &[labels[3], labels[5]]);

    let counter = find(&words, Op::Variable)
        .into_iter()
        .filter(|inst| inst.operands[2] == spirv_headers::StorageClass::Function as Word)
        .count();
    assert_eq!(counter, 2);

    assert!(rspirv::mr::load_words(&words).is_ok());
}

#[test]
fn test_counter_value() {
    let mut session = Session::new(ShaderType::Fragment);
    let sum = session.local(TypeName::int()).unwrap();
    let zero = session.int(0).unwrap();
    session.store(sum, zero).unwrap();

    let i = session.begin_for(0, 10).unwrap();
    let current = session.load(sum).unwrap();
    let next = session.add(current, i).unwrap();
    session.store(sum, next).unwrap();
    session.end_for().unwrap();

    let total = session.load(sum).unwrap();
    session.output(total).unwrap();
    let words = session.compile().unwrap();

    let body = body(&words);
    let body_label = find(&words, Op::Label)[3].operands[0];
    let start = body
        .iter()
        .position(|inst| inst.is(Op::Label) && inst.operands[0] == body_label)
        .unwrap();
    let add = body.iter().position(|inst| inst.is(Op::IAdd)).unwrap();
    assert!(start < add);

    // the body adds the counter loaded at its start
    let counter_load = body[start + 1].clone();
    assert!(counter_load.is(Op::Load));
    assert!(body[add].operands[2..].contains(&counter_load.operands[1]));
}

#[test]
fn test_break_and_continue() {
    let mut session = Session::with_inputs(ShaderType::Fragment, &[TypeName::float()]).unwrap();
    let limit = session.input(0).unwrap();
    let sum = session.local(TypeName::float()).unwrap();
    let zero = session.float(0.0).unwrap();
    session.store(sum, zero).unwrap();

    session.begin_for(0, 16).unwrap();
    let current = session.load(sum).unwrap();
    let done = session.greater(current, limit).unwrap();
    session.begin_if(done).unwrap();
    session.break_loop().unwrap();
    session.begin_else().unwrap();
    session.continue_loop().unwrap();
    session.end_if().unwrap();
    session.end_for().unwrap();

    let total = session.load(sum).unwrap();
    session.output(total).unwrap();
    let words = session.compile().unwrap();

    // six loop labels, three selection labels and one per jump
    assert_eq!(count(&words, Op::Label), 6 + 3 + 2);
    assert_eq!(count(&words, Op::SelectionMerge), 1);

    let labels: Vec<_> = find(&words, Op::Label)
        .into_iter()
        .map(|inst| inst.operands[0])
        .collect();
    let merge = &find(&words, Op::LoopMerge)[0];
    let branches: Vec<_> = find(&words, Op::Branch)
        .into_iter()
        .map(|inst| inst.operands[0])
        .collect();
    assert!(branches.contains(&merge.operands[0]));
    assert!(branches.contains(&merge.operands[1]));
    assert!(labels.contains(&merge.operands[0]));

    assert!(rspirv::mr::load_words(&words).is_ok());
}

#[test]
fn test_jump_outside_of_loop() {
    let mut session = Session::new(ShaderType::Fragment);
    assert!(session.break_loop().is_err());
    assert!(session.continue_loop().is_err());
}

#[test]
fn test_if_else() {
    let mut session = Session::with_inputs(ShaderType::Fragment, &[TypeName::float()]).unwrap();
    let a = session.input(0).unwrap();
    let result = session.local(TypeName::float()).unwrap();

    let half = session.float(0.5).unwrap();
    let cond = session.less(a, half).unwrap();
    session.begin_if(cond).unwrap();
    let low = session.mul(a, half).unwrap();
    session.store(result, low).unwrap();
    session.begin_else().unwrap();
    let high = session.add(a, half).unwrap();
    session.store(result, high).unwrap();
    session.end_if().unwrap();

    let value = session.load(result).unwrap();
    session.output(value).unwrap();
    let words = session.compile().unwrap();

    // entry, then, else and merge
    assert_eq!(count(&words, Op::Label), 4);
    let labels: Vec<_> = find(&words, Op::Label)
        .into_iter()
        .map(|inst| inst.operands[0])
        .collect();

    let selection = &find(&words, Op::SelectionMerge)[0];
    assert_eq!(selection.operands[0], labels[3]);

    let branch = &find(&words, Op::BranchConditional)[0];
    assert_eq!(&branch.operands[1..], &[labels[1], labels[2]]);

    // each arm is computed in its own block
    let body = body(&words);
    let position = |op: Op| body.iter().position(|inst| inst.is(op)).unwrap();
    let label = |id: Word| {
        body.iter()
            .position(|inst| inst.is(Op::Label) && inst.operands[0] == id)
            .unwrap()
    };
    assert!(label(labels[1]) < position(Op::FMul));
    assert!(position(Op::FMul) < label(labels[2]));
    assert!(label(labels[2]) < position(Op::FAdd));
    assert!(position(Op::FAdd) < label(labels[3]));

    assert!(rspirv::mr::load_words(&words).is_ok());
}

#[test]
fn test_if_without_else() {
    let mut session = Session::with_inputs(ShaderType::Fragment, &[TypeName::float()]).unwrap();
    let a = session.input(0).unwrap();
    let result = session.local(TypeName::float()).unwrap();
    let zero = session.float(0.0).unwrap();
    session.store(result, zero).unwrap();

    let flag = session.greater(a, zero).unwrap();

    session.begin_if(flag).unwrap();
    let one = session.float(1.0).unwrap();
    session.store(result, one).unwrap();
    session.end_if().unwrap();

    let value = session.load(result).unwrap();
    session.output(value).unwrap();
    let words = session.compile().unwrap();

    assert_eq!(count(&words, Op::Label), 3);
    let labels: Vec<_> = find(&words, Op::Label)
        .into_iter()
        .map(|inst| inst.operands[0])
        .collect();
    let branch = &find(&words, Op::BranchConditional)[0];
    assert_eq!(&branch.operands[1..], &[labels[1], labels[2]]);
}

#[test]
fn test_mismatched_scopes() {
    let mut session = Session::new(ShaderType::Fragment);
    assert!(session.end_if().is_err());
    assert!(session.begin_else().is_err());
    assert!(session.end_for().is_err());

    let value = session.float(1.0).unwrap();
    match session.begin_if(value) {
        Err(Error(ErrorKind::TypeMismatch(TypeName::Bool, _), _)) => {}
        other => panic!("unexpected result {:?}", other),
    }

    let other = session.float(2.0).unwrap();
    let flag = session.less(value, other).unwrap();
    session.begin_if(flag).unwrap();
    session.begin_else().unwrap();
    assert!(session.begin_else().is_err());
    assert!(session.end_for().is_err());
    session.end_if().unwrap();

    session.begin_for(0, 2).unwrap();
    assert!(session.end_if().is_err());
    session.end_for().unwrap();

    assert!(session.compile().is_ok());
}

/// Position of the first instruction of the function body with opcode `op`
fn first(body: &[Inst], op: Op) -> usize {
    body.iter().position(|inst| inst.is(op)).unwrap()
}

#[test]
fn test_values_shared_with_a_branch() {
    let mut session = Session::with_inputs(ShaderType::Fragment, &[TypeName::float()]).unwrap();
    let a = session.input(0).unwrap();
    let result = session.local(TypeName::float()).unwrap();

    let two = session.float(2.0).unwrap();
    let doubled = session.mul(a, two).unwrap();
    let flag = session.greater(a, two).unwrap();

    session.begin_if(flag).unwrap();
    session.store(result, doubled).unwrap();
    session.end_if().unwrap();

    session.output(doubled).unwrap();
    let words = session.compile().unwrap();

    // computed once, before the selection, and reused after the merge
    let body = body(&words);
    assert_eq!(count(&words, Op::FMul), 1);
    assert!(first(&body, Op::FMul) < first(&body, Op::SelectionMerge));

    let product = body[first(&body, Op::FMul)].operands[1];
    let stores: Vec<_> = body
        .iter()
        .filter(|inst| inst.is(Op::Store))
        .map(|inst| inst.operands[1])
        .collect();
    assert_eq!(stores, vec![product, product]);
}

#[test]
fn test_values_shared_with_a_loop() {
    let mut session = Session::with_inputs(ShaderType::Fragment, &[TypeName::float()]).unwrap();
    let a = session.input(0).unwrap();
    let sum = session.local(TypeName::float()).unwrap();

    let half = session.float(0.5).unwrap();
    let scaled = session.mul(a, half).unwrap();
    // never used, stays out of the module
    session.add(a, half).unwrap();

    session.begin_for(0, 4).unwrap();
    session.store(sum, scaled).unwrap();
    session.end_for().unwrap();

    session.output(scaled).unwrap();
    let words = session.compile().unwrap();

    let body = body(&words);
    assert_eq!(count(&words, Op::FAdd), 0);
    assert!(first(&body, Op::FMul) < first(&body, Op::LoopMerge));
    assert!(first(&body, Op::FMul) < first(&body, Op::Branch));
}

#[test]
fn test_chains_shared_with_a_branch() {
    let mut session = Session::with_inputs(ShaderType::Fragment, &[TypeName::float()]).unwrap();
    let a = session.input(0).unwrap();
    let result = session.local(TypeName::vec(4)).unwrap();

    let block = session
        .uniform(0, 0, TypeName::structure(vec![TypeName::vec(4)]))
        .unwrap();
    let color = session.member(block, 0).unwrap();

    let zero = session.float(0.0).unwrap();
    let flag = session.greater(a, zero).unwrap();
    session.begin_if(flag).unwrap();
    let inside = session.load(color).unwrap();
    session.store(result, inside).unwrap();
    session.end_if().unwrap();

    let after = session.load(color).unwrap();
    session.output(after).unwrap();
    let words = session.compile().unwrap();

    let body = body(&words);
    assert_eq!(count(&words, Op::AccessChain), 1);
    assert!(first(&body, Op::AccessChain) < first(&body, Op::SelectionMerge));
    assert!(rspirv::mr::load_words(&words).is_ok());
}

#[test]
fn test_branch_values_stay_in_their_block() {
    let mut session = Session::with_inputs(ShaderType::Fragment, &[TypeName::float()]).unwrap();
    let a = session.input(0).unwrap();
    let result = session.local(TypeName::float()).unwrap();

    let zero = session.float(0.0).unwrap();
    let flag = session.greater(a, zero).unwrap();
    session.begin_if(flag).unwrap();
    let inside = session.add(a, a).unwrap();
    session.store(result, inside).unwrap();
    session.end_if().unwrap();

    // a second selection does not pull the first branch out of its block
    let other = session.less(a, zero).unwrap();
    session.begin_if(other).unwrap();
    session.store(result, zero).unwrap();
    session.end_if().unwrap();

    let value = session.load(result).unwrap();
    session.output(value).unwrap();
    let words = session.compile().unwrap();

    let body = body(&words);
    let labels: Vec<_> = find(&words, Op::Label)
        .into_iter()
        .map(|inst| inst.operands[0])
        .collect();
    let then = body
        .iter()
        .position(|inst| inst.is(Op::Label) && inst.operands[0] == labels[1])
        .unwrap();
    assert!(then < first(&body, Op::FAdd));
    assert!(first(&body, Op::FAdd) < first(&body, Op::FOrdLessThan));
}
