#![allow(dead_code)]

use spirv_headers::{Op, Word};

/// Length of the module header in words
pub const HEADER_LEN: usize = 5;

#[derive(Clone, Debug, PartialEq)]
pub struct Inst {
    pub op: Word,
    pub operands: Vec<Word>,
}

impl Inst {
    pub fn is(&self, op: Op) -> bool {
        self.op == op as Word
    }

    /// Total number of words, header included
    pub fn word_count(&self) -> usize {
        self.operands.len() + 1
    }
}

/// Split a module into its instructions, skipping the header
pub fn instructions(words: &[Word]) -> Vec<Inst> {
    let mut res = Vec::new();
    let mut index = HEADER_LEN;

    while index < words.len() {
        let count = (words[index] >> 16) as usize;
        assert!(count > 0, "zero-length instruction at word {}", index);

        res.push(Inst {
            op: words[index] & 0xffff,
            operands: words[index + 1..index + count].to_vec(),
        });
        index += count;
    }

    assert_eq!(index, words.len(), "truncated instruction");
    res
}

pub fn find(words: &[Word], op: Op) -> Vec<Inst> {
    instructions(words)
        .into_iter()
        .filter(|inst| inst.is(op))
        .collect()
}

pub fn count(words: &[Word], op: Op) -> usize {
    find(words, op).len()
}

/// Id of the 32 bits constant holding `bits`
pub fn constant_id(words: &[Word], bits: Word) -> Option<Word> {
    find(words, Op::Constant)
        .into_iter()
        .find(|inst| inst.operands[2] == bits)
        .map(|inst| inst.operands[1])
}

/// Instructions of the entry function body, after its first label
pub fn body(words: &[Word]) -> Vec<Inst> {
    instructions(words)
        .into_iter()
        .skip_while(|inst| !inst.is(Op::Function))
        .skip(2)
        .collect()
}
