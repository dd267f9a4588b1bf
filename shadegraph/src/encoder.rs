//! Word stream writer and id allocation
//!
//! An instruction is a header word holding its word count in the high 16
//! bits and its opcode in the low 16 bits, followed by its operands.

use spirv_headers::{Op, Word};

/// Hands out result ids in increasing order, starting at 1
#[derive(Debug)]
pub struct IdAllocator {
    next: Word,
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl IdAllocator {
    /// Acquire a new identifier
    #[inline]
    pub fn next(&mut self) -> Word {
        let id = self.next;
        self.next += 1;
        id
    }

    /// One past the highest id handed out so far
    #[inline]
    pub fn bound(&self) -> Word {
        self.next
    }

    pub fn reset(&mut self) {
        self.next = 1;
    }
}

/// Position of an instruction whose word count is not known yet
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Pending(usize);

#[inline]
pub(crate) fn header(word_count: usize, op: Op) -> Word {
    debug_assert!(word_count <= 0xffff, "instruction too long");
    ((word_count as Word) << 16) | (op as Word)
}

/// Number of words a NUL-terminated, word-padded string takes
#[inline]
pub fn string_word_count(string: &str) -> usize {
    (string.len() + 1 + 3) / 4
}

/// Growable buffer of words
#[derive(Clone, Debug, Default)]
pub struct Encoder {
    words: Vec<Word>,
}

impl Encoder {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn words(&self) -> &[Word] {
        &self.words
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.words.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    #[inline]
    pub fn push(&mut self, word: Word) {
        self.words.push(word);
    }

    pub fn extend(&mut self, words: &[Word]) {
        self.words.extend_from_slice(words);
    }

    /// Append a UTF-8 string packed 4 bytes per word, little endian, NUL-padded
    pub fn push_str(&mut self, string: &str) {
        let bytes = string.as_bytes();
        for chunk in 0..string_word_count(string) {
            let mut word = 0;
            for byte in 0..4 {
                let index = chunk * 4 + byte;
                if let Some(&value) = bytes.get(index) {
                    word |= Word::from(value) << (byte * 8);
                }
            }
            self.words.push(word);
        }
    }

    /// Write a complete instruction whose operands are all single words
    pub fn instruction(&mut self, op: Op, operands: &[Word]) {
        self.words.push(header(operands.len() + 1, op));
        self.words.extend_from_slice(operands);
    }

    /// Start an instruction of variable length, see `end`
    pub fn begin(&mut self, op: Op) -> Pending {
        let start = self.words.len();
        self.words.push(op as Word);
        Pending(start)
    }

    /// Patch the word count of an instruction opened with `begin`
    pub fn end(&mut self, Pending(start): Pending) {
        let op = self.words[start] & 0xffff;
        let count = self.words.len() - start;
        debug_assert!(count <= 0xffff, "instruction too long");
        self.words[start] = ((count as Word) << 16) | op;
    }

    /// Overwrite an already written word
    pub fn patch(&mut self, index: usize, word: Word) {
        self.words[index] = word;
    }

    pub fn append(&mut self, other: &Encoder) {
        self.words.extend_from_slice(&other.words);
    }

    pub fn clear(&mut self) {
        self.words.clear();
    }

    pub fn into_words(self) -> Vec<Word> {
        self.words
    }
}
