//! Deduplication of scalar constants
//!
//! Every distinct `(width, signedness, value)` key is declared exactly once
//! per compilation. A constant node only proposes an id: when the key is
//! already known, the canonical id wins and the node's own id never shows
//! up in the module.

use fnv::FnvHashMap as HashMap;
use spirv_headers::{Op, Word};

use super::declarations::TypeRegistry;
use crate::encoder::{Encoder, IdAllocator};
use crate::errors::*;
use crate::types::{Literal, TypeName};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub(crate) enum ConstantKey {
    Int { width: u32, signed: bool, bits: u64 },
    Float { width: u32, bits: u64 },
}

impl ConstantKey {
    #[allow(clippy::cast_sign_loss)]
    pub fn int(width: u32, signed: bool, value: i64) -> Result<Self> {
        if width != 32 {
            bail!(ErrorKind::UnsupportedConstantWidth(width));
        }

        Ok(ConstantKey::Int {
            width,
            signed,
            bits: value as u64,
        })
    }

    #[allow(clippy::cast_possible_truncation)]
    pub fn float(width: u32, value: f64) -> Result<Self> {
        if width != 32 {
            bail!(ErrorKind::UnsupportedConstantWidth(width));
        }

        Ok(ConstantKey::Float {
            width,
            bits: u64::from((value as f32).to_bits()),
        })
    }

    pub fn from_literal(literal: Literal) -> Self {
        match literal {
            Literal::Int(value) => ConstantKey::Int {
                width: 32,
                signed: true,
                bits: value as i64 as u64,
            },
            Literal::UInt(value) => ConstantKey::Int {
                width: 32,
                signed: false,
                bits: u64::from(value),
            },
            Literal::Float(value) => ConstantKey::Float {
                width: 32,
                bits: u64::from(value.to_bits()),
            },
        }
    }

    fn describe(&self) -> String {
        match *self {
            ConstantKey::Int {
                width,
                signed,
                bits,
            } => format!("{}{} {}", if signed { "i" } else { "u" }, width, bits),
            ConstantKey::Float { width, bits } => format!("f{} {:#x}", width, bits),
        }
    }
}

#[derive(Copy, Clone, Debug)]
struct Entry {
    id: Word,
    defined: bool,
}

#[derive(Debug, Default)]
pub(crate) struct ConstantRegistry {
    entries: HashMap<ConstantKey, Entry>,
}

impl ConstantRegistry {
    fn register(&mut self, key: ConstantKey, id: Word) -> Result<()> {
        if self.entries.contains_key(&key) {
            bail!(ErrorKind::ConstantRedefined(key.describe()));
        }

        self.entries.insert(key, Entry { id, defined: false });
        Ok(())
    }

    /// Associate an integer constant with an id, without declaring it yet
    pub fn register_int(&mut self, width: u32, signed: bool, value: i64, id: Word) -> Result<()> {
        self.register(ConstantKey::int(width, signed, value)?, id)
    }

    /// Associate a float constant with an id, without declaring it yet
    pub fn register_float(&mut self, width: u32, value: f64, id: Word) -> Result<()> {
        self.register(ConstantKey::float(width, value)?, id)
    }

    /// Id the constant is registered under, if any
    pub fn get(&self, literal: Literal) -> Option<Word> {
        self.entries
            .get(&ConstantKey::from_literal(literal))
            .map(|entry| entry.id)
    }

    /// Declare a constant if needed and return its canonical id
    ///
    /// A registered but undeclared constant is declared under its registered
    /// id, an unknown constant is registered under `proposed` (or a fresh id)
    /// first.
    pub fn ensure_defined(
        &mut self,
        literal: Literal,
        proposed: Option<Word>,
        types: &mut TypeRegistry,
        ids: &mut IdAllocator,
        out: &mut Encoder,
    ) -> Result<Word> {
        let key = ConstantKey::from_literal(literal);

        let id = match self.entries.get(&key) {
            Some(entry) if entry.defined => return Ok(entry.id),
            Some(entry) => entry.id,
            None => {
                let id = proposed.unwrap_or_else(|| ids.next());
                self.register(key, id)?;
                id
            }
        };

        let ty: TypeName = literal.type_name();
        let type_id = types.ensure_defined(&ty, self, ids, out)?;
        out.instruction(Op::Constant, &[type_id, id, literal.word()]);

        if let Some(entry) = self.entries.get_mut(&key) {
            entry.defined = true;
        }

        Ok(id)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
