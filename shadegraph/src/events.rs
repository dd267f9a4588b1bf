//! Program-order record of memory accesses and control flow
//!
//! The expression graph is emitted in data-dependency order, which says
//! nothing about when a load happens relative to a store. Every load, store
//! and block boundary is therefore appended here when the builder call is
//! made, and replayed in that order at compile time. A load additionally
//! remembers the last store to the same pointer that preceded it, and that
//! store is always written before the load.
//!
//! A value is emitted in the block that first needs it. Values and access
//! chains built before a selection or a loop are emitted right before the
//! block opens, so that their ids dominate the uses inside and after it.

use fnv::FnvHashMap as HashMap;
use log::trace;
use spirv_headers::{Op, Word};

use crate::builder::{Builder, Session};
use crate::errors::*;
use crate::graph::Value;
use crate::node;
use crate::pointer::{self, Pointer};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum FlowEvent {
    IfBegin(usize),
    IfElse(usize),
    IfEnd(usize),
    LoopStart(usize),
    LoopEnd(usize),
    /// Loop index and the label opening the dead block after the branch
    Break(usize, Word),
    Continue(usize, Word),
}

#[derive(Copy, Clone, Debug)]
pub(crate) enum EventKind {
    Load {
        pointer: Pointer,
        value: Value,
        predecessor: Option<usize>,
    },
    Store {
        pointer: Pointer,
        value: Value,
    },
    Flow(FlowEvent),
}

/// Point of the program a node or a pointer was built at
///
/// Regions are the branches and loop bodies, named after the flow event
/// opening them; `None` is the entry block.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub(crate) struct Position {
    /// Index of the next event when the item was built
    pub event: usize,
    pub region: Option<usize>,
}

#[derive(Debug)]
struct Event {
    kind: EventKind,
    written: bool,
    /// Region the event was recorded in
    region: Option<usize>,
}

#[derive(Debug, Default)]
pub(crate) struct EventRegistry {
    events: Vec<Event>,
    /// Most recent store event for each pointer
    last_store: HashMap<Pointer, usize>,
    /// Regions currently open, innermost last
    open: Vec<usize>,
    /// Region enclosing each region
    parents: HashMap<usize, Option<usize>>,
}

impl EventRegistry {
    fn push(&mut self, kind: EventKind) -> usize {
        let region = self.open.last().cloned();
        self.events.push(Event {
            kind,
            written: false,
            region,
        });
        self.events.len() - 1
    }

    /// Index the next event will be recorded under
    #[inline]
    pub fn next_index(&self) -> usize {
        self.events.len()
    }

    #[inline]
    pub fn position(&self) -> Position {
        Position {
            event: self.next_index(),
            region: self.open.last().cloned(),
        }
    }

    fn open_region(&mut self, index: usize) {
        let parent = self.open.last().cloned();
        self.parents.insert(index, parent);
        self.open.push(index);
    }

    /// Whether `outer` is `inner` or one of the regions enclosing it
    fn encloses(&self, outer: Option<usize>, mut inner: Option<usize>) -> bool {
        loop {
            if inner == outer {
                return true;
            }

            inner = match inner {
                Some(region) => self.parents.get(&region).cloned().unwrap_or(None),
                None => return false,
            };
        }
    }

    /// Whether something built at `position` is computed in a block
    /// dominating the event at `index`
    pub fn dominates(&self, position: Position, index: usize) -> bool {
        match self.events.get(index) {
            Some(event) => position.event <= index && self.encloses(position.region, event.region),
            None => false,
        }
    }

    pub fn push_load(&mut self, pointer: Pointer, value: Value) -> usize {
        let predecessor = self.last_store.get(&pointer).cloned();
        self.push(EventKind::Load {
            pointer,
            value,
            predecessor,
        })
    }

    pub fn push_store(&mut self, pointer: Pointer, value: Value) -> usize {
        let index = self.push(EventKind::Store { pointer, value });
        self.last_store.insert(pointer, index);
        index
    }

    pub fn push_flow(&mut self, event: FlowEvent) -> usize {
        let index = self.push(EventKind::Flow(event));
        match event {
            FlowEvent::IfBegin(_) | FlowEvent::LoopStart(_) => self.open_region(index),
            FlowEvent::IfElse(_) => {
                self.open.pop();
                self.open_region(index);
            }
            FlowEvent::IfEnd(_) | FlowEvent::LoopEnd(_) => {
                self.open.pop();
            }
            FlowEvent::Break(..) | FlowEvent::Continue(..) => {}
        }
        index
    }

    pub fn get(&self, index: usize) -> Option<EventKind> {
        self.events.get(index).map(|event| event.kind)
    }

    /// Store the event at `index` has to observe, if it is a load
    pub fn predecessor(&self, index: usize) -> Option<usize> {
        match self.get(index) {
            Some(EventKind::Load { predecessor, .. }) => predecessor,
            _ => None,
        }
    }

    pub fn is_written(&self, index: usize) -> bool {
        self.events.get(index).map_or(false, |event| event.written)
    }

    /// Flag an event as written, returning whether it already was
    fn mark_written(&mut self, index: usize) -> bool {
        match self.events.get_mut(index) {
            Some(event) => {
                let written = event.written;
                event.written = true;
                written
            }
            None => true,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn clear(&mut self) {
        self.events.clear();
        self.last_store.clear();
        self.open.clear();
        self.parents.clear();
    }
}

/// Write the store a load depends on, if there is one
pub(crate) fn ensure_predecessor_written(session: &mut Session, index: usize) -> Result<()> {
    match session.events.predecessor(index) {
        Some(store) => ensure_written(session, store),
        None => Ok(()),
    }
}

/// Write an event into the function body, once
pub(crate) fn ensure_written(session: &mut Session, index: usize) -> Result<()> {
    let kind = match session.events.get(index) {
        Some(kind) => kind,
        None => bail!(ErrorKind::ControlFlow("reference to an unknown event")),
    };

    if session.events.mark_written(index) {
        return Ok(());
    }

    trace!("write event {}: {:?}", index, kind);

    match kind {
        EventKind::Load { pointer, value, .. } => {
            ensure_predecessor_written(session, index)?;

            // the loaded value was released, nothing reads it
            if !session.graph.contains(value) {
                return Ok(());
            }

            let pointer_id = pointer::ensure_pointer(session, pointer)?;
            let (id, ty) = {
                let node = session.graph.node(value)?;
                (node.id, node.ty.clone())
            };

            let type_id = session.register_type(&ty)?;
            session.push_instruction(Op::Load, &[type_id, id, pointer_id]);
            session.graph.node_mut(value)?.result = Some(id);
        }

        EventKind::Store { pointer, value } => {
            let value_id = node::ensure_defined(session, value)?;
            let pointer_id = pointer::ensure_pointer(session, pointer)?;
            session.push_instruction(Op::Store, &[pointer_id, value_id]);
        }

        EventKind::Flow(event) => write_flow(session, index, event)?,
    }

    Ok(())
}

/// Emit the values and the accessed chains that were built in a block
/// dominating the event at `index` and are still pending
fn define_dominating(session: &mut Session, index: usize) -> Result<()> {
    for value in session.graph.values() {
        let (position, pending) = {
            let node = session.graph.node(value)?;
            let pending = node.ref_count > 0 && !node.is_defined() && !node.is_load();
            (node.position, pending)
        };

        if pending && session.events.dominates(position, index) {
            node::ensure_defined(session, value)?;
        }
    }

    for chain in session.pointers.chains() {
        let (position, pending) = {
            let data = session.pointers.get(chain)?;
            (data.position, data.accessed && !data.emitted)
        };

        if pending && session.events.dominates(position, index) {
            pointer::ensure_pointer(session, chain)?;
        }
    }

    Ok(())
}

fn write_flow(session: &mut Session, position: usize, event: FlowEvent) -> Result<()> {
    match event {
        FlowEvent::IfBegin(_) | FlowEvent::LoopStart(_) => define_dominating(session, position)?,
        _ => {}
    }

    match event {
        FlowEvent::IfBegin(index) => {
            let mut block = session.if_block(index)?;
            let condition = node::ensure_defined(session, block.condition)?;
            block.write_begin(condition, session)?;
            session.set_if_block(index, block)
        }
        FlowEvent::IfElse(index) => {
            let mut block = session.if_block(index)?;
            block.write_else(session)?;
            session.set_if_block(index, block)
        }
        FlowEvent::IfEnd(index) => {
            let mut block = session.if_block(index)?;
            block.write_end(session)?;
            session.set_if_block(index, block)
        }

        FlowEvent::LoopStart(index) => {
            let mut block = session.for_loop(index)?;
            let start = node::ensure_defined(session, block.start)?;
            let end = node::ensure_defined(session, block.end)?;
            let counter = pointer::ensure_pointer(session, block.counter)?;

            block.write_start(start, end, counter, session)?;
            session.set_for_loop(index, block)
        }
        FlowEvent::LoopEnd(index) => {
            let mut block = session.for_loop(index)?;
            let step = node::ensure_defined(session, block.step)?;
            let counter = pointer::ensure_pointer(session, block.counter)?;

            block.write_end(step, counter, session)?;
            session.set_for_loop(index, block)
        }

        FlowEvent::Break(index, label) => {
            let block = session.for_loop(index)?;
            block.write_break(label, session)
        }
        FlowEvent::Continue(index, label) => {
            let block = session.for_loop(index)?;
            block.write_continue(label, session)
        }
    }
}

/// Replay every event in program order
pub(crate) fn write_events(session: &mut Session) -> Result<()> {
    for index in 0..session.events.len() {
        ensure_written(session, index)?;
    }

    Ok(())
}
