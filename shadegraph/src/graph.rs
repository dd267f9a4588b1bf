//! Arena holding the expression graph
//!
//! Nodes are stored in a `StableGraph` so that releasing a node never
//! invalidates the handles of the others. Edges go from an operand to its
//! consumer and are weighted by the operand position.
//!
//! Freed slots are reused by the arena, so every node also carries a serial
//! number that is never handed out twice by the same graph. A handle whose
//! serial does not match the node in its slot is stale.

use petgraph::stable_graph::{NodeIndex, StableGraph};
use petgraph::visit::EdgeRef;
use petgraph::Incoming;
use spirv_headers::Word;

use crate::errors::*;
use crate::events::Position;
use crate::node::NodeKind;
use crate::types::TypeName;

/// Handle to a node of the expression graph
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct Value {
    pub(crate) index: NodeIndex<u32>,
    pub(crate) serial: u32,
}

impl Value {
    #[inline]
    pub fn index(self) -> usize {
        self.index.index()
    }
}

#[derive(Debug)]
pub(crate) struct Node {
    /// Id allocated when the node was built
    pub id: Word,
    pub ty: TypeName,
    pub kind: NodeKind,
    /// Id holding the value once defined, which may differ from `id` for constants
    pub result: Option<Word>,
    pub ref_count: u32,
    /// Where the node was built in program order
    pub position: Position,
    serial: u32,
}

impl Node {
    pub fn new(id: Word, ty: TypeName, kind: NodeKind) -> Self {
        Self {
            id,
            ty,
            kind,
            result: None,
            ref_count: 0,
            position: Position::default(),
            serial: 0,
        }
    }

    #[inline]
    pub fn is_defined(&self) -> bool {
        self.result.is_some()
    }

    #[inline]
    pub fn is_load(&self) -> bool {
        match self.kind {
            NodeKind::Load(_) => true,
            _ => false,
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct Graph {
    graph: StableGraph<Node, u32>,
    /// Serial of the next node, kept across `clear`
    next_serial: u32,
}

impl Graph {
    /// Add a node consuming `args`, taking a reference on each of them
    pub fn add_node(&mut self, mut node: Node, args: &[Value]) -> Result<Value> {
        for arg in args {
            self.node(*arg)?;
        }

        let serial = self.next_serial;
        self.next_serial += 1;
        node.serial = serial;

        let index = self.graph.add_node(node);
        for (position, arg) in args.iter().enumerate() {
            self.graph.add_edge(arg.index, index, position as u32);
            self.node_mut(*arg)?.ref_count += 1;
        }

        Ok(Value { index, serial })
    }

    pub fn node(&self, value: Value) -> Result<&Node> {
        match self.graph.node_weight(value.index) {
            Some(node) if node.serial == value.serial => Ok(node),
            _ => bail!(ErrorKind::StaleValue(value.index())),
        }
    }

    pub fn node_mut(&mut self, value: Value) -> Result<&mut Node> {
        match self.graph.node_weight_mut(value.index) {
            Some(node) if node.serial == value.serial => Ok(node),
            _ => bail!(ErrorKind::StaleValue(value.index())),
        }
    }

    #[inline]
    pub fn contains(&self, value: Value) -> bool {
        self.node(value).is_ok()
    }

    fn handle(&self, index: NodeIndex<u32>) -> Option<Value> {
        self.graph.node_weight(index).map(|node| Value {
            index,
            serial: node.serial,
        })
    }

    /// Operands of a node, in order
    pub fn arguments(&self, value: Value) -> Vec<Value> {
        let mut edges: Vec<_> = self.graph.edges_directed(value.index, Incoming).collect();
        edges.sort_by_key(|edge| *edge.weight());
        edges
            .into_iter()
            .filter_map(|edge| self.handle(edge.source()))
            .collect()
    }

    /// Every live node, in slot order
    pub fn values(&self) -> Vec<Value> {
        self.graph
            .node_indices()
            .filter_map(|index| self.handle(index))
            .collect()
    }

    /// Take an extra reference on a node
    pub fn retain(&mut self, value: Value) -> Result<()> {
        self.node_mut(value)?.ref_count += 1;
        Ok(())
    }

    /// Drop a reference on a node, freeing it and releasing its operands
    /// when it was the last one
    pub fn unref_tree(&mut self, value: Value) -> Result<()> {
        {
            let node = self.node_mut(value)?;
            if node.ref_count > 1 {
                node.ref_count -= 1;
                return Ok(());
            }
        }

        let args = self.arguments(value);
        self.graph.remove_node(value.index);

        for arg in args {
            self.unref_tree(arg)?;
        }

        Ok(())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    /// Drop every node; handles to them become stale
    pub fn clear(&mut self) {
        self.graph.clear();
    }
}
