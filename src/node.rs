//! The node arena. Every cross-reference (`child`, `next`, a script or
//! global's `first_node`) is a `NodeIndex` into a single `Vec<Node>` rather
//! than an owned sub-tree, so that the swap-remove compaction pass in the
//! type resolver can rewrite a handful of integers instead of relinking a
//! tree.

use crate::value_type::ValueType;

/// An index into the node arena, or the sentinel meaning "no node".
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeIndex(u32);

impl NodeIndex {
    pub const NONE: NodeIndex = NodeIndex(u32::MAX);

    pub(crate) fn new(index: usize) -> NodeIndex {
        debug_assert!(index < u32::MAX as usize, "node arena exceeded u32 capacity");
        NodeIndex(index as u32)
    }

    pub fn is_none(&self) -> bool {
        *self == NodeIndex::NONE
    }

    pub fn index(&self) -> Option<usize> {
        if self.is_none() {
            None
        } else {
            Some(self.0 as usize)
        }
    }
}

impl Default for NodeIndex {
    fn default() -> Self {
        NodeIndex::NONE
    }
}

/// The single meaningful payload slot of a node, chosen by `value_type` and
/// `is_primitive`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum NodeData {
    /// Not yet specialized (primitive pre-resolution) or not meaningful for
    /// this node's type (e.g. a `STRING`/global/unresolved-domain literal,
    /// which instead carries its payload in `string_data`).
    None,
    /// Interior call node: index of the first child in the sibling list.
    Child(NodeIndex),
    Long(i32),
    Short(i16),
    Bool(bool),
    Real(f32),
}

/// A single element of the node graph: either a primitive leaf or an
/// interior call node.
#[derive(Debug, Clone)]
pub struct Node {
    pub value_type: ValueType,

    /// Present for leaves pre-resolution, for function-name leaves always,
    /// and for globals/strings/unresolved-engine-references post-resolution.
    /// Released (set to `None`) when a leaf is specialized to a numeric or
    /// boolean primitive.
    pub string_data: Option<String>,

    /// Next sibling in the call's argument/body list, or `NodeIndex::NONE`
    /// if this is the last sibling.
    pub next_node: NodeIndex,

    pub is_primitive: bool,
    pub is_global: bool,
    pub is_script_call: bool,

    /// Set post-resolution for script-call nodes: the index of the target
    /// script in the final script table.
    pub call_index: u16,

    pub data: NodeData,

    pub file: usize,
    pub line: usize,
    pub column: usize,
}

impl Node {
    pub(crate) fn new_primitive_word(
        string: std::string::String,
        file: usize,
        line: usize,
        column: usize,
    ) -> Node {
        Node {
            value_type: ValueType::Unparsed,
            string_data: Some(string),
            next_node: NodeIndex::NONE,
            is_primitive: true,
            is_global: false,
            is_script_call: false,
            call_index: 0,
            data: NodeData::None,
            file,
            line,
            column,
        }
    }

    pub(crate) fn new_interior(
        return_type: ValueType,
        child: NodeIndex,
        file: usize,
        line: usize,
        column: usize,
    ) -> Node {
        Node {
            value_type: return_type,
            string_data: None,
            next_node: NodeIndex::NONE,
            is_primitive: false,
            is_global: false,
            is_script_call: false,
            call_index: 0,
            data: NodeData::Child(child),
            file,
            line,
            column,
        }
    }

    pub fn child_node(&self) -> NodeIndex {
        match self.data {
            NodeData::Child(c) => c,
            _ => NodeIndex::NONE,
        }
    }
}

/// The node arena owned by a `Compiler` instance.
#[derive(Debug, Default, Clone)]
pub struct NodeArena {
    pub(crate) nodes: Vec<Node>,
}

impl NodeArena {
    pub fn new() -> NodeArena {
        NodeArena { nodes: Vec::new() }
    }

    pub(crate) fn push(&mut self, node: Node) -> NodeIndex {
        let index = NodeIndex::new(self.nodes.len());
        self.nodes.push(node);
        index
    }

    pub fn get(&self, index: NodeIndex) -> &Node {
        &self.nodes[index.index().expect("dereferenced the NONE node index")]
    }

    pub fn get_mut(&mut self, index: NodeIndex) -> &mut Node {
        &mut self.nodes[index.index().expect("dereferenced the NONE node index")]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn as_slice(&self) -> &[Node] {
        &self.nodes
    }

    /// Iterate a sibling chain starting at `head`, stopping at the sentinel.
    pub fn siblings(&self, head: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        let mut current = head;
        std::iter::from_fn(move || {
            if current.is_none() {
                None
            } else {
                let this = current;
                current = self.get(this).next_node;
                Some(this)
            }
        })
    }
}
