//! Top-level declarations: the named bindings a compiled translation unit
//! exposes. Grounded on the teacher's `Script`/`Global` structs (`types.rs`)
//! but holding a `NodeIndex` into the shared arena rather than an owned
//! `Node`, per this crate's arena-based node model.

use crate::node::NodeIndex;
use crate::value_type::{ScriptType, ValueType};

/// Maximum stored length of a script or global name (truncated, not
/// rejected, at this length).
pub const MAX_NAME_LENGTH: usize = 31;

pub(crate) fn normalize_name(raw: &str) -> String {
    let lower = raw.to_lowercase();
    if lower.len() > MAX_NAME_LENGTH {
        // Truncate on a char boundary at or before the limit.
        let mut end = MAX_NAME_LENGTH;
        while !lower.is_char_boundary(end) {
            end -= 1;
        }
        lower[..end].to_owned()
    } else {
        lower
    }
}

/// A named top-level procedure.
#[derive(Debug, Clone)]
pub struct Script {
    pub name: String,
    pub return_type: ValueType,
    pub script_type: ScriptType,
    pub(crate) first_node: NodeIndex,
    pub file: usize,
    pub line: usize,
    pub column: usize,
}

/// A named top-level value binding.
#[derive(Debug, Clone)]
pub struct Global {
    pub name: String,
    pub value_type: ValueType,
    pub(crate) first_node: NodeIndex,
    pub file: usize,
    pub line: usize,
    pub column: usize,
}

impl Script {
    pub fn first_node(&self) -> NodeIndex {
        self.first_node
    }
}

impl Global {
    pub fn first_node(&self) -> NodeIndex {
        self.first_node
    }
}
