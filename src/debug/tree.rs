//! Variables from the debug info arranged as a tree, e.g. a struct variable has its
//! members as children. The tree is produced by a DWARF parser and only read here.
//! Nodes live in an arena and refer to each other by index.
use crate::elf::VirtualAddr;
use std::fmt;
use std::ops::Index;
use tracing::warn;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct NodeId(pub usize);

/// The type of a variable as far as reading and writing its bytes is concerned.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DataType {
    Boolean,
    U8,
    S8,
    U16,
    S16,
    U32,
    S32,
    Float32,
    Float64,

    /// Stored as a one byte ordinal. Labels are found with `SymbolTree::enum_labels`.
    Enum,

    Struct,
    Unknown,
}

#[derive(Clone, Debug)]
pub struct SymbolNode {
    /// Raw bytes from the debug info, usually but not always UTF-8.
    pub name: Vec<u8>,

    pub addr: VirtualAddr,

    /// Empty for scalars, one entry for 1-D arrays, etc.
    pub dims: Vec<u32>,

    pub dtype: DataType,

    /// Qualifier nodes (const, volatile, typedef wrappers, etc.) have no value of their
    /// own but their children do.
    pub qualifier: bool,

    pub parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl SymbolNode {
    pub fn new(name: &str, addr: u32, dtype: DataType) -> Self {
        SymbolNode {
            name: name.as_bytes().to_vec(),
            addr: VirtualAddr(addr),
            dims: Vec::new(),
            dtype,
            qualifier: false,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn with_dims(mut self, dims: &[u32]) -> Self {
        self.dims = dims.to_vec();
        self
    }

    pub fn as_qualifier(mut self) -> Self {
        self.qualifier = true;
        self
    }

    pub fn name_str(&self) -> String {
        String::from_utf8_lossy(&self.name).into_owned()
    }

    /// Multi-dimensional arrays are shown but can't be read or written as one value.
    pub fn is_multi_dimensional(&self) -> bool {
        self.dims.len() > 1
    }
}

#[derive(Clone, Debug, Default)]
pub struct SymbolTree {
    nodes: Vec<SymbolNode>,
    roots: Vec<NodeId>,
}

impl SymbolTree {
    pub fn new() -> Self {
        SymbolTree::default()
    }

    /// Adds node as the last child of parent, or as a new root. A parent that isn't in
    /// the tree is logged and the node becomes a root.
    pub fn add(&mut self, parent: Option<NodeId>, mut node: SymbolNode) -> NodeId {
        let id = NodeId(self.nodes.len());
        let parent = match parent {
            Some(p) if p.0 >= self.nodes.len() => {
                warn!("parent {} of {} isn't in the tree", p.0, node.name_str());
                None
            }
            _ => parent,
        };
        node.parent = parent;
        node.children.clear();
        self.nodes.push(node);
        match parent.and_then(|p| self.nodes.get_mut(p.0)) {
            Some(p) => p.children.push(id),
            None => self.roots.push(id),
        }
        id
    }

    pub fn get(&self, id: NodeId) -> Option<&SymbolNode> {
        self.nodes.get(id.0)
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        match self.get(id) {
            Some(node) => &node.children,
            None => &[],
        }
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).first().copied()
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let siblings = match self.get(id)?.parent {
            Some(parent) => self.children(parent),
            None => self.roots.as_slice(),
        };
        let i = siblings.iter().position(|&s| s == id)?;
        siblings.get(i + 1).copied()
    }

    /// Enumerators hang three levels below the enum variable (variable, type, enumeration
    /// type, first enumerator) with the rest of the enumerators as siblings of the first.
    pub fn enum_labels(&self, id: NodeId) -> Vec<String> {
        let enumeration = self.first_child(id).and_then(|t| self.first_child(t));
        match enumeration {
            Some(e) => self
                .children(e)
                .iter()
                .map(|&label| self[label].name_str())
                .collect(),
            None => Vec::new(),
        }
    }

    /// Names from the root down to id joined with dots.
    pub fn path(&self, id: NodeId) -> String {
        let mut names = Vec::new();
        let mut current = self.get(id);
        while let Some(node) = current {
            names.push(node.name_str());
            current = node.parent.and_then(|p| self.get(p));
        }
        names.reverse();
        names.join(".")
    }
}

impl Index<NodeId> for SymbolTree {
    type Output = SymbolNode;

    fn index(&self, id: NodeId) -> &Self::Output {
        &self.nodes[id.0]
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            DataType::Boolean => "bool",
            DataType::U8 => "uint8",
            DataType::S8 => "sint8",
            DataType::U16 => "uint16",
            DataType::S16 => "sint16",
            DataType::U32 => "uint32",
            DataType::S32 => "sint32",
            DataType::Float32 => "float32",
            DataType::Float64 => "float64",
            DataType::Enum => "[enum]",
            DataType::Struct => "[struct]",
            DataType::Unknown => "unknown",
        };
        write!(f, "{name}")
    }
}
