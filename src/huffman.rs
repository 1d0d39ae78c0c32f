use crate::config::MAX_SYMBOLS;
use crate::error::{HuffError, Result};
use crate::frequency::FrequencyTable;
use crate::symbol::Symbol;
use std::cmp::Reverse;
use std::collections::binary_heap::BinaryHeap;
use std::collections::HashMap;

/// Huffman tree stored as an arena: one leaf per table entry (in table
/// order), then the internal nodes in the order they were created. The last
/// node is the root.
#[derive(Debug)]
pub struct HuffmanTree {
    nodes: Vec<Node>,
    num_leaves: usize,
}

/// Bit-path from the root to a leaf, most significant bit first
/// (0 = left, 1 = right).
#[derive(Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PrefixCode {
    pub code: u64,
    pub length: u8,
}

/// Both directions of the code assignment derived from one tree.
#[derive(Debug)]
pub struct CodeTable {
    codes: Vec<Option<PrefixCode>>,
    symbols: HashMap<PrefixCode, Symbol>,
    max_length: u8,
}

#[derive(Debug, Clone, Copy)]
struct Node {
    count: u64,
    symbol: Option<Symbol>,
    left: Option<u32>,
    right: Option<u32>,
}

// Ordered by count, then by arena index: among equal counts the node that
// entered the arena first is taken first.
#[derive(PartialEq, Eq, PartialOrd, Ord)]
struct HeapEntry {
    count: u64,
    idx: u32,
}

impl PrefixCode {
    pub fn update(prefix_code: PrefixCode, bit: bool) -> PrefixCode {
        PrefixCode {
            code: (prefix_code.code << 1) | bit as u64,
            length: prefix_code.length + 1,
        }
    }

    /// Whether `self` is a proper or improper prefix of `other`.
    pub fn is_prefix_of(&self, other: &PrefixCode) -> bool {
        self.length <= other.length
            && (self.length == 0 || other.code >> (other.length - self.length) == self.code)
    }

    /// Bits of the code, first bit first.
    pub fn bits(&self) -> impl Iterator<Item = bool> + '_ {
        (0..self.length).rev().map(move |i| (self.code >> i) & 1 == 1)
    }
}

impl std::fmt::Display for PrefixCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for bit in self.bits() {
            f.write_str(if bit { "1" } else { "0" })?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for PrefixCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PrefixCode({})", self)
    }
}

impl HuffmanTree {
    pub fn build(table: &FrequencyTable) -> Result<HuffmanTree> {
        if table.is_empty() {
            return Err(HuffError::invalid_input(
                "cannot build a Huffman tree from an empty frequency table",
            ));
        }

        let num_leaves = table.len();
        let mut nodes = Vec::<Node>::with_capacity(2 * num_leaves - 1);
        let mut heap = BinaryHeap::<Reverse<HeapEntry>>::new(); // reverse so that it becomes a min heap

        for (idx, (symbol, count)) in table.iter().enumerate() {
            nodes.push(Node {
                count: count as u64,
                symbol: Some(symbol),
                left: None,
                right: None,
            });
            heap.push(Reverse(HeapEntry {
                count: count as u64,
                idx: idx as u32,
            }));
        }

        // Pop the two smallest nodes and join them under a new internal node
        // until a single node, the root, is left.
        loop {
            let Some(Reverse(first)) = heap.pop() else {
                return Err(HuffError::invalid_input("Huffman heap drained unexpectedly"));
            };
            let Some(Reverse(second)) = heap.pop() else {
                debug_assert_eq!(first.idx as usize, nodes.len() - 1);
                break;
            };

            let internal_node = Node {
                count: first.count + second.count,
                symbol: None,
                left: Some(first.idx),
                right: Some(second.idx),
            };

            let internal_node_idx = nodes.len() as u32;
            heap.push(Reverse(HeapEntry {
                count: internal_node.count,
                idx: internal_node_idx,
            }));
            nodes.push(internal_node);
        }

        Ok(HuffmanTree { nodes, num_leaves })
    }

    fn root(&self) -> usize {
        self.nodes.len() - 1
    }

    fn is_leaf_node(&self, idx: usize) -> bool {
        idx < self.num_leaves
    }

    pub fn num_leaves(&self) -> usize {
        self.num_leaves
    }

    /// Sum of all leaf counts.
    pub fn total_count(&self) -> u64 {
        self.nodes[self.root()].count
    }
}

impl CodeTable {
    fn build_impl(tree: &HuffmanTree, idx: usize, code: PrefixCode, table: &mut CodeTable) {
        let node = &tree.nodes[idx];

        if tree.is_leaf_node(idx) {
            if let Some(symbol) = node.symbol {
                table.insert(symbol, code);
            }
            return;
        }

        if let Some(left) = node.left {
            Self::build_impl(tree, left as usize, PrefixCode::update(code, false), table);
        }

        if let Some(right) = node.right {
            Self::build_impl(tree, right as usize, PrefixCode::update(code, true), table);
        }
    }

    fn insert(&mut self, symbol: Symbol, code: PrefixCode) {
        self.codes[symbol.index()] = Some(code);
        self.symbols.insert(code, symbol);
        self.max_length = self.max_length.max(code.length);
    }

    /// Encode direction.
    pub fn code(&self, symbol: Symbol) -> Option<&PrefixCode> {
        self.codes[symbol.index()].as_ref()
    }

    /// Decode direction: the symbol whose code is exactly `code`.
    pub fn symbol(&self, code: &PrefixCode) -> Option<Symbol> {
        self.symbols.get(code).copied()
    }

    /// Length of the longest code; no valid bit-path is longer.
    pub fn max_length(&self) -> u8 {
        self.max_length
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// (symbol, code) pairs ordered by symbol.
    pub fn iter(&self) -> impl Iterator<Item = (Symbol, PrefixCode)> + '_ {
        self.codes
            .iter()
            .enumerate()
            .filter_map(|(idx, code)| Some((Symbol::from_index(idx)?, (*code)?)))
    }
}

impl From<&HuffmanTree> for CodeTable {
    fn from(tree: &HuffmanTree) -> Self {
        let mut table = CodeTable {
            codes: vec![None; MAX_SYMBOLS],
            symbols: HashMap::with_capacity(tree.num_leaves),
            max_length: 0,
        };

        // A lone leaf is the root itself and would get an empty path; it is
        // given the one-bit code `0` instead so it still occupies a bit.
        let start = if tree.is_leaf_node(tree.root()) {
            PrefixCode::update(PrefixCode::default(), false)
        } else {
            PrefixCode::default()
        };

        Self::build_impl(tree, tree.root(), start, &mut table);

        table
    }
}
