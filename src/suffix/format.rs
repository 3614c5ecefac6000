//! Layout of the compiled public-suffix rule file.
//!
//! Every integer in the file is a big-endian `u32`. A node word packs, from
//! the least significant bit: label length, label offset, ICANN flag and the
//! index of its child entry. A child word packs: `lo`, `hi`, node type and
//! the wildcard flag.

/// Magic number at the start of every compiled rule file
pub const MAGIC: u32 = 0x9601_042D;

/// Default file name of a compiled rule set
pub const DEFAULT_RULE_FILE: &str = "public_suffix_compiled.dat";

/// RFC 1035 section 2.3.4: names are 255 octets or less
pub const MAX_DOMAIN_LEN: usize = 255;

pub const NODES_BITS_CHILDREN: u32 = 10;
pub const NODES_BITS_ICANN: u32 = 1;
pub const NODES_BITS_TEXT_OFFSET: u32 = 15;
pub const NODES_BITS_TEXT_LENGTH: u32 = 6;

pub const CHILDREN_BITS_WILDCARD: u32 = 1;
pub const CHILDREN_BITS_NODE_TYPE: u32 = 2;
pub const CHILDREN_BITS_HI: u32 = 14;
pub const CHILDREN_BITS_LO: u32 = 14;

pub const NODE_TYPE_NORMAL: u32 = 0;
pub const NODE_TYPE_EXCEPTION: u32 = 1;
pub const NODE_TYPE_PARENT_ONLY: u32 = 2;

/// Number of `u32` fields in the fixed header, including magic and `num_TLD`
pub const HEADER_FIELDS: usize = 13;

const NODE_TEXT_OFFSET_SHIFT: u32 = NODES_BITS_TEXT_LENGTH;
const NODE_ICANN_SHIFT: u32 = NODE_TEXT_OFFSET_SHIFT + NODES_BITS_TEXT_OFFSET;
const NODE_CHILDREN_SHIFT: u32 = NODE_ICANN_SHIFT + NODES_BITS_ICANN;

const CHILD_HI_SHIFT: u32 = CHILDREN_BITS_LO;
const CHILD_NODE_TYPE_SHIFT: u32 = CHILD_HI_SHIFT + CHILDREN_BITS_HI;
const CHILD_WILDCARD_SHIFT: u32 = CHILD_NODE_TYPE_SHIFT + CHILDREN_BITS_NODE_TYPE;

#[inline]
const fn mask(bits: u32) -> u32 {
    (1u32 << bits) - 1
}

/// Rule kind stored in a child entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
    /// The label completes a rule (`co.uk`)
    Normal,
    /// The label completes an exception rule (`!city.kobe.jp`)
    Exception,
    /// The label only exists as the parent of deeper rules
    ParentOnly,
}

impl TryFrom<u32> for NodeType {
    type Error = u32;

    fn try_from(value: u32) -> std::result::Result<Self, Self::Error> {
        match value {
            NODE_TYPE_NORMAL => Ok(NodeType::Normal),
            NODE_TYPE_EXCEPTION => Ok(NodeType::Exception),
            NODE_TYPE_PARENT_ONLY => Ok(NodeType::ParentOnly),
            other => Err(other),
        }
    }
}

/// One packed entry of the node table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Node(pub u32);

impl Node {
    #[inline]
    pub fn text_length(self) -> usize {
        (self.0 & mask(NODES_BITS_TEXT_LENGTH)) as usize
    }

    #[inline]
    pub fn text_offset(self) -> usize {
        ((self.0 >> NODE_TEXT_OFFSET_SHIFT) & mask(NODES_BITS_TEXT_OFFSET)) as usize
    }

    #[inline]
    pub fn icann(self) -> bool {
        (self.0 >> NODE_ICANN_SHIFT) & mask(NODES_BITS_ICANN) != 0
    }

    #[inline]
    pub fn children_index(self) -> usize {
        ((self.0 >> NODE_CHILDREN_SHIFT) & mask(NODES_BITS_CHILDREN)) as usize
    }

    /// Byte range of this node's label inside the label store
    #[inline]
    pub fn text_range(self) -> std::ops::Range<usize> {
        let offset = self.text_offset();
        offset..offset + self.text_length()
    }
}

/// One packed entry of the children table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Child(pub u32);

impl Child {
    #[inline]
    pub fn lo(self) -> usize {
        (self.0 & mask(CHILDREN_BITS_LO)) as usize
    }

    #[inline]
    pub fn hi(self) -> usize {
        ((self.0 >> CHILD_HI_SHIFT) & mask(CHILDREN_BITS_HI)) as usize
    }

    /// Raw node-type field; values other than 0..=2 never pass load validation
    #[inline]
    pub fn node_type_raw(self) -> u32 {
        (self.0 >> CHILD_NODE_TYPE_SHIFT) & mask(CHILDREN_BITS_NODE_TYPE)
    }

    #[inline]
    pub fn node_type(self) -> Option<NodeType> {
        NodeType::try_from(self.node_type_raw()).ok()
    }

    #[inline]
    pub fn wildcard(self) -> bool {
        (self.0 >> CHILD_WILDCARD_SHIFT) & mask(CHILDREN_BITS_WILDCARD) != 0
    }
}

/// Names of the layout fields, in file order after the magic number
const LAYOUT_FIELDS: [&str; 11] = [
    "nodes_bits_children",
    "nodes_bits_ICANN",
    "nodes_bits_text_offset",
    "nodes_bits_text_length",
    "children_bits_wildcard",
    "children_bits_node_type",
    "children_bits_hi",
    "children_bits_lo",
    "node_type_normal",
    "node_type_exception",
    "node_type_parent_only",
];

/// Fixed-size header at the start of a compiled rule file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub magic: u32,
    pub nodes_bits_children: u32,
    pub nodes_bits_icann: u32,
    pub nodes_bits_text_offset: u32,
    pub nodes_bits_text_length: u32,
    pub children_bits_wildcard: u32,
    pub children_bits_node_type: u32,
    pub children_bits_hi: u32,
    pub children_bits_lo: u32,
    pub node_type_normal: u32,
    pub node_type_exception: u32,
    pub node_type_parent_only: u32,
    pub num_tld: u32,
}

impl Header {
    /// Header this crate writes and accepts, with the given root-level size
    pub fn expected(num_tld: u32) -> Self {
        Self {
            magic: MAGIC,
            nodes_bits_children: NODES_BITS_CHILDREN,
            nodes_bits_icann: NODES_BITS_ICANN,
            nodes_bits_text_offset: NODES_BITS_TEXT_OFFSET,
            nodes_bits_text_length: NODES_BITS_TEXT_LENGTH,
            children_bits_wildcard: CHILDREN_BITS_WILDCARD,
            children_bits_node_type: CHILDREN_BITS_NODE_TYPE,
            children_bits_hi: CHILDREN_BITS_HI,
            children_bits_lo: CHILDREN_BITS_LO,
            node_type_normal: NODE_TYPE_NORMAL,
            node_type_exception: NODE_TYPE_EXCEPTION,
            node_type_parent_only: NODE_TYPE_PARENT_ONLY,
            num_tld,
        }
    }

    pub fn from_words(words: [u32; HEADER_FIELDS]) -> Self {
        Self {
            magic: words[0],
            nodes_bits_children: words[1],
            nodes_bits_icann: words[2],
            nodes_bits_text_offset: words[3],
            nodes_bits_text_length: words[4],
            children_bits_wildcard: words[5],
            children_bits_node_type: words[6],
            children_bits_hi: words[7],
            children_bits_lo: words[8],
            node_type_normal: words[9],
            node_type_exception: words[10],
            node_type_parent_only: words[11],
            num_tld: words[12],
        }
    }

    pub fn to_words(&self) -> [u32; HEADER_FIELDS] {
        [
            self.magic,
            self.nodes_bits_children,
            self.nodes_bits_icann,
            self.nodes_bits_text_offset,
            self.nodes_bits_text_length,
            self.children_bits_wildcard,
            self.children_bits_node_type,
            self.children_bits_hi,
            self.children_bits_lo,
            self.node_type_normal,
            self.node_type_exception,
            self.node_type_parent_only,
            self.num_tld,
        ]
    }

    /// Sum of the four node field widths
    pub fn node_bits(&self) -> u64 {
        u64::from(self.nodes_bits_children)
            + u64::from(self.nodes_bits_icann)
            + u64::from(self.nodes_bits_text_offset)
            + u64::from(self.nodes_bits_text_length)
    }

    /// Sum of the four child field widths
    pub fn child_bits(&self) -> u64 {
        u64::from(self.children_bits_wildcard)
            + u64::from(self.children_bits_node_type)
            + u64::from(self.children_bits_hi)
            + u64::from(self.children_bits_lo)
    }

    /// Name of the first layout field that differs from the supported layout
    pub fn layout_mismatch(&self) -> Option<(&'static str, u32, u32)> {
        let found = self.to_words();
        let want = Self::expected(self.num_tld).to_words();
        // Words 1..=11 are the layout fields; magic and num_TLD are skipped
        LAYOUT_FIELDS
            .iter()
            .zip(found[1..].iter().zip(&want[1..]))
            .find(|(_, (found, want))| found != want)
            .map(|(&name, (&found, &want))| (name, found, want))
    }
}
