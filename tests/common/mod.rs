//! Test-only writer for compiled rule files.
//!
//! Builds the same tables the published rule compiler produces, except that
//! labels are simply concatenated into the label store instead of being
//! overlapped.

#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use etn_r::suffix::format::{
    Header, CHILDREN_BITS_HI, CHILDREN_BITS_LO, CHILDREN_BITS_NODE_TYPE, NODES_BITS_ICANN,
    NODES_BITS_TEXT_LENGTH, NODES_BITS_TEXT_OFFSET, NODE_TYPE_EXCEPTION, NODE_TYPE_NORMAL,
    NODE_TYPE_PARENT_ONLY,
};

/// ICANN-section rules used by most integration tests
pub const ICANN_RULES: &[&str] = &[
    "ao",
    "pb.ao",
    "biz",
    "bd",
    "*.bd",
    "ck",
    "*.ck",
    "!www.ck",
    "cn",
    "com.cn",
    "xn--55qx5d.cn",
    "com",
    "jp",
    "ac.jp",
    "kyoto.jp",
    "ide.kyoto.jp",
    "kobe.jp",
    "*.kobe.jp",
    "!city.kobe.jp",
    "mm",
    "*.mm",
    "net",
    "org",
    "uk",
    "co.uk",
    "com.uk",
    "*.sch.uk",
    "us",
    "ak.us",
    "k12.ak.us",
    "xn--fiqs8s",
];

/// Private-section rules used by most integration tests
pub const PRIVATE_RULES: &[&str] = &[
    "blogspot.co.uk",
    "dyndns.org",
    "go.dyndns.org",
    "uk.com",
];

#[derive(Default)]
struct BuildNode {
    node_type: u32,
    icann: bool,
    wildcard: bool,
    children_index: u32,
    children: BTreeMap<String, BuildNode>,
}

impl BuildNode {
    fn child(&mut self, label: &str) -> &mut BuildNode {
        self.children
            .entry(label.to_string())
            .or_insert_with(|| BuildNode {
                node_type: NODE_TYPE_PARENT_ONLY,
                icann: true,
                ..Default::default()
            })
    }
}

fn insert_rule(root: &mut BuildNode, rule: &str, icann: bool, labels: &mut BTreeSet<String>) {
    let (rest, node_type, wildcard) = if let Some(rest) = rule.strip_prefix("*.") {
        (rest, NODE_TYPE_PARENT_ONLY, true)
    } else if let Some(rest) = rule.strip_prefix('!') {
        (rest, NODE_TYPE_EXCEPTION, false)
    } else {
        (rule, NODE_TYPE_NORMAL, false)
    };

    let mut node = root;
    for label in rest.rsplit('.') {
        labels.insert(label.to_string());
        node = node.child(label);
    }
    if node_type != NODE_TYPE_PARENT_ONLY && node.node_type == NODE_TYPE_PARENT_ONLY {
        node.node_type = node_type;
    }
    node.icann = node.icann && icann;
    node.wildcard = node.wildcard || wildcard;
}

/// Assign child-table entries in pre-order; the root's range is implicit
fn assign_indexes(node: &mut BuildNode, next_node: &mut u32, children: &mut Vec<u32>, root: bool) {
    if node.children.is_empty() {
        node.children_index = node.node_type + if node.wildcard { 3 } else { 0 };
    } else {
        let lo = *next_node;
        *next_node += node.children.len() as u32;
        if !root {
            node.children_index = children.len() as u32;
            let mut entry = (*next_node << CHILDREN_BITS_LO) | lo;
            entry |= node.node_type << (CHILDREN_BITS_LO + CHILDREN_BITS_HI);
            if node.wildcard {
                entry |= 1 << (CHILDREN_BITS_LO + CHILDREN_BITS_HI + CHILDREN_BITS_NODE_TYPE);
            }
            children.push(entry);
        }
    }

    for child in node.children.values_mut() {
        assign_indexes(child, next_node, children, false);
    }
}

fn emit_nodes(node: &BuildNode, text: &str, nodes: &mut Vec<u32>) {
    for (label, child) in &node.children {
        let offset = text.find(label.as_str()).expect("label in text") as u32;
        let mut word = (offset << NODES_BITS_TEXT_LENGTH) | label.len() as u32;
        if child.icann {
            word |= 1 << (NODES_BITS_TEXT_LENGTH + NODES_BITS_TEXT_OFFSET);
        }
        word |= child.children_index
            << (NODES_BITS_TEXT_LENGTH + NODES_BITS_TEXT_OFFSET + NODES_BITS_ICANN);
        nodes.push(word);
    }
    for child in node.children.values() {
        emit_nodes(child, text, nodes);
    }
}

/// Compile ICANN and private rules into the binary rule-file format
pub fn compile_rules(icann: &[&str], private: &[&str]) -> Vec<u8> {
    let mut root = BuildNode::default();
    let mut labels = BTreeSet::new();
    for rule in icann {
        insert_rule(&mut root, rule, true, &mut labels);
    }
    for rule in private {
        insert_rule(&mut root, rule, false, &mut labels);
    }

    let text: String = labels.into_iter().collect();

    // Six leaf entries: each node type, without and with the wildcard bit
    let type_shift = CHILDREN_BITS_LO + CHILDREN_BITS_HI;
    let mut children: Vec<u32> = [0u32, 1, 2, 4, 5, 6].iter().map(|v| v << type_shift).collect();
    let mut next_node = 0;
    assign_indexes(&mut root, &mut next_node, &mut children, true);

    let mut nodes = Vec::new();
    emit_nodes(&root, &text, &mut nodes);

    let mut words = Header::expected(root.children.len() as u32).to_words().to_vec();
    words.push(text.len() as u32);

    let mut out = Vec::new();
    for w in &words {
        out.extend_from_slice(&w.to_be_bytes());
    }
    out.extend_from_slice(text.as_bytes());
    out.extend_from_slice(&(nodes.len() as u32).to_be_bytes());
    for w in &nodes {
        out.extend_from_slice(&w.to_be_bytes());
    }
    out.extend_from_slice(&(children.len() as u32).to_be_bytes());
    for w in &children {
        out.extend_from_slice(&w.to_be_bytes());
    }
    out
}

/// The default test rule set
pub fn test_rule_file() -> Vec<u8> {
    compile_rules(ICANN_RULES, PRIVATE_RULES)
}

/// Write `data` under the system temp directory and return the path
pub fn write_temp_rule_file(name: &str, data: &[u8]) -> PathBuf {
    let path = std::env::temp_dir().join(format!("etn_r_{}_{}", std::process::id(), name));
    std::fs::write(&path, data).expect("write temp rule file");
    path
}

/// Path of a file under the crate's `testdata` directory
pub fn testdata_path(filename: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("testdata");
    path.push(filename);
    path
}
