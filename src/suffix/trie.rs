//! Public-suffix matcher over the compiled rule trie.
//!
//! The label store, node table and children table are loaded once and
//! never written again, so one `PublicSuffixList` can be cloned into any
//! number of threads and queried without locking.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::error::{EtnError, FormatErrorKind, Result};

use super::format::{Child, Node, NodeType, MAX_DOMAIN_LEN};

/// Immutable rule tables shared by every handle
#[derive(Debug)]
pub(crate) struct SuffixTrie {
    num_tld: usize,
    text: Vec<u8>,
    nodes: Vec<Node>,
    children: Vec<Child>,
}

impl SuffixTrie {
    /// Assemble the tables, rejecting any entry that points outside its
    /// target table so that lookups can index without further checks.
    pub(crate) fn new(
        num_tld: usize,
        text: Vec<u8>,
        nodes: Vec<Node>,
        children: Vec<Child>,
    ) -> Result<Self> {
        if num_tld > nodes.len() {
            return Err(EtnError::format(
                FormatErrorKind::InconsistentTables,
                format!("num_TLD {} exceeds node count {}", num_tld, nodes.len()),
            ));
        }

        for (i, node) in nodes.iter().enumerate() {
            if node.text_range().end > text.len() {
                return Err(EtnError::format(
                    FormatErrorKind::InconsistentTables,
                    format!(
                        "node {} label {:?} is outside the {}-byte label store",
                        i,
                        node.text_range(),
                        text.len()
                    ),
                ));
            }
            if node.children_index() >= children.len() {
                return Err(EtnError::format(
                    FormatErrorKind::InconsistentTables,
                    format!(
                        "node {} children index {} exceeds children count {}",
                        i,
                        node.children_index(),
                        children.len()
                    ),
                ));
            }
        }

        for (i, child) in children.iter().enumerate() {
            if child.lo() > child.hi() || child.hi() > nodes.len() {
                return Err(EtnError::format(
                    FormatErrorKind::InconsistentTables,
                    format!(
                        "child {} range [{}, {}) is outside {} nodes",
                        i,
                        child.lo(),
                        child.hi(),
                        nodes.len()
                    ),
                ));
            }
            if child.node_type().is_none() {
                return Err(EtnError::format(
                    FormatErrorKind::InconsistentTables,
                    format!("child {} has unknown node type {}", i, child.node_type_raw()),
                ));
            }
        }

        Ok(Self {
            num_tld,
            text,
            nodes,
            children,
        })
    }

    #[inline]
    fn label(&self, node: Node) -> &[u8] {
        &self.text[node.text_range()]
    }

    /// Binary search for `label` among the sibling nodes `[lo, hi)`
    fn find(&self, label: &[u8], lo: usize, hi: usize) -> Option<usize> {
        self.nodes[lo..hi]
            .binary_search_by(|&node| self.label(node).cmp(label))
            .ok()
            .map(|i| lo + i)
    }
}

/// Result of a public-suffix lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublicSuffix<'a> {
    /// The effective TLD, always a dot-aligned suffix of the queried domain
    pub suffix: &'a str,
    /// Whether the last matched rule came from the ICANN section
    pub icann: bool,
}

impl PublicSuffix<'_> {
    /// Who manages the suffix
    pub fn manager(&self) -> Manager {
        if self.icann {
            Manager::Icann
        } else if self.suffix.contains('.') {
            Manager::Private
        } else {
            Manager::Unmanaged
        }
    }
}

/// Management class of a public suffix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Manager {
    /// Rule from the ICANN section of the list
    Icann,
    /// Privately registered rule (e.g. `blogspot.co.uk`)
    Private,
    /// No rule matched; the implicit `*` rule applied
    Unmanaged,
}

impl fmt::Display for Manager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Manager::Icann => "ICANN Managed",
            Manager::Private => "Privately Managed",
            Manager::Unmanaged => "Unmanaged",
        })
    }
}

/// Full classification of one domain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DomainInfo<'a> {
    pub domain: &'a str,
    pub etld: &'a str,
    pub etld_plus_one: &'a str,
    pub icann: bool,
    pub manager: Manager,
}

/// Shared handle to a loaded public-suffix rule set.
///
/// Cloning is cheap: all clones share one set of tables, which are freed
/// when the last clone is dropped.
#[derive(Debug, Clone)]
pub struct PublicSuffixList {
    trie: Arc<SuffixTrie>,
}

impl PublicSuffixList {
    pub(crate) fn from_trie(trie: SuffixTrie) -> Self {
        Self {
            trie: Arc::new(trie),
        }
    }

    /// Find the public suffix (eTLD) of `domain`.
    ///
    /// Matching is byte-wise and case-sensitive; callers pass lowercase,
    /// ASCII (punycoded) names. Domains longer than 255 bytes yield an empty
    /// suffix with `icann == false`.
    pub fn public_suffix<'a>(&self, domain: &'a str) -> PublicSuffix<'a> {
        if domain.len() > MAX_DOMAIN_LEN {
            return PublicSuffix {
                suffix: "",
                icann: false,
            };
        }

        let trie = &*self.trie;
        let bytes = domain.as_bytes();

        let mut end = bytes.len();
        let mut lo = 0;
        let mut hi = trie.num_tld;
        let mut wildcard = false;
        let mut icann = false;
        let mut suffix = bytes.len();

        loop {
            let view = &bytes[..end];
            let dot = view.iter().rposition(|&b| b == b'.');
            let label_start = dot.map_or(0, |d| d + 1);

            if wildcard {
                suffix = label_start;
            }
            if lo == hi {
                break;
            }

            let Some(found) = trie.find(&view[label_start..], lo, hi) else {
                break;
            };

            let node = trie.nodes[found];
            icann = node.icann();

            let child = trie.children[node.children_index()];
            lo = child.lo();
            hi = child.hi();

            match child.node_type() {
                Some(NodeType::Normal) => suffix = label_start,
                Some(NodeType::Exception) => {
                    // The excepted label itself is not part of the suffix
                    suffix = end + 1;
                    break;
                }
                _ => {}
            }
            wildcard = child.wildcard();

            match dot {
                Some(d) => end = d,
                None => break,
            }
        }

        if suffix >= bytes.len() {
            // No rule matched: the prevailing rule is "*"
            let last = bytes
                .iter()
                .rposition(|&b| b == b'.')
                .map_or(0, |d| d + 1);
            return PublicSuffix {
                suffix: &domain[last..],
                icann,
            };
        }

        PublicSuffix {
            suffix: &domain[suffix..],
            icann,
        }
    }

    /// Registrable domain: the public suffix plus one more label.
    ///
    /// Returns an empty string when `domain` is itself a public suffix or
    /// has no label left of it.
    pub fn etld_plus_one<'a>(&self, domain: &'a str) -> &'a str {
        if domain.len() > MAX_DOMAIN_LEN {
            return "";
        }

        let suffix = self.public_suffix(domain).suffix;
        if domain.len() <= suffix.len() {
            return "";
        }

        let i = domain.len() - suffix.len() - 1;
        if domain.as_bytes()[i] != b'.' {
            return "";
        }

        match domain[..i].rfind('.') {
            Some(d) => &domain[d + 1..],
            None => domain,
        }
    }

    /// eTLD, eTLD+1 and manager of `domain` in one call
    pub fn classify<'a>(&self, domain: &'a str) -> DomainInfo<'a> {
        let ps = self.public_suffix(domain);
        DomainInfo {
            domain,
            etld: ps.suffix,
            etld_plus_one: self.etld_plus_one(domain),
            icann: ps.icann,
            manager: ps.manager(),
        }
    }

    /// Number of top-level labels in the rule set
    pub fn num_tld(&self) -> usize {
        self.trie.num_tld
    }

    /// Number of entries in the node table
    pub fn node_count(&self) -> usize {
        self.trie.nodes.len()
    }

    /// Number of entries in the children table
    pub fn children_count(&self) -> usize {
        self.trie.children.len()
    }

    /// Size of the label store in bytes
    pub fn text_len(&self) -> usize {
        self.trie.text.len()
    }

    /// Number of live handles sharing these tables
    pub fn handle_count(&self) -> usize {
        Arc::strong_count(&self.trie)
    }
}
