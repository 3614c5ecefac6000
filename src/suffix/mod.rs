//! Public-suffix (effective TLD) classification.
//!
//! A compiled rule file holds the public-suffix list as a trie: a label
//! store, a node table sorted per level, and a children table describing
//! each node's child range, rule type and wildcard flag. Lookups walk the
//! trie from the rightmost label with a binary search per level.
//!
//! ## Example
//!
//! ```no_run
//! use etn_r::PublicSuffixList;
//!
//! let list = PublicSuffixList::open("public_suffix_compiled.dat").unwrap();
//!
//! let ps = list.public_suffix("www.books.amazon.co.uk");
//! assert_eq!(ps.suffix, "co.uk");
//! assert!(ps.icann);
//! assert_eq!(list.etld_plus_one("www.books.amazon.co.uk"), "amazon.co.uk");
//! ```

pub mod format;
mod loader;
mod trie;

pub use format::{NodeType, DEFAULT_RULE_FILE, MAX_DOMAIN_LEN};
pub use loader::RuleFileLoader;
pub use trie::{DomainInfo, Manager, PublicSuffix, PublicSuffixList};
