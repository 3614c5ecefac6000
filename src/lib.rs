//! etn-r - Effective top-level domain lookup and IDNA conversion for Rust
//!
//! This library provides:
//! - Public suffix (eTLD) lookup over a compiled, bit-packed rule trie
//! - Registrable domain (eTLD+1) extraction
//! - ICANN / private / unmanaged classification of suffixes
//! - Punycode (RFC 3492) encoding and decoding with checked arithmetic
//! - Label-wise IDNA ToASCII / ToUnicode conversion
//!
//! # Example
//!
//! ```no_run
//! use etn_r::{to_ascii, PublicSuffixList};
//!
//! let psl = PublicSuffixList::open("public_suffix_compiled.dat").unwrap();
//!
//! let domain = to_ascii("www.Books.Amazon.co.uk").unwrap();
//! let ps = psl.public_suffix(&domain);
//! assert_eq!(ps.suffix, "co.uk");
//! assert!(ps.icann);
//! assert_eq!(psl.etld_plus_one(&domain), "amazon.co.uk");
//! ```
//!
//! # Rule File
//!
//! The compiled rule file is a big-endian sequence of `u32` words:
//!
//! ```text
//! magic, 8 bit widths, 3 node-type values, num_TLD
//! text_len, text bytes
//! nodes_len, node words
//! children_len, child words
//! ```
//!
//! Lookups expect lowercase ASCII names; convert internationalized names
//! with [`to_ascii`] first.

pub mod error;
pub mod idna;
pub mod suffix;

// Re-export commonly used items
pub use error::{EtnError, FormatErrorKind, Result};
pub use idna::{to_ascii, to_unicode, IdnaOptions};
pub use suffix::{
    DomainInfo, Manager, PublicSuffix, PublicSuffixList, RuleFileLoader, DEFAULT_RULE_FILE,
    MAX_DOMAIN_LEN,
};
