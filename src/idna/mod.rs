//! IDNA conversion between Unicode domain names and their ASCII-Compatible
//! Encoding.
//!
//! Each `.`-separated label is handled on its own: pure ASCII labels are
//! lowercased and kept, anything else is punycoded behind the `xn--` prefix.
//!
//! ## Example
//!
//! ```
//! use etn_r::idna;
//!
//! assert_eq!(idna::to_ascii("中文字.com").unwrap(), "xn--fiqu43as1h.com");
//! assert_eq!(idna::to_unicode("xn--fiqu43as1h.com").unwrap(), "中文字.com");
//! ```

pub mod punycode;

use crate::error::{EtnError, Result};

/// Prefix marking an ASCII-Compatible Encoding label
pub const ACE_PREFIX: &str = "xn--";

/// Default per-label output capacity (bytes when encoding, code points when
/// decoding)
pub const DEFAULT_LABEL_CAPACITY: usize = 512;

/// IDNA conversion settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdnaOptions {
    label_capacity: usize,
}

impl Default for IdnaOptions {
    fn default() -> Self {
        Self {
            label_capacity: DEFAULT_LABEL_CAPACITY,
        }
    }
}

impl IdnaOptions {
    /// Create options with the default label capacity
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the per-label output capacity; longer labels fail with `NoBufs`
    pub fn with_label_capacity(mut self, capacity: usize) -> Self {
        self.label_capacity = capacity;
        self
    }

    /// Per-label output capacity: bytes for `to_ascii`, code points for `to_unicode`
    pub fn label_capacity(&self) -> usize {
        self.label_capacity
    }

    /// Convert a Unicode FQDN to its ASCII form
    pub fn to_ascii(&self, fqdn: &str) -> Result<String> {
        if fqdn.is_empty() {
            return Err(EtnError::invalid("empty domain name"));
        }

        let mut out = String::with_capacity(fqdn.len() * 2);
        for (i, label) in fqdn.split('.').enumerate() {
            if i > 0 {
                out.push('.');
            }

            if let Some(c) = label.chars().find(|&c| !is_graphic(c)) {
                return Err(EtnError::invalid(format!(
                    "non-graphic code point U+{:04X} in label {:?}",
                    u32::from(c),
                    label
                )));
            }

            if label.is_ascii() {
                out.extend(label.chars().map(|c| c.to_ascii_lowercase()));
                continue;
            }

            let code_points: Vec<u32> = label.chars().map(u32::from).collect();
            let encoded = punycode::encode_with_capacity(&code_points, self.label_capacity)?;
            out.push_str(ACE_PREFIX);
            out.extend(encoded.chars().map(|c| c.to_ascii_lowercase()));
        }

        Ok(out)
    }

    /// Convert raw bytes holding a UTF-8 FQDN to its ASCII form
    pub fn to_ascii_bytes(&self, fqdn: &[u8]) -> Result<String> {
        let fqdn = std::str::from_utf8(fqdn)
            .map_err(|e| EtnError::invalid(format!("malformed UTF-8: {}", e)))?;
        self.to_ascii(fqdn)
    }

    /// Convert an ASCII FQDN back to Unicode
    pub fn to_unicode(&self, ascii_fqdn: &str) -> Result<String> {
        if let Some(&b) = ascii_fqdn.as_bytes().iter().find(|b| !b.is_ascii_graphic()) {
            return Err(EtnError::invalid(format!(
                "byte 0x{:02X} is not printable ASCII",
                b
            )));
        }

        let mut out = String::with_capacity(ascii_fqdn.len() * 2);
        for (i, label) in ascii_fqdn.split('.').enumerate() {
            if i > 0 {
                out.push('.');
            }

            let Some(encoded) = label.strip_prefix(ACE_PREFIX) else {
                out.push_str(label);
                continue;
            };
            if encoded.is_empty() {
                return Err(EtnError::invalid(format!("empty ACE label {:?}", label)));
            }

            let code_points = punycode::decode_with_capacity(encoded, self.label_capacity)?;
            out.push_str(&punycode::code_points_to_string(&code_points)?);
        }

        Ok(out)
    }
}

/// Minimal graphic-character test: no controls, no whitespace
fn is_graphic(c: char) -> bool {
    !c.is_control() && !c.is_whitespace()
}

/// Convert a Unicode FQDN to ASCII with default options
pub fn to_ascii(fqdn: &str) -> Result<String> {
    IdnaOptions::default().to_ascii(fqdn)
}

/// Convert a UTF-8 byte FQDN to ASCII with default options
pub fn to_ascii_bytes(fqdn: &[u8]) -> Result<String> {
    IdnaOptions::default().to_ascii_bytes(fqdn)
}

/// Convert an ASCII FQDN to Unicode with default options
pub fn to_unicode(ascii_fqdn: &str) -> Result<String> {
    IdnaOptions::default().to_unicode(ascii_fqdn)
}
