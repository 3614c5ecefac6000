use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};

use crate::error::{EtnError, FormatErrorKind, Result};

use super::format::{Child, Header, Node, DEFAULT_RULE_FILE, HEADER_FIELDS, MAGIC};
use super::trie::{PublicSuffixList, SuffixTrie};

/// Upper bound on the up-front allocation for one section; larger sections
/// grow as their bytes arrive
const INITIAL_RESERVE: usize = 64 * 1024;

/// Locates and loads a compiled rule file
#[derive(Debug, Clone, Default)]
pub struct RuleFileLoader {
    path: Option<PathBuf>,
    data_dir: Option<PathBuf>,
}

impl RuleFileLoader {
    /// Create a loader that reads `public_suffix_compiled.dat` from the
    /// working directory unless told otherwise
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the rule file path (takes precedence over the data directory)
    pub fn with_path(mut self, path: impl AsRef<Path>) -> Self {
        self.path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Set the directory holding `public_suffix_compiled.dat`
    pub fn with_data_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.data_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Path the loader will read
    pub fn rule_file_path(&self) -> PathBuf {
        if let Some(ref path) = self.path {
            return path.clone();
        }
        match self.data_dir {
            Some(ref dir) => dir.join(DEFAULT_RULE_FILE),
            None => PathBuf::from(DEFAULT_RULE_FILE),
        }
    }

    /// Read and validate the rule file
    pub fn load(&self) -> Result<PublicSuffixList> {
        PublicSuffixList::open(self.rule_file_path())
    }
}

impl PublicSuffixList {
    /// Load a compiled rule file.
    ///
    /// Either the whole file is accepted or an error is returned; a partially
    /// read rule set is never observable.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let result = File::open(path)
            .map_err(EtnError::from)
            .and_then(|file| Self::from_reader(BufReader::new(file)));

        match result {
            Ok(list) => {
                tracing::debug!(
                    path = %path.display(),
                    num_tld = list.num_tld(),
                    nodes = list.node_count(),
                    children = list.children_count(),
                    text_len = list.text_len(),
                    "loaded public suffix rules"
                );
                Ok(list)
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "rejected public suffix rules");
                Err(e)
            }
        }
    }

    /// Load a compiled rule set from an in-memory image
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::from_reader(data)
    }

    /// Load a compiled rule set from any byte stream
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self> {
        let trie = read_rule_set(&mut reader)?;
        Ok(Self::from_trie(trie))
    }
}

fn read_rule_set<R: Read>(reader: &mut R) -> Result<SuffixTrie> {
    let header = read_header(reader)?;
    check_header(&header)?;

    let text_length = read_section_length(reader, "label text")?;
    let text = read_bytes(reader, text_length, "label text")?;

    let nodes_length = read_section_length(reader, "node table")?;
    let nodes = read_words(reader, nodes_length, "node table")?
        .into_iter()
        .map(Node)
        .collect();

    let children_length = read_section_length(reader, "children table")?;
    let children = read_words(reader, children_length, "children table")?
        .into_iter()
        .map(Child)
        .collect();

    SuffixTrie::new(header.num_tld as usize, text, nodes, children)
}

fn read_header<R: Read>(reader: &mut R) -> Result<Header> {
    let mut buf = [0u8; HEADER_FIELDS * 4];
    let n = read_full(reader, &mut buf)?;
    if n != buf.len() {
        return Err(EtnError::Truncated {
            section: "header",
            expected: buf.len(),
            actual: n,
        });
    }

    let mut words = [0u32; HEADER_FIELDS];
    for (word, chunk) in words.iter_mut().zip(buf.chunks_exact(4)) {
        *word = u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
    }
    Ok(Header::from_words(words))
}

fn check_header(header: &Header) -> Result<()> {
    if header.magic != MAGIC {
        return Err(EtnError::format(
            FormatErrorKind::BadMagic,
            format!("magic 0x{:08X}, expected 0x{:08X}", header.magic, MAGIC),
        ));
    }
    if header.node_bits() > 32 {
        return Err(EtnError::format(
            FormatErrorKind::LayoutMismatch,
            format!("node fields need {} bits", header.node_bits()),
        ));
    }
    if header.child_bits() > 32 {
        return Err(EtnError::format(
            FormatErrorKind::LayoutMismatch,
            format!("children fields need {} bits", header.child_bits()),
        ));
    }
    if let Some((field, found, expected)) = header.layout_mismatch() {
        return Err(EtnError::format(
            FormatErrorKind::LayoutMismatch,
            format!("{} = {}, expected {}", field, found, expected),
        ));
    }
    Ok(())
}

fn read_section_length<R: Read>(reader: &mut R, section: &'static str) -> Result<usize> {
    let mut buf = [0u8; 4];
    let n = read_full(reader, &mut buf)?;
    if n != buf.len() {
        return Err(EtnError::Truncated {
            section,
            expected: buf.len(),
            actual: n,
        });
    }

    let length = u32::from_be_bytes(buf);
    if length == 0 {
        return Err(EtnError::format(
            FormatErrorKind::EmptySection,
            format!("{} length is zero", section),
        ));
    }
    Ok(length as usize)
}

fn read_bytes<R: Read>(reader: &mut R, len: usize, section: &'static str) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len.min(INITIAL_RESERVE))
        .map_err(|_| EtnError::OutOfMemory(section))?;

    let n = (&mut *reader).take(len as u64).read_to_end(&mut buf)?;
    if n != len {
        return Err(EtnError::Truncated {
            section,
            expected: len,
            actual: n,
        });
    }
    Ok(buf)
}

fn read_words<R: Read>(reader: &mut R, count: usize, section: &'static str) -> Result<Vec<u32>> {
    let byte_len = count
        .checked_mul(4)
        .ok_or(EtnError::OutOfMemory(section))?;
    let bytes = read_bytes(reader, byte_len, section)?;

    let mut words = Vec::new();
    words
        .try_reserve_exact(count)
        .map_err(|_| EtnError::OutOfMemory(section))?;
    words.extend(
        bytes
            .chunks_exact(4)
            .map(|c| u32::from_be_bytes([c[0], c[1], c[2], c[3]])),
    );
    Ok(words)
}

/// Read until `buf` is full or the stream ends, returning the bytes read
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::suffix::format::NODE_TYPE_NORMAL;

    fn header_bytes(header: &Header) -> Vec<u8> {
        header
            .to_words()
            .iter()
            .flat_map(|w| w.to_be_bytes())
            .collect()
    }

    /// Single rule `com`
    fn minimal_image() -> Vec<u8> {
        let mut out = header_bytes(&Header::expected(1));
        out.extend(3u32.to_be_bytes());
        out.extend(b"com");
        out.extend(1u32.to_be_bytes());
        out.extend((3u32 | (1 << 21)).to_be_bytes());
        out.extend(1u32.to_be_bytes());
        out.extend((NODE_TYPE_NORMAL << 28).to_be_bytes());
        out
    }

    #[test]
    fn test_load_minimal_image() {
        let list = PublicSuffixList::from_bytes(&minimal_image()).unwrap();
        assert_eq!(list.num_tld(), 1);
        assert_eq!(list.node_count(), 1);
        assert_eq!(list.children_count(), 1);
        assert_eq!(list.text_len(), 3);

        let ps = list.public_suffix("example.com");
        assert_eq!(ps.suffix, "com");
        assert!(ps.icann);
        assert_eq!(list.etld_plus_one("www.example.com"), "example.com");
    }

    #[test]
    fn test_bad_magic() {
        let mut image = minimal_image();
        image[0] = 0;
        let err = PublicSuffixList::from_bytes(&image).unwrap_err();
        assert!(matches!(
            err,
            EtnError::Format {
                kind: FormatErrorKind::BadMagic,
                ..
            }
        ));
    }

    #[test]
    fn test_layout_mismatch() {
        let mut header = Header::expected(1);
        header.nodes_bits_text_offset = 14;
        let mut image = header_bytes(&header);
        image.extend_from_slice(&minimal_image()[HEADER_FIELDS * 4..]);
        let err = PublicSuffixList::from_bytes(&image).unwrap_err();
        assert!(matches!(
            err,
            EtnError::Format {
                kind: FormatErrorKind::LayoutMismatch,
                ..
            }
        ));
        assert!(err.to_string().contains("nodes_bits_text_offset"));
    }

    #[test]
    fn test_width_sum_over_32() {
        let mut header = Header::expected(1);
        header.nodes_bits_children = 20;
        let err = PublicSuffixList::from_bytes(&header_bytes(&header)).unwrap_err();
        assert!(err.to_string().contains("node fields need 42 bits"), "got: {}", err);
    }

    #[test]
    fn test_node_type_values_checked() {
        let mut header = Header::expected(1);
        header.node_type_parent_only = 3;
        let err = PublicSuffixList::from_bytes(&header_bytes(&header)).unwrap_err();
        assert!(err.to_string().contains("node_type_parent_only"));
    }

    #[test]
    fn test_truncated_header() {
        let image = minimal_image();
        let err = PublicSuffixList::from_bytes(&image[..20]).unwrap_err();
        match err {
            EtnError::Truncated {
                section,
                expected,
                actual,
            } => {
                assert_eq!(section, "header");
                assert_eq!(expected, 52);
                assert_eq!(actual, 20);
            }
            other => panic!("expected Truncated, got {:?}", other),
        }
    }

    #[test]
    fn test_truncated_text() {
        let image = minimal_image();
        let err = PublicSuffixList::from_bytes(&image[..HEADER_FIELDS * 4 + 5]).unwrap_err();
        assert!(matches!(
            err,
            EtnError::Truncated {
                section: "label text",
                expected: 3,
                actual: 1
            }
        ));
    }

    #[test]
    fn test_truncated_children() {
        let image = minimal_image();
        let err = PublicSuffixList::from_bytes(&image[..image.len() - 2]).unwrap_err();
        assert!(matches!(
            err,
            EtnError::Truncated {
                section: "children table",
                ..
            }
        ));
    }

    #[test]
    fn test_declared_length_beyond_data_is_truncated() {
        let mut image = header_bytes(&Header::expected(1));
        image.extend(3u32.to_be_bytes());
        image.extend(b"com");
        image.extend(0xFFFF_FFFFu32.to_be_bytes());
        image.extend([0u8; 4]);
        let err = PublicSuffixList::from_bytes(&image).unwrap_err();
        assert!(
            matches!(
                err,
                EtnError::Truncated {
                    section: "node table",
                    actual: 4,
                    ..
                }
            ),
            "got: {:?}",
            err
        );
    }

    #[test]
    fn test_zero_length_text() {
        let mut image = header_bytes(&Header::expected(1));
        image.extend(0u32.to_be_bytes());
        let err = PublicSuffixList::from_bytes(&image).unwrap_err();
        assert!(matches!(
            err,
            EtnError::Format {
                kind: FormatErrorKind::EmptySection,
                ..
            }
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = PublicSuffixList::open("/nonexistent/public_suffix_compiled.dat").unwrap_err();
        assert!(matches!(err, EtnError::Io(_)));
    }

    #[test]
    fn test_loader_path_resolution() {
        assert_eq!(
            RuleFileLoader::new().rule_file_path(),
            PathBuf::from(DEFAULT_RULE_FILE)
        );
        assert_eq!(
            RuleFileLoader::new()
                .with_data_dir("/var/lib/etn")
                .rule_file_path(),
            PathBuf::from("/var/lib/etn").join(DEFAULT_RULE_FILE)
        );
        assert_eq!(
            RuleFileLoader::new()
                .with_data_dir("/var/lib/etn")
                .with_path("/tmp/rules.dat")
                .rule_file_path(),
            PathBuf::from("/tmp/rules.dat")
        );
    }

    #[test]
    fn test_loader_reads_file() {
        let dir = std::env::temp_dir().join("etn_loader_test");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(DEFAULT_RULE_FILE), minimal_image()).unwrap();

        let list = RuleFileLoader::new().with_data_dir(&dir).load().unwrap();
        assert_eq!(list.public_suffix("a.com").suffix, "com");

        let _ = std::fs::remove_dir_all(&dir);
    }
}
