//! Per-buffer Huffman coding.
//!
//! A fresh [`CodeTable`] is derived from each buffer's byte histogram, so the
//! table must travel with the compressed bits; nothing is cached between calls.

use crate::error::{PerzipError, Result};
use crate::pipeline::bits::BitString;
use rayon::prelude::*;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BinaryHeap, HashMap};

/// Byte value to occurrence count
pub type FrequencyMap = BTreeMap<u8, u64>;

/// Count byte occurrences, splitting the scan across the rayon pool
pub fn byte_frequencies(data: &[u8]) -> FrequencyMap {
    let counts = data
        .par_chunks(partition_size(data.len()))
        .fold(
            || [0u64; 256],
            |mut acc, chunk| {
                for &b in chunk {
                    acc[b as usize] += 1;
                }
                acc
            },
        )
        .reduce(
            || [0u64; 256],
            |mut a, b| {
                for (x, y) in a.iter_mut().zip(b.iter()) {
                    *x += y;
                }
                a
            },
        );

    counts
        .iter()
        .enumerate()
        .filter(|(_, count)| **count > 0)
        .map(|(byte, count)| (byte as u8, *count))
        .collect()
}

/// Static partition size: one contiguous slice per worker thread
fn partition_size(len: usize) -> usize {
    let workers = rayon::current_num_threads().max(1);
    len.div_ceil(workers).max(1)
}

#[derive(Debug)]
enum Node {
    Leaf(u8),
    Internal(Box<Node>, Box<Node>),
}

/// Node waiting in the merge queue. Lower weight pops first; equal weights
/// pop in insertion order so table construction is deterministic.
struct Pending {
    weight: u64,
    order: usize,
    node: Node,
}

impl PartialEq for Pending {
    fn eq(&self, other: &Self) -> bool {
        self.weight == other.weight && self.order == other.order
    }
}

impl Eq for Pending {}

impl PartialOrd for Pending {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Pending {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap; invert so the lightest node is on top
        other
            .weight
            .cmp(&self.weight)
            .then_with(|| other.order.cmp(&self.order))
    }
}

/// Huffman tree over the distinct bytes of one buffer.
///
/// Lives only long enough to produce a [`CodeTable`]; children are owned
/// boxes, so dropping the tree frees every node.
#[derive(Debug)]
pub struct HuffmanTree {
    root: Node,
}

impl HuffmanTree {
    pub fn build(frequencies: &FrequencyMap) -> Result<Self> {
        let mut queue: BinaryHeap<Pending> = frequencies
            .iter()
            .enumerate()
            .map(|(order, (&byte, &weight))| Pending {
                weight,
                order,
                node: Node::Leaf(byte),
            })
            .collect();
        let mut next_order = queue.len();

        while queue.len() > 1 {
            let (Some(left), Some(right)) = (queue.pop(), queue.pop()) else {
                break;
            };
            queue.push(Pending {
                weight: left.weight + right.weight,
                order: next_order,
                node: Node::Internal(Box::new(left.node), Box::new(right.node)),
            });
            next_order += 1;
        }

        queue
            .pop()
            .map(|p| HuffmanTree { root: p.node })
            .ok_or(PerzipError::EmptyInput)
    }

    /// Walk the tree assigning `0` to left edges and `1` to right edges.
    ///
    /// A tree with a single leaf has no edges; that byte gets the code `"0"`.
    pub fn code_table(&self) -> CodeTable {
        let codes = match &self.root {
            Node::Leaf(byte) => vec![(*byte, "0".to_string())],
            root => collect_codes(root, String::new()),
        };
        CodeTable {
            codes: codes.into_iter().collect(),
        }
    }
}

/// Subtrees are walked as independent fork-join tasks, each returning its
/// own codes; results are merged once both halves finish.
fn collect_codes(node: &Node, prefix: String) -> Vec<(u8, String)> {
    match node {
        Node::Leaf(byte) => vec![(*byte, prefix)],
        Node::Internal(left, right) => {
            let left_prefix = format!("{}0", prefix);
            let right_prefix = format!("{}1", prefix);
            let (mut codes, right_codes) = rayon::join(
                || collect_codes(left, left_prefix),
                || collect_codes(right, right_prefix),
            );
            codes.extend(right_codes);
            codes
        }
    }
}

/// Bijective byte <-> prefix-free code mapping for one payload
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodeTable {
    codes: BTreeMap<u8, String>,
}

impl CodeTable {
    /// Build a table from stored `(byte, code)` pairs.
    ///
    /// Codes must be non-empty strings of `'0'`/`'1'`, and neither bytes nor
    /// codes may repeat.
    pub fn from_entries<I>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (u8, String)>,
    {
        let mut codes = BTreeMap::new();
        let mut seen = HashMap::new();
        for (byte, code) in entries {
            if code.is_empty() || !code.chars().all(|c| c == '0' || c == '1') {
                return Err(PerzipError::InvalidFormat(format!(
                    "invalid code {:?} for byte {}",
                    code, byte
                )));
            }
            if let Some(other) = seen.insert(code.clone(), byte) {
                return Err(PerzipError::InvalidFormat(format!(
                    "code {:?} assigned to both {} and {}",
                    code, other, byte
                )));
            }
            if codes.insert(byte, code).is_some() {
                return Err(PerzipError::InvalidFormat(format!(
                    "byte {} appears twice in code table",
                    byte
                )));
            }
        }
        Ok(Self { codes })
    }

    pub fn code(&self, byte: u8) -> Option<&str> {
        self.codes.get(&byte).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u8, &str)> {
        self.codes.iter().map(|(b, c)| (*b, c.as_str()))
    }

    pub fn max_code_len(&self) -> usize {
        self.codes.values().map(String::len).max().unwrap_or(0)
    }

    /// Code to byte lookup used while decoding
    pub fn reverse(&self) -> HashMap<&str, u8> {
        self.codes.iter().map(|(b, c)| (c.as_str(), *b)).collect()
    }

    /// True if no code is a proper prefix of another
    pub fn is_prefix_free(&self) -> bool {
        let mut sorted: Vec<&str> = self.codes.values().map(String::as_str).collect();
        sorted.sort_unstable();
        // In lexicographic order a prefix sorts immediately before some
        // string it prefixes, so checking neighbours is enough
        sorted.windows(2).all(|w| !w[1].starts_with(w[0]))
    }
}

/// Bits plus the table needed to decode them
#[derive(Debug, Clone)]
pub struct Compressed {
    pub bits: BitString,
    pub table: CodeTable,
}

pub fn build_code_table(frequencies: &FrequencyMap) -> Result<CodeTable> {
    Ok(HuffmanTree::build(frequencies)?.code_table())
}

/// Huffman-encode `data` with a table derived from its own histogram
pub fn compress_bytes(data: &[u8]) -> Result<Compressed> {
    if data.is_empty() {
        return Err(PerzipError::EmptyInput);
    }
    let table = build_code_table(&byte_frequencies(data))?;
    let bits = encode_bytes(data, &table)?;
    Ok(Compressed { bits, table })
}

/// Replace each byte with its code.
///
/// The input is split into one contiguous partition per worker; partial
/// outputs are concatenated in partition order.
pub fn encode_bytes(data: &[u8], table: &CodeTable) -> Result<BitString> {
    let parts: Vec<BitString> = data
        .par_chunks(partition_size(data.len()))
        .map(|chunk| -> Result<BitString> {
            let mut bits = BitString::new();
            for &byte in chunk {
                let code = table.code(byte).ok_or_else(|| {
                    PerzipError::Codec(format!("byte {} has no code in table", byte))
                })?;
                bits.push_code(code)?;
            }
            Ok(bits)
        })
        .collect::<Result<_>>()?;

    let mut out = BitString::with_capacity(parts.iter().map(BitString::len).sum());
    for part in &parts {
        out.append(part);
    }
    Ok(out)
}

/// Decode `bits` with `table`, rejecting streams that stop mid-code or
/// contain a run of bits matching no code.
pub fn decompress_bytes(bits: &BitString, table: &CodeTable) -> Result<Vec<u8>> {
    if table.is_empty() {
        return Err(PerzipError::Codec("code table is empty".into()));
    }
    let reverse = table.reverse();
    let max_len = table.max_code_len();

    let mut out = Vec::new();
    let mut current = String::with_capacity(max_len);

    for (offset, bit) in bits.iter().enumerate() {
        current.push(if bit { '1' } else { '0' });
        if let Some(&byte) = reverse.get(current.as_str()) {
            out.push(byte);
            current.clear();
        } else if current.len() >= max_len {
            return Err(PerzipError::Codec(format!(
                "no code matches bits {} ending at offset {}",
                current, offset
            )));
        }
    }

    if !current.is_empty() {
        return Err(PerzipError::Codec(format!(
            "bit stream ends inside a code ({} dangling bits)",
            current.len()
        )));
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_aaabbc_roundtrip() {
        let data = b"AAABBC";
        let compressed = compress_bytes(data).unwrap();
        let restored = decompress_bytes(&compressed.bits, &compressed.table).unwrap();
        assert_eq!(restored, vec![65, 65, 65, 66, 66, 67]);
    }

    #[test]
    fn test_aaabbc_code_lengths() {
        let compressed = compress_bytes(b"AAABBC").unwrap();
        let table = &compressed.table;
        assert_eq!(table.len(), 3);
        assert_eq!(table.code(b'A').map(str::len), Some(1));
        assert_eq!(table.code(b'B').map(str::len), Some(2));
        assert_eq!(table.code(b'C').map(str::len), Some(2));
        // 3*1 + 2*2 + 1*2
        assert_eq!(compressed.bits.len(), 9);
    }

    #[test]
    fn test_frequencies() {
        let freqs = byte_frequencies(b"hello");
        assert_eq!(freqs.get(&b'l'), Some(&2));
        assert_eq!(freqs.get(&b'h'), Some(&1));
        assert_eq!(freqs.len(), 4);
        assert!(byte_frequencies(b"").is_empty());
    }

    #[test]
    fn test_single_symbol_gets_one_bit_code() {
        let compressed = compress_bytes(&[7u8; 10]).unwrap();
        assert_eq!(compressed.table.code(7), Some("0"));
        assert_eq!(compressed.bits.len(), 10);
        let restored = decompress_bytes(&compressed.bits, &compressed.table).unwrap();
        assert_eq!(restored, vec![7u8; 10]);
    }

    #[test]
    fn test_empty_input_rejected() {
        assert!(matches!(compress_bytes(b""), Err(PerzipError::EmptyInput)));
        assert!(matches!(
            build_code_table(&FrequencyMap::new()),
            Err(PerzipError::EmptyInput)
        ));
    }

    #[test]
    fn test_table_is_prefix_free() {
        let data: Vec<u8> = (0..5000u32).map(|i| ((i * i) % 97) as u8).collect();
        let compressed = compress_bytes(&data).unwrap();
        assert!(compressed.table.is_prefix_free());
    }

    #[test]
    fn test_prefix_check_detects_violation() {
        let table = CodeTable::from_entries(vec![(1, "0".into()), (2, "01".into())]).unwrap();
        assert!(!table.is_prefix_free());
    }

    #[test]
    fn test_deterministic_tables() {
        let data = b"the quick brown fox jumps over the lazy dog";
        let a = compress_bytes(data).unwrap();
        let b = compress_bytes(data).unwrap();
        assert_eq!(a.table, b.table);
        assert_eq!(a.bits, b.bits);
    }

    #[test]
    fn test_truncated_stream_rejected() {
        let compressed = compress_bytes(b"AAABBC").unwrap();
        let text = compressed.bits.to_string();
        let truncated: BitString = text[..text.len() - 1].parse().unwrap();
        let err = decompress_bytes(&truncated, &compressed.table).unwrap_err();
        assert!(matches!(err, PerzipError::Codec(_)));
    }

    #[test]
    fn test_unknown_code_rejected() {
        let table = CodeTable::from_entries(vec![(1, "00".into()), (2, "01".into())]).unwrap();
        let bits: BitString = "0011".parse().unwrap();
        assert!(matches!(decompress_bytes(&bits, &table), Err(PerzipError::Codec(_))));
    }

    #[test]
    fn test_external_table_decoding() {
        let table = CodeTable::from_entries(vec![
            (b'x', "0".into()),
            (b'y', "10".into()),
            (b'z', "11".into()),
        ])
        .unwrap();
        let bits: BitString = "0101100".parse().unwrap();
        assert_eq!(decompress_bytes(&bits, &table).unwrap(), b"xyzxx");
    }

    #[test]
    fn test_table_validation() {
        assert!(CodeTable::from_entries(vec![(1, "".into())]).is_err());
        assert!(CodeTable::from_entries(vec![(1, "02".into())]).is_err());
        assert!(CodeTable::from_entries(vec![(1, "0".into()), (2, "0".into())]).is_err());
        assert!(CodeTable::from_entries(vec![(1, "0".into()), (1, "1".into())]).is_err());
    }

    #[test]
    fn test_encode_missing_symbol() {
        let table = CodeTable::from_entries(vec![(1, "0".into())]).unwrap();
        assert!(matches!(encode_bytes(&[2], &table), Err(PerzipError::Codec(_))));
    }

    #[test]
    fn test_large_buffer_partition_order() {
        let data: Vec<u8> = (0..100_000u32).map(|i| (i % 251) as u8).collect();
        let compressed = compress_bytes(&data).unwrap();
        let restored = decompress_bytes(&compressed.bits, &compressed.table).unwrap();
        assert_eq!(restored, data);
    }

    proptest! {
        #[test]
        fn prop_roundtrip_with_own_table(data in proptest::collection::vec(any::<u8>(), 1..2048)) {
            let compressed = compress_bytes(&data).unwrap();
            prop_assert!(compressed.table.is_prefix_free());
            let restored = decompress_bytes(&compressed.bits, &compressed.table).unwrap();
            prop_assert_eq!(restored, data);
        }
    }
}
