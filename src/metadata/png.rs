//! PNG chunk walking and `tEXt` record editing.
//!
//! Records are spliced in as whole chunks directly before `IEND`; every other
//! byte of the container is copied through untouched, so the image payload
//! and any existing ancillary chunks survive byte-exact.
//!
//! Nothing here fails loudly. Bytes without the PNG signature read as "no
//! record" and are returned unchanged by writers; malformed text chunks are
//! skipped.

use crate::metadata::crc::chunk_crc;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// PNG file signature.
pub const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// Uncompressed Latin-1/UTF-8 text chunk type.
pub const TEXT_CHUNK: [u8; 4] = *b"tEXt";

/// Terminal chunk type.
pub const END_CHUNK: [u8; 4] = *b"IEND";

/// Length, type and CRC fields around each chunk's data.
const CHUNK_OVERHEAD: usize = 12;

/// One chunk borrowed from a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk<'a> {
    /// Byte offset of the length field.
    pub offset: usize,
    /// Four-byte chunk type.
    pub kind: [u8; 4],
    /// Chunk payload.
    pub data: &'a [u8],
    /// Stored CRC.
    pub crc: u32,
}

impl<'a> Chunk<'a> {
    /// Chunk type as text.
    pub fn kind_str(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.kind)
    }

    /// Size on disk including length, type and CRC fields.
    pub fn total_len(&self) -> usize {
        self.data.len() + CHUNK_OVERHEAD
    }

    /// True for `IEND`.
    pub fn is_terminal(&self) -> bool {
        self.kind == END_CHUNK
    }

    /// Recompute the CRC and compare with the stored one.
    pub fn crc_matches(&self) -> bool {
        chunk_crc(&self.kind, self.data) == self.crc
    }
}

/// Sequential chunk iterator. Ends after `IEND` or at the first chunk that
/// would run past the end of the buffer.
#[derive(Debug, Clone)]
pub struct Chunks<'a> {
    bytes: &'a [u8],
    pos: usize,
    done: bool,
}

impl<'a> Iterator for Chunks<'a> {
    type Item = Chunk<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let pos = self.pos;
        let Some(header) = self.bytes.get(pos..pos + 8) else {
            self.done = true;
            return None;
        };
        let len = u32::from_be_bytes([header[0], header[1], header[2], header[3]]) as usize;
        let kind = [header[4], header[5], header[6], header[7]];

        let end = match pos.checked_add(CHUNK_OVERHEAD).and_then(|p| p.checked_add(len)) {
            Some(end) if end <= self.bytes.len() => end,
            _ => {
                log::debug!(
                    "chunk {} at offset {} overruns container ({} bytes declared)",
                    String::from_utf8_lossy(&kind),
                    pos,
                    len
                );
                self.done = true;
                return None;
            }
        };

        let data = &self.bytes[pos + 8..pos + 8 + len];
        let crc_bytes = &self.bytes[end - 4..end];
        let crc = u32::from_be_bytes([crc_bytes[0], crc_bytes[1], crc_bytes[2], crc_bytes[3]]);

        self.pos = end;
        if kind == END_CHUNK {
            self.done = true;
        }
        Some(Chunk {
            offset: pos,
            kind,
            data,
            crc,
        })
    }
}

/// True if `container` starts with the PNG signature.
pub fn has_signature(container: &[u8]) -> bool {
    container.starts_with(&PNG_SIGNATURE)
}

/// Iterate the chunks of a PNG container, or `None` if the signature is missing.
pub fn chunks(container: &[u8]) -> Option<Chunks<'_>> {
    has_signature(container).then_some(Chunks {
        bytes: container,
        pos: PNG_SIGNATURE.len(),
        done: false,
    })
}

/// Offset of the `IEND` chunk, if the walk reaches it.
pub fn terminal_offset(container: &[u8]) -> Option<usize> {
    chunks(container)?.find(Chunk::is_terminal).map(|c| c.offset)
}

/// A key/value pair stored in a `tEXt` chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextRecord {
    /// Keyword.
    pub key: String,
    /// Text.
    pub value: String,
}

impl TextRecord {
    /// Parse `key \0 value`. `None` for a missing separator, an empty key, or non-UTF-8 text.
    pub fn parse(data: &[u8]) -> Option<Self> {
        let nul = data.iter().position(|&b| b == 0)?;
        if nul == 0 {
            return None;
        }
        let key = std::str::from_utf8(&data[..nul]).ok()?;
        let value = std::str::from_utf8(&data[nul + 1..]).ok()?;
        Some(Self {
            key: key.to_string(),
            value: value.to_string(),
        })
    }
}

/// All well-formed text records in stream order.
pub fn read_text_records(container: &[u8]) -> Vec<TextRecord> {
    let Some(chunks) = chunks(container) else {
        return Vec::new();
    };
    chunks
        .filter(|c| c.kind == TEXT_CHUNK)
        .filter_map(|c| {
            let record = TextRecord::parse(c.data);
            if record.is_none() {
                log::debug!("skipping malformed tEXt chunk at offset {}", c.offset);
            }
            record
        })
        .collect()
}

/// Value of the record named `key`.
///
/// When the key occurs more than once the last occurrence wins, matching the
/// append-before-`IEND` order in which [`write_text_record`] stores records.
pub fn read_text_record(container: &[u8], key: &str) -> Option<String> {
    read_text_records(container)
        .into_iter()
        .filter(|r| r.key == key)
        .last()
        .map(|r| r.value)
}

/// Encode a complete chunk: length, type, data, CRC.
pub fn encode_chunk(kind: &[u8; 4], data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() + CHUNK_OVERHEAD);
    out.extend_from_slice(&(data.len() as u32).to_be_bytes());
    out.extend_from_slice(kind);
    out.extend_from_slice(data);
    out.extend_from_slice(&chunk_crc(kind, data).to_be_bytes());
    out
}

/// Encode a `tEXt` chunk holding `key \0 value`.
pub fn encode_text_chunk(key: &str, value: &str) -> Vec<u8> {
    let mut data = Vec::with_capacity(key.len() + 1 + value.len());
    data.extend_from_slice(key.as_bytes());
    data.push(0);
    data.extend_from_slice(value.as_bytes());
    encode_chunk(&TEXT_CHUNK, &data)
}

/// Return a copy of `container` with a `key`/`value` record inserted before `IEND`.
///
/// The input comes back unchanged if it is not a PNG, has no reachable `IEND`,
/// or the key is empty or contains NUL. Existing records with the same key
/// are left in place.
pub fn write_text_record(container: &[u8], key: &str, value: &str) -> Vec<u8> {
    if key.is_empty() || key.contains('\0') {
        log::warn!("refusing to write text record with invalid key {:?}", key);
        return container.to_vec();
    }
    if u32::try_from(key.len() + 1 + value.len()).is_err() {
        log::warn!("text record '{}' is too large for a chunk", key);
        return container.to_vec();
    }
    let Some(iend) = terminal_offset(container) else {
        log::debug!("no PNG terminal chunk found; container left unchanged");
        return container.to_vec();
    };

    let chunk = encode_text_chunk(key, value);
    let mut out = Vec::with_capacity(container.len() + chunk.len());
    out.extend_from_slice(&container[..iend]);
    out.extend_from_slice(&chunk);
    out.extend_from_slice(&container[iend..]);
    out
}

/// Write several records, one chunk per pair, in order.
pub fn write_text_records<'a, I>(container: &[u8], records: I) -> Vec<u8>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    records
        .into_iter()
        .fold(container.to_vec(), |acc, (key, value)| write_text_record(&acc, key, value))
}

/// Summary of one chunk for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChunkInfo {
    /// Byte offset of the length field.
    pub offset: usize,
    /// Chunk type.
    pub kind: String,
    /// Payload length.
    pub length: usize,
    /// Whether the stored CRC matches.
    pub crc_ok: bool,
}

/// Structural report on a container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContainerReport {
    /// Chunks in stream order.
    pub chunks: Vec<ChunkInfo>,
    /// Whether the walk reached `IEND`.
    pub terminated: bool,
    /// Bytes after the last chunk walked.
    pub trailing_bytes: usize,
}

impl ContainerReport {
    /// Count chunks whose CRC does not match.
    pub fn bad_crc_count(&self) -> usize {
        self.chunks.iter().filter(|c| !c.crc_ok).count()
    }
}

/// Walk a container and describe its chunks. `None` if the signature is missing.
pub fn inspect(container: &[u8]) -> Option<ContainerReport> {
    let mut end = PNG_SIGNATURE.len();
    let mut terminated = false;
    let chunks = chunks(container)?
        .map(|c| {
            end = c.offset + c.total_len();
            terminated |= c.is_terminal();
            ChunkInfo {
                offset: c.offset,
                kind: c.kind_str().into_owned(),
                length: c.data.len(),
                crc_ok: c.crc_matches(),
            }
        })
        .collect();
    Some(ContainerReport {
        chunks,
        terminated,
        trailing_bytes: container.len() - end,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn minimal_png() -> Vec<u8> {
        let mut ihdr = Vec::new();
        ihdr.extend_from_slice(&1u32.to_be_bytes());
        ihdr.extend_from_slice(&1u32.to_be_bytes());
        ihdr.extend_from_slice(&[8, 6, 0, 0, 0]);

        let mut png = PNG_SIGNATURE.to_vec();
        png.extend(encode_chunk(b"IHDR", &ihdr));
        png.extend(encode_chunk(b"IDAT", &[0x78, 0x01, 0x01, 0x00, 0x00]));
        png.extend(encode_chunk(&END_CHUNK, &[]));
        png
    }

    fn kinds(container: &[u8]) -> Vec<[u8; 4]> {
        chunks(container).unwrap().map(|c| c.kind).collect()
    }

    #[test]
    fn test_round_trip() {
        let png = minimal_png();
        let stamped = write_text_record(&png, "SoftSin-Depth", "{\"bias\":0.25}");
        assert_eq!(
            read_text_record(&stamped, "SoftSin-Depth").as_deref(),
            Some("{\"bias\":0.25}")
        );
        assert_eq!(read_text_record(&stamped, "Other"), None);
    }

    #[test]
    fn test_insert_adds_one_chunk_before_iend() {
        let png = minimal_png();
        let stamped = write_text_record(&png, "X", "{\"a\":1}");

        let before = kinds(&png);
        let after = kinds(&stamped);
        assert_eq!(after.len(), before.len() + 1);
        assert_eq!(*after.last().unwrap(), END_CHUNK);
        assert_eq!(after[after.len() - 2], TEXT_CHUNK);
    }

    #[test]
    fn test_other_chunks_survive_byte_exact() {
        let png = minimal_png();
        let iend = terminal_offset(&png).unwrap();
        let stamped = write_text_record(&png, "key", "value");

        assert_eq!(&stamped[..iend], &png[..iend]);
        assert_eq!(&stamped[stamped.len() - 12..], &png[iend..]);
        assert!(inspect(&stamped).unwrap().chunks.iter().all(|c| c.crc_ok));
    }

    #[test]
    fn test_plain_text_passes_through() {
        let blob = b"just some plain text, definitely not a PNG".to_vec();
        assert_eq!(write_text_record(&blob, "X", "{\"a\":1}"), blob);
        assert_eq!(read_text_record(&blob, "X"), None);
        assert!(inspect(&blob).is_none());
    }

    #[test]
    fn test_missing_iend_passes_through() {
        let mut png = minimal_png();
        png.truncate(png.len() - 12);
        assert_eq!(write_text_record(&png, "X", "1"), png);
    }

    #[test]
    fn test_truncated_chunk_stops_walk() {
        let mut png = minimal_png();
        let iend = terminal_offset(&png).unwrap();
        png.truncate(iend);
        png.extend_from_slice(&1000u32.to_be_bytes());
        png.extend_from_slice(b"tEXtshort");
        assert!(terminal_offset(&png).is_none());
        assert!(read_text_records(&png).is_empty());
    }

    #[test]
    fn test_malformed_records_are_skipped() {
        let png = minimal_png();
        let iend = terminal_offset(&png).unwrap();
        let mut bad = png[..iend].to_vec();
        bad.extend(encode_chunk(&TEXT_CHUNK, b"no separator here"));
        bad.extend(encode_chunk(&TEXT_CHUNK, b"\0empty key"));
        bad.extend(encode_chunk(&TEXT_CHUNK, &[b'k', 0, 0xFF, 0xFE]));
        bad.extend(encode_text_chunk("good", "yes"));
        bad.extend_from_slice(&png[iend..]);

        let records = read_text_records(&bad);
        assert_eq!(records.len(), 1);
        assert_eq!(read_text_record(&bad, "good").as_deref(), Some("yes"));
    }

    #[test]
    fn test_records_after_iend_are_ignored() {
        let mut png = minimal_png();
        png.extend(encode_text_chunk("late", "ignored"));
        assert_eq!(read_text_record(&png, "late"), None);
        assert_eq!(inspect(&png).unwrap().trailing_bytes, 12 + "late\0ignored".len());
    }

    #[test]
    fn test_duplicate_keys_last_write_wins() {
        let png = minimal_png();
        let stamped = write_text_records(&png, [("k", "first"), ("k", "second")]);
        assert_eq!(read_text_records(&stamped).len(), 2);
        assert_eq!(read_text_record(&stamped, "k").as_deref(), Some("second"));
    }

    #[test]
    fn test_invalid_keys_leave_container_unchanged() {
        let png = minimal_png();
        assert_eq!(write_text_record(&png, "", "v"), png);
        assert_eq!(write_text_record(&png, "a\0b", "v"), png);
    }

    #[test]
    fn test_input_is_not_mutated() {
        let png = minimal_png();
        let copy = png.clone();
        let _ = write_text_record(&png, "k", "v");
        assert_eq!(png, copy);
    }

    #[test]
    fn test_inspect_flags_bad_crc() {
        let mut png = minimal_png();
        // Flip a byte inside IHDR's data.
        png[16] ^= 0xFF;
        let report = inspect(&png).unwrap();
        assert!(report.terminated);
        assert_eq!(report.bad_crc_count(), 1);
        assert_eq!(report.chunks[0].kind, "IHDR");
    }

    proptest! {
        #[test]
        fn prop_round_trip(key in "[A-Za-z][A-Za-z0-9 _-]{0,40}", value in "\\PC{0,200}") {
            let stamped = write_text_record(&minimal_png(), &key, &value);
            prop_assert_eq!(read_text_record(&stamped, &key), Some(value));
        }

        #[test]
        fn prop_non_png_is_untouched(blob in proptest::collection::vec(any::<u8>(), 0..128)) {
            prop_assume!(!has_signature(&blob));
            prop_assert_eq!(write_text_record(&blob, "k", "v"), blob.clone());
            prop_assert_eq!(read_text_record(&blob, "k"), None);
        }
    }
}
