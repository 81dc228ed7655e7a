//! Tag-length-value codec.
//!
//! All card payloads are flat TLV streams: one raw tag byte, a length, and
//! the value bytes. Lengths below `0xFF` are a single byte; longer values use
//! the `0xFF` marker followed by a big-endian `u16`.
//!
//! Encoding preserves append order and never deduplicates tags. Decoding
//! keeps unknown tags so that newer card firmware stays readable; typed
//! lookups return the first occurrence of a tag.

mod tag;

pub use tag::{TlvTag, ValueKind};

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::Error;

/// Length value at which the two-byte length form kicks in.
const LONG_FORM_MARKER: u8 = 0xFF;

/// One decoded tag-length-value unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlvEntry {
    /// Raw tag byte. May be outside the [`TlvTag`] registry.
    pub tag: u8,
    /// Value bytes, exactly as received.
    pub value: Bytes,
}

/// Append-only TLV encoder.
///
/// The writer emits entries in the order of `write` calls; callers that need
/// a particular tag order simply call in that order.
#[derive(Debug, Default)]
pub struct TlvWriter {
    buf: BytesMut,
}

impl TlvWriter {
    /// Create an empty writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one entry with raw value bytes.
    ///
    /// The two-byte length form caps values at `u16::MAX` bytes; the
    /// protocol never produces values anywhere near that.
    pub fn write(&mut self, tag: TlvTag, value: &[u8]) -> &mut Self {
        debug_assert!(
            value.len() <= u16::MAX as usize,
            "TLV value of {} bytes exceeds the two-byte length form",
            value.len()
        );
        self.buf.put_u8(tag.raw());
        if value.len() < LONG_FORM_MARKER as usize {
            self.buf.put_u8(value.len() as u8);
        } else {
            self.buf.put_u8(LONG_FORM_MARKER);
            self.buf.put_u16(value.len() as u16);
        }
        self.buf.put_slice(value);
        self
    }

    /// Append a UTF-8 string entry.
    pub fn write_str(&mut self, tag: TlvTag, value: &str) -> &mut Self {
        self.write(tag, value.as_bytes())
    }

    /// Append a single-byte unsigned integer entry.
    pub fn write_u8(&mut self, tag: TlvTag, value: u8) -> &mut Self {
        self.write(tag, &[value])
    }

    /// Append a four-byte big-endian unsigned integer entry.
    pub fn write_u32(&mut self, tag: TlvTag, value: u32) -> &mut Self {
        self.write(tag, &value.to_be_bytes())
    }

    /// Finish encoding and take the serialized stream.
    pub fn finish(self) -> Bytes {
        self.buf.freeze()
    }

    /// Number of bytes written so far.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether nothing has been written yet.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}

/// Parse a complete TLV stream into its entries.
///
/// Fails with [`Error::TruncatedTlv`] when a declared length runs past the
/// end of the buffer.
pub fn parse(data: &[u8]) -> Result<Vec<TlvEntry>, Error> {
    let mut entries = Vec::new();
    let mut rest = data;

    while !rest.is_empty() {
        if rest.len() < 2 {
            return Err(Error::TruncatedTlv);
        }
        let tag = rest[0];
        let (len, header) = if rest[1] < LONG_FORM_MARKER {
            (rest[1] as usize, 2)
        } else {
            if rest.len() < 4 {
                return Err(Error::TruncatedTlv);
            }
            (u16::from_be_bytes([rest[2], rest[3]]) as usize, 4)
        };
        if rest.len() < header + len {
            return Err(Error::TruncatedTlv);
        }
        entries.push(TlvEntry {
            tag,
            value: Bytes::copy_from_slice(&rest[header..header + len]),
        });
        rest = &rest[header + len..];
    }

    Ok(entries)
}

/// Decoded TLV stream with typed, registry-checked accessors.
///
/// Required accessors fail with [`Error::MissingTag`] when the tag is absent;
/// the `*_optional` variants return `None` instead, but both fail with
/// [`Error::InvalidValue`] on a malformed value.
#[derive(Debug, Clone)]
pub struct TlvMap {
    entries: Vec<TlvEntry>,
}

impl TlvMap {
    /// Parse a serialized TLV stream.
    pub fn from_bytes(data: &[u8]) -> Result<Self, Error> {
        Ok(Self {
            entries: parse(data)?,
        })
    }

    /// All decoded entries, in wire order.
    pub fn entries(&self) -> &[TlvEntry] {
        &self.entries
    }

    /// First occurrence of `tag`, if any.
    pub fn first(&self, tag: TlvTag) -> Option<&TlvEntry> {
        self.entries.iter().find(|e| e.tag == tag.raw())
    }

    /// Whether the stream carries `tag` at least once.
    pub fn contains(&self, tag: TlvTag) -> bool {
        self.first(tag).is_some()
    }

    /// Raw value bytes of a required byte-string tag.
    pub fn bytes(&self, tag: TlvTag) -> Result<Bytes, Error> {
        self.bytes_optional(tag)?.ok_or(Error::MissingTag(tag))
    }

    /// Raw value bytes of an optional byte-string tag.
    pub fn bytes_optional(&self, tag: TlvTag) -> Result<Option<Bytes>, Error> {
        expect_kind(tag, ValueKind::Bytes)?;
        Ok(self.first(tag).map(|e| e.value.clone()))
    }

    /// Required byte-string tag rendered as an upper-case hex string.
    pub fn hex_string(&self, tag: TlvTag) -> Result<String, Error> {
        Ok(hex::encode_upper(self.bytes(tag)?))
    }

    /// Required UTF-8 string tag.
    pub fn str(&self, tag: TlvTag) -> Result<String, Error> {
        self.str_optional(tag)?.ok_or(Error::MissingTag(tag))
    }

    /// Optional UTF-8 string tag.
    pub fn str_optional(&self, tag: TlvTag) -> Result<Option<String>, Error> {
        expect_kind(tag, ValueKind::Utf8)?;
        match self.first(tag) {
            None => Ok(None),
            Some(entry) => std::str::from_utf8(&entry.value)
                .map(|s| Some(s.to_owned()))
                .map_err(|_| Error::InvalidValue {
                    tag,
                    reason: "value is not valid UTF-8",
                }),
        }
    }

    /// Required big-endian unsigned integer tag.
    pub fn uint(&self, tag: TlvTag) -> Result<u64, Error> {
        self.uint_optional(tag)?.ok_or(Error::MissingTag(tag))
    }

    /// Optional big-endian unsigned integer tag.
    pub fn uint_optional(&self, tag: TlvTag) -> Result<Option<u64>, Error> {
        expect_kind(tag, ValueKind::Uint)?;
        match self.first(tag) {
            None => Ok(None),
            Some(entry) => {
                if entry.value.is_empty() || entry.value.len() > 8 {
                    return Err(Error::InvalidValue {
                        tag,
                        reason: "integer value must be 1 to 8 bytes",
                    });
                }
                let value = entry.value.iter().fold(0u64, |acc, b| acc << 8 | *b as u64);
                Ok(Some(value))
            }
        }
    }

    /// Required single-byte unsigned integer tag.
    pub fn u8(&self, tag: TlvTag) -> Result<u8, Error> {
        let value = self.uint(tag)?;
        u8::try_from(value).map_err(|_| Error::InvalidValue {
            tag,
            reason: "integer value does not fit in one byte",
        })
    }

    /// Required nested TLV tag, decoded into its own map.
    pub fn nested(&self, tag: TlvTag) -> Result<Self, Error> {
        expect_kind(tag, ValueKind::Nested)?;
        let entry = self.first(tag).ok_or(Error::MissingTag(tag))?;
        Self::from_bytes(&entry.value)
    }

    /// Every occurrence of a nested TLV tag, decoded in wire order.
    pub fn nested_all(&self, tag: TlvTag) -> Result<Vec<Self>, Error> {
        expect_kind(tag, ValueKind::Nested)?;
        self.entries
            .iter()
            .filter(|e| e.tag == tag.raw())
            .map(|e| Self::from_bytes(&e.value))
            .collect()
    }
}

fn expect_kind(tag: TlvTag, kind: ValueKind) -> Result<(), Error> {
    if tag.value_kind() == kind {
        Ok(())
    } else {
        Err(Error::InvalidValue {
            tag,
            reason: "accessor does not match the tag's registered value kind",
        })
    }
}
