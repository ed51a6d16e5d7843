//! Hello extensions.
//!
//! Extensions are kept as opaque bodies keyed by their 16-bit type, in the
//! order they appeared. The engine negotiates none of them; they are parsed
//! so that malformed blocks are rejected and so they can be re-encoded.

use bytes::BufMut;

use crate::codec::{put_compact_string, Reader};
use crate::error::{Error, Result};

/// A single extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extension {
    /// Extension type
    pub extension_type: u16,

    /// Extension data
    pub data: Vec<u8>,
}

/// Ordered map of extension type to body. Types are unique.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extensions {
    entries: Vec<Extension>,
}

impl Extensions {
    /// Empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an extension, refusing duplicates.
    pub fn insert(&mut self, extension_type: u16, data: Vec<u8>) -> Result<()> {
        if self.get(extension_type).is_some() {
            return Err(Error::DecodeError(format!(
                "duplicate extension type 0x{:04x}",
                extension_type
            )));
        }
        self.entries.push(Extension {
            extension_type,
            data,
        });
        Ok(())
    }

    /// Body of the extension with the given type.
    pub fn get(&self, extension_type: u16) -> Option<&[u8]> {
        self.entries
            .iter()
            .find(|e| e.extension_type == extension_type)
            .map(|e| e.data.as_slice())
    }

    /// Number of extensions.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no extensions.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate in wire order.
    pub fn iter(&self) -> impl Iterator<Item = &Extension> {
        self.entries.iter()
    }

    /// Decode an optional extensions block at the end of a hello body.
    ///
    /// ```text
    /// Extension extensions<0..2^16-1>;
    /// ```
    ///
    /// An absent block (no bytes left) yields an empty set.
    pub fn decode_optional(reader: &mut Reader<'_>) -> Result<Self> {
        let mut extensions = Self::new();
        if reader.is_empty() {
            return Ok(extensions);
        }

        let block = reader.read_compact(2)?;
        let mut inner = Reader::new(block);
        while !inner.is_empty() {
            let extension_type = inner.read_u16("extension type")?;
            let data = inner.read_compact(2)?;
            extensions.insert(extension_type, data.to_vec())?;
        }
        Ok(extensions)
    }

    /// Append the extensions block to `out`. Nothing is written when empty.
    pub fn encode_into<B: BufMut>(&self, out: &mut B) -> Result<()> {
        if self.entries.is_empty() {
            return Ok(());
        }
        let mut block = Vec::new();
        for ext in &self.entries {
            block.put_u16(ext.extension_type);
            put_compact_string(&mut block, &ext.data, 2)?;
        }
        put_compact_string(out, &block, 2)
    }
}
