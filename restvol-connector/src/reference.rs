//! Object references stored as dataset elements.
//!
//! Locally a reference is a fixed-size [`WireReference`]:
//!
//! ```text
//! offset  size  field
//! 0       4     ref kind      (u32 LE, 0 = object, 1 = region)
//! 4       4     target kind   (u32 LE, see ObjectKind::wire_code)
//! 8       256   target id     (UTF-8, NUL padded, "<tag>-<id>")
//! ```
//!
//! The service instead stores each element as `"<collection>/<id>"`, either
//! in a JSON array or in fixed 48-byte slots of a binary buffer.

use restvol_types::limits::{OBJECT_REF_STRING_LEN, URI_MAX_LENGTH};
use restvol_types::{ObjectKind, ServerId};
use serde_json::Value;
use std::fmt;

use crate::error::{ConnectorError, ConnectorResult};

/// Total size of an encoded [`WireReference`].
pub const WIRE_REFERENCE_SIZE: usize = 8 + URI_MAX_LENGTH;

/// What a reference points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RefKind {
    ObjectReference,
    /// Never produced; decoding one fails.
    RegionReference,
}

impl RefKind {
    pub const fn code(self) -> u32 {
        match self {
            RefKind::ObjectReference => 0,
            RefKind::RegionReference => 1,
        }
    }
}

/// A fixed-layout object reference record.
#[derive(Clone, PartialEq, Eq)]
pub struct WireReference {
    ref_kind: u32,
    target_kind: u32,
    target_id: [u8; URI_MAX_LENGTH],
}

impl WireReference {
    /// The all-zero record used for unset elements.
    pub fn null() -> Self {
        Self {
            ref_kind: 0,
            target_kind: 0,
            target_id: [0; URI_MAX_LENGTH],
        }
    }

    pub fn is_null(&self) -> bool {
        self.target_kind == 0 && self.target_id[0] == 0
    }

    /// Builds an object reference to `id`.
    ///
    /// `kind` must be one of the four object kinds and `id` must carry the
    /// matching tag (`g-`, `t-`, `d-`); the tag is part of the identifier the
    /// service assigns, so it is stored verbatim.
    pub fn encode(kind: ObjectKind, id: &ServerId) -> ConnectorResult<Self> {
        let (Some(tag), Some(code)) = (kind.tag(), kind.wire_code()) else {
            return Err(ConnectorError::BadValue(format!(
                "{kind} objects cannot be referenced"
            )));
        };
        if id.tagged_kind().and_then(ObjectKind::tag) != Some(tag) {
            return Err(ConnectorError::BadValue(format!(
                "identifier {id} does not carry the '{tag}-' tag of a {kind}"
            )));
        }

        let text = id.as_str().as_bytes();
        let mut target_id = [0u8; URI_MAX_LENGTH];
        // ServerId guarantees room for the terminating NUL.
        target_id[..text.len()].copy_from_slice(text);

        Ok(Self {
            ref_kind: RefKind::ObjectReference.code(),
            target_kind: code,
            target_id,
        })
    }

    /// Recovers `(ref kind, target kind, identifier)`.
    ///
    /// Fails with `CorruptReference` for region references, null records,
    /// unknown tags and tags that disagree with the recorded target kind.
    pub fn decode(&self) -> ConnectorResult<(RefKind, ObjectKind, ServerId)> {
        match self.ref_kind {
            0 => {}
            1 => {
                return Err(ConnectorError::CorruptReference(
                    "region references are not supported".to_string(),
                ));
            }
            other => {
                return Err(ConnectorError::CorruptReference(format!(
                    "unknown reference kind {other}"
                )));
            }
        }

        let text = self.text()?;
        if text.is_empty() {
            return Err(ConnectorError::CorruptReference("null reference".to_string()));
        }

        let mut chars = text.chars();
        let tag = chars.next().unwrap_or('\0');
        let tag_kind = match (ObjectKind::from_tag(tag), chars.next()) {
            (Some(kind), Some('-')) => kind,
            _ => {
                return Err(ConnectorError::CorruptReference(format!(
                    "identifier {text:?} has no known kind tag"
                )));
            }
        };

        let kind = ObjectKind::from_wire_code(self.target_kind).ok_or_else(|| {
            ConnectorError::CorruptReference(format!("unknown target kind {}", self.target_kind))
        })?;
        if kind.tag() != tag_kind.tag() {
            return Err(ConnectorError::CorruptReference(format!(
                "identifier {text:?} is tagged as a {tag_kind} but the record says {kind}"
            )));
        }

        let id = ServerId::parse(text)
            .map_err(|e| ConnectorError::CorruptReference(e.to_string()))?;
        Ok((RefKind::ObjectReference, kind, id))
    }

    pub fn to_bytes(&self) -> [u8; WIRE_REFERENCE_SIZE] {
        let mut out = [0u8; WIRE_REFERENCE_SIZE];
        out[0..4].copy_from_slice(&self.ref_kind.to_le_bytes());
        out[4..8].copy_from_slice(&self.target_kind.to_le_bytes());
        out[8..].copy_from_slice(&self.target_id);
        out
    }

    /// Reads a record without validating it; see [`WireReference::decode`].
    pub fn from_bytes(bytes: &[u8]) -> ConnectorResult<Self> {
        if bytes.len() != WIRE_REFERENCE_SIZE {
            return Err(ConnectorError::CorruptReference(format!(
                "reference record is {} bytes, expected {WIRE_REFERENCE_SIZE}",
                bytes.len()
            )));
        }
        let mut ref_kind = [0u8; 4];
        let mut target_kind = [0u8; 4];
        let mut target_id = [0u8; URI_MAX_LENGTH];
        ref_kind.copy_from_slice(&bytes[0..4]);
        target_kind.copy_from_slice(&bytes[4..8]);
        target_id.copy_from_slice(&bytes[8..]);
        Ok(Self {
            ref_kind: u32::from_le_bytes(ref_kind),
            target_kind: u32::from_le_bytes(target_kind),
            target_id,
        })
    }

    /// Builds a record from raw parts, as a host-side payload codec would.
    pub fn from_parts(ref_kind: u32, target_kind: u32, text: &str) -> ConnectorResult<Self> {
        let bytes = text.as_bytes();
        if bytes.len() >= URI_MAX_LENGTH {
            return Err(ConnectorError::BadValue(format!(
                "reference text is {} bytes, limit is {}",
                bytes.len(),
                URI_MAX_LENGTH - 1
            )));
        }
        let mut target_id = [0u8; URI_MAX_LENGTH];
        target_id[..bytes.len()].copy_from_slice(bytes);
        Ok(Self {
            ref_kind,
            target_kind,
            target_id,
        })
    }

    fn text(&self) -> ConnectorResult<&str> {
        let end = self
            .target_id
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(URI_MAX_LENGTH);
        std::str::from_utf8(&self.target_id[..end])
            .map_err(|e| ConnectorError::CorruptReference(format!("identifier is not UTF-8: {e}")))
    }

    /// Server element form, `"<collection>/<id>"`, or `""` for a null record.
    pub fn to_server_value(&self) -> ConnectorResult<String> {
        if self.is_null() {
            return Ok(String::new());
        }
        let (_, kind, id) = self.decode()?;
        let collection = kind.collection().unwrap_or_default();
        Ok(format!("{collection}/{id}"))
    }

    /// Parses the server element form. `""` yields a null record.
    pub fn from_server_value(value: &str) -> ConnectorResult<Self> {
        if value.is_empty() {
            return Ok(Self::null());
        }
        let (collection, id) = value.split_once('/').ok_or_else(|| {
            ConnectorError::CorruptReference(format!("{value:?} is not <collection>/<id>"))
        })?;
        let kind = ObjectKind::from_collection(collection)
            .map_err(|e| ConnectorError::CorruptReference(e.to_string()))?;
        let id = ServerId::parse(id).map_err(|e| ConnectorError::CorruptReference(e.to_string()))?;
        Self::encode(kind, &id).map_err(|e| ConnectorError::CorruptReference(e.to_string()))
    }
}

impl Default for WireReference {
    fn default() -> Self {
        Self::null()
    }
}

impl fmt::Debug for WireReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WireReference")
            .field("ref_kind", &self.ref_kind)
            .field("target_kind", &self.target_kind)
            .field("target_id", &self.text().unwrap_or("<invalid>"))
            .finish()
    }
}

/// Converts references to the JSON array the service accepts for
/// reference-typed values.
pub fn references_to_json(refs: &[WireReference]) -> ConnectorResult<Value> {
    let values = refs
        .iter()
        .map(|r| r.to_server_value().map(Value::String))
        .collect::<ConnectorResult<Vec<_>>>()?;
    Ok(Value::Array(values))
}

/// Parses a JSON array of server element strings.
pub fn references_from_json(value: &Value) -> ConnectorResult<Vec<WireReference>> {
    let items = value.as_array().ok_or_else(|| {
        ConnectorError::CorruptReference("reference values must be a JSON array".to_string())
    })?;
    items
        .iter()
        .map(|item| {
            let s = item.as_str().ok_or_else(|| {
                ConnectorError::CorruptReference(format!("reference element {item} is not a string"))
            })?;
            WireReference::from_server_value(s)
        })
        .collect()
}

/// Packs references into the service's binary form: one NUL-padded
/// `"<collection>/<id>"` per 48-byte slot. A value may fill its slot
/// exactly, with no terminator.
pub fn references_to_slots(refs: &[WireReference]) -> ConnectorResult<Vec<u8>> {
    let mut out = vec![0u8; refs.len() * OBJECT_REF_STRING_LEN];
    for (slot, reference) in out.chunks_exact_mut(OBJECT_REF_STRING_LEN).zip(refs) {
        let value = reference.to_server_value()?;
        if value.len() > OBJECT_REF_STRING_LEN {
            return Err(ConnectorError::BadValue(format!(
                "{value:?} does not fit a {OBJECT_REF_STRING_LEN}-byte reference slot"
            )));
        }
        slot[..value.len()].copy_from_slice(value.as_bytes());
    }
    Ok(out)
}

/// Unpacks the service's 48-byte slot form.
pub fn references_from_slots(bytes: &[u8]) -> ConnectorResult<Vec<WireReference>> {
    if bytes.len() % OBJECT_REF_STRING_LEN != 0 {
        return Err(ConnectorError::CorruptReference(format!(
            "buffer of {} bytes is not a whole number of {OBJECT_REF_STRING_LEN}-byte slots",
            bytes.len()
        )));
    }
    bytes
        .chunks_exact(OBJECT_REF_STRING_LEN)
        .map(|slot| {
            let end = slot.iter().position(|&b| b == 0).unwrap_or(slot.len());
            let text = std::str::from_utf8(&slot[..end])
                .map_err(|e| ConnectorError::CorruptReference(format!("slot is not UTF-8: {e}")))?;
            WireReference::from_server_value(text)
        })
        .collect()
}
