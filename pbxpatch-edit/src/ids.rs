//! Object ID generation.

use pbxpatch_types::ObjectId;
use uuid::Uuid;

/// Source of candidate object IDs.
///
/// Implementations guarantee the format (24 uppercase hex characters). Uniqueness within a
/// descriptor is checked by [`fresh_id`].
pub trait IdSource {
    fn next_id(&mut self) -> ObjectId;
}

/// Random IDs from UUIDv4 entropy.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomIds;

impl IdSource for RandomIds {
    fn next_id(&mut self) -> ObjectId {
        let uuid = Uuid::new_v4();
        let mut bytes = [0u8; 12];
        bytes.copy_from_slice(&uuid.as_bytes()[..12]);
        ObjectId::from_bytes(bytes)
    }
}

/// Deterministic IDs: a fixed 8-digit prefix followed by a 16-digit counter.
#[derive(Debug, Clone)]
pub struct SequentialIds {
    prefix: u32,
    next: u64,
}

impl SequentialIds {
    pub fn new(prefix: u32) -> Self {
        Self { prefix, next: 1 }
    }
}

impl Default for SequentialIds {
    fn default() -> Self {
        Self::new(0x5EED_0000)
    }
}

impl IdSource for SequentialIds {
    fn next_id(&mut self) -> ObjectId {
        let mut bytes = [0u8; 12];
        bytes[..4].copy_from_slice(&self.prefix.to_be_bytes());
        bytes[4..].copy_from_slice(&self.next.to_be_bytes());
        self.next += 1;
        ObjectId::from_bytes(bytes)
    }
}

/// Draw IDs from `source` until one does not occur anywhere in `text`.
pub fn fresh_id(source: &mut dyn IdSource, text: &str) -> ObjectId {
    loop {
        let id = source.next_id();
        if !text.contains(id.as_str()) {
            tracing::trace!(id = %id, "minted object id");
            return id;
        }
        tracing::debug!(id = %id, "candidate id already present; drawing again");
    }
}
