//! Player id allocation policies.

use uuid::Uuid;

/// Offset added to the record count under the sequential policy, so ids
/// never collide with small test counts or array indexes.
pub const SEQUENTIAL_BASE_OFFSET: u64 = 100_000;

/// Produces a new unique player identifier given the current record count.
///
/// Allocators are stateless and must only be called while the store holds
/// its exclusive lock: the sequential policy derives ids from the record
/// count, which only the write lock keeps stable.
pub trait IdAllocator: Send + Sync {
    fn next_id(&self, current_count: usize) -> String;
}

/// Count-based ids: `base_offset + current_count`.
///
/// Serialized by the store's write lock within one process; NOT safe when
/// multiple process instances share the same backing file.
pub struct SequentialIds {
    base_offset: u64,
}

impl SequentialIds {
    pub fn new() -> Self {
        Self {
            base_offset: SEQUENTIAL_BASE_OFFSET,
        }
    }

    pub fn with_base_offset(base_offset: u64) -> Self {
        Self { base_offset }
    }
}

impl Default for SequentialIds {
    fn default() -> Self {
        Self::new()
    }
}

impl IdAllocator for SequentialIds {
    fn next_id(&self, current_count: usize) -> String {
        (self.base_offset + current_count as u64).to_string()
    }
}

/// Collision-resistant random ids (UUID v4, hyphen-less).
///
/// The default policy: independent of the record count and safe across
/// process instances sharing one file.
pub struct RandomIds;

impl IdAllocator for RandomIds {
    fn next_id(&self, _current_count: usize) -> String {
        Uuid::new_v4().simple().to_string()
    }
}
