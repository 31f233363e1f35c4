//! Append-only slot arena with address-stable slots.
//!
//! Slots are stored in a spine of lazily allocated chunks whose sizes double
//! (4, 8, 16, ...). Growth only ever fills in a later spine entry; no
//! existing slot is moved, so a `&Slot` or index obtained before a growth
//! event stays valid while the store lives. That stability is what allows
//! the handle layer's soft released-check to read a slot's flag without
//! taking the shared lock.
//!
//! Write discipline: chunk initialization and trace writes happen only while
//! the owner's lock is held. Readers reach already-published chunks through
//! `OnceLock::get`, which orders the chunk contents behind the publication.

use crate::trace::SiteTrace;
use core::sync::atomic::{AtomicBool, Ordering};
use std::sync::OnceLock;

/// Slots in chunk 0; chunk `c` holds `FIRST_CHUNK_SLOTS << c` slots.
const FIRST_CHUNK_SLOTS: usize = 4;
/// Spine entries needed to cover every `u32` slot index.
const SPINE_CHUNKS: usize = 31;

/// Per-version record. Created at handle issuance, mutated exactly once
/// (released flips false to true), never destroyed individually.
pub(crate) struct Slot {
    released: AtomicBool,
    pub(crate) acquired_at: SiteTrace,
    pub(crate) released_at: SiteTrace,
}

impl Slot {
    fn new() -> Self {
        Self {
            released: AtomicBool::new(false),
            acquired_at: SiteTrace::new(),
            released_at: SiteTrace::new(),
        }
    }

    /// Lock-free read of the released flag. A stale `false` is possible for
    /// readers outside the lock; a stale `true` is not, since the flag is
    /// monotonic and set before the lock is dropped.
    #[inline]
    pub(crate) fn is_released(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }

    /// Flip the flag; caller must hold the owner's lock.
    #[inline]
    pub(crate) fn mark_released(&self) {
        self.released.store(true, Ordering::Release);
    }
}

/// Growable store of `Slot`s indexed by version number.
pub(crate) struct SlotStore {
    chunks: [OnceLock<Box<[Slot]>>; SPINE_CHUNKS],
}

impl SlotStore {
    pub(crate) fn new() -> Self {
        Self {
            chunks: std::array::from_fn(|_| OnceLock::new()),
        }
    }

    /// Map an index to its (chunk, offset) position.
    ///
    /// Chunk `c` starts at index `FIRST_CHUNK_SLOTS * (2^c - 1)`; solving
    /// for `c` reduces to the bit length of `index / FIRST_CHUNK_SLOTS + 1`.
    fn locate(index: u32) -> (usize, usize) {
        let n = (index as usize / FIRST_CHUNK_SLOTS) + 1;
        let chunk = (usize::BITS - 1 - n.leading_zeros()) as usize;
        let start = FIRST_CHUNK_SLOTS * ((1usize << chunk) - 1);
        (chunk, index as usize - start)
    }

    /// Access the slot for an index the owner has already issued, ensuring
    /// its chunk is allocated. Callers need the owner's lock (or exclusive
    /// access) so that chunk publication is ordered before the index
    /// escapes.
    pub(crate) fn grow_to(&self, index: u32) -> &Slot {
        let (chunk, offset) = Self::locate(index);
        let slots = self.chunks[chunk].get_or_init(|| {
            let len = FIRST_CHUNK_SLOTS << chunk;
            (0..len).map(|_| Slot::new()).collect()
        });
        &slots[offset]
    }

    /// Access a previously issued slot without synchronization.
    pub(crate) fn slot(&self, index: u32) -> &Slot {
        let (chunk, offset) = Self::locate(index);
        let slots = self.chunks[chunk]
            .get()
            .expect("slot index must have been issued by this store");
        &slots[offset]
    }
}
