//! Retained snapshot store
//!
//! Holds the most recent triggered capture. Writers swap in a complete,
//! already-copied buffer under the lock; readers clone an `Arc` to the buffer
//! and release the lock immediately. A reader therefore sees either the old
//! snapshot or the new one in full, and a replacement never waits on a slow
//! HTTP send of the previous image.

use std::sync::{Arc, Mutex, MutexGuard};

/// An owned copy of a triggered frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    data: Vec<u8>,
    captured_at_ms: u32,
}

impl Snapshot {
    pub fn new(data: Vec<u8>, captured_at_ms: u32) -> Self {
        Self {
            data,
            captured_at_ms,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Capture time (ms since boot)
    pub fn captured_at_ms(&self) -> u32 {
        self.captured_at_ms
    }
}

/// Single-slot store shared between the stream loop and the capture endpoint
#[derive(Default)]
pub struct SnapshotStore {
    slot: Mutex<Option<Arc<Snapshot>>>,
}

impl SnapshotStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn slot(&self) -> MutexGuard<'_, Option<Arc<Snapshot>>> {
        // The slot is only ever assigned whole, so a poisoned lock still
        // holds a consistent value
        self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Replace the retained snapshot, returning a handle to the new one
    ///
    /// The previous buffer is freed here unless a reader still holds it, in
    /// which case it lives until that reader finishes.
    pub fn store(&self, snapshot: Snapshot) -> Arc<Snapshot> {
        let snapshot = Arc::new(snapshot);
        let previous = self.slot().replace(snapshot.clone());
        drop(previous);
        snapshot
    }

    /// Current snapshot, if any trigger has fired yet
    pub fn read(&self) -> Option<Arc<Snapshot>> {
        self.slot().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.slot().is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_empty_store_reads_none() {
        let store = SnapshotStore::new();
        assert!(store.read().is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_read_returns_exactly_what_was_stored() {
        let store = SnapshotStore::new();
        let jpeg = vec![0xFF, 0xD8, 1, 2, 3, 4, 5, 0xFF, 0xD9];
        store.store(Snapshot::new(jpeg.clone(), 1234));

        let snap = store.read().unwrap();
        assert_eq!(snap.bytes(), jpeg.as_slice());
        assert_eq!(snap.len(), jpeg.len());
        assert_eq!(snap.captured_at_ms(), 1234);
    }

    #[test]
    fn test_replacement_keeps_only_latest() {
        let store = SnapshotStore::new();
        let first = store.store(Snapshot::new(vec![1; 100], 1));
        store.store(Snapshot::new(vec![2; 10], 2));

        let current = store.read().unwrap();
        assert_eq!(current.bytes(), &[2; 10]);
        // Only our handle keeps the first buffer alive
        assert_eq!(Arc::strong_count(&first), 1);
    }

    #[test]
    fn test_reader_keeps_old_buffer_intact_across_replace() {
        let store = SnapshotStore::new();
        store.store(Snapshot::new(vec![7; 64], 1));

        let held = store.read().unwrap();
        store.store(Snapshot::new(vec![9; 32], 2));

        assert_eq!(held.bytes(), &[7; 64]);
        assert_eq!(store.read().unwrap().bytes(), &[9; 32]);
    }

    #[test]
    fn test_concurrent_readers_never_see_partial_buffers() {
        let store = SnapshotStore::new();
        store.store(Snapshot::new(vec![0; 256], 0));

        let writer = {
            let store = store.clone();
            thread::spawn(move || {
                for i in 1..200u32 {
                    let fill = (i % 251) as u8;
                    store.store(Snapshot::new(vec![fill; 256 + i as usize], i));
                }
            })
        };

        for _ in 0..500 {
            let snap = store.read().unwrap();
            let bytes = snap.bytes();
            let first = bytes[0];
            assert!(bytes.iter().all(|&b| b == first));
            assert_eq!(bytes.len(), 256 + snap.captured_at_ms() as usize);
        }

        writer.join().unwrap();
    }
}
