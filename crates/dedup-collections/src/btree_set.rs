//! Default `OrderedSet`: a `BTreeSet` keyed by a comparator-driven wrapper.
//!
//! `BTreeSet<T>` requires `T: Ord`, but our ordering is a runtime value (the
//! injected `Comparator`), not a compile-time trait impl. `CmpKey` closes
//! over an `Arc<dyn Comparator>` and forwards `Ord` to it; as long as every
//! key in one set shares the same comparator (true for the lifetime of a
//! `BTreeOrderedSet`), the BTree's internal invariants hold.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::sync::Arc;

use dedup_core::{Comparator, Result};

use crate::ordered_set::{InsertOutcome, OrderedSet};

struct CmpKey {
    bytes: Box<[u8]>,
    cmp: Arc<dyn Comparator>,
}

impl PartialEq for CmpKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp.equal(&self.bytes, &other.bytes)
    }
}
impl Eq for CmpKey {}

impl PartialOrd for CmpKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CmpKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.cmp.compare(&self.bytes, &other.bytes)
    }
}

/// `BTreeSet`-backed ordered set.
///
/// `std`'s global allocator aborts the process on out-of-memory rather than
/// returning an error, so `insert`/`clear` here cannot genuinely surface
/// `Error::AllocationFailure`; the `Result` return exists so other
/// implementations of `OrderedSet` (e.g. an arena with `try_reserve`) can.
pub struct BTreeOrderedSet {
    set: BTreeSet<CmpKey>,
    cmp: Arc<dyn Comparator>,
}

impl BTreeOrderedSet {
    pub fn new(cmp: Arc<dyn Comparator>) -> Self {
        Self {
            set: BTreeSet::new(),
            cmp,
        }
    }
}

impl OrderedSet for BTreeOrderedSet {
    // A `BTreeSet` node holds a `Box<[u8]>` key plus a handful of child
    // pointers and a parent link; this is a conservative per-key estimate.
    fn node_overhead(&self) -> usize {
        48
    }

    fn size(&self) -> usize {
        self.set.len()
    }

    fn insert(&mut self, key: &[u8]) -> Result<InsertOutcome> {
        let cmp_key = CmpKey {
            bytes: key.into(),
            cmp: Arc::clone(&self.cmp),
        };
        if self.set.insert(cmp_key) {
            Ok(InsertOutcome::Inserted)
        } else {
            Ok(InsertOutcome::AlreadyPresent)
        }
    }

    fn walk_in_order(&self, visitor: &mut dyn FnMut(&[u8])) {
        for key in &self.set {
            visitor(&key.bytes);
        }
    }

    fn clear(&mut self) {
        self.set.clear();
    }
}
