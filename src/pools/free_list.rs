//! Single-consumer free list of idle slot indices.
//!
//! Intrusive forward links live in a side table indexed by slot, so popping
//! and pushing are O(1) and allocation-free once the table has grown. The
//! list is not synchronized: it belongs to the one sequence that owns the
//! completion pool.

/// Sentinel for "no next entry".
const NIL: u32 = u32::MAX;

#[derive(Debug, Clone, Copy)]
struct Link {
    next: u32,
    pooled: bool,
}

/// LIFO free list over slot indices.
#[derive(Debug, Default)]
pub(crate) struct FreeList {
    head: Option<u32>,
    links: Vec<Link>,
    len: usize,
}

impl FreeList {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Track one more slot index. New slots start checked out.
    pub(crate) fn grow(&mut self) -> u32 {
        let index = self.links.len() as u32;
        self.links.push(Link {
            next: NIL,
            pooled: false,
        });
        index
    }

    /// Pop the most recently returned index.
    pub(crate) fn try_pop(&mut self) -> Option<u32> {
        let index = self.head?;
        let link = &mut self.links[index as usize];
        self.head = (link.next != NIL).then_some(link.next);
        link.next = NIL;
        link.pooled = false;
        self.len -= 1;
        Some(index)
    }

    /// Return an index to the pool.
    ///
    /// Panics if the index is already pooled or was never handed out.
    pub(crate) fn push(&mut self, index: u32) {
        let head = self.head;
        let link = match self.links.get_mut(index as usize) {
            Some(link) => link,
            None => ps_violation!(PS901, "free list has no slot {}", index),
        };
        if link.pooled {
            ps_violation!(PS004, "slot {} is already in the free list", index);
        }
        link.pooled = true;
        link.next = head.unwrap_or(NIL);
        self.head = Some(index);
        self.len += 1;
    }

    pub(crate) fn is_pooled(&self, index: u32) -> bool {
        self.links
            .get(index as usize)
            .map_or(false, |link| link.pooled)
    }

    /// Number of idle indices.
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    /// Number of indices ever tracked.
    pub(crate) fn capacity(&self) -> usize {
        self.links.len()
    }
}
