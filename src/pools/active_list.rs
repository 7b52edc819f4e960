//! Doubly-linked list of in-flight slot indices.
//!
//! Lets the pool walk every checked-out slot (forced cancellation, teardown)
//! and unlink one in O(1) when it is consumed. Links are cleared on removal
//! so a recycled slot never carries stale neighbours.

const NIL: u32 = u32::MAX;

#[derive(Debug, Clone, Copy)]
struct Link {
    prev: u32,
    next: u32,
    linked: bool,
}

impl Link {
    const UNLINKED: Link = Link {
        prev: NIL,
        next: NIL,
        linked: false,
    };
}

#[derive(Debug)]
pub(crate) struct ActiveList {
    head: u32,
    links: Vec<Link>,
    len: usize,
}

impl ActiveList {
    pub(crate) fn new() -> Self {
        Self {
            head: NIL,
            links: Vec::new(),
            len: 0,
        }
    }

    /// Link `index` at the front of the list.
    pub(crate) fn insert(&mut self, index: u32) {
        let i = index as usize;
        if i >= self.links.len() {
            self.links.resize(i + 1, Link::UNLINKED);
        }
        if self.links[i].linked {
            ps_violation!(PS901, "slot {} is already in flight", index);
        }

        let old_head = self.head;
        self.links[i] = Link {
            prev: NIL,
            next: old_head,
            linked: true,
        };
        if old_head != NIL {
            self.links[old_head as usize].prev = index;
        }
        self.head = index;
        self.len += 1;
    }

    /// Unlink `index`. Returns false if it was not linked.
    pub(crate) fn remove(&mut self, index: u32) -> bool {
        let link = match self.links.get(index as usize) {
            Some(link) if link.linked => *link,
            _ => return false,
        };

        if link.prev != NIL {
            self.links[link.prev as usize].next = link.next;
        } else {
            self.head = link.next;
        }
        if link.next != NIL {
            self.links[link.next as usize].prev = link.prev;
        }

        self.links[index as usize] = Link::UNLINKED;
        self.len -= 1;
        true
    }

    /// Snapshot of linked indices, most recent first.
    pub(crate) fn indices(&self) -> Vec<u32> {
        let mut out = Vec::with_capacity(self.len);
        let mut cursor = self.head;
        while cursor != NIL {
            out.push(cursor);
            cursor = self.links[cursor as usize].next;
        }
        out
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }
}
