//! Client-side upload queue.
//!
//! Items wait here until the catalog dispatches them to the store. Once
//! dispatched, a write cannot be cancelled.

use crate::store::FileBlob;

/// Handle for a queued upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UploadTicket(u64);

/// A blob waiting to be uploaded.
#[derive(Debug, Clone)]
pub struct PendingUpload {
    pub ticket: UploadTicket,
    pub blob: FileBlob,
    pub folder_id: Option<String>,
}

/// FIFO of uploads not yet sent to the store.
#[derive(Debug, Default)]
pub struct UploadQueue {
    pending: Vec<PendingUpload>,
    next_ticket: u64,
}

impl UploadQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a blob for upload into `folder_id` (None = root).
    pub fn enqueue(&mut self, blob: FileBlob, folder_id: Option<String>) -> UploadTicket {
        self.next_ticket += 1;
        let ticket = UploadTicket(self.next_ticket);
        self.pending.push(PendingUpload {
            ticket,
            blob,
            folder_id,
        });
        ticket
    }

    /// Remove a queued upload. Returns false if it was already dispatched
    /// or never existed.
    pub fn cancel(&mut self, ticket: UploadTicket) -> bool {
        let before = self.pending.len();
        self.pending.retain(|item| item.ticket != ticket);
        self.pending.len() != before
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Names of the queued blobs, in order.
    pub fn names(&self) -> Vec<&str> {
        self.pending.iter().map(|item| item.blob.name.as_str()).collect()
    }

    /// Take every pending item, leaving the queue empty.
    pub(crate) fn drain(&mut self) -> Vec<PendingUpload> {
        std::mem::take(&mut self.pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blob(name: &str) -> FileBlob {
        FileBlob::new(name, "text/plain", b"x".to_vec())
    }

    #[test]
    fn test_enqueue_and_cancel() {
        let mut queue = UploadQueue::new();
        let a = queue.enqueue(blob("a.txt"), None);
        let b = queue.enqueue(blob("b.txt"), Some("f1".to_string()));
        assert_ne!(a, b);
        assert_eq!(queue.len(), 2);

        assert!(queue.cancel(a));
        assert!(!queue.cancel(a));
        assert_eq!(queue.names(), vec!["b.txt"]);
    }

    #[test]
    fn test_drain_empties_queue() {
        let mut queue = UploadQueue::new();
        let ticket = queue.enqueue(blob("a.txt"), None);

        let items = queue.drain();
        assert_eq!(items.len(), 1);
        assert!(queue.is_empty());
        // Dispatched items can no longer be cancelled.
        assert!(!queue.cancel(ticket));
    }

    #[test]
    fn test_tickets_not_reused_after_drain() {
        let mut queue = UploadQueue::new();
        let first = queue.enqueue(blob("a.txt"), None);
        queue.drain();
        let second = queue.enqueue(blob("b.txt"), None);
        assert!(second > first);
    }
}
