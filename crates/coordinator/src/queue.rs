//! FIFO queue of requests that could not be granted immediately

use dlsim_types::{ProcessId, ResourceId, WaitingView};
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitingRequest {
    pub process: ProcessId,
    pub resource: ResourceId,
    pub units: u32,
}

impl WaitingRequest {
    #[must_use]
    pub fn view(&self) -> WaitingView {
        WaitingView {
            process: self.process,
            resource: self.resource,
            units: self.units,
        }
    }
}

/// Insertion-ordered waiting requests
#[derive(Debug, Clone, Default)]
pub struct WaitingQueue {
    entries: VecDeque<WaitingRequest>,
}

impl WaitingQueue {
    pub fn push(&mut self, entry: WaitingRequest) {
        self.entries.push_back(entry);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &WaitingRequest> {
        self.entries.iter()
    }

    /// Remove every entry owned by `process`, returning how many went
    pub fn purge(&mut self, process: ProcessId) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| e.process != process);
        before - self.entries.len()
    }

    /// Take all entries out, leaving the queue empty
    pub(crate) fn take(&mut self) -> VecDeque<WaitingRequest> {
        std::mem::take(&mut self.entries)
    }

    pub(crate) fn restore(&mut self, entries: VecDeque<WaitingRequest>) {
        self.entries = entries;
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
