//! Bounded tile downloader.
//!
//! Keeps at most [`NB_MAX_SIMULTANEOUS_DL`] transfers in flight; everything
//! else waits in a deterministic priority queue (lower value first, FIFO
//! within a priority). Requests are deduplicated by URL across both the
//! queue and the in-flight set. Transport is injected through
//! [`TileFetcher`], so the engine never touches the network itself.

use std::collections::{BTreeMap, BTreeSet};

use runtime::work_queue::{WorkId, WorkQueue};

/// Concurrent transfer cap.
pub const NB_MAX_SIMULTANEOUS_DL: usize = 4;

/// Transport hook supplied by the embedder. `fetch` must eventually be
/// answered with [`Downloader::complete`] for the same URL.
pub trait TileFetcher {
    fn fetch(&mut self, url: &str);
}

/// Result of a finished transfer, as reported by the embedder.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Success { width: u32, height: u32 },
    Failure,
}

#[derive(Debug)]
pub struct Downloader {
    queue: WorkQueue<String>,
    queued: BTreeMap<String, WorkId>,
    in_flight: BTreeSet<String>,
    max_in_flight: usize,
}

impl Default for Downloader {
    fn default() -> Self {
        Self::with_max_in_flight(NB_MAX_SIMULTANEOUS_DL)
    }
}

impl Downloader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_in_flight(max_in_flight: usize) -> Self {
        assert!(max_in_flight > 0, "need at least one download slot");
        Self {
            queue: WorkQueue::new(),
            queued: BTreeMap::new(),
            in_flight: BTreeSet::new(),
            max_in_flight,
        }
    }

    pub fn in_flight_len(&self) -> usize {
        self.in_flight.len()
    }

    pub fn queued_len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_idle(&self) -> bool {
        self.in_flight.is_empty() && self.queue.is_empty()
    }

    /// Enqueues a download unless the URL is already queued or in flight.
    /// Returns `true` if the request was accepted.
    pub fn request(&mut self, url: &str, priority: i32) -> bool {
        if self.queued.contains_key(url) || self.in_flight.contains(url) {
            return false;
        }
        let id = self.queue.push(priority, url.to_owned());
        self.queued.insert(url.to_owned(), id);
        true
    }

    /// Drops a queued request. In-flight transfers cannot be canceled; their
    /// completion is discarded upstream if the tile was evicted meanwhile.
    pub fn cancel(&mut self, url: &str) -> bool {
        match self.queued.remove(url) {
            Some(id) => self.queue.cancel(id),
            None => false,
        }
    }

    /// Starts queued transfers until the in-flight cap is reached.
    pub fn start_ready(&mut self, fetcher: &mut dyn TileFetcher) {
        while self.in_flight.len() < self.max_in_flight {
            let Some((_, _, url)) = self.queue.pop_next() else {
                break;
            };
            self.queued.remove(&url);
            self.in_flight.insert(url.clone());
            fetcher.fetch(&url);
        }
    }

    /// Frees the slot held by `url`. Returns `false` for completions the
    /// downloader never started (stale callbacks).
    pub fn complete(&mut self, url: &str) -> bool {
        self.in_flight.remove(url)
    }
}
