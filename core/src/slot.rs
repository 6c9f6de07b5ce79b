//! Bounded admission of concurrently running subprocesses.

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use tokio::sync::{AcquireError, OwnedSemaphorePermit, Semaphore};

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum SlotError {
    #[error("Number of concurrent jobs must be at least 1")]
    ZeroCapacity,

    #[error("Slot pool is closed")]
    Closed,
}

impl From<AcquireError> for SlotError {
    fn from(_: AcquireError) -> Self {
        SlotError::Closed
    }
}

#[derive(Debug, Clone)]
pub struct SlotPool {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    semaphore: Arc<Semaphore>,
    capacity: usize,
    running: AtomicUsize,
    peak: AtomicUsize,
}

/// A held slot. The slot returns to the pool when this is dropped.
#[derive(Debug)]
pub struct Slot {
    _permit: OwnedSemaphorePermit,
    pool: Arc<Inner>,
}

impl SlotPool {
    pub fn new(capacity: usize) -> Result<Self, SlotError> {
        if capacity == 0 {
            return Err(SlotError::ZeroCapacity);
        }
        Ok(Self {
            inner: Arc::new(Inner {
                semaphore: Arc::new(Semaphore::new(capacity)),
                capacity,
                running: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
            }),
        })
    }

    /// Waits until a slot is free.
    pub async fn acquire(&self) -> Result<Slot, SlotError> {
        let permit = self.inner.semaphore.clone().acquire_owned().await?;
        let running = self.inner.running.fetch_add(1, Ordering::AcqRel) + 1;
        self.inner.peak.fetch_max(running, Ordering::AcqRel);
        Ok(Slot {
            _permit: permit,
            pool: self.inner.clone(),
        })
    }

    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }

    /// Number of slots held right now.
    pub fn running(&self) -> usize {
        self.inner.running.load(Ordering::Acquire)
    }

    /// Highest number of slots ever held at once.
    pub fn peak(&self) -> usize {
        self.inner.peak.load(Ordering::Acquire)
    }
}

impl Drop for Slot {
    fn drop(&mut self) {
        // Runs before the permit is released.
        self.pool.running.fetch_sub(1, Ordering::AcqRel);
    }
}
