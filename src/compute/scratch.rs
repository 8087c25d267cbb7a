//! Per-worker accumulation buffers.

use std::ops::AddAssign;
use std::sync::{Mutex, PoisonError};

/// One lazily allocated, zero-initialized buffer per worker thread.
///
/// Slots `0..workers` belong to the rayon workers with those thread indices;
/// one extra slot serves every other caller (threads outside the pool). A slot's
/// buffer is allocated on the first [`ScratchPool::with`] from that worker and
/// lives until [`ScratchPool::resize`] or drop.
#[derive(Debug)]
pub struct ScratchPool<T> {
    slots: Vec<Mutex<Option<Vec<T>>>>,
    workers: usize,
    len: usize,
}

impl<T: Default + Clone + Send> ScratchPool<T> {
    pub fn new(workers: usize, len: usize) -> Self {
        Self {
            slots: (0..=workers).map(|_| Mutex::new(None)).collect(),
            workers,
            len,
        }
    }

    /// Length of every buffer handed out.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Worker slots, excluding the overflow slot.
    #[inline]
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Run `f` on the calling worker's buffer, allocating it on first use.
    ///
    /// `f` must not re-enter rayon: a stolen task on the same worker would wait
    /// on the slot this call holds.
    pub fn with<R>(&self, f: impl FnOnce(&mut [T]) -> R) -> R {
        let slot = rayon::current_thread_index()
            .filter(|&i| i < self.workers)
            .unwrap_or(self.workers);
        let mut guard = self.slots[slot]
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let len = self.len;
        let buf = guard.get_or_insert_with(|| vec![T::default(); len]);
        f(buf)
    }

    /// Change the buffer length, discarding every existing buffer.
    pub fn resize(&mut self, len: usize) {
        self.len = len;
        for slot in &mut self.slots {
            *slot.get_mut().unwrap_or_else(PoisonError::into_inner) = None;
        }
    }

    /// Number of buffers allocated so far.
    pub fn materialized(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| slot.lock().unwrap_or_else(PoisonError::into_inner).is_some())
            .count()
    }

    /// Element-wise sum of every allocated buffer into `out`.
    ///
    /// # Panics
    /// If `out.len() != self.len()`.
    pub fn reduce_into(&self, out: &mut [T])
    where
        T: AddAssign + Copy,
    {
        assert_eq!(out.len(), self.len, "reduce_into: output length mismatch");
        for slot in &self.slots {
            let guard = slot.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(buf) = guard.as_ref() {
                for (acc, &v) in out.iter_mut().zip(buf.iter()) {
                    *acc += v;
                }
            }
        }
    }
}
