//! # Counting limiter for concurrently running commands.
//!
//! Wraps [`tokio::sync::Semaphore`] with the runner's sentinel semantics:
//! - `capacity <= 0` → unlimited, `acquire` never suspends
//! - `capacity = n`  → at most `n` units outstanding
//!
//! Units are returned when the [`Permit`] is dropped, so every release is paired
//! with the acquire that produced it. Waiters are not served in any guaranteed order.

use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore as TokioSemaphore};

#[derive(Clone, Debug)]
pub struct Semaphore {
    inner: Option<Arc<TokioSemaphore>>,
    capacity: usize,
}

/// Reserved units; released on drop.
#[derive(Debug)]
#[must_use = "units are released as soon as the permit is dropped"]
pub struct Permit {
    _inner: Option<OwnedSemaphorePermit>,
}

impl Permit {
    /// Returns the units to the semaphore.
    #[inline]
    pub fn release(self) {}
}

impl Semaphore {
    /// Creates a limiter with `n` units; `n <= 0` means unlimited.
    pub fn new(n: i64) -> Self {
        if n <= 0 {
            return Self::unlimited();
        }
        let n = usize::try_from(n)
            .unwrap_or(usize::MAX)
            .min(TokioSemaphore::MAX_PERMITS);
        Self {
            inner: Some(Arc::new(TokioSemaphore::new(n))),
            capacity: n,
        }
    }

    pub fn unlimited() -> Self {
        Self {
            inner: None,
            capacity: 0,
        }
    }

    #[inline]
    pub fn is_unlimited(&self) -> bool {
        self.inner.is_none()
    }

    /// Total units, or `None` when unlimited.
    pub fn capacity(&self) -> Option<usize> {
        self.inner.as_ref().map(|_| self.capacity)
    }

    /// Units currently free, or `None` when unlimited.
    pub fn available(&self) -> Option<usize> {
        self.inner.as_ref().map(|s| s.available_permits())
    }

    /// Suspends until `k` units are free, then reserves them.
    ///
    /// Asking for more units than the capacity never completes.
    pub async fn acquire(&self, k: u32) -> Permit {
        let Some(sem) = &self.inner else {
            return Permit { _inner: None };
        };
        // The semaphore is never closed, so acquisition only fails if that changes.
        let permit = Arc::clone(sem).acquire_many_owned(k).await.ok();
        Permit { _inner: permit }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn zero_and_negative_are_unlimited() {
        for n in [0, -1, -100] {
            let sem = Semaphore::new(n);
            assert!(sem.is_unlimited());
            assert_eq!(sem.available(), None);
            assert_eq!(sem.capacity(), None);

            let permits: Vec<Permit> = acquire_n(&sem, 64).await;
            assert_eq!(permits.len(), 64);
        }
    }

    async fn acquire_n(sem: &Semaphore, n: usize) -> Vec<Permit> {
        let mut out = Vec::with_capacity(n);
        for _ in 0..n {
            out.push(sem.acquire(1).await);
        }
        out
    }

    #[tokio::test]
    async fn drop_releases_units() {
        let sem = Semaphore::new(2);
        assert_eq!(sem.capacity(), Some(2));
        let a = sem.acquire(1).await;
        let b = sem.acquire(1).await;
        assert_eq!(sem.available(), Some(0));

        drop(a);
        assert_eq!(sem.available(), Some(1));
        b.release();
        assert_eq!(sem.available(), Some(2));
    }

    #[tokio::test]
    async fn acquire_many_reserves_k_units() {
        let sem = Semaphore::new(3);
        let p = sem.acquire(2).await;
        assert_eq!(sem.available(), Some(1));
        drop(p);
        assert_eq!(sem.available(), Some(3));
    }

    #[tokio::test(start_paused = true)]
    async fn acquire_blocks_while_exhausted() {
        let sem = Semaphore::new(1);
        let held = sem.acquire(1).await;

        let waiter = {
            let sem = sem.clone();
            tokio::spawn(async move {
                let _p = sem.acquire(1).await;
            })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!waiter.is_finished());

        drop(held);
        waiter.await.unwrap();
        assert_eq!(sem.available(), Some(1));
    }
}
