use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Monotonic change counter shared by a table and its plugin metas.
///
/// Anything that changes what derived state would compute to (a new
/// configuration, a resized or hidden column) bumps the counter; caches
/// remember the revision they were computed at and recompute when it moves.
#[derive(Debug, Clone, Default)]
pub struct Revision(Arc<AtomicU64>);

impl Revision {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Acquire)
    }

    /// Advances the counter and returns the new revision.
    pub fn bump(&self) -> u64 {
        self.0.fetch_add(1, Ordering::AcqRel) + 1
    }
}

/// A value computed at some revision.
#[derive(Debug)]
pub struct Memo<T> {
    slot: Mutex<Option<(u64, T)>>,
}

impl<T> Default for Memo<T> {
    fn default() -> Self {
        Self {
            slot: Mutex::new(None),
        }
    }
}

impl<T: Clone> Memo<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached value if it was computed at `revision`, otherwise
    /// runs `compute` (without holding the lock) and caches its result.
    pub fn get_or_try_compute<E>(
        &self,
        revision: u64,
        compute: impl FnOnce() -> Result<T, E>,
    ) -> Result<T, E> {
        {
            let slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some((at, value)) = slot.as_ref() {
                if *at == revision {
                    return Ok(value.clone());
                }
            }
        }
        let value = compute()?;
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) =
            Some((revision, value.clone()));
        Ok(value)
    }

    pub fn invalidate(&self) {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }

    pub fn is_cached_at(&self, revision: u64) -> bool {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|(at, _)| *at == revision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn clones_share_the_counter() {
        let rev = Revision::new();
        let other = rev.clone();
        assert_eq!(rev.bump(), 1);
        assert_eq!(other.get(), 1);
    }

    #[test]
    fn memo_recomputes_only_on_new_revision() {
        let memo = Memo::new();
        let calls = Cell::new(0);
        let compute = || {
            calls.set(calls.get() + 1);
            Ok::<_, ()>(calls.get())
        };

        assert_eq!(memo.get_or_try_compute(0, compute), Ok(1));
        assert_eq!(memo.get_or_try_compute(0, compute), Ok(1));
        assert_eq!(memo.get_or_try_compute(1, compute), Ok(2));
        assert!(memo.is_cached_at(1));

        memo.invalidate();
        assert!(!memo.is_cached_at(1));
    }

    #[test]
    fn memo_does_not_cache_errors() {
        let memo: Memo<u32> = Memo::new();
        assert_eq!(memo.get_or_try_compute(3, || Err("boom")), Err("boom"));
        assert!(!memo.is_cached_at(3));
    }
}
