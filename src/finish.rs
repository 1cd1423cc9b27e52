/// One-shot "race complete" latch.
///
/// Evaluated after every change to the finish set: when the set is non-empty
/// and every participant reports finished, the callback runs exactly once and
/// the coordinator latches. Re-renders and repeated evaluations must never
/// fire it again; a duplicate would replay the finish celebration or double a
/// persistence write.
pub struct FinishCoordinator {
    callback: Option<Box<dyn FnOnce() + Send>>,
    fired: bool,
}

impl std::fmt::Debug for FinishCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FinishCoordinator")
            .field("armed", &self.callback.is_some())
            .field("fired", &self.fired)
            .finish()
    }
}

impl FinishCoordinator {
    pub fn new(callback: impl FnOnce() + Send + 'static) -> Self {
        Self {
            callback: Some(Box::new(callback)),
            fired: false,
        }
    }

    /// An unarmed coordinator that only tracks the latch state.
    pub fn unarmed() -> Self {
        Self {
            callback: None,
            fired: false,
        }
    }

    pub fn has_fired(&self) -> bool {
        self.fired
    }

    /// Re-evaluates the finish flags. Returns true on the single evaluation
    /// that transitions from "not all finished" to "all finished".
    pub fn evaluate<I>(&mut self, finished_flags: I) -> bool
    where
        I: IntoIterator<Item = bool>,
    {
        if self.fired {
            return false;
        }
        let mut any = false;
        for flag in finished_flags {
            if !flag {
                return false;
            }
            any = true;
        }
        if !any {
            return false;
        }
        self.fired = true;
        if let Some(callback) = self.callback.take() {
            callback();
        }
        true
    }

    /// Unlatches and installs a fresh callback (used on race reset).
    pub fn rearm(&mut self, callback: impl FnOnce() + Send + 'static) {
        self.callback = Some(Box::new(callback));
        self.fired = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counting() -> (FinishCoordinator, Arc<AtomicUsize>) {
        let count = Arc::new(AtomicUsize::new(0));
        let c2 = count.clone();
        (
            FinishCoordinator::new(move || {
                c2.fetch_add(1, Ordering::SeqCst);
            }),
            count,
        )
    }

    #[test]
    fn fires_exactly_once_when_all_finish() {
        let (mut coord, count) = counting();
        assert!(!coord.evaluate([true, false]));
        assert!(coord.evaluate([true, true]));
        assert_eq!(count.load(Ordering::SeqCst), 1);
        // Repeated evaluations with an unchanged finish set stay latched
        for _ in 0..10 {
            assert!(!coord.evaluate([true, true]));
        }
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(coord.has_fired());
    }

    #[test]
    fn empty_set_never_fires() {
        let (mut coord, count) = counting();
        assert!(!coord.evaluate(std::iter::empty()));
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn rearm_allows_a_second_race() {
        let (mut coord, count) = counting();
        coord.evaluate([true]);
        assert_eq!(count.load(Ordering::SeqCst), 1);

        let c2 = count.clone();
        coord.rearm(move || {
            c2.fetch_add(1, Ordering::SeqCst);
        });
        assert!(!coord.has_fired());
        assert!(coord.evaluate([true, true]));
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn undo_after_fire_does_not_refire() {
        // The latch holds even if a flag flips back and forth afterwards.
        let (mut coord, count) = counting();
        coord.evaluate([true, true]);
        assert!(!coord.evaluate([true, false]));
        assert!(!coord.evaluate([true, true]));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
