//! Per-goal mutual exclusion.
//!
//! Commands that read a goal and then write it (toggle, partial update) hold
//! the goal's guard for the whole sequence. Guards for different goals are
//! independent.

use crate::model::goal::GoalId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, Weak};

/// Registry handing out one mutex per goal id.
///
/// Entries are weak, so a goal's slot disappears once no command holds it.
#[derive(Default)]
pub struct GoalLocks {
    slots: Mutex<HashMap<GoalId, Weak<Mutex<()>>>>,
}

impl GoalLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `f` while holding the guard for `goal_id`.
    pub fn with_goal<T>(&self, goal_id: GoalId, f: impl FnOnce() -> T) -> T {
        let slot = self.slot(goal_id);
        // The mutex guards `()`, so a panic in another holder leaves nothing
        // inconsistent behind it.
        let _guard = slot.lock().unwrap_or_else(PoisonError::into_inner);
        f()
    }

    /// Number of goals with a live slot.
    pub fn active_slots(&self) -> usize {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.values().filter(|slot| slot.strong_count() > 0).count()
    }

    fn slot(&self, goal_id: GoalId) -> Arc<Mutex<()>> {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.retain(|_, slot| slot.strong_count() > 0);

        if let Some(existing) = slots.get(&goal_id).and_then(Weak::upgrade) {
            return existing;
        }
        let fresh = Arc::new(Mutex::new(()));
        slots.insert(goal_id, Arc::downgrade(&fresh));
        fresh
    }
}

#[cfg(test)]
mod tests {
    use super::GoalLocks;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Barrier};
    use std::thread;
    use std::time::Duration;
    use uuid::Uuid;

    #[test]
    fn same_goal_is_serialized() {
        let locks = Arc::new(GoalLocks::new());
        let goal_id = Uuid::new_v4();
        let inside = Arc::new(AtomicUsize::new(0));
        let max_inside = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let locks = Arc::clone(&locks);
                let inside = Arc::clone(&inside);
                let max_inside = Arc::clone(&max_inside);
                thread::spawn(move || {
                    locks.with_goal(goal_id, || {
                        let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                        max_inside.fetch_max(now, Ordering::SeqCst);
                        thread::sleep(Duration::from_millis(5));
                        inside.fetch_sub(1, Ordering::SeqCst);
                    });
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(max_inside.load(Ordering::SeqCst), 1);
        assert_eq!(locks.active_slots(), 0);
    }

    #[test]
    fn different_goals_do_not_block_each_other() {
        let locks = Arc::new(GoalLocks::new());
        let barrier = Arc::new(Barrier::new(2));

        let handles: Vec<_> = (0..2)
            .map(|_| {
                let locks = Arc::clone(&locks);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    // Both threads must be inside their guard at once to pass
                    // the barrier.
                    locks.with_goal(Uuid::new_v4(), || {
                        barrier.wait();
                    });
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
    }
}
