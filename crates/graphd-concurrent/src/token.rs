use parking_lot::{Condvar, Mutex};
use tracing::trace;

#[derive(Debug, Default)]
struct TokenState {
    held: bool,
    closed: bool,
}

/// Exclusive leadership shared by a pool of workers.
///
/// At most one [`Leadership`] guard exists at a time. Releasing it (by drop)
/// wakes exactly one waiting follower. Closing the token wakes every waiter
/// and makes later `acquire` calls return `None`.
#[derive(Debug, Default)]
pub struct LeaderToken {
    state: Mutex<TokenState>,
    handoff: Condvar,
}

/// Guard held by the current leader. Dropping it promotes one follower.
#[derive(Debug)]
pub struct Leadership<'a> {
    token: &'a LeaderToken,
}

impl LeaderToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Blocks until this caller becomes leader, or returns `None` once the
    /// token is closed.
    pub fn acquire(&self) -> Option<Leadership<'_>> {
        let mut state = self.state.lock();
        while state.held && !state.closed {
            self.handoff.wait(&mut state);
        }
        if state.closed {
            return None;
        }
        state.held = true;
        Some(Leadership { token: self })
    }

    pub fn close(&self) {
        self.state.lock().closed = true;
        self.handoff.notify_all();
    }

    fn release(&self) {
        self.state.lock().held = false;
        self.handoff.notify_one();
        trace!("leadership released");
    }
}

impl Leadership<'_> {
    /// Explicit hand-off; same as dropping the guard.
    pub fn release(self) {}
}

impl Drop for Leadership<'_> {
    fn drop(&mut self) {
        self.token.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn single_leader_at_a_time() {
        let token = Arc::new(LeaderToken::new());
        let leaders = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));

        let workers: Vec<_> = (0..8)
            .map(|_| {
                let (token, leaders, max_seen) = (token.clone(), leaders.clone(), max_seen.clone());
                thread::spawn(move || {
                    for _ in 0..50 {
                        let guard = token.acquire().unwrap();
                        let now = leaders.fetch_add(1, Ordering::SeqCst) + 1;
                        max_seen.fetch_max(now, Ordering::SeqCst);
                        thread::yield_now();
                        leaders.fetch_sub(1, Ordering::SeqCst);
                        drop(guard);
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }
        assert_eq!(max_seen.load(Ordering::SeqCst), 1);
        // every guard was dropped, so leadership is free again
        assert!(token.acquire().is_some());
    }

    #[test]
    fn release_promotes_a_waiter() {
        let token = Arc::new(LeaderToken::new());
        let guard = token.acquire().unwrap();

        let follower = {
            let token = token.clone();
            thread::spawn(move || token.acquire().is_some())
        };
        thread::sleep(Duration::from_millis(30));
        assert!(!follower.is_finished());
        guard.release();
        assert!(follower.join().unwrap());
    }

    #[test]
    fn close_wakes_waiters_with_none() {
        let token = Arc::new(LeaderToken::new());
        let guard = token.acquire().unwrap();
        let waiters: Vec<_> = (0..3)
            .map(|_| {
                let token = token.clone();
                thread::spawn(move || token.acquire().is_none())
            })
            .collect();
        thread::sleep(Duration::from_millis(30));
        token.close();
        for waiter in waiters {
            assert!(waiter.join().unwrap());
        }
        drop(guard);
        assert!(token.acquire().is_none());
    }
}
