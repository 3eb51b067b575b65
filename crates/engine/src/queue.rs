//! De-duplicating work queue with per item backoff and an overall token
//! bucket.
//!
//! An item is queued at most once. An item re-added while a worker holds it
//! is parked and queued again when that worker calls [`WorkQueue::done`], so
//! no two workers ever process the same item at the same time.

use common::config::{BackoffConfig, QueueConfig};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet, VecDeque};
use std::hash::Hash;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Notify;
use tracing::debug;

/// Longest a single token reservation may delay an item.
const MAX_RESERVE_WAIT: Duration = Duration::from_secs(3600);

#[derive(Debug)]
struct TokenBucket {
    rate_per_sec: f64,
    burst: f64,
    tokens: f64,
    last: Instant,
}

impl TokenBucket {
    fn new(cfg: &QueueConfig) -> Self {
        let burst = f64::from(cfg.burst.max(1));
        Self {
            rate_per_sec: cfg.rate_per_sec,
            burst,
            tokens: burst,
            last: Instant::now(),
        }
    }

    /// Takes one token, returning how long the caller has to wait for it.
    fn reserve(&mut self) -> Duration {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last).as_secs_f64();
        self.last = now;
        self.tokens = (self.tokens + elapsed * self.rate_per_sec).min(self.burst);
        self.tokens -= 1.0;
        if self.tokens >= 0.0 {
            Duration::ZERO
        } else {
            Duration::try_from_secs_f64(-self.tokens / self.rate_per_sec)
                .map_or(MAX_RESERVE_WAIT, |wait| wait.min(MAX_RESERVE_WAIT))
        }
    }
}

#[derive(Debug)]
struct State<T> {
    queue: VecDeque<T>,
    dirty: HashSet<T>,
    processing: HashSet<T>,
    failures: HashMap<T, u32>,
    bucket: TokenBucket,
    shutting_down: bool,
}

#[derive(Debug)]
pub struct WorkQueue<T> {
    state: Mutex<State<T>>,
    notify: Notify,
    backoff: BackoffConfig,
}

impl<T> WorkQueue<T>
where
    T: Clone + Eq + Hash + Send + Sync + std::fmt::Display + 'static,
{
    pub fn new(backoff: BackoffConfig, limits: &QueueConfig) -> Self {
        Self {
            state: Mutex::new(State {
                queue: VecDeque::new(),
                dirty: HashSet::new(),
                processing: HashSet::new(),
                failures: HashMap::new(),
                bucket: TokenBucket::new(limits),
                shutting_down: false,
            }),
            notify: Notify::new(),
            backoff,
        }
    }

    pub fn add(&self, item: T) {
        let mut s = self.state.lock();
        if s.shutting_down || !s.dirty.insert(item.clone()) {
            return;
        }
        if s.processing.contains(&item) {
            return;
        }
        s.queue.push_back(item);
        drop(s);
        self.notify.notify_one();
    }

    /// Adds `item` once `delay` has passed.
    pub fn add_after(self: &Arc<Self>, item: T, delay: Duration) {
        if delay.is_zero() {
            self.add(item);
            return;
        }
        let queue = Arc::clone(self);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            queue.add(item);
        });
    }

    /// Re-adds a failed item, waiting the longer of its own exponential
    /// backoff and the overall rate limit.
    pub fn add_rate_limited(self: &Arc<Self>, item: T) {
        let delay = {
            let mut s = self.state.lock();
            let failures = s.failures.entry(item.clone()).or_insert(0);
            let exp = *failures;
            *failures = failures.saturating_add(1);
            self.item_backoff(exp).max(s.bucket.reserve())
        };
        debug!(%item, delay_ms = delay.as_millis() as u64, "requeueing with backoff");
        self.add_after(item, delay);
    }

    fn item_backoff(&self, failures: u32) -> Duration {
        let factor = 2u64.saturating_pow(failures);
        let ms = self.backoff.base_ms.saturating_mul(factor).min(self.backoff.max_ms);
        Duration::from_millis(ms)
    }

    /// Clears the failure history of an item.
    pub fn forget(&self, item: &T) {
        self.state.lock().failures.remove(item);
    }

    pub fn num_requeues(&self, item: &T) -> u32 {
        self.state.lock().failures.get(item).copied().unwrap_or(0)
    }

    /// Waits for the next item. `None` once the queue is shut down.
    pub async fn get(&self) -> Option<T> {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            {
                let mut s = self.state.lock();
                if let Some(item) = s.queue.pop_front() {
                    s.dirty.remove(&item);
                    s.processing.insert(item.clone());
                    return Some(item);
                }
                if s.shutting_down {
                    return None;
                }
            }
            notified.await;
        }
    }

    /// Marks an item as no longer being processed.
    pub fn done(&self, item: &T) {
        let mut s = self.state.lock();
        s.processing.remove(item);
        if s.dirty.contains(item) {
            s.queue.push_back(item.clone());
            drop(s);
            self.notify.notify_one();
        }
    }

    /// Wakes every waiting worker; queued items are abandoned.
    pub fn shutdown(&self) {
        self.state.lock().shutting_down = true;
        self.notify.notify_waiters();
    }

    pub fn is_shutting_down(&self) -> bool {
        self.state.lock().shutting_down
    }

    pub fn len(&self) -> usize {
        self.state.lock().queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn queue() -> Arc<WorkQueue<String>> {
        Arc::new(WorkQueue::new(
            BackoffConfig {
                base_ms: 5,
                max_ms: 40,
            },
            &QueueConfig {
                rate_per_sec: 1000.0,
                burst: 100,
            },
        ))
    }

    #[tokio::test]
    async fn deduplicates_queued_items() {
        let q = queue();
        q.add("a".to_string());
        q.add("a".to_string());
        q.add("b".to_string());
        assert_eq!(q.len(), 2);
        assert_eq!(q.get().await.as_deref(), Some("a"));
        assert_eq!(q.get().await.as_deref(), Some("b"));
        assert!(q.is_empty());
    }

    #[tokio::test]
    async fn item_added_while_processing_waits_for_done() {
        let q = queue();
        q.add("a".to_string());
        let item = q.get().await.unwrap();

        q.add("a".to_string());
        assert!(q.is_empty());

        q.done(&item);
        assert_eq!(q.len(), 1);
        assert_eq!(q.get().await.as_deref(), Some("a"));
    }

    #[tokio::test]
    async fn backoff_doubles_up_to_max() {
        let q = queue();
        let delays: Vec<_> = (0..6).map(|n| q.item_backoff(n).as_millis()).collect();
        assert_eq!(delays, vec![5, 10, 20, 40, 40, 40]);

        q.add_rate_limited("a".to_string());
        q.add_rate_limited("a".to_string());
        assert_eq!(q.num_requeues(&"a".to_string()), 2);
        q.forget(&"a".to_string());
        assert_eq!(q.num_requeues(&"a".to_string()), 0);
    }

    #[tokio::test]
    async fn rate_limited_item_arrives_after_delay() {
        let q = queue();
        q.add_rate_limited("a".to_string());
        assert!(q.is_empty());
        let got = tokio::time::timeout(Duration::from_secs(2), q.get()).await.unwrap();
        assert_eq!(got.as_deref(), Some("a"));
    }

    #[tokio::test]
    async fn shutdown_releases_waiting_workers() {
        let q = queue();
        let waiter = {
            let q = Arc::clone(&q);
            tokio::spawn(async move { q.get().await })
        };
        tokio::task::yield_now().await;
        q.shutdown();
        assert_eq!(waiter.await.unwrap(), None);
        q.add("late".to_string());
        assert!(q.is_empty());
    }

    #[test]
    fn bucket_charges_beyond_burst() {
        let mut bucket = TokenBucket::new(&QueueConfig {
            rate_per_sec: 10.0,
            burst: 2,
        });
        assert_eq!(bucket.reserve(), Duration::ZERO);
        assert_eq!(bucket.reserve(), Duration::ZERO);
        let wait = bucket.reserve();
        assert!(wait > Duration::from_millis(50) && wait <= Duration::from_millis(100));
    }

    #[test]
    fn bucket_wait_is_capped_for_tiny_rates() {
        let mut bucket = TokenBucket::new(&QueueConfig {
            rate_per_sec: 1e-300,
            burst: 1,
        });
        assert_eq!(bucket.reserve(), Duration::ZERO);
        assert_eq!(bucket.reserve(), MAX_RESERVE_WAIT);
    }
}
