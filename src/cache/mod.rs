//! Metadata cache
//!
//! Holds the single authoritative [`Snapshot`] of the corpus for the lifetime
//! of a process. Readers load the current snapshot lock-free; builds go
//! through one async gate so that concurrent first callers share a single
//! load pass.

mod snapshot;

pub use snapshot::Snapshot;

use arc_swap::ArcSwapOption;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::content::LoadOutcome;
use crate::error::BuildError;

/// Something that can produce the corpus, normally [`crate::content::ContentLoader`]
pub trait PostSource: Send + Sync + 'static {
    fn load(&self) -> Result<LoadOutcome, BuildError>;
}

/// Lifecycle of the cache, for diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheState {
    Uninitialized,
    Building,
    Ready,
    /// A snapshot is installed but `invalidate()` was called since it was built
    Stale,
}

/// Memoized view of the corpus
pub struct MetadataCache {
    inner: Arc<Inner>,
}

struct Inner {
    source: Arc<dyn PostSource>,
    current: ArcSwapOption<Snapshot>,
    build_gate: Mutex<()>,
    building: AtomicBool,
    /// Bumped by `invalidate()`; a snapshot is fresh while its generation matches
    generation: AtomicU64,
}

impl MetadataCache {
    pub fn new<S: PostSource>(source: S) -> Self {
        Self::with_source(Arc::new(source))
    }

    pub fn with_source(source: Arc<dyn PostSource>) -> Self {
        Self {
            inner: Arc::new(Inner {
                source,
                current: ArcSwapOption::empty(),
                build_gate: Mutex::new(()),
                building: AtomicBool::new(false),
                generation: AtomicU64::new(0),
            }),
        }
    }

    /// Currently installed snapshot, stale or not. `None` until the first
    /// build completes.
    pub fn snapshot(&self) -> Option<Arc<Snapshot>> {
        self.inner.current.load_full()
    }

    /// Return a fresh snapshot, building it first if needed.
    ///
    /// At most one build runs at a time. Callers that arrive while a build is
    /// in flight wait for it and reuse its result. The build itself runs in
    /// its own task, so a caller that gives up waiting neither aborts it nor
    /// lets a second build start. On failure nothing is installed and any
    /// previous snapshot stays in place.
    pub async fn ensure_built(&self) -> Result<Arc<Snapshot>, BuildError> {
        if let Some(snapshot) = self.inner.fresh_snapshot() {
            return Ok(snapshot);
        }

        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move { inner.build().await })
            .await
            .map_err(|e| BuildError::Task(e.to_string()))?
    }

    /// Mark the current snapshot stale; the next `ensure_built()` rebuilds
    pub fn invalidate(&self) {
        let generation = self.inner.generation.fetch_add(1, Ordering::AcqRel) + 1;
        tracing::debug!("Post cache invalidated (generation {})", generation);
    }

    pub fn state(&self) -> CacheState {
        if self.inner.building.load(Ordering::Acquire) {
            return CacheState::Building;
        }
        let generation = self.inner.generation.load(Ordering::Acquire);
        match &*self.inner.current.load() {
            None => CacheState::Uninitialized,
            Some(s) if s.generation() == generation => CacheState::Ready,
            Some(_) => CacheState::Stale,
        }
    }
}

impl Inner {
    fn fresh_snapshot(&self) -> Option<Arc<Snapshot>> {
        let generation = self.generation.load(Ordering::Acquire);
        self.current
            .load_full()
            .filter(|s| s.generation() == generation)
    }

    /// Load and install a snapshot unless one became fresh while waiting
    async fn build(&self) -> Result<Arc<Snapshot>, BuildError> {
        let _gate = self.build_gate.lock().await;
        if let Some(snapshot) = self.fresh_snapshot() {
            tracing::debug!("Reusing snapshot built by a concurrent caller");
            return Ok(snapshot);
        }

        let generation = self.generation.load(Ordering::Acquire);
        let source = Arc::clone(&self.source);
        let start = std::time::Instant::now();

        self.building.store(true, Ordering::Release);
        let _building = BuildingFlag(&self.building);

        let outcome = tokio::task::spawn_blocking(move || source.load())
            .await
            .map_err(|e| BuildError::Task(e.to_string()))??;

        let snapshot = Arc::new(Snapshot::new(outcome, generation));
        self.current.store(Some(Arc::clone(&snapshot)));

        tracing::info!(
            "Built post cache: {} posts, {} excluded, in {:.2}s",
            snapshot.len(),
            snapshot.errors().len(),
            start.elapsed().as_secs_f64()
        );

        Ok(snapshot)
    }
}

/// Clears the building flag however the build ends
struct BuildingFlag<'a>(&'a AtomicBool);

impl Drop for BuildingFlag<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{Post, PostMetadata};
    use chrono::{TimeZone, Utc};
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    fn post(slug: &str) -> Post {
        let created = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        Post {
            meta: PostMetadata {
                slug: slug.to_string(),
                title: slug.to_string(),
                summary: String::new(),
                created,
                updated: created,
                tags: Vec::new(),
                image: None,
                caption: None,
                reading_time: "1 min read".to_string(),
                word_count: 0,
            },
            content: String::new(),
        }
    }

    /// Counts load passes; fails every pass after `fail_after` successes
    struct CountingSource {
        loads: Arc<AtomicUsize>,
        delay: Duration,
        fail_after: Option<usize>,
    }

    impl CountingSource {
        fn new(loads: Arc<AtomicUsize>) -> Self {
            Self {
                loads,
                delay: Duration::ZERO,
                fail_after: None,
            }
        }
    }

    impl PostSource for CountingSource {
        fn load(&self) -> Result<LoadOutcome, BuildError> {
            let n = self.loads.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(self.delay);
            if self.fail_after.is_some_and(|limit| n >= limit) {
                return Err(BuildError::ContentRootMissing("gone".into()));
            }
            Ok(LoadOutcome {
                posts: vec![post(&format!("post-{}", n))],
                errors: Vec::new(),
            })
        }
    }

    #[tokio::test]
    async fn test_ensure_built_is_idempotent() {
        let loads = Arc::new(AtomicUsize::new(0));
        let cache = MetadataCache::new(CountingSource::new(loads.clone()));
        assert_eq!(cache.state(), CacheState::Uninitialized);
        assert!(cache.snapshot().is_none());

        let first = cache.ensure_built().await.unwrap();
        let second = cache.ensure_built().await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(loads.load(Ordering::SeqCst), 1);
        assert_eq!(cache.state(), CacheState::Ready);
    }

    #[tokio::test]
    async fn test_invalidate_triggers_rebuild() {
        let loads = Arc::new(AtomicUsize::new(0));
        let cache = MetadataCache::new(CountingSource::new(loads.clone()));

        let first = cache.ensure_built().await.unwrap();
        cache.invalidate();
        assert_eq!(cache.state(), CacheState::Stale);
        // The stale snapshot stays readable until the rebuild
        assert!(Arc::ptr_eq(&first, &cache.snapshot().unwrap()));

        let second = cache.ensure_built().await.unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(second.posts()[0].slug(), "post-1");
        assert_eq!(loads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_first_calls_coalesce() {
        let loads = Arc::new(AtomicUsize::new(0));
        let source = CountingSource {
            loads: loads.clone(),
            delay: Duration::from_millis(50),
            fail_after: None,
        };
        let cache = Arc::new(MetadataCache::new(source));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let cache = Arc::clone(&cache);
                tokio::spawn(async move { cache.ensure_built().await })
            })
            .collect();

        let mut snapshots = Vec::new();
        for handle in handles {
            snapshots.push(handle.await.unwrap().unwrap());
        }

        assert_eq!(loads.load(Ordering::SeqCst), 1);
        assert!(snapshots.iter().all(|s| Arc::ptr_eq(s, &snapshots[0])));
    }

    fn slow_source(loads: &Arc<AtomicUsize>, delay_ms: u64) -> CountingSource {
        CountingSource {
            loads: Arc::clone(loads),
            delay: Duration::from_millis(delay_ms),
            fail_after: None,
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_cancelled_caller_does_not_start_second_build() {
        let loads = Arc::new(AtomicUsize::new(0));
        let cache = Arc::new(MetadataCache::new(slow_source(&loads, 300)));

        let first = {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move { cache.ensure_built().await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        let second = {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move { cache.ensure_built().await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        first.abort();
        let snapshot = second.await.unwrap().unwrap();

        assert_eq!(loads.load(Ordering::SeqCst), 1);
        assert_eq!(snapshot.posts()[0].slug(), "post-0");
        assert_eq!(cache.state(), CacheState::Ready);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_cancelled_sole_caller_still_installs() {
        let loads = Arc::new(AtomicUsize::new(0));
        let cache = Arc::new(MetadataCache::new(slow_source(&loads, 100)));

        let caller = {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move { cache.ensure_built().await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        caller.abort();

        // Waits on the in-flight build rather than starting another
        cache.ensure_built().await.unwrap();
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_invalidate_during_build_leaves_stale() {
        let loads = Arc::new(AtomicUsize::new(0));
        let cache = Arc::new(MetadataCache::new(slow_source(&loads, 200)));

        let build = {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move { cache.ensure_built().await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(cache.state(), CacheState::Building);
        cache.invalidate();

        // The in-flight result is installed but does not count as fresh
        build.await.unwrap().unwrap();
        assert_eq!(cache.state(), CacheState::Stale);

        let rebuilt = cache.ensure_built().await.unwrap();
        assert_eq!(rebuilt.posts()[0].slug(), "post-1");
        assert_eq!(loads.load(Ordering::SeqCst), 2);
        assert_eq!(cache.state(), CacheState::Ready);
    }

    #[tokio::test]
    async fn test_failed_rebuild_keeps_previous_snapshot() {
        let loads = Arc::new(AtomicUsize::new(0));
        let source = CountingSource {
            loads: loads.clone(),
            delay: Duration::ZERO,
            fail_after: Some(1),
        };
        let cache = MetadataCache::new(source);

        let first = cache.ensure_built().await.unwrap();
        cache.invalidate();

        let err = cache.ensure_built().await.unwrap_err();
        assert!(matches!(err, BuildError::ContentRootMissing(_)));
        assert!(Arc::ptr_eq(&first, &cache.snapshot().unwrap()));
        assert_eq!(cache.state(), CacheState::Stale);
    }

    #[tokio::test]
    async fn test_failed_first_build_stays_uninitialized() {
        let loads = Arc::new(AtomicUsize::new(0));
        let source = CountingSource {
            loads: loads.clone(),
            delay: Duration::ZERO,
            fail_after: Some(0),
        };
        let cache = MetadataCache::new(source);

        assert!(cache.ensure_built().await.is_err());
        assert!(cache.snapshot().is_none());
        assert_eq!(cache.state(), CacheState::Uninitialized);

        // Failures are not memoized
        assert!(cache.ensure_built().await.is_err());
        assert_eq!(loads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_empty_corpus_is_ready() {
        struct EmptySource;
        impl PostSource for EmptySource {
            fn load(&self) -> Result<LoadOutcome, BuildError> {
                Ok(LoadOutcome::default())
            }
        }

        let cache = MetadataCache::new(EmptySource);
        let snapshot = cache.ensure_built().await.unwrap();
        assert!(snapshot.is_empty());
        assert_eq!(cache.state(), CacheState::Ready);
    }
}
