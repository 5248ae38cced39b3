use super::super::super::{cache::*, configuration::*, key::*, response::*};

use {
    duration_str::*,
    parking_lot::Mutex,
    std::{collections::*, fmt, sync::Arc, time::Duration},
    tokio::time::Instant,
};

//
// MemoryCacheImplementation
//

/// In-memory cache implementation.
///
/// Bounded by [max_entries](CacheConfiguration::max_entries). Whenever an insertion would exceed
/// the bound we first purge expired entries (oldest first), and then evict the oldest entries until
/// we are back within the bound. Stale entries are otherwise evicted lazily when accessed.
///
/// Time is measured with [tokio's Instant](Instant), so it follows a paused test clock.
pub struct MemoryCacheImplementation<CoalesceKeyT = CommonCoalesceKey> {
    state: Arc<Mutex<MemoryCacheState<CoalesceKeyT>>>,
    configuration: CacheConfiguration,
}

struct MemoryCacheState<CoalesceKeyT> {
    entries: HashMap<CoalesceKeyT, MemoryCacheEntry>,

    // Insertion order (sequence -> key)
    order: BTreeMap<u64, CoalesceKeyT>,

    next_sequence: u64,
}

struct MemoryCacheEntry {
    captured_response: CapturedResponseRef,
    expires_at: Instant,
    sequence: u64,
}

impl<CoalesceKeyT> MemoryCacheImplementation<CoalesceKeyT>
where
    CoalesceKeyT: CoalesceKey,
{
    /// Constructor.
    pub fn new(configuration: CacheConfiguration) -> Self {
        Self {
            state: Arc::new(Mutex::new(MemoryCacheState {
                entries: HashMap::new(),
                order: BTreeMap::new(),
                next_sequence: 0,
            })),
            configuration,
        }
    }

    /// Configuration.
    pub fn configuration(&self) -> &CacheConfiguration {
        &self.configuration
    }

    /// Number of stored entries, including stale entries that have not yet been evicted.
    pub fn entry_count(&self) -> usize {
        self.state.lock().entries.len()
    }

    /// Whether the key has an entry, fresh or stale.
    pub fn contains(&self, key: &CoalesceKeyT) -> bool {
        self.state.lock().entries.contains_key(key)
    }

    fn get_fresh(&self, key: &CoalesceKeyT) -> Option<CapturedResponseRef> {
        let now = Instant::now();
        let mut state = self.state.lock();

        let stale = match state.entries.get(key) {
            Some(entry) if now < entry.expires_at => {
                return Some(entry.captured_response.clone());
            }
            Some(_) => true,
            None => false,
        };

        if stale {
            tracing::debug!("evict (stale): {}", key);
            state.remove(key);
        }

        None
    }

    fn insert(&self, key: CoalesceKeyT, captured_response: CapturedResponseRef) {
        let duration = captured_response.duration.unwrap_or(self.configuration.ttl);
        tracing::debug!("storing with duration: {}", duration.human_format());

        let now = Instant::now();
        let mut state = self.state.lock();

        state.remove(&key);

        let sequence = state.next_sequence;
        state.next_sequence += 1;
        state.order.insert(sequence, key.clone());
        state.entries.insert(
            key,
            MemoryCacheEntry {
                captured_response,
                expires_at: expires_at(now, duration),
                sequence,
            },
        );

        let max_entries = self.configuration.max_entries;
        if state.entries.len() > max_entries {
            state.purge_expired(now, max_entries);

            while state.entries.len() > max_entries {
                match state.order.pop_first() {
                    Some((_, key)) => {
                        tracing::debug!("evict (oldest): {}", key);
                        state.entries.remove(&key);
                    }

                    None => break,
                }
            }
        }
    }
}

// Saturates at about 30 years, like tokio's own far-future instants.
fn expires_at(now: Instant, duration: Duration) -> Instant {
    now.checked_add(duration)
        .unwrap_or_else(|| now + Duration::from_secs(86400 * 365 * 30))
}

impl<CoalesceKeyT> MemoryCacheState<CoalesceKeyT>
where
    CoalesceKeyT: CoalesceKey,
{
    fn remove(&mut self, key: &CoalesceKeyT) {
        if let Some(entry) = self.entries.remove(key) {
            self.order.remove(&entry.sequence);
        }
    }

    // Oldest first, stopping as soon as we are within the bound.
    fn purge_expired(&mut self, now: Instant, max_entries: usize) {
        let mut remaining = self.entries.len();
        let mut expired = Vec::new();

        for (sequence, key) in &self.order {
            if remaining <= max_entries {
                break;
            }

            if self
                .entries
                .get(key)
                .is_some_and(|entry| entry.expires_at <= now)
            {
                expired.push(*sequence);
                remaining -= 1;
            }
        }

        for sequence in expired {
            if let Some(key) = self.order.remove(&sequence) {
                tracing::debug!("evict (expired): {}", key);
                self.entries.remove(&key);
            }
        }
    }
}

impl<CoalesceKeyT> Cache<CoalesceKeyT> for MemoryCacheImplementation<CoalesceKeyT>
where
    CoalesceKeyT: CoalesceKey,
{
    async fn get(&self, key: &CoalesceKeyT) -> Option<CapturedResponseRef> {
        self.get_fresh(key)
    }

    async fn put(&self, key: CoalesceKeyT, captured_response: CapturedResponseRef) {
        self.insert(key, captured_response)
    }

    async fn invalidate(&self, key: &CoalesceKeyT) {
        self.state.lock().remove(key)
    }

    async fn invalidate_all(&self) {
        let mut state = self.state.lock();
        state.entries.clear();
        state.order.clear();
    }
}

impl<CoalesceKeyT> Clone for MemoryCacheImplementation<CoalesceKeyT> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
            configuration: self.configuration,
        }
    }
}

impl<CoalesceKeyT> Default for MemoryCacheImplementation<CoalesceKeyT>
where
    CoalesceKeyT: CoalesceKey,
{
    fn default() -> Self {
        Self::new(Default::default())
    }
}

impl<CoalesceKeyT> fmt::Debug for MemoryCacheImplementation<CoalesceKeyT> {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter
            .debug_struct("MemoryCacheImplementation")
            .field("entry_count", &self.state.lock().entries.len())
            .field("configuration", &self.configuration)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        bytes::*,
        http::{Method, Response, Uri},
    };

    fn key(path: &str) -> CommonCoalesceKey {
        let uri: Uri = path.parse().unwrap();
        CommonCoalesceKey::for_request(&Method::GET, &uri, &Default::default(), &Default::default())
    }

    fn captured(body: &'static str, duration: Option<Duration>) -> CapturedResponseRef {
        let (parts, _) = Response::new(()).into_parts();
        let mut captured_response = CapturedResponse::new(parts, Bytes::from_static(body.as_bytes()));
        captured_response.duration = duration;
        Arc::new(captured_response)
    }

    #[tokio::test(start_paused = true)]
    async fn expires_after_ttl() {
        let cache = MemoryCacheImplementation::default();
        let key = key("/api/posts/");

        cache.put(key.clone(), captured("posts", None)).await;
        assert!(cache.get(&key).await.is_some());

        tokio::time::advance(Duration::from_millis(1999)).await;
        assert!(cache.get(&key).await.is_some());

        tokio::time::advance(Duration::from_millis(1)).await;
        assert!(cache.get(&key).await.is_none());
        assert!(!cache.contains(&key));
    }

    #[tokio::test(start_paused = true)]
    async fn never_exceeds_max_entries() {
        let cache = MemoryCacheImplementation::new(CacheConfiguration::new(
            Duration::from_secs(60),
            3,
        ));

        for index in 0..10 {
            cache
                .put(key(&format!("/api/clubs/{}/", index)), captured("club", None))
                .await;
            assert!(cache.entry_count() <= 3);
        }

        // Oldest were evicted
        assert!(cache.get(&key("/api/clubs/6/")).await.is_none());
        for index in 7..10 {
            assert!(cache.get(&key(&format!("/api/clubs/{}/", index))).await.is_some());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn evicts_expired_before_oldest() {
        let cache = MemoryCacheImplementation::new(CacheConfiguration::new(
            Duration::from_secs(60),
            3,
        ));

        cache.put(key("/a"), captured("a", None)).await;
        cache
            .put(key("/b"), captured("b", Some(Duration::from_millis(10))))
            .await;
        cache.put(key("/c"), captured("c", None)).await;

        tokio::time::advance(Duration::from_millis(20)).await;
        cache.put(key("/d"), captured("d", None)).await;

        assert_eq!(cache.entry_count(), 3);
        assert!(cache.contains(&key("/a")));
        assert!(!cache.contains(&key("/b")));
        assert!(cache.contains(&key("/c")));
        assert!(cache.contains(&key("/d")));
    }

    #[tokio::test]
    async fn replacing_an_entry_does_not_grow() {
        let cache = MemoryCacheImplementation::new(CacheConfiguration::new(
            Duration::from_secs(60),
            2,
        ));

        cache.put(key("/a"), captured("first", None)).await;
        cache.put(key("/a"), captured("second", None)).await;
        cache.put(key("/b"), captured("b", None)).await;

        assert_eq!(cache.entry_count(), 2);
        assert_eq!(
            cache.get(&key("/a")).await.unwrap().body,
            Bytes::from_static(b"second")
        );
    }

    #[tokio::test]
    async fn invalidates() {
        let cache = MemoryCacheImplementation::default();

        cache.put(key("/a"), captured("a", None)).await;
        cache.put(key("/b"), captured("b", None)).await;

        cache.invalidate(&key("/a")).await;
        assert!(cache.get(&key("/a")).await.is_none());
        assert!(cache.get(&key("/b")).await.is_some());

        cache.invalidate_all().await;
        assert_eq!(cache.entry_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn huge_durations_saturate() {
        let cache = MemoryCacheImplementation::default();

        cache.put(key("/forever"), captured("forever", Some(Duration::MAX))).await;

        tokio::time::advance(Duration::from_secs(86400 * 365)).await;
        assert!(cache.get(&key("/forever")).await.is_some());
    }
}
