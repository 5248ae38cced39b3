use super::{
    coalesce::{implementation::memory::*, middleware::*, *},
    service::*,
};

use {
    std::{sync::Arc, time::Duration},
    tower::Layer,
};

//
// CoalescingLayer
//

/// HTTP request coalescing layer.
///
/// This layer configures and installs a [CoalescingService] in front of an HTTP client service.
/// When several parts of an application independently request the same resource at about the same
/// time, only one request reaches the inner service and everybody gets an equivalent response.
/// Very recent identical responses are served from a short-lived cache.
///
/// The cache and coalescing key implementations are provided as generic type parameters. The
/// [MemoryCacheImplementation] and [CommonCoalesceKey] implementations should suffice for common
/// use cases. See [with_memory_cache](Self::with_memory_cache).
///
/// The layer owns the in-flight registry: all services installed by the same layer (and all their
/// clones) coalesce together. Construct it once and share it.
///
/// Requirements
/// ============
///
/// The inner service's error and its response body's error must both convert into
/// [CapturedError]. Bodies of coalesced responses are always [CoalescedBody::Captured] and bodies
/// of bypassed responses are always [CoalescedBody::Upstream].
///
/// Usage notes
/// ===========
///
/// 1. Only GET requests are coalesced. All other methods are forwarded as is, exactly once per
///    call: deduplicating side-effecting calls would silently drop or duplicate them. You can
///    additionally exclude GET requests via the [coalescable_by_request](Self::coalescable_by_request)
///    hook.
///
/// 2. Requests are identical when their [CoalesceKey]s are equal. For [CommonCoalesceKey] that is
///    when they have the same method, target URI (including the query), [Credentials] (a request
///    extension), and headers, irrespective of header order or header name case.
///
/// 3. We coalesce the transport, not business-logic success. Error statuses such as 404 or 500 are
///    shared and cached like any other response. Provide a
///    [cacheable_by_response](Self::cacheable_by_response) hook if they should not be cached.
///    (They will still be shared among callers attached to the same in-flight call.)
///
/// 4. Transport failures (the inner service's errors, or a failure to read the upstream body)
///    are handed to every attached caller as a [TransportError] and are never cached. We never
///    retry.
///
/// 5. Cached entries may be up to the cache's TTL stale. You can set a per-response duration via
///    the [cache_duration](Self::cache_duration) hook.
///
/// Request handling
/// ================
///
/// 1. A request arrives. If it is not coalescable then it is passed to the inner service and the
///    upstream response is returned unmodified. END.
///
/// 2. Compute the coalescing key.
///
/// 3. If the cache has a fresh entry for the key then respond with a copy of it. END. (Stale
///    entries are evicted and treated as a miss.)
///
/// 4. If there is an in-flight call for the key then attach to it, wait for it to settle, and
///    respond with a copy of its result. END.
///
/// 5. Otherwise dispatch a new call and register it as in-flight. The call reads the entire
///    upstream response body into memory. When it settles:
///
///    1. On success, store the captured response in the cache (unless the
///       [cacheable_by_response](Self::cacheable_by_response) hook says otherwise).
///
///    2. Either way, remove the in-flight entry. Storing happens first, so that callers arriving
///       after the call has settled find the cache entry.
///
/// 6. Respond with a copy of the result. END.
///
/// Every response body is an independent copy: reading it never affects what other callers read.
/// Copies are cheap as they share the same immutable bytes.
///
/// Dispatched calls run as their own tasks (which requires a Tokio runtime), so they always settle,
/// even if every caller that was waiting for them has gone away. Their results are then still
/// stored in the cache.
pub struct CoalescingLayer<CacheT, CoalesceKeyT = CommonCoalesceKey>
where
    CacheT: Cache<CoalesceKeyT>,
    CoalesceKeyT: CoalesceKey,
{
    coalescing: MiddlewareCoalescingConfiguration<CacheT>,
    in_flight: InFlight<CoalesceKeyT>,
}

impl<CacheT, CoalesceKeyT> CoalescingLayer<CacheT, CoalesceKeyT>
where
    CacheT: Cache<CoalesceKeyT>,
    CoalesceKeyT: CoalesceKey,
{
    /// Enable cache.
    ///
    /// Not enabled by default, in which case we only coalesce in-flight requests.
    pub fn cache(mut self, cache: CacheT) -> Self {
        self.coalescing.cache = Some(cache);
        self
    }

    /// Provide a hook to test whether a GET request is coalescable.
    ///
    /// Non-coalescable requests bypass both coalescing and caching.
    ///
    /// [None] by default.
    pub fn coalescable_by_request(
        mut self,
        coalescable_by_request: impl Fn(CoalescableHookContext) -> bool + 'static + Send + Sync,
    ) -> Self {
        self.coalescing.coalescable_by_request = Some(Arc::new(Box::new(coalescable_by_request)));
        self
    }

    /// Provide a hook to test whether a captured response is cacheable.
    ///
    /// Note that the headers are *response* headers.
    ///
    /// [None] by default, meaning that all responses are cacheable.
    pub fn cacheable_by_response(
        mut self,
        cacheable_by_response: impl Fn(CacheableHookContext) -> bool + 'static + Send + Sync,
    ) -> Self {
        self.coalescing.cacheable_by_response = Some(Arc::new(Box::new(cacheable_by_response)));
        self
    }

    /// Provide a hook to get a captured response's cache duration.
    ///
    /// Returning [None] means the cache's default TTL.
    ///
    /// [None] by default.
    pub fn cache_duration(
        mut self,
        cache_duration: impl Fn(CacheDurationHookContext) -> Option<Duration> + 'static + Send + Sync,
    ) -> Self {
        self.coalescing.cache_duration = Some(Arc::new(Box::new(cache_duration)));
        self
    }

    /// In-flight registry.
    pub fn in_flight(&self) -> &InFlight<CoalesceKeyT> {
        &self.in_flight
    }

    /// Forget all in-flight calls and invalidate the cache.
    pub async fn clear(&self) {
        self.in_flight.clear();
        if let Some(cache) = &self.coalescing.cache {
            cache.invalidate_all().await;
        }
    }
}

impl CoalescingLayer<MemoryCacheImplementation> {
    /// Constructor with a [MemoryCacheImplementation] and [CommonCoalesceKey].
    ///
    /// For other key types use [default](Self::default) with [cache](Self::cache).
    pub fn with_memory_cache(configuration: CacheConfiguration) -> Self {
        Self::default().cache(MemoryCacheImplementation::new(configuration))
    }
}

impl<CacheT, CoalesceKeyT> Default for CoalescingLayer<CacheT, CoalesceKeyT>
where
    CacheT: Cache<CoalesceKeyT>,
    CoalesceKeyT: CoalesceKey,
{
    fn default() -> Self {
        Self {
            coalescing: Default::default(),
            in_flight: Default::default(),
        }
    }
}

impl<CacheT, CoalesceKeyT> Clone for CoalescingLayer<CacheT, CoalesceKeyT>
where
    CacheT: Cache<CoalesceKeyT>,
    CoalesceKeyT: CoalesceKey,
{
    fn clone(&self) -> Self {
        Self {
            coalescing: self.coalescing.clone(),
            in_flight: self.in_flight.clone(),
        }
    }
}

impl<InnerServiceT, CacheT, CoalesceKeyT> Layer<InnerServiceT>
    for CoalescingLayer<CacheT, CoalesceKeyT>
where
    CacheT: Cache<CoalesceKeyT>,
    CoalesceKeyT: CoalesceKey,
{
    type Service = CoalescingService<InnerServiceT, CacheT, CoalesceKeyT>;

    fn layer(&self, inner_service: InnerServiceT) -> Self::Service {
        CoalescingService::new(
            inner_service,
            self.coalescing.clone(),
            self.in_flight.clone(),
        )
    }
}
