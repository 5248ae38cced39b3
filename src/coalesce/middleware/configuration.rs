use super::{super::hooks::*, hooks::*};

//
// MiddlewareCoalescingConfiguration
//

/// Middleware coalescing configuration.
pub struct MiddlewareCoalescingConfiguration<CacheT> {
    /// Cache.
    ///
    /// Without a cache we still coalesce in-flight requests.
    pub cache: Option<CacheT>,

    /// Coalescable by request (hook).
    pub coalescable_by_request: Option<CoalescableHook>,

    /// Cacheable by response (hook).
    pub cacheable_by_response: Option<CacheableHook>,

    /// Cache duration (hook).
    pub cache_duration: Option<CacheDurationHook>,
}

impl<CacheT> Default for MiddlewareCoalescingConfiguration<CacheT> {
    fn default() -> Self {
        Self {
            cache: None,
            coalescable_by_request: None,
            cacheable_by_response: None,
            cache_duration: None,
        }
    }
}

impl<CacheT> Clone for MiddlewareCoalescingConfiguration<CacheT>
where
    CacheT: Clone,
{
    fn clone(&self) -> Self {
        Self {
            cache: self.cache.clone(),
            coalescable_by_request: self.coalescable_by_request.clone(),
            cacheable_by_response: self.cacheable_by_response.clone(),
            cache_duration: self.cache_duration.clone(),
        }
    }
}
