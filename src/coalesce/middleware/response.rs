use super::{super::{hooks::*, response::*}, configuration::*, hooks::*};

use {http::*, std::time::*};

//
// CacheableResponse
//

/// Cacheable captured response.
pub trait CacheableResponse {
    /// Whether the captured response should not be stored.
    ///
    /// Status codes do not matter: we coalesce the transport, so error statuses are cacheable,
    /// too. The `cacheable_by_response` hook, if provided, has the final say.
    fn should_skip_cache<CacheT>(
        &self,
        uri: &Uri,
        configuration: &MiddlewareCoalescingConfiguration<CacheT>,
    ) -> bool;

    /// Cache duration as provided by the `cache_duration` hook.
    fn cache_duration_with_hook<CacheT>(
        &self,
        uri: &Uri,
        configuration: &MiddlewareCoalescingConfiguration<CacheT>,
    ) -> Option<Duration>;
}

impl CacheableResponse for CapturedResponse {
    fn should_skip_cache<CacheT>(
        &self,
        uri: &Uri,
        configuration: &MiddlewareCoalescingConfiguration<CacheT>,
    ) -> bool {
        if let Some(cacheable) = &configuration.cacheable_by_response
            && !cacheable(CacheableHookContext::new(uri, self.status(), self.headers()))
        {
            tracing::debug!("skip store (cacheable_by_response=false)");
            return true;
        }

        false
    }

    fn cache_duration_with_hook<CacheT>(
        &self,
        uri: &Uri,
        configuration: &MiddlewareCoalescingConfiguration<CacheT>,
    ) -> Option<Duration> {
        configuration.cache_duration.as_ref().and_then(|cache_duration| {
            cache_duration(CacheDurationHookContext::new(uri, self.status(), self.headers()))
        })
    }
}
