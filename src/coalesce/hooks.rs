use {
    http::*,
    std::{sync::*, time::*},
};

/// Hook to get a captured response's cache duration.
pub type CacheDurationHook =
    Arc<Box<dyn Fn(CacheDurationHookContext) -> Option<Duration> + Send + Sync>>;

//
// CacheDurationHookContext
//

/// Context for [CacheDurationHook].
pub struct CacheDurationHookContext<'this> {
    /// Request URI.
    pub uri: &'this Uri,

    /// Response status.
    pub status: StatusCode,

    /// Response headers.
    pub headers: &'this HeaderMap,
}

impl<'this> CacheDurationHookContext<'this> {
    /// Constructor.
    pub fn new(uri: &'this Uri, status: StatusCode, headers: &'this HeaderMap) -> Self {
        Self {
            uri,
            status,
            headers,
        }
    }
}
