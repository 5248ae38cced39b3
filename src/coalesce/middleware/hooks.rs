use {http::*, std::sync::*};

/// Hook to check if a request is coalescable.
pub type CoalescableHook = Arc<Box<dyn Fn(CoalescableHookContext) -> bool + Send + Sync>>;

/// Hook to check if a captured response is cacheable.
pub type CacheableHook = Arc<Box<dyn Fn(CacheableHookContext) -> bool + Send + Sync>>;

//
// CoalescableHookContext
//

/// Context for [CoalescableHook].
#[derive(Clone, Debug)]
pub struct CoalescableHookContext<'this> {
    /// URI.
    pub uri: &'this Uri,

    /// Request headers.
    pub headers: &'this HeaderMap,
}

impl<'this> CoalescableHookContext<'this> {
    /// Constructor.
    pub fn new(uri: &'this Uri, headers: &'this HeaderMap) -> Self {
        Self { uri, headers }
    }
}

//
// CacheableHookContext
//

/// Context for [CacheableHook].
#[derive(Clone, Debug)]
pub struct CacheableHookContext<'this> {
    /// Request URI.
    pub uri: &'this Uri,

    /// Response status.
    pub status: StatusCode,

    /// Response headers.
    pub headers: &'this HeaderMap,
}

impl<'this> CacheableHookContext<'this> {
    /// Constructor.
    pub fn new(uri: &'this Uri, status: StatusCode, headers: &'this HeaderMap) -> Self {
        Self {
            uri,
            status,
            headers,
        }
    }
}
