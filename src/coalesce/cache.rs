use super::{key::*, response::*};

//
// Cache
//

/// Cache of captured responses.
///
/// Implementations should ensure that cloning is cheap and clones always refer to the same shared
/// state. Entries are immutable once stored.
#[allow(async_fn_in_trait)]
pub trait Cache<CoalesceKeyT = CommonCoalesceKey>
where
    Self: 'static + Clone + Send + Sync,
    CoalesceKeyT: CoalesceKey,
{
    /// Get a fresh entry from the cache.
    ///
    /// Stale entries must never be returned.
    ///
    /// Note that this is an `async` function written in longer form in order to include the `Send`
    /// constraint. Implementations can simply use `async fn get`.
    fn get(
        &self,
        key: &CoalesceKeyT,
    ) -> impl Future<Output = Option<CapturedResponseRef>> + Send;

    /// Put an entry in the cache.
    ///
    /// The cache should take into consideration the [CapturedResponse::duration] if set.
    ///
    /// Note that this is an `async` function written in longer form in order to include the `Send`
    /// constraint. Implementations can simply use `async fn put`.
    fn put(
        &self,
        key: CoalesceKeyT,
        captured_response: CapturedResponseRef,
    ) -> impl Future<Output = ()> + Send;

    /// Invalidate a cache entry.
    ///
    /// Note that this is an `async` function written in longer form in order to include the `Send`
    /// constraint. Implementations can simply use `async fn invalidate`.
    fn invalidate(&self, key: &CoalesceKeyT) -> impl Future<Output = ()> + Send;

    /// Invalidate all cache entries.
    ///
    /// Note that this is an `async` function written in longer form in order to include the `Send`
    /// constraint. Implementations can simply use `async fn invalidate_all`.
    fn invalidate_all(&self) -> impl Future<Output = ()> + Send;
}
