use super::super::super::{cache::*, key::*, response::*};

use std::{ops::*, sync::*};

//
// MokaCacheImplementation
//

/// Moka cache implementation.
///
/// See [new_moka_cache](super::new_moka_cache).
pub type MokaCacheImplementation<CoalesceKeyT = CommonCoalesceKey> =
    Arc<moka::future::Cache<CoalesceKeyT, CapturedResponseRef>>;

impl<CoalesceKeyT> Cache<CoalesceKeyT> for MokaCacheImplementation<CoalesceKeyT>
where
    CoalesceKeyT: CoalesceKey,
{
    async fn get(&self, key: &CoalesceKeyT) -> Option<CapturedResponseRef> {
        self.deref().get(key).await
    }

    async fn put(&self, key: CoalesceKeyT, captured_response: CapturedResponseRef) {
        self.deref().insert(key, captured_response).await
    }

    async fn invalidate(&self, key: &CoalesceKeyT) {
        self.deref().invalidate(key).await
    }

    async fn invalidate_all(&self) {
        self.deref().invalidate_all()
    }
}

#[cfg(test)]
mod tests {
    use {
        super::{super::builder::*, *},
        crate::coalesce::CacheConfiguration,
        bytes::*,
        http::{Method, Response, Uri},
        std::time::Duration,
    };

    fn key(path: &str) -> CommonCoalesceKey {
        let uri: Uri = path.parse().unwrap();
        CommonCoalesceKey::for_request(&Method::GET, &uri, &Default::default(), &Default::default())
    }

    #[tokio::test]
    async fn stores_and_invalidates() {
        let cache: MokaCacheImplementation =
            new_moka_cache(&CacheConfiguration::new(Duration::from_secs(60), 50));

        let (parts, _) = Response::new(()).into_parts();
        let captured_response = Arc::new(CapturedResponse::new(parts, Bytes::from_static(b"posts")));

        cache.put(key("/api/posts/"), captured_response).await;
        assert_eq!(
            cache.get(&key("/api/posts/")).await.unwrap().body,
            Bytes::from_static(b"posts")
        );

        cache.invalidate(&key("/api/posts/")).await;
        assert!(cache.get(&key("/api/posts/")).await.is_none());
    }
}
