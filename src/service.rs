use super::coalesce::{middleware::*, *};

use {
    futures::future::{BoxFuture, FutureExt},
    http::{Request, Response},
    http_body::Body,
    std::{
        mem,
        result::Result,
        sync::Arc,
        task::{Context, Poll},
    },
    tower::{Service, ServiceExt},
};

//
// CoalescingService
//

/// HTTP request coalescing service.
///
/// You will often be using [CoalescingLayer](super::CoalescingLayer) rather than this service
/// directly, thus this service's functionality is documented there.
///
/// All clones share the same in-flight registry and cache.
pub struct CoalescingService<InnerServiceT, CacheT, CoalesceKeyT = CommonCoalesceKey>
where
    CacheT: Cache<CoalesceKeyT>,
    CoalesceKeyT: CoalesceKey,
{
    inner_service: InnerServiceT,
    coalescing: MiddlewareCoalescingConfiguration<CacheT>,
    in_flight: InFlight<CoalesceKeyT>,
}

impl<InnerServiceT, CacheT, CoalesceKeyT> CoalescingService<InnerServiceT, CacheT, CoalesceKeyT>
where
    CacheT: Cache<CoalesceKeyT>,
    CoalesceKeyT: CoalesceKey,
{
    /// Constructor.
    pub fn new(
        inner_service: InnerServiceT,
        coalescing: MiddlewareCoalescingConfiguration<CacheT>,
        in_flight: InFlight<CoalesceKeyT>,
    ) -> Self {
        Self {
            inner_service,
            coalescing,
            in_flight,
        }
    }

    /// In-flight registry.
    pub fn in_flight(&self) -> &InFlight<CoalesceKeyT> {
        &self.in_flight
    }

    /// Cache, if enabled.
    pub fn cache(&self) -> Option<&CacheT> {
        self.coalescing.cache.as_ref()
    }

    /// Forget all in-flight calls and invalidate the cache.
    ///
    /// Callers that are already attached to an in-flight call still receive its result, but it
    /// will not be shared with later callers.
    pub async fn clear(&self) {
        self.in_flight.clear();
        if let Some(cache) = &self.coalescing.cache {
            cache.invalidate_all().await;
        }
    }

    /// Perform a request, coalescing it with identical in-flight requests and serving it from the
    /// cache when possible.
    ///
    /// Equivalent to calling the service once it is ready.
    pub async fn fetch_deduplicated<RequestBodyT>(
        &self,
        request: Request<RequestBodyT>,
    ) -> Result<<Self as Service<Request<RequestBodyT>>>::Response, TransportError>
    where
        Self: Service<Request<RequestBodyT>, Error = TransportError>,
        InnerServiceT: Clone,
    {
        self.clone().oneshot(request).await
    }

    // Clone while keeping `inner_service`.
    //
    // See: https://docs.rs/tower/latest/tower/trait.Service.html#be-careful-when-cloning-inner-services
    fn clone_and_keep_inner_service(&mut self) -> Self
    where
        InnerServiceT: Clone,
    {
        let mut clone = self.clone();
        clone.inner_service = mem::replace(&mut self.inner_service, clone.inner_service);
        clone
    }

    // Handle request.
    async fn handle<RequestBodyT, ResponseBodyT>(
        mut self,
        request: Request<RequestBodyT>,
    ) -> Result<Response<CoalescedBody<ResponseBodyT>>, TransportError>
    where
        InnerServiceT:
            'static + Service<Request<RequestBodyT>, Response = Response<ResponseBodyT>> + Send,
        InnerServiceT::Error: Into<CapturedError>,
        InnerServiceT::Future: Send,
        RequestBodyT: 'static + Send,
        ResponseBodyT: 'static + Body + Send,
        ResponseBodyT::Data: Send,
        ResponseBodyT::Error: Into<CapturedError>,
    {
        if request.should_skip_coalescing(&self.coalescing) {
            return self
                .inner_service
                .call(request)
                .await
                .map(|upstream_response| upstream_response.map(CoalescedBody::Upstream))
                .map_err(TransportError::new);
        }

        let key: CoalesceKeyT = request.coalesce_key();

        if let Some(cache) = &self.coalescing.cache
            && let Some(captured_response) = cache.get(&key).await
        {
            tracing::debug!("hit: {}", key);
            return Ok(captured_response.to_response());
        }

        let Self {
            inner_service,
            coalescing,
            in_flight,
        } = self;

        let capture = match in_flight.attach_or_dispatch(&key, |generation| {
            dispatch(
                inner_service,
                request,
                key.clone(),
                generation,
                coalescing,
                in_flight.clone(),
            )
        }) {
            Attachment::Attached(capture) => {
                tracing::debug!("coalesced: {}", key);
                capture
            }

            Attachment::Dispatched(capture) => {
                tracing::debug!("miss: {}", key);
                capture
            }
        };

        capture
            .await
            .map(|captured_response| captured_response.to_response())
    }
}

// The upstream call shared by all attached callers.
//
// It runs as its own task, so that it settles even if every attached caller is gone. It stores its
// own result and removes its own in-flight entry.
fn dispatch<InnerServiceT, RequestBodyT, ResponseBodyT, CacheT, CoalesceKeyT>(
    mut inner_service: InnerServiceT,
    request: Request<RequestBodyT>,
    key: CoalesceKeyT,
    generation: u64,
    coalescing: MiddlewareCoalescingConfiguration<CacheT>,
    in_flight: InFlight<CoalesceKeyT>,
) -> BoxFuture<'static, CaptureResult>
where
    InnerServiceT:
        'static + Service<Request<RequestBodyT>, Response = Response<ResponseBodyT>> + Send,
    InnerServiceT::Error: Into<CapturedError>,
    InnerServiceT::Future: Send,
    RequestBodyT: 'static + Send,
    ResponseBodyT: 'static + Body + Send,
    ResponseBodyT::Data: Send,
    ResponseBodyT::Error: Into<CapturedError>,
    CacheT: Cache<CoalesceKeyT>,
    CoalesceKeyT: CoalesceKey,
{
    let task = tokio::spawn(async move {
        // Also on panic
        let _settle = Settle {
            in_flight,
            key: key.clone(),
            generation,
        };

        // Capture request data before moving the request to the inner service
        let uri = request.uri().clone();

        let upstream = inner_service.call(request).await.map_err(TransportError::new);
        let result = match upstream {
            Ok(upstream_response) => CapturedResponse::new_for(upstream_response).await,
            Err(error) => Err(error),
        }
        .map(|mut captured_response| {
            captured_response.duration =
                captured_response.cache_duration_with_hook(&uri, &coalescing);
            Arc::new(captured_response)
        });

        match &result {
            Ok(captured_response) => {
                if let Some(cache) = &coalescing.cache
                    && !captured_response.should_skip_cache(&uri, &coalescing)
                {
                    tracing::debug!("store: {}", key);
                    cache.put(key.clone(), captured_response.clone()).await;
                }
            }

            Err(error) => tracing::debug!("failed: {} {}", key, error),
        }

        result
    });

    async move { task.await.unwrap_or_else(|error| Err(TransportError::new(error))) }.boxed()
}

//
// Settle
//

// Removes the in-flight entry when dropped.
struct Settle<CoalesceKeyT>
where
    CoalesceKeyT: CoalesceKey,
{
    in_flight: InFlight<CoalesceKeyT>,
    key: CoalesceKeyT,
    generation: u64,
}

impl<CoalesceKeyT> Drop for Settle<CoalesceKeyT>
where
    CoalesceKeyT: CoalesceKey,
{
    fn drop(&mut self) {
        self.in_flight.settle(&self.key, self.generation);
    }
}

impl<InnerServiceT, CacheT, CoalesceKeyT> Clone
    for CoalescingService<InnerServiceT, CacheT, CoalesceKeyT>
where
    InnerServiceT: Clone,
    CacheT: Cache<CoalesceKeyT>,
    CoalesceKeyT: CoalesceKey,
{
    fn clone(&self) -> Self {
        Self {
            inner_service: self.inner_service.clone(),
            coalescing: self.coalescing.clone(),
            in_flight: self.in_flight.clone(),
        }
    }
}

impl<InnerServiceT, RequestBodyT, ResponseBodyT, CacheT, CoalesceKeyT>
    Service<Request<RequestBodyT>> for CoalescingService<InnerServiceT, CacheT, CoalesceKeyT>
where
    InnerServiceT: 'static
        + Service<Request<RequestBodyT>, Response = Response<ResponseBodyT>>
        + Clone
        + Send,
    InnerServiceT::Error: Into<CapturedError>,
    InnerServiceT::Future: Send,
    RequestBodyT: 'static + Send,
    ResponseBodyT: 'static + Body + Send,
    ResponseBodyT::Data: Send,
    ResponseBodyT::Error: Into<CapturedError>,
    CacheT: Cache<CoalesceKeyT>,
    CoalesceKeyT: CoalesceKey,
{
    type Response = Response<CoalescedBody<ResponseBodyT>>;
    type Error = TransportError;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, context: &mut Context) -> Poll<Result<(), Self::Error>> {
        // Even when we end up serving from the cache or attaching to an in-flight call we need
        // a ready inner service, because we cannot know in advance
        self.inner_service
            .poll_ready(context)
            .map_err(TransportError::new)
    }

    fn call(&mut self, request: Request<RequestBodyT>) -> Self::Future {
        let cloned_self = self.clone_and_keep_inner_service();
        cloned_self.handle(request).boxed()
    }
}
