use {
    http::{header::*, uri::*, *},
    std::{fmt, hash::*},
};

//
// CoalesceKey
//

/// Coalescing key.
///
/// Requests with equal keys are considered identical: they may share a single upstream call and
/// a single cache entry. Computation must be deterministic and pure.
pub trait CoalesceKey
where
    Self: 'static + Clone + fmt::Display + Eq + Hash + Send + Sync,
{
    /// Create a coalescing key for a request.
    fn for_request(
        method: &Method,
        uri: &Uri,
        headers: &HeaderMap,
        extensions: &Extensions,
    ) -> Self;
}

//
// CoalesceKeyForRequest
//

/// [CoalesceKey] for [Request].
pub trait CoalesceKeyForRequest<CoalesceKeyT> {
    /// Create a coalescing key.
    fn coalesce_key(&self) -> CoalesceKeyT;
}

impl<RequestBodyT, CoalesceKeyT> CoalesceKeyForRequest<CoalesceKeyT> for Request<RequestBodyT>
where
    CoalesceKeyT: CoalesceKey,
{
    fn coalesce_key(&self) -> CoalesceKeyT {
        CoalesceKeyT::for_request(self.method(), self.uri(), self.headers(), self.extensions())
    }
}
