use std::{error::Error, sync::*};

/// Boxed error as accepted from inner services and upstream bodies.
pub type CapturedError = Box<dyn Error + Send + Sync>;

//
// TransportError
//

/// Transport failure.
///
/// Either the inner service failed to produce a response or the upstream response body could
/// not be read to completion. We do not introduce any failure of our own: this is a transparent
/// wrapper. [Display](std::fmt::Display) and [source](Error::source) are forwarded to the
/// original error, which can also be recovered via [downcast_ref](Self::downcast_ref).
///
/// Cloning is cheap, so that a single failure can be handed to every caller attached to the same
/// in-flight request.
#[derive(Clone, Debug, thiserror::Error)]
#[error(transparent)]
pub struct TransportError(Arc<dyn Error + Send + Sync>);

impl TransportError {
    /// Constructor.
    pub fn new<ErrorT>(error: ErrorT) -> Self
    where
        ErrorT: Into<CapturedError>,
    {
        Self(Arc::from(error.into()))
    }

    /// The original error.
    pub fn inner(&self) -> &(dyn Error + Send + Sync + 'static) {
        &*self.0
    }

    /// Downcast the original error.
    pub fn downcast_ref<ErrorT>(&self) -> Option<&ErrorT>
    where
        ErrorT: Error + 'static,
    {
        self.inner().downcast_ref()
    }
}
