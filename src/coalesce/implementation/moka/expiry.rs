use super::super::super::{key::*, response::*};

use {
    duration_str::*,
    moka::Expiry,
    std::time::{Duration, Instant},
};

//
// CapturedResponseExpiry
//

/// Moka [Expiry] for [CapturedResponse].
pub struct CapturedResponseExpiry {
    /// Duration of entries that do not specify their own.
    pub ttl: Duration,
}

impl CapturedResponseExpiry {
    /// Constructor.
    pub fn new(ttl: Duration) -> Self {
        Self { ttl }
    }
}

impl<CoalesceKeyT> Expiry<CoalesceKeyT, CapturedResponseRef> for CapturedResponseExpiry
where
    CoalesceKeyT: CoalesceKey,
{
    fn expire_after_create(
        &self,
        _key: &CoalesceKeyT,
        captured_response: &CapturedResponseRef,
        _created_at: Instant,
    ) -> Option<Duration> {
        let duration = captured_response.duration.unwrap_or(self.ttl);
        tracing::debug!("storing with duration: {}", duration.human_format());
        Some(duration)
    }
}
