use super::{
    super::super::{configuration::*, key::*, response::*},
    cache::*,
    expiry::*,
};

use std::{sync::*, time::*};

//
// ForCapturedResponse
//

/// Add support for [CapturedResponse] [Expiry](moka::Expiry).
pub trait ForCapturedResponse
where
    Self: Sized,
{
    /// Add support for [CapturedResponse] [Expiry](moka::Expiry).
    ///
    /// Entries without their own [duration](CapturedResponse::duration) expire after `ttl`.
    fn for_captured_response(self, ttl: Duration) -> Self;
}

impl<CoalesceKeyT> ForCapturedResponse
    for moka::future::CacheBuilder<
        CoalesceKeyT,
        CapturedResponseRef,
        moka::future::Cache<CoalesceKeyT, CapturedResponseRef>,
    >
where
    CoalesceKeyT: CoalesceKey,
{
    fn for_captured_response(self, ttl: Duration) -> Self {
        self.expire_after(CapturedResponseExpiry::new(ttl))
    }
}

/// Build a [MokaCacheImplementation].
///
/// Note that Moka's eviction is approximate and eventually consistent: the entry count may
/// briefly exceed [max_entries](CacheConfiguration::max_entries).
pub fn new_moka_cache<CoalesceKeyT>(
    configuration: &CacheConfiguration,
) -> MokaCacheImplementation<CoalesceKeyT>
where
    CoalesceKeyT: CoalesceKey,
{
    Arc::new(
        moka::future::Cache::<CoalesceKeyT, CapturedResponseRef>::builder()
            .max_capacity(configuration.max_entries as u64)
            .for_captured_response(configuration.ttl)
            .build(),
    )
}
