/// In-memory cache implementation.
pub mod memory;

/// Moka cache implementation.
#[cfg(feature = "moka")]
pub mod moka;
