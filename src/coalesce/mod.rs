mod body;
mod cache;
mod configuration;
mod credentials;
mod error;
mod hooks;
mod in_flight;
mod key;
mod response;

/// Cache implementations.
pub mod implementation;

/// Coalescing middleware utilities.
pub mod middleware;

#[allow(unused_imports)]
pub use {
    body::*, cache::*, configuration::*, credentials::*, error::*, hooks::*, in_flight::*, key::*,
    response::*,
};
