mod configuration;
mod hooks;
mod request;
mod response;

#[allow(unused_imports)]
pub use {configuration::*, hooks::*, request::*, response::*};
