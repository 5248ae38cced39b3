mod cache;

#[allow(unused_imports)]
pub use cache::*;
