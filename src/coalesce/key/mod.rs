mod common;
mod key;

#[allow(unused_imports)]
pub use {common::*, key::*};
