//! API request handlers

mod health;

pub use health::*;
