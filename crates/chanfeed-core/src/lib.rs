//! # chanfeed-core
//!
//! Core types, traits, configuration, and error handling for chanfeed.

pub mod config;
pub mod error;
pub mod message;
pub mod post;
pub mod sanitize;
pub mod traits;
