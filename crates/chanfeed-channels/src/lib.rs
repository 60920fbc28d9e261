//! # chanfeed-channels
//!
//! Channel source integrations for chanfeed.

pub mod pacer;
pub mod telegram;
