//! # chanfeed-publish
//!
//! Outbound integrations: image host uploads, snapshot publication to object
//! storage, and the push-notification trigger.

pub mod imagehost;
pub mod notify;
pub mod snapshot;

pub use imagehost::ImgbbClient;
pub use notify::NotifyClient;
pub use snapshot::SnapshotPublisher;
