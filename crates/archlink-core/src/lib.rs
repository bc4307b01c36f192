//! Core state for an archlink session.
//!
//! Pure data structures shared by the session controller and presenter. No
//! I/O happens here except in [`JsonFileCacheStore`], which the controller
//! drives explicitly.
//!
//! # Components
//!
//! - [`DataCache`]: data package tables and player directory, validated
//!   against server checksums
//! - [`CacheStore`]: persistence seam for data package tables
//! - [`ItemLogHandle`] / [`ReceivedItems`]: the authoritative received item
//!   sequence behind an atomically swappable handle
//! - [`SessionIdentity`] / [`InstanceId`]: who we connect as
//! - [`IdMapping`]: game-side translation between location keys, items, and
//!   server ids
//! - [`HandshakeError`]: why a connect attempt failed

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod cache;
pub mod error;
pub mod identity;
pub mod items;
pub mod mapping;
pub mod store;

pub use cache::{DataCache, DataPackageRequest, GameTables};
pub use error::{CacheError, HandshakeError};
pub use identity::{InstanceId, SessionIdentity};
pub use items::{AppendOutcome, ItemLogHandle, ReceivedItems};
pub use mapping::{IdMapping, LocationState, RawIds};
pub use store::{CacheStore, JsonFileCacheStore, MemoryCacheStore};
