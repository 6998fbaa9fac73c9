// src/fanout.rs

//! Concurrent fan-out of independent store writes
//!
//! Multi-record mutations (create, delete, remove-all) are not transactional.
//! Their writes are issued together and joined here: every write is driven to
//! completion, then the first failure in submission order is reported.

use crate::error::Result;
use futures_util::future::{BoxFuture, join_all};

/// A pending store write
pub(crate) type PendingWrite<'a, T> = BoxFuture<'a, Result<T>>;

/// Drive every write to completion and fail if any of them failed
///
/// A failing write never cancels its siblings; writes that succeeded stay
/// applied.
pub(crate) async fn settle_all<'a, T>(writes: Vec<PendingWrite<'a, T>>) -> Result<Vec<T>> {
    join_all(writes).await.into_iter().collect()
}
