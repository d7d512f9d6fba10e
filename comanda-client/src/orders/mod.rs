//! Order domain services: money helpers, the station status reconciler and
//! the aggregate store.

pub mod money;
pub mod reconciler;
pub mod store;

pub use reconciler::{Reconciler, RemovedLine};
pub use store::{OrderStore, StoreUpdate, WatchGuard};
