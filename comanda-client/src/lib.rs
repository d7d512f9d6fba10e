//! comanda-client - client-side logic for the comanda restaurant POS
//!
//! Every screen of the POS (menu ordering, kitchen and bar boards, cashier,
//! admin, reports) is a thin event-driven controller over a remote data
//! gateway: it issues table-scoped queries, reacts to push notifications by
//! reloading wholesale, and exposes plain view-state structs for the
//! renderers. The one piece of real domain logic is the station status
//! reconciler in [`orders::Reconciler`].
//!
//! Rendering, styling and the hosted database client itself live outside
//! this crate; the gateway is an abstract collaborator behind
//! [`gateway::DataGateway`].

pub mod app;
pub mod cart;
pub mod config;
pub mod db;
pub mod error;
pub mod gateway;
pub mod notify;
pub mod orders;
pub mod screens;
pub mod utils;

pub use app::App;
pub use cart::Cart;
pub use config::Config;
pub use error::ClientError;
pub use gateway::{DataGateway, MemoryGateway};
pub use notify::{Notifier, Toast, ToastLevel};
pub use orders::{OrderStore, Reconciler};
