//! HTTP server for vis.
//!
//! Serves version badges and raw values to readers, and the two-phase
//! prepare / commit API (plus rollback) to release pipelines. All ledger
//! calls are blocking and run on tokio's blocking pool.

pub mod badge;
pub mod config;
pub mod error;
pub mod handler;
pub mod router;
pub mod server;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use router::{build_router, AppState};
pub use server::VisServer;
