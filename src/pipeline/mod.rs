//! Pipeline entry points for scraper operations.
//!
//! - `run_ingest`: Discover sermons on listing pages and save new ones
//! - `run_reconcile`: Drop index rows whose sermon file is missing
//! - `run_status`: Log what the index and the sermon directory hold
//! - `run_self_test`: Exercise `add_sermon` against scratch storage

pub mod ingest;
pub mod persist;
pub mod reconcile;
pub mod selftest;
pub mod status;

pub use ingest::{Ingestor, run_ingest};
pub use persist::add_sermon;
pub use reconcile::{ReconcileReport, run_reconcile};
pub use selftest::{SelfTestResult, run_self_test};
pub use status::{StatusReport, collect_status, run_status};
