//! churn-bench-client: network side of churn-bench
//!
//! Provides [`ChurnClient`], the [`ProtocolClient`](churn_bench_core::ProtocolClient)
//! implementation that posts logins with reqwest and opens (then
//! immediately closes) WebSocket connections with tokio-tungstenite.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod client;
pub mod config;

pub use client::ChurnClient;
pub use config::{ClientConfig, ConfigValidationError};
