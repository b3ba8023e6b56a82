//! `servercontrol` provisions and supervises containerized game-server instances on a single
//! Docker host.
//!
//! # Overview
//!
//! Each instance is one container running a dedicated game server. servercontrol handles:
//! - Allocating a free host port out of a fixed range
//! - Pulling the server image and creating the container with its storage and environment
//! - Starting, stopping, deleting and tailing the output of instances
//! - Inferring a fine-grained lifecycle phase (installing, running) from the container output
//! - Persisting per-instance game settings
//!
//! # Architecture
//!
//! - **Runtime**: The [`runtime::SandboxRuntime`] trait over the container engine, with a Docker
//!   implementation and an in-memory one
//! - **Orchestration**: Provisioning, lifecycle operations and the instance directory
//! - **Settings**: Per-instance settings documents
//! - **Server**: REST API for remote management
//!
//! # Usage Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use servercontrol::{
//!     config::ServerControlConfig,
//!     orchestration::{Orchestrator, ProvisionRequest},
//!     runtime::DockerRuntime,
//!     settings::FileSettingsStore,
//! };
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ServerControlConfig::default();
//!     let runtime = DockerRuntime::connect(None)?;
//!     let settings = FileSettingsStore::new("/var/lib/servercontrol/settings");
//!
//!     let orchestrator = Orchestrator::new(
//!         Arc::new(runtime),
//!         Arc::new(settings),
//!         config,
//!         "/var/lib/servercontrol/palworld-servers",
//!     );
//!
//!     let request = ProvisionRequest::builder().server_name("Friday Night").build();
//!     let instance = orchestrator.provision(request).await?;
//!     println!("{} is listening on port {}", instance.name, instance.port);
//!
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`config`] - Configuration types and defaults
//! - [`orchestration`] - Instance provisioning and lifecycle
//! - [`runtime`] - Container engine abstraction
//! - [`server`] - REST API server implementation
//! - [`settings`] - Per-instance settings persistence
//! - [`utils`] - Common utilities and helpers

#![warn(missing_docs)]

mod error;

//--------------------------------------------------------------------------------------------------
// Exports
//--------------------------------------------------------------------------------------------------

pub mod cli;
pub mod config;
pub mod orchestration;
pub mod runtime;
pub mod server;
pub mod settings;
pub mod utils;

pub use error::*;
