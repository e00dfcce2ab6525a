//! # ocr-cloud-sdk
//!
//! 云端文档识别服务的异步 Rust 客户端。
//!
//! Async client for a cloud document-recognition service. Images are submitted
//! as tasks, the service recognises them in the background, and the client
//! polls until each task reaches a terminal status.
//!
//! ## Core pieces
//!
//! - **Transport**: one HTTP exchange per call behind the [`transport::Transport`] trait
//! - **Retry engine**: an ordered chain of fixed-delay policies, first match wins
//! - **Client**: submission, status, listing and deletion calls on [`OcrClient`]
//! - **Waiter**: the submit -> poll state machine behind [`OcrClient::process_and_wait`]
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ocr_cloud_sdk::retry::WaitAndRetry;
//! use ocr_cloud_sdk::{AuthInfo, ExportFormat, ImageProcessingParams, OcrClientBuilder, WaitOptions};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> ocr_cloud_sdk::Result<()> {
//!     let client = OcrClientBuilder::new()
//!         .auth(AuthInfo::new("https://cloud-westus.ocrsdk.com", "my-app", "my-password")?)
//!         .retry_policy(WaitAndRetry::gateway_timeout(3, Duration::from_secs(3)))
//!         .request_timeout(Duration::from_secs(30))
//!         .build()?;
//!
//!     let params = ImageProcessingParams::default()
//!         .export_formats(vec![ExportFormat::Docx, ExportFormat::PdfSearchable])
//!         .language("English");
//!     let image = std::fs::read("scan.jpg")?;
//!
//!     let outcome = client
//!         .process_and_wait(&params, image, WaitOptions::default())
//!         .await?;
//!     if let Some(task) = outcome.task() {
//!         println!("{} -> {:?}", task.status, task.result_urls);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`auth`] | Host and credentials |
//! | [`client`] | Client and builder |
//! | [`config`] | YAML / environment configuration |
//! | [`retry`] | Retry policies and the engine that applies them |
//! | [`transport`] | HTTP exchange abstraction and the reqwest implementation |
//! | [`types`] | Task snapshots and processing parameters |
//! | [`waiter`] | Completion waiter |

pub mod auth;
pub mod client;
pub mod config;
pub mod retry;
pub mod transport;
pub mod types;
pub mod waiter;

// Re-export main types for convenience
pub use auth::{AuthInfo, Credentials};
pub use client::{OcrClient, OcrClientBuilder};
pub use config::ClientConfig;
pub use types::{
    CheckmarkFieldProcessingParams, ExportFormat, ImageProcessingParams, ProcessingParams, Task,
    TaskStatus,
};
pub use waiter::{WaitOptions, WaitOutcome};

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext};
