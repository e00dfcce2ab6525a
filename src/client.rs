//! Task submission and status client.
//!
//! Keep the public surface small: [`OcrClient`] for calls, [`OcrClientBuilder`]
//! to assemble one. Implementation details live in submodules under `src/client/`.

pub mod builder;
pub mod core;
mod error_classification;
mod execution;

pub use builder::OcrClientBuilder;
pub use core::OcrClient;
