//! Core type definitions: task snapshots and processing parameters.

pub mod params;
pub mod task;

pub use params::{
    CheckmarkFieldProcessingParams, CheckmarkType, ExportFormat, ImageProcessingParams,
    ImageSource, ProcessingParams, ProcessingProfile, TextType, WriteTags,
};
pub use task::{Task, TaskList, TaskStatus};
