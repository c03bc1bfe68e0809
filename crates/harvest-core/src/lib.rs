// SPDX-FileCopyrightText: 2026 Harvest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Harvest ingestion pipeline.
//!
//! This crate provides the trait definitions, error types, and value types
//! shared by the source adapter, the message store, and the pipeline that
//! connects them.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::{FailureClass, HarvestError};
pub use types::{
    AdapterType, ChannelHandle, CursorStrategy, DomainCount, HealthStatus, Message, MessageItem,
    PageOrder, PageRequest,
};

pub use traits::{MessageStore, PluginAdapter, SourceAdapter};
