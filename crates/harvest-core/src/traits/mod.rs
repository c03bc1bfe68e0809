// SPDX-FileCopyrightText: 2026 Harvest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions for the ingestion collaborators.
//!
//! All adapters extend the [`PluginAdapter`] base trait and use
//! `#[async_trait]` for dynamic dispatch compatibility.

pub mod adapter;
pub mod source;
pub mod store;

pub use adapter::PluginAdapter;
pub use source::SourceAdapter;
pub use store::MessageStore;
