// SPDX-FileCopyrightText: 2026 Harvest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Harvest integration tests.
//!
//! Provides mock adapters and fixtures for fast, deterministic,
//! CI-runnable tests without a live gateway.
//!
//! # Components
//!
//! - [`MockSource`] - Simulated channel history with scripted failures and call capture
//! - [`MockStore`] - In-memory message store with per-key fault injection
//! - [`TempStore`] - SQLite store in a temporary directory

pub mod fixtures;
pub mod mock_source;
pub mod mock_store;

pub use fixtures::{TempStore, item, ts};
pub use mock_source::{MockSource, SourceCall};
pub use mock_store::MockStore;
