// SPDX-FileCopyrightText: 2026 Harvest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Incremental ingestion pipeline.
//!
//! [`harvest_channel`] wraps one [`BatchFetchLoop`] pass in the
//! [`RetryController`]: every retry re-enters at the resume point, so
//! messages stored by a failed attempt are not fetched again.

pub mod context;
pub mod cursor;
pub mod fetch_loop;
pub mod retry;
pub mod window;

pub use context::HarvestContext;
pub use cursor::CursorTracker;
pub use fetch_loop::{BatchFetchLoop, RunSummary};
pub use retry::RetryController;
pub use window::PageWindow;

use harvest_core::HarvestError;

/// Ingest the channel named by `identifier` until the source reports no
/// further messages.
pub async fn harvest_channel(
    ctx: &HarvestContext,
    identifier: &str,
) -> Result<RunSummary, HarvestError> {
    let controller = RetryController::new(&ctx.retry);
    let fetch_loop = BatchFetchLoop::new(ctx);
    controller
        .run(identifier, || fetch_loop.run(identifier))
        .await
}
