// SPDX-FileCopyrightText: 2026 Harvest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Page bounds for walking a channel between the resume point and its head.

use harvest_core::{PageOrder, PageRequest};

/// Exclusive `(min_id, max_id)` bounds of the next page request.
///
/// `min_id` starts at the resume point and `max_id` at `0` (unbounded).
/// After each page the window moves past the trailing item in the source's
/// native order: oldest-first sources raise `min_id` to the largest id seen,
/// newest-first sources lower `max_id` to the smallest id seen. Either way
/// the window only narrows, so a run cannot revisit a processed page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    min_id: i64,
    max_id: i64,
    order: PageOrder,
}

impl PageWindow {
    pub fn new(last_id: i64, order: PageOrder) -> Self {
        Self {
            min_id: last_id,
            max_id: 0,
            order,
        }
    }

    pub fn min_id(&self) -> i64 {
        self.min_id
    }

    pub fn max_id(&self) -> i64 {
        self.max_id
    }

    pub fn request(&self, limit: usize) -> PageRequest {
        PageRequest {
            min_id: self.min_id,
            max_id: self.max_id,
            limit,
        }
    }

    /// Move past a delivered page. Returns `false` when the page did not
    /// narrow the window (empty, or ids outside the requested bounds), in
    /// which case the window is unchanged.
    pub fn advance(&mut self, ids: impl IntoIterator<Item = i64>) -> bool {
        match self.order {
            PageOrder::OldestFirst => match ids.into_iter().max() {
                Some(high) if high > self.min_id => {
                    self.min_id = high;
                    true
                }
                _ => false,
            },
            PageOrder::NewestFirst => match ids.into_iter().min() {
                Some(low) if self.max_id == 0 || low < self.max_id => {
                    self.max_id = low;
                    true
                }
                _ => false,
            },
        }
    }
}
