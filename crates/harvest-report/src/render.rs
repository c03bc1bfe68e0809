// SPDX-FileCopyrightText: 2026 Harvest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plain-text renderings of a [`Report`].

use crate::Report;

const BAR: char = '█';

impl Report {
    /// Markdown table of the rows under a `## Top N Most Mentioned Domains`
    /// heading.
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!(
            "## Top {} Most Mentioned Domains\n\n",
            self.rows.len()
        ));
        if let Some(channel) = &self.channel {
            out.push_str(&format!(
                "_Generated {} after ingesting {channel}._\n\n",
                self.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
            ));
        }
        if self.rows.is_empty() {
            out.push_str("No domains mentioned yet.\n");
            return out;
        }
        out.push_str("| Domain | Mentions |\n");
        out.push_str("|--------|----------|\n");
        for row in &self.rows {
            out.push_str(&format!("| {} | {} |\n", escape_cell(&row.domain), row.count));
        }
        out
    }

    /// Horizontal bar chart; the largest count gets `width` cells and every
    /// non-zero count at least one.
    pub fn to_bar_chart(&self, width: usize) -> String {
        let mut out = String::new();
        out.push_str(&format!("Top {} Domains Mentioned\n\n", self.rows.len()));

        let max = self.rows.iter().map(|r| r.count).max().unwrap_or(0);
        if max == 0 {
            out.push_str("(no data)\n");
            return out;
        }
        let label_width = self
            .rows
            .iter()
            .map(|r| r.domain.chars().count())
            .max()
            .unwrap_or(0);

        for row in &self.rows {
            let bar: String = std::iter::repeat_n(BAR, bar_len(row.count, max, width)).collect();
            out.push_str(&format!("{:<label_width$}  {bar} {}\n", row.domain, row.count));
        }
        out
    }
}

/// Cells for `count` on a scale where `max` fills `width`, rounded up.
pub fn bar_len(count: u64, max: u64, width: usize) -> usize {
    if count == 0 || max == 0 || width == 0 {
        return 0;
    }
    let width = width as u64;
    (count.saturating_mul(width).div_ceil(max)).min(width) as usize
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|")
}
