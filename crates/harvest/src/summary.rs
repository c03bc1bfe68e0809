// SPDX-FileCopyrightText: 2026 Harvest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Terminal summary printed after a run.

use crate::run::{Completion, RunOutcome};

/// Render the run summary followed by the bar chart.
///
/// Colors are only applied when `use_color` is set; callers disable them
/// for `--plain` and for non-TTY stdout.
pub fn format_summary(outcome: &RunOutcome, use_color: bool, chart_width: usize) -> String {
    let mut lines = vec![
        String::new(),
        "  harvest run".to_string(),
        format!("  {}", "-".repeat(35)),
    ];

    match &outcome.completion {
        Completion::CaughtUp(summary) => {
            lines.push(if use_color {
                use colored::Colorize;
                format!(
                    "    State:    {} {} ({})",
                    "✓".green(),
                    "caught up".green(),
                    summary.channel
                )
            } else {
                format!("    State:    [OK] caught up ({})", summary.channel)
            });
            lines.push(format!("    Pages:    {}", summary.pages));
            lines.push(format!(
                "    Stored:   {} ({} replies)",
                summary.stored, summary.replies
            ));
            lines.push(if summary.failed > 0 && use_color {
                use colored::Colorize;
                format!("    Failed:   {}", summary.failed.to_string().red())
            } else {
                format!("    Failed:   {}", summary.failed)
            });
        }
        Completion::Interrupted => {
            lines.push(if use_color {
                use colored::Colorize;
                format!("    State:    {} {}", "!".yellow(), "interrupted".yellow())
            } else {
                "    State:    [STOP] interrupted".to_string()
            });
        }
    }

    lines.push(format!("    Report:   {}", outcome.paths.markdown.display()));
    lines.push(format!("    Chart:    {}", outcome.paths.chart.display()));
    lines.push(String::new());
    lines.extend(
        outcome
            .report
            .to_bar_chart(chart_width)
            .lines()
            .map(|line| format!("  {line}")),
    );

    let mut out = lines.join("\n");
    out.push('\n');
    out
}
