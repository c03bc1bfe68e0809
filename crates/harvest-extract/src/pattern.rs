// SPDX-FileCopyrightText: 2026 Harvest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The link-matching pattern.
//!
//! Link alternatives, tried in order at each position (leftmost-first):
//!
//! 1. `http(s)://[www.]host.label...tld` plus trailing path
//! 2. `www.host.label...tld` plus trailing path
//! 3. `http(s)://[www.]label.tld` where the label may start with `-`
//! 4. `www.label.tld` where the label may start with `-`
//! 5. bare `label.label...tld`, no scheme and no path
//!
//! Every link alternative ends its host in a letters-only label. A leading
//! `ip` alternative swallows dotted-quad addresses with their port and path,
//! so a file name such as `index.html` inside them is never read as a bare
//! domain. [`links`] drops those matches.

use std::sync::LazyLock;

use regex::Regex;

/// A path character: anything but whitespace and the delimiter set.
const PATH_CHAR: &str = r"[^\s)\],*><{}|\\^?#]";

/// Optional query string or fragment. `?` and `#` end the path run but start
/// this suffix, which is kept as part of the link.
const QUERY: &str = r"(?:[?#][^\s)\],*><{}|\\^]*)?";

/// Host with at least one dot, ending in a letters-only top-level label.
const HOST: &str = r"[a-z0-9][a-z0-9-]*(?:\.[a-z0-9-]+)*\.[a-z]{2,}";

/// Single label plus short top-level label.
const SHORT_HOST: &str = r"[a-z0-9-]+\.[a-z]{2,6}";

/// Label, dot, label ... then a top-level label of two or more letters.
const BARE_DOMAIN: &str = r"(?:[a-z0-9-]+\.)+[a-z]{2,}";

/// Dotted-quad address, optional scheme and port, then any path.
const IP_ADDRESS: &str = r"(?:https?://)?\d{1,3}(?:\.\d{1,3}){3}(?::\d+)?";

pub(crate) static LINK_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    let alternatives = [
        format!(r"(?P<ip>{IP_ADDRESS}(?:/{PATH_CHAR}*)?{QUERY})"),
        format!(r"https?://(?:www\.)?{HOST}{PATH_CHAR}*{QUERY}"),
        format!(r"www\.{HOST}{PATH_CHAR}*{QUERY}"),
        format!(r"https?://(?:www\.)?{SHORT_HOST}{PATH_CHAR}*{QUERY}"),
        format!(r"www\.{SHORT_HOST}{PATH_CHAR}*{QUERY}"),
        BARE_DOMAIN.to_string(),
    ];
    Regex::new(&format!("(?i)(?:{})", alternatives.join("|")))
        .expect("link pattern is a valid regex")
});

/// Link matches in `text`, left to right, without IP-based addresses.
pub(crate) fn links(text: &str) -> impl Iterator<Item = &str> {
    LINK_PATTERN
        .captures_iter(text)
        .filter(|caps| caps.name("ip").is_none())
        .filter_map(|caps| caps.get(0))
        .map(|m| m.as_str())
}
