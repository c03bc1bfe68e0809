// SPDX-FileCopyrightText: 2026 Harvest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Link and domain extraction for message text.
//!
//! [`extract`] is a pure function: it finds link-like substrings with a
//! best-effort heuristic and maps each to its registrable domain. It never
//! fails; text without links yields an empty [`Extraction`].

pub mod domain;
mod pattern;

pub use domain::registrable_domain;

/// Links found in a piece of text, with their registrable domains.
///
/// `domains[i]` belongs to `urls[i]`; it is the empty string when no
/// registrable domain could be derived for that link.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    pub urls: Vec<String>,
    pub domains: Vec<String>,
}

impl Extraction {
    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    /// Consume into `(urls, domains)`.
    pub fn into_parts(self) -> (Vec<String>, Vec<String>) {
        (self.urls, self.domains)
    }
}

/// Extract links and registrable domains from `text`.
///
/// Matches are non-overlapping and reported left to right, exactly as they
/// appear in the text. Domains are derived from the lower-cased link.
pub fn extract(text: &str) -> Extraction {
    let urls: Vec<String> = pattern::links(text).map(str::to_string).collect();
    let domains = urls
        .iter()
        .map(|url| registrable_domain(url).unwrap_or_default())
        .collect();

    Extraction { urls, domains }
}
