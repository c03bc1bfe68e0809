// SPDX-FileCopyrightText: 2026 Harvest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Registrable-domain derivation against the Public Suffix List.

/// Pull the host out of a matched link: drop the scheme, stop at the first
/// character that cannot appear in a hostname, trim trailing dots.
pub fn host_of(link: &str) -> &str {
    let rest = link.split_once("://").map_or(link, |(_, rest)| rest);
    let end = rest
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '.' || c == '-'))
        .unwrap_or(rest.len());
    rest[..end].trim_end_matches('.')
}

/// The registrable domain of a link (`sub.example.co.uk` → `example.co.uk`).
///
/// Returns `None` when the host is empty, is itself a public suffix, or does
/// not end in a suffix the list knows about.
pub fn registrable_domain(link: &str) -> Option<String> {
    let lowered = link.to_ascii_lowercase();
    let host = host_of(&lowered);
    if host.is_empty() {
        return None;
    }

    let domain = psl::domain(host.as_bytes())?;
    if !domain.suffix().is_known() {
        return None;
    }
    std::str::from_utf8(domain.as_bytes())
        .ok()
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_strips_scheme_path_query_and_port() {
        assert_eq!(host_of("https://www.example.com/a?b=c"), "www.example.com");
        assert_eq!(host_of("http://example.com:8080/x"), "example.com");
        assert_eq!(host_of("sub.example.org"), "sub.example.org");
        assert_eq!(host_of("https://example.com."), "example.com");
    }

    #[test]
    fn collapses_subdomains() {
        assert_eq!(
            registrable_domain("subdomain.example.com").as_deref(),
            Some("example.com")
        );
        assert_eq!(
            registrable_domain("https://www.Example.COM/Path").as_deref(),
            Some("example.com")
        );
        assert_eq!(registrable_domain("2.bbc.news.sk").as_deref(), Some("news.sk"));
    }

    #[test]
    fn respects_multi_label_suffixes() {
        assert_eq!(
            registrable_domain("http://shop.example.co.uk/cart").as_deref(),
            Some("example.co.uk")
        );
    }

    #[test]
    fn suffix_only_or_unknown_suffix_yields_none() {
        assert_eq!(registrable_domain("co.uk"), None);
        assert_eq!(registrable_domain("https://"), None);
        assert_eq!(registrable_domain("readme.notarealtld"), None);
    }
}
