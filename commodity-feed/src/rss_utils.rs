/// Link and text helpers shared by the decoder and the normalizer

/// Link utilities
pub mod url {
    use url::Url;

    /// Dedup identity for a link: everything from the first `?` or `#` is dropped.
    ///
    /// Works on the raw string so links that `Url` would reject still get a
    /// stable identity.
    pub fn canonicalize_link(link: &str) -> String {
        let trimmed = link.trim();
        let end = trimmed.find(['?', '#']).unwrap_or(trimmed.len());
        trimmed[..end].trim().to_string()
    }

    /// Validate feed URL format
    pub fn is_valid_feed_url(url_str: &str) -> bool {
        match Url::parse(url_str) {
            Ok(url) => (url.scheme() == "http" || url.scheme() == "https") && url.host().is_some(),
            Err(_) => false,
        }
    }
}

/// Feed text cleanup
pub mod feed {
    use once_cell::sync::Lazy;
    use regex::Regex;

    static RE_TAGS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<[^>]+>").unwrap());
    static RE_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

    /// Markup to plain text: tags removed, entities decoded, whitespace collapsed.
    pub fn strip_markup(html: &str) -> String {
        let without_tags = RE_TAGS.replace_all(html, " ");
        let decoded = html_escape::decode_html_entities(&without_tags);
        RE_WS.replace_all(&decoded, " ").trim().to_string()
    }

    /// Cut to at most `max_chars` characters, appending `"..."` only when cut.
    /// Counts chars, not bytes, so multi-byte text never splits mid-character.
    pub fn truncate_chars(text: &str, max_chars: usize) -> String {
        match text.char_indices().nth(max_chars) {
            None => text.to_string(),
            Some((byte_idx, _)) => format!("{}...", text[..byte_idx].trim_end()),
        }
    }
}
