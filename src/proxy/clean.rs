//! Image URL cleaning
//!
//! Content generators append decoration to image links (`---`, `*---`,
//! markdown anchors). The cleaner removes it before the URL is parsed:
//! when the string ends in a known image extension (optionally followed by
//! a query or fragment) it is cut right after the extension, otherwise the
//! decorative suffix rules apply.

use std::sync::LazyLock;

use regex::Regex;

use crate::paths::percent_decode_lossless;

/// `<anything>.<image ext>` optionally followed by `?query` or `#fragment`
static RE_IMAGE_EXT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(.*?\.(?:jpg|jpeg|png|gif|webp|svg))(?:[?#].*)?$")
        .expect("image extension pattern is valid")
});

/// Asterisks, `%2A` or whitespace followed by two or more dashes, and the rest
static RE_STARRED_DASHES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)(?:\*|%2[Aa]|\s)+-{2,}.*$").expect("starred dash pattern is valid")
});

/// First run of two or more `-`, `*` or `_`, and the rest
static RE_DECORATIVE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)[-*_]{2,}.*$").expect("decorative run pattern is valid"));

/// `scheme://authority`, kept out of suffix stripping so punycode hosts
/// (`xn--...`) stay intact
static RE_AUTHORITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*://[^/?#]*").expect("authority pattern is valid")
});

/// Clean a raw `url` query value into the address that should be fetched
pub fn clean_url(raw: &str) -> String {
    let decoded = percent_decode_lossless(raw);
    let decoded = decoded.trim();

    if let Some(caps) = RE_IMAGE_EXT.captures(decoded) {
        if let Some(m) = caps.get(1) {
            return m.as_str().trim().to_string();
        }
    }

    let split = RE_AUTHORITY.find(decoded).map_or(0, |m| m.end());
    let (authority, rest) = decoded.split_at(split);
    let rest = RE_STARRED_DASHES.replace(rest, "");
    let rest = RE_DECORATIVE_RUN.replace(&rest, "");
    format!("{authority}{rest}").trim().to_string()
}
