//! Normalization helpers for raw source content
//!
//! Headline titles arrive HTML-escaped, sometimes wrapped in CDATA markers,
//! and timestamps arrive in whatever format the source uses. These helpers
//! turn that raw material into display-ready strings.

use chrono::{DateTime, Utc};

/// Decodes common HTML entities in `text`.
///
/// Handles the named entities that show up in news titles plus numeric
/// references (`&#NNN;` and `&#xHH;`). Unrecognized entities are left as-is.
pub fn decode_html_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find('&') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        match tail.find(';') {
            // Entity names are short; anything longer is treated as a bare
            // ampersand rather than scanned to the end of the string.
            Some(end) if end > 1 && end <= 10 => match decode_entity(&tail[1..end]) {
                Some(decoded) => {
                    out.push(decoded);
                    rest = &tail[end + 1..];
                }
                None => {
                    out.push('&');
                    rest = &tail[1..];
                }
            },
            _ => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(entity: &str) -> Option<char> {
    if let Some(num) = entity.strip_prefix('#') {
        let code = if let Some(hex) = num.strip_prefix('x').or_else(|| num.strip_prefix('X')) {
            u32::from_str_radix(hex, 16).ok()?
        } else {
            num.parse::<u32>().ok()?
        };
        return char::from_u32(code);
    }

    let ch = match entity {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => ' ',
        "ndash" => '\u{2013}',
        "mdash" => '\u{2014}',
        "lsquo" => '\u{2018}',
        "rsquo" => '\u{2019}',
        "ldquo" => '\u{201C}',
        "rdquo" => '\u{201D}',
        "hellip" => '\u{2026}',
        _ => return None,
    };
    Some(ch)
}

/// Removes CDATA section markers from feed titles.
pub fn strip_cdata(text: &str) -> String {
    text.replace("<![CDATA[", "").replace("]]>", "")
}

/// Formats how long ago `published` was, relative to `now`.
///
/// Buckets use integer-truncated division: `"Nd ago"` from one day, `"Nh
/// ago"` from one hour, `"Nm ago"` from one minute, otherwise `"Just now"`.
/// Timestamps in the future also read as `"Just now"`.
pub fn format_time_ago(published: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let minutes = (now - published).num_minutes();
    let hours = minutes / 60;
    let days = hours / 24;

    if days > 0 {
        format!("{}d ago", days)
    } else if hours > 0 {
        format!("{}h ago", hours)
    } else if minutes > 0 {
        format!("{}m ago", minutes)
    } else {
        "Just now".to_string()
    }
}
