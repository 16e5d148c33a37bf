/// Workflow name conventions
///
/// Helpers built on the stable business key: tag-prefix extraction for the
/// snapshot directory layout, filename sanitization, and the normalized title
/// form used as the loosest reference-matching strategy.

/// Split a conventional `[TAG]` prefix off a workflow name
///
/// `"[Billing] Send invoice"` becomes `(Some("Billing"), "Send invoice")`;
/// names without the prefix pass through with no tag.
pub fn split_tag_prefix(name: &str) -> (Option<String>, String) {
    let trimmed = name.trim();
    if let Some(rest) = trimmed.strip_prefix('[') {
        if let Some(end) = rest.find(']') {
            let tag = rest[..end].trim();
            let remainder = rest[end + 1..].trim();
            if !tag.is_empty() && !remainder.is_empty() {
                return (Some(tag.to_string()), remainder.to_string());
            }
        }
    }
    (None, trimmed.to_string())
}

/// Sanitize a workflow name into a safe filename (without extension)
///
/// Replaces path separators and other characters that are unsafe on common
/// filesystems with underscores, then collapses runs of whitespace.
pub fn sanitize_file_name(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let collapsed = collapse_whitespace(&replaced);
    let trimmed = collapsed.trim().trim_end_matches('.').to_string();
    if trimmed.is_empty() {
        "unnamed".to_string()
    } else {
        trimmed
    }
}

/// Normalized title form used for the loosest reference match
///
/// Strips every bracketed tag, collapses whitespace and lowercases, so that
/// `"[Billing]  Send Invoice "` and `"send invoice"` compare equal.
pub fn normalize_title(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut depth = 0usize;
    for c in name.chars() {
        match c {
            '[' => depth += 1,
            ']' if depth > 0 => depth -= 1,
            c if depth == 0 => out.push(c),
            _ => {}
        }
    }
    collapse_whitespace(&out).trim().to_lowercase()
}

fn collapse_whitespace(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut last_was_space = false;
    for c in input.chars() {
        if c.is_whitespace() {
            if !last_was_space {
                out.push(' ');
            }
            last_was_space = true;
        } else {
            out.push(c);
            last_was_space = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_prefix_is_extracted() {
        assert_eq!(
            split_tag_prefix("[Billing] Send invoice"),
            (Some("Billing".to_string()), "Send invoice".to_string())
        );
        assert_eq!(
            split_tag_prefix("Send invoice"),
            (None, "Send invoice".to_string())
        );
        // A bracket pair with nothing after it is part of the name, not a tag
        assert_eq!(
            split_tag_prefix("[Billing]"),
            (None, "[Billing]".to_string())
        );
    }

    #[test]
    fn unsafe_filename_characters_are_replaced() {
        assert_eq!(
            sanitize_file_name("ETL: load/transform *nightly*"),
            "ETL_ load_transform _nightly_"
        );
        assert_eq!(sanitize_file_name("  "), "unnamed");
        assert_eq!(sanitize_file_name("report..."), "report");
    }

    #[test]
    fn normalized_titles_ignore_tags_whitespace_and_case() {
        assert_eq!(normalize_title("[Billing]  Send Invoice "), "send invoice");
        assert_eq!(normalize_title("send invoice"), "send invoice");
        assert_ne!(normalize_title("send invoices"), normalize_title("send invoice"));
    }
}
