//! Best-effort input sanitization for free-text and rich-content fields.
//!
//! Free text (bios, display names, message bodies) gets tags and control
//! characters stripped outright. Rich content keeps an allow-listed subset of
//! tags with no attributes except `href` on links.

const ALLOWED_TAGS: &[&str] = &[
    "b", "i", "em", "strong", "u", "p", "br", "ul", "ol", "li", "a",
];

/// Remove every `<...>` run and control characters from free text.
pub fn strip_tags(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut in_tag = false;

    for c in input.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if in_tag => {}
            c if c.is_control() && c != '\n' && c != '\t' => {}
            c => out.push(c),
        }
    }

    out.trim().to_string()
}

/// Clamp a free-text field to `max_len` characters after stripping.
pub fn clean_text(input: &str, max_len: usize) -> String {
    let stripped = strip_tags(input);
    stripped.chars().take(max_len).collect()
}

fn tag_name(tag_body: &str) -> &str {
    let body = tag_body.trim_start_matches('/');
    body.split(|c: char| c.is_whitespace() || c == '/' || c == '>')
        .next()
        .unwrap_or("")
}

/// Keep only allow-listed tags; attributes are dropped except a safe `href`
/// on anchors. Everything between angle brackets that is not an allowed tag
/// disappears; stray `<` is escaped.
pub fn sanitize_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(open) = rest.find('<') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];

        let Some(close) = after.find('>') else {
            // Unterminated tag: escape and stop
            out.push_str("&lt;");
            out.push_str(after);
            return out;
        };

        let body = &after[..close];
        let name = tag_name(body).to_ascii_lowercase();
        let is_closing = body.starts_with('/');

        if ALLOWED_TAGS.contains(&name.as_str()) {
            if is_closing {
                out.push_str(&format!("</{name}>"));
            } else if name == "a" {
                match safe_href(body) {
                    Some(href) => out.push_str(&format!("<a href=\"{href}\">")),
                    None => out.push_str("<a>"),
                }
            } else {
                out.push_str(&format!("<{name}>"));
            }
        }
        // Disallowed tags are dropped entirely

        rest = &after[close + 1..];
    }

    out.push_str(rest);
    out
}

/// Extract an `href` that uses an http(s) scheme; anything else (javascript:,
/// data:, protocol-relative) is discarded.
fn safe_href(tag_body: &str) -> Option<String> {
    let lower = tag_body.to_ascii_lowercase();
    let idx = lower.find("href=")?;
    let value = &tag_body[idx + 5..];
    let quote = value.chars().next()?;
    if quote != '"' && quote != '\'' {
        return None;
    }
    let inner = &value[1..];
    let end = inner.find(quote)?;
    let href = &inner[..end];

    let scheme_ok = href.starts_with("https://") || href.starts_with("http://");
    if scheme_ok && !href.contains('"') {
        Some(href.to_string())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_tags_from_free_text() {
        assert_eq!(strip_tags("hello <b>world</b>"), "hello world");
        assert_eq!(strip_tags("<script>alert(1)</script>safe"), "alert(1)safe");
        assert_eq!(strip_tags("no tags here"), "no tags here");
    }

    #[test]
    fn strips_control_characters() {
        assert_eq!(strip_tags("ab\u{0}cd\u{7}ef"), "abcdef");
        // Newlines and tabs survive
        assert_eq!(strip_tags("line1\nline2\ttab"), "line1\nline2\ttab");
    }

    #[test]
    fn clean_text_clamps_length() {
        assert_eq!(clean_text("abcdef", 3), "abc");
        assert_eq!(clean_text("<i>abcdef</i>", 4), "abcd");
    }

    #[test]
    fn html_keeps_allowed_tags_only() {
        assert_eq!(
            sanitize_html("<p>hi <strong>there</strong></p>"),
            "<p>hi <strong>there</strong></p>"
        );
        assert_eq!(sanitize_html("<script>bad()</script>ok"), "bad()ok");
        assert_eq!(sanitize_html("<img src=x onerror=bad()>text"), "text");
    }

    #[test]
    fn html_drops_attributes_except_safe_href() {
        assert_eq!(
            sanitize_html(r#"<b onclick="x()">bold</b>"#),
            "<b>bold</b>"
        );
        assert_eq!(
            sanitize_html(r#"<a href="https://example.com" onclick="x()">link</a>"#),
            r#"<a href="https://example.com">link</a>"#
        );
        assert_eq!(
            sanitize_html(r#"<a href="javascript:alert(1)">link</a>"#),
            "<a>link</a>"
        );
    }

    #[test]
    fn unterminated_tag_is_escaped() {
        assert_eq!(sanitize_html("text <b unclosed"), "text &lt;b unclosed");
    }
}
