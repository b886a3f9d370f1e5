use std::collections::HashSet;

use ammonia::Builder;

/// Strips markup from free-text form input: tags are dropped (their text is
/// kept), stray angle brackets removed and surrounding whitespace trimmed.
pub fn sanitize_input(input: &str) -> String {
    let stripped = Builder::empty()
        .tags(HashSet::new())
        .clean_content_tags(HashSet::from(["script", "style"]))
        .clean(input)
        .to_string();

    // `clean` re-escapes the text it keeps.
    let unescaped = stripped
        .replace("&lt;", "")
        .replace("&gt;", "")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&nbsp;", "\u{a0}")
        .replace("&amp;", "&");

    unescaped.replace(['<', '>'], "").trim().to_string()
}

/// Escapes text for interpolation into an HTML email body.
pub fn escape_html(text: &str) -> String {
    ammonia::clean_text(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removes_tags_but_keeps_their_text() {
        assert_eq!(sanitize_input("  <b>Hello</b> <script>alert(1)</script>world "), "Hello world");
    }

    #[test]
    fn keeps_ordinary_punctuation() {
        assert_eq!(sanitize_input("O'Brien & Sons"), "O'Brien & Sons");
    }

    #[test]
    fn escaped_text_cannot_open_tags() {
        let escaped = escape_html("<img src=x>");
        assert!(!escaped.contains('<'));
    }
}
