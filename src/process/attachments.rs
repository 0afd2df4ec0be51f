const URL_MARKER: &str = "https://";

/// Pull the first `https://...` URL out of an attachment descriptor, ending at
/// the next single quote. Best effort: no marker or no closing quote gives `None`.
pub fn extract_url_from_attachments(text: &str) -> Option<&str> {
    let start = text.find(URL_MARKER)?;
    let end = start + text[start..].find('\'')?;
    (end > start).then(|| &text[start..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_first_quoted_url() {
        let s = "[{'name': 'bilag.pdf', 'url': 'https://forms.example.dk/a/b?id=7'}, {'url': 'https://other'}]";
        assert_eq!(
            extract_url_from_attachments(s),
            Some("https://forms.example.dk/a/b?id=7")
        );
    }

    #[test]
    fn absent_without_marker_or_quote() {
        assert_eq!(extract_url_from_attachments(""), None);
        assert_eq!(extract_url_from_attachments("nan"), None);
        assert_eq!(extract_url_from_attachments("http://plain'"), None);
        assert_eq!(extract_url_from_attachments("see https://x.dk/file"), None);
    }
}
