/// First `max_chars` characters of `content` on one line.
///
/// Newlines become spaces and the result is trimmed; `...` is appended when
/// the content was cut.
pub fn preview(content: &str, max_chars: usize) -> String {
    let mut chars = content.chars();
    let head: String = chars.by_ref().take(max_chars).collect();
    let truncated = chars.next().is_some();
    let line = head.replace(['\r', '\n'], " ");
    let line = line.trim();
    if truncated { format!("{line}...") } else { line.to_string() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_content_untouched() {
        assert_eq!(preview("hello", 10), "hello");
    }

    #[test]
    fn collapses_newlines_and_truncates() {
        assert_eq!(preview("# Title\nbody text here", 12), "# Title body...");
    }

    #[test]
    fn counts_chars_not_bytes() {
        assert_eq!(preview("héllo wörld", 5), "héllo...");
    }
}
