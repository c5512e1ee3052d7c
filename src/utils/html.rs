//! Small HTML helpers for rendering chat messages.

const EMPTY_CANVAS: &str =
    "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"100%\" height=\"300\"></svg>";

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

/// Escaped text with line breaks kept.
pub fn text_to_html(text: &str) -> String {
    escape(text).replace("\r\n", "\n").replace('\n', "<br>")
}

pub fn option_buttons(labels: &[&str]) -> String {
    if labels.is_empty() {
        return String::new();
    }
    let buttons: String = labels
        .iter()
        .map(|label| format!("<button class=\"chat-option\">{}</button>", escape(label)))
        .collect();
    format!("<div class=\"chat-options\">{}</div>", buttons)
}

/// The first complete `<svg>...</svg>` element found in `text`, or an empty
/// canvas when there is none.
pub fn canvas_svg(text: &str) -> String {
    extract_svg(text)
        .map(str::to_string)
        .unwrap_or_else(|| EMPTY_CANVAS.to_string())
}

fn extract_svg(text: &str) -> Option<&str> {
    const OPEN: &str = "<svg";
    const CLOSE: &str = "</svg>";

    let start = text.find(OPEN)?;
    let mut depth = 0usize;
    let mut pos = start;
    loop {
        let rest = &text[pos..];
        let close = rest.find(CLOSE)?;
        match rest.find(OPEN) {
            Some(open) if open < close => {
                depth += 1;
                pos += open + OPEN.len();
            }
            _ => {
                depth = depth.saturating_sub(1);
                pos += close + CLOSE.len();
                if depth == 0 {
                    return Some(&text[start..pos]);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_markup() {
        assert_eq!(
            escape("<b>\"a\" & 'b'</b>"),
            "&lt;b&gt;&quot;a&quot; &amp; &#x27;b&#x27;&lt;/b&gt;"
        );
    }

    #[test]
    fn newlines_become_breaks() {
        assert_eq!(text_to_html("one\r\ntwo\nthree"), "one<br>two<br>three");
    }

    #[test]
    fn nested_svg_is_kept_whole() {
        let text = "x <svg a=\"1\"><svg b=\"2\"></svg><rect/></svg> y </svg>";
        assert_eq!(
            canvas_svg(text),
            "<svg a=\"1\"><svg b=\"2\"></svg><rect/></svg>"
        );
    }

    #[test]
    fn unterminated_svg_falls_back_to_empty_canvas() {
        assert_eq!(canvas_svg("<svg width=\"3\"><line/>"), EMPTY_CANVAS);
        assert_eq!(canvas_svg(""), EMPTY_CANVAS);
    }

    #[test]
    fn no_labels_no_markup() {
        assert_eq!(option_buttons(&[]), "");
    }
}
