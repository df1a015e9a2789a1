//! Safe rendering of model-generated markup.
//!
//! The markup returned by the model is never executed. The terminal preview
//! keeps only text content, mapped through a small allow-list of elements.
//! The browser export puts the markup in a sandboxed frame with scripts
//! disabled.

use anyhow::{Context, Result};
use regex::{Captures, Regex};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

const TAILWIND_CSS: &str = "https://cdn.jsdelivr.net/npm/tailwindcss@2.2.19/dist/tailwind.min.css";

pub const EXPORT_FILE_NAME: &str = "preview.html";

/// Elements dropped together with everything inside them.
const DROPPED_ELEMENTS: &[&str] = &[
    "script", "style", "iframe", "object", "embed", "noscript", "template", "svg", "head", "title",
];

/// Elements that start a new line.
const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "blockquote", "body", "dd", "div", "dl", "dt", "fieldset",
    "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "html",
    "li", "main", "nav", "ol", "p", "pre", "section", "table", "tr", "ul",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpanStyle {
    #[default]
    Plain,
    Heading,
    Emphasis,
    Link,
    Button,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewSpan {
    pub text: String,
    pub style: SpanStyle,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PreviewLine {
    pub spans: Vec<PreviewSpan>,
}

impl PreviewLine {
    pub fn text(&self) -> String {
        self.spans.iter().map(|s| s.text.as_str()).collect()
    }

    fn is_blank(&self) -> bool {
        self.spans.iter().all(|s| s.text.trim().is_empty())
    }
}

fn tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?s)<!--.*?-->|<![^>]*>|<\?[^>]*>|<(/?)([a-zA-Z][a-zA-Z0-9-]*)((?:[^>"']|"[^"]*"|'[^']*')*)>"#)
            .expect("tag pattern is valid")
    })
}

fn entity_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"&(#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6}|[a-zA-Z]+);").expect("entity pattern is valid")
    })
}

/// Remove a surrounding Markdown code fence, which models often add.
pub fn strip_code_fence(markup: &str) -> &str {
    let trimmed = markup.trim();
    if !(trimmed.starts_with("```") && trimmed.ends_with("```")) || trimmed.len() < 6 {
        return markup;
    }

    let inner = &trimmed[3..trimmed.len() - 3];
    match inner.find('\n') {
        Some(newline) => inner[newline + 1..].trim_end_matches(['\n', '\r']),
        None => inner,
    }
}

pub fn decode_entities(text: &str) -> String {
    entity_regex()
        .replace_all(text, |caps: &Captures| {
            let name = &caps[1];
            let decoded = if let Some(hex) = name.strip_prefix("#x").or_else(|| name.strip_prefix("#X")) {
                u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
            } else if let Some(dec) = name.strip_prefix('#') {
                dec.parse::<u32>().ok().and_then(char::from_u32)
            } else {
                match name {
                    "amp" => Some('&'),
                    "lt" => Some('<'),
                    "gt" => Some('>'),
                    "quot" => Some('"'),
                    "apos" => Some('\''),
                    "nbsp" => Some(' '),
                    "copy" => Some('©'),
                    "reg" => Some('®'),
                    "trade" => Some('™'),
                    "hellip" => Some('…'),
                    "mdash" => Some('—'),
                    "ndash" => Some('–'),
                    "rarr" => Some('→'),
                    _ => None,
                }
            };
            decoded.map(String::from).unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

struct PreviewBuilder {
    lines: Vec<PreviewLine>,
    current: PreviewLine,
    styles: Vec<(String, SpanStyle)>,
}

impl PreviewBuilder {
    fn new() -> Self {
        Self {
            lines: Vec::new(),
            current: PreviewLine::default(),
            styles: Vec::new(),
        }
    }

    fn style(&self) -> SpanStyle {
        self.styles.last().map(|(_, s)| *s).unwrap_or_default()
    }

    fn push_text(&mut self, raw: &str) {
        let mut text = String::with_capacity(raw.len());
        let mut last_space = self
            .current
            .spans
            .last()
            .map(|s| s.text.ends_with(' '))
            .unwrap_or(true);

        for c in raw.chars() {
            if c.is_whitespace() {
                if !last_space {
                    text.push(' ');
                    last_space = true;
                }
            } else {
                text.push(c);
                last_space = false;
            }
        }

        if text.is_empty() {
            return;
        }

        let style = self.style();
        match self.current.spans.last_mut() {
            Some(span) if span.style == style => span.text.push_str(&text),
            _ => self.current.spans.push(PreviewSpan { text, style }),
        }
    }

    fn push_literal(&mut self, text: &str, style: SpanStyle) {
        self.current.spans.push(PreviewSpan {
            text: text.to_string(),
            style,
        });
    }

    fn break_line(&mut self) {
        let mut line = std::mem::take(&mut self.current);
        if line.is_blank() {
            return;
        }
        if let Some(last) = line.spans.last_mut() {
            let trimmed = last.text.trim_end().len();
            last.text.truncate(trimmed);
        }
        line.spans.retain(|s| !s.text.is_empty());
        self.lines.push(line);
    }

    fn open(&mut self, name: &str, style: SpanStyle) {
        self.styles.push((name.to_string(), style));
    }

    fn close(&mut self, name: &str) {
        if let Some(pos) = self.styles.iter().rposition(|(n, _)| n == name) {
            self.styles.truncate(pos);
        }
    }

    fn finish(mut self) -> Vec<PreviewLine> {
        self.break_line();
        self.lines
    }
}

fn inline_style(name: &str) -> Option<SpanStyle> {
    match name {
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => Some(SpanStyle::Heading),
        "strong" | "b" | "em" | "i" => Some(SpanStyle::Emphasis),
        "a" => Some(SpanStyle::Link),
        "button" => Some(SpanStyle::Button),
        _ => None,
    }
}

/// Convert markup into styled text lines. Only text content survives;
/// scripts, styles, embedded frames, comments and all attributes are dropped.
pub fn render_preview(markup: &str) -> Vec<PreviewLine> {
    let markup = strip_code_fence(markup);
    let mut builder = PreviewBuilder::new();
    let mut dropping: Option<String> = None;
    let mut cursor = 0;

    for caps in tag_regex().captures_iter(markup) {
        let Some(whole) = caps.get(0) else { continue };
        if dropping.is_none() {
            builder.push_text(&decode_entities(&markup[cursor..whole.start()]));
        }
        cursor = whole.end();

        // Comments, doctypes and processing instructions have no name.
        let Some(name) = caps.get(2) else { continue };
        let name = name.as_str().to_ascii_lowercase();
        let closing = caps.get(1).is_some_and(|m| !m.as_str().is_empty());
        let self_closing = caps.get(3).is_some_and(|m| m.as_str().trim_end().ends_with('/'));

        if let Some(dropped) = &dropping {
            if closing && *dropped == name {
                dropping = None;
            }
            continue;
        }

        if DROPPED_ELEMENTS.contains(&name.as_str()) {
            if !closing && !self_closing {
                dropping = Some(name);
            }
            continue;
        }

        match name.as_str() {
            "br" => builder.break_line(),
            "hr" => {
                builder.break_line();
                builder.push_literal("────────", SpanStyle::Plain);
                builder.break_line();
            }
            "td" | "th" if closing => builder.push_text(" "),
            _ => {}
        }

        if BLOCK_ELEMENTS.contains(&name.as_str()) {
            builder.break_line();
        }

        if let Some(style) = inline_style(&name) {
            if closing {
                builder.close(&name);
            } else if !self_closing {
                builder.open(&name, style);
            }
        }

        if name == "li" && !closing {
            builder.push_literal("• ", SpanStyle::Plain);
        }
    }

    if dropping.is_none() && cursor < markup.len() {
        builder.push_text(&decode_entities(&markup[cursor..]));
    }

    builder.finish()
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Wrap `markup` in a standalone page that shows it inside a sandboxed
/// frame. The frame has no `allow-*` tokens, so scripts, forms and
/// navigation are all blocked.
pub fn sandboxed_document(markup: &str, title: &str) -> String {
    let inner = format!(
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\">\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\
         <link rel=\"stylesheet\" href=\"{}\"></head><body>{}</body></html>",
        TAILWIND_CSS,
        strip_code_fence(markup)
    );

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta http-equiv="Content-Security-Policy" content="default-src 'none'; script-src 'none'; style-src 'unsafe-inline' https://cdn.jsdelivr.net; font-src https://cdn.jsdelivr.net; img-src data:">
<title>{title}</title>
<style>html,body{{margin:0;height:100%}}iframe{{border:0;width:100%;height:100%}}</style>
</head>
<body>
<iframe sandbox="" title="{title}" srcdoc="{srcdoc}"></iframe>
</body>
</html>
"#,
        title = escape_html(title),
        srcdoc = escape_html(&inner),
    )
}

pub fn default_export_dir() -> Option<PathBuf> {
    dirs::cache_dir().map(|d| d.join("pagegen"))
}

/// Write the sandboxed page for `markup` to `dir/preview.html`.
pub fn export_preview(dir: &Path, markup: &str, title: &str) -> Result<PathBuf> {
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    let path = dir.join(EXPORT_FILE_NAME);
    fs::write(&path, sandboxed_document(markup, title))
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn texts(markup: &str) -> Vec<String> {
        render_preview(markup).iter().map(|l| l.text()).collect()
    }

    #[test]
    fn test_simple_div() {
        assert_eq!(texts("<div>X</div>"), vec!["X"]);
    }

    #[test]
    fn test_scripts_and_styles_are_dropped() {
        let markup = r#"<div>Hi<script>alert("pwned")</script><style>.a{color:red}</style> there</div>"#;
        let lines = texts(markup);
        assert_eq!(lines, vec!["Hi there"]);
    }

    #[test]
    fn test_attributes_never_leak() {
        let markup = r#"<img src=x onerror="alert(1)"><a href="javascript:alert(2)" onclick='steal()'>Sign up</a>"#;
        let joined = texts(markup).join("\n");
        assert_eq!(joined, "Sign up");
    }

    #[test]
    fn test_iframe_contents_dropped() {
        let lines = texts("<p>a</p><iframe src=\"evil\"><p>inside</p></iframe><p>b</p>");
        assert_eq!(lines, vec!["a", "b"]);
    }

    #[test]
    fn test_blocks_break_lines_and_collapse_whitespace() {
        let markup = "<section>\n  <h1>  Travel\n Planner </h1>\n  <p>Plan   trips\tfast</p>\n</section>";
        assert_eq!(texts(markup), vec!["Travel Planner", "Plan trips fast"]);
    }

    #[test]
    fn test_heading_and_button_styles() {
        let lines = render_preview("<h1>Title</h1><p>Go <button class=\"px-4\">Start</button></p>");
        assert_eq!(lines[0].spans[0].style, SpanStyle::Heading);
        assert_eq!(lines[1].spans[0].text, "Go ");
        assert_eq!(lines[1].spans[1].style, SpanStyle::Button);
        assert_eq!(lines[1].spans[1].text, "Start");
    }

    #[test]
    fn test_list_items_get_bullets() {
        let lines = texts("<ul><li>About</li><li>Contact</li><li>Privacy</li></ul>");
        assert_eq!(lines, vec!["• About", "• Contact", "• Privacy"]);
    }

    #[test]
    fn test_comments_and_doctype_removed() {
        let lines = texts("<!DOCTYPE html><!-- hidden <b>x</b> --><p>shown</p>");
        assert_eq!(lines, vec!["shown"]);
    }

    #[test]
    fn test_entities_decoded_but_not_parsed() {
        let lines = texts("<p>&lt;script&gt; &amp; &copy; 2024 &#x41;&#66; &bogus;</p>");
        assert_eq!(lines, vec!["<script> & © 2024 AB &bogus;"]);
    }

    #[test]
    fn test_code_fence_is_stripped() {
        assert_eq!(strip_code_fence("```html\n<div>Hello</div>\n```"), "<div>Hello</div>");
        assert_eq!(strip_code_fence("<div>Already clean</div>"), "<div>Already clean</div>");
        assert_eq!(texts("```html\n<p>fenced</p>\n```"), vec!["fenced"]);
    }

    #[test]
    fn test_unclosed_script_drops_rest() {
        assert_eq!(texts("<p>ok</p><script>never closed <p>x</p>"), vec!["ok"]);
    }

    #[test]
    fn test_empty_markup() {
        assert!(render_preview("").is_empty());
        assert!(render_preview("   \n ").is_empty());
    }

    #[test]
    fn test_sandboxed_document_escapes_markup() {
        let doc = sandboxed_document("<p onclick=\"x()\">Hi</p><script>alert('x')</script>", "Demo");
        assert!(doc.contains("<iframe sandbox=\"\""));
        assert!(doc.contains("script-src 'none'"));
        assert!(!doc.contains("<script"));
        assert!(doc.contains("&lt;script&gt;alert(&#39;x&#39;)&lt;/script&gt;"));
        assert!(doc.contains("onclick=&quot;x()&quot;"));
    }

    #[test]
    fn test_export_preview_writes_file() {
        let dir = TempDir::new().unwrap();
        let path = export_preview(&dir.path().join("out"), "<div>X</div>", "Demo").unwrap();
        assert_eq!(path.file_name().unwrap(), EXPORT_FILE_NAME);
        let written = fs::read_to_string(path).unwrap();
        assert!(written.contains("&lt;div&gt;X&lt;/div&gt;"));
    }
}
