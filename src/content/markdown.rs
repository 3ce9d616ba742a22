//! Markdown rendering with syntax highlighting and HTML sanitization

use ammonia::Builder;
use anyhow::{anyhow, Result};
use pulldown_cmark::{html, CodeBlockKind, CowStr, Event, Options, Parser, Tag, TagEnd};
use syntect::highlighting::ThemeSet;
use syntect::html::{css_for_theme_with_class_style, ClassStyle, ClassedHTMLGenerator};
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;

const CLASS_STYLE: ClassStyle = ClassStyle::SpacedPrefixed { prefix: "hl-" };

/// Markdown renderer with syntax highlighting.
///
/// Every string it hands out has been through [`sanitize`].
pub struct MarkdownRenderer {
    syntax_set: SyntaxSet,
    theme_set: ThemeSet,
    theme_name: String,
}

impl MarkdownRenderer {
    /// Create a new markdown renderer
    pub fn new() -> Self {
        Self::with_theme("base16-ocean.dark")
    }

    /// Create with a specific highlighting theme
    pub fn with_theme(theme: &str) -> Self {
        Self {
            syntax_set: SyntaxSet::load_defaults_newlines(),
            theme_set: ThemeSet::load_defaults(),
            theme_name: theme.to_string(),
        }
    }

    /// Render markdown to sanitized HTML
    pub fn render(&self, markdown: &str) -> String {
        // Front-matter is stripped before we get here, so no metadata blocks
        let options = Options::ENABLE_TABLES
            | Options::ENABLE_STRIKETHROUGH
            | Options::ENABLE_TASKLISTS
            | Options::ENABLE_SMART_PUNCTUATION
            | Options::ENABLE_GFM;
        let parser = Parser::new_ext(markdown, options);

        let mut events: Vec<Event> = Vec::new();
        // (language, buffered source) while inside a code block
        let mut code_block: Option<(Option<String>, String)> = None;

        for event in parser {
            match event {
                Event::Start(Tag::CodeBlock(kind)) => {
                    let lang = match kind {
                        CodeBlockKind::Fenced(info) => {
                            info.split_whitespace().next().map(str::to_string)
                        }
                        CodeBlockKind::Indented => None,
                    };
                    code_block = Some((lang, String::new()));
                }
                Event::End(TagEnd::CodeBlock) => {
                    if let Some((lang, source)) = code_block.take() {
                        let highlighted = self.highlight_code(&source, lang.as_deref());
                        events.push(Event::Html(CowStr::from(highlighted)));
                    }
                }
                Event::Text(text) => match code_block.as_mut() {
                    Some((_, source)) => source.push_str(&text),
                    None => events.push(Event::Text(text)),
                },
                other => events.push(other),
            }
        }

        let mut html_output = String::new();
        html::push_html(&mut html_output, events.into_iter());

        sanitize(&html_output)
    }

    /// Highlight a code block into class-annotated spans
    fn highlight_code(&self, code: &str, lang: Option<&str>) -> String {
        let lang = lang.map(language_token).unwrap_or_default();
        let syntax = self
            .syntax_set
            .find_syntax_by_token(&lang)
            .unwrap_or_else(|| self.syntax_set.find_syntax_plain_text());

        let mut generator =
            ClassedHTMLGenerator::new_with_class_style(syntax, &self.syntax_set, CLASS_STYLE);
        for line in LinesWithEndings::from(code) {
            if let Err(e) = generator.parse_html_for_line_which_includes_newline(line) {
                tracing::debug!("Highlighting failed for {:?}: {}", lang, e);
                return format!(
                    r#"<pre class="highlight"><code class="language-{}">{}</code></pre>"#,
                    lang,
                    html_escape(code)
                );
            }
        }

        format!(
            r#"<pre class="highlight"><code class="language-{}">{}</code></pre>"#,
            lang,
            generator.finalize()
        )
    }

    /// Stylesheet for the highlighting classes
    pub fn highlight_css(&self) -> Result<String> {
        let theme = self
            .theme_set
            .themes
            .get(&self.theme_name)
            .ok_or_else(|| anyhow!("Unknown highlight theme: {}", self.theme_name))?;
        Ok(css_for_theme_with_class_style(theme, CLASS_STYLE)?)
    }
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Strip executable content from HTML.
///
/// Removes script and style elements with their content, event handler and
/// other non-allowlisted attributes, and non-http(s)/mailto URLs. Applying it
/// twice gives the same output as applying it once.
pub fn sanitize(html: &str) -> String {
    sanitizer().clean(html).to_string()
}

fn sanitizer() -> Builder<'static> {
    let mut builder = Builder::default();
    builder
        .add_generic_attributes(&["class"])
        .add_tags(&["input"])
        .add_tag_attributes("input", &["type", "checked", "disabled"]);
    builder
}

/// Keep only characters that are valid in a syntax token / class name
fn language_token(lang: &str) -> String {
    lang.chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '+' | '#'))
        .collect::<String>()
        .to_ascii_lowercase()
}

/// Simple HTML escaping
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_basic_markdown() {
        let renderer = MarkdownRenderer::new();
        let html = renderer.render("# Hello World\n\nThis is a test.");
        assert!(html.contains("<h1>Hello World</h1>"));
        assert!(html.contains("<p>This is a test.</p>"));
    }

    #[test]
    fn test_render_is_deterministic() {
        let renderer = MarkdownRenderer::new();
        let md = "## Title\n\n- a\n- b\n\n```rust\nfn main() {}\n```\n";
        assert_eq!(renderer.render(md), renderer.render(md));
    }

    #[test]
    fn test_render_code_block_keeps_highlight_classes() {
        let renderer = MarkdownRenderer::new();
        let html = renderer.render("```rust\nfn main() {}\n```");
        assert!(html.contains("<pre class=\"highlight\">"));
        assert!(html.contains("language-rust"));
        assert!(html.contains("hl-"));
        assert!(html.contains("main"));
    }

    #[test]
    fn test_render_strips_executable_content() {
        let renderer = MarkdownRenderer::new();
        let md = "Hello <script>alert(1)</script>\n\n\
                  <div onclick=\"evil()\">click</div>\n\n\
                  [bad](javascript:alert(2)) <img src=x onerror=alert(3)>";
        let html = renderer.render(md);
        assert!(!html.contains("<script"));
        assert!(!html.contains("alert("));
        assert!(!html.contains("onclick"));
        assert!(!html.contains("onerror"));
        assert!(!html.contains("javascript:"));
        assert!(html.contains("click"));
    }

    #[test]
    fn test_sanitize_is_idempotent() {
        let samples = [
            r#"<p onclick="x()">Hi &amp; bye <a href="https://a.b">l</a><script>alert(1)</script></p>"#,
            r#"<pre class="highlight"><code><span class="hl-source">a &lt; b</span></code></pre>"#,
            r#"<table><tr><td style="color:red">1</td></tr></table><iframe src="https://x"></iframe>"#,
            "plain text with <b>bold</b> and <unknown>tags</unknown>",
        ];
        for sample in samples {
            let once = sanitize(sample);
            assert_eq!(sanitize(&once), once, "not idempotent for {}", sample);
            assert!(!once.contains("<script"));
        }
    }

    #[test]
    fn test_language_token() {
        assert_eq!(language_token("Rust"), "rust");
        assert_eq!(language_token("c++\"><x"), "c++x");
    }

    #[test]
    fn test_highlight_css() {
        let renderer = MarkdownRenderer::new();
        let css = renderer.highlight_css().unwrap();
        assert!(css.contains(".hl-"));
        assert!(MarkdownRenderer::with_theme("nope").highlight_css().is_err());
    }
}
