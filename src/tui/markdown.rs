//! Markdown rendering for the detail pane.
//!
//! Details are stored as raw Markdown and only rendered when shown. The
//! renderer is a trait so the pane can be driven by a stand-in that fails.

use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span, Text};

use crate::tui::theme::Theme;

/// Largest details source the renderer accepts
pub const MAX_RENDER_BYTES: usize = 256 * 1024;

/// Error type for markdown rendering
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RenderError {
    #[error("details too large to render ({size} bytes, limit {limit})")]
    TooLarge { size: usize, limit: usize },
    #[error("renderer failed: {0}")]
    Failed(String),
}

/// Turns Markdown source into display-safe styled text.
pub trait MarkdownRenderer {
    fn render(&self, source: &str) -> Result<Text<'static>, RenderError>;
}

/// `pulldown-cmark` backed renderer
#[derive(Debug, Clone)]
pub struct CmarkRenderer {
    heading: Style,
    code: Style,
    link: Style,
    dim: Style,
}

impl Default for CmarkRenderer {
    fn default() -> Self {
        Self::new(&Theme::default())
    }
}

impl CmarkRenderer {
    pub fn new(theme: &Theme) -> Self {
        CmarkRenderer {
            heading: Style::default()
                .fg(theme.highlight)
                .add_modifier(Modifier::BOLD),
            code: Style::default().fg(theme.code),
            link: Style::default()
                .fg(theme.cyan)
                .add_modifier(Modifier::UNDERLINED),
            dim: Style::default().fg(theme.dim),
        }
    }
}

impl MarkdownRenderer for CmarkRenderer {
    fn render(&self, source: &str) -> Result<Text<'static>, RenderError> {
        if source.len() > MAX_RENDER_BYTES {
            return Err(RenderError::TooLarge {
                size: source.len(),
                limit: MAX_RENDER_BYTES,
            });
        }
        let mut options = Options::empty();
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);

        let mut out = TextBuilder::new(self);
        for event in Parser::new_ext(source, options) {
            out.event(event);
        }
        Ok(out.finish())
    }
}

/// One entry per open list: the next ordinal for ordered lists
type ListFrame = Option<u64>;

struct TextBuilder<'r> {
    styles: &'r CmarkRenderer,
    lines: Vec<Line<'static>>,
    current: Vec<Span<'static>>,
    inline: Vec<Style>,
    lists: Vec<ListFrame>,
    links: Vec<String>,
    quote_depth: usize,
    in_code_block: bool,
}

impl<'r> TextBuilder<'r> {
    fn new(styles: &'r CmarkRenderer) -> Self {
        TextBuilder {
            styles,
            lines: Vec::new(),
            current: Vec::new(),
            inline: Vec::new(),
            lists: Vec::new(),
            links: Vec::new(),
            quote_depth: 0,
            in_code_block: false,
        }
    }

    fn style(&self) -> Style {
        self.inline
            .iter()
            .fold(Style::default(), |acc, s| acc.patch(*s))
    }

    fn start_line(&mut self) {
        if self.current.is_empty() && self.quote_depth > 0 {
            self.current
                .push(Span::styled("│ ".repeat(self.quote_depth), self.styles.dim));
        }
    }

    fn push(&mut self, text: &str, style: Style) {
        let clean = sanitize(text);
        if clean.is_empty() {
            return;
        }
        self.start_line();
        self.current.push(Span::styled(clean, style));
    }

    fn flush(&mut self) {
        if !self.current.is_empty() {
            let spans = std::mem::take(&mut self.current);
            self.lines.push(Line::from(spans));
        }
    }

    /// End the current block, leaving one blank line after it outside lists.
    fn end_block(&mut self) {
        self.flush();
        if self.lists.is_empty() && self.lines.last().is_some_and(|l| l.width() > 0) {
            self.lines.push(Line::default());
        }
    }

    /// Text that keeps its own line structure (code and raw HTML blocks)
    fn push_preformatted(&mut self, text: &str, style: Style) {
        let mut parts = text.split('\n').peekable();
        while let Some(part) = parts.next() {
            if parts.peek().is_none() && part.is_empty() {
                break;
            }
            self.start_line();
            self.current.push(Span::styled(
                format!("  {}", sanitize(part)),
                style,
            ));
            self.flush();
        }
    }

    fn event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) => {
                if self.in_code_block {
                    self.push_preformatted(&text, self.styles.code);
                } else {
                    let style = self.style();
                    self.push(&text, style);
                }
            }
            Event::Code(code) => {
                let style = self.style().patch(self.styles.code);
                self.push(&code, style);
            }
            Event::Html(html) => self.push_preformatted(&html, self.styles.dim),
            Event::InlineHtml(html) => self.push(&html, self.styles.dim),
            Event::SoftBreak => {
                let style = self.style();
                self.push(" ", style);
            }
            Event::HardBreak => self.flush(),
            Event::Rule => {
                self.flush();
                self.lines
                    .push(Line::from(Span::styled("─".repeat(24), self.styles.dim)));
                self.end_block();
            }
            Event::TaskListMarker(done) => {
                let marker = if done { "[x] " } else { "[ ] " };
                self.push(marker, self.styles.dim);
            }
            _ => {}
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Heading { .. } => {
                self.flush();
                self.inline.push(self.styles.heading);
            }
            Tag::BlockQuote { .. } => {
                self.flush();
                self.quote_depth += 1;
            }
            Tag::CodeBlock(kind) => {
                self.flush();
                self.in_code_block = true;
                if let CodeBlockKind::Fenced(lang) = kind {
                    if !lang.is_empty() {
                        self.push(&lang, self.styles.dim);
                        self.flush();
                    }
                }
            }
            Tag::List(start) => {
                self.flush();
                self.lists.push(start);
            }
            Tag::Item => {
                self.flush();
                let depth = self.lists.len().saturating_sub(1);
                let marker = match self.lists.last_mut() {
                    Some(Some(n)) => {
                        let marker = format!("{}. ", n);
                        *n += 1;
                        marker
                    }
                    _ => "• ".to_string(),
                };
                self.push(&format!("{}{}", "  ".repeat(depth), marker), self.styles.dim);
            }
            Tag::Emphasis => self.inline.push(Style::default().add_modifier(Modifier::ITALIC)),
            Tag::Strong => self.inline.push(Style::default().add_modifier(Modifier::BOLD)),
            Tag::Strikethrough => self
                .inline
                .push(Style::default().add_modifier(Modifier::CROSSED_OUT)),
            Tag::Link { dest_url, .. } | Tag::Image { dest_url, .. } => {
                self.inline.push(self.styles.link);
                self.links.push(dest_url.to_string());
            }
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => self.end_block(),
            TagEnd::Heading(_) => {
                self.inline.pop();
                self.end_block();
            }
            TagEnd::BlockQuote { .. } => {
                self.flush();
                self.quote_depth = self.quote_depth.saturating_sub(1);
                if self.quote_depth == 0 {
                    self.end_block();
                }
            }
            TagEnd::CodeBlock => {
                self.in_code_block = false;
                self.end_block();
            }
            TagEnd::List(_) => {
                self.flush();
                self.lists.pop();
                if self.lists.is_empty() {
                    self.end_block();
                }
            }
            TagEnd::Item => self.flush(),
            TagEnd::Emphasis | TagEnd::Strong | TagEnd::Strikethrough => {
                self.inline.pop();
            }
            TagEnd::Link | TagEnd::Image => {
                self.inline.pop();
                if let Some(url) = self.links.pop().filter(|u| !u.is_empty()) {
                    self.push(&format!(" ({})", url), self.styles.dim);
                }
            }
            _ => {}
        }
    }

    fn finish(mut self) -> Text<'static> {
        self.flush();
        while self.lines.last().is_some_and(|l| l.width() == 0) {
            self.lines.pop();
        }
        Text::from(self.lines)
    }
}

/// Drop control characters so stored text cannot drive the terminal.
fn sanitize(s: &str) -> String {
    s.chars()
        .filter_map(|c| match c {
            '\t' => Some(' '),
            c if c.is_control() => None,
            c => Some(c),
        })
        .collect()
}

/// Plain text of rendered output, one line per line.
pub fn plain_text(text: &Text<'_>) -> String {
    text.lines
        .iter()
        .map(|line| {
            line.spans
                .iter()
                .map(|s| s.content.as_ref())
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(src: &str) -> Text<'static> {
        CmarkRenderer::default().render(src).unwrap()
    }

    fn span_with<'a>(text: &'a Text<'static>, content: &str) -> &'a Span<'static> {
        text.lines
            .iter()
            .flat_map(|l| l.spans.iter())
            .find(|s| s.content == content)
            .unwrap_or_else(|| panic!("no span {:?} in {:?}", content, text))
    }

    #[test]
    fn bold_is_styled_not_literal() {
        let text = render("**bold**");
        assert_eq!(plain_text(&text), "bold");
        let span = span_with(&text, "bold");
        assert!(span.style.add_modifier.contains(Modifier::BOLD));
    }

    #[test]
    fn emphasis_and_strikethrough() {
        let text = render("*soft* and ~~gone~~");
        assert_eq!(plain_text(&text), "soft and gone");
        assert!(span_with(&text, "soft")
            .style
            .add_modifier
            .contains(Modifier::ITALIC));
        assert!(span_with(&text, "gone")
            .style
            .add_modifier
            .contains(Modifier::CROSSED_OUT));
    }

    #[test]
    fn nested_inline_styles_combine() {
        let text = render("**very *much***");
        let span = span_with(&text, "much");
        assert!(span.style.add_modifier.contains(Modifier::BOLD));
        assert!(span.style.add_modifier.contains(Modifier::ITALIC));
    }

    #[test]
    fn paragraphs_and_headings_are_separated() {
        let text = render("# Title\n\nFirst para.\n\nSecond para.");
        assert_eq!(plain_text(&text), "Title\n\nFirst para.\n\nSecond para.");
        assert!(span_with(&text, "Title")
            .style
            .add_modifier
            .contains(Modifier::BOLD));
    }

    #[test]
    fn lists_get_markers() {
        let text = render("- one\n- two\n  1. inner\n  2. next\n");
        assert_eq!(
            plain_text(&text),
            "• one\n• two\n  1. inner\n  2. next"
        );
    }

    #[test]
    fn task_list_items() {
        let text = render("- [x] done\n- [ ] open\n");
        assert_eq!(plain_text(&text), "• [x] done\n• [ ] open");
    }

    #[test]
    fn code_block_keeps_lines() {
        let text = render("```rust\nlet a = 1;\nlet b = 2;\n```\n");
        assert_eq!(plain_text(&text), "rust\n  let a = 1;\n  let b = 2;");
    }

    #[test]
    fn links_show_destination() {
        let text = render("see [docs](https://example.com)");
        assert_eq!(plain_text(&text), "see docs (https://example.com)");
    }

    #[test]
    fn block_quote_prefix() {
        let text = render("> quoted\n\nafter");
        assert_eq!(plain_text(&text), "│ quoted\n\nafter");
    }

    #[test]
    fn raw_html_is_shown_as_text() {
        let text = render("a <b>tag</b>");
        assert_eq!(plain_text(&text), "a <b>tag</b>");
    }

    #[test]
    fn control_characters_are_stripped() {
        let text = render("beep\u{7}\u{1b}[31m red");
        assert_eq!(plain_text(&text), "beep[31m red");
    }

    #[test]
    fn empty_source_renders_nothing() {
        assert!(render("").lines.is_empty());
    }

    #[test]
    fn oversized_source_fails() {
        let big = "x".repeat(MAX_RENDER_BYTES + 1);
        assert_eq!(
            CmarkRenderer::default().render(&big),
            Err(RenderError::TooLarge {
                size: MAX_RENDER_BYTES + 1,
                limit: MAX_RENDER_BYTES,
            })
        );
    }
}
