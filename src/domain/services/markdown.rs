#[cfg(test)]
#[path = "markdown_test.rs"]
mod tests;

use pulldown_cmark::html;
use pulldown_cmark::Event;
use pulldown_cmark::Options;
use pulldown_cmark::Parser;

/// Renders assistant markdown to HTML. Upstream escapes newlines as the two
/// characters `\n`, so those are normalized first. Raw HTML in the source is
/// demoted to text, which leaves it entity-escaped in the output.
pub fn render(text: &str) -> String {
    let normalized = text.replace("\\n", "\n");

    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let parser = Parser::new_ext(&normalized, options).map(|event| {
        return match event {
            Event::Html(raw) => Event::Text(raw),
            Event::InlineHtml(raw) => Event::Text(raw),
            other => other,
        };
    });

    let mut out = String::new();
    html::push_html(&mut out, parser);

    return out;
}
