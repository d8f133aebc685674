//! HTML rendering of a session transcript.

use minijinja::{context, Environment, Value};
use once_cell::sync::Lazy;
use pulldown_cmark::{html, CowStr, Event, Options, Parser, Tag};

use crate::chat::{GENERATING_STATUS, SEARCHING_STATUS};
use crate::transcript::Message;

pub const PAGE_TITLE: &str = "🩺 Medical Chatbot with PubMed Integration";
pub const INPUT_PLACEHOLDER: &str = "Ask a medical question...";

static TEMPLATES: Lazy<Environment<'static>> = Lazy::new(|| {
    let mut env = Environment::new();
    env.add_template("chat.html", include_str!("../templates/chat.html"))
        .expect("invalid chat template");
    env
});

/// Markdown to HTML. Raw HTML in the source is shown as text, and only
/// http(s) links survive.
pub fn markdown_to_html(text: &str) -> String {
    let events = Parser::new_ext(text, Options::empty()).map(|event| match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        Event::SoftBreak => Event::HardBreak,
        Event::Start(Tag::Link {
            link_type,
            dest_url,
            title,
            id,
        }) => {
            let dest_url = if is_web_url(&dest_url) {
                dest_url
            } else {
                CowStr::Borrowed("#")
            };
            Event::Start(Tag::Link {
                link_type,
                dest_url,
                title,
                id,
            })
        }
        other => other,
    });
    let mut out = String::with_capacity(text.len() * 3 / 2);
    html::push_html(&mut out, events);
    out
}

fn is_web_url(url: &str) -> bool {
    let lower = url.trim_start().to_ascii_lowercase();
    lower.starts_with("https://") || lower.starts_with("http://")
}

/// Full chat page for the given transcript.
pub fn chat_page(messages: &[Message]) -> Result<String, minijinja::Error> {
    let rendered: Vec<Value> = messages
        .iter()
        .map(|m| {
            context! {
                role => m.role.as_str(),
                html => Value::from_safe_string(markdown_to_html(&m.content)),
            }
        })
        .collect();

    TEMPLATES.get_template("chat.html")?.render(context! {
        title => PAGE_TITLE,
        placeholder => INPUT_PLACEHOLDER,
        generating_status => GENERATING_STATUS,
        searching_status => SEARCHING_STATUS,
        messages => rendered,
    })
}
