//! Chat log component
//!
//! Renders the conversation with the minimal markdown the bot uses:
//! `**bold**`, `*italic*` and line breaks.

use crate::app::{ChatLine, Sender};
use yew::prelude::*;

#[derive(Properties, PartialEq)]
pub struct ChatLogProps {
    pub lines: Vec<ChatLine>,
}

#[function_component(ChatLogView)]
pub fn chat_log_view(props: &ChatLogProps) -> Html {
    let chatbox_ref = use_node_ref();

    // Keep the most recent message in view
    {
        let chatbox_ref = chatbox_ref.clone();
        use_effect_with(props.lines.len(), move |_| {
            if let Some(element) = chatbox_ref.cast::<web_sys::Element>() {
                element.set_scroll_top(element.scroll_height());
            }
        });
    }

    html! {
        <div class="chatbox" ref={chatbox_ref}>
            { for props.lines.iter().map(|line| {
                let class = match line.sender {
                    Sender::User => "user",
                    Sender::Bot => "bot",
                };
                html! {
                    <div class={class}>
                        <p>
                            { render_markdown(&line.text) }
                            if let Some(url) = &line.image_url {
                                <br />
                                <img class="user-image" src={url.clone()} />
                            }
                        </p>
                    </div>
                }
            })}
        </div>
    }
}

/// A piece of formatted message text
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    Plain(String),
    Bold(String),
    Italic(String),
    LineBreak,
}

/// Render a message with the bot's markdown subset
fn render_markdown(text: &str) -> Html {
    html! {
        <>
            { for segments(text).into_iter().map(|segment| match segment {
                Segment::Plain(text) => html! { { text } },
                Segment::Bold(text) => html! { <strong>{ text }</strong> },
                Segment::Italic(text) => html! { <em>{ text }</em> },
                Segment::LineBreak => html! { <br /> },
            })}
        </>
    }
}

/// Tokenize a message into formatted segments
///
/// Unterminated markers are kept as plain text.
pub fn segments(text: &str) -> Vec<Segment> {
    let mut result = Vec::new();
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            result.push(Segment::LineBreak);
        }
        segment_line(line, &mut result);
    }
    result
}

fn segment_line(line: &str, result: &mut Vec<Segment>) {
    let mut rest = line;
    while let Some(start) = rest.find('*') {
        let (marker, open_len) = if rest[start..].starts_with("**") {
            ("**", 2)
        } else {
            ("*", 1)
        };

        match rest[start + open_len..].find(marker) {
            Some(end) => {
                if start > 0 {
                    result.push(Segment::Plain(rest[..start].to_string()));
                }
                let inner = rest[start + open_len..start + open_len + end].to_string();
                result.push(if marker == "**" {
                    Segment::Bold(inner)
                } else {
                    Segment::Italic(inner)
                });
                rest = &rest[start + open_len + end + open_len..];
            }
            None => break,
        }
    }
    if !rest.is_empty() {
        result.push(Segment::Plain(rest.to_string()));
    }
}
