//! Text question form

use web_sys::{HtmlInputElement, SubmitEvent};
use yew::prelude::*;

#[derive(Properties, PartialEq)]
pub struct TextFormProps {
    /// Fires with the trimmed question text
    pub on_submit: Callback<String>,
}

#[function_component(TextForm)]
pub fn text_form(props: &TextFormProps) -> Html {
    let input_ref = use_node_ref();

    let onsubmit = {
        let input_ref = input_ref.clone();
        let on_submit = props.on_submit.clone();
        Callback::from(move |e: SubmitEvent| {
            e.prevent_default();
            if let Some(input) = input_ref.cast::<HtmlInputElement>() {
                let text = input.value().trim().to_string();
                if !text.is_empty() {
                    on_submit.emit(text);
                    input.set_value("");
                }
            }
        })
    };

    html! {
        <form class="text-form" {onsubmit}>
            <input
                ref={input_ref}
                type="text"
                placeholder="Posez une question à BirdBot..."
            />
            <button type="submit">{ "Envoyer" }</button>
        </form>
    }
}
