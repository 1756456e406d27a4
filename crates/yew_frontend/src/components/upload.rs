//! Image upload form

use web_sys::{HtmlInputElement, SubmitEvent};
use yew::prelude::*;

#[derive(Properties, PartialEq)]
pub struct UploadFormProps {
    /// Fires with the selected file, or `None` when nothing was chosen
    pub on_submit: Callback<Option<web_sys::File>>,
}

#[function_component(UploadForm)]
pub fn upload_form(props: &UploadFormProps) -> Html {
    let input_ref = use_node_ref();

    let onsubmit = {
        let input_ref = input_ref.clone();
        let on_submit = props.on_submit.clone();
        Callback::from(move |e: SubmitEvent| {
            e.prevent_default();
            if let Some(input) = input_ref.cast::<HtmlInputElement>() {
                let file = input.files().and_then(|files| files.get(0));
                on_submit.emit(file);
                input.set_value("");
            }
        })
    };

    html! {
        <form class="upload-form" {onsubmit}>
            <input
                ref={input_ref}
                type="file"
                accept="image/*"
            />
            <button type="submit">{ "Identifier l'oiseau" }</button>
        </form>
    }
}
