//! Main application component
//!
//! Owns the chat log and the browser-side orchestration: text goes to the
//! chat gateway, images go to the vision endpoint first and a successful
//! identification is then enriched through the gateway.

use crate::components::chat::ChatLogView;
use crate::components::text_form::TextForm;
use crate::components::upload::UploadForm;
use gloo::console;
use gloo_net::http::Request;
use serde::{Deserialize, Serialize};
use std::rc::Rc;
use wasm_bindgen_futures::spawn_local;
use web_sys::{FormData, Url};
use yew::prelude::*;

/// Vision endpoint runs as a separate service
const VISION_PREDICT_URL: &str = "http://127.0.0.1:8001/predict";
const GENERAL_API_URL: &str = "/llm/general";
const ENRICH_API_URL: &str = "/llm/enrich";

#[derive(Clone, PartialEq)]
pub enum Sender {
    User,
    Bot,
}

/// One entry of the chat log
#[derive(Clone, PartialEq)]
pub struct ChatLine {
    pub sender: Sender,
    pub text: String,
    /// Object URL of an uploaded image, shown under the text
    pub image_url: Option<String>,
}

impl ChatLine {
    fn user(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::User,
            text: text.into(),
            image_url: None,
        }
    }

    fn bot(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::Bot,
            text: text.into(),
            image_url: None,
        }
    }
}

#[derive(Default, PartialEq)]
pub struct ChatLog {
    pub lines: Vec<ChatLine>,
}

pub enum ChatAction {
    Push(ChatLine),
}

impl Reducible for ChatLog {
    type Action = ChatAction;

    fn reduce(self: Rc<Self>, action: Self::Action) -> Rc<Self> {
        match action {
            ChatAction::Push(line) => {
                let mut lines = self.lines.clone();
                lines.push(line);
                Rc::new(Self { lines })
            }
        }
    }
}

#[derive(Serialize)]
struct GeneralRequest {
    text: String,
}

#[derive(Serialize)]
struct EnrichRequest {
    bird_name: String,
    original_message: String,
}

#[derive(Deserialize)]
struct LlmResponse {
    response: String,
}

#[derive(Deserialize)]
struct PredictResponse {
    message: String,
    bird: Option<String>,
}

#[function_component(App)]
pub fn app() -> Html {
    let chat = use_reducer(ChatLog::default);

    let on_text_submit = {
        let chat = chat.clone();
        Callback::from(move |text: String| {
            chat.dispatch(ChatAction::Push(ChatLine::user(text.clone())));
            chat.dispatch(ChatAction::Push(ChatLine::bot(
                "**BirdBot** : Je consulte mon cerveau (Llama 3.2:1B) pour vous répondre...",
            )));

            let chat = chat.clone();
            spawn_local(async move {
                match ask_general(&text).await {
                    Ok(response) => chat.dispatch(ChatAction::Push(ChatLine::bot(format!(
                        "**BirdBot** : {response}"
                    )))),
                    Err(message) => {
                        console::error!("general question failed:", message.clone());
                        chat.dispatch(ChatAction::Push(ChatLine::bot(format!(
                            "Une erreur critique est survenue : {message}"
                        ))));
                    }
                }
            });
        })
    };

    let on_image_submit = {
        let chat = chat.clone();
        Callback::from(move |file: Option<web_sys::File>| {
            let Some(file) = file else {
                chat.dispatch(ChatAction::Push(ChatLine::bot(
                    "Veuillez sélectionner un fichier image avant de cliquer sur le bouton.",
                )));
                return;
            };

            let preview = Url::create_object_url_with_blob(&file).ok();
            chat.dispatch(ChatAction::Push(ChatLine {
                sender: Sender::User,
                text: format!("Image soumise : *{}*", file.name()),
                image_url: preview,
            }));
            chat.dispatch(ChatAction::Push(ChatLine::bot(
                "**BirdBot** : Requête d'identification reçue. Déclenchement du Modèle \
                 Spécialiste...",
            )));

            let chat = chat.clone();
            spawn_local(async move {
                let prediction = match classify(&file).await {
                    Ok(prediction) => prediction,
                    Err(message) => {
                        console::error!("classification failed:", message.clone());
                        chat.dispatch(ChatAction::Push(ChatLine::bot(format!(
                            "Une erreur critique est survenue : {message}"
                        ))));
                        return;
                    }
                };

                let Some(bird) = prediction.bird else {
                    // Rejected below the confidence threshold, or undecodable
                    chat.dispatch(ChatAction::Push(ChatLine::bot(prediction.message)));
                    return;
                };

                chat.dispatch(ChatAction::Push(ChatLine::bot(
                    "**BirdBot** : Identification réussie! J'utilise maintenant le modèle de \
                     langage pour vous fournir des informations...",
                )));

                let final_message = match enrich(&bird, &prediction.message).await {
                    Ok(response) => response,
                    Err(message) => format!("Erreur LLM: {message}"),
                };
                chat.dispatch(ChatAction::Push(ChatLine::bot(final_message)));
            });
        })
    };

    html! {
        <div class="app">
            <header class="app-header">
                <h1>{ "BirdBot" }</h1>
                <p>{ "Identification d'oiseaux et chat ornithologique" }</p>
            </header>
            <main class="app-main">
                <ChatLogView lines={chat.lines.clone()} />
                <TextForm on_submit={on_text_submit} />
                <UploadForm on_submit={on_image_submit} />
            </main>
        </div>
    }
}

async fn ask_general(text: &str) -> Result<String, String> {
    let response = Request::post(GENERAL_API_URL)
        .json(&GeneralRequest {
            text: text.to_string(),
        })
        .map_err(|e| e.to_string())?
        .send()
        .await
        .map_err(|e| e.to_string())?;

    if !response.ok() {
        return Err(format!("Erreur serveur HTTP {}.", response.status()));
    }

    let data: LlmResponse = response.json().await.map_err(|e| e.to_string())?;
    Ok(data.response)
}

async fn classify(file: &web_sys::File) -> Result<PredictResponse, String> {
    let form = FormData::new().map_err(|e| format!("{e:?}"))?;
    form.append_with_blob_and_filename("file", file, &file.name())
        .map_err(|e| format!("{e:?}"))?;

    let response = Request::post(VISION_PREDICT_URL)
        .body(form)
        .map_err(|e| e.to_string())?
        .send()
        .await
        .map_err(|e| e.to_string())?;

    if !response.ok() {
        return Err(format!("Erreur serveur HTTP {}.", response.status()));
    }

    response.json().await.map_err(|e| e.to_string())
}

async fn enrich(bird_name: &str, original_message: &str) -> Result<String, String> {
    let response = Request::post(ENRICH_API_URL)
        .json(&EnrichRequest {
            bird_name: bird_name.to_string(),
            original_message: original_message.to_string(),
        })
        .map_err(|e| e.to_string())?
        .send()
        .await
        .map_err(|e| e.to_string())?;

    if !response.ok() {
        return Err(format!("Erreur serveur HTTP {}.", response.status()));
    }

    let data: LlmResponse = response.json().await.map_err(|e| e.to_string())?;
    Ok(data.response)
}
