pub mod chat;
pub mod text_form;
pub mod upload;
