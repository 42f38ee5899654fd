pub mod chatbot;
pub mod models;
