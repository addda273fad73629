pub mod client;
pub mod dto;
pub mod parser;
pub mod prompt;

pub use client::{GenerationRequest, OpenAiClient, TextGenerator};
