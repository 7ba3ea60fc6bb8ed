//! Text-generation adapters.

pub mod openai;

pub use openai::{OpenAiClient, DEFAULT_BASE_URL};
