// Embedding generation module
// HTTP client for an Ollama-compatible embedding server

pub mod ollama;

pub use ollama::OllamaClient;
