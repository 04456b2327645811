// Text generation module
// HTTP client for the Gemini generateContent API

pub mod gemini;

pub use gemini::GeminiClient;
