pub mod api;
pub mod gemini;
