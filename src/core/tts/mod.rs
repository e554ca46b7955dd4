pub mod base;
pub mod openai;

pub use base::{AudioFormat, SpeechSynthesizer, SynthesisError, SynthesisResult};
pub use openai::OpenAiSynthesizer;
