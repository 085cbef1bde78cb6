//! HTTP clients for third-party services, implementing the core ports.

pub mod openai;
pub mod recaptcha;

pub use openai::{OpenAiConfig, OpenAiGenerator};
pub use recaptcha::RecaptchaVerifier;
