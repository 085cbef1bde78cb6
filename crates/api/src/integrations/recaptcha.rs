//! Google reCAPTCHA v3 server-side verification.

use async_trait::async_trait;
use quill_core::error::{CoreError, CoreResult};
use quill_core::ports::{CaptchaOutcome, CaptchaVerifier};
use serde::Deserialize;

pub const DEFAULT_VERIFY_URL: &str = "https://www.google.com/recaptcha/api/siteverify";

/// Body of a `siteverify` response. Only the fields we act on.
#[derive(Debug, Deserialize)]
struct SiteVerifyResponse {
    success: bool,
    #[serde(rename = "error-codes", default)]
    error_codes: Vec<String>,
}

pub struct RecaptchaVerifier {
    client: reqwest::Client,
    secret: String,
    verify_url: String,
}

impl RecaptchaVerifier {
    pub fn new(secret: String) -> Self {
        Self::with_client(reqwest::Client::new(), secret, DEFAULT_VERIFY_URL.to_string())
    }

    /// Reuse an existing [`reqwest::Client`] and point at another endpoint.
    pub fn with_client(client: reqwest::Client, secret: String, verify_url: String) -> Self {
        Self {
            client,
            secret,
            verify_url,
        }
    }
}

#[async_trait]
impl CaptchaVerifier for RecaptchaVerifier {
    async fn verify(&self, token: &str) -> CoreResult<CaptchaOutcome> {
        let response = self
            .client
            .post(&self.verify_url)
            .form(&[("secret", self.secret.as_str()), ("response", token)])
            .send()
            .await
            .map_err(|e| CoreError::Internal(format!("reCAPTCHA request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CoreError::Internal(format!(
                "reCAPTCHA returned {status}"
            )));
        }

        let body: SiteVerifyResponse = response
            .json()
            .await
            .map_err(|e| CoreError::Internal(format!("reCAPTCHA response malformed: {e}")))?;

        Ok(CaptchaOutcome {
            success: body.success,
            error_codes: body.error_codes,
        })
    }
}
