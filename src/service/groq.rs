use super::{ExtractionService, types::*};
use crate::{config::Config, credential::Credential, encode::data_url, error::ExtractError};
use reqwest::StatusCode;
use reqwest::blocking::Client;
use tracing::debug;

/// OpenAI-compatible chat completions endpoint (Groq by default).
pub struct GroqService {
    client: Client,
    endpoint: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
    image_mime: String,
}

impl GroqService {
    pub fn new(cfg: &Config) -> Result<Self, ExtractError> {
        let client = Client::builder()
            .build()
            .map_err(|e| ExtractError::Service(format!("building HTTP client: {e}")))?;
        Ok(Self {
            client,
            endpoint: format!(
                "{}/chat/completions",
                cfg.service.base_url.trim_end_matches('/')
            ),
            model: cfg.service.model.clone(),
            temperature: cfg.service.temperature,
            max_tokens: cfg.service.max_tokens,
            image_mime: cfg.service.image_mime.clone(),
        })
    }

    pub fn request_for(&self, image_base64: &str, prompt: &str) -> ChatRequest {
        ChatRequest::user_with_image(
            &self.model,
            prompt,
            data_url(&self.image_mime, image_base64),
            self.temperature,
            self.max_tokens,
        )
    }
}

impl ExtractionService for GroqService {
    fn complete(
        &self,
        image_base64: &str,
        prompt: &str,
        credential: &Credential,
    ) -> Result<String, ExtractError> {
        let body = self.request_for(image_base64, prompt);
        debug!(
            "POST {} model={} image_b64_len={}",
            self.endpoint,
            self.model,
            image_base64.len()
        );

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(credential.expose())
            .json(&body)
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    ExtractError::Service(format!("request timed out: {e}"))
                } else if e.is_connect() {
                    ExtractError::Service(format!("cannot reach {}: {e}", self.endpoint))
                } else {
                    ExtractError::Service(e.to_string())
                }
            })?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ExtractError::Auth);
        }
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ExtractError::Service(format!(
                "status {}: {}",
                status.as_u16(),
                body.trim()
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .map_err(|e| ExtractError::Service(format!("decoding response body: {e}")))?;
        parsed
            .first_content()
            .ok_or_else(|| ExtractError::Service("response has no message content".into()))
    }
}
