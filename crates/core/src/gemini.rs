use crate::config::Config;
use crate::error::{Result, StitchError};
use crate::image_processing::EncodedSnapshot;
use crate::recognition::TextRecognizer;
use futures::TryStreamExt;
use gemini_rust::{Blob, Content, Gemini, Message, Part, Role};

const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/";

/// Gemini-backed text recognizer.
pub struct GeminiRecognizer {
    client: Gemini,
}

impl GeminiRecognizer {
    pub fn new(config: &Config) -> Result<Self> {
        let api_key = config.require_api_key()?;

        // Set the base URL explicitly to avoid a BadScheme error from the client
        let base_url = url::Url::parse(BASE_URL)
            .map_err(|e| StitchError::Config(format!("Invalid base URL: {}", e)))?;

        let model_name = if config.model_name.starts_with("models/") {
            config.model_name.clone()
        } else {
            format!("models/{}", config.model_name)
        };
        let model_url = format!("{BASE_URL}{model_name}");

        let client = Gemini::with_model_and_base_url(api_key, model_url, base_url)
            .map_err(|e| StitchError::Config(format!("Failed to create Gemini client: {}", e)))?;

        Ok(Self { client })
    }

    fn message(snapshot: &EncodedSnapshot, prompt: &str) -> Message {
        let image_part = Part::InlineData {
            inline_data: Blob {
                mime_type: snapshot.mime_type.to_string(),
                data: snapshot.data.clone(),
            },
        };

        let text_part = Part::Text {
            text: prompt.to_string(),
            thought: None,
            thought_signature: None,
        };

        Message {
            role: Role::User,
            content: Content {
                role: Some(Role::User),
                parts: Some(vec![text_part, image_part]),
            },
        }
    }
}

impl TextRecognizer for GeminiRecognizer {
    /// Streams the transcription and concatenates the non-thought text.
    async fn recognize(&self, snapshot: &EncodedSnapshot, prompt: &str) -> Result<String> {
        log::info!("sending {} snapshot for recognition", snapshot.mime_type);

        let stream = self
            .client
            .generate_content()
            .with_messages(vec![Self::message(snapshot, prompt)])
            .execute_stream()
            .await
            .map_err(|e| StitchError::recognition(format!("API request failed: {:?}", e)))?;

        let text = stream
            .map_err(|e| StitchError::recognition(format!("Stream error: {:?}", e)))
            .try_fold(String::new(), |mut text, response| async move {
                if let Some(parts) = response
                    .candidates
                    .first()
                    .and_then(|candidate| candidate.content.parts.as_ref())
                {
                    for part in parts {
                        if let Part::Text { text: chunk, thought, .. } = part {
                            if !thought.unwrap_or(false) {
                                text.push_str(chunk);
                            }
                        }
                    }
                }
                Ok(text)
            })
            .await?;

        if text.trim().is_empty() {
            return Err(StitchError::recognition("No text response received from Gemini"));
        }
        Ok(text)
    }
}
