//! Gemini `generateContent` backend.
//!
//! # Endpoints
//!
//! Both operations `POST {api_base}/models/{model}:generateContent` with the
//! key in the `x-goog-api-key` header:
//!
//! | Operation | Default model | Response field used |
//! |---|---|---|
//! | synthesize | `gemini-2.5-flash-preview-tts` | `candidates[0].content.parts[].inlineData.data` |
//! | diacritize | `gemini-3-flash-preview` | `candidates[0].content.parts[].text` |
//!
//! # Example
//!
//! ```rust,no_run
//! use qiraa_rs::service::gemini::{GeminiClient, GeminiSettingsBuilder};
//! use qiraa_rs::{ArabicVoice, SpeechService};
//!
//! let settings = GeminiSettingsBuilder::default()
//!     .api_key("my-key")
//!     .build()?;
//! let client = GeminiClient::new(settings)?;
//! let pcm_base64 = client.synthesize("مَرْحَبًا", ArabicVoice::Charon)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::time::Duration;

use derive_builder::Builder;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use super::{ServiceError, SpeechService};
use crate::config::{Config, DEFAULT_API_BASE, DEFAULT_TEXT_MODEL, DEFAULT_TTS_MODEL};
use crate::voices::ArabicVoice;

const NARRATION_PROMPT: &str = "Speak the following Modern Standard Arabic text in a completely \
natural, expressive, and human-like voice. Use smooth transitions between words and realistic \
conversational intonation, as if you are a professional narrator speaking naturally to a person. \
Do not sound robotic or overly slow: ";

const TASHKEEL_PROMPT: &str = "You are an expert Arabic linguist. Add full and correct diacritics \
(Tashkeel/Harakat) to the following Arabic text to ensure perfect pronunciation in Modern Standard \
Arabic. Return ONLY the processed text with no explanations or extra formatting: ";

/// Connection settings for [`GeminiClient`].
#[derive(Debug, Clone, Builder)]
#[builder(setter(into))]
pub struct GeminiSettings {
    /// API key. May be blank; calls then fail with `MissingCredential`.
    #[builder(default)]
    pub api_key: String,
    #[builder(default = "DEFAULT_API_BASE.to_string()")]
    pub api_base: String,
    #[builder(default = "DEFAULT_TTS_MODEL.to_string()")]
    pub tts_model: String,
    #[builder(default = "DEFAULT_TEXT_MODEL.to_string()")]
    pub text_model: String,
    #[builder(default = "Duration::from_secs(120)")]
    pub timeout: Duration,
}

impl GeminiSettings {
    /// Settings from the application config plus a credential.
    pub fn from_config(config: &Config, api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_base: config.api_base.clone(),
            tts_model: config.tts_model.clone(),
            text_model: config.text_model.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }
}

/// Blocking HTTP client for the Gemini API.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    settings: GeminiSettings,
    http: Client,
}

impl GeminiClient {
    pub fn new(settings: GeminiSettings) -> Result<Self, ServiceError> {
        let http = Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|e| ServiceError::Transport(e.to_string()))?;
        Ok(Self { settings, http })
    }

    pub fn settings(&self) -> &GeminiSettings {
        &self.settings
    }

    fn api_key(&self) -> Result<&str, ServiceError> {
        let key = self.settings.api_key.trim();
        if key.is_empty() {
            return Err(ServiceError::MissingCredential);
        }
        Ok(key)
    }

    fn generate(
        &self,
        model: &str,
        request: &GenerateContentRequest<'_>,
    ) -> Result<GenerateContentResponse, ServiceError> {
        let key = self.api_key()?;
        let url = format!(
            "{}/models/{}:generateContent",
            self.settings.api_base.trim_end_matches('/'),
            model
        );
        log::info!("POST {url}");

        let resp = self
            .http
            .post(&url)
            .header("x-goog-api-key", key)
            .json(request)
            .send()
            .map_err(|e| ServiceError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            log::error!("{model} returned HTTP {status}: {body}");
            return Err(ServiceError::Http {
                status: status.as_u16(),
                body,
            });
        }

        resp.json::<GenerateContentResponse>()
            .map_err(|e| ServiceError::InvalidResponse(e.to_string()))
    }
}

impl SpeechService for GeminiClient {
    fn synthesize(&self, text: &str, voice: ArabicVoice) -> Result<String, ServiceError> {
        let prompt = format!("{NARRATION_PROMPT}{text}");
        let request = GenerateContentRequest::speech(&prompt, voice);
        let response = self.generate(&self.settings.tts_model, &request)?;
        let audio = response.inline_audio()?;
        log::debug!("Received {} base64 chars of audio", audio.len());
        Ok(audio)
    }

    fn diacritize(&self, text: &str) -> Result<String, ServiceError> {
        self.api_key()?;
        if text.trim().is_empty() {
            return Ok(String::new());
        }

        let prompt = format!("{TASHKEEL_PROMPT}{text}");
        let request = GenerateContentRequest::text(&prompt);
        let response = self.generate(&self.settings.text_model, &request)?;
        response.text()
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<TextPart<'a>>,
}

#[derive(Debug, Serialize)]
struct TextPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig<'a> {
    response_modalities: [&'static str; 1],
    speech_config: SpeechConfig<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SpeechConfig<'a> {
    voice_config: VoiceConfig<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VoiceConfig<'a> {
    prebuilt_voice_config: PrebuiltVoiceConfig<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PrebuiltVoiceConfig<'a> {
    voice_name: &'a str,
}

impl<'a> GenerateContentRequest<'a> {
    fn text(prompt: &'a str) -> Self {
        Self {
            contents: vec![Content {
                parts: vec![TextPart { text: prompt }],
            }],
            generation_config: None,
        }
    }

    fn speech(prompt: &'a str, voice: ArabicVoice) -> Self {
        Self {
            generation_config: Some(GenerationConfig {
                response_modalities: ["AUDIO"],
                speech_config: SpeechConfig {
                    voice_config: VoiceConfig {
                        prebuilt_voice_config: PrebuiltVoiceConfig {
                            voice_name: voice.as_str(),
                        },
                    },
                },
            }),
            ..Self::text(prompt)
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Default, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Default, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    #[serde(default)]
    mime_type: Option<String>,
    #[serde(default)]
    data: String,
}

impl GenerateContentResponse {
    fn first_parts(&self) -> &[ResponsePart] {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|c| c.parts.as_slice())
            .unwrap_or(&[])
    }

    /// Base64 audio from the first part carrying inline data.
    fn inline_audio(self) -> Result<String, ServiceError> {
        let inline = self
            .first_parts()
            .iter()
            .find_map(|p| p.inline_data.as_ref())
            .filter(|d| !d.data.is_empty())
            .ok_or(ServiceError::EmptyResult("audio"))?;

        if let Some(mime) = &inline.mime_type {
            log::debug!("Inline audio mime type: {mime}");
        }
        Ok(inline.data.clone())
    }

    /// Concatenated text parts, trimmed.
    fn text(self) -> Result<String, ServiceError> {
        let text: String = self
            .first_parts()
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(ServiceError::EmptyResult("text"));
        }
        Ok(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread::JoinHandle;
    use std::time::Duration;

    use super::{
        GeminiClient, GeminiSettingsBuilder, GenerateContentRequest, GenerateContentResponse,
    };
    use crate::service::{ServiceError, SpeechService};
    use crate::voices::ArabicVoice;

    fn client_without_key() -> GeminiClient {
        let settings = GeminiSettingsBuilder::default()
            .api_base("http://127.0.0.1:9")
            .build()
            .unwrap();
        GeminiClient::new(settings).unwrap()
    }

    #[test]
    fn speech_request_carries_voice_and_audio_modality() {
        let request = GenerateContentRequest::speech("نص", ArabicVoice::Fenrir);
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["contents"][0]["parts"][0]["text"], "نص");
        assert_eq!(json["generationConfig"]["responseModalities"][0], "AUDIO");
        assert_eq!(
            json["generationConfig"]["speechConfig"]["voiceConfig"]["prebuiltVoiceConfig"]
                ["voiceName"],
            "Fenrir"
        );
    }

    #[test]
    fn text_request_has_no_generation_config() {
        let json = serde_json::to_value(GenerateContentRequest::text("x")).unwrap();
        assert!(json.get("generationConfig").is_none());
    }

    #[test]
    fn extracts_inline_audio() {
        let response: GenerateContentResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[
                {"inlineData":{"mimeType":"audio/L16;codec=pcm;rate=24000","data":"AID/fw=="}}
            ]}}]}"#,
        )
        .unwrap();
        assert_eq!(response.inline_audio().unwrap(), "AID/fw==");
    }

    #[test]
    fn missing_audio_is_empty_result() {
        let response: GenerateContentResponse =
            serde_json::from_str(r#"{"candidates":[{"content":{"parts":[{"text":"no"}]}}]}"#)
                .unwrap();
        assert!(matches!(
            response.inline_audio(),
            Err(ServiceError::EmptyResult("audio"))
        ));

        let response: GenerateContentResponse = serde_json::from_str("{}").unwrap();
        assert!(matches!(
            response.inline_audio(),
            Err(ServiceError::EmptyResult(_))
        ));
    }

    #[test]
    fn joins_and_trims_text_parts() {
        let response: GenerateContentResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"  كَتَبَ "},{"text":"الوَلَدُ\n"}]}}]}"#,
        )
        .unwrap();
        assert_eq!(response.text().unwrap(), "كَتَبَ الوَلَدُ");

        let response: GenerateContentResponse =
            serde_json::from_str(r#"{"candidates":[{"content":{"parts":[{"text":"   "}]}}]}"#)
                .unwrap();
        assert!(matches!(response.text(), Err(ServiceError::EmptyResult("text"))));
    }

    #[test]
    fn blank_key_fails_before_network() {
        let client = client_without_key();
        assert!(matches!(
            client.synthesize("نص", ArabicVoice::Charon),
            Err(ServiceError::MissingCredential)
        ));
        assert!(matches!(
            client.diacritize("نص"),
            Err(ServiceError::MissingCredential)
        ));
    }

    #[test]
    fn blank_text_diacritizes_to_empty() {
        let settings = GeminiSettingsBuilder::default()
            .api_key("test-key")
            .api_base("http://127.0.0.1:9")
            .build()
            .unwrap();
        let client = GeminiClient::new(settings).unwrap();
        assert_eq!(client.diacritize("  \n").unwrap(), "");
    }

    #[test]
    fn blank_key_wins_over_blank_text() {
        assert!(matches!(
            client_without_key().diacritize("  "),
            Err(ServiceError::MissingCredential)
        ));
    }

    fn http_response(status_line: &str, content_type: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {status_line}\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        )
    }

    /// Serves one canned response on a local port; the handle yields the raw request.
    fn serve_once(response: String) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut raw = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = stream.read(&mut buf).unwrap();
                if n == 0 {
                    break;
                }
                raw.extend_from_slice(&buf[..n]);
                if let Some(end) = raw.windows(4).position(|w| w == b"\r\n\r\n") {
                    let head = String::from_utf8_lossy(&raw[..end]).to_lowercase();
                    let body_len = head
                        .lines()
                        .find_map(|l| l.strip_prefix("content-length:"))
                        .and_then(|v| v.trim().parse::<usize>().ok())
                        .unwrap_or(0);
                    if raw.len() >= end + 4 + body_len {
                        break;
                    }
                }
            }
            stream.write_all(response.as_bytes()).unwrap();
            stream.flush().unwrap();
            String::from_utf8_lossy(&raw).into_owned()
        });
        (format!("http://{addr}"), handle)
    }

    fn client_for(api_base: &str) -> GeminiClient {
        let settings = GeminiSettingsBuilder::default()
            .api_key("test-key")
            .api_base(api_base)
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap();
        GeminiClient::new(settings).unwrap()
    }

    #[test]
    fn non_success_status_maps_to_http_error() {
        let (base, server) = serve_once(http_response("403 Forbidden", "text/plain", "denied"));
        let result = client_for(&base).synthesize("نص", ArabicVoice::Charon);
        let request = server.join().unwrap();

        match result {
            Err(ServiceError::Http { status, body }) => {
                assert_eq!(status, 403);
                assert_eq!(body, "denied");
            }
            other => panic!("expected HTTP error, got {other:?}"),
        }

        let request_line = request.lines().next().unwrap();
        assert_eq!(
            request_line,
            "POST /models/gemini-2.5-flash-preview-tts:generateContent HTTP/1.1"
        );
        assert!(request.to_lowercase().contains("x-goog-api-key: test-key"));
        assert!(request.contains("\"voiceName\":\"Charon\""));
    }

    #[test]
    fn unparseable_body_maps_to_invalid_response() {
        let (base, server) = serve_once(http_response("200 OK", "application/json", "not json"));
        let result = client_for(&base).diacritize("كتب");
        let request = server.join().unwrap();

        assert!(matches!(result, Err(ServiceError::InvalidResponse(_))));
        assert!(request.starts_with("POST /models/gemini-3-flash-preview:generateContent "));
        assert!(request.to_lowercase().contains("x-goog-api-key: test-key"));
    }

    #[test]
    fn successful_synthesis_returns_inline_audio() {
        let body = r#"{"candidates":[{"content":{"parts":[{"inlineData":{"mimeType":"audio/L16;codec=pcm;rate=24000","data":"AID/fw=="}}]}}]}"#;
        let (base, server) = serve_once(http_response("200 OK", "application/json", body));
        let audio = client_for(&format!("{base}/")).synthesize("نص", ArabicVoice::Kore);
        server.join().unwrap();

        assert_eq!(audio.unwrap(), "AID/fw==");
    }
}
