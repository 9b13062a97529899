//! Azure Speech text-to-speech over the REST API
//!
//! - URL: `https://{region}.tts.speech.microsoft.com/cognitiveservices/v1`
//! - Authentication: `Ocp-Apim-Subscription-Key` header
//! - Body: SSML document naming the voice
//! - Output format: `X-Microsoft-OutputFormat` header
//!
//! Each call runs inside a [`SynthesisSession`] that is released when it goes
//! out of scope, whichever way the call returns.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use tracing::{debug, instrument, warn};
use url::Url;
use uuid::Uuid;

use super::{CancellationErrorCode, SpeechSynthesizer, SynthesisResult};
use crate::config::{Credentials, SpeechSettings};
use crate::error::{Error, Result};

/// HTTP header carrying the subscription key.
pub const SUBSCRIPTION_KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";
/// HTTP header selecting the audio encoding.
pub const OUTPUT_FORMAT_HEADER: &str = "X-Microsoft-OutputFormat";

const USER_AGENT: &str = concat!("mispronounce/", env!("CARGO_PKG_VERSION"));
const DEFAULT_LANGUAGE: &str = "en-US";

/// Build the synthesis URL for an Azure region.
pub fn synthesis_url(region: &str) -> Result<Url> {
    if region.is_empty() || !region.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(Error::InvalidEndpoint(format!(
            "region {region:?} is not a valid Azure region name"
        )));
    }

    let url = format!(
        "https://{}.tts.speech.microsoft.com/cognitiveservices/v1",
        region.to_ascii_lowercase()
    );
    Url::parse(&url).map_err(|e| Error::InvalidEndpoint(format!("{url}: {e}")))
}

/// Escape text for inclusion in an XML document.
pub fn escape_xml(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&apos;"),
            _ => result.push(c),
        }
    }
    result
}

/// Extract `en-US` from a voice name like `en-US-JennyNeural`.
pub fn voice_language(voice: &str) -> String {
    let mut parts = voice.split('-');

    if let (Some(lang), Some(region)) = (parts.next(), parts.next()) {
        if !lang.is_empty()
            && region.len() == 2
            && region.chars().all(|c| c.is_ascii_uppercase())
        {
            return format!("{lang}-{region}");
        }
    }

    DEFAULT_LANGUAGE.to_string()
}

/// Wrap `text` in an SSML document for `voice`.
pub fn build_ssml(text: &str, voice: &str) -> String {
    let language = voice_language(voice);
    let voice = escape_xml(voice);
    let text = escape_xml(text);

    format!(
        "<speak version='1.0' xmlns='http://www.w3.org/2001/10/synthesis' xml:lang='{language}'>\
         <voice name='{voice}'>{text}</voice>\
         </speak>"
    )
}

/// Azure Speech synthesizer bound to one set of credentials.
pub struct AzureSynthesizer {
    client: Client,
    endpoint: Url,
    subscription_key: String,
    voice: String,
    output_format: String,
}

impl AzureSynthesizer {
    /// Create a synthesizer from credentials and speech settings.
    ///
    /// No request is sent until [`SpeechSynthesizer::speak_text`] is called.
    pub fn new(credentials: &Credentials, settings: &SpeechSettings) -> Result<Self> {
        let endpoint = match settings.endpoint.as_deref() {
            Some(raw) => {
                Url::parse(raw).map_err(|e| Error::InvalidEndpoint(format!("{raw}: {e}")))?
            }
            None => synthesis_url(&credentials.region)?,
        };

        let mut builder = Client::builder().use_rustls_tls().user_agent(USER_AGENT);

        // No timeout unless configured: a silent service blocks the run.
        if let Some(secs) = settings.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        Ok(Self {
            client: builder.build()?,
            endpoint,
            subscription_key: credentials.key.clone(),
            voice: settings.voice.clone(),
            output_format: settings.output_format.clone(),
        })
    }

    /// The URL requests are sent to.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Open a session for one synthesis call.
    pub fn open_session(&self) -> SynthesisSession<'_> {
        let id = Uuid::new_v4();
        debug!(session = %id, endpoint = %self.endpoint, "Opened synthesis session");
        SynthesisSession {
            synthesizer: self,
            id,
        }
    }
}

#[async_trait]
impl SpeechSynthesizer for AzureSynthesizer {
    async fn speak_text(&self, text: &str) -> Result<SynthesisResult> {
        let session = self.open_session();
        Ok(session.speak(text).await)
    }
}

/// One scoped synthesis interaction. Closed on drop.
pub struct SynthesisSession<'a> {
    synthesizer: &'a AzureSynthesizer,
    id: Uuid,
}

impl SynthesisSession<'_> {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Submit `text` and wait for the service to finish.
    #[instrument(skip_all, fields(session = %self.id, chars = text.chars().count()))]
    pub async fn speak(&self, text: &str) -> SynthesisResult {
        let synth = self.synthesizer;
        let body = build_ssml(text, &synth.voice);

        let response = synth
            .client
            .post(synth.endpoint.clone())
            .header(SUBSCRIPTION_KEY_HEADER, &synth.subscription_key)
            .header(CONTENT_TYPE, "application/ssml+xml")
            .header(OUTPUT_FORMAT_HEADER, &synth.output_format)
            .body(body)
            .send()
            .await;

        let response = match response {
            Ok(response) => response,
            Err(e) => {
                warn!("Synthesis request failed: {e}");
                return SynthesisResult::canceled(transport_error_code(&e), e.to_string());
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let body = body.trim();
            let details = if body.is_empty() {
                format!("HTTP {status}")
            } else {
                format!("HTTP {status}: {body}")
            };
            return SynthesisResult::canceled(
                CancellationErrorCode::from_status(status.as_u16()),
                details,
            );
        }

        match response.bytes().await {
            Ok(audio) => {
                debug!("Received {} bytes of audio", audio.len());
                SynthesisResult::completed(audio)
            }
            Err(e) => SynthesisResult::canceled(transport_error_code(&e), e.to_string()),
        }
    }
}

impl Drop for SynthesisSession<'_> {
    fn drop(&mut self) {
        debug!(session = %self.id, "Closed synthesis session");
    }
}

fn transport_error_code(e: &reqwest::Error) -> CancellationErrorCode {
    if e.is_timeout() {
        CancellationErrorCode::ServiceTimeout
    } else {
        CancellationErrorCode::ConnectionFailure
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::speech::ResultReason;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn settings_for(server: &MockServer) -> SpeechSettings {
        SpeechSettings {
            endpoint: Some(format!("{}/cognitiveservices/v1", server.uri())),
            ..SpeechSettings::default()
        }
    }

    fn credentials() -> Credentials {
        Credentials::new("test-key", "eastus").unwrap()
    }

    #[test]
    fn region_url() {
        assert_eq!(
            synthesis_url("westeurope").unwrap().as_str(),
            "https://westeurope.tts.speech.microsoft.com/cognitiveservices/v1"
        );
        assert_eq!(
            synthesis_url("EastUS").unwrap().host_str(),
            Some("eastus.tts.speech.microsoft.com")
        );
    }

    #[test]
    fn region_must_be_a_host_label() {
        assert!(matches!(
            synthesis_url("east us"),
            Err(Error::InvalidEndpoint(_))
        ));
        assert!(matches!(
            synthesis_url("evil.com/x"),
            Err(Error::InvalidEndpoint(_))
        ));
    }

    #[test]
    fn ssml_escapes_text() {
        let ssml = build_ssml("Tom & Jerry's <show>", "en-US-JennyNeural");
        assert!(ssml.starts_with("<speak"));
        assert!(ssml.contains("xml:lang='en-US'"));
        assert!(ssml.contains("<voice name='en-US-JennyNeural'>"));
        assert!(ssml.contains("Tom &amp; Jerry&apos;s &lt;show&gt;"));
    }

    #[test]
    fn language_from_voice() {
        assert_eq!(voice_language("de-DE-KatjaNeural"), "de-DE");
        assert_eq!(voice_language("zh-CN-XiaoxiaoNeural"), "zh-CN");
        assert_eq!(voice_language("Jenny"), "en-US");
        assert_eq!(voice_language(""), "en-US");
    }

    #[test]
    fn explicit_endpoint_wins_over_region() {
        let settings = SpeechSettings {
            endpoint: Some("http://localhost:8080/tts".to_string()),
            ..SpeechSettings::default()
        };
        let synth = AzureSynthesizer::new(&credentials(), &settings).unwrap();
        assert_eq!(synth.endpoint().as_str(), "http://localhost:8080/tts");
    }

    #[test]
    fn sessions_get_distinct_ids() {
        let synth = AzureSynthesizer::new(&credentials(), &SpeechSettings::default()).unwrap();
        let a = synth.open_session();
        let b = synth.open_session();
        assert_ne!(a.id(), b.id());
    }

    #[tokio::test]
    async fn successful_synthesis_returns_audio() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/cognitiveservices/v1"))
            .and(header(SUBSCRIPTION_KEY_HEADER, "test-key"))
            .and(header("content-type", "application/ssml+xml"))
            .and(header(OUTPUT_FORMAT_HEADER, "audio-24khz-96kbitrate-mono-mp3"))
            .and(body_string_contains("Atmosphere"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"ID3fake-mp3".to_vec()))
            .expect(1)
            .mount(&server)
            .await;

        let synth = AzureSynthesizer::new(&credentials(), &settings_for(&server)).unwrap();
        let result = synth.speak_text("Atmosphere").await.unwrap();

        assert_eq!(result.reason, ResultReason::SynthesizingAudioCompleted);
        assert_eq!(result.audio_data.as_ref(), b"ID3fake-mp3");
        assert!(result.cancellation.is_none());
    }

    #[tokio::test]
    async fn unauthorized_is_canceled() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let synth = AzureSynthesizer::new(&credentials(), &settings_for(&server)).unwrap();
        let result = synth.speak_text("Atmosphere").await.unwrap();

        assert_eq!(result.reason, ResultReason::Canceled);
        assert!(result.audio_data.is_empty());
        let details = result.cancellation.unwrap();
        assert_eq!(details.error_code, CancellationErrorCode::AuthenticationFailure);
        assert!(details.error_details.contains("401"));
    }

    #[tokio::test]
    async fn error_body_is_kept_in_details() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_string("SSML is invalid"))
            .mount(&server)
            .await;

        let synth = AzureSynthesizer::new(&credentials(), &settings_for(&server)).unwrap();
        let result = synth.speak_text("Atmosphere").await.unwrap();

        assert_eq!(result.reason, ResultReason::Canceled);
        assert!(result.describe().contains("BadRequest"));
        assert!(result.describe().contains("SSML is invalid"));
    }

    #[tokio::test]
    async fn unreachable_service_is_a_connection_failure() {
        // Bind and drop a listener so the port is closed.
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let settings = SpeechSettings {
            endpoint: Some(format!("http://127.0.0.1:{port}/cognitiveservices/v1")),
            ..SpeechSettings::default()
        };

        let synth = AzureSynthesizer::new(&credentials(), &settings).unwrap();
        let result = synth.speak_text("Atmosphere").await.unwrap();

        assert_eq!(result.reason, ResultReason::Canceled);
        assert_eq!(
            result.cancellation.unwrap().error_code,
            CancellationErrorCode::ConnectionFailure
        );
    }

    #[tokio::test]
    async fn configured_timeout_cancels_slow_requests() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_bytes(b"late".to_vec())
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let settings = SpeechSettings {
            timeout_secs: Some(1),
            ..settings_for(&server)
        };
        let synth = AzureSynthesizer::new(&credentials(), &settings).unwrap();
        let result = synth.speak_text("Atmosphere").await.unwrap();

        assert_eq!(result.reason, ResultReason::Canceled);
        assert_eq!(
            result.cancellation.unwrap().error_code,
            CancellationErrorCode::ServiceTimeout
        );
    }
}
