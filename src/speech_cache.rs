/// A previously synthesized clip for a piece of content. The backend keys
/// its cache by a fingerprint of (user, content, voice, format version) and
/// synthesizes on miss; this side only ever reads through.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CachedSpeech {
    script: String,
    audio_url: String,
    duration_ms: u64,
}

impl CachedSpeech {
    pub fn script(&self) -> &str {
        &self.script
    }

    pub fn audio_url(&self) -> &str {
        &self.audio_url
    }

    pub fn duration_ms(&self) -> u64 {
        self.duration_ms
    }
}

pub struct SpeechCacheClient {
    client: reqwest::Client,
    endpoint: String,
}

impl SpeechCacheClient {
    pub fn new(endpoint: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
        }
    }

    /// Fetches the cached clip for (user, content), triggering synthesis
    /// server-side when the cache has expired or never held it.
    pub async fn fetch(&self, user_id: &str, content_id: &str) -> anyhow::Result<CachedSpeech> {
        let url = format!("{}/speech/{}/{}", self.endpoint, user_id, content_id);
        let speech = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json::<CachedSpeech>()
            .await?;
        Ok(speech)
    }
}
