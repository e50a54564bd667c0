use crate::error::EngineError;

/// What the session-token endpoint hands back: where to connect and which
/// model the relay will bind the session to. The real upstream credential
/// stays on the relay side.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SessionGrant {
    relay_url: String,
    model: String,
    expires_at: u64,
}

impl SessionGrant {
    pub fn relay_url(&self) -> &str {
        &self.relay_url
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Expiry as seconds since the Unix epoch.
    pub fn expires_at(&self) -> u64 {
        self.expires_at
    }
}

#[derive(serde::Serialize)]
struct TokenRequest<'a> {
    user_id: &'a str,
    session_id: &'a str,
}

pub struct TokenClient {
    client: reqwest::Client,
    endpoint: String,
}

impl TokenClient {
    pub fn new(endpoint: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
        }
    }

    /// Requests a session grant. A failure here is a connection failure,
    /// not a session error; no session exists yet.
    pub async fn issue(
        &self,
        user_id: &str,
        session_id: &str,
    ) -> Result<SessionGrant, EngineError> {
        let request = TokenRequest {
            user_id,
            session_id,
        };
        let grant = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| EngineError::ConnectionFailed(e.to_string()))?
            .error_for_status()
            .map_err(|e| EngineError::ConnectionFailed(e.to_string()))?
            .json::<SessionGrant>()
            .await
            .map_err(|e| EngineError::ConnectionFailed(e.to_string()))?;
        Ok(grant)
    }
}
