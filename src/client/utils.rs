use crate::client::config::Config;
use crate::client::consts::SESSION_PATH;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::handshake::client::Request;

pub fn build_request(config: &Config) -> tokio_tungstenite::tungstenite::Result<Request> {
    format!(
        "{}{}?session_id={}",
        config.relay_url(),
        SESSION_PATH,
        config.session_id()
    )
    .into_client_request()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_targets_relay_session_path() {
        let config = Config::builder()
            .with_relay_url("ws://relay.local:9000")
            .with_session_id("sess_42")
            .build();
        let request = build_request(&config).unwrap();
        assert_eq!(
            request.uri().to_string(),
            "ws://relay.local:9000/session?session_id=sess_42"
        );
        // The client side never carries an authorization header; the relay
        // attaches the upstream credential itself.
        assert!(request.headers().get("Authorization").is_none());
    }
}
