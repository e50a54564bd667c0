use axum::extract::ws::{self, WebSocket};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use secrecy::ExposeSecret;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::handshake::client::Request;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use crate::config::Config;

type Upstream = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

const AUTHORIZATION_HEADER: &str = "Authorization";
const UPSTREAM_BETA_HEADER: &str = "OpenAI-Beta";

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// A per-direction queue overflowed; back-pressure beyond the bound is
    /// fatal for the session.
    #[error("relay overloaded: {0} queue full")]
    Overloaded(&'static str),
    #[error("socket error: {0}")]
    Socket(String),
}

/// Builds the authenticated upstream request. The credential is attached
/// here and only here.
pub fn build_upstream_request(config: &Config) -> tokio_tungstenite::tungstenite::Result<Request> {
    let mut request =
        format!("{}/realtime?model={}", config.upstream_url, config.model).into_client_request()?;
    request.headers_mut().insert(
        AUTHORIZATION_HEADER,
        format!("Bearer {}", config.upstream_api_key.expose_secret())
            .as_str()
            .parse()?,
    );
    request
        .headers_mut()
        .insert(UPSTREAM_BETA_HEADER, "realtime=v1".parse()?);
    Ok(request)
}

/// Client-side frame to the upstream wire format, unmodified. Ping/pong is
/// handled by each websocket layer and not forwarded.
pub fn to_upstream(msg: ws::Message) -> Option<Message> {
    match msg {
        ws::Message::Text(text) => Some(Message::Text(text)),
        ws::Message::Binary(bin) => Some(Message::Binary(bin)),
        ws::Message::Close(frame) => Some(Message::Close(frame.map(|f| CloseFrame {
            code: f.code.into(),
            reason: f.reason,
        }))),
        ws::Message::Ping(_) | ws::Message::Pong(_) => None,
    }
}

/// Upstream frame to the client-side wire format, unmodified.
pub fn to_client(msg: Message) -> Option<ws::Message> {
    match msg {
        Message::Text(text) => Some(ws::Message::Text(text)),
        Message::Binary(bin) => Some(ws::Message::Binary(bin)),
        Message::Close(frame) => Some(ws::Message::Close(frame.map(|f| ws::CloseFrame {
            code: f.code.into(),
            reason: f.reason,
        }))),
        Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => None,
    }
}

/// A bounded, order-preserving hand-off between a socket reader and the
/// opposite socket's writer. Overflow is fatal rather than silently
/// buffered without limit.
pub struct BoundedForwarder<T> {
    tx: tokio::sync::mpsc::Sender<T>,
    direction: &'static str,
}

impl<T> BoundedForwarder<T> {
    pub fn new(depth: usize, direction: &'static str) -> (Self, tokio::sync::mpsc::Receiver<T>) {
        let (tx, rx) = tokio::sync::mpsc::channel(depth);
        (Self { tx, direction }, rx)
    }

    pub fn offer(&self, msg: T) -> Result<(), RelayError> {
        self.tx
            .try_send(msg)
            .map_err(|_| RelayError::Overloaded(self.direction))
    }
}

/// Runs one relayed session: both legs are pumped until either closes or
/// errors, then everything is torn down together. Frames pass through
/// verbatim, order preserved within each direction.
pub async fn proxy_session(client: WebSocket, upstream: Upstream, queue_depth: usize) {
    let (client_sink, client_stream) = client.split();
    let (upstream_sink, upstream_stream) = upstream.split();

    let (to_upstream_fwd, to_upstream_rx) =
        BoundedForwarder::new(queue_depth, "client-to-upstream");
    let (to_client_fwd, to_client_rx) = BoundedForwarder::new(queue_depth, "upstream-to-client");

    let mut tasks = tokio::task::JoinSet::new();
    tasks.spawn(read_client(client_stream, to_upstream_fwd));
    tasks.spawn(write_upstream(to_upstream_rx, upstream_sink));
    tasks.spawn(read_upstream(upstream_stream, to_client_fwd));
    tasks.spawn(write_client(to_client_rx, client_sink));

    // The first leg to finish decides the session's fate; the rest are torn
    // down with it so neither side outlives the other.
    if let Some(result) = tasks.join_next().await {
        match result {
            Ok(Ok(())) => tracing::info!("relay session closed"),
            Ok(Err(e)) => tracing::error!("relay session failed: {}", e),
            Err(e) => tracing::error!("relay task panicked: {}", e),
        }
    }
    tasks.shutdown().await;
}

async fn read_client(
    mut stream: SplitStream<WebSocket>,
    forward: BoundedForwarder<Message>,
) -> Result<(), RelayError> {
    while let Some(msg) = stream.next().await {
        let msg = msg.map_err(|e| RelayError::Socket(e.to_string()))?;
        let closing = matches!(msg, ws::Message::Close(_));
        if let Some(msg) = to_upstream(msg) {
            forward.offer(msg)?;
        }
        if closing {
            break;
        }
    }
    Ok(())
}

async fn write_upstream(
    mut queue: tokio::sync::mpsc::Receiver<Message>,
    mut sink: SplitSink<Upstream, Message>,
) -> Result<(), RelayError> {
    while let Some(msg) = queue.recv().await {
        sink.send(msg)
            .await
            .map_err(|e| RelayError::Socket(e.to_string()))?;
    }
    Ok(())
}

async fn read_upstream(
    mut stream: SplitStream<Upstream>,
    forward: BoundedForwarder<ws::Message>,
) -> Result<(), RelayError> {
    while let Some(msg) = stream.next().await {
        let msg = msg.map_err(|e| RelayError::Socket(e.to_string()))?;
        let closing = matches!(msg, Message::Close(_));
        if let Some(msg) = to_client(msg) {
            forward.offer(msg)?;
        }
        if closing {
            break;
        }
    }
    Ok(())
}

async fn write_client(
    mut queue: tokio::sync::mpsc::Receiver<ws::Message>,
    mut sink: SplitSink<WebSocket, ws::Message>,
) -> Result<(), RelayError> {
    while let Some(msg) = queue.recv().await {
        sink.send(msg)
            .await
            .map_err(|e| RelayError::Socket(e.to_string()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_frames_pass_through_unmodified() {
        let payload = r#"{"type": "input_audio_buffer.append", "audio": "AAAA"}"#;
        match to_upstream(ws::Message::Text(payload.to_string())) {
            Some(Message::Text(text)) => assert_eq!(text, payload),
            other => panic!("unexpected conversion: {:?}", other),
        }
        match to_client(Message::Text(payload.to_string())) {
            Some(ws::Message::Text(text)) => assert_eq!(text, payload),
            other => panic!("unexpected conversion: {:?}", other),
        }
    }

    #[test]
    fn binary_frames_pass_through_unmodified() {
        let bytes = vec![0u8, 1, 2, 255];
        match to_upstream(ws::Message::Binary(bytes.clone())) {
            Some(Message::Binary(out)) => assert_eq!(out, bytes),
            other => panic!("unexpected conversion: {:?}", other),
        }
    }

    #[test]
    fn pings_are_not_forwarded() {
        assert!(to_upstream(ws::Message::Ping(vec![])).is_none());
        assert!(to_client(Message::Pong(vec![])).is_none());
    }

    #[test]
    fn close_frames_propagate() {
        let msg = ws::Message::Close(Some(ws::CloseFrame {
            code: 1000,
            reason: "bye".into(),
        }));
        match to_upstream(msg) {
            Some(Message::Close(Some(frame))) => {
                assert_eq!(u16::from(frame.code), 1000);
                assert_eq!(frame.reason, "bye");
            }
            other => panic!("unexpected conversion: {:?}", other),
        }
    }

    #[tokio::test]
    async fn forwarder_preserves_order_within_bound() {
        let (forwarder, mut rx) = BoundedForwarder::new(8, "test");
        for i in 0..8 {
            forwarder.offer(i).unwrap();
        }
        for i in 0..8 {
            assert_eq!(rx.recv().await, Some(i));
        }
    }

    #[tokio::test]
    async fn overflow_is_fatal_not_silent() {
        let (forwarder, _rx) = BoundedForwarder::new(2, "test");
        forwarder.offer(1).unwrap();
        forwarder.offer(2).unwrap();
        match forwarder.offer(3) {
            Err(RelayError::Overloaded(direction)) => assert_eq!(direction, "test"),
            other => panic!("expected overload, got {:?}", other),
        }
    }
}
