use std::time::Instant;

use tokio::sync::broadcast::error::RecvError;
use tokio::sync::watch;

use crate::bridge::{ContextBridge, GROUNDING_FUNCTION};
use crate::capture::{finish_messages, CaptureController};
use crate::client::{ClientTx, ServerRx};
use crate::config::EngineConfig;
use crate::error::{is_benign_notice, EngineError};
use crate::playback::{AudioBuffer, OutputGraph, PlaybackEngine};
use crate::reveal::TextReveal;
use crate::turn::{TurnMachine, TurnStatus};
use crate::types::events::client::{ConversationItemCreateEvent, ResponseCancelEvent};
use crate::types::session::Session;
use crate::types::{ClientEvent, Item, MessageItem, MessageRole, ServerEvent};

/// Requests the UI side sends to the engine.
#[derive(Debug)]
pub enum SessionCommand {
    StartListening,
    StopListening,
    SendText(String),
    Pause,
    Resume,
    Interrupt,
}

/// What the UI observes: turn status plus the transcript pair. Published on
/// a watch channel whenever anything changes.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub status: TurnStatus,
    pub full_text: String,
    pub visible_text: String,
    pub error: Option<String>,
    pub connected: bool,
}

impl SessionSnapshot {
    fn initial() -> Self {
        Self {
            status: TurnStatus::Idle,
            full_text: String::new(),
            visible_text: String::new(),
            error: None,
            connected: false,
        }
    }
}

/// Tracks which upstream response the current turn's payloads belong to, so
/// stragglers from a cancelled response never reach the playback queue or
/// the transcript.
#[derive(Default)]
struct ResponseGate {
    open: bool,
    id: Option<String>,
}

impl ResponseGate {
    fn open(&mut self, id: Option<&str>) {
        self.open = true;
        self.id = id.map(|s| s.to_string());
    }

    fn close(&mut self) {
        self.open = false;
        self.id = None;
    }

    fn accepts(&self, response_id: &str) -> bool {
        self.open && self.id.as_deref().map_or(true, |id| id == response_id)
    }

    fn matches(&self, response_id: Option<&str>) -> bool {
        match (self.id.as_deref(), response_id) {
            (Some(ours), Some(theirs)) => ours == theirs,
            _ => self.open,
        }
    }
}

/// One connected conversation. Owns the capture controller, the playback
/// engine, the reveal synchronizer and the turn state machine, and is the
/// single writer of turn status.
pub struct VoiceSession {
    client: ClientTx,
    capture: CaptureController,
    playback: PlaybackEngine,
    reveal: TextReveal,
    turns: TurnMachine,
    bridge: Option<ContextBridge>,
    config: EngineConfig,
    session_template: Option<Session>,
    connected: bool,
    /// True once the session was established; failures before that are
    /// connection failures rather than session errors.
    established: bool,
    /// A response is (believed) active upstream; guards double
    /// `response.create`.
    response_active: bool,
    /// At most one cancel per active response.
    cancel_sent: bool,
    gate: ResponseGate,
    last_activity: Instant,
    last_tick: Instant,
    watch_tx: watch::Sender<SessionSnapshot>,
}

impl VoiceSession {
    pub fn new(client: ClientTx, graph: Box<dyn OutputGraph>, config: EngineConfig) -> Self {
        let (watch_tx, _) = watch::channel(SessionSnapshot::initial());
        let now = Instant::now();
        Self {
            client,
            capture: CaptureController::new(None, config.capture_chunk_size()),
            playback: PlaybackEngine::new(graph),
            reveal: TextReveal::new(config.reveal_chars_per_sec()),
            turns: TurnMachine::new(),
            bridge: None,
            session_template: None,
            config,
            connected: false,
            established: false,
            response_active: false,
            cancel_sent: false,
            gate: ResponseGate::default(),
            last_activity: now,
            last_tick: now,
            watch_tx,
        }
    }

    pub fn with_bridge(mut self, bridge: ContextBridge) -> Self {
        self.bridge = Some(bridge);
        self
    }

    /// Session configuration sent upstream once `session.created` arrives.
    pub fn with_session_template(mut self, session: Session) -> Self {
        self.session_template = Some(session);
        self
    }

    pub fn with_capture(mut self, capture: CaptureController) -> Self {
        self.capture = capture;
        self
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.watch_tx.subscribe()
    }

    pub fn status(&self) -> TurnStatus {
        self.turns.status()
    }

    /// Drives the session until the server stream or the command channel
    /// closes.
    pub async fn run(
        mut self,
        mut server_rx: ServerRx,
        mut commands: tokio::sync::mpsc::Receiver<SessionCommand>,
    ) {
        let mut ticker = tokio::time::interval(self.config.tick_interval());
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                event = server_rx.recv() => match event {
                    Ok(event) => self.handle_server_event(event).await,
                    Err(RecvError::Lagged(n)) => {
                        tracing::warn!("dropped {} server events", n);
                    }
                    Err(RecvError::Closed) => {
                        self.handle_server_event(ServerEvent::Close { reason: None }).await;
                        break;
                    }
                },
                command = commands.recv() => match command {
                    Some(command) => self.handle_command(command).await,
                    None => break,
                },
                _ = ticker.tick() => self.tick(Instant::now()),
            }
        }
    }

    pub async fn handle_command(&mut self, command: SessionCommand) {
        match command {
            SessionCommand::StartListening => {
                if let Err(e) = self.start_listening().await {
                    tracing::error!("{}", e);
                }
            }
            SessionCommand::StopListening => self.stop_listening().await,
            SessionCommand::SendText(text) => self.send_text(&text).await,
            SessionCommand::Pause => self.pause(),
            SessionCommand::Resume => self.resume(),
            SessionCommand::Interrupt => self.interrupt().await,
        }
        self.settle();
    }

    pub async fn handle_server_event(&mut self, event: ServerEvent) {
        match event {
            ServerEvent::SessionCreated(data) => {
                tracing::info!("session created: {:?}", data.session().id());
                self.connected = true;
                self.established = true;
                if let Some(template) = self.session_template.clone() {
                    let update = ClientEvent::SessionUpdate(
                        crate::types::events::client::SessionUpdateEvent::new(template),
                    );
                    self.send(update).await;
                }
            }
            ServerEvent::ResponseCreated(data) => {
                self.response_active = true;
                self.cancel_sent = false;
                if self.turns.status().is_active() {
                    self.gate.open(data.response().id());
                } else {
                    // A response we no longer want (e.g. created just after a
                    // barge-in); leave the gate closed so its payloads drop.
                    tracing::debug!("response created with no active turn");
                }
                self.last_activity = Instant::now();
            }
            ServerEvent::ResponseAudioDelta(data) => {
                self.last_activity = Instant::now();
                if self.gate.accepts(data.response_id()) {
                    match AudioBuffer::from_payload(data.delta()) {
                        Some(buffer) => {
                            self.turns.first_audio();
                            self.playback.enqueue(buffer);
                        }
                        None => {
                            self.turns.fail("audio decode failed");
                            self.gate.close();
                        }
                    }
                }
            }
            ServerEvent::ResponseTextDelta(data) | ServerEvent::ResponseOutputTextDelta(data) => {
                self.last_activity = Instant::now();
                if self.gate.accepts(data.response_id()) {
                    self.reveal.push_delta(data.delta());
                }
            }
            ServerEvent::ResponseAudioTranscriptDelta(data) => {
                self.last_activity = Instant::now();
                if self.gate.accepts(data.response_id()) {
                    self.reveal.push_delta(data.delta());
                }
            }
            ServerEvent::ResponseTextDone(data) => {
                if self.gate.accepts(data.response_id()) {
                    self.turns.mark_text_complete();
                }
            }
            ServerEvent::ResponseAudioTranscriptDone(data) => {
                if self.gate.accepts(data.response_id()) {
                    self.turns.mark_text_complete();
                }
            }
            ServerEvent::ResponseAudioDone(data) => {
                if self.gate.accepts(data.response_id()) {
                    self.playback.mark_stream_complete();
                }
            }
            ServerEvent::ResponseDone(data) => {
                self.last_activity = Instant::now();
                if self.gate.matches(data.response().id()) {
                    // Both halves of completion: the response carries no
                    // further text or audio once it is done.
                    self.turns.mark_text_complete();
                    self.playback.mark_stream_complete();
                    self.gate.close();
                }
                self.response_active = false;
            }
            ServerEvent::ResponseFunctionCallArgumentsDone(data) => {
                self.last_activity = Instant::now();
                if data.name().is_some_and(|name| name == GROUNDING_FUNCTION) {
                    if let Some(bridge) = self.bridge.as_ref() {
                        let events = bridge.handle_call(&data).await;
                        for event in events {
                            if matches!(event, ClientEvent::ResponseCreate(_)) {
                                self.response_active = true;
                            }
                            self.send(event).await;
                        }
                    } else {
                        tracing::warn!("grounding call received but no context bridge is set");
                    }
                } else {
                    tracing::debug!("unhandled function call: {:?}", data.name());
                }
            }
            ServerEvent::Error(data) => {
                if is_benign_notice(data.error()) {
                    tracing::debug!("benign protocol notice: {:?}", data.error().message());
                } else {
                    let message = data
                        .error()
                        .message()
                        .unwrap_or("upstream error")
                        .to_string();
                    tracing::error!("upstream error: {}", message);
                    self.turns.fail(&message);
                    self.gate.close();
                }
            }
            ServerEvent::Close { reason } => {
                self.connected = false;
                let detail = reason.unwrap_or_else(|| "connection closed".to_string());
                if self.established {
                    self.turns.fail(&detail);
                } else {
                    tracing::error!("connection failed before session was established: {}", detail);
                }
                self.gate.close();
                self.response_active = false;
            }
            ServerEvent::Unhandled { kind } => {
                tracing::debug!("ignoring message kind: {}", kind);
            }
        }
        self.settle();
    }

    /// Bookkeeping tick: observes playback completions, paces the reveal,
    /// asserts drained/finished, and enforces the processing timeout.
    pub fn tick(&mut self, now: Instant) {
        let elapsed = now.duration_since(self.last_tick);
        self.last_tick = now;

        self.playback.poll();
        if self.turns.status() == TurnStatus::Playing {
            self.reveal.advance(elapsed);
        }
        if self.turns.status() == TurnStatus::Processing
            && now.duration_since(self.last_activity) > self.config.processing_timeout()
        {
            let timeout = EngineError::ResponseTimeout(self.config.processing_timeout());
            tracing::error!("{}", timeout);
            self.turns.fail(&timeout.to_string());
            self.gate.close();
        }
        self.settle();
    }

    /// Converges derived state after any event: queue advancement, the
    /// drained flag, the finished transition and its full-text catch-up.
    fn settle(&mut self) {
        self.playback.poll();
        if self.playback.drained() {
            self.turns.mark_audio_drained();
        }
        if self.turns.finish_if_complete() {
            self.reveal.reveal_all();
        }
        self.publish();
    }

    /// Acquires the microphone for a new turn, barging in on whatever is
    /// active.
    pub async fn start_listening(&mut self) -> Result<(), EngineError> {
        self.interrupt().await;
        self.reveal.clear();
        let _ = self.turns.begin_listening();
        if let Err(e) = self.capture.start(self.client.clone()).await {
            self.turns.fail(&e.to_string());
            self.publish();
            return Err(e);
        }
        self.publish();
        Ok(())
    }

    /// Releases the microphone; commits the captured audio when there is
    /// any, and asks for a response unless one is already active.
    pub async fn stop_listening(&mut self) {
        let captured_ms = self.capture.stop().await;
        self.complete_listening(captured_ms).await;
    }

    async fn complete_listening(&mut self, captured_ms: u64) {
        if captured_ms > 0 {
            let events = finish_messages(captured_ms, self.response_active);
            let created = events
                .iter()
                .any(|e| matches!(e, ClientEvent::ResponseCreate(_)));
            for event in events {
                self.send(event).await;
            }
            self.turns.begin_processing();
            if created {
                self.response_active = true;
            }
            self.last_activity = Instant::now();
        } else {
            // Nothing captured: an empty commit is a protocol error
            // upstream, so the wire stays untouched.
            self.turns.abandon_listening();
        }
        self.publish();
    }

    /// Sends a typed message: exactly one item create followed by exactly
    /// one response create, after barging in on any active turn.
    pub async fn send_text(&mut self, text: &str) {
        self.interrupt().await;
        self.reveal.clear();
        if self.turns.begin_text_turn().is_err() {
            return;
        }
        let item = Item::Message(
            MessageItem::builder()
                .with_role(MessageRole::User)
                .with_input_text(text)
                .build(),
        );
        self.send(ClientEvent::ConversationItemCreate(
            ConversationItemCreateEvent::new(item),
        ))
        .await;
        self.send(ClientEvent::ResponseCreate(
            crate::types::events::client::ResponseCreateEvent::new(),
        ))
        .await;
        self.response_active = true;
        self.last_activity = Instant::now();
        self.publish();
    }

    /// Pauses playback and the transcript reveal together.
    pub fn pause(&mut self) {
        if self.turns.pause() {
            self.playback.pause();
            self.publish();
        }
    }

    pub fn resume(&mut self) {
        if self.turns.resume() {
            self.playback.resume();
            self.publish();
        }
    }

    /// Barge-in: synchronously flushes playback, clears the pending text,
    /// cancels the upstream response at most once and marks the turn
    /// stopped.
    pub async fn interrupt(&mut self) {
        let started = Instant::now();
        if self.capture.is_listening() {
            // Discard the open listening window without committing.
            let _ = self.capture.stop().await;
        }
        if self.turns.interrupt() {
            self.playback.flush();
            self.reveal.clear();
            self.gate.close();
            if self.response_active && !self.cancel_sent {
                self.send(ClientEvent::ResponseCancel(ResponseCancelEvent::new()))
                    .await;
                self.cancel_sent = true;
            }
            let took = started.elapsed();
            if took > self.config.interrupt_budget() {
                tracing::warn!("barge-in took {:?}, over the {:?} budget", took, self.config.interrupt_budget());
            }
            self.publish();
        }
    }

    async fn send(&self, event: ClientEvent) {
        if let Err(e) = self.client.send(event).await {
            tracing::error!("failed to queue client event: {}", e);
        }
    }

    fn publish(&self) {
        let snapshot = SessionSnapshot {
            status: self.turns.status(),
            full_text: self.reveal.full_text(),
            visible_text: self.reveal.visible_text(),
            error: self
                .turns
                .current()
                .and_then(|t| t.error().map(|e| e.to_string())),
            connected: self.connected,
        };
        self.watch_tx.send_if_modified(|prev| {
            if *prev == snapshot {
                false
            } else {
                *prev = snapshot;
                true
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playback::test_graph::TestGraph;
    use std::time::Duration;

    struct Harness {
        session: VoiceSession,
        graph: TestGraph,
        client_rx: tokio::sync::mpsc::Receiver<ClientEvent>,
    }

    fn harness() -> Harness {
        harness_with_config(EngineConfig::new())
    }

    fn harness_with_config(config: EngineConfig) -> Harness {
        let (client_tx, client_rx) = tokio::sync::mpsc::channel(64);
        let graph = TestGraph::new();
        let session = VoiceSession::new(client_tx, Box::new(graph.clone()), config);
        Harness {
            session,
            graph,
            client_rx,
        }
    }

    impl Harness {
        fn sent(&mut self) -> Vec<ClientEvent> {
            let mut events = Vec::new();
            while let Ok(event) = self.client_rx.try_recv() {
                events.push(event);
            }
            events
        }

        fn sent_kinds(&mut self) -> Vec<&'static str> {
            self.sent()
                .iter()
                .map(|e| match e {
                    ClientEvent::SessionUpdate(_) => "session.update",
                    ClientEvent::InputAudioBufferAppend(_) => "append",
                    ClientEvent::InputAudioBufferCommit(_) => "commit",
                    ClientEvent::InputAudioBufferClear(_) => "clear",
                    ClientEvent::ConversationItemCreate(_) => "item.create",
                    ClientEvent::ResponseCreate(_) => "response.create",
                    ClientEvent::ResponseCancel(_) => "response.cancel",
                })
                .collect()
        }
    }

    fn response_created(id: &str) -> ServerEvent {
        ServerEvent::parse(&format!(
            r#"{{"type": "response.created", "event_id": "ev", "response": {{"id": "{id}", "status": "in_progress"}}}}"#
        ))
    }

    fn audio_delta(id: &str, samples: &[i16]) -> ServerEvent {
        use base64::Engine as _;
        let pcm: Vec<u8> = samples.iter().flat_map(|v| v.to_le_bytes()).collect();
        let payload = base64::engine::general_purpose::STANDARD.encode(&pcm);
        ServerEvent::parse(&format!(
            r#"{{"type": "response.audio.delta", "event_id": "ev", "response_id": "{id}", "item_id": "i", "output_index": 0, "content_index": 0, "delta": "{payload}"}}"#
        ))
    }

    fn text_delta(id: &str, delta: &str) -> ServerEvent {
        ServerEvent::parse(&format!(
            r#"{{"type": "response.audio_transcript.delta", "event_id": "ev", "response_id": "{id}", "item_id": "i", "output_index": 0, "content_index": 0, "delta": "{delta}"}}"#
        ))
    }

    fn audio_done(id: &str) -> ServerEvent {
        ServerEvent::parse(&format!(
            r#"{{"type": "response.audio.done", "event_id": "ev", "response_id": "{id}", "item_id": "i", "output_index": 0, "content_index": 0}}"#
        ))
    }

    fn response_done(id: &str) -> ServerEvent {
        ServerEvent::parse(&format!(
            r#"{{"type": "response.done", "event_id": "ev", "response": {{"id": "{id}", "status": "completed"}}}}"#
        ))
    }

    fn error_event(body: &str) -> ServerEvent {
        ServerEvent::parse(&format!(
            r#"{{"type": "error", "event_id": "ev", "error": {body}}}"#
        ))
    }

    /// Scenario 1: a spoken turn runs through commit/create, plays its
    /// audio and finishes only when both streams have completed.
    #[tokio::test]
    async fn spoken_turn_reaches_finished() {
        let mut h = harness();
        h.session.turns.begin_listening().unwrap();
        h.session.complete_listening(600).await;
        assert_eq!(h.sent_kinds(), vec!["commit", "response.create"]);
        assert_eq!(h.session.status(), TurnStatus::Processing);

        h.session.handle_server_event(response_created("r1")).await;
        h.session
            .handle_server_event(audio_delta("r1", &[100, -100, 200]))
            .await;
        assert_eq!(h.session.status(), TurnStatus::Playing);

        h.session.handle_server_event(text_delta("r1", "Hi there")).await;
        h.session.handle_server_event(audio_done("r1")).await;
        h.session.handle_server_event(response_done("r1")).await;
        // Audio is still audible; the turn must not finish yet.
        assert_eq!(h.session.status(), TurnStatus::Playing);

        h.graph.complete_current();
        h.session.tick(Instant::now());
        assert_eq!(h.session.status(), TurnStatus::Finished);
        // Catch-up on drain reveals the entire text.
        let snapshot = h.session.subscribe().borrow().clone();
        assert_eq!(snapshot.visible_text, "Hi there");
    }

    /// Scenario 2: a typed message sends exactly one item create followed
    /// by exactly one response create.
    #[tokio::test]
    async fn typed_turn_sends_one_item_one_create() {
        let mut h = harness();
        h.session.send_text("hello").await;
        assert_eq!(h.sent_kinds(), vec!["item.create", "response.create"]);
        assert_eq!(h.session.status(), TurnStatus::Processing);
    }

    /// Scenario 3: pausing mid-playback replays nothing and loses nothing.
    #[tokio::test]
    async fn pause_resume_replays_no_buffer() {
        let mut h = harness();
        h.session.send_text("hello").await;
        h.session.handle_server_event(response_created("r1")).await;
        for i in 0..3 {
            h.session
                .handle_server_event(audio_delta("r1", &[i as i16; 4]))
                .await;
        }
        assert_eq!(h.session.status(), TurnStatus::Playing);

        h.session.pause();
        assert_eq!(h.session.status(), TurnStatus::Paused);
        assert!(h.graph.is_suspended());
        // Completion racing the pause must not advance the queue.
        h.graph.complete_current();
        h.session.tick(Instant::now());
        assert_eq!(h.graph.scheduled().len(), 1);

        h.session.resume();
        h.session.tick(Instant::now());
        h.graph.complete_current();
        h.session.tick(Instant::now());
        h.graph.complete_current();
        h.session.tick(Instant::now());

        let tags: Vec<f32> = h
            .graph
            .scheduled()
            .iter()
            .map(|b| b.samples()[0])
            .collect();
        assert_eq!(tags.len(), 3, "every buffer played exactly once");
    }

    /// Scenario 4: an empty upstream error payload with no active response
    /// is swallowed.
    #[tokio::test]
    async fn empty_error_payload_is_benign() {
        let mut h = harness();
        h.session.handle_server_event(error_event("{}")).await;
        assert_eq!(h.session.status(), TurnStatus::Idle);
        let snapshot = h.session.subscribe().borrow().clone();
        assert!(snapshot.error.is_none());

        // The cancel-race wording is equally benign mid-turn.
        h.session.send_text("hi").await;
        h.session
            .handle_server_event(error_event(
                r#"{"type": "invalid_request_error", "message": "Cancellation failed: no active response found"}"#,
            ))
            .await;
        assert_eq!(h.session.status(), TurnStatus::Processing);
    }

    /// Scenario 5: barge-in during playing stops the turn, empties the
    /// queue, cancels once, and leaves the engine clean for the next turn.
    #[tokio::test]
    async fn barge_in_empties_queue_before_next_turn() {
        let mut h = harness();
        h.session.send_text("first").await;
        h.session.handle_server_event(response_created("r1")).await;
        for _ in 0..4 {
            h.session
                .handle_server_event(audio_delta("r1", &[5; 8]))
                .await;
        }
        assert_eq!(h.session.status(), TurnStatus::Playing);
        h.sent();

        h.session.interrupt().await;
        assert_eq!(h.session.status(), TurnStatus::Stopped);
        assert_eq!(h.session.playback.queue_len(), 0);
        assert!(!h.session.playback.has_in_flight());
        assert_eq!(h.sent_kinds(), vec!["response.cancel"]);

        // A second interrupt before a new response exists sends nothing.
        h.session.interrupt().await;
        assert!(h.sent_kinds().is_empty());

        // Stragglers from the cancelled response are dropped.
        h.session
            .handle_server_event(audio_delta("r1", &[9; 8]))
            .await;
        assert_eq!(h.session.playback.queue_len(), 0);
        assert!(!h.session.playback.has_in_flight());

        // The next turn starts with an empty queue.
        h.session.send_text("second").await;
        h.session.handle_server_event(response_done("r1")).await;
        h.session.handle_server_event(response_created("r2")).await;
        h.session
            .handle_server_event(audio_delta("r2", &[7; 8]))
            .await;
        assert_eq!(h.session.status(), TurnStatus::Playing);
        let scheduled = h.graph.scheduled();
        let head = scheduled.last().unwrap().samples()[0];
        assert!((head - 7.0 / i16::MAX as f32).abs() < 1e-6);
    }

    #[tokio::test]
    async fn zero_duration_stop_touches_nothing_on_the_wire() {
        let mut h = harness();
        h.session.turns.begin_listening().unwrap();
        h.session.complete_listening(0).await;
        assert!(h.sent_kinds().is_empty());
        assert_eq!(h.session.status(), TurnStatus::Stopped);
    }

    #[tokio::test]
    async fn second_commit_while_response_active_sends_no_create() {
        let mut h = harness();
        h.session.send_text("question").await;
        h.session.handle_server_event(response_created("r1")).await;
        h.sent();

        // Barge in by speaking; the response is still active upstream.
        h.session.interrupt().await;
        h.session.turns.begin_listening().unwrap();
        h.sent();
        h.session.complete_listening(400).await;
        let kinds = h.sent_kinds();
        assert_eq!(kinds, vec!["commit"], "no second response.create: {kinds:?}");
    }

    #[tokio::test]
    async fn processing_timeout_fails_the_turn() {
        let mut h = harness_with_config(
            EngineConfig::builder()
                .with_processing_timeout(Duration::from_secs(5))
                .build(),
        );
        h.session.send_text("anyone there?").await;
        assert_eq!(h.session.status(), TurnStatus::Processing);

        h.session.tick(Instant::now() + Duration::from_secs(6));
        assert_eq!(h.session.status(), TurnStatus::Error);
        let snapshot = h.session.subscribe().borrow().clone();
        assert!(snapshot.error.is_some());
    }

    #[tokio::test]
    async fn fatal_upstream_error_ends_turn_but_keeps_text() {
        let mut h = harness();
        h.session.send_text("hi").await;
        h.session.handle_server_event(response_created("r1")).await;
        h.session.handle_server_event(text_delta("r1", "partial answer")).await;
        h.session
            .handle_server_event(error_event(
                r#"{"type": "server_error", "message": "The server had an error"}"#,
            ))
            .await;
        assert_eq!(h.session.status(), TurnStatus::Error);
        let snapshot = h.session.subscribe().borrow().clone();
        // Received text is never silently dropped by an error.
        assert_eq!(snapshot.full_text, "partial answer");
        assert_eq!(snapshot.error.as_deref(), Some("The server had an error"));
    }

    #[tokio::test]
    async fn reveal_tracks_playback_and_freezes_while_paused() {
        let mut h = harness_with_config(
            EngineConfig::builder().with_reveal_chars_per_sec(10.0).build(),
        );
        h.session.send_text("hi").await;
        h.session.handle_server_event(response_created("r1")).await;
        h.session
            .handle_server_event(audio_delta("r1", &[1; 480]))
            .await;
        h.session
            .handle_server_event(text_delta("r1", "abcdefghijklmnopqrstuvwxyz"))
            .await;

        let t0 = Instant::now();
        h.session.tick(t0);
        h.session.tick(t0 + Duration::from_secs(1));
        let visible_after_1s = h.session.reveal.visible_len();
        // The first tick absorbs whatever real time elapsed since
        // construction, so allow one character of slack.
        assert!((10..=11).contains(&visible_after_1s), "{visible_after_1s}");

        h.session.pause();
        h.session.tick(t0 + Duration::from_secs(3));
        assert_eq!(h.session.reveal.visible_len(), visible_after_1s, "paused reveal froze");

        h.session.resume();
        h.session.tick(t0 + Duration::from_secs(4));
        assert!(h.session.reveal.visible_len() > visible_after_1s);
    }

    #[tokio::test]
    async fn close_after_establishment_fails_turn_not_session_setup() {
        let mut h = harness();
        h.session
            .handle_server_event(ServerEvent::parse(
                r#"{"type": "session.created", "event_id": "ev", "session": {"id": "s1", "model": "m"}}"#,
            ))
            .await;
        h.session.send_text("hi").await;
        h.session
            .handle_server_event(ServerEvent::Close { reason: None })
            .await;
        assert_eq!(h.session.status(), TurnStatus::Error);
        let snapshot = h.session.subscribe().borrow().clone();
        assert!(!snapshot.connected);
    }

    #[tokio::test]
    async fn session_template_sent_on_creation() {
        let mut h = harness();
        h.session = {
            let (client_tx, client_rx) = tokio::sync::mpsc::channel(64);
            h.client_rx = client_rx;
            VoiceSession::new(client_tx, Box::new(h.graph.clone()), EngineConfig::new())
                .with_session_template(Session::new().with_modalities_enable_audio().build())
        };
        h.session
            .handle_server_event(ServerEvent::parse(
                r#"{"type": "session.created", "event_id": "ev", "session": {"id": "s1", "model": "m"}}"#,
            ))
            .await;
        assert_eq!(h.sent_kinds(), vec!["session.update"]);
    }
}
