use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use crate::types::events::client::{ConversationItemCreateEvent, ResponseCreateEvent};
use crate::types::events::server::ResponseFunctionCallArgumentsDoneEvent;
use crate::types::tools::{FunctionTool, Tool};
use crate::types::{ClientEvent, FunctionCallOutputItem, Item};

/// Name of the function the model calls to fetch grounding data.
pub const GROUNDING_FUNCTION: &str = "fetch_grounding_context";

/// Result of one grounding lookup: profile fields, relevant content entries
/// and keyword-matched knowledge snippets.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct GroundingContext {
    #[serde(default)]
    pub profile: serde_json::Value,
    #[serde(default)]
    pub content: Vec<ContentEntry>,
    #[serde(default)]
    pub snippets: Vec<String>,
}

impl GroundingContext {
    /// The explicit empty-result payload returned when a lookup fails; an
    /// unanswered function call would stall the model turn.
    pub fn empty() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ContentEntry {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
}

/// The external profile/content store behind the bridge. Abstracted so the
/// session logic can be exercised without network calls.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ContextStore {
    async fn fetch(&self, query: &str, user_id: &str) -> anyhow::Result<GroundingContext>;
}

pub struct HttpContextStore {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpContextStore {
    pub fn new(endpoint: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
        }
    }
}

#[async_trait]
impl ContextStore for HttpContextStore {
    async fn fetch(&self, query: &str, user_id: &str) -> anyhow::Result<GroundingContext> {
        let body = serde_json::json!({
            "query": query,
            "user_id": user_id,
        });
        let context = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json::<GroundingContext>()
            .await?;
        Ok(context)
    }
}

/// Answers the model's grounding function calls: one lookup, one
/// function-call output tagged with the model's call id, then a new
/// response so the model can continue. No retries.
pub struct ContextBridge {
    store: Box<dyn ContextStore + Send + Sync>,
    user_id: String,
}

impl ContextBridge {
    pub fn new(store: Box<dyn ContextStore + Send + Sync>, user_id: String) -> Self {
        Self { store, user_id }
    }

    pub async fn handle_call(
        &self,
        call: &ResponseFunctionCallArgumentsDoneEvent,
    ) -> Vec<ClientEvent> {
        let query = serde_json::from_str::<serde_json::Value>(call.arguments())
            .ok()
            .and_then(|args| {
                args.get("query")
                    .and_then(|q| q.as_str())
                    .map(|q| q.to_string())
            })
            .unwrap_or_default();

        let context = match self.store.fetch(&query, &self.user_id).await {
            Ok(context) => context,
            Err(e) => {
                tracing::warn!("grounding lookup failed: {}, answering empty", e);
                GroundingContext::empty()
            }
        };

        let output = serde_json::to_string(&context).unwrap_or_else(|_| "{}".to_string());
        let item = Item::FunctionCallOutput(FunctionCallOutputItem::new(call.call_id(), &output));
        vec![
            ClientEvent::ConversationItemCreate(ConversationItemCreateEvent::new(item)),
            ClientEvent::ResponseCreate(ResponseCreateEvent::new()),
        ]
    }
}

/// The tool definition advertised to the model in `session.update`.
pub fn grounding_tool() -> Tool {
    Tool::Function(FunctionTool::new(
        GROUNDING_FUNCTION.to_string(),
        "Fetch the user's profile, relevant content and knowledge snippets for a query."
            .to_string(),
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "What to look up"
                }
            },
            "required": ["query"]
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call_event(arguments: &str) -> ResponseFunctionCallArgumentsDoneEvent {
        serde_json::from_value(serde_json::json!({
            "event_id": "ev_1",
            "response_id": "resp_1",
            "item_id": "item_1",
            "output_index": 0,
            "call_id": "call_7",
            "name": GROUNDING_FUNCTION,
            "arguments": arguments,
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn answers_with_store_result_and_call_id() {
        let mut store = MockContextStore::new();
        store
            .expect_fetch()
            .withf(|query, user| query == "photosynthesis" && user == "user_1")
            .returning(|_, _| {
                Ok(GroundingContext {
                    snippets: vec!["chlorophyll".to_string()],
                    ..GroundingContext::default()
                })
            });
        let bridge = ContextBridge::new(Box::new(store), "user_1".to_string());

        let events = bridge
            .handle_call(&call_event(r#"{"query": "photosynthesis"}"#))
            .await;
        assert_eq!(events.len(), 2);
        match &events[0] {
            ClientEvent::ConversationItemCreate(create) => match &create.item {
                Item::FunctionCallOutput(out) => {
                    assert_eq!(out.call_id(), "call_7");
                    assert!(out.output().contains("chlorophyll"));
                }
                other => panic!("unexpected item: {:?}", other),
            },
            other => panic!("unexpected event: {:?}", other),
        }
        assert!(matches!(events[1], ClientEvent::ResponseCreate(_)));
    }

    #[tokio::test]
    async fn failed_lookup_answers_empty_not_silent() {
        let mut store = MockContextStore::new();
        store
            .expect_fetch()
            .returning(|_, _| Err(anyhow::anyhow!("store is down")));
        let bridge = ContextBridge::new(Box::new(store), "user_1".to_string());

        let events = bridge.handle_call(&call_event(r#"{"query": "x"}"#)).await;
        assert_eq!(events.len(), 2, "a failed lookup must still answer");
        match &events[0] {
            ClientEvent::ConversationItemCreate(create) => match &create.item {
                Item::FunctionCallOutput(out) => {
                    let parsed: GroundingContext = serde_json::from_str(out.output()).unwrap();
                    assert!(parsed.snippets.is_empty());
                    assert!(parsed.content.is_empty());
                }
                other => panic!("unexpected item: {:?}", other),
            },
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn malformed_arguments_become_empty_query() {
        let mut store = MockContextStore::new();
        store
            .expect_fetch()
            .withf(|query, _| query.is_empty())
            .returning(|_, _| Ok(GroundingContext::empty()));
        let bridge = ContextBridge::new(Box::new(store), "user_1".to_string());
        let events = bridge.handle_call(&call_event("not json")).await;
        assert_eq!(events.len(), 2);
    }
}
