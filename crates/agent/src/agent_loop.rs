//! Agent loop — query, dispatch a requested tool, re-query with the result.
//!
//! The loop is an explicit state machine:
//!
//! ```text
//! AwaitingResponse ──tool request──▶ Dispatching ──▶ Requerying ──▶ AwaitingResponse
//!        │                                                              │
//!        └──────────── plain answer / rounds exhausted ──▶ Final ◀──────┘
//! ```
//!
//! The number of tool rounds is bounded; once it is reached, the latest
//! parsed answer is returned as-is, even if it asks for another tool.

use std::sync::Arc;

use tracing::{debug, info};
use vitalis_core::{ParsedResult, ToolCall, ToolRegistry};

use crate::client::{InferenceClient, QueryRequest};

enum LoopState {
    AwaitingResponse,
    Dispatching(ToolCall),
    Requerying(String),
    Final(ParsedResult),
}

/// Runs structured queries with tool use enabled.
#[derive(Clone)]
pub struct AgentLoop {
    client: InferenceClient,
    tools: Arc<ToolRegistry>,
    max_tool_rounds: u32,
}

impl AgentLoop {
    pub fn new(client: InferenceClient, tools: Arc<ToolRegistry>) -> Self {
        Self {
            client,
            tools,
            max_tool_rounds: 1,
        }
    }

    pub fn with_max_tool_rounds(mut self, rounds: u32) -> Self {
        self.max_tool_rounds = rounds;
        self
    }

    pub fn client(&self) -> &InferenceClient {
        &self.client
    }

    pub fn tools(&self) -> &Arc<ToolRegistry> {
        &self.tools
    }

    /// Run `request`, letting the model call tools up to the round limit.
    pub async fn run(&self, request: QueryRequest) -> ParsedResult {
        let mut current = request.clone();
        let mut rounds = 0;
        let mut state = LoopState::AwaitingResponse;

        loop {
            state = match state {
                LoopState::AwaitingResponse => {
                    let parsed = self.client.query(&current).await;
                    match ToolCall::from_parsed(&parsed) {
                        Some(call) if rounds < self.max_tool_rounds => LoopState::Dispatching(call),
                        _ => LoopState::Final(parsed),
                    }
                }
                LoopState::Dispatching(call) => {
                    rounds += 1;
                    info!(tool = %call.name, round = rounds, "Model requested a tool");
                    let result = self.tools.dispatch(&call).await;
                    debug!(tool = %call.name, result = %result, "Tool result ready");
                    LoopState::Requerying(follow_up_prompt(&result, &request.prompt))
                }
                LoopState::Requerying(prompt) => {
                    // Follow-ups are text only; the images were already seen.
                    current = QueryRequest {
                        prompt,
                        images: Vec::new(),
                        ..request.clone()
                    };
                    LoopState::AwaitingResponse
                }
                LoopState::Final(parsed) => return parsed,
            };
        }
    }
}

/// The prompt sent after a tool ran. It carries the original request so the
/// model can answer it in context.
fn follow_up_prompt(result: &str, original: &str) -> String {
    format!("Tool Result: {result}. Answer user JSON.\nOriginal request: {original}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::tests::ScriptedProvider;
    use vitalis_tools::default_registry;

    fn agent(replies: &[&str]) -> (AgentLoop, Arc<ScriptedProvider>) {
        let provider = ScriptedProvider::texts(replies);
        let client = InferenceClient::new(provider.clone(), "m");
        (AgentLoop::new(client, Arc::new(default_registry())), provider)
    }

    #[tokio::test]
    async fn plain_answer_finishes_in_one_turn() {
        let (agent, provider) = agent(&[r#"{"response": "Drink water."}"#]);
        let parsed = agent.run(QueryRequest::new("tips?")).await;
        assert_eq!(parsed.get("response").and_then(|v| v.as_str()), Some("Drink water."));
        assert_eq!(provider.requests().len(), 1);
    }

    #[tokio::test]
    async fn tool_result_is_fed_back() {
        let (agent, provider) = agent(&[
            r#"{"tool": "calculate_bmi", "args": {"weight_kg": 70, "height_m": 1.75}}"#,
            r#"{"response": "Your BMI is 22.86, which is healthy."}"#,
        ]);

        let parsed = agent
            .run(QueryRequest::new("I weigh 70kg and I'm 1.75m").with_system("Medical Assistant."))
            .await;
        assert_eq!(
            parsed.get("response").and_then(|v| v.as_str()),
            Some("Your BMI is 22.86, which is healthy.")
        );

        let requests = provider.requests();
        assert_eq!(requests.len(), 2);
        let second = &requests[1];
        assert_eq!(second.messages[0].content, "Medical Assistant.");
        let prompt = &second.messages[1].content;
        assert!(prompt.contains("BMI: 22.86"));
        assert!(prompt.contains("I weigh 70kg and I'm 1.75m"));
    }

    #[tokio::test]
    async fn follow_up_does_not_resend_images() {
        let (agent, provider) = agent(&[
            r#"{"tool": "calculate_bmi", "args": {"weight_kg": 70, "height_m": 1.75}}"#,
            r#"{"response": "Looks balanced."}"#,
        ]);

        agent
            .run(QueryRequest::new("Rate this plate").with_images(vec!["aGVsbG8=".into()]))
            .await;

        let requests = provider.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].messages.last().unwrap().images, vec!["aGVsbG8=".to_string()]);
        assert!(requests[1].messages.iter().all(|m| m.images.is_empty()));
    }

    #[tokio::test]
    async fn rounds_are_bounded() {
        let (agent, provider) = agent(&[
            r#"{"tool": "calculate_bmi", "args": {"weight_kg": 70, "height_m": 1.75}}"#,
            r#"{"tool": "calculate_bmi", "args": {"weight_kg": 80, "height_m": 1.8}}"#,
            r#"{"response": "never reached"}"#,
        ]);

        let parsed = agent.run(QueryRequest::new("bmi?")).await;
        assert!(parsed.is_tool_request());
        assert_eq!(provider.requests().len(), 2);
    }

    #[tokio::test]
    async fn zero_rounds_disables_tools() {
        let (agent, provider) = agent(&[r#"{"tool": "calculate_bmi", "args": {}}"#]);
        let agent = agent.with_max_tool_rounds(0);

        let parsed = agent.run(QueryRequest::new("bmi?")).await;
        assert!(parsed.is_tool_request());
        assert_eq!(provider.requests().len(), 1);
    }

    #[tokio::test]
    async fn unknown_tool_message_reaches_the_model() {
        let (agent, provider) = agent(&[
            r#"{"tool": "teleport", "args": {}}"#,
            r#"{"response": "I can't do that."}"#,
        ]);

        agent.run(QueryRequest::new("beam me up")).await;
        let requests = provider.requests();
        assert!(requests[1].messages[0].content.contains("Unknown tool: teleport"));
    }

    #[tokio::test]
    async fn absent_first_answer_is_final() {
        let (agent, provider) = agent(&["garbage", "more garbage"]);
        assert!(agent.run(QueryRequest::new("x")).await.is_absent());
        assert_eq!(provider.requests().len(), 2);
    }
}
