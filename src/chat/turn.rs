//! Processing of a single conversational turn.

use crate::backend::{CompletionClient, CompletionRequest};
use crate::chat::session::Session;
use crate::chat::transcript::Message;
use crate::error::Error;
use crate::observability::{CHAT_CONTEXT_MESSAGES, CHAT_TURN_ERRORS, CHAT_TURNS};
use crate::types::ChatMessage;

/// System instruction used when none is configured.
pub const DEFAULT_SYSTEM_INSTRUCTION: &str =
    "You are a helpful assistant. Use conversation history to answer contextually.";

/// What happened during a turn.
///
/// The reply itself, or the error text standing in for it, is already the last
/// message of the session transcript when this is returned.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    /// Number of transcript messages forwarded as history.
    pub context_len: usize,
    /// The upstream failure, if the reply is an error message.
    pub error: Option<Error>,
}

impl TurnOutcome {
    /// True when the reply is an error message.
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Runs turns against a completion client.
pub struct TurnProcessor<C: CompletionClient> {
    client: C,
    system_instruction: String,
}

impl<C: CompletionClient> TurnProcessor<C> {
    /// Creates a processor that uses [`DEFAULT_SYSTEM_INSTRUCTION`].
    pub fn new(client: C) -> Self {
        Self::with_system_instruction(client, DEFAULT_SYSTEM_INSTRUCTION)
    }

    /// Creates a processor with a custom system instruction.
    pub fn with_system_instruction(client: C, system_instruction: impl Into<String>) -> Self {
        Self {
            client,
            system_instruction: system_instruction.into(),
        }
    }

    /// The client answering turns.
    pub fn client(&self) -> &C {
        &self.client
    }

    /// The instruction placed ahead of every history.
    pub fn system_instruction(&self) -> &str {
        &self.system_instruction
    }

    /// Sends `input` and appends the reply to the session.
    ///
    /// The user message is appended first, so it is part of the context.  The
    /// context is the last `memory_window` messages of the transcript.  Failures
    /// never escape: the error text is appended as the assistant's reply so that
    /// every turn ends with exactly one assistant message.
    pub async fn take_turn(&self, session: &mut Session, input: &str) -> TurnOutcome {
        session.append(Message::user(input));

        let history: Vec<ChatMessage> = session
            .transcript()
            .recent(session.memory_window().get())
            .iter()
            .map(ChatMessage::from)
            .collect();
        let context_len = history.len();

        let request = CompletionRequest {
            system_instruction: self.system_instruction.clone(),
            history,
            question: input.to_string(),
            model: session.model().to_string(),
        };

        CHAT_TURNS.click();
        CHAT_CONTEXT_MESSAGES.add(context_len as f64);
        tracing::debug!(model = %request.model, context_len, "taking turn");

        let outcome = match self.client.complete(request).await {
            Ok(reply) => {
                session.append(Message::assistant(reply));
                TurnOutcome {
                    context_len,
                    error: None,
                }
            }
            Err(err) => {
                CHAT_TURN_ERRORS.click();
                tracing::warn!(error = %err, model = session.model(), "turn failed");
                session.append(Message::assistant(format!("Error: {err}")));
                TurnOutcome {
                    context_len,
                    error: Some(err),
                }
            }
        };
        session.record_turn(outcome.is_error());
        outcome
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::chat::session::MemoryWindow;
    use crate::chat::transcript::Role;
    use crate::error::Result;

    /// Records every request and answers from a script.
    struct ScriptedClient {
        requests: Mutex<Vec<CompletionRequest>>,
        fail_with: Option<Error>,
    }

    impl ScriptedClient {
        fn ok() -> Self {
            Self {
                requests: Mutex::new(Vec::new()),
                fail_with: None,
            }
        }

        fn failing(err: Error) -> Self {
            Self {
                requests: Mutex::new(Vec::new()),
                fail_with: Some(err),
            }
        }

        fn requests(&self) -> Vec<CompletionRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl CompletionClient for ScriptedClient {
        async fn complete(&self, request: CompletionRequest) -> Result<String> {
            let reply = format!("re: {}", request.question);
            self.requests.lock().unwrap().push(request);
            match &self.fail_with {
                Some(err) => Err(err.clone()),
                None => Ok(reply),
            }
        }
    }

    fn session(window: u32) -> Session {
        Session::new(
            vec!["llama-3.1-8b-instant".to_string()],
            None,
            MemoryWindow::new(window).unwrap(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn first_turn_sends_only_the_question() {
        let processor = TurnProcessor::new(ScriptedClient::ok());
        let mut session = session(8);

        let outcome = processor.take_turn(&mut session, "hello").await;
        assert!(!outcome.is_error());
        assert_eq!(outcome.context_len, 1);

        let requests = processor.client().requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].history, vec![ChatMessage::user("hello")]);
        assert_eq!(requests[0].question, "hello");
        assert_eq!(requests[0].model, "llama-3.1-8b-instant");
        assert_eq!(requests[0].system_instruction, DEFAULT_SYSTEM_INSTRUCTION);

        let transcript = session.transcript();
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript.last().unwrap().role(), Role::Assistant);
        assert_eq!(transcript.last().unwrap().content(), "re: hello");
    }

    #[tokio::test]
    async fn context_is_bounded_by_window() {
        let processor = TurnProcessor::new(ScriptedClient::ok());
        let mut session = session(4);
        for i in 0..5 {
            processor.take_turn(&mut session, &format!("q{i}")).await;
        }
        assert_eq!(session.transcript().len(), 10);

        processor.take_turn(&mut session, "newest").await;
        let requests = processor.client().requests();
        let last = requests.last().unwrap();
        assert_eq!(
            last.history,
            vec![
                ChatMessage::assistant("re: q3"),
                ChatMessage::user("q4"),
                ChatMessage::assistant("re: q4"),
                ChatMessage::user("newest"),
            ]
        );
        for request in &requests {
            assert!(request.history.len() <= 4);
        }
    }

    #[tokio::test]
    async fn failure_becomes_assistant_message() {
        let processor = TurnProcessor::new(ScriptedClient::failing(Error::connection(
            "network unreachable",
            None,
        )));
        let mut session = session(8);

        let outcome = processor.take_turn(&mut session, "hello").await;
        assert!(outcome.is_error());
        assert!(outcome.error.as_ref().unwrap().is_connection());

        let transcript = session.transcript();
        assert_eq!(transcript.len(), 2);
        let reply = transcript.last().unwrap();
        assert_eq!(reply.role(), Role::Assistant);
        assert_eq!(reply.content(), "Error: Connection error: network unreachable");
        assert_eq!(session.stats().failed_turns, 1);
    }

    #[tokio::test]
    async fn error_replies_are_part_of_later_context() {
        let processor =
            TurnProcessor::new(ScriptedClient::failing(Error::rate_limit("slow down", None)));
        let mut session = session(8);
        processor.take_turn(&mut session, "one").await;
        processor.take_turn(&mut session, "two").await;

        let requests = processor.client().requests();
        assert_eq!(
            requests[1].history,
            vec![
                ChatMessage::user("one"),
                ChatMessage::assistant("Error: Rate limit exceeded: slow down"),
                ChatMessage::user("two"),
            ]
        );
    }

    #[tokio::test]
    async fn uses_current_model_and_instruction() {
        let processor =
            TurnProcessor::with_system_instruction(ScriptedClient::ok(), "Answer in French.");
        let mut session = Session::new(
            vec!["a".to_string(), "b".to_string()],
            Some("a"),
            MemoryWindow::DEFAULT,
        )
        .unwrap();
        session.set_model("b").unwrap();
        processor.take_turn(&mut session, "bonjour").await;

        let requests = processor.client().requests();
        assert_eq!(requests[0].model, "b");
        assert_eq!(requests[0].system_instruction, "Answer in French.");
        assert_eq!(processor.system_instruction(), "Answer in French.");
    }

    #[tokio::test]
    async fn clear_mid_session_starts_fresh_context() {
        let processor = TurnProcessor::new(ScriptedClient::ok());
        let mut session = session(8);
        processor.take_turn(&mut session, "remember 42").await;
        session.clear();
        assert_eq!(session.transcript().len(), 0);
        assert!(session.transcript().recent(5).is_empty());

        processor.take_turn(&mut session, "what number?").await;
        let requests = processor.client().requests();
        assert_eq!(
            requests[1].history,
            vec![ChatMessage::user("what number?")]
        );
    }
}
