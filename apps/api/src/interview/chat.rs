//! Interview chat: free-form interviewer replies grounded in the outline.

use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use crate::errors::CoreFailure;
use crate::interview::prompts::{fill_outline, CHAT_PROMPT_TEMPLATE};
use crate::llm_client::{generate_within, TextGenerator};
use crate::models::outline::InterviewOutline;

pub const CHAT_UNAVAILABLE_REPLY: &str =
    "I'm sorry, I couldn't process that right now. Please try again.";

pub struct InterviewChat {
    llm: Arc<dyn TextGenerator>,
    timeout: Duration,
}

impl InterviewChat {
    pub fn new(llm: Arc<dyn TextGenerator>, timeout: Duration) -> Self {
        Self { llm, timeout }
    }

    pub async fn reply(&self, outline: &InterviewOutline, message: &str) -> String {
        let prompt = fill_outline(CHAT_PROMPT_TEMPLATE, outline, &[("message", message)]);

        match generate_within(self.llm.as_ref(), &prompt, self.timeout).await {
            Ok(reply) => reply.trim().to_string(),
            Err(e) => {
                let failure = CoreFailure::GenerationUnavailable(e.to_string());
                warn!(
                    kind = failure.kind(),
                    "Chat for interview {}: {failure}; sending apology", outline.id
                );
                CHAT_UNAVAILABLE_REPLY.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interview::fallback::tests::outline;
    use crate::llm_client::testing::ScriptedGenerator;

    #[tokio::test]
    async fn test_reply_passes_through_and_embeds_context() {
        let llm = Arc::new(ScriptedGenerator::always(" Good point. How would you test it? "));
        let chat = InterviewChat::new(llm.clone(), Duration::from_secs(5));

        let reply = chat
            .reply(&outline("QA Engineer", "Selenium"), "I would mock the clock.")
            .await;

        assert_eq!(reply, "Good point. How would you test it?");
        let prompt = &llm.prompts()[0];
        assert!(prompt.contains("QA Engineer"));
        assert!(prompt.contains("\"I would mock the clock.\""));
    }

    #[tokio::test]
    async fn test_failure_returns_apology() {
        let chat = InterviewChat::new(Arc::new(ScriptedGenerator::failing()), Duration::from_secs(5));
        let reply = chat.reply(&outline("QA Engineer", "Selenium"), "hello").await;
        assert_eq!(reply, CHAT_UNAVAILABLE_REPLY);
    }
}
