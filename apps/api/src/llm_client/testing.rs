//! Scripted `TextGenerator` double for unit tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use super::{LlmError, TextGenerator};

enum Behaviour {
    /// Replays queued replies; `None` entries fail. Fails once drained.
    Script(Mutex<VecDeque<Option<String>>>),
    Always(String),
    Fail,
    Hang,
}

pub struct ScriptedGenerator {
    behaviour: Behaviour,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    fn with(behaviour: Behaviour) -> Self {
        Self {
            behaviour,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn always(text: &str) -> Self {
        Self::with(Behaviour::Always(text.to_string()))
    }

    pub fn failing() -> Self {
        Self::with(Behaviour::Fail)
    }

    pub fn hanging() -> Self {
        Self::with(Behaviour::Hang)
    }

    pub fn script(replies: Vec<Option<&str>>) -> Self {
        let queue = replies
            .into_iter()
            .map(|r| r.map(str::to_string))
            .collect();
        Self::with(Behaviour::Script(Mutex::new(queue)))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

fn unavailable() -> LlmError {
    LlmError::Api {
        status: 503,
        message: "service unavailable".to_string(),
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());

        match &self.behaviour {
            Behaviour::Always(text) => Ok(text.clone()),
            Behaviour::Fail => Err(unavailable()),
            Behaviour::Hang => {
                std::future::pending::<()>().await;
                Err(unavailable())
            }
            Behaviour::Script(queue) => {
                let next = queue.lock().unwrap().pop_front();
                match next {
                    Some(Some(text)) => Ok(text),
                    _ => Err(unavailable()),
                }
            }
        }
    }
}
