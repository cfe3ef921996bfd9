//! Scripted doubles for the generation service and the operator.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;
use turn_duel::{
    Announcement, LlmClient, MemoryTranscript, Operator, OperatorPrompt, SessionConfig,
    TurnEngine,
};

/// Replays canned replies and remembers every prompt it was sent.
pub struct ScriptedClient {
    replies: Mutex<VecDeque<String>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedClient {
    pub fn new<S: Into<String>>(replies: impl IntoIterator<Item = S>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into_iter().map(Into::into).collect()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmClient for ScriptedClient {
    async fn query(&self, prompt: &str) -> anyhow::Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| anyhow::anyhow!("script exhausted"))
    }
}

/// Answers operator prompts from a fixed list; runs out into "end".
#[derive(Default)]
pub struct ScriptedOperator {
    answers: VecDeque<String>,
    pub asked: Vec<String>,
    pub decisions: Vec<String>,
    pub stopped: bool,
    pub failure: Option<String>,
}

impl ScriptedOperator {
    pub fn new<S: Into<String>>(answers: impl IntoIterator<Item = S>) -> Self {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }
}

#[async_trait]
impl Operator for ScriptedOperator {
    async fn ask(&mut self, prompt: OperatorPrompt<'_>) -> anyhow::Result<String> {
        let label = match prompt {
            OperatorPrompt::PhaseEntry { party } => format!("phase:{party}"),
            OperatorPrompt::PublicState { party } => format!("public:{party}"),
            OperatorPrompt::ResolveRequest { party, .. } => format!("request:{party}"),
            OperatorPrompt::Note { party } => format!("note:{party}"),
            OperatorPrompt::ConfirmEndTurn { party } => format!("confirm:{party}"),
        };
        self.asked.push(label);
        Ok(self.answers.pop_front().unwrap_or_else(|| "end".to_string()))
    }

    fn announce(&mut self, announcement: Announcement<'_>) {
        match announcement {
            Announcement::Decisions { decisions, .. } => self.decisions.push(decisions.to_string()),
            Announcement::Stopped => self.stopped = true,
            Announcement::Failed { error } => self.failure = Some(error.to_string()),
            Announcement::TurnStarted { .. } => {}
        }
    }
}

/// Two-party configuration with `overrides` merged over the defaults.
pub fn config(overrides: Value) -> SessionConfig {
    let mut base = serde_json::json!({
        "game": "a test card game",
        "parties": [
            {"name": "A", "order": "first", "deck": "deck A", "setup": "setup A"},
            {"name": "B", "order": "second", "deck": "deck B", "setup": "setup B"}
        ]
    });
    if let (Value::Object(base), Value::Object(overrides)) = (&mut base, overrides) {
        base.extend(overrides);
    }
    SessionConfig::from_json(&base.to_string()).unwrap()
}

/// A reply carrying every default required key.
pub fn reply(memory: &str, decisions: &str, public_info: &str, end_turn: bool) -> String {
    serde_json::json!({
        "memory": memory,
        "decisions": decisions,
        "public_info": public_info,
        "end_turn": end_turn,
    })
    .to_string()
}

pub struct Harness {
    pub engine: TurnEngine<ScriptedOperator>,
    pub client: Arc<ScriptedClient>,
    pub transcript: Arc<MemoryTranscript>,
}

pub fn harness<S: Into<String>>(
    config: &SessionConfig,
    replies: Vec<String>,
    answers: impl IntoIterator<Item = S>,
) -> Harness {
    let client = ScriptedClient::new(replies);
    let transcript = Arc::new(MemoryTranscript::new());
    let engine = TurnEngine::new(
        config,
        client.clone(),
        ScriptedOperator::new(answers),
        transcript.clone(),
    )
    .unwrap();
    Harness {
        engine,
        client,
        transcript,
    }
}
