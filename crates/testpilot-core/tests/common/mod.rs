//! Shared test doubles for flow and panel tests

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use testpilot_core::{LanguageModel, ModelError, Provider};

/// A model that replays scripted answers in order and records every prompt
pub struct ScriptedModel {
    answers: Mutex<VecDeque<Result<String, ModelError>>>,
    prompts: Mutex<Vec<String>>,
    calls: AtomicUsize,
    gate: Option<Arc<Notify>>,
}

impl ScriptedModel {
    pub fn new() -> Self {
        Self {
            answers: Mutex::new(VecDeque::new()),
            prompts: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
            gate: None,
        }
    }

    pub fn answering(answers: &[&str]) -> Self {
        let model = Self::new();
        for answer in answers {
            model.push(Ok(answer.to_string()));
        }
        model
    }

    pub fn failing(err: ModelError) -> Self {
        let model = Self::new();
        model.push(Err(err));
        model
    }

    /// Hold every call until the gate is notified
    pub fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn push(&self, answer: Result<String, ModelError>) {
        self.answers.lock().unwrap().push_back(answer);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn query_json(&self, prompt: &str) -> Result<String, ModelError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());

        if let Some(gate) = &self.gate {
            gate.notified().await;
        }

        self.answers
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ModelError::internal("no scripted answer left")))
    }

    fn provider(&self) -> Provider {
        Provider::Ollama
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}
