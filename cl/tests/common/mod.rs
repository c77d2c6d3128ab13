//! Shared fixtures for integration tests

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use clarifier::{
    Clarifier, Classification, Classifier, CollaboratorError, Collaborators, FinalQueryGenerator, Label, Locale,
    QuestionGenerator, SessionStateMachine, StrategyPlanner,
};

/// Collaborator that replays a fixed list of labels
///
/// Questions are generated as `Question {n}`; the final query is scripted or,
/// when `fail_final` is set, always fails. Once the labels run out every
/// further classification is `fallback_label`.
pub struct Script {
    labels: Mutex<VecDeque<Label>>,
    fallback_label: Label,
    final_query: String,
    fail_final: bool,
    asked: Mutex<u32>,
    pub classified: Mutex<Vec<String>>,
}

impl Script {
    pub fn new(labels: &[Label]) -> Self {
        Self {
            labels: Mutex::new(labels.iter().copied().collect()),
            fallback_label: Label::Simple,
            final_query: "Final question".to_string(),
            fail_final: false,
            asked: Mutex::new(0),
            classified: Mutex::new(Vec::new()),
        }
    }

    pub fn then_always(mut self, label: Label) -> Self {
        self.fallback_label = label;
        self
    }

    pub fn final_query(mut self, text: &str) -> Self {
        self.final_query = text.to_string();
        self
    }

    pub fn failing_final(mut self) -> Self {
        self.fail_final = true;
        self
    }
}

#[async_trait]
impl Classifier for Script {
    async fn classify(&self, query: &str) -> Result<Classification, CollaboratorError> {
        self.classified.lock().unwrap().push(query.to_string());
        let label = self.labels.lock().unwrap().pop_front().unwrap_or(self.fallback_label);
        Ok(Classification::new(label, format!("scripted {}", label)))
    }
}

#[async_trait]
impl QuestionGenerator for Script {
    async fn generate_question(&self, _query: &str, _hint: &str) -> Result<String, CollaboratorError> {
        let mut asked = self.asked.lock().unwrap();
        *asked += 1;
        Ok(format!("Question {}", *asked))
    }
}

#[async_trait]
impl FinalQueryGenerator for Script {
    async fn synthesize_final(&self, _summary: &str) -> Result<String, CollaboratorError> {
        if self.fail_final {
            Err(CollaboratorError::Parse("scripted failure".to_string()))
        } else {
            Ok(self.final_query.clone())
        }
    }
}

/// Clarifier over `script` with English defaults
pub fn clarifier(script: Script, max_rounds: u32) -> Arc<Clarifier> {
    let machine = SessionStateMachine::new(
        Collaborators::shared(Arc::new(script)),
        StrategyPlanner::new(Locale::English.default_context_keywords()),
        Locale::English,
    );
    Arc::new(Clarifier::new(machine, max_rounds))
}
