//! LLM-backed implementation of the three collaborators

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use super::parse::{extract_json_object, string_field};
use super::{Classifier, CollaboratorError, FinalQueryGenerator, QuestionGenerator};
use crate::clarify::{Classification, Label};
use crate::llm::{CompletionRequest, LlmClient};
use crate::prompts::{
    CLASSIFY_TEMPLATE, ClassifyContext, FINAL_TEMPLATE, FinalContext, PromptLoader, QUESTION_TEMPLATE,
    QuestionContext,
};

const SYSTEM_PROMPT: &str = "You are a careful assistant. Follow the instructions exactly \
                             and reply with a single JSON object.";

/// Response budget for one collaborator reply; all three are short JSON objects
const DEFAULT_MAX_TOKENS: u32 = 512;

/// Classifier, question generator and final-query generator over one model
pub struct LlmCollaborator {
    llm: Arc<dyn LlmClient>,
    prompts: PromptLoader,
    max_tokens: u32,
}

impl LlmCollaborator {
    pub fn new(llm: Arc<dyn LlmClient>, prompts: PromptLoader) -> Self {
        debug!(model = %llm.model(), "LlmCollaborator::new: called");
        Self {
            llm,
            prompts,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Render `prompt`, send it and parse the reply as a JSON object
    async fn ask_json(&self, prompt: String) -> Result<serde_json::Value, CollaboratorError> {
        let request = CompletionRequest::single(SYSTEM_PROMPT, prompt, self.max_tokens).with_json_output();
        let response = self.llm.complete(request).await?;
        let content = response.content.ok_or(CollaboratorError::Empty("reply"))?;
        debug!(reply_len = content.len(), finish_reason = ?response.finish_reason, "ask_json: received reply");
        extract_json_object(&content)
    }

    fn render<C: serde::Serialize>(&self, template: &str, context: &C) -> Result<String, CollaboratorError> {
        self.prompts
            .render(template, context)
            .map_err(|e| CollaboratorError::Prompt(e.to_string()))
    }
}

#[async_trait]
impl Classifier for LlmCollaborator {
    async fn classify(&self, query: &str) -> Result<Classification, CollaboratorError> {
        debug!(query_len = query.len(), "classify: called");
        let prompt = self.render(CLASSIFY_TEMPLATE, &ClassifyContext { query })?;
        let value = self.ask_json(prompt).await?;

        let raw_label = string_field(&value, "classification")?;
        let label: Label = raw_label.parse().map_err(CollaboratorError::UnknownLabel)?;
        // A missing reason is tolerated; it only flavors the follow-up hint
        let reason = string_field(&value, "reason").unwrap_or_default();

        info!(%label, %reason, "classify: classified query");
        Ok(Classification { label, reason })
    }
}

#[async_trait]
impl QuestionGenerator for LlmCollaborator {
    async fn generate_question(&self, query: &str, hint: &str) -> Result<String, CollaboratorError> {
        debug!(query_len = query.len(), %hint, "generate_question: called");
        let prompt = self.render(QUESTION_TEMPLATE, &QuestionContext { query, hint })?;
        let value = self.ask_json(prompt).await?;
        string_field(&value, "question")
    }
}

#[async_trait]
impl FinalQueryGenerator for LlmCollaborator {
    async fn synthesize_final(&self, summary: &str) -> Result<String, CollaboratorError> {
        debug!(summary_len = summary.len(), "synthesize_final: called");
        let prompt = self.render(FINAL_TEMPLATE, &FinalContext { summary })?;
        let value = self.ask_json(prompt).await?;
        string_field(&value, "final_question")
    }
}
