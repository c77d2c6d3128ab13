//! Prompt Template System
//!
//! Loads and renders `.pmt` (prompt template) files for the three
//! collaborator calls.
//!
//! Template loading chain:
//! 1. `{clarifier.prompts-dir}/{name}.pmt` (user override)
//! 2. Embedded fallback in code
//!
//! Templates use Handlebars syntax for variable substitution.

pub mod embedded;
mod loader;

pub use loader::{
    CLASSIFY_TEMPLATE, ClassifyContext, FINAL_TEMPLATE, FinalContext, PromptLoader, QUESTION_TEMPLATE,
    QuestionContext,
};
