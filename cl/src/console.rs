//! Interactive console mode
//!
//! Runs clarification sessions on the terminal through the same
//! [`Clarifier`] the HTTP server uses. An empty answer finishes the current
//! session early; `quit` or `exit` leaves.

use std::sync::Arc;

use colored::Colorize;
use eyre::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::clarify::{Clarifier, ClarifyResult, RoundOutcome, render_transcript};

/// What handling one line of input produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// A follow-up question is waiting for an answer
    Asked { question: String, round: u32, max_rounds: u32 },
    /// The session closed; `transcript` is ready to print
    Completed {
        final_query: String,
        transcript: String,
        degraded: bool,
    },
    /// The session failed and was discarded
    Failed(String),
    /// Nothing to do (empty line with no session open)
    Idle,
    /// The user asked to leave
    Quit,
}

/// Line-driven front end over a [`Clarifier`]
pub struct Console {
    clarifier: Arc<Clarifier>,
    current: Option<String>,
}

impl Console {
    pub fn new(clarifier: Arc<Clarifier>) -> Self {
        Self {
            clarifier,
            current: None,
        }
    }

    /// Whether a session is waiting for an answer
    pub fn in_session(&self) -> bool {
        self.current.is_some()
    }

    /// Feed one line: a new question, an answer, an empty line or a quit word
    pub async fn handle_line(&mut self, line: &str) -> Step {
        let line = line.trim();
        debug!(in_session = self.in_session(), "handle_line: called");

        if line.eq_ignore_ascii_case("quit") || line.eq_ignore_ascii_case("exit") {
            if let Some(id) = self.current.take() {
                self.clarifier.remove(&id).await;
            }
            return Step::Quit;
        }

        match self.current.clone() {
            None if line.is_empty() => Step::Idle,
            None => {
                let id = Uuid::now_v7().to_string();
                self.current = Some(id.clone());
                let result = self.clarifier.start(&id, line).await;
                self.settle(&id, result).await
            }
            Some(id) if line.is_empty() => {
                let result = self.clarifier.finish(&id).await;
                self.settle(&id, result).await
            }
            Some(id) => {
                let result = self.clarifier.continue_session(&id, line).await;
                self.settle(&id, result).await
            }
        }
    }

    async fn settle(&mut self, id: &str, result: ClarifyResult<RoundOutcome>) -> Step {
        match result {
            Ok(RoundOutcome::WaitingAnswer { question, round }) => Step::Asked {
                question,
                round,
                max_rounds: self.clarifier.max_rounds(),
            },
            Ok(RoundOutcome::Completed {
                final_query, degraded, ..
            }) => {
                let transcript = match self.clarifier.snapshot(id).await {
                    Ok(session) => render_transcript(
                        session.original_query(),
                        session.history(),
                        &final_query,
                        self.clarifier.locale(),
                    ),
                    Err(_) => final_query.clone(),
                };
                self.close(id).await;
                Step::Completed {
                    final_query,
                    transcript,
                    degraded,
                }
            }
            Err(e) => {
                warn!(session_id = %id, error = %e, "settle: session failed");
                self.close(id).await;
                Step::Failed(e.to_string())
            }
        }
    }

    async fn close(&mut self, id: &str) {
        self.clarifier.remove(id).await;
        self.current = None;
    }
}

/// Run the interactive loop
///
/// With `initial_query` a single session is run and the loop returns when it
/// closes; without one, questions are read until `quit`, `exit` or EOF.
pub async fn run(clarifier: Arc<Clarifier>, initial_query: Option<String>) -> Result<()> {
    let one_shot = initial_query.is_some();
    let mut console = Console::new(clarifier);
    let mut rl = DefaultEditor::new().map_err(|e| eyre::eyre!("Failed to initialize readline: {}", e))?;

    print_welcome(one_shot);

    if let Some(query) = initial_query {
        println!("{} {}", ">".bright_green(), query);
        let step = console.handle_line(&query).await;
        if print_step(&step) {
            return Ok(());
        }
    }

    loop {
        let prompt = if console.in_session() {
            format!("{} ", "answer>".bright_yellow())
        } else {
            format!("{} ", "question>".bright_green())
        };

        match rl.readline(&prompt) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    let _ = rl.add_history_entry(line.as_str());
                }
                let step = console.handle_line(&line).await;
                if step == Step::Quit {
                    break;
                }
                if print_step(&step) && one_shot {
                    break;
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!();
                break;
            }
            Err(err) => {
                return Err(eyre::eyre!("Readline error: {}", err));
            }
        }
    }

    println!("Goodbye!");
    Ok(())
}

fn print_welcome(one_shot: bool) {
    println!();
    println!("{}", "Query Clarifier".bright_cyan().bold());
    if !one_shot {
        println!("Ask a question to begin.");
    }
    println!(
        "Press {} on an answer to finish early, type {} to quit",
        "Enter".yellow(),
        "quit".yellow()
    );
    println!();
}

/// Print a step; returns true when a session just closed
fn print_step(step: &Step) -> bool {
    match step {
        Step::Asked {
            question,
            round,
            max_rounds,
        } => {
            println!();
            println!("{} {}", format!("Round {}/{}", round, max_rounds).dimmed(), question.bright_white());
            false
        }
        Step::Completed {
            final_query,
            transcript,
            degraded,
        } => {
            println!();
            println!("{}", "Clarification complete".bright_cyan().bold());
            println!("{}", transcript);
            if *degraded {
                println!("{}", "(final question assembled locally; the model did not respond)".dimmed());
            }
            println!("{} {}", "Final question:".bright_green().bold(), final_query);
            println!();
            true
        }
        Step::Failed(message) => {
            println!("{} {}", "Error:".red().bold(), message);
            true
        }
        Step::Idle | Step::Quit => false,
    }
}
