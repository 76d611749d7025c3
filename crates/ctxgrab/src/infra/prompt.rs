//! Interactive prompts supplied to the engine by the caller.

use std::cell::RefCell;
use std::collections::VecDeque;

use crate::domain::errors::{EngineError, EngineResult};

/// Port for every question the engine may need to ask a human.
pub trait Prompter {
    fn confirm(&self, question: &str) -> EngineResult<bool>;
    fn read_secret(&self, prompt: &str) -> EngineResult<String>;
    fn read_line(&self, prompt: &str) -> EngineResult<String>;
}

/// Terminal prompts backed by dialoguer.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPrompter {
    assume_yes: bool,
}

impl TerminalPrompter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer every confirmation with yes without asking.
    pub fn assume_yes(mut self, assume_yes: bool) -> Self {
        self.assume_yes = assume_yes;
        self
    }
}

impl Prompter for TerminalPrompter {
    fn confirm(&self, question: &str) -> EngineResult<bool> {
        if self.assume_yes {
            return Ok(true);
        }
        dialoguer::Confirm::new()
            .with_prompt(question)
            .default(false)
            .interact()
            .map_err(|err| EngineError::Prompt(format!("failed to read confirmation: {err}")))
    }

    fn read_secret(&self, prompt: &str) -> EngineResult<String> {
        dialoguer::Password::new()
            .with_prompt(prompt)
            .interact()
            .map(|secret| secret.trim().to_owned())
            .map_err(|err| EngineError::Prompt(format!("failed to read secret: {err}")))
    }

    fn read_line(&self, prompt: &str) -> EngineResult<String> {
        dialoguer::Input::<String>::new()
            .with_prompt(prompt)
            .interact_text()
            .map(|line| line.trim().to_owned())
            .map_err(|err| EngineError::Prompt(format!("failed to read input: {err}")))
    }
}

/// Replays canned answers in order and records what was asked.
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    answers: RefCell<VecDeque<String>>,
    asked: RefCell<Vec<String>>,
}

impl ScriptedPrompter {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: RefCell::new(answers.into_iter().map(Into::into).collect()),
            asked: RefCell::new(Vec::new()),
        }
    }

    pub fn asked(&self) -> Vec<String> {
        self.asked.borrow().clone()
    }

    fn next(&self, prompt: &str) -> EngineResult<String> {
        self.asked.borrow_mut().push(prompt.to_owned());
        self.answers
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| EngineError::Prompt(format!("no scripted answer for '{prompt}'")))
    }
}

impl Prompter for ScriptedPrompter {
    fn confirm(&self, question: &str) -> EngineResult<bool> {
        let answer = self.next(question)?.trim().to_ascii_lowercase();
        Ok(answer == "y" || answer == "yes")
    }

    fn read_secret(&self, prompt: &str) -> EngineResult<String> {
        self.next(prompt)
    }

    fn read_line(&self, prompt: &str) -> EngineResult<String> {
        self.next(prompt)
    }
}
