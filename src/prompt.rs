// prompt.rs - Interactive questions
// Purpose: Read operator answers from the terminal, or from a script in tests

use colored::*;
use std::collections::VecDeque;
use std::io::{self, BufRead, Write};

pub trait Prompter: Send {
    /// Ask a question and return the trimmed answer. EOF yields an empty answer.
    fn ask(&mut self, question: &str) -> io::Result<String>;
}

/// Prompts on stdout, reads from stdin
#[derive(Debug, Default)]
pub struct StdinPrompter;

impl Prompter for StdinPrompter {
    fn ask(&mut self, question: &str) -> io::Result<String> {
        print!("{} ", question.yellow());
        io::stdout().flush()?;

        let mut line = String::new();
        io::stdin().lock().read_line(&mut line)?;
        Ok(line.trim().to_string())
    }
}

/// Replays canned answers and remembers what was asked
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    answers: VecDeque<String>,
    pub asked: Vec<String>,
}

impl ScriptedPrompter {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            asked: Vec::new(),
        }
    }
}

impl Prompter for ScriptedPrompter {
    fn ask(&mut self, question: &str) -> io::Result<String> {
        self.asked.push(question.to_string());
        Ok(self.answers.pop_front().unwrap_or_default().trim().to_string())
    }
}

/// `y` / `yes` in any case means yes; everything else means no
pub fn parse_yes_no(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_yes_no() {
        assert!(parse_yes_no("yes"));
        assert!(parse_yes_no("YES "));
        assert!(parse_yes_no("y"));
        assert!(!parse_yes_no("no"));
        assert!(!parse_yes_no(""));
        assert!(!parse_yes_no("yep"));
    }

    #[test]
    fn test_scripted_prompter_runs_dry() {
        let mut prompter = ScriptedPrompter::new(["example.com", " yes "]);
        assert_eq!(prompter.ask("domains?").unwrap(), "example.com");
        assert_eq!(prompter.ask("tor?").unwrap(), "yes");
        assert_eq!(prompter.ask("proxies?").unwrap(), "");
        assert_eq!(prompter.asked.len(), 3);
    }
}
