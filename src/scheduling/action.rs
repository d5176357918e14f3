//! Actions a user (or the automation) can take in a context

use crate::error::SchedulerError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One step of work in the current context
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "action", content = "argument", rename_all = "snake_case")]
pub enum Action {
    /// Ask a subquestion (hypertext)
    AskSubquestion(String),
    /// Answer the current question (hypertext)
    Reply(String),
    /// Reveal the content behind a pointer name
    Unlock(String),
    /// Replace the scratchpad (hypertext)
    Scratch(String),
}

impl Action {
    /// The command word used in the text form
    pub fn verb(&self) -> &'static str {
        match self {
            Action::AskSubquestion(_) => "ask",
            Action::Reply(_) => "reply",
            Action::Unlock(_) => "unlock",
            Action::Scratch(_) => "scratch",
        }
    }

    pub fn argument(&self) -> &str {
        match self {
            Action::AskSubquestion(text)
            | Action::Reply(text)
            | Action::Unlock(text)
            | Action::Scratch(text) => text,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.verb(), self.argument())
    }
}

impl FromStr for Action {
    type Err = SchedulerError;

    /// Parse `ask <hypertext>`, `reply <hypertext>`, `unlock <name>` or
    /// `scratch <hypertext>`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (verb, argument) = match s.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, rest.trim()),
            None => (s, ""),
        };
        let argument = argument.to_string();

        match verb {
            "ask" => Ok(Action::AskSubquestion(argument)),
            "reply" => Ok(Action::Reply(argument)),
            "scratch" => Ok(Action::Scratch(argument)),
            "unlock" if argument.is_empty() => Err(SchedulerError::InvalidAction(
                "unlock needs a pointer name".to_string(),
            )),
            "unlock" => Ok(Action::Unlock(argument)),
            "" => Err(SchedulerError::InvalidAction("empty action".to_string())),
            other => Err(SchedulerError::InvalidAction(format!(
                "unknown action '{}' (expected ask, reply, unlock or scratch)",
                other
            ))),
        }
    }
}
