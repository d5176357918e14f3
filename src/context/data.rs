//! Structured and textual rendering of a context

use crate::hypertext::Link;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One subquestion row of a rendered context
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubquestionData {
    pub question: Link,
    pub answer: Link,
    pub workspace: Link,
}

/// A rendered context, one [`Link`] per slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub predecessor: Option<Link>,
    pub question: Link,
    pub scratchpad: Link,
    pub subquestions: Vec<SubquestionData>,
}

impl fmt::Display for ContextData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(predecessor) = &self.predecessor {
            writeln!(f, "Predecessor: {}", predecessor)?;
        }
        writeln!(f, "Question: {}", self.question)?;
        writeln!(f, "Scratchpad: {}", self.scratchpad)?;
        writeln!(f, "Subquestions:")?;
        for (i, sub) in self.subquestions.iter().enumerate() {
            writeln!(f, "{}.", i + 1)?;
            for link in [&sub.question, &sub.answer, &sub.workspace] {
                for line in link.to_string().lines() {
                    writeln!(f, "  {}", line)?;
                }
            }
        }
        Ok(())
    }
}
