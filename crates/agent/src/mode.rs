//! Operation modes — what the writer is asking the model to do.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The kind of request a draft session runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationMode {
    #[default]
    Draft,
    Continue,
    Brainstorm,
    Outline,
    Critique,
    Summarize,
    Subtasks,
}

impl OperationMode {
    pub const ALL: [OperationMode; 7] = [
        Self::Draft,
        Self::Continue,
        Self::Brainstorm,
        Self::Outline,
        Self::Critique,
        Self::Summarize,
        Self::Subtasks,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Continue => "continue",
            Self::Brainstorm => "brainstorm",
            Self::Outline => "outline",
            Self::Critique => "critique",
            Self::Summarize => "summarize",
            Self::Subtasks => "subtasks",
        }
    }

    /// The system instruction sent with every request in this mode.
    pub fn system_instruction(&self) -> &'static str {
        match self {
            Self::Draft => {
                "You are a fiction co-writer. Write new prose that follows the writer's \
                 instruction, stays consistent with the supplied project context, and \
                 matches its tone. Reply with the prose only."
            }
            Self::Continue => {
                "You are a fiction co-writer. Continue the story seamlessly from where the \
                 writer's text ends, keeping voice, tense and point of view. Reply with the \
                 continuation only."
            }
            Self::Brainstorm => {
                "You are a creative partner. Offer several distinct, concrete ideas that fit \
                 the project context. Prefer surprising but plausible options."
            }
            Self::Outline => {
                "You are a story architect. Turn the writer's request into a scene-by-scene \
                 outline that respects the established characters and places."
            }
            Self::Critique => {
                "You are a candid editor. Point out what works and what does not in the \
                 supplied text, with specific, actionable suggestions."
            }
            Self::Summarize => {
                "You summarize writing. Produce a faithful, concise summary of the supplied \
                 text without adding new events."
            }
            Self::Subtasks => {
                "You are a planning assistant. Break the writer's task into small, concrete \
                 steps that can each be finished in one sitting."
            }
        }
    }

    /// Modes that pull project notes and lore into the prompt.
    pub fn is_context_grounded(&self) -> bool {
        matches!(
            self,
            Self::Draft | Self::Continue | Self::Brainstorm | Self::Outline
        )
    }

    /// Modes that accept an empty instruction.
    pub fn allows_empty_input(&self) -> bool {
        matches!(self, Self::Continue)
    }

    /// Wrap the raw instruction in the mode's request framing.
    pub fn format_instruction(&self, instruction: &str) -> String {
        let instruction = instruction.trim();
        match self {
            Self::Continue if instruction.is_empty() => {
                "Continue the story from where it left off.".to_string()
            }
            Self::Subtasks => format!(
                "Break the following task into subtasks.\n\
                 Task: {instruction}\n\n\
                 Start with one sentence of overview, then reply with a ```json block \
                 containing an array of objects with \"title\" and \"estimate_minutes\" fields."
            ),
            Self::Outline => format!(
                "Create an outline for: {instruction}\n\n\
                 Start with a short paragraph on the overall arc, then reply with a ```json \
                 block containing an array of objects with \"scene\", \"summary\" and \
                 \"characters\" fields."
            ),
            _ => instruction.to_string(),
        }
    }
}

impl fmt::Display for OperationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| format!("unknown operation mode: {s}"))
    }
}
