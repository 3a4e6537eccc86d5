//! Prompt framing: persona instructions, the per-document preamble, and the
//! combined payload sent to the model for each question.
//!
//! Layout of a payload:
//!
//! ```text
//! <persona rules naming the file>
//!
//! DOCUMENT CONTENT:
//! <document text>
//!
//! Remember: answer only from the document above.
//!
//! PREVIOUS CONVERSATION:        (only when there is history)
//! User: ...
//! Assistant: ...
//!
//! CURRENT QUESTION: <question>
//!
//! Please answer based only on the document content above.
//! ```

use crate::doc_processor::Document;
use crate::history::{recent, Exchange};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Write};
use std::str::FromStr;

pub const DEFAULT_MAX_HISTORY_TURNS: usize = 5;

const DOCUMENT_MARKER: &str = "DOCUMENT CONTENT:";
const REMINDER: &str = "Remember: answer only from the document above.";
const HISTORY_MARKER: &str = "PREVIOUS CONVERSATION:";
const QUESTION_MARKER: &str = "CURRENT QUESTION:";
const CLOSING: &str = "Please answer based only on the document content above.";

/// Wording variant of the assistant. Only instructions and labels differ.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Persona {
    #[default]
    General,
    Medical,
}

impl Persona {
    pub fn user_label(self) -> &'static str {
        match self {
            Persona::General => "User",
            Persona::Medical => "Patient",
        }
    }

    pub fn assistant_label(self) -> &'static str {
        match self {
            Persona::General => "Assistant",
            Persona::Medical => "Medical Assistant",
        }
    }

    fn instructions(self, filename: &str) -> String {
        match self {
            Persona::General => format!(
                "You are a helpful assistant that answers questions based ONLY on the following PDF document: \"{filename}\".

IMPORTANT RULES:
1. Answer questions using ONLY information found in the document below
2. If the answer is not in the document, clearly state \"I cannot find that information in the document\"
3. Do not make up or infer information that is not explicitly stated
4. Maintain context from previous questions in the conversation
5. Be specific and cite relevant parts when answering
6. If asked about something outside the document scope, politely redirect to document-based questions"
            ),
            Persona::Medical => format!(
                "You are a friendly medical document assistant that helps patients understand ONLY the following medical document: \"{filename}\".

IMPORTANT RULES:
1. Answer questions using ONLY information found in the document below
2. If the answer is not in the document, clearly state \"I cannot find that information in your document\"
3. Explain medical terms, test results and prescriptions in simple, everyday language
4. When the document gives reference ranges, say whether a value is normal, high or low
5. Never diagnose, prescribe, or recommend changes to treatment
6. Maintain context from previous questions in the conversation
7. Remind the patient to consult their doctor for medical decisions"
            ),
        }
    }
}

impl fmt::Display for Persona {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Persona::General => "general",
            Persona::Medical => "medical",
        })
    }
}

impl FromStr for Persona {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "general" | "pdf" => Ok(Persona::General),
            "medical" => Ok(Persona::Medical),
            other => Err(format!("Unknown persona: {}", other)),
        }
    }
}

/// Instruction text plus the full document, built once per loaded document.
pub fn system_preamble(persona: Persona, document: &Document) -> String {
    format!(
        "{}\n\n{}\n{}\n\n{}",
        persona.instructions(document.filename()),
        DOCUMENT_MARKER,
        document.full_text(),
        REMINDER
    )
}

/// Render the last `max_turns` exchanges as labelled lines. Empty when there is no history.
pub fn render_history(persona: Persona, history: &[Exchange], max_turns: usize) -> String {
    let window = recent(history, max_turns);
    if window.is_empty() {
        return String::new();
    }

    let mut out = String::new();
    out.push_str(HISTORY_MARKER);
    out.push('\n');
    for exchange in window {
        // Writing into a String cannot fail.
        let _ = writeln!(out, "{}: {}", persona.user_label(), exchange.user);
        let _ = writeln!(out, "{}: {}", persona.assistant_label(), exchange.assistant);
    }
    out.push('\n');
    out
}

/// Combine preamble, history window and question into one request body.
pub fn build_payload(
    preamble: &str,
    persona: Persona,
    history: &[Exchange],
    max_turns: usize,
    question: &str,
) -> String {
    format!(
        "{preamble}\n\n{}{QUESTION_MARKER} {question}\n\n{CLOSING}",
        render_history(persona, history, max_turns)
    )
}
