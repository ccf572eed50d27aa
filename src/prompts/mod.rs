//! Prompt library and composition text
//!
//! Reusable prompt prefixes are compiled into the binary as static
//! resources. The orchestrator depends only on "get active prefix
//! content"; how prefixes are authored and stored is this module's
//! concern.

pub mod system_instruction;

pub use system_instruction::SYSTEM_INSTRUCTION;

/// Greeting seeded into a fresh transcript
pub const GREETING: &str =
    "Hello! Attach a document or ask a question and I will analyze it for you.";

/// Instruction appended to the outgoing text when files are attached
pub const DOCUMENT_IDENTIFICATION_SUFFIX: &str =
    "\n\nAlso identify the company name and the report type of the source document.";

const SUMMARY_PREFIX: &str = "\
Provide an executive summary of the attached document. Cover the purpose of \
the document, its key findings or figures, and any stated conclusions or \
recommendations. Keep the summary under ten bullet points.";

const FINANCIALS_PREFIX: &str = "\
Extract the key financial figures from the attached document: revenue, \
operating and net profit or loss, cash position, and year-over-year changes \
where stated. Present them as a compact list, quoting the exact amounts and \
periods as they appear in the source.";

const RISKS_PREFIX: &str = "\
List the risk factors, caveats, and open issues disclosed in the attached \
document. For each, give the document's own wording in brief and note where \
in the document it appears.";

/// A named reusable prompt prefix
///
/// When active, the prefix is silently prepended to the next outgoing user
/// text; it is never shown in the transcript.
#[derive(Debug, Clone)]
pub struct PromptPrefix {
    /// Stable identifier used for lookup
    pub id: &'static str,
    /// Human-readable name
    pub name: &'static str,
    /// The instruction text prepended to outgoing messages
    pub content: &'static str,
    /// Whether this prefix is the library default
    pub is_default: bool,
}

/// Library of built-in prompt prefixes
#[derive(Debug, Clone)]
pub struct PromptLibrary {
    prefixes: Vec<PromptPrefix>,
}

impl PromptLibrary {
    /// Create the library of built-in prefixes
    pub fn builtin() -> Self {
        Self {
            prefixes: vec![
                PromptPrefix {
                    id: "summary",
                    name: "Executive summary",
                    content: SUMMARY_PREFIX,
                    is_default: true,
                },
                PromptPrefix {
                    id: "financials",
                    name: "Key financial figures",
                    content: FINANCIALS_PREFIX,
                    is_default: false,
                },
                PromptPrefix {
                    id: "risks",
                    name: "Risk factors",
                    content: RISKS_PREFIX,
                    is_default: false,
                },
            ],
        }
    }

    /// All prefixes in presentation order
    pub fn list(&self) -> &[PromptPrefix] {
        &self.prefixes
    }

    /// Look up a prefix by id
    pub fn get(&self, id: &str) -> Option<&PromptPrefix> {
        self.prefixes.iter().find(|p| p.id == id)
    }

    /// The library's default prefix, if one is marked
    pub fn default_prefix(&self) -> Option<&PromptPrefix> {
        self.prefixes.iter().find(|p| p.is_default)
    }
}

impl Default for PromptLibrary {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Synthesized request used when files are attached but no text was typed
pub fn file_analysis_request(file_count: usize) -> String {
    if file_count == 1 {
        "Analyze the attached document.".to_string()
    } else {
        format!("Analyze the {} attached documents.", file_count)
    }
}
