//! Assistant prompt assembly
//!
//! The assistant always sees the code currently in the editor, the result of
//! the last run (if the code has been run since it was last edited) and the
//! user's question, in a fixed template.

/// Placeholder used when the run produced neither output nor error
pub const NO_OUTPUT: &str = "No output generated.";

/// Separator line under each template heading
const RULE: &str = "_____";

/// Inputs to the prompt template
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromptContext {
    /// Editor contents
    pub code: String,
    /// Output of the last run
    pub output: Option<String>,
    /// Error of the last run
    pub error: Option<String>,
    /// Whether the current code has been run; stale results are dropped
    pub has_run: bool,
    /// What the user asked
    pub question: String,
}

impl PromptContext {
    /// Context for code that has not been run yet
    #[must_use]
    pub fn new(code: impl Into<String>, question: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            question: question.into(),
            ..Self::default()
        }
    }

    /// With the result of a run
    #[must_use]
    pub fn with_run(mut self, output: Option<String>, error: Option<String>) -> Self {
        self.output = output;
        self.error = error;
        self.has_run = true;
        self
    }

    fn shown_error(&self) -> Option<&str> {
        if !self.has_run {
            return None;
        }
        self.error.as_deref().filter(|e| !e.is_empty())
    }

    fn shown_output(&self) -> Option<&str> {
        if !self.has_run {
            return None;
        }
        self.output.as_deref().filter(|o| !o.is_empty())
    }

    /// Render the prompt sent as the user message
    #[must_use]
    pub fn render(&self) -> String {
        let error = self.shown_error();
        let label = if error.is_some() { "error" } else { "output" };
        let result = error.or_else(|| self.shown_output()).unwrap_or(NO_OUTPUT);

        format!(
            "Here is the code:\n{RULE}\n{code}\n\nHere is the {label}:\n{RULE}\n{result}\n\nUser Question:\n{RULE}\n{question}",
            code = self.code,
            question = self.question,
        )
        .trim()
        .to_string()
    }
}
