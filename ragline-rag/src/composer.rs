//! Prompt assembly from retrieved chunks.

use ragline_core::PromptTemplate;

use crate::document::SearchResult;
use crate::error::{RagError, Result};

/// The prompt used when no template is supplied.
pub const DEFAULT_TEMPLATE: &str = "Answer the question based only on the following context:

{context}

---

Answer the question based on the above context: {question}";

/// Separator placed between retrieved texts.
pub const CONTEXT_SEPARATOR: &str = "\n\n";

/// Builds the final prompt from retrieved texts and the user's question.
///
/// The template must reference exactly the slots `context` and `question`.
/// Retrieved text is inserted literally, so chunk text containing `{...}` is
/// never treated as a placeholder.
///
/// # Example
///
/// ```rust
/// use ragline_rag::Composer;
///
/// let composer = Composer::new("{context}\nQ: {question}").unwrap();
/// let prompt = composer.compose(&["a", "b"], "why?").unwrap();
/// assert_eq!(prompt, "a\n\nb\nQ: why?");
/// ```
#[derive(Debug, Clone)]
pub struct Composer {
    template: PromptTemplate,
}

impl Default for Composer {
    fn default() -> Self {
        Self::new(DEFAULT_TEMPLATE).unwrap_or_else(|_| unreachable!("default template is valid"))
    }
}

impl Composer {
    /// Create a composer for `template`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if the template does not parse or its
    /// slots are not exactly `context` and `question`.
    pub fn new(template: &str) -> Result<Self> {
        let template = PromptTemplate::new(template)
            .map_err(|e| RagError::ConfigError(format!("invalid prompt template: {e}")))?;

        let mut slots = template.variables();
        slots.sort_unstable();
        if slots != ["context", "question"] {
            return Err(RagError::ConfigError(format!(
                "prompt template must use exactly {{context}} and {{question}}, found {slots:?}"
            )));
        }
        Ok(Self { template })
    }

    /// The template text.
    pub fn template(&self) -> &str {
        self.template.source()
    }

    /// Join `texts` in rank order and render the prompt.
    pub fn compose(&self, texts: &[&str], question: &str) -> Result<String> {
        let context = texts.join(CONTEXT_SEPARATOR);
        Ok(self.template.format(&[("context", context.as_str()), ("question", question)])?)
    }

    /// Render the prompt from search results, using each chunk's text.
    pub fn compose_results(&self, results: &[SearchResult], question: &str) -> Result<String> {
        let texts: Vec<&str> = results.iter().map(|r| r.chunk.text.as_str()).collect();
        self.compose(&texts, question)
    }
}
