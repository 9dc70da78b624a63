use std::sync::Arc;

use ragline_core::{Content, Llm, PromptTemplate, generate_json, generate_text};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::config::AgentConfig;
use crate::error::Result;

const DECOMPOSE_PROMPT: &str = "You are a helpful assistant that generates multiple \
sub-questions related to an input question.
The goal is to break down the input into a set of sub-problems / sub-questions that can be \
answers in isolation.";

const PRIOR_ANSWERS_TEMPLATE: &str = "Prior questions and answers:

{prior}
";

const ANSWER_PROMPT: &str = "You are a helpful assistant that answers questions.";

const SYNTHESIS_TEMPLATE: &str = "You are a helpful assistant that answers questions.
You are given a set of sub-questions and their answers.
Your task is to combine the answers to the sub-questions and provide a comprehensive answer \
to the user question.
The sub-questions and their answers are:
{prior}
";

/// Context given to the first sub-question.
pub const NO_PRIOR_ANSWERS: &str = "No prior questions and answers";

/// Separator between formatted question/answer pairs.
pub const PAIR_SEPARATOR: &str = "\n\n----\n\n";

/// Structured output of the decomposition step.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Questions {
    /// A list of sub-questions related to the input query.
    pub questions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QaPair {
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decomposition {
    pub sub_answers: Vec<QaPair>,
    pub answer: String,
}

/// Render answered pairs as `Question: ..\nAnswer: ..` blocks joined by
/// [`PAIR_SEPARATOR`].
pub fn format_pairs(pairs: &[QaPair]) -> String {
    pairs
        .iter()
        .map(|p| format!("Question: {}\nAnswer: {}", p.question, p.answer))
        .collect::<Vec<_>>()
        .join(PAIR_SEPARATOR)
}

/// Answers a complex question by splitting it into sub-questions.
///
/// 1. The model returns `{"questions": [..]}` under a JSON schema; only the
///    first `max_sub_questions` are kept.
/// 2. Each sub-question is answered in order, with the earlier pairs as
///    context.
/// 3. A final call combines all pairs into the answer.
pub struct SubQuestionDecomposer {
    llm: Arc<dyn Llm>,
    config: AgentConfig,
    prior_template: PromptTemplate,
    synthesis_template: PromptTemplate,
}

impl SubQuestionDecomposer {
    pub fn new(llm: Arc<dyn Llm>) -> Result<Self> {
        Ok(Self {
            llm,
            config: AgentConfig::default(),
            prior_template: PromptTemplate::new(PRIOR_ANSWERS_TEMPLATE)?,
            synthesis_template: PromptTemplate::new(SYNTHESIS_TEMPLATE)?,
        })
    }

    pub fn with_config(mut self, config: AgentConfig) -> Result<Self> {
        config.validate()?;
        self.config = config;
        Ok(self)
    }

    /// Step 1: ask the model for sub-questions.
    ///
    /// Malformed structured output is a [`ragline_core::CoreError::Model`].
    pub async fn sub_questions(&self, question: &str) -> Result<Vec<String>> {
        let mut knobs = self.config.generation_config();
        knobs.response_schema = Some(ragline_tool::schema_of::<Questions>());
        let request = self
            .config
            .request(vec![Content::system(DECOMPOSE_PROMPT), Content::user(question)])
            .with_config(knobs);

        let Questions { mut questions } = generate_json(self.llm.as_ref(), request).await?;
        questions.retain(|q| !q.trim().is_empty());
        questions.truncate(self.config.max_sub_questions);
        debug!(count = questions.len(), "generated sub-questions");
        Ok(questions)
    }

    /// Step 2: answer each sub-question in order, threading earlier answers
    /// through as context.
    pub async fn answer_sub_questions(&self, questions: Vec<String>) -> Result<Vec<QaPair>> {
        let mut pairs: Vec<QaPair> = Vec::with_capacity(questions.len());
        for question in questions {
            let prior = if pairs.is_empty() {
                NO_PRIOR_ANSWERS.to_string()
            } else {
                format_pairs(&pairs)
            };
            let context = self.prior_template.format(&[("prior", prior.as_str())])?;
            let request = self.config.request(vec![
                Content::system(context),
                Content::system(ANSWER_PROMPT),
                Content::user(question.as_str()),
            ]);
            let answer = generate_text(self.llm.as_ref(), request).await?;
            debug!(index = pairs.len(), "answered sub-question");
            pairs.push(QaPair { question, answer });
        }
        Ok(pairs)
    }

    /// Step 3: combine the answered pairs into the final answer.
    pub async fn synthesize(&self, question: &str, pairs: &[QaPair]) -> Result<String> {
        let prompt = self.synthesis_template.format(&[("prior", format_pairs(pairs).as_str())])?;
        let request = self.config.request(vec![Content::system(prompt), Content::user(question)]);
        Ok(generate_text(self.llm.as_ref(), request).await?)
    }

    /// Run all three steps.
    #[instrument(name = "agent.decompose", skip_all, fields(model = %self.llm.name()))]
    pub async fn run(&self, question: &str) -> Result<Decomposition> {
        let questions = self.sub_questions(question).await?;
        let sub_answers = self.answer_sub_questions(questions).await?;
        let answer = self.synthesize(question, &sub_answers).await?;
        info!(sub_questions = sub_answers.len(), "decomposition finished");
        Ok(Decomposition { sub_answers, answer })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pairs_are_joined_with_separator() {
        let pairs = vec![
            QaPair { question: "q1".into(), answer: "a1".into() },
            QaPair { question: "q2".into(), answer: "a2".into() },
        ];
        assert_eq!(
            format_pairs(&pairs),
            "Question: q1\nAnswer: a1\n\n----\n\nQuestion: q2\nAnswer: a2"
        );
        assert_eq!(format_pairs(&[]), "");
    }

    #[test]
    fn questions_schema_requires_the_list() {
        let schema = ragline_tool::schema_of::<Questions>();
        assert_eq!(schema["required"], serde_json::json!(["questions"]));
        assert_eq!(schema["properties"]["questions"]["type"], "array");
    }
}
