//! # ragline-agent
//!
//! Higher-level flows built from a model, a retrieval pipeline and tools.
//!
//! | Type | Flow |
//! |------|------|
//! | [`RetrievalQa`] | retrieve, compose, generate (blocking or streaming) |
//! | [`ToolCallingAgent`] | let the model call registered tools, then answer |
//! | [`SubQuestionDecomposer`] | split a question, answer the parts, combine |
//! | [`Conversation`] | in-memory chat history with streamed replies |
//!
//! Every flow awaits its collaborators one call at a time.

pub mod config;
pub mod conversation;
pub mod decompose;
pub mod error;
pub mod qa;
pub mod tool_agent;

pub use config::AgentConfig;
pub use conversation::Conversation;
pub use decompose::{
    Decomposition, NO_PRIOR_ANSWERS, PAIR_SEPARATOR, QaPair, Questions, SubQuestionDecomposer,
    format_pairs,
};
pub use error::{AgentError, Result};
pub use qa::RetrievalQa;
pub use tool_agent::{TOOL_SYSTEM_TEMPLATE, ToolCallingAgent, ToolRun};
