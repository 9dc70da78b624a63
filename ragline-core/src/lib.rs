//! # ragline-core
//!
//! Core traits and types shared by every ragline crate.
//!
//! ## Overview
//!
//! - [`Content`] / [`Part`] - role-tagged messages exchanged with a model
//! - [`Llm`] - the generation collaborator (blocking or streaming)
//! - [`Tool`] - a named, typed function a model may request
//! - [`PromptTemplate`] - single-pass `{slot}` substitution
//! - [`CoreError`] - the shared error type
//!
//! Nothing in this crate performs I/O. Concrete model clients live in
//! `ragline-model`, tools in `ragline-tool`, and retrieval in `ragline-rag`.

pub mod error;
pub mod model;
pub mod template;
pub mod tool;
pub mod types;

pub use error::{CoreError, Result};
pub use model::{
    GenerateContentConfig, Llm, LlmRequest, LlmResponse, LlmResponseStream, ToolDeclaration,
    collect_content, collect_text, generate_json, generate_text,
};
pub use template::PromptTemplate;
pub use tool::Tool;
pub use types::{Content, Part};
