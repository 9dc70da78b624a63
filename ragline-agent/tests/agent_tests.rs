use std::sync::Arc;

use async_trait::async_trait;
use ragline_agent::{
    AgentConfig, AgentError, Conversation, NO_PRIOR_ANSWERS, RetrievalQa, SubQuestionDecomposer,
    ToolCallingAgent,
};
use ragline_core::{CoreError, Part, collect_text};
use ragline_model::MockLlm;
use ragline_rag::{Chunk, EmbeddingProvider, InMemoryVectorStore, RagConfig, RagPipeline};
use ragline_telemetry::CapturedSpans;
use ragline_tool::{ToolOutcome, ToolRegistry, multiply_tool, weather_tool};
use serde_json::json;
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;

const VOCABULARY: [&str; 5] = ["mammals", "sky", "blue", "cats", "dogs"];

struct KeywordEmbedder;

#[async_trait]
impl EmbeddingProvider for KeywordEmbedder {
    async fn embed(&self, text: &str) -> ragline_rag::Result<Vec<f32>> {
        let lower = text.to_lowercase();
        Ok(VOCABULARY
            .iter()
            .map(|word| lower.split_whitespace().filter(|w| w == word).count() as f32)
            .collect())
    }

    fn dimensions(&self) -> usize {
        VOCABULARY.len()
    }
}

async fn facts_pipeline() -> Arc<RagPipeline> {
    let pipeline = RagPipeline::builder()
        .config(RagConfig::builder().top_k(2).build().unwrap())
        .embedding_provider(Arc::new(KeywordEmbedder))
        .vector_store(Arc::new(InMemoryVectorStore::new()))
        .build()
        .unwrap();
    let chunks = ["cats are mammals", "the sky is blue", "dogs are mammals"]
        .iter()
        .enumerate()
        .map(|(i, text)| Chunk::new(format!("c{i}"), *text, "facts"))
        .collect();
    pipeline.ingest_chunks("facts", chunks).await.unwrap();
    Arc::new(pipeline)
}

#[tokio::test]
async fn test_retrieval_qa_sends_composed_prompt() {
    let llm = Arc::new(MockLlm::new("mock").with_text("Cats and dogs."));
    let qa = RetrievalQa::new(facts_pipeline().await, llm.clone());

    let answer = qa.answer("facts", "tell me about mammals").await.unwrap();
    assert_eq!(answer, "Cats and dogs.");

    let requests = llm.requests();
    assert_eq!(requests.len(), 1);
    let prompt = requests[0].contents[0].text();
    assert_eq!(requests[0].contents[0].role, "user");
    assert!(prompt.contains("cats are mammals"));
    assert!(prompt.contains("dogs are mammals"));
    assert!(!prompt.contains("sky"));
    assert!(prompt.ends_with("tell me about mammals"));
    assert_eq!(requests[0].config.as_ref().unwrap().temperature, Some(0.0));
}

#[tokio::test]
async fn test_streamed_answer_matches_blocking_answer() {
    let text = "Cats and dogs are both mammals.";
    let llm = Arc::new(MockLlm::new("mock").with_text(text).with_text(text));
    let qa = RetrievalQa::new(facts_pipeline().await, llm.clone());

    let blocking = qa.answer("facts", "mammals?").await.unwrap();
    let stream = qa.answer_stream("facts", "mammals?").await.unwrap();
    let streamed = collect_text(stream).await.unwrap();

    assert_eq!(blocking, streamed);
}

#[tokio::test]
async fn test_unknown_collection_still_answers_with_empty_context() {
    let llm = Arc::new(MockLlm::new("mock").with_text("I don't know."));
    let qa = RetrievalQa::new(facts_pipeline().await, llm.clone());

    let (prompt, results) = qa.prompt("never-ingested", "anything").await.unwrap();
    assert!(results.is_empty());
    assert!(prompt.contains("following context:\n\n\n\n---"));
    assert_eq!(qa.answer("never-ingested", "anything").await.unwrap(), "I don't know.");
}

fn demo_tools() -> ToolRegistry {
    ToolRegistry::new()
        .with_tool(Arc::new(weather_tool()))
        .with_tool(Arc::new(multiply_tool()))
}

#[tokio::test]
async fn test_tool_agent_skips_unknown_tool_and_answers() {
    let llm = Arc::new(
        MockLlm::new("mock")
            .with_function_calls(vec![
                ("get_weather".into(), json!({"city": "Venice"})),
                ("unknown_tool".into(), json!({})),
                ("multiply".into(), json!({"a": 3, "b": 2})),
            ])
            .with_text("It is sunny in Venice and 3 times 2 is 6."),
    );
    let agent = ToolCallingAgent::new(llm.clone(), demo_tools()).unwrap();

    let run = agent.run("How is the weather in Venice? And 3*2?").await.unwrap();

    assert_eq!(run.answer, "It is sunny in Venice and 3 times 2 is 6.");
    assert_eq!(run.outcomes.len(), 3);
    assert!(matches!(run.outcomes[1], ToolOutcome::Skipped { .. }));
    assert!(run.outcomes[0].is_completed() && run.outcomes[2].is_completed());

    let roles: Vec<_> = run.transcript.iter().map(|c| c.role.as_str()).collect();
    assert_eq!(roles, ["system", "user", "assistant", "tool", "assistant"]);

    let tool_message = &run.transcript[3];
    assert_eq!(tool_message.parts.len(), 2);
    assert!(matches!(
        &tool_message.parts[1],
        Part::FunctionResponse { name, response, .. } if name == "multiply" && *response == json!(6)
    ));

    let requests = llm.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].tools.len(), 2);
    assert_eq!(requests[1].contents.len(), 4);
}

#[tokio::test]
async fn test_tool_calls_run_inside_the_agent_span() {
    let captured = CapturedSpans::new();
    let _guard =
        tracing::subscriber::set_default(tracing_subscriber::registry().with(captured.layer()));

    let llm = Arc::new(
        MockLlm::new("mock")
            .with_function_calls(vec![
                ("unknown_tool".into(), json!({})),
                ("multiply".into(), json!({"a": 3, "b": 2})),
            ])
            .with_text("6"),
    );
    ToolCallingAgent::new(llm, demo_tools()).unwrap().run("3*2?").await.unwrap();

    let agent_spans = captured.spans_named("agent.tools");
    assert_eq!(agent_spans.len(), 1);
    assert_eq!(agent_spans[0].fields["model"], "mock");

    let calls = captured.spans_named("tool.call");
    assert_eq!(calls.len(), 2);
    assert!(calls.iter().all(|s| s.parent.as_deref() == Some("agent.tools")));

    let warnings = captured.events_at(Level::WARN);
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].fields["tool"], "unknown_tool");
    assert_eq!(warnings[0].span.as_deref(), Some("agent.tools"));

    let finished: Vec<_> = captured
        .events_at(Level::INFO)
        .into_iter()
        .filter(|e| e.message == "tool run finished")
        .collect();
    assert_eq!(finished.len(), 1);
    assert_eq!(finished[0].span.as_deref(), Some("agent.tools"));
    assert_eq!(finished[0].fields["tool_calls"], 2);
}

#[tokio::test]
async fn test_system_prompt_lists_tools() {
    let agent = ToolCallingAgent::new(Arc::new(MockLlm::new("mock")), demo_tools()).unwrap();
    let prompt = agent.system_prompt().unwrap();

    assert!(prompt.contains("Tools:\nget_weather: Retrieve real time"));
    assert!(prompt.contains("\nmultiply: Multiply two numbers"));
}

#[tokio::test]
async fn test_tool_agent_without_tool_calls_answers_directly() {
    let llm = Arc::new(MockLlm::new("mock").with_text("Van Gogh was born in 1853."));
    let agent = ToolCallingAgent::new(llm.clone(), demo_tools()).unwrap();

    let run = agent.run("When was Van Gogh born?").await.unwrap();

    assert_eq!(run.answer, "Van Gogh was born in 1853.");
    assert!(run.outcomes.is_empty());
    assert_eq!(run.transcript.len(), 3);
    assert_eq!(llm.requests().len(), 1);
}

#[tokio::test]
async fn test_tool_rounds_are_bounded() {
    let llm = Arc::new(
        MockLlm::new("mock")
            .with_function_call("multiply", json!({"a": 2, "b": 2}))
            .with_function_call("multiply", json!({"a": 4, "b": 4}))
            .with_function_call("multiply", json!({"a": 16, "b": 16})),
    );
    let agent = ToolCallingAgent::new(llm.clone(), demo_tools())
        .unwrap()
        .with_config(AgentConfig::default().with_max_tool_rounds(2))
        .unwrap();

    let run = agent.run("square 2 twice").await.unwrap();

    assert_eq!(llm.requests().len(), 3);
    assert_eq!(llm.remaining(), 0);
    assert_eq!(run.outcomes.len(), 2);
    assert_eq!(run.answer, "");
}

#[tokio::test]
async fn test_decomposer_threads_prior_answers_in_order() {
    let questions = json!({"questions": ["q1", "q2", "q3", "q4", "q5", "q6"]}).to_string();
    let llm = Arc::new(
        MockLlm::new("mock")
            .with_text(questions)
            .with_text("a1")
            .with_text("a2")
            .with_text("a3")
            .with_text("a4")
            .with_text("a5")
            .with_text("final answer"),
    );
    let decomposer = SubQuestionDecomposer::new(llm.clone()).unwrap();

    let result = decomposer.run("What makes up an agent system?").await.unwrap();

    assert_eq!(result.answer, "final answer");
    assert_eq!(result.sub_answers.len(), 5);
    assert_eq!(result.sub_answers[4].question, "q5");
    assert_eq!(result.sub_answers[4].answer, "a5");
    assert_eq!(llm.remaining(), 0);

    let requests = llm.requests();
    assert_eq!(requests.len(), 7);
    assert!(requests[0].config.as_ref().unwrap().response_schema.is_some());

    let first_context = requests[1].contents[0].text();
    assert!(first_context.contains(NO_PRIOR_ANSWERS));
    assert_eq!(requests[1].contents[2].text(), "q1");

    let third_context = requests[3].contents[0].text();
    assert!(third_context.contains("Question: q1\nAnswer: a1\n\n----\n\nQuestion: q2\nAnswer: a2"));
    assert!(!third_context.contains("q3"));

    let synthesis = requests[6].contents[0].text();
    assert!(synthesis.contains("Question: q5\nAnswer: a5"));
    assert_eq!(requests[6].contents[1].text(), "What makes up an agent system?");
}

#[tokio::test]
async fn test_decomposition_is_traced_under_one_span() {
    let captured = CapturedSpans::new();
    let _guard =
        tracing::subscriber::set_default(tracing_subscriber::registry().with(captured.layer()));

    let llm = Arc::new(
        MockLlm::new("mock")
            .with_text(json!({"questions": ["q1", "q2"]}).to_string())
            .with_text("a1")
            .with_text("a2")
            .with_text("done"),
    );
    SubQuestionDecomposer::new(llm).unwrap().run("why?").await.unwrap();

    assert_eq!(captured.spans_named("agent.decompose").len(), 1);
    let finished: Vec<_> = captured
        .events_at(Level::INFO)
        .into_iter()
        .filter(|e| e.span.as_deref() == Some("agent.decompose"))
        .collect();
    assert_eq!(finished.len(), 1);
    assert_eq!(finished[0].fields["sub_questions"], 2);
}

#[tokio::test]
async fn test_malformed_decomposition_is_a_model_error() {
    let llm = Arc::new(MockLlm::new("mock").with_text("here are some questions: 1. why"));
    let decomposer = SubQuestionDecomposer::new(llm).unwrap();

    let err = decomposer.run("why?").await.unwrap_err();
    assert!(matches!(err, AgentError::Core(CoreError::Model(_))));
}

#[tokio::test]
async fn test_conversation_keeps_history_between_turns() {
    let llm = Arc::new(
        MockLlm::new("mock")
            .with_text("Hello Ada, nice to meet you.")
            .with_text("Your name is Ada."),
    );
    let mut conversation = Conversation::new(llm.clone());

    let mut fragments = Vec::new();
    let first = conversation
        .send("Hi, I am Ada.", |f| fragments.push(f.to_string()))
        .await
        .unwrap();
    assert_eq!(first, "Hello Ada, nice to meet you.");
    assert!(fragments.len() > 1);
    assert_eq!(fragments.concat(), first);

    let second = conversation.send("What is my name?", |_| {}).await.unwrap();
    assert_eq!(second, "Your name is Ada.");

    let requests = llm.requests();
    assert_eq!(requests[1].contents.len(), 3);
    assert_eq!(requests[1].contents[1].text(), "Hello Ada, nice to meet you.");
    assert_eq!(conversation.history().len(), 4);

    conversation.clear();
    assert!(conversation.history().is_empty());
}
