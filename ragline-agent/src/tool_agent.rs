use std::sync::Arc;

use ragline_core::{Content, Llm, Part, PromptTemplate, collect_content};
use ragline_tool::{ToolOutcome, ToolRegistry, ToolRequest};
use tracing::{debug, info, instrument};

use crate::config::AgentConfig;
use crate::error::Result;

/// System prompt for [`ToolCallingAgent`]; `{tools}` receives one
/// `name: description` line per registered tool.
pub const TOOL_SYSTEM_TEMPLATE: &str = "You are a helpful assistant that can use tools which \
return real time result to answer questions. Use the tools only when necessary based on the \
topic or tasks and provide the final answer in your own words based on the tool results. You \
can also answer without using any tool if user prompt is not related to any tool.

The tools you can use are the following ones. Also take into account their descriptions for \
selecting the tool. You don't need to use any tool if the user question has no relation with \
the tools.

Tools:
{tools}
";

/// Result of one [`ToolCallingAgent::run`].
#[derive(Debug, Clone)]
pub struct ToolRun {
    pub answer: String,
    /// Every message exchanged, starting with the system prompt.
    pub transcript: Vec<Content>,
    /// One outcome per requested tool call, in dispatch order.
    pub outcomes: Vec<ToolOutcome>,
}

/// Lets the model call registered tools before it answers.
///
/// The model chooses which tools to call. Small local models have been seen
/// to call the last declared tool for prompts unrelated to any tool; the agent
/// runs whatever known tool is requested and leaves that judgement to the
/// model.
pub struct ToolCallingAgent {
    llm: Arc<dyn Llm>,
    registry: ToolRegistry,
    system_template: PromptTemplate,
    config: AgentConfig,
}

impl ToolCallingAgent {
    pub fn new(llm: Arc<dyn Llm>, registry: ToolRegistry) -> Result<Self> {
        Ok(Self {
            llm,
            registry,
            system_template: PromptTemplate::new(TOOL_SYSTEM_TEMPLATE)?,
            config: AgentConfig::default(),
        })
    }

    /// Replace the system prompt; the template may use the `{tools}` slot.
    pub fn with_system_template(mut self, template: &str) -> Result<Self> {
        self.system_template = PromptTemplate::new(template)?;
        Ok(self)
    }

    pub fn with_config(mut self, config: AgentConfig) -> Result<Self> {
        config.validate()?;
        self.config = config;
        Ok(self)
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// The rendered system prompt.
    pub fn system_prompt(&self) -> Result<String> {
        let tools = self
            .registry
            .tools()
            .map(|t| format!("{}: {}", t.name(), t.description()))
            .collect::<Vec<_>>()
            .join("\n");
        Ok(self.system_template.format(&[("tools", tools.as_str())])?)
    }

    #[instrument(name = "agent.tools", skip_all, fields(model = %self.llm.name()))]
    pub async fn run(&self, question: &str) -> Result<ToolRun> {
        let mut transcript = vec![Content::system(self.system_prompt()?), Content::user(question)];
        let mut outcomes = Vec::new();

        let mut reply = self.generate(&transcript).await?;
        transcript.push(reply.clone());

        let mut rounds = 0;
        while reply.has_function_calls() && rounds < self.config.max_tool_rounds {
            rounds += 1;
            let requests = ToolRequest::from_content(&reply);
            debug!(round = rounds, calls = requests.len(), "dispatching tool calls");

            let round_outcomes = self.registry.dispatch_all(requests).await;
            let responses: Vec<Part> =
                round_outcomes.iter().filter_map(ToolOutcome::response_part).collect();
            if !responses.is_empty() {
                transcript.push(Content { role: "tool".into(), parts: responses });
            }
            outcomes.extend(round_outcomes);

            reply = self.generate(&transcript).await?;
            transcript.push(reply.clone());
        }

        info!(rounds, tool_calls = outcomes.len(), "tool run finished");
        Ok(ToolRun { answer: reply.text(), transcript, outcomes })
    }

    async fn generate(&self, transcript: &[Content]) -> Result<Content> {
        let request =
            self.config.request(transcript.to_vec()).with_tools(self.registry.declarations());
        let stream = self.llm.generate_content(request, false).await?;
        Ok(collect_content(stream).await?)
    }
}
