//! HTTP-backed decision provider
//!
//! A model-agnostic client for LLM APIs, supporting both Anthropic and
//! OpenAI-compatible endpoints (DeepSeek, etc). Calls are blocking: the
//! rule engine is synchronous and a decision is a request/response
//! boundary that either returns or fails the tick.

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use crate::core::error::{DecisionFailure, Result, SugarError};
use crate::core::types::AgentId;
use crate::decision::context::{
    CombatContext, CreditContext, CultureContext, MovementContext, ReproductionContext,
};
use crate::decision::parser::parse_decision;
use crate::decision::provider::DecisionProvider;
use crate::decision::types::{
    CombatDecision, CreditDecision, CultureDecision, MovementDecision, ReproductionDecision,
};

/// API format type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiFormat {
    Anthropic,
    OpenAI,
}

/// Blocking LLM client for decision requests
pub struct LlmClient {
    client: Client,
    api_key: String,
    api_url: String,
    model: String,
    api_format: ApiFormat,
}

impl LlmClient {
    /// Create a client with explicit configuration
    pub fn new(api_key: String, api_url: String, model: String) -> Self {
        let api_format = Self::detect_api_format(&api_url);
        Self {
            client: Client::new(),
            api_key,
            api_url,
            model,
            api_format,
        }
    }

    /// Detect API format from URL
    fn detect_api_format(url: &str) -> ApiFormat {
        if url.contains("anthropic.com") {
            ApiFormat::Anthropic
        } else {
            // DeepSeek, OpenAI, and other compatible APIs use OpenAI format
            ApiFormat::OpenAI
        }
    }

    /// Create a client from environment variables
    ///
    /// Required: LLM_API_KEY
    /// Optional: LLM_API_URL (defaults to Anthropic API)
    /// Optional: LLM_MODEL
    pub fn from_env() -> std::result::Result<Self, String> {
        let api_key = std::env::var("LLM_API_KEY").map_err(|_| "LLM_API_KEY not set".to_string())?;
        let api_url = std::env::var("LLM_API_URL")
            .unwrap_or_else(|_| "https://api.anthropic.com/v1/messages".into());
        let model = std::env::var("LLM_MODEL").unwrap_or_else(|_| "claude-3-haiku-20240307".into());
        Ok(Self::new(api_key, api_url, model))
    }

    /// Send a completion request, returning the raw text response
    ///
    /// Failures come back as plain messages; the provider wrapper attaches
    /// rule and agent context before surfacing them.
    pub fn complete(&self, system: &str, user: &str) -> std::result::Result<String, String> {
        match self.api_format {
            ApiFormat::Anthropic => self.complete_anthropic(system, user),
            ApiFormat::OpenAI => self.complete_openai(system, user),
        }
    }

    fn complete_anthropic(&self, system: &str, user: &str) -> std::result::Result<String, String> {
        let request = AnthropicRequest {
            model: self.model.clone(),
            max_tokens: 2048,
            system: system.into(),
            messages: vec![Message {
                role: "user".into(),
                content: user.into(),
            }],
        };

        let response = self
            .client
            .post(&self.api_url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .map_err(|e| e.to_string())?;

        if !response.status().is_success() {
            let error_text = response.text().unwrap_or_default();
            return Err(format!("API error: {error_text}"));
        }

        let completion: AnthropicResponse = response.json().map_err(|e| e.to_string())?;
        completion
            .content
            .first()
            .map(|c| c.text.clone())
            .ok_or_else(|| "Empty response".into())
    }

    fn complete_openai(&self, system: &str, user: &str) -> std::result::Result<String, String> {
        let request = OpenAIRequest {
            model: self.model.clone(),
            max_tokens: 2048,
            messages: vec![
                Message {
                    role: "system".into(),
                    content: system.into(),
                },
                Message {
                    role: "user".into(),
                    content: user.into(),
                },
            ],
        };

        let response = self
            .client
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .map_err(|e| e.to_string())?;

        if !response.status().is_success() {
            let error_text = response.text().unwrap_or_default();
            return Err(format!("API error: {error_text}"));
        }

        let completion: OpenAIResponse = response.json().map_err(|e| e.to_string())?;
        completion
            .choices
            .first()
            .map(|c| c.message.content.clone())
            .ok_or_else(|| "Empty response".into())
    }
}

/// Decision provider backed by an `LlmClient`
///
/// Serializes the context snapshot to JSON, asks for a decision in the
/// rule's schema, and parses the completion. API failures classify as Api,
/// unparseable completions as Schema; legality is checked by the rules.
pub struct LlmProvider {
    client: LlmClient,
}

impl LlmProvider {
    pub fn new(client: LlmClient) -> Self {
        Self { client }
    }

    fn ask<T, C>(&self, rule: &'static str, agent: AgentId, system: &str, ctx: &C) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
        C: Serialize,
    {
        let user = serde_json::to_string(ctx)?;
        let response = self.client.complete(system, &user).map_err(|message| {
            SugarError::decision(rule, agent, "response", DecisionFailure::Api, message)
        })?;
        parse_decision(rule, agent, &response)
    }
}

impl DecisionProvider for LlmProvider {
    fn movement_decision(&self, ctx: &MovementContext) -> Result<MovementDecision> {
        self.ask("movement", ctx.agent.id, MOVEMENT_PROMPT, ctx)
    }

    fn combat_decision(&self, ctx: &CombatContext) -> Result<CombatDecision> {
        self.ask("combat", ctx.agent.id, COMBAT_PROMPT, ctx)
    }

    fn credit_decision(&self, ctx: &CreditContext) -> Result<CreditDecision> {
        self.ask("credit", ctx.agent.id, CREDIT_PROMPT, ctx)
    }

    fn reproduction_decision(&self, ctx: &ReproductionContext) -> Result<ReproductionDecision> {
        self.ask("reproduction", ctx.agent.id, REPRODUCTION_PROMPT, ctx)
    }

    fn culture_decision(&self, ctx: &CultureContext) -> Result<CultureDecision> {
        self.ask("culture", ctx.agent.id, CULTURE_PROMPT, ctx)
    }
}

const MOVEMENT_PROMPT: &str = r#"You decide where a Sugarscape agent moves.
The user message is a JSON context: the agent and the cells it can see.
Pick an empty visible cell (or stay put).

OUTPUT FORMAT (JSON only, no explanation):
{"move": true|false, "target": {"x": 0, "y": 0} or null}"#;

const COMBAT_PROMPT: &str = r#"You decide whether a Sugarscape agent attacks.
The user message is a JSON context listing legal targets with their rewards.
Only listed candidates are legal.

OUTPUT FORMAT (JSON only, no explanation):
{"attack": true|false, "target_id": <candidate id> or null}"#;

const CREDIT_PROMPT: &str = r#"You decide which neighbors a Sugarscape agent lends to.
The user message is a JSON context with the lendable amount and eligible borrowers.
Order counterparties by preference; lending stops when the surplus runs out.

OUTPUT FORMAT (JSON only, no explanation):
{"act": true|false, "counterparties": [<borrower ids>]}"#;

const REPRODUCTION_PROMPT: &str = r#"You decide which partners a Sugarscape agent mates with.
The user message is a JSON context with eligible adjacent partners and the
mating budget for this turn. Do not exceed max_matings partners.

OUTPUT FORMAT (JSON only, no explanation):
{"reproduce": true|false, "partner_ids": [<partner ids>]}"#;

const CULTURE_PROMPT: &str = r#"You decide which cultural bits a Sugarscape agent pushes to neighbors.
The user message is a JSON context with the agent's neighbors and the tag length.
Each target names a neighbor and a bit index below the tag length.

OUTPUT FORMAT (JSON only, no explanation):
{"spread": true|false, "targets": [{"target_id": <id>, "bit_index": <index>}]}"#;

// Anthropic API format
#[derive(Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    system: String,
    messages: Vec<Message>,
}

#[derive(Deserialize)]
struct AnthropicResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    text: String,
}

// OpenAI-compatible API format (DeepSeek, OpenAI, etc.)
#[derive(Serialize)]
struct OpenAIRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<Message>,
}

#[derive(Deserialize)]
struct OpenAIResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: String,
}

// Shared
#[derive(Serialize)]
struct Message {
    role: String,
    content: String,
}
