use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single chat message. `content` is kept as a raw `Value` because the
/// OpenAI schema allows either a string or a list of content parts; the
/// anonymization engine only operates on the string form and passes
/// anything else through untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
	pub role: String,
	pub content: Value,
	#[serde(flatten)]
	pub extra: serde_json::Map<String, Value>,
}

impl ChatMessage {
	pub fn content_str(&self) -> Option<&str> {
		self.content.as_str()
	}

	pub fn is_system(&self) -> bool {
		self.role == "system"
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletionRequest {
	pub model: String,
	pub messages: Vec<ChatMessage>,
	#[serde(default)]
	pub temperature: Option<f64>,
	#[serde(default)]
	pub top_p: Option<f64>,
	#[serde(default)]
	pub n: Option<u32>,
	#[serde(default)]
	pub stream: Option<bool>,
	#[serde(default)]
	pub max_tokens: Option<u32>,
	#[serde(default)]
	pub presence_penalty: Option<f64>,
	#[serde(default)]
	pub frequency_penalty: Option<f64>,
	#[serde(flatten)]
	pub extra: serde_json::Map<String, Value>,
}

impl ChatCompletionRequest {
	pub fn is_streaming(&self) -> bool {
		self.stream.unwrap_or(false)
	}
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Usage {
	#[serde(default)]
	pub prompt_tokens: u64,
	#[serde(default)]
	pub completion_tokens: u64,
	#[serde(default)]
	pub total_tokens: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletionChoice {
	pub index: u32,
	pub message: ChatMessage,
	#[serde(default)]
	pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletionResponse {
	pub id: String,
	pub object: String,
	pub created: i64,
	pub model: String,
	pub choices: Vec<ChatCompletionChoice>,
	#[serde(default)]
	pub usage: Usage,
	#[serde(flatten)]
	pub extra: serde_json::Map<String, Value>,
}

/// One SSE `data:` payload for a streaming chat completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletionChunk {
	pub id: String,
	pub object: String,
	pub created: i64,
	pub model: String,
	pub choices: Vec<ChunkChoice>,
	#[serde(default)]
	pub usage: Option<Usage>,
	#[serde(flatten)]
	pub extra: serde_json::Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkChoice {
	pub index: u32,
	pub delta: ChunkDelta,
	#[serde(default)]
	pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ChunkDelta {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub role: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub content: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModelInfo {
	pub id: String,
	pub object: &'static str,
	pub owned_by: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModelList {
	pub object: &'static str,
	pub data: Vec<ModelInfo>,
}
