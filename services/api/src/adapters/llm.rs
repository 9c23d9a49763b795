//! services/api/src/adapters/llm.rs
//!
//! Shared plumbing for the prompt-flow adapters: sends one system instruction
//! and one user prompt (optionally with images) to an OpenAI-compatible chat
//! model in JSON mode, and parses the reply into the flow's output type.

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestMessageContentPartImageArgs,
        ChatCompletionRequestMessageContentPartTextArgs, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, ChatCompletionRequestUserMessageContent,
        ChatCompletionRequestUserMessageContentPart, CreateChatCompletionRequestArgs,
        ImageUrlArgs, ResponseFormat,
    },
    Client,
};
use edusync_core::ports::{PortError, PortResult};
use serde::de::DeserializeOwned;
use tracing::{info, warn};

//=========================================================================================
// The Shared Prompt Runner
//=========================================================================================

/// Owns the model client and the model name used by every flow adapter.
#[derive(Clone)]
pub struct PromptRunner {
    client: Client<OpenAIConfig>,
    model: String,
}

impl PromptRunner {
    /// Creates a new `PromptRunner`.
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }

    /// Runs a prompt and deserializes the JSON object in the reply.
    ///
    /// `flow` names the calling flow in logs. A reply that is not valid JSON
    /// for `T` is reported as `PortError::MalformedOutput`.
    pub async fn run_json<T: DeserializeOwned>(
        &self,
        flow: &str,
        system: &str,
        prompt: String,
        image_urls: &[String],
    ) -> PortResult<T> {
        let user_message = if image_urls.is_empty() {
            ChatCompletionRequestUserMessageArgs::default()
                .content(prompt)
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
        } else {
            let mut parts: Vec<ChatCompletionRequestUserMessageContentPart> = vec![
                ChatCompletionRequestMessageContentPartTextArgs::default()
                    .text(prompt)
                    .build()
                    .map_err(|e| PortError::Unexpected(e.to_string()))?
                    .into(),
            ];
            for url in image_urls {
                let image_url = ImageUrlArgs::default()
                    .url(url.as_str())
                    .build()
                    .map_err(|e| PortError::Unexpected(e.to_string()))?;
                parts.push(
                    ChatCompletionRequestMessageContentPartImageArgs::default()
                        .image_url(image_url)
                        .build()
                        .map_err(|e| PortError::Unexpected(e.to_string()))?
                        .into(),
                );
            }
            ChatCompletionRequestUserMessageArgs::default()
                .content(ChatCompletionRequestUserMessageContent::Array(parts))
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
        };

        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(system)
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
            user_message.into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .response_format(ResponseFormat::JsonObject)
            .n(1)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        info!(flow = flow, images = image_urls.len(), "Sending prompt to model.");

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e: OpenAIError| PortError::Unexpected(e.to_string()))?;

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                PortError::Unexpected(format!("The {} model returned no text content.", flow))
            })?;

        parse_reply(flow, &content)
    }
}

//=========================================================================================
// Prompt Templates
//=========================================================================================

/// Substitutes `{name}` placeholders in one pass over the template. Values are
/// copied verbatim, so braces inside user input are never expanded. Unknown
/// placeholders are left as they are.
pub fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let value = after.find('}').and_then(|close| {
            let name = &after[..close];
            values
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (*value, close))
        });
        match value {
            Some((value, close)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

//=========================================================================================
// Reply Parsing
//=========================================================================================

/// Cuts the outermost JSON object out of a reply, dropping markdown fences
/// and any chatter around it.
pub fn extract_json_object(reply: &str) -> Option<&str> {
    let start = reply.find('{')?;
    let end = reply.rfind('}')?;
    (start < end).then(|| &reply[start..=end])
}

pub fn parse_reply<T: DeserializeOwned>(flow: &str, reply: &str) -> PortResult<T> {
    let json = extract_json_object(reply).ok_or_else(|| {
        warn!(flow = flow, "Model reply contained no JSON object.");
        PortError::MalformedOutput(format!("The {} model did not reply with JSON.", flow))
    })?;
    serde_json::from_str(json).map_err(|e| {
        warn!(flow = flow, error = %e, "Model reply did not match the output schema.");
        PortError::MalformedOutput(format!("The {} model reply was malformed: {}", flow, e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use edusync_core::domain::EnhanceResult;

    #[test]
    fn template_values_are_not_expanded_again() {
        let filled = fill_template(
            "Topic: {topic}\nSource: {source}\nKeep {this}",
            &[("topic", "Cells {source}"), ("source", "membranes")],
        );
        assert_eq!(filled, "Topic: Cells {source}\nSource: membranes\nKeep {this}");
        assert_eq!(fill_template("{open", &[("open", "x")]), "{open");
    }

    #[test]
    fn extracts_object_from_fenced_reply() {
        let reply = "```json\n{\"enhancedText\": \"Clear.\"}\n```";
        assert_eq!(extract_json_object(reply), Some("{\"enhancedText\": \"Clear.\"}"));
        assert_eq!(extract_json_object("no json here"), None);
        assert_eq!(extract_json_object("} {"), None);
    }

    #[test]
    fn parses_reply_into_output_schema() {
        let parsed: EnhanceResult =
            parse_reply("enhance-text", "Sure! {\"enhancedText\": \"Clear.\"}").unwrap();
        assert_eq!(parsed.enhanced_text, "Clear.");
    }

    #[test]
    fn schema_mismatch_is_malformed_output() {
        let err = parse_reply::<EnhanceResult>("enhance-text", "{\"text\": \"x\"}").unwrap_err();
        assert!(matches!(err, PortError::MalformedOutput(_)));
    }
}
