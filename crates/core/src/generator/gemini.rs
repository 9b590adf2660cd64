//! Gemini `generateContent` client.
//!
//! Sends the screenshot as inline data with a JSON response schema and parses
//! the model's JSON answer into forge artifacts.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::image::ImagePayload;
use super::prompts::{self, FOUNDRY_UTILS, FOUNDRY_UTILS_PATH};
use super::ContentGenerator;
use crate::error::{ForgeError, Result};
use crate::state::{AnalysisResult, GeneratedContent, ProjectFile, RefinedContent};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const THINKING_BUDGET: u32 = 32768;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<GeminiContent>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct GeminiContent {
    parts: Vec<GeminiPart>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum GeminiPart {
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
    Text {
        text: String,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
    response_schema: Value,
    thinking_config: ThinkingConfig,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ThinkingConfig {
    thinking_budget: u32,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    thought: Option<bool>,
}

pub struct GeminiGenerator {
    api_key: String,
    model: String,
    base_url: String,
    http_client: reqwest::Client,
}

impl GeminiGenerator {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            http_client: reqwest::Client::new(),
        }
    }

    /// Read the key from `GEMINI_API_KEY`, falling back to `API_KEY`
    pub fn from_env(model: impl Into<String>) -> Result<Self> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .or_else(|_| std::env::var("API_KEY"))
            .map_err(|_| ForgeError::Config("GEMINI_API_KEY is not set".to_string()))?;
        Ok(Self::new(api_key, model))
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }

    fn build_request(image: &ImagePayload, prompt: String, schema: Value) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![GeminiContent {
                parts: vec![
                    GeminiPart::InlineData {
                        inline_data: InlineData {
                            mime_type: image.mime_type().to_string(),
                            data: image.data().to_string(),
                        },
                    },
                    GeminiPart::Text { text: prompt },
                ],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                response_schema: schema,
                thinking_config: ThinkingConfig {
                    thinking_budget: THINKING_BUDGET,
                },
            },
        }
    }

    async fn generate(&self, request: &GenerateContentRequest) -> Result<String> {
        let response = self
            .http_client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| ForgeError::Generation(format!("Gemini request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(ForgeError::Generation(format!(
                "Gemini API error {status}: {body_text}"
            )));
        }

        let body: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| ForgeError::Generation(format!("Failed to parse Gemini response: {e}")))?;

        extract_text(body)
    }
}

/// Concatenate the non-thought text parts of the first candidate
fn extract_text(response: GenerateContentResponse) -> Result<String> {
    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter(|p| p.thought != Some(true))
                .filter_map(|p| p.text)
                .collect()
        })
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(ForgeError::Generation(
            "Gemini returned an empty response".to_string(),
        ));
    }
    Ok(text)
}

pub fn parse_generated(text: &str) -> Result<GeneratedContent> {
    serde_json::from_str(text)
        .map_err(|e| ForgeError::Generation(format!("Unparseable analysis output: {e}")))
}

pub fn parse_refined(text: &str) -> Result<RefinedContent> {
    serde_json::from_str(text)
        .map_err(|e| ForgeError::Generation(format!("Unparseable refinement output: {e}")))
}

fn string() -> Value {
    json!({ "type": "STRING" })
}

fn object(properties: Value, required: &[&str]) -> Value {
    if required.is_empty() {
        json!({ "type": "OBJECT", "properties": properties })
    } else {
        json!({ "type": "OBJECT", "properties": properties, "required": required })
    }
}

fn project_files_schema() -> Value {
    json!({
        "type": "ARRAY",
        "items": object(json!({ "path": string(), "content": string() }), &["path", "content"]),
    })
}

fn analyze_schema() -> Value {
    let colors = object(
        json!({
            "primary": string(), "background": string(), "surface": string(),
            "text": string(), "accent": string(),
        }),
        &["primary", "background", "surface", "text", "accent"],
    );
    let radii = object(
        json!({ "card": string(), "button": string(), "input": string() }),
        &["card", "button", "input"],
    );
    let typography = object(
        json!({ "fontFamily": string(), "baseSize": string(), "headingWeight": string() }),
        &["fontFamily", "baseSize", "headingWeight"],
    );
    let spacing = object(json!({ "base": string(), "gap": string() }), &["base", "gap"]);
    let tokens = object(
        json!({ "colors": colors, "radii": radii, "typography": typography, "spacing": spacing }),
        &["colors", "radii", "typography", "spacing"],
    );

    object(
        json!({
            "tokens": tokens,
            "spec": string(),
            "rules": string(),
            "projectFiles": project_files_schema(),
        }),
        &["tokens", "spec", "rules", "projectFiles"],
    )
}

fn refine_schema() -> Value {
    let colors = object(
        json!({
            "primary": string(), "background": string(), "surface": string(),
            "text": string(), "accent": string(),
        }),
        &[],
    );
    let radii = object(
        json!({ "card": string(), "button": string(), "input": string() }),
        &[],
    );
    object(
        json!({
            "tokens": object(json!({ "colors": colors, "radii": radii }), &[]),
            "spec": string(),
            "rules": string(),
            "projectFiles": project_files_schema(),
        }),
        &["projectFiles"],
    )
}

#[async_trait]
impl ContentGenerator for GeminiGenerator {
    #[tracing::instrument(skip_all, fields(model = %self.model))]
    async fn analyze(&self, image: &ImagePayload, instruction: &str) -> Result<GeneratedContent> {
        let request = Self::build_request(image, prompts::analyze_prompt(instruction), analyze_schema());
        let text = self.generate(&request).await?;
        let mut content = parse_generated(&text)?;

        let mut files = vec![ProjectFile::new(FOUNDRY_UTILS_PATH, FOUNDRY_UTILS)];
        files.append(&mut content.project_files);
        content.project_files = files;

        tracing::info!(files = content.project_files.len(), "Analysis received");
        Ok(content)
    }

    #[tracing::instrument(skip_all, fields(model = %self.model))]
    async fn refine(
        &self,
        image: &ImagePayload,
        current: &AnalysisResult,
        instruction: &str,
    ) -> Result<RefinedContent> {
        let prompt = prompts::refine_prompt(instruction, &current.tokens);
        let request = Self::build_request(image, prompt, refine_schema());
        let text = self.generate(&request).await?;
        let content = parse_refined(&text)?;

        tracing::info!(files = content.project_files.len(), "Refinement received");
        Ok(content)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
