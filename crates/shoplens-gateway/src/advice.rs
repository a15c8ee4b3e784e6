//! Marketing advice from an OpenAI chat model.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use shoplens_core::config::OpenAiConfig;
use shoplens_core::SecretString;
use shoplens_store::analysis::AnalysisResult;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Text used in reports when no advice could be generated.
pub const ADVICE_UNAVAILABLE: &str =
    "AIによるアドバイスを生成できませんでした。APIキーが設定されていないか、エラーが発生しました。";

const MAX_TOKENS: u32 = 800;

/// Errors from the advice backend.
#[derive(Debug, Error)]
pub enum AdviceError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("OpenAI returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("OpenAI returned no content")]
    Empty,
}

/// Produces advice for an analysed storefront.
#[async_trait]
pub trait AdviceGenerator: Send + Sync {
    async fn generate(
        &self,
        api_key: &SecretString,
        url: &str,
        analysis: &AnalysisResult,
    ) -> std::result::Result<String, AdviceError>;
}

/// Chat-completions client.
pub struct OpenAiAdvisor {
    client: Client,
    api_base: String,
    model: String,
}

impl OpenAiAdvisor {
    pub fn new(config: &OpenAiConfig) -> std::result::Result<Self, AdviceError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            model: config.model.clone(),
        })
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
}

#[derive(Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
}

#[async_trait]
impl AdviceGenerator for OpenAiAdvisor {
    async fn generate(
        &self,
        api_key: &SecretString,
        url: &str,
        analysis: &AnalysisResult,
    ) -> std::result::Result<String, AdviceError> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: Some(build_prompt(url, analysis)),
            }],
            max_tokens: MAX_TOKENS,
        };

        debug!(model = %self.model, "requesting advice");
        let response = self
            .client
            .post(format!("{}/chat/completions", self.api_base))
            .bearer_auth(api_key.expose_secret())
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ApiErrorBody>()
                .await
                .map(|b| b.error.message)
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AdviceError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: ChatResponse = response.json().await?;
        body.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or(AdviceError::Empty)
    }
}

/// Japanese-language prompt summarising what the analysis found.
fn build_prompt(url: &str, analysis: &AnalysisResult) -> String {
    let mut facts = vec![format!("商品数: {}", analysis.product_names.len())];
    if let Some(cs) = &analysis.competitor_summary {
        if let Some(range) = &cs.price_range {
            facts.push(format!("価格帯: {range}"));
        }
        if let Some(theme) = &cs.theme {
            facts.push(format!("テーマ: {theme}"));
        }
        if let Some(apps) = cs.apps.as_ref().filter(|a| !a.is_empty()) {
            facts.push(format!("導入アプリ: {}", apps.join(", ")));
        }
    }
    facts.push(format!("カテゴリー数: {}", analysis.category_links.len()));
    if let Some(social) = &analysis.social_links {
        let mut networks = Vec::new();
        if social.instagram.as_deref().is_some_and(|l| !l.is_empty()) {
            networks.push("Instagram");
        }
        if social.twitter.as_deref().is_some_and(|l| !l.is_empty()) {
            networks.push("Twitter");
        }
        if !networks.is_empty() {
            facts.push(format!("SNS: {}", networks.join(", ")));
        }
    }

    format!(
        "あなたはECサイト分析の専門家です。\n\
         以下のECサイトについて分析してください: {url}\n\n\
         {}\n\n\
         以下の点について分析し、日本語でアドバイスをまとめてください：\n\
         1. UIとUXの評価\n\
         2. 商品構造と価格戦略\n\
         3. SNS連携の効果\n\
         4. 改善点と具体的な提案\n\n\
         レスポンスは500単語以内でまとめてください。",
        facts.join("\n")
    )
}
