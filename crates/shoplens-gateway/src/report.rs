//! PDF reports.
//!
//! The report is laid out as HTML and handed to an external renderer.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use maud::{html, Markup, PreEscaped, DOCTYPE};
use shoplens_core::config::ReportConfig;
use shoplens_store::analysis::AnalysisResult;
use shoplens_store::DiagnosticScores;
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

/// Score shown for each axis when the analysis carries none.
pub const DEFAULT_SCORE: f64 = 5.0;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[error("renderer I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("renderer exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },

    #[error("renderer timed out after {0}s")]
    Timeout(u64),
}

/// Turns an HTML document into PDF bytes.
#[async_trait]
pub trait PdfRenderer: Send + Sync {
    async fn render(&self, html: &str) -> std::result::Result<Vec<u8>, RenderError>;
}

/// Runs `wkhtmltopdf`, HTML on stdin and PDF on stdout.
pub struct WkhtmltopdfRenderer {
    program: String,
    timeout: Duration,
}

impl WkhtmltopdfRenderer {
    pub fn new(config: &ReportConfig) -> Self {
        Self {
            program: config.wkhtmltopdf_path.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    async fn run(&self, html: &str) -> std::result::Result<Vec<u8>, RenderError> {
        let mut child = Command::new(&self.program)
            .args(["--quiet", "--encoding", "utf-8", "-", "-"])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| RenderError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(html.as_bytes()).await?;
            stdin.shutdown().await?;
        }

        let output = child.wait_with_output().await?;
        if !output.status.success() {
            return Err(RenderError::Failed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(output.stdout)
    }
}

#[async_trait]
impl PdfRenderer for WkhtmltopdfRenderer {
    async fn render(&self, html: &str) -> std::result::Result<Vec<u8>, RenderError> {
        debug!(program = %self.program, bytes = html.len(), "rendering report");
        tokio::time::timeout(self.timeout, self.run(html))
            .await
            .map_err(|_| RenderError::Timeout(self.timeout.as_secs()))?
    }
}

/// Attachment name for a report generated at `now`.
pub fn report_filename(now: DateTime<Utc>) -> String {
    format!("shoplens_report_{}.pdf", now.timestamp_millis())
}

const STYLE: &str = "body{font-family:sans-serif;margin:32px;}h1{font-size:22px;}\
h2{font-size:16px;border-bottom:1px solid #ccc;}\
table{border-collapse:collapse;width:100%;}td,th{border:1px solid #ddd;padding:4px;}\
.advice{white-space:pre-wrap;}";

/// Scores shown in the report: supplied axes over [`DEFAULT_SCORE`].
fn report_scores(analysis: &AnalysisResult) -> DiagnosticScores {
    let baseline = DiagnosticScores {
        sns_score: DEFAULT_SCORE,
        structure_score: DEFAULT_SCORE,
        ux_score: DEFAULT_SCORE,
        app_score: DEFAULT_SCORE,
        theme_score: DEFAULT_SCORE,
    };
    analysis
        .diagnostic_scores
        .map_or(baseline, |supplied| supplied.over(baseline))
}

/// Lay out the report document.
pub fn render_html(
    url: &str,
    analysis: &AnalysisResult,
    advice: &str,
    generated_at: DateTime<Utc>,
) -> Markup {
    let scores = report_scores(analysis);
    let score_rows = [
        ("SNS", scores.sns_score),
        ("サイト構造", scores.structure_score),
        ("UX", scores.ux_score),
        ("アプリ", scores.app_score),
        ("テーマ", scores.theme_score),
    ];

    let mut social_links: Vec<(String, String)> = Vec::new();
    if let Some(social) = &analysis.social_links {
        for (name, link) in [("Instagram", &social.instagram), ("Twitter", &social.twitter)] {
            if let Some(link) = link.as_deref().filter(|l| !l.is_empty()) {
                social_links.push((name.to_string(), link.to_string()));
            }
        }
        for (name, value) in &social.other {
            if let Some(link) = value.as_str().filter(|l| !l.is_empty()) {
                social_links.push((name.clone(), link.to_string()));
            }
        }
    }

    html! {
        (DOCTYPE)
        html lang="ja" {
            head {
                meta charset="utf-8";
                title { "ShopLens レポート" }
                style { (PreEscaped(STYLE)) }
            }
            body {
                h1 { "ECサイト分析レポート" }
                p { "URL: " (url) }
                p { "作成日時: " (generated_at.format("%Y年%m月%d日 %H:%M UTC").to_string()) }

                h2 { "商品" }
                @if analysis.product_names.is_empty() {
                    p { "商品情報はありません。" }
                } @else {
                    table {
                        tr { th { "商品名" } th { "価格" } }
                        @for (i, name) in analysis.product_names.iter().enumerate() {
                            tr {
                                td { (name) }
                                td { (analysis.prices.get(i).map(String::as_str).unwrap_or("-")) }
                            }
                        }
                    }
                }

                @if !analysis.category_links.is_empty() {
                    h2 { "カテゴリー" }
                    ul {
                        @for link in &analysis.category_links {
                            li { (link) }
                        }
                    }
                }

                h2 { "アドバイス" }
                div.advice { (advice) }

                @if let Some(cs) = &analysis.competitor_summary {
                    h2 { "競合サマリー" }
                    ul {
                        li { "商品数: " (cs.product_count) }
                        li { "カテゴリー数: " (cs.category_count) }
                        @if let Some(range) = &cs.price_range {
                            li { "価格帯: " (range) }
                        }
                        @if let Some(avg) = &cs.average_price {
                            li { "平均価格: " (avg) }
                        }
                        @if let Some(theme) = &cs.theme {
                            li { "テーマ: " (theme) }
                        }
                    }
                }

                @if !social_links.is_empty() {
                    h2 { "SNS" }
                    ul {
                        @for (name, link) in &social_links {
                            li { (name) ": " (link) }
                        }
                    }
                }

                h2 { "診断スコア" }
                table {
                    @for (label, value) in score_rows {
                        tr { th { (label) } td { (format!("{value:.1}")) } }
                    }
                }
                footer {
                    p { "© " (generated_at.format("%Y").to_string()) " ShopLens" }
                }
            }
        }
    }
}
