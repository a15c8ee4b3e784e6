//! Typed view of a storefront analysis result, plus the values derived
//! from it when it is saved or reported.
//!
//! Analysis results arrive as loosely shaped JSON. Every field is read on
//! its own: a field with an unexpected shape reads as absent and leaves
//! its neighbours intact.

use crate::model::DiagnosticScores;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

/// Length of the stored advice preview, in characters.
pub const ADVICE_SUMMARY_CHARS: usize = 200;

/// Apps worth calling out with their own tag.
const NOTABLE_APPS: [&str; 4] = ["Klaviyo", "Judge.me", "Yotpo", "ReCharge"];

/// Themes that earn the modern-theme bonus.
const MODERN_THEMES: [&str; 4] = ["dawn", "expanse", "refresh", "sense"];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(default, deserialize_with = "lenient::strings")]
    pub product_names: Vec<String>,
    #[serde(default, deserialize_with = "lenient::strings")]
    pub prices: Vec<String>,
    #[serde(default, deserialize_with = "lenient::strings")]
    pub category_links: Vec<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub advice: Option<String>,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub competitor_summary: Option<CompetitorSummary>,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub social_links: Option<SocialLinks>,
    #[serde(default, deserialize_with = "lenient::optional_strings")]
    pub tags: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub notion_page_url: Option<String>,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub diagnostic_scores: Option<PartialScores>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompetitorSummary {
    #[serde(default, deserialize_with = "lenient::count")]
    pub product_count: u64,
    #[serde(default, deserialize_with = "lenient::count")]
    pub category_count: u64,
    #[serde(default, deserialize_with = "lenient::text")]
    pub price_range: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub average_price: Option<String>,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub collections: Option<Vec<Value>>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub page_type: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub theme: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional_strings")]
    pub apps: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub dom_elements: Option<BTreeMap<String, Value>>,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub features: Option<BTreeMap<String, Value>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SocialLinks {
    #[serde(default, deserialize_with = "lenient::text")]
    pub instagram: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub twitter: Option<String>,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub activity: Option<SocialActivity>,

    /// Other networks, reported but not scored.
    #[serde(flatten)]
    pub other: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SocialActivity {
    #[serde(default, deserialize_with = "lenient::strings")]
    pub hashtags: Vec<String>,
    #[serde(default)]
    pub instagram_posts: Option<Value>,
    #[serde(default)]
    pub twitter_followers: Option<Value>,
}

/// Scores supplied with an analysis. Any axis may be missing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PartialScores {
    #[serde(default, deserialize_with = "lenient::score")]
    pub sns_score: Option<f64>,
    #[serde(default, deserialize_with = "lenient::score")]
    pub structure_score: Option<f64>,
    #[serde(default, deserialize_with = "lenient::score")]
    pub ux_score: Option<f64>,
    #[serde(default, deserialize_with = "lenient::score")]
    pub app_score: Option<f64>,
    #[serde(default, deserialize_with = "lenient::score")]
    pub theme_score: Option<f64>,
}

impl PartialScores {
    /// Supplied axes, with `base` filling the missing ones.
    pub fn over(&self, base: DiagnosticScores) -> DiagnosticScores {
        DiagnosticScores {
            sns_score: self.sns_score.unwrap_or(base.sns_score),
            structure_score: self.structure_score.unwrap_or(base.structure_score),
            ux_score: self.ux_score.unwrap_or(base.ux_score),
            app_score: self.app_score.unwrap_or(base.app_score),
            theme_score: self.theme_score.unwrap_or(base.theme_score),
        }
    }
}

/// Field readers that turn a mistyped value into "absent".
mod lenient {
    use serde::de::{DeserializeOwned, Deserializer};
    use serde::Deserialize;
    use serde_json::Value;

    fn as_text(value: &Value) -> Option<String> {
        match value {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    fn as_strings(value: &Value) -> Option<Vec<String>> {
        value
            .as_array()
            .map(|items| items.iter().filter_map(as_text).collect())
    }

    pub fn or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned + Default,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(serde_json::from_value(value).unwrap_or_default())
    }

    /// Strings and numbers as text; anything else is absent.
    pub fn text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
        Ok(as_text(&Value::deserialize(deserializer)?))
    }

    /// Array of text items. Other items are skipped.
    pub fn strings<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
        Ok(as_strings(&Value::deserialize(deserializer)?).unwrap_or_default())
    }

    pub fn optional_strings<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Vec<String>>, D::Error> {
        Ok(as_strings(&Value::deserialize(deserializer)?))
    }

    /// Non-negative count from a number or numeric string, else 0.
    pub fn count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        let count = match Value::deserialize(deserializer)? {
            Value::Number(n) => n.as_u64().or_else(|| {
                n.as_f64()
                    .filter(|f| f.is_finite() && *f > 0.0)
                    .map(|f| f as u64)
            }),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        };
        Ok(count.unwrap_or(0))
    }

    pub fn score<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
        let score = match Value::deserialize(deserializer)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        };
        Ok(score.filter(|f| f.is_finite()))
    }
}

impl AnalysisResult {
    /// Read a raw analysis. Only a non-object input reads as empty.
    pub fn from_value(value: &Value) -> Self {
        match serde_json::from_value(value.clone()) {
            Ok(parsed) => parsed,
            Err(e) => {
                debug!("analysis result is not an object: {e}");
                Self::default()
            }
        }
    }

    pub fn advice(&self) -> Option<&str> {
        self.advice.as_deref().filter(|a| !a.trim().is_empty())
    }

    /// Tags carried by the analysis, or generated ones.
    pub fn tags_or_generated(&self, url: &str) -> Vec<String> {
        match &self.tags {
            Some(tags) if !tags.is_empty() => tags.clone(),
            _ => generate_tags(self, url),
        }
    }

    /// Supplied scores, with computed values for any missing axis.
    pub fn scores_or_computed(&self) -> DiagnosticScores {
        let computed = diagnostic_scores(self);
        match &self.diagnostic_scores {
            Some(supplied) => supplied.over(computed),
            None => computed,
        }
    }
}

/// JavaScript-style truthiness for loosely typed flags and counters.
fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn flag(map: Option<&BTreeMap<String, Value>>, key: &str) -> bool {
    map.and_then(|m| m.get(key)).is_some_and(truthy)
}

fn present(link: &Option<String>) -> bool {
    link.as_deref().is_some_and(|l| !l.is_empty())
}

/// `count * points`, capped at `cap`. Counts come from client JSON.
fn capped(count: u64, points: u64, cap: u64) -> u64 {
    count.saturating_mul(points).min(cap)
}

/// Five-axis storefront diagnosis on a 0 to 100 scale.
pub fn diagnostic_scores(analysis: &AnalysisResult) -> DiagnosticScores {
    let mut scores = DiagnosticScores::default();

    if let Some(social) = &analysis.social_links {
        let mut sns = 0u64;
        if present(&social.instagram) {
            sns += 30;
        }
        if present(&social.twitter) {
            sns += 20;
        }
        if let Some(activity) = &social.activity {
            sns += capped(activity.hashtags.len() as u64, 5, 20);
            if activity.instagram_posts.as_ref().is_some_and(truthy) {
                sns += 15;
            }
            if activity.twitter_followers.as_ref().is_some_and(truthy) {
                sns += 15;
            }
        }
        scores.sns_score = sns.min(100) as f64;
    }

    let Some(cs) = &analysis.competitor_summary else {
        return scores;
    };

    let collections = cs.collections.as_ref().map_or(0, Vec::len) as u64;
    let structure = capped(cs.product_count, 3, 30)
        + capped(cs.category_count, 5, 40)
        + capped(collections, 6, 30);
    scores.structure_score = structure.min(100) as f64;

    if let Some(dom) = &cs.dom_elements {
        let dom = Some(dom);
        let features = cs.features.as_ref();
        let mut ux = 0u64;
        for (key, points) in [
            ("add_to_cart", 20),
            ("buy_now", 15),
            ("product_variants", 15),
            ("product_description", 15),
            ("product_images", 15),
        ] {
            if flag(dom, key) {
                ux += points;
            }
        }
        for key in ["search", "cart", "reviews", "wishlist"] {
            if flag(features, key) {
                ux += 5;
            }
        }
        scores.ux_score = ux.min(100) as f64;
    }

    if let Some(apps) = &cs.apps {
        scores.app_score = capped(apps.len() as u64, 20, 100) as f64;
    }

    if let Some(theme) = cs.theme.as_deref().filter(|t| !t.is_empty()) {
        let theme = theme.to_lowercase();
        let mut points = 70u64;
        if theme != "unknown" {
            points += 20;
            if MODERN_THEMES.contains(&theme.as_str()) {
                points += 10;
            }
        }
        scores.theme_score = points.min(100) as f64;
    }

    scores
}

/// Storefront host without a leading `www.`.
pub fn domain_of(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    let host = parsed.host_str()?;
    Some(host.strip_prefix("www.").unwrap_or(host).to_string())
}

/// Search tags for a saved analysis, without duplicates.
pub fn generate_tags(analysis: &AnalysisResult, url: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    let mut push = |tag: String| {
        if !tags.contains(&tag) {
            tags.push(tag);
        }
    };

    if let Some(domain) = domain_of(url) {
        push(domain);
    }
    push("EC分析".to_string());

    if let Some(cs) = &analysis.competitor_summary {
        if let Some(page_type) = cs.page_type.as_deref().filter(|p| !p.is_empty()) {
            push(format!("{page_type}ページ"));
        }
        if cs.product_count > 0 {
            push("商品あり".to_string());
        }
        if cs.category_count > 0 {
            push("カテゴリー構造".to_string());
        }

        let features = cs.features.as_ref();
        for (key, tag) in [("search", "検索機能"), ("reviews", "レビュー機能"), ("cart", "カート機能")] {
            if flag(features, key) {
                push(tag.to_string());
            }
        }

        if let Some(theme) = cs.theme.as_deref() {
            if !theme.is_empty() && !theme.eq_ignore_ascii_case("unknown") {
                push(format!("テーマ:{theme}"));
            }
        }

        if let Some(apps) = cs.apps.as_ref().filter(|a| !a.is_empty()) {
            push("アプリあり".to_string());
            for app in apps.iter().filter(|a| NOTABLE_APPS.contains(&a.as_str())) {
                push(format!("App:{app}"));
            }
        }
    }

    if let Some(social) = &analysis.social_links {
        if present(&social.instagram) {
            push("Instagram".to_string());
        }
        if present(&social.twitter) {
            push("Twitter".to_string());
        }
    }

    tags
}

/// First [`ADVICE_SUMMARY_CHARS`] characters of the advice, with `...`
/// appended when cut.
pub fn advice_summary(advice: &str) -> String {
    let mut chars = advice.chars();
    let head: String = chars.by_ref().take(ADVICE_SUMMARY_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}
