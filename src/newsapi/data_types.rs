use chrono::{DateTime, Utc};
use serde::Deserialize;

/// A news article as the rest of the crate sees it. Immutable once fetched.
#[derive(Debug, Clone, PartialEq)]
pub struct Article {
    pub title: String,
    pub description: String,
    pub url: String,
    pub published_at: DateTime<Utc>,
}

/// An article as it arrives from the provider; every field may be missing.
#[derive(Debug, Deserialize)]
pub struct JsonArticle {
    title: Option<String>,
    description: Option<String>,
    url: Option<String>,
    #[serde(rename = "publishedAt")]
    published_at: Option<String>,
}

/// The top-headlines response envelope. `status` is "ok" on success; error
/// responses carry a different status and usually no articles.
#[derive(Debug, Deserialize)]
pub struct TopHeadlinesResponse {
    pub status: String,
    #[serde(default)]
    pub articles: Vec<JsonArticle>,
}

impl JsonArticle {
    /// An unparseable or missing timestamp falls back to the epoch, so the
    /// article sorts last instead of being dropped.
    pub fn as_article(&self) -> Article {
        let published_at = self
            .published_at
            .as_deref()
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
            .map(|parsed| parsed.with_timezone(&Utc))
            .unwrap_or(DateTime::UNIX_EPOCH);

        Article {
            title: self.title.clone().unwrap_or_default(),
            description: self.description.clone().unwrap_or_default(),
            url: self.url.clone().unwrap_or_default(),
            published_at,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn missing_fields_are_defaulted() {
        let raw: JsonArticle = serde_json::from_str(r#"{"title": "Only a title"}"#).unwrap();
        let article = raw.as_article();
        assert_eq!(article.title, "Only a title");
        assert_eq!(article.description, "");
        assert_eq!(article.url, "");
        assert_eq!(article.published_at, DateTime::UNIX_EPOCH);
    }

    #[test]
    fn published_at_is_parsed() {
        let raw: JsonArticle = serde_json::from_str(
            r#"{
                "title": "T",
                "description": "D",
                "url": "https://example.com/t",
                "publishedAt": "2025-01-02T03:04:05Z"
            }"#,
        )
        .unwrap();
        let article = raw.as_article();
        assert_eq!(article.published_at.timestamp(), 1_735_787_045);
    }

    #[test]
    fn garbage_timestamp_falls_back_to_epoch() {
        let raw: JsonArticle =
            serde_json::from_str(r#"{"title": "T", "publishedAt": "yesterday-ish"}"#).unwrap();
        assert_eq!(raw.as_article().published_at, DateTime::UNIX_EPOCH);
    }
}
