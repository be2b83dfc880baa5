use url::Url;

use crate::config::NewsApiConfig;
use crate::error::FetchError;

use super::data_types::{Article, JsonArticle, TopHeadlinesResponse};

/// Where the current top articles for a category come from.
pub trait NewsSource {
    async fn top_articles(&self, category: &str) -> Result<Vec<Article>, FetchError>;
}

#[derive(Clone)]
pub struct NewsFetcher {
    api_key: String,
    api_base_url: String,
    client: reqwest::Client,
}

impl NewsFetcher {
    #[must_use]
    /// Create a new fetcher with the given provider credentials
    pub fn new(config: &NewsApiConfig) -> NewsFetcher {
        const API_BASE_URL: &str = "https://newsapi.org/v2";
        Self {
            api_key: config.api_key.clone(),
            api_base_url: API_BASE_URL.to_string(),
            client: reqwest::Client::new(),
        }
    }

    #[allow(dead_code)]
    fn with_base_url(&mut self, base_url: String) -> &mut Self {
        self.api_base_url = base_url;
        self
    }
}

impl NewsSource for NewsFetcher {
    /// Fetch the category's top headlines. Non-success transport statuses and
    /// provider-level rejections both fail the whole fetch; articles that
    /// arrive without a URL are dropped since they can never be deduplicated.
    async fn top_articles(&self, category: &str) -> Result<Vec<Article>, FetchError> {
        let endpoint = Url::parse_with_params(
            &format!("{}/top-headlines", self.api_base_url),
            &[("category", category), ("apiKey", self.api_key.as_str())],
        )?;

        let response = self.client.get(endpoint).send().await?;
        if !response.status().is_success() {
            return Err(FetchError::Status(response.status()));
        }

        let payload = response.json::<TopHeadlinesResponse>().await?;
        if payload.status != "ok" {
            return Err(FetchError::Provider(payload.status));
        }

        Ok(payload
            .articles
            .iter()
            .map(JsonArticle::as_article)
            .filter(|article| !article.url.is_empty())
            .collect())
    }
}
