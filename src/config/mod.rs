use serde::Deserialize;

const DEFAULT_CHECK_INTERVAL_SECS: u64 = 300;
const DEFAULT_DIGEST_SIZE: usize = 5;

#[derive(Clone, Deserialize)]
pub struct TelegramConfig {
    pub token: String,
}

#[derive(Clone, Deserialize)]
pub struct NewsApiConfig {
    pub api_key: String,
}

#[derive(Clone, Deserialize)]
pub struct AppConfig {
    pub db_dsn: String,
    pub telegram: TelegramConfig,
    pub newsapi: NewsApiConfig,
    /// Categories a user may subscribe to, in the order they are shown.
    #[serde(default = "default_categories")]
    pub categories: Vec<String>,
    #[serde(default = "default_check_interval")]
    pub check_interval_secs: u64,
    /// Upper bound on articles delivered per category per cycle.
    #[serde(default = "default_digest_size")]
    pub digest_size: usize,
}

fn default_categories() -> Vec<String> {
    ["technology", "business", "science", "health", "entertainment"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_check_interval() -> u64 {
    DEFAULT_CHECK_INTERVAL_SECS
}

fn default_digest_size() -> usize {
    DEFAULT_DIGEST_SIZE
}

impl AppConfig {
    pub fn from_file(file_name: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(file_name)?;
        let config: AppConfig = serde_json::from_str(&contents)?;

        Ok(config)
    }

    #[allow(dead_code)]
    pub fn from_str(contents: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let config: AppConfig = serde_json::from_str(contents)?;

        Ok(config)
    }

    #[must_use]
    pub fn is_allowed_category(&self, category: &str) -> bool {
        self.categories.iter().any(|allowed| allowed == category)
    }
}
