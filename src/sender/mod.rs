use teloxide::prelude::*;
use teloxide::types::{ChatId, ParseMode};
use teloxide::utils::markdown;

use crate::error::SendError;
use crate::newsapi::prelude::Article;

/// Outbound chat transport. One message per call, MarkdownV2 rendering.
pub trait MessageSink {
    async fn send_markdown(&self, recipient: i64, text: &str) -> Result<(), SendError>;
}

pub struct TelegramSink {
    bot: Bot,
}

impl TelegramSink {
    #[must_use]
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

impl MessageSink for TelegramSink {
    async fn send_markdown(&self, recipient: i64, text: &str) -> Result<(), SendError> {
        self.bot
            .send_message(ChatId(recipient), text)
            .parse_mode(ParseMode::MarkdownV2)
            .send()
            .await?;

        Ok(())
    }
}

/// Render one article as bold title, plain description and a link.
#[must_use]
pub fn format_article(article: &Article) -> String {
    format!(
        "*{title}*\n{description}\n[Read more]({url})",
        title = markdown::escape(&article.title),
        description = markdown::escape(&article.description),
        url = markdown::escape_link_url(&article.url),
    )
}

/// Render the on-demand digest for a /news reply.
#[must_use]
pub fn format_digest(articles: &[Article]) -> String {
    articles
        .iter()
        .map(format_article)
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// The notice a subscriber gets when a cycle finds nothing new.
#[must_use]
pub fn format_nothing_new(category: &str) -> String {
    format!("*No new articles yet* for {}", markdown::escape(category))
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::DateTime;

    fn article() -> Article {
        Article {
            title: String::from("Rust 2.0 released!"),
            description: String::from("Not really."),
            url: String::from("https://example.com/rust-2.0"),
            published_at: DateTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn article_rendering_escapes_markdown() {
        let rendered = format_article(&article());
        assert!(rendered.starts_with("*Rust 2\\.0 released\\!*"));
        assert!(rendered.contains("Not really\\."));
        assert!(rendered.contains("[Read more](https://example.com/rust-2.0)"));
    }

    #[test]
    fn digest_joins_articles_with_blank_lines() {
        let rendered = format_digest(&[article(), article()]);
        assert_eq!(rendered.matches("[Read more]").count(), 2);
        assert!(rendered.contains("\n\n"));
    }

    #[test]
    fn nothing_new_notice_names_the_category() {
        assert_eq!(
            format_nothing_new("technology"),
            "*No new articles yet* for technology"
        );
    }
}
