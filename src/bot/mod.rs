use std::sync::Arc;

use teloxide::dptree;
use teloxide::prelude::*;
use teloxide::types::ParseMode;
use teloxide::utils::command::BotCommands;
use tracing::error;

use crate::config::AppConfig;
use crate::newsapi::prelude::{NewsFetcher, NewsSource};
use crate::repository::{Database, SubscriptionDirectory};
use crate::sender::format_digest;

/// Everything a command handler needs, shared through the dispatcher.
pub struct BotState {
    pub config: AppConfig,
    pub db: Database,
    pub fetcher: NewsFetcher,
}

#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "Supported commands:")]
pub enum Command {
    #[command(description = "start receiving news")]
    Start,
    #[command(description = "subscribe to a news category")]
    Add(String),
    #[command(description = "show the current top articles for a category")]
    News(String),
    #[command(description = "list your subscriptions")]
    Mysubs,
    #[command(description = "show this help")]
    Help,
}

const WELCOME: &str = "Hello! This bot delivers news digests. \
Use /add to subscribe to a category, /news <category> for the current headlines, \
/mysubs to list your subscriptions and /help for the full command list.";

/// Run the long-polling command listener until the process is told to stop
/// (Ctrl-C). Updates are handled one at a time, in arrival order.
pub async fn run_listener(bot: Bot, state: Arc<BotState>) {
    let handler = Update::filter_message()
        .branch(
            dptree::entry()
                .filter_command::<Command>()
                .endpoint(handle_command),
        )
        .branch(dptree::endpoint(handle_unrecognized));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .distribution_function(|_| Some(()))
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}

async fn handle_command(
    bot: Bot,
    msg: Message,
    cmd: Command,
    state: Arc<BotState>,
) -> ResponseResult<()> {
    let chat_id = msg.chat.id;

    match cmd {
        Command::Start => {
            bot.send_message(chat_id, WELCOME).send().await?;
        }
        Command::Add(raw) => {
            let reply = add_subscription(&state, chat_id.0, &raw);
            bot.send_message(chat_id, reply).send().await?;
        }
        Command::News(raw) => {
            let category = raw.trim().to_lowercase();
            if category.is_empty() {
                bot.send_message(chat_id, "Please name a category (for example, /news technology).")
                    .send()
                    .await?;
                return Ok(());
            }
            // on-demand path: no deduplication, nothing is recorded
            match state.fetcher.top_articles(&category).await {
                Ok(articles) if articles.is_empty() => {
                    bot.send_message(chat_id, format!("No articles for '{category}' right now."))
                        .send()
                        .await?;
                }
                Ok(articles) => {
                    let digest: Vec<_> = articles
                        .into_iter()
                        .take(state.config.digest_size)
                        .collect();
                    bot.send_message(chat_id, format_digest(&digest))
                        .parse_mode(ParseMode::MarkdownV2)
                        .send()
                        .await?;
                }
                Err(e) => {
                    bot.send_message(chat_id, format!("Could not fetch news: {e}"))
                        .send()
                        .await?;
                }
            }
        }
        Command::Mysubs => {
            let reply = match state.db.categories_for(chat_id.0) {
                Ok(categories) if categories.is_empty() => {
                    String::from("You have no active subscriptions.")
                }
                Ok(categories) => format!("Your subscriptions:\n{}", categories.join("\n")),
                Err(e) => {
                    error!("could not list subscriptions for {chat_id}: {e}");
                    String::from("Could not load your subscriptions, please try again later.")
                }
            };
            bot.send_message(chat_id, reply).send().await?;
        }
        Command::Help => {
            bot.send_message(chat_id, Command::descriptions().to_string())
                .send()
                .await?;
        }
    }

    Ok(())
}

/// Validate against the allow-list and persist; the reply text is the whole
/// user-visible outcome.
fn add_subscription(state: &BotState, subscriber: i64, raw: &str) -> String {
    let category = raw.trim().to_lowercase();
    if category.is_empty() {
        return String::from("Please name a category (for example, /add technology).");
    }
    if !state.config.is_allowed_category(&category) {
        return format!(
            "Category '{category}' is not supported. Available categories: {}",
            state.config.categories.join(", ")
        );
    }
    match state.db.save_subscription(subscriber, &category) {
        Ok(()) => format!("You are now subscribed to '{category}'!"),
        Err(e) => {
            error!("could not save subscription for {subscriber}: {e}");
            String::from("Could not save the subscription, please try again later.")
        }
    }
}

async fn handle_unrecognized(bot: Bot, msg: Message) -> ResponseResult<()> {
    if msg.text().is_some_and(|text| text.starts_with('/')) {
        bot.send_message(msg.chat.id, "Unknown command. Use /help for the list of commands.")
            .send()
            .await?;
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::NewsApiConfig;

    fn test_state() -> BotState {
        let config = AppConfig::from_str(
            r#"{
                "db_dsn": ":memory:",
                "telegram": {"token": "123:abc"},
                "newsapi": {"api_key": "k"}
            }"#,
        )
        .unwrap();
        BotState {
            db: Database::open(":memory:").unwrap(),
            fetcher: NewsFetcher::new(&NewsApiConfig {
                api_key: config.newsapi.api_key.clone(),
            }),
            config,
        }
    }

    #[test]
    fn commands_are_parsed() {
        let cmd = Command::parse("/add technology", "newsbot").unwrap();
        assert!(matches!(cmd, Command::Add(category) if category == "technology"));

        let cmd = Command::parse("/mysubs", "newsbot").unwrap();
        assert!(matches!(cmd, Command::Mysubs));

        assert!(Command::parse("/bogus", "newsbot").is_err());
    }

    #[test]
    fn subscribing_to_a_known_category_is_saved() {
        let state = test_state();
        let reply = add_subscription(&state, 123, " Technology ");
        assert!(reply.contains("subscribed to 'technology'"));
        assert_eq!(state.db.categories_for(123).unwrap(), vec!["technology"]);
    }

    #[test]
    fn unknown_category_lists_the_allowed_ones() {
        let state = test_state();
        let reply = add_subscription(&state, 123, "sports");
        assert!(reply.contains("not supported"));
        assert!(reply.contains("technology, business, science, health, entertainment"));
        assert!(state.db.categories_for(123).unwrap().is_empty());
    }

    #[test]
    fn missing_category_asks_for_one() {
        let state = test_state();
        let reply = add_subscription(&state, 123, "  ");
        assert!(reply.contains("/add technology"));
    }
}
