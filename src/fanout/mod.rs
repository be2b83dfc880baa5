use std::collections::BTreeMap;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::digest::DigestEngine;
use crate::newsapi::prelude::NewsSource;
use crate::repository::{SentArticleLedger, SubscriptionDirectory};
use crate::sender::{format_article, format_nothing_new, MessageSink};

/// Pushes each category's new articles to every subscriber of that category.
/// The digest for a category is computed once and shared by its subscribers.
pub struct DeliveryFanout<S, L, D, M> {
    engine: DigestEngine<S, L>,
    directory: D,
    sink: M,
    digest_size: usize,
}

impl<S, L, D, M> DeliveryFanout<S, L, D, M>
where
    S: NewsSource,
    L: SentArticleLedger,
    D: SubscriptionDirectory,
    M: MessageSink,
{
    pub fn new(engine: DigestEngine<S, L>, directory: D, sink: M, digest_size: usize) -> Self {
        Self {
            engine,
            directory,
            sink,
            digest_size,
        }
    }

    /// One delivery pass over all categories with at least one subscriber.
    /// Failures are contained: a failing category or recipient never stops
    /// the rest of the cycle; only an unreadable directory abandons it.
    pub async fn run_cycle(&self) {
        info!("checking for new articles");

        let subscriptions = match self.directory.all_subscriptions() {
            Ok(subscriptions) => subscriptions,
            Err(e) => {
                error!("could not load subscriptions, abandoning this cycle: {e}");
                return;
            }
        };

        let mut subscribers_by_category: BTreeMap<String, Vec<i64>> = BTreeMap::new();
        for subscription in subscriptions {
            subscribers_by_category
                .entry(subscription.category)
                .or_default()
                .push(subscription.user_id);
        }

        for (category, subscribers) in subscribers_by_category {
            let batch = match self
                .engine
                .compute_new_articles(&category, self.digest_size)
                .await
            {
                Ok(batch) => batch,
                Err(e) => {
                    warn!("skipping category {category} this cycle: {e}");
                    continue;
                }
            };

            for subscriber in subscribers {
                if batch.is_empty() {
                    let notice = format_nothing_new(&category);
                    if let Err(e) = self.sink.send_markdown(subscriber, &notice).await {
                        warn!("could not notify {subscriber} about {category}: {e}");
                    }
                    continue;
                }

                for article in &batch {
                    if let Err(e) = self.sink.send_markdown(subscriber, &format_article(article)).await
                    {
                        warn!("could not deliver {} to {subscriber}: {e}", article.url);
                    }
                }
            }
        }
    }
}

/// Trigger a delivery cycle on a fixed interval until shutdown is signalled.
/// Cycles run inline on this task, so the next tick is only awaited after the
/// current cycle finished and cycles never overlap.
pub async fn run_scheduler<S, L, D, M>(
    fanout: DeliveryFanout<S, L, D, M>,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) where
    S: NewsSource,
    L: SentArticleLedger,
    D: SubscriptionDirectory,
    M: MessageSink,
{
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    // the first tick completes immediately; wait a full period instead
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => fanout.run_cycle().await,
            _ = shutdown.changed() => {
                info!("news checker stopped");
                return;
            }
        }
    }
}
