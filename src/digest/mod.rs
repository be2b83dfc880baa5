use std::collections::HashSet;

use tracing::warn;

use crate::error::FetchError;
use crate::newsapi::prelude::{Article, NewsSource};
use crate::repository::SentArticleLedger;

/// Decides which of a category's current articles are actually new and
/// records the ones that are about to go out. Sole writer of the ledger.
pub struct DigestEngine<S, L> {
    source: S,
    ledger: L,
}

impl<S: NewsSource, L: SentArticleLedger> DigestEngine<S, L> {
    pub fn new(source: S, ledger: L) -> Self {
        Self { source, ledger }
    }

    /// Fetch the current articles for `category` and return the ones never
    /// delivered before, most recent first, capped at `max_articles`.
    ///
    /// A failed ledger lookup excludes only that article (under-delivery is
    /// preferred to a duplicate). A failed ledger write is logged but the
    /// article stays in the batch, so it is still delivered this cycle.
    pub async fn compute_new_articles(
        &self,
        category: &str,
        max_articles: usize,
    ) -> Result<Vec<Article>, FetchError> {
        let fetched = deduplicate(self.source.top_articles(category).await?);

        let mut fresh = Vec::new();
        for article in fetched {
            match self.ledger.is_sent(&article.url) {
                Ok(false) => fresh.push(article),
                Ok(true) => {}
                Err(e) => warn!("ledger lookup for {} failed, excluded: {e}", article.url),
            }
        }

        // Stable sort: equal timestamps keep the feed order.
        fresh.sort_by(|a, b| b.published_at.cmp(&a.published_at));
        fresh.truncate(max_articles);

        for article in &fresh {
            if let Err(e) = self.ledger.record_sent(&article.url, category) {
                warn!("could not record {} as sent: {e}", article.url);
            }
        }

        Ok(fresh)
    }
}

/// Collapse in-feed repeats of the same URL, keeping the first occurrence.
fn deduplicate(articles: Vec<Article>) -> Vec<Article> {
    let mut seen: HashSet<String> = HashSet::new();
    articles
        .into_iter()
        .filter(|article| seen.insert(article.url.clone()))
        .collect()
}
