use std::sync::{Arc, Mutex};

use diesel::dsl::exists;
use diesel::prelude::*;

use crate::error::StoreError;
use crate::schemas::prelude::{run_migrations, sent_articles, subscriptions, users};

/// DB Model: a user's subscription to one news category
#[derive(Debug, Clone, PartialEq, Queryable, Selectable)]
#[diesel(table_name = subscriptions)]
pub struct Subscription {
    pub user_id: i64,
    pub category: String,
}

/// Durable set of article URLs that have already gone out. Append-only;
/// a URL recorded under one category is never re-sent under another.
pub trait SentArticleLedger {
    fn is_sent(&self, article_url: &str) -> Result<bool, StoreError>;
    fn record_sent(&self, article_url: &str, article_category: &str) -> Result<(), StoreError>;
}

/// Durable user -> categories mapping, written by the command layer and
/// read back as a full listing by the delivery fanout.
pub trait SubscriptionDirectory {
    fn save_subscription(&self, subscriber: i64, category: &str) -> Result<(), StoreError>;
    fn categories_for(&self, subscriber: i64) -> Result<Vec<String>, StoreError>;
    fn all_subscriptions(&self) -> Result<Vec<Subscription>, StoreError>;
}

pub fn establish_connection(database_url: &str) -> SqliteConnection {
    SqliteConnection::establish(database_url)
        .unwrap_or_else(|e| panic!("Error connecting to {database_url} with {e}"))
}

/// Both stores live in one sqlite database behind a shared connection.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<SqliteConnection>>,
}

impl Database {
    /// Open (or create) the database and bring the schema up to date.
    pub fn open(database_url: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let mut conn = establish_connection(database_url);
        run_migrations(&mut conn).map_err(|e| -> Box<dyn std::error::Error> { e })?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }
}

impl SentArticleLedger for Database {
    fn is_sent(&self, article_url: &str) -> Result<bool, StoreError> {
        let conn = &mut *self.conn.lock().expect("database mutex poisoned");
        let found: bool = diesel::select(exists(
            sent_articles::table.filter(sent_articles::url.eq(article_url)),
        ))
        .get_result(conn)?;
        Ok(found)
    }

    /// Re-recording an existing URL is a no-op, not an error.
    fn record_sent(&self, article_url: &str, article_category: &str) -> Result<(), StoreError> {
        let conn = &mut *self.conn.lock().expect("database mutex poisoned");
        diesel::insert_or_ignore_into(sent_articles::table)
            .values((
                sent_articles::url.eq(article_url),
                sent_articles::category.eq(article_category),
                sent_articles::sent_at.eq(chrono::Utc::now().timestamp()),
            ))
            .execute(conn)?;
        Ok(())
    }
}

impl SubscriptionDirectory for Database {
    /// Upserts the user row alongside the subscription; saving the same
    /// (user, category) pair twice leaves a single row.
    fn save_subscription(&self, subscriber: i64, category: &str) -> Result<(), StoreError> {
        let conn = &mut *self.conn.lock().expect("database mutex poisoned");
        diesel::insert_or_ignore_into(users::table)
            .values(users::id.eq(subscriber))
            .execute(conn)?;
        diesel::insert_or_ignore_into(subscriptions::table)
            .values((
                subscriptions::user_id.eq(subscriber),
                subscriptions::category.eq(category),
            ))
            .execute(conn)?;
        Ok(())
    }

    fn categories_for(&self, subscriber: i64) -> Result<Vec<String>, StoreError> {
        let conn = &mut *self.conn.lock().expect("database mutex poisoned");
        let categories = subscriptions::table
            .filter(subscriptions::user_id.eq(subscriber))
            .select(subscriptions::category)
            .load::<String>(conn)?;
        Ok(categories)
    }

    fn all_subscriptions(&self) -> Result<Vec<Subscription>, StoreError> {
        let conn = &mut *self.conn.lock().expect("database mutex poisoned");
        let listing = subscriptions::table
            .select(Subscription::as_select())
            .load(conn)?;
        Ok(listing)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn test_db() -> Database {
        Database::open(":memory:").expect("in-memory database")
    }

    fn sent_rows(db: &Database) -> i64 {
        let conn = &mut *db.conn.lock().unwrap();
        sent_articles::table.count().get_result(conn).unwrap()
    }

    #[test]
    fn recording_twice_keeps_a_single_row() {
        let db = test_db();
        assert!(!db.is_sent("https://example.com/a").unwrap());

        db.record_sent("https://example.com/a", "technology").unwrap();
        assert!(db.is_sent("https://example.com/a").unwrap());
        assert_eq!(sent_rows(&db), 1);

        // idempotent: same URL again, even under another category
        db.record_sent("https://example.com/a", "science").unwrap();
        assert!(db.is_sent("https://example.com/a").unwrap());
        assert_eq!(sent_rows(&db), 1);
    }

    #[test]
    fn urls_are_tracked_independently() {
        let db = test_db();
        db.record_sent("https://example.com/a", "technology").unwrap();
        assert!(!db.is_sent("https://example.com/b").unwrap());
    }

    #[test]
    fn duplicate_subscription_is_a_noop() {
        let db = test_db();
        db.save_subscription(7, "technology").unwrap();
        db.save_subscription(7, "technology").unwrap();

        let listing = db.all_subscriptions().unwrap();
        assert_eq!(listing.len(), 1);
        assert_eq!(listing[0].user_id, 7);
        assert_eq!(listing[0].category, "technology");
    }

    #[test]
    fn one_user_row_for_many_subscriptions() {
        let db = test_db();
        db.save_subscription(7, "technology").unwrap();
        db.save_subscription(7, "science").unwrap();

        let conn = &mut *db.conn.lock().unwrap();
        let user_rows: i64 = users::table.count().get_result(conn).unwrap();
        assert_eq!(user_rows, 1);
    }

    #[test]
    fn categories_are_listed_per_user() {
        let db = test_db();
        db.save_subscription(7, "technology").unwrap();
        db.save_subscription(7, "health").unwrap();
        db.save_subscription(8, "business").unwrap();

        let mut categories = db.categories_for(7).unwrap();
        categories.sort();
        assert_eq!(categories, vec!["health", "technology"]);
        assert_eq!(db.categories_for(9).unwrap(), Vec::<String>::new());

        assert_eq!(db.all_subscriptions().unwrap().len(), 3);
    }
}
