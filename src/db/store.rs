use std::sync::Arc;

use chrono::Utc;
use rusqlite::{params, Row};
use tokio::sync::watch;
use tokio_rusqlite::Connection;

use crate::error::{AppError, Result};
use crate::models::Article;

use super::schema::SCHEMA;

/// Row shape of the local `articles` table. Presence of a row is the sole
/// saved-state signal; there is no separate flag column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredArticle {
    pub author: Option<String>,
    pub content: Option<String>,
    pub description: Option<String>,
    pub published_at: Option<String>,
    pub source_name: Option<String>,
    pub title: Option<String>,
    pub url: String,
    pub url_to_image: Option<String>,
    /// Insert-time bookkeeping, epoch milliseconds. Not consumed by any
    /// read path beyond ordering.
    pub timestamp: i64,
}

impl StoredArticle {
    /// Domain model to row. The URL is the primary key, so an article
    /// without one cannot be persisted.
    pub fn from_article(article: &Article) -> Result<Self> {
        let url = article.url.clone().ok_or(AppError::MissingUrl)?;
        Ok(Self {
            author: article.author.clone(),
            content: article.content.clone(),
            description: article.description.clone(),
            published_at: article.published_at.clone(),
            source_name: article.source_name.clone(),
            title: article.title.clone(),
            url,
            url_to_image: article.url_to_image.clone(),
            timestamp: Utc::now().timestamp_millis(),
        })
    }

    /// Row to domain model; anything read back from the store is saved.
    pub fn to_article(&self) -> Article {
        Article {
            author: self.author.clone(),
            content: self.content.clone(),
            description: self.description.clone(),
            published_at: self.published_at.clone(),
            source_name: self.source_name.clone(),
            title: self.title.clone(),
            url: Some(self.url.clone()),
            url_to_image: self.url_to_image.clone(),
            is_saved: true,
        }
    }
}

/// Persistent store of saved articles plus a snapshot channel: every
/// committed write re-queries the table and publishes the fresh snapshot
/// to all subscribers. The publish happens inside the serialized
/// connection call, so subscribers observe snapshots in write order, and
/// the value is stored even while no subscriber is attached so that late
/// subscribers are seeded with the current table contents.
pub struct ArticleStore {
    conn: Connection,
    snapshots: Arc<watch::Sender<Vec<StoredArticle>>>,
}

impl ArticleStore {
    pub async fn open(db_path: &str) -> Result<Self> {
        let conn = Connection::open(db_path).await?;
        Self::init(conn).await
    }

    /// In-memory store, used by tests.
    pub async fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().await?;
        Self::init(conn).await
    }

    async fn init(conn: Connection) -> Result<Self> {
        let initial = conn
            .call(|conn| {
                conn.execute_batch(SCHEMA)?;
                Ok(query_all(conn)?)
            })
            .await?;

        let (snapshots, _) = watch::channel(initial);

        Ok(Self {
            conn,
            snapshots: Arc::new(snapshots),
        })
    }

    /// Insert-if-absent: a row with the same URL already present wins and
    /// the new data is discarded.
    pub async fn insert(&self, article: StoredArticle) -> Result<()> {
        let snapshots = Arc::clone(&self.snapshots);
        self.conn
            .call(move |conn| {
                let changed = conn.execute(
                    r#"INSERT OR IGNORE INTO articles
                       (url, author, content, description, published_at, source_name, title, url_to_image, timestamp)
                       VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"#,
                    params![
                        article.url,
                        article.author,
                        article.content,
                        article.description,
                        article.published_at,
                        article.source_name,
                        article.title,
                        article.url_to_image,
                        article.timestamp,
                    ],
                )?;
                if changed > 0 {
                    snapshots.send_replace(query_all(conn)?);
                }
                Ok(())
            })
            .await?;
        Ok(())
    }

    /// Delete by URL; absent rows make this a no-op.
    pub async fn delete(&self, url: &str) -> Result<()> {
        let url = url.to_string();
        let snapshots = Arc::clone(&self.snapshots);
        self.conn
            .call(move |conn| {
                let changed = conn.execute("DELETE FROM articles WHERE url = ?1", params![url])?;
                if changed > 0 {
                    snapshots.send_replace(query_all(conn)?);
                }
                Ok(())
            })
            .await?;
        Ok(())
    }

    pub async fn exists_by_url(&self, url: &str) -> Result<bool> {
        let url = url.to_string();
        let exists = self
            .conn
            .call(move |conn| {
                let count: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM articles WHERE url = ?1",
                    params![url],
                    |row| row.get(0),
                )?;
                Ok(count > 0)
            })
            .await?;
        Ok(exists)
    }

    /// Subscribe to table snapshots. The receiver is seeded with the
    /// current contents; dropping it cancels the subscription.
    pub fn observe_all(&self) -> watch::Receiver<Vec<StoredArticle>> {
        self.snapshots.subscribe()
    }

    /// Saved rows only. In the single-table design presence is the saved
    /// signal, so this is the same snapshot channel as `observe_all`.
    pub fn observe_saved(&self) -> watch::Receiver<Vec<StoredArticle>> {
        self.snapshots.subscribe()
    }
}

fn query_all(conn: &rusqlite::Connection) -> rusqlite::Result<Vec<StoredArticle>> {
    let mut stmt = conn.prepare(
        r#"SELECT url, author, content, description, published_at, source_name, title, url_to_image, timestamp
           FROM articles ORDER BY timestamp DESC, url"#,
    )?;
    let articles = stmt
        .query_map([], |row| Ok(stored_article_from_row(row)))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(articles)
}

fn stored_article_from_row(row: &Row) -> StoredArticle {
    StoredArticle {
        url: row.get(0).unwrap(),
        author: row.get(1).unwrap(),
        content: row.get(2).unwrap(),
        description: row.get(3).unwrap(),
        published_at: row.get(4).unwrap(),
        source_name: row.get(5).unwrap(),
        title: row.get(6).unwrap(),
        url_to_image: row.get(7).unwrap(),
        timestamp: row.get(8).unwrap(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored(url: &str, title: &str) -> StoredArticle {
        StoredArticle {
            author: Some("J. Doe".to_string()),
            content: Some("C".to_string()),
            description: Some("D".to_string()),
            published_at: Some("2024-01-01T00:00:00Z".to_string()),
            source_name: Some("BBC".to_string()),
            title: Some(title.to_string()),
            url: url.to_string(),
            url_to_image: None,
            timestamp: 0,
        }
    }

    #[tokio::test]
    async fn insert_then_exists() {
        let store = ArticleStore::open_in_memory().await.unwrap();
        store.insert(stored("https://a", "T")).await.unwrap();
        assert!(store.exists_by_url("https://a").await.unwrap());
        assert!(!store.exists_by_url("https://b").await.unwrap());
    }

    #[tokio::test]
    async fn duplicate_insert_keeps_first_row() {
        let store = ArticleStore::open_in_memory().await.unwrap();
        store.insert(stored("https://a", "first")).await.unwrap();
        store.insert(stored("https://a", "second")).await.unwrap();

        let rows = store.observe_all().borrow().clone();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].title.as_deref(), Some("first"));
    }

    #[tokio::test]
    async fn delete_removes_row_and_absent_delete_is_noop() {
        let store = ArticleStore::open_in_memory().await.unwrap();
        store.insert(stored("https://a", "T")).await.unwrap();

        store.delete("https://a").await.unwrap();
        assert!(!store.exists_by_url("https://a").await.unwrap());

        // Deleting again must not fail or alter anything.
        store.delete("https://a").await.unwrap();
        assert!(store.observe_all().borrow().is_empty());
    }

    #[tokio::test]
    async fn observers_receive_snapshots_in_write_order() {
        let store = ArticleStore::open_in_memory().await.unwrap();
        let mut rx = store.observe_all();
        assert!(rx.borrow_and_update().is_empty());

        store.insert(stored("https://a", "T")).await.unwrap();
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().len(), 1);

        store.delete("https://a").await.unwrap();
        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().is_empty());
    }

    #[tokio::test]
    async fn subscriber_attached_after_write_is_seeded_with_current_state() {
        let store = ArticleStore::open_in_memory().await.unwrap();

        // Writes land before anyone subscribes.
        store.insert(stored("https://a", "T")).await.unwrap();
        store.insert(stored("https://b", "U")).await.unwrap();
        store.delete("https://b").await.unwrap();

        let rx = store.observe_all();
        let snapshot = rx.borrow().clone();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].url, "https://a");
    }

    #[tokio::test]
    async fn noop_writes_do_not_publish() {
        let store = ArticleStore::open_in_memory().await.unwrap();
        store.insert(stored("https://a", "T")).await.unwrap();

        let mut rx = store.observe_all();
        rx.borrow_and_update();

        // Duplicate insert and absent delete leave the table unchanged.
        store.insert(stored("https://a", "T")).await.unwrap();
        store.delete("https://missing").await.unwrap();
        assert!(!rx.has_changed().unwrap());
    }

    #[tokio::test]
    async fn mapping_round_trip_preserves_fields() {
        let row = stored("https://a", "T");
        let article = row.to_article();
        assert!(article.is_saved);

        let back = StoredArticle::from_article(&article).unwrap();
        assert_eq!(back.url, row.url);
        assert_eq!(back.title, row.title);
        assert_eq!(back.author, row.author);
        assert_eq!(back.description, row.description);
        assert_eq!(back.content, row.content);
        assert_eq!(back.published_at, row.published_at);
        assert_eq!(back.source_name, row.source_name);
        assert_eq!(back.url_to_image, row.url_to_image);
    }

    #[test]
    fn from_article_requires_url() {
        let article = Article {
            title: Some("T".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            StoredArticle::from_article(&article),
            Err(AppError::MissingUrl)
        ));
    }

    #[tokio::test]
    async fn reopening_on_disk_store_preserves_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("articles.db");
        let path = path.to_str().unwrap();

        {
            let store = ArticleStore::open(path).await.unwrap();
            store.insert(stored("https://a", "T")).await.unwrap();
        }

        let store = ArticleStore::open(path).await.unwrap();
        assert!(store.exists_by_url("https://a").await.unwrap());
    }
}
