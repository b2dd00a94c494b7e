use futures::stream::{self, Stream, StreamExt};

use crate::db::{ArticleStore, StoredArticle};
use crate::error::AppError;
use crate::error::Result;
use crate::models::{Article, Resource};
use crate::news::NewsClient;

/// One coherent API over the two article sources: the remote news API and
/// the local saved-article store. Remote reads are wrapped in the
/// tri-state `Resource`; saved-state is resolved purely by presence in the
/// store. Remote results are returned as fetched and are not reconciled
/// against the store here — callers cross-reference `is_article_saved`
/// when they need a saved indicator next to remote data.
pub struct NewsRepository {
    client: NewsClient,
    store: ArticleStore,
    country: String,
}

impl NewsRepository {
    pub fn new(client: NewsClient, store: ArticleStore, country: String) -> Self {
        Self {
            client,
            store,
            country,
        }
    }

    /// Loading, then exactly one fetch: search when the query is
    /// non-blank, top headlines otherwise. Remote failures terminate the
    /// stream as `Resource::Error`; they never escape as panics or `Err`.
    pub fn get_news(
        &self,
        query: Option<String>,
    ) -> impl Stream<Item = Resource<Vec<Article>>> {
        let client = self.client.clone();
        let country = self.country.clone();

        stream::once(async { Resource::Loading }).chain(stream::once(async move {
            let response = match query.as_deref().filter(|q| !q.trim().is_empty()) {
                Some(q) => client.search(q).await,
                None => client.top_headlines(&country).await,
            };

            match response {
                Ok(response) => {
                    let articles = response
                        .articles
                        .into_iter()
                        .map(|dto| dto.into_article())
                        .collect();
                    Resource::Success(articles)
                }
                Err(e) => {
                    tracing::error!("failed to fetch news: {e}");
                    Resource::Error(remote_error_message(&e))
                }
            }
        }))
    }

    /// Persist an article to the local store. Fails synchronously with
    /// `MissingUrl` when the article has no URL to key it by; a duplicate
    /// URL is a silent no-op (the existing row wins).
    pub async fn save_article(&self, article: &Article) -> Result<()> {
        let row = StoredArticle::from_article(article)?;
        tracing::debug!(url = %row.url, "saving article");
        self.store.insert(row).await
    }

    /// Delete an article from the local store by its URL. An article
    /// without a URL cannot be identified, so the call is a logged no-op
    /// rather than an error.
    pub async fn delete_article(&self, article: &Article) -> Result<()> {
        match article.url.as_deref() {
            Some(url) => self.store.delete(url).await,
            None => {
                tracing::warn!(
                    title = ?article.title,
                    "attempted to delete article without a URL"
                );
                Ok(())
            }
        }
    }

    /// Live projection of the saved rows. Emits the current snapshot
    /// immediately, then a fresh snapshot after every store change, until
    /// the consumer drops the stream.
    pub fn get_saved_articles(&self) -> impl Stream<Item = Vec<Article>> {
        let rx = self.store.observe_saved();
        stream::unfold((rx, true), |(mut rx, first)| async move {
            if !first && rx.changed().await.is_err() {
                return None;
            }
            let articles: Vec<Article> = rx
                .borrow_and_update()
                .iter()
                .map(StoredArticle::to_article)
                .collect();
            Some((articles, (rx, false)))
        })
    }

    /// Loading, then one top-headlines fetch and a linear search for the
    /// URL among the results. A response that simply lacks the URL is
    /// reported as a not-found error, distinct from transport and server
    /// failures.
    pub fn get_article_by_url(&self, url: &str) -> impl Stream<Item = Resource<Article>> {
        let client = self.client.clone();
        let country = self.country.clone();
        let url = url.to_string();

        stream::once(async { Resource::Loading }).chain(stream::once(async move {
            match client.top_headlines(&country).await {
                Ok(response) => {
                    let found = response
                        .articles
                        .into_iter()
                        .find(|dto| dto.url.as_deref() == Some(url.as_str()));
                    match found {
                        Some(dto) => Resource::Success(dto.into_article()),
                        None => Resource::Error("Article details not found online.".to_string()),
                    }
                }
                Err(e) => {
                    tracing::error!(url = %url, "failed to fetch article details: {e}");
                    Resource::Error(remote_error_message(&e))
                }
            }
        }))
    }

    pub async fn is_article_saved(&self, url: &str) -> Result<bool> {
        self.store.exists_by_url(url).await
    }
}

fn remote_error_message(e: &AppError) -> String {
    if e.is_transport() {
        "Couldn't reach server. Check your internet connection.".to_string()
    } else {
        e.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    async fn repository() -> NewsRepository {
        // The client never sends a request in these tests.
        let client = NewsClient::new("http://127.0.0.1:9", String::new()).unwrap();
        let store = ArticleStore::open_in_memory().await.unwrap();
        NewsRepository::new(client, store, "us".to_string())
    }

    fn article(url: Option<&str>) -> Article {
        Article {
            title: Some("T".to_string()),
            url: url.map(str::to_string),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn save_then_check_then_delete() {
        let repo = repository().await;
        let a = article(Some("https://a"));

        repo.save_article(&a).await.unwrap();
        assert!(repo.is_article_saved("https://a").await.unwrap());

        repo.delete_article(&a).await.unwrap();
        assert!(!repo.is_article_saved("https://a").await.unwrap());
    }

    #[tokio::test]
    async fn save_without_url_fails() {
        let repo = repository().await;
        assert!(matches!(
            repo.save_article(&article(None)).await,
            Err(AppError::MissingUrl)
        ));
    }

    #[tokio::test]
    async fn delete_without_url_is_silent_noop() {
        let repo = repository().await;
        repo.save_article(&article(Some("https://a"))).await.unwrap();

        repo.delete_article(&article(None)).await.unwrap();

        // Store contents untouched.
        assert!(repo.is_article_saved("https://a").await.unwrap());
    }

    #[tokio::test]
    async fn saved_articles_stream_follows_store_changes() {
        let repo = repository().await;
        let saved = repo.get_saved_articles();
        futures::pin_mut!(saved);

        assert!(saved.next().await.unwrap().is_empty());

        repo.save_article(&article(Some("https://a"))).await.unwrap();
        let snapshot = saved.next().await.unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].url.as_deref(), Some("https://a"));
        assert!(snapshot[0].is_saved);
    }
}
