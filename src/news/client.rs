use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use url::Url;

use crate::error::{AppError, Result};
use crate::models::Article;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsResponse {
    pub status: String,
    pub total_results: u32,
    pub articles: Vec<ArticleDto>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleDto {
    pub source: Option<SourceDto>,
    pub author: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub url_to_image: Option<String>,
    pub published_at: Option<String>,
    pub content: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceDto {
    pub id: Option<String>,
    pub name: Option<String>,
}

impl ArticleDto {
    /// Wire item to domain model. Articles fetched from the API are not
    /// saved by definition; the flag is re-derived from the local store.
    pub fn into_article(self) -> Article {
        Article {
            author: self.author,
            content: self.content,
            description: self.description,
            published_at: self.published_at,
            source_name: self.source.and_then(|s| s.name),
            title: self.title,
            url: self.url,
            url_to_image: self.url_to_image,
            is_saved: false,
        }
    }
}

/// Client for the news API. Constructed once at startup and cloned where
/// needed; holds its own reqwest client and credentials.
#[derive(Clone)]
pub struct NewsClient {
    client: Client,
    base_url: Url,
    api_key: String,
}

impl NewsClient {
    pub fn new(api_url: &str, api_key: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("newsdesk/0.1")
            .build()
            .expect("Failed to create HTTP client");

        let base_url = Url::parse(api_url)?;

        Ok(Self {
            client,
            base_url,
            api_key,
        })
    }

    /// Current top headlines for a country.
    pub async fn top_headlines(&self, country: &str) -> Result<NewsResponse> {
        let url = self.base_url.join("v2/top-headlines")?;
        let response = self
            .client
            .get(url)
            .query(&[("country", country), ("apiKey", &self.api_key)])
            .send()
            .await?;

        if !response.status().is_success() {
            tracing::warn!("top-headlines request failed: HTTP {}", response.status());
            return Err(AppError::NewsApi(response.status().to_string()));
        }

        Ok(response.json().await?)
    }

    /// Full-text search across all articles.
    pub async fn search(&self, query: &str) -> Result<NewsResponse> {
        let url = self.base_url.join("v2/everything")?;
        let response = self
            .client
            .get(url)
            .query(&[("q", query), ("apiKey", &self.api_key)])
            .send()
            .await?;

        if !response.status().is_success() {
            tracing::warn!("search request failed: HTTP {}", response.status());
            return Err(AppError::NewsApi(response.status().to_string()));
        }

        Ok(response.json().await?)
    }
}
