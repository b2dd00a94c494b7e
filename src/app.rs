use futures::StreamExt;

use crate::config::Config;
use crate::db::ArticleStore;
use crate::error::Result;
use crate::models::{Article, Resource};
use crate::news::NewsClient;
use crate::repository::NewsRepository;

/// Command handlers. Each command invokes exactly one repository
/// operation and renders its result; the `Resource` states map to a
/// progress line, the payload, or an error line.
pub struct App {
    pub repository: NewsRepository,
}

impl App {
    pub async fn new(config: &Config) -> Result<Self> {
        let client = NewsClient::new(
            &config.api_url,
            config.api_key.clone().unwrap_or_default(),
        )?;
        let store = ArticleStore::open(&config.db_path).await?;
        let repository = NewsRepository::new(client, store, config.country.clone());

        Ok(Self { repository })
    }

    /// `headlines` / `search <query>`: list remote articles, marking the
    /// ones already saved locally with a `*`.
    pub async fn news(&self, query: Option<String>) -> Result<()> {
        let stream = self.repository.get_news(query);
        futures::pin_mut!(stream);

        while let Some(state) = stream.next().await {
            match state {
                Resource::Loading => println!("Fetching news..."),
                Resource::Success(articles) => {
                    if articles.is_empty() {
                        println!("No articles found.");
                    }
                    for article in &articles {
                        self.print_listing(article).await?;
                    }
                }
                Resource::Error(message) => {
                    return Err(anyhow::anyhow!(message).into());
                }
            }
        }
        Ok(())
    }

    /// `show <url>`: fetch and render one article's details. The remote
    /// result always reports unsaved, so the flag is re-derived from the
    /// local store before rendering.
    pub async fn show(&self, url: &str) -> Result<()> {
        let article = self.fetch_detail(url).await?;
        let article = article.with_saved(self.repository.is_article_saved(url).await?);
        print_detail(&article);
        Ok(())
    }

    /// `save <url>`: fetch the article's details, then persist them.
    pub async fn save(&self, url: &str) -> Result<()> {
        let article = self.fetch_detail(url).await?;
        self.repository.save_article(&article).await?;
        println!("Saved {}", url);
        Ok(())
    }

    /// `delete <url>`: remove the article from the local store.
    pub async fn delete(&self, url: &str) -> Result<()> {
        let saved = self.saved_snapshot().await;
        let article = saved
            .into_iter()
            .find(|a| a.url.as_deref() == Some(url))
            .unwrap_or_else(|| Article {
                url: Some(url.to_string()),
                ..Default::default()
            });

        self.repository.delete_article(&article).await?;
        println!("Deleted {}", url);
        Ok(())
    }

    /// `saved [--watch]`: print the saved articles; with `--watch`, keep
    /// the subscription open and print every new snapshot until Ctrl-C.
    pub async fn saved(&self, watch: bool) -> Result<()> {
        let stream = self.repository.get_saved_articles();
        futures::pin_mut!(stream);

        while let Some(articles) = stream.next().await {
            if articles.is_empty() {
                println!("No saved articles.");
            }
            for article in &articles {
                self.print_listing(article).await?;
            }
            if !watch {
                break;
            }
            println!("-- watching for changes (Ctrl-C to stop) --");
        }
        Ok(())
    }

    /// `check <url>`: report whether the article is saved locally.
    pub async fn check(&self, url: &str) -> Result<()> {
        if self.repository.is_article_saved(url).await? {
            println!("{} is saved", url);
        } else {
            println!("{} is not saved", url);
        }
        Ok(())
    }

    /// `export`: dump the saved articles as JSON for offline use.
    pub async fn export(&self) -> Result<()> {
        let saved = self.saved_snapshot().await;
        let json = serde_json::to_string_pretty(&saved)
            .map_err(|e| anyhow::anyhow!("failed to serialize saved articles: {e}"))?;
        println!("{json}");
        Ok(())
    }

    async fn fetch_detail(&self, url: &str) -> Result<Article> {
        let stream = self.repository.get_article_by_url(url);
        futures::pin_mut!(stream);

        while let Some(state) = stream.next().await {
            match state {
                Resource::Loading => println!("Fetching article details..."),
                Resource::Success(article) => return Ok(article),
                Resource::Error(message) => return Err(anyhow::anyhow!(message).into()),
            }
        }
        Err(anyhow::anyhow!("article stream ended without a result").into())
    }

    async fn saved_snapshot(&self) -> Vec<Article> {
        let stream = self.repository.get_saved_articles();
        futures::pin_mut!(stream);
        stream.next().await.unwrap_or_default()
    }

    async fn print_listing(&self, article: &Article) -> Result<()> {
        let saved = match article.url.as_deref() {
            // Remote results always report is_saved = false; the saved
            // indicator comes from a separate store lookup.
            Some(url) => article.is_saved || self.repository.is_article_saved(url).await?,
            None => false,
        };

        println!(
            "{} {}  [{}]",
            if saved { "*" } else { " " },
            article.title.as_deref().unwrap_or("(untitled)"),
            article.source_name.as_deref().unwrap_or("unknown source"),
        );
        if let Some(url) = article.url.as_deref() {
            println!("   {url}");
        }
        Ok(())
    }
}

fn print_detail(article: &Article) {
    println!("{}", article.title.as_deref().unwrap_or("(untitled)"));
    if let Some(source) = article.source_name.as_deref() {
        println!("Source:    {source}");
    }
    if let Some(author) = article.author.as_deref() {
        println!("Author:    {author}");
    }
    if let Some(published) = article.published_at.as_deref() {
        println!("Published: {published}");
    }
    if let Some(url) = article.url.as_deref() {
        println!("URL:       {url}");
    }
    if let Some(description) = article.description.as_deref() {
        println!("\n{description}");
    }
    if let Some(content) = article.content.as_deref() {
        println!("\n{content}");
    }
    println!("\nSaved locally: {}", if article.is_saved { "yes" } else { "no" });
}
