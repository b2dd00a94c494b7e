mod client;

pub use client::{ArticleDto, NewsClient, NewsResponse, SourceDto};
