pub const SCHEMA: &str = r#"
-- saved articles table, keyed by article URL
CREATE TABLE IF NOT EXISTS articles (
    url TEXT PRIMARY KEY NOT NULL,
    author TEXT,
    content TEXT,
    description TEXT,
    published_at TEXT,
    source_name TEXT,
    title TEXT,
    url_to_image TEXT,
    timestamp INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_articles_timestamp ON articles(timestamp DESC);
"#;
