use serde::{Deserialize, Serialize};

/// Canonical article as the rest of the app sees it, regardless of whether
/// it came off the wire or out of the database. Every scalar is optional
/// because the news API guarantees none of them; `url` doubles as the
/// persistence key and must be present before an article can be saved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub author: Option<String>,
    pub content: Option<String>,
    pub description: Option<String>,
    /// Publication timestamp as reported by the API; kept opaque.
    pub published_at: Option<String>,
    pub source_name: Option<String>,
    pub title: Option<String>,
    pub url: Option<String>,
    pub url_to_image: Option<String>,
    /// True only for articles read back from the local store.
    #[serde(default)]
    pub is_saved: bool,
}

impl Article {
    /// A new value with the saved flag flipped; articles are never mutated
    /// in place.
    pub fn with_saved(self, is_saved: bool) -> Self {
        Self { is_saved, ..self }
    }
}
