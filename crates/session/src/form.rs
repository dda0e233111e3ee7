use serde::{Deserialize, Serialize};

/// What the person filled in before publishing
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostForm {
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub categories: Vec<u64>,
    /// 1 to 5 stars
    #[serde(default)]
    pub rating: Option<u8>,
}

impl PostForm {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    #[must_use]
    pub fn categories(mut self, categories: impl IntoIterator<Item = u64>) -> Self {
        self.categories = categories.into_iter().collect();
        self
    }

    #[must_use]
    pub fn rating(mut self, stars: u8) -> Self {
        self.rating = Some(stars);
        self
    }
}
