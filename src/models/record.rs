/// A source adapter's output before canonicalization: listing-level fields
/// plus whatever the article page itself yielded. All fields may be empty;
/// the canonicalizer decides precedence.
#[derive(Debug, Clone, Default)]
pub struct RawRecord {
    pub title: String,
    pub link: String,
    pub summary: String,
    pub media_url: String,
    /// Date text exactly as the source presented it.
    pub published: String,
    pub detail: Option<ArticleDetail>,
}

/// Fields scraped from the article page itself. These take precedence over
/// the listing-level values when non-empty.
#[derive(Debug, Clone, Default)]
pub struct ArticleDetail {
    pub title: String,
    pub description: String,
    pub image_url: String,
    pub date: String,
    pub full_text: String,
}
