//! Markdown posts loaded from a [`PostSource`] through a bounded cache.
//!
//! The cache stores raw file text, not parsed or projected output, so one
//! entry serves every field projection. Front matter is re-parsed on each
//! read.

pub mod cache;
pub mod front_matter;
pub mod source;

use std::cmp::Ordering;
use std::fmt;
use std::io;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;

use crate::clock::Clock;
use crate::error::CoreError;

pub use cache::{ContentCache, PostCacheConfig};
pub use front_matter::{Author, Document, FrontMatter};
pub use source::{FsPostSource, PostSource};

const MARKDOWN_EXT: &str = ".md";

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum PostError {
    #[error("post not found: {0}")]
    NotFound(String),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid front matter in {slug}: {source}")]
    FrontMatter {
        slug: String,
        #[source]
        source: serde_yaml::Error,
    },
}

impl From<PostError> for CoreError {
    fn from(err: PostError) -> Self {
        match err {
            PostError::NotFound(slug) => CoreError::not_found("Post", slug),
            other => CoreError::Internal(other.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// Fields and projected views
// ---------------------------------------------------------------------------

/// A selectable post field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PostField {
    Slug,
    Title,
    Date,
    Author,
    Excerpt,
    CoverImage,
    Content,
}

impl PostField {
    pub const ALL: &'static [PostField] = &[
        PostField::Slug,
        PostField::Title,
        PostField::Date,
        PostField::Author,
        PostField::Excerpt,
        PostField::CoverImage,
        PostField::Content,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PostField::Slug => "slug",
            PostField::Title => "title",
            PostField::Date => "date",
            PostField::Author => "author",
            PostField::Excerpt => "excerpt",
            PostField::CoverImage => "coverImage",
            PostField::Content => "content",
        }
    }
}

impl fmt::Display for PostField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PostField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "slug" => Ok(PostField::Slug),
            "title" => Ok(PostField::Title),
            "date" => Ok(PostField::Date),
            "author" => Ok(PostField::Author),
            "excerpt" => Ok(PostField::Excerpt),
            "coverImage" | "cover_image" => Ok(PostField::CoverImage),
            "content" => Ok(PostField::Content),
            other => Err(format!("Unknown post field: {other}")),
        }
    }
}

/// A post projected to the requested fields. `slug` is always present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostView {
    pub slug: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<Author>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl PostView {
    fn project(slug: String, doc: Document, fields: &[PostField]) -> Self {
        let wants = |f: PostField| fields.contains(&f);
        let Document { front_matter, body } = doc;
        Self {
            slug,
            title: front_matter.title.filter(|_| wants(PostField::Title)),
            date: front_matter.date.filter(|_| wants(PostField::Date)),
            author: front_matter.author.filter(|_| wants(PostField::Author)),
            excerpt: front_matter.excerpt.filter(|_| wants(PostField::Excerpt)),
            cover_image: front_matter.cover_image.filter(|_| wants(PostField::CoverImage)),
            content: Some(body).filter(|_| wants(PostField::Content)),
        }
    }
}

/// Newest first; dated before undated; undated keep their relative order.
fn compare_dates(a: Option<&str>, b: Option<&str>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.cmp(a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

// ---------------------------------------------------------------------------
// PostStore
// ---------------------------------------------------------------------------

/// Read-only post access, constructed once at startup and shared.
///
/// Concurrent misses on the same slug may both read the file and both fill
/// the cache; the fills are identical.
pub struct PostStore {
    source: Arc<dyn PostSource>,
    clock: Arc<dyn Clock>,
    cache: Mutex<ContentCache>,
}

impl PostStore {
    pub fn new(
        source: Arc<dyn PostSource>,
        clock: Arc<dyn Clock>,
        config: PostCacheConfig,
    ) -> Self {
        Self {
            source,
            clock,
            cache: Mutex::new(ContentCache::new(config)),
        }
    }

    /// Slugs of every `.md` file in the source, sorted.
    pub async fn list_slugs(&self) -> Result<Vec<String>, PostError> {
        let files = self.source.list_files().await.map_err(|source| PostError::Io {
            path: PathBuf::from("."),
            source,
        })?;

        let mut slugs: Vec<String> = files
            .iter()
            .filter_map(|name| name.strip_suffix(MARKDOWN_EXT))
            .filter(|slug| !slug.is_empty())
            .map(str::to_string)
            .collect();
        slugs.sort();
        Ok(slugs)
    }

    /// Load one post, projected to `fields`. A trailing `.md` on `slug` is
    /// ignored.
    pub async fn get_by_slug(
        &self,
        slug: &str,
        fields: &[PostField],
    ) -> Result<PostView, PostError> {
        let (slug, doc) = self.load(slug).await?;
        Ok(PostView::project(slug, doc, fields))
    }

    /// Every post, newest first. Posts without a date sort after all dated
    /// posts in their listing order. Ordering uses each post's front matter
    /// date even when `date` is not among `fields`.
    pub async fn get_all(&self, fields: &[PostField]) -> Result<Vec<PostView>, PostError> {
        let slugs = self.list_slugs().await?;
        let mut loaded =
            futures::future::try_join_all(slugs.iter().map(|slug| self.load(slug))).await?;

        loaded.sort_by(|(_, a), (_, b)| {
            compare_dates(a.front_matter.date.as_deref(), b.front_matter.date.as_deref())
        });

        Ok(loaded
            .into_iter()
            .map(|(slug, doc)| PostView::project(slug, doc, fields))
            .collect())
    }

    /// The first post in [`PostStore::get_all`] order.
    pub async fn latest(&self, fields: &[PostField]) -> Result<Option<PostView>, PostError> {
        Ok(self.get_all(fields).await?.into_iter().next())
    }

    /// Raw markdown body of a post, used as rewrite context.
    pub async fn content(&self, slug: &str) -> Result<String, PostError> {
        let (_, doc) = self.load(slug).await?;
        Ok(doc.body)
    }

    async fn load(&self, slug: &str) -> Result<(String, Document), PostError> {
        let slug = normalize_slug(slug)?;
        let path = self.source.resolve(&slug);

        let cached = self.lock_cache().get(&path, self.clock.now());
        let raw = match cached {
            Some(raw) => raw,
            None => {
                let text = self.source.read(&path).await.map_err(|source| {
                    if source.kind() == io::ErrorKind::NotFound {
                        PostError::NotFound(slug.clone())
                    } else {
                        tracing::error!(
                            path = %path.display(),
                            error = %source,
                            "Failed to read post"
                        );
                        PostError::Io {
                            path: path.clone(),
                            source,
                        }
                    }
                })?;
                let raw: Arc<str> = Arc::from(text);
                self.lock_cache()
                    .insert(path, Arc::clone(&raw), self.clock.now());
                raw
            }
        };

        let doc = front_matter::parse(&raw).map_err(|source| PostError::FrontMatter {
            slug: slug.clone(),
            source,
        })?;
        Ok((slug, doc))
    }

    fn lock_cache(&self) -> MutexGuard<'_, ContentCache> {
        self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Strip a `.md` suffix and refuse anything that could escape the source
/// directory.
fn normalize_slug(slug: &str) -> Result<String, PostError> {
    let slug = slug.strip_suffix(MARKDOWN_EXT).unwrap_or(slug);
    if slug.is_empty() || slug.starts_with('.') || slug.contains(['/', '\\']) {
        return Err(PostError::NotFound(slug.to_string()));
    }
    Ok(slug.to_string())
}
