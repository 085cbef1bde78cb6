//! Where post files come from.

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

/// Read-only access to the markdown files backing the post store.
#[async_trait]
pub trait PostSource: Send + Sync {
    /// File names (not paths) currently present, in no particular order.
    async fn list_files(&self) -> io::Result<Vec<String>>;

    /// The path a slug's file would live at. Does not touch storage.
    fn resolve(&self, slug: &str) -> PathBuf;

    /// Read a whole file as UTF-8.
    async fn read(&self, path: &Path) -> io::Result<String>;
}

/// Posts stored as `<slug>.md` files in one directory.
#[derive(Debug, Clone)]
pub struct FsPostSource {
    dir: PathBuf,
}

impl FsPostSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl PostSource for FsPostSource {
    async fn list_files(&self) -> io::Result<Vec<String>> {
        let mut names = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
        Ok(names)
    }

    fn resolve(&self, slug: &str) -> PathBuf {
        self.dir.join(format!("{slug}.md"))
    }

    async fn read(&self, path: &Path) -> io::Result<String> {
        tokio::fs::read_to_string(path).await
    }
}
