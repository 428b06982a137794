use std::{
    io,
    path::{Component, Path, PathBuf},
};

use rand::{distributions::Alphanumeric, Rng};

/// Area holding posts' featured images.
pub const FEATURED_AREA: &str = "posts/featured";
/// Area holding images inserted through the rich-text editor.
pub const EDITOR_AREA: &str = "posts/images";

const RANDOM_NAME_LEN: usize = 40;

/// The public file area. Files are addressed by a path relative to `root`,
/// which is what the database stores, and served under `<public_url>/storage/`.
#[derive(Debug, Clone)]
pub struct PublicStorage {
    root: PathBuf,
    public_url: String,
}

impl PublicStorage {
    pub fn new(root: impl Into<PathBuf>, public_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_url: public_url.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Writes `bytes` to `<area>/<file_name>` and returns the relative path.
    pub async fn put_as(&self, area: &str, file_name: &str, bytes: &[u8]) -> io::Result<String> {
        let relative = format!("{}/{}", area, file_name);
        let path = self.resolve(&relative)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, bytes).await?;
        Ok(relative)
    }

    /// Writes `bytes` under `area` with a random 40 character name.
    pub async fn put(&self, area: &str, extension: &str, bytes: &[u8]) -> io::Result<String> {
        self.put_as(area, &random_file_name(extension), bytes).await
    }

    pub async fn exists(&self, relative: &str) -> bool {
        match self.resolve(relative) {
            Ok(path) => tokio::fs::metadata(path)
                .await
                .map(|meta| meta.is_file())
                .unwrap_or(false),
            Err(_) => false,
        }
    }

    pub async fn delete(&self, relative: &str) -> io::Result<()> {
        tokio::fs::remove_file(self.resolve(relative)?).await
    }

    pub fn url(&self, relative: &str) -> String {
        format!("{}/storage/{}", self.public_url, relative)
    }

    fn resolve(&self, relative: &str) -> io::Result<PathBuf> {
        let relative = Path::new(relative);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if escapes {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("path {} leaves the storage area", relative.display()),
            ));
        }
        Ok(self.root.join(relative))
    }
}

fn random_file_name(extension: &str) -> String {
    let stem: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(RANDOM_NAME_LEN)
        .map(char::from)
        .collect();
    format!("{}.{}", stem, extension)
}

/// Builds the name of an editor upload: `<unix timestamp>_<original name>`
/// with every whitespace run, leading and trailing ones included, replaced by
/// a single `_`. Only the last path segment of the client supplied name is
/// kept.
pub fn editor_file_name(original: &str, unix_timestamp: i64) -> String {
    let base = original
        .rsplit(|c| c == '/' || c == '\\')
        .next()
        .unwrap_or_default();
    let mut collapsed = String::with_capacity(base.len());
    let mut in_whitespace = false;
    for c in base.chars() {
        if c.is_whitespace() {
            if !in_whitespace {
                collapsed.push('_');
            }
            in_whitespace = true;
        } else {
            collapsed.push(c);
            in_whitespace = false;
        }
    }
    let base = match collapsed.as_str() {
        "" | "." | ".." => "upload",
        name => name,
    };
    format!("{}_{}", unix_timestamp, base)
}
