use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use futures::FutureExt;
use futures::future::BoxFuture;

use super::{DEFAULT_EXTENSION, ResourceSource};
use crate::error::FetchError;

/// Reads `<root>/<slug><extension>` from the local filesystem.
#[derive(Debug, Clone)]
pub struct DirSource {
    root: PathBuf,
    extension: String,
}

impl DirSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        DirSource {
            root: root.into(),
            extension: DEFAULT_EXTENSION.to_string(),
        }
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, slug: &str) -> PathBuf {
        self.root.join(format!("{}{}", slug, self.extension))
    }
}

impl ResourceSource for DirSource {
    fn locate(&self, slug: &str) -> String {
        self.path_for(slug).display().to_string()
    }

    fn fetch<'a>(&'a self, slug: &'a str) -> BoxFuture<'a, Result<String, FetchError>> {
        let path = self.path_for(slug);
        async move {
            tokio::fs::read_to_string(&path).await.map_err(|e| match e.kind() {
                ErrorKind::NotFound => FetchError::NotFound,
                _ => FetchError::Transport(format!("{}: {}", path.display(), e)),
            })
        }
        .boxed()
    }
}
