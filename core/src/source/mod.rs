//! Where fixture content comes from.

mod dir;
mod http;

#[cfg(test)]
mod source_test;

pub use dir::DirSource;
pub use http::HttpSource;

use futures::future::BoxFuture;

use crate::error::FetchError;

/// Default resource suffix appended to a fixture slug.
pub const DEFAULT_EXTENSION: &str = ".js";

/// Resolves a fixture slug to its raw text.
///
/// Implementations report faults as [`FetchError`]; the loader applies the
/// timeout, so a source may simply never complete.
pub trait ResourceSource: Send + Sync {
    /// Human-readable location of `slug`, shown in status messages.
    fn locate(&self, slug: &str) -> String;

    fn fetch<'a>(&'a self, slug: &'a str) -> BoxFuture<'a, Result<String, FetchError>>;
}

impl<T: ResourceSource + ?Sized> ResourceSource for Box<T> {
    fn locate(&self, slug: &str) -> String {
        (**self).locate(slug)
    }

    fn fetch<'a>(&'a self, slug: &'a str) -> BoxFuture<'a, Result<String, FetchError>> {
        (**self).fetch(slug)
    }
}
