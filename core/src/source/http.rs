use anyhow::{Context, Result, bail};
use bytes::Bytes;
use futures::FutureExt;
use futures::future::BoxFuture;
use http_body_util::{BodyExt, Empty};
use hyper::client::conn::http1;
use hyper::{Method, Request, StatusCode, Uri, header};
use hyper_util::rt::TokioIo;
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tracing::debug;

use super::{DEFAULT_EXTENSION, ResourceSource};
use crate::error::FetchError;

/// Fetches `<base_url>/<slug><extension>` with a plain HTTP/1.1 GET.
///
/// Anything other than `200 OK` is reported as [`FetchError::Status`].
#[derive(Debug, Clone)]
pub struct HttpSource {
    host: String,
    port: u16,
    authority: String,
    base_path: String,
    extension: String,
}

impl HttpSource {
    pub fn new(base_url: &str) -> Result<Self> {
        let uri: Uri = base_url
            .parse()
            .with_context(|| format!("invalid fixture base url '{}'", base_url))?;
        match uri.scheme_str() {
            Some("http") => {}
            Some(other) => bail!("unsupported scheme '{}' in '{}', only http is supported", other, base_url),
            None => bail!("fixture base url '{}' has no scheme", base_url),
        }
        let authority = uri
            .authority()
            .with_context(|| format!("fixture base url '{}' has no host", base_url))?;

        Ok(HttpSource {
            host: authority.host().trim_start_matches('[').trim_end_matches(']').to_string(),
            port: authority.port_u16().unwrap_or(80),
            authority: authority.as_str().to_string(),
            base_path: uri.path().trim_end_matches('/').to_string(),
            extension: DEFAULT_EXTENSION.to_string(),
        })
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    fn path_for(&self, slug: &str) -> String {
        format!("{}/{}{}", self.base_path, slug, self.extension)
    }

    async fn get(&self, slug: &str) -> Result<String, FetchError> {
        let path = self.path_for(slug);
        let stream = TcpStream::connect((self.host.as_str(), self.port))
            .await
            .map_err(|e| FetchError::Transport(format!("connect {}: {}", self.authority, e)))?;

        let (mut sender, conn) = http1::handshake(TokioIo::new(stream))
            .await
            .map_err(FetchError::transport)?;
        let _driver = ConnectionDriver(tokio::spawn(async move {
            if let Err(err) = conn.await {
                debug!(error = %err, "fixture connection closed with error");
            }
        }));

        let request = Request::builder()
            .method(Method::GET)
            .uri(path.as_str())
            .header(header::HOST, self.authority.as_str())
            .body(Empty::<Bytes>::new())
            .map_err(FetchError::transport)?;

        let response = sender.send_request(request).await.map_err(FetchError::transport)?;
        if response.status() != StatusCode::OK {
            return Err(FetchError::Status(response.status().as_u16()));
        }

        let body = response
            .into_body()
            .collect()
            .await
            .map_err(FetchError::transport)?
            .to_bytes();
        String::from_utf8(body.to_vec()).map_err(|e| FetchError::Transport(format!("{} is not UTF-8: {}", path, e)))
    }
}

/// Aborts the connection task when the fetch finishes or is dropped on timeout.
struct ConnectionDriver(JoinHandle<()>);

impl Drop for ConnectionDriver {
    fn drop(&mut self) {
        self.0.abort();
    }
}

impl ResourceSource for HttpSource {
    fn locate(&self, slug: &str) -> String {
        format!("http://{}{}", self.authority, self.path_for(slug))
    }

    fn fetch<'a>(&'a self, slug: &'a str) -> BoxFuture<'a, Result<String, FetchError>> {
        self.get(slug).boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ipv6_host_is_unbracketed_for_connect() {
        let source = HttpSource::new("http://[::1]:8000/3rdparty").expect("ipv6 base url");
        assert_eq!(source.host, "::1");
        assert_eq!(source.port, 8000);
        assert_eq!(source.locate("backbone-0.5.3"), "http://[::1]:8000/3rdparty/backbone-0.5.3.js");
    }
}
