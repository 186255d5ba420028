#[cfg(test)]
mod tests {
    use std::convert::Infallible;
    use std::fs;
    use std::net::SocketAddr;

    use bytes::Bytes;
    use http_body_util::Full;
    use hyper::body::Incoming;
    use hyper::server::conn::http1;
    use hyper::service::service_fn;
    use hyper::{Request, Response, StatusCode};
    use hyper_util::rt::TokioIo;
    use tokio::net::TcpListener;

    use crate::error::FetchError;
    use crate::source::{DirSource, HttpSource, ResourceSource};

    async fn fixture_route(req: Request<Incoming>) -> Result<Response<Full<Bytes>>, Infallible> {
        let response = match req.uri().path() {
            "/3rdparty/backbone-0.5.3.js" => Response::new(Full::new(Bytes::from_static(b"var Backbone = {};"))),
            _ => Response::builder()
                .status(StatusCode::NOT_FOUND)
                .body(Full::new(Bytes::from_static(b"not found")))
                .unwrap_or_else(|_| Response::new(Full::new(Bytes::new()))),
        };
        Ok(response)
    }

    async fn spawn_fixture_server() -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind test server");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    break;
                };
                tokio::spawn(async move {
                    let _ = http1::Builder::new()
                        .serve_connection(TokioIo::new(stream), service_fn(fixture_route))
                        .await;
                });
            }
        });
        addr
    }

    #[tokio::test]
    async fn test_http_source_fetches_ok_body() {
        let addr = spawn_fixture_server().await;
        let source = HttpSource::new(&format!("http://{}/3rdparty/", addr)).expect("source");
        let body = source.fetch("backbone-0.5.3").await.expect("fetch");
        assert_eq!(body, "var Backbone = {};");
    }

    #[tokio::test]
    async fn test_http_source_reports_status() {
        let addr = spawn_fixture_server().await;
        let source = HttpSource::new(&format!("http://{}/3rdparty", addr)).expect("source");
        let err = source.fetch("missing").await.expect_err("404 is a failure");
        assert_eq!(err, FetchError::Status(404));
        assert_eq!(source.locate("missing"), format!("http://{}/3rdparty/missing.js", addr));
    }

    #[tokio::test]
    async fn test_http_source_connection_refused_is_transport() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        drop(listener);

        let source = HttpSource::new(&format!("http://{}", addr)).expect("source");
        let err = source.fetch("anything").await.expect_err("nothing listens");
        assert!(matches!(err, FetchError::Transport(_)), "{err:?}");
    }

    #[test]
    fn test_http_source_rejects_bad_urls() {
        assert!(HttpSource::new("https://example.com/fixtures").is_err());
        assert!(HttpSource::new("/relative/only").is_err());
        assert!(HttpSource::new("http://example.com:8080/x").is_ok());
    }

    #[tokio::test]
    async fn test_dir_source_reads_and_maps_missing() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("underscore-1.2.3.js"), "var _ = 1;").expect("write fixture");

        let source = DirSource::new(dir.path());
        assert_eq!(source.fetch("underscore-1.2.3").await.expect("read"), "var _ = 1;");
        assert_eq!(source.fetch("absent").await.expect_err("missing"), FetchError::NotFound);
    }

    #[tokio::test]
    async fn test_dir_source_custom_extension() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("a.txt"), "x").expect("write fixture");

        let source = DirSource::new(dir.path()).with_extension(".txt");
        assert_eq!(source.fetch("a").await.expect("read"), "x");
        assert!(source.locate("a").ends_with("a.txt"));
    }
}
