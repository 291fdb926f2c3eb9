use bytes::Bytes;
use http_body_util::{BodyExt as _, Full};
use hyper::Request;
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;
use std::time::Duration;

use super::{Error, HttpRequest, HttpResponse, Result};

type Inner = Client<HttpsConnector<HttpConnector>, Full<Bytes>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientOptions {
    /// TCP connect deadline. Without one an unroutable target can stall for the OS default,
    /// which is tens of seconds.
    pub connect_timeout: Option<Duration>,
    /// Sent unless the request sets its own `user-agent`.
    pub user_agent: String,
    pub pool_idle_timeout: Duration,
    pub pool_max_idle_per_host: usize,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Some(Duration::from_secs(3)),
            user_agent: concat!("swarm/", env!("CARGO_PKG_VERSION")).to_string(),
            pool_idle_timeout: Duration::from_secs(30),
            pool_max_idle_per_host: 64,
        }
    }
}

/// Shared by every virtual user of a run; cloning shares the connection pool.
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: Inner,
    user_agent: http::HeaderValue,
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::with_options(ClientOptions::default())
    }
}

impl HttpClient {
    /// Default options with a different connect timeout.
    #[must_use]
    pub fn new(connect_timeout: Option<Duration>) -> Self {
        Self::with_options(ClientOptions {
            connect_timeout,
            ..ClientOptions::default()
        })
    }

    #[must_use]
    pub fn with_options(options: ClientOptions) -> Self {
        let mut connector = HttpConnector::new();
        connector.enforce_http(false);
        connector.set_nodelay(true);
        connector.set_connect_timeout(options.connect_timeout);

        let connector = HttpsConnectorBuilder::new()
            .with_webpki_roots()
            .https_or_http()
            .enable_http1()
            .wrap_connector(connector);

        let inner = Client::builder(TokioExecutor::new())
            .pool_idle_timeout(options.pool_idle_timeout)
            .pool_max_idle_per_host(options.pool_max_idle_per_host)
            .build(connector);

        let user_agent = http::HeaderValue::from_str(&options.user_agent)
            .unwrap_or_else(|_| http::HeaderValue::from_static("swarm"));

        Self { inner, user_agent }
    }

    /// Sends `req` and buffers the whole body. `req.timeout` covers connect, headers and body.
    pub async fn request(&self, req: HttpRequest) -> Result<HttpResponse> {
        let deadline = req.timeout;
        let exchange = self.exchange(req);
        match deadline {
            None => exchange.await,
            Some(limit) => tokio::time::timeout(limit, exchange)
                .await
                .unwrap_or(Err(Error::Timeout(limit))),
        }
    }

    pub async fn get(&self, url: &str) -> Result<HttpResponse> {
        self.request(HttpRequest::get(url)).await
    }

    async fn exchange(&self, req: HttpRequest) -> Result<HttpResponse> {
        let req = self.build(req)?;
        let res = self.inner.request(req).await?;
        let status = res.status().as_u16();
        let body = res.into_body().collect().await?.to_bytes();
        Ok(HttpResponse { status, body })
    }

    fn build(&self, req: HttpRequest) -> Result<Request<Full<Bytes>>> {
        let uri: hyper::Uri = req
            .url
            .parse()
            .map_err(|_| Error::InvalidUrl(req.url.clone()))?;
        match uri.scheme_str() {
            Some("http" | "https") => {}
            Some(_) => return Err(Error::UnsupportedScheme(req.url)),
            None => return Err(Error::InvalidUrl(req.url)),
        }
        if uri.host().is_none() {
            return Err(Error::InvalidUrl(req.url));
        }

        let mut builder = Request::builder().method(req.method).uri(uri);
        let mut has_user_agent = false;
        for (name, value) in &req.headers {
            has_user_agent |= name.eq_ignore_ascii_case("user-agent");
            builder = builder.header(name.as_str(), value.as_str());
        }
        if !has_user_agent {
            builder = builder.header(http::header::USER_AGENT, self.user_agent.clone());
        }

        Ok(builder.body(Full::new(req.body))?)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use std::time::Instant;
    use tokio::io::{AsyncReadExt as _, AsyncWriteExt as _};

    #[tokio::test]
    async fn unroutable_host_fails_within_the_connect_timeout() {
        let client = HttpClient::new(Some(Duration::from_millis(200)));

        let started = Instant::now();
        let err = client.get("http://192.0.2.1:81/").await.unwrap_err();

        assert!(err.is_transport(), "unexpected error: {err}");
        assert!(
            started.elapsed() < Duration::from_secs(2),
            "connect took {:?}",
            started.elapsed()
        );
    }

    #[tokio::test]
    async fn timeout_covers_a_silent_server() {
        // Accepts connections and never answers.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hold = tokio::spawn(async move {
            let mut open = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                open.push(socket);
            }
        });

        let client = HttpClient::new(None);
        let req = HttpRequest::get(format!("http://{addr}/")).with_timeout(Duration::from_millis(100));
        let err = client.request(req).await.unwrap_err();
        hold.abort();

        assert!(matches!(err, Error::Timeout(_)), "unexpected error: {err}");
    }

    #[tokio::test]
    async fn sends_user_agent_and_reads_the_body() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 4096];
            let n = socket.read(&mut buf).await.unwrap();
            let head = String::from_utf8_lossy(&buf[..n]).to_ascii_lowercase();
            socket
                .write_all(b"HTTP/1.1 201 Created\r\ncontent-length: 2\r\nconnection: close\r\n\r\nok")
                .await
                .unwrap();
            head
        });

        let res = HttpClient::default()
            .get(&format!("http://{addr}/api/lessons"))
            .await
            .unwrap();
        let head = server.await.unwrap();

        assert_eq!(res.status, 201);
        assert_eq!(&res.body[..], b"ok");
        assert!(head.starts_with("get /api/lessons http/1.1"), "{head}");
        assert!(head.contains("user-agent: swarm/"), "{head}");
    }

    #[tokio::test]
    async fn non_http_schemes_are_rejected_before_sending() {
        let client = HttpClient::default();
        let err = client.get("ftp://example.com/").await.unwrap_err();
        assert!(matches!(err, Error::UnsupportedScheme(_)));
        assert!(!err.is_transport());
    }
}
