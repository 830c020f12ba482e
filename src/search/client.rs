//! reqwest implementation of the similarity-search contract
//!
//! `POST {service_url}/search` with a single multipart part named `file`.
//! Any non-2xx status is a failure; the body must carry `similar_images`.
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use std::future::Future;
use tracing::{debug, warn};

use super::{parse_search_response, SimilarityService};
use crate::error::SearchError;
use crate::state::data::{ResultSet, SelectedImage};

const SEARCH_PATH: &str = "/search";

/// Multipart field the service reads the upload from
const FILE_FIELD: &str = "file";

/// Client for a running similarity-search service
#[derive(Debug, Clone)]
pub struct HttpSimilarityService {
    http: Client,
    endpoint: String,
}

impl HttpSimilarityService {
    /// `service_url` is the origin, e.g. `http://localhost:5000`
    pub fn new(service_url: &str) -> Self {
        Self::with_client(Client::new(), service_url)
    }

    pub fn with_client(http: Client, service_url: &str) -> Self {
        let endpoint = format!("{}{}", service_url.trim_end_matches('/'), SEARCH_PATH);
        Self { http, endpoint }
    }
}

impl SimilarityService for HttpSimilarityService {
    fn search(
        &self,
        image: &SelectedImage,
    ) -> impl Future<Output = Result<ResultSet, SearchError>> + Send + 'static {
        let http = self.http.clone();
        let endpoint = self.endpoint.clone();
        let image = image.clone();

        async move {
            let part = Part::stream_with_length(image.payload(), image.size() as u64)
                .file_name(image.name.clone())
                .mime_str(&image.mime_type)?;
            let form = Form::new().part(FILE_FIELD, part);

            debug!(%endpoint, bytes = image.size(), "posting search request");

            let response = http.post(&endpoint).multipart(form).send().await?;
            let status = response.status();
            if !status.is_success() {
                warn!(%endpoint, status = status.as_u16(), "search rejected by service");
                return Err(SearchError::Status(status.as_u16()));
            }

            let body = response.bytes().await?;
            parse_search_response(&body)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::sync::oneshot;

    /// Serve exactly one HTTP exchange, handing the raw request back
    async fn serve_once(
        status_line: &'static str,
        body: &'static str,
    ) -> (String, oneshot::Receiver<Vec<u8>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let origin = format!("http://{}", listener.local_addr().unwrap());
        let (tx, rx) = oneshot::channel();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let request = read_request(&mut socket).await;

            let reply = format!(
                "HTTP/1.1 {status_line}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(reply.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            let _ = tx.send(request);
        });

        (origin, rx)
    }

    /// Read headers plus a content-length body
    async fn read_request(socket: &mut tokio::net::TcpStream) -> Vec<u8> {
        let mut data = Vec::new();
        let mut buf = [0u8; 4096];

        loop {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                return data;
            }
            data.extend_from_slice(&buf[..n]);

            if let Some(header_end) = find(&data, b"\r\n\r\n") {
                let headers = String::from_utf8_lossy(&data[..header_end]).to_lowercase();
                if headers.contains("transfer-encoding: chunked") {
                    if data.ends_with(b"0\r\n\r\n") {
                        return data;
                    }
                    continue;
                }
                let length = headers
                    .lines()
                    .find_map(|line| line.strip_prefix("content-length:"))
                    .and_then(|value| value.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if data.len() >= header_end + 4 + length {
                    return data;
                }
            }
        }
    }

    fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
        haystack.windows(needle.len()).position(|w| w == needle)
    }

    fn cat() -> SelectedImage {
        SelectedImage::new("cat.png", "image/png", b"PNGDATA".to_vec())
    }

    #[test]
    fn test_endpoint_joins_origin() {
        let service = HttpSimilarityService::new("http://localhost:5000/");
        assert_eq!(service.endpoint, "http://localhost:5000/search");
    }

    #[tokio::test]
    async fn test_posts_multipart_file_field() {
        let (origin, request) =
            serve_once("200 OK", r#"{"similar_images": ["a/b/cat1.png", "cat2.png"]}"#).await;
        let service = HttpSimilarityService::new(&origin);

        let results = service.search(&cat()).await.unwrap();
        assert_eq!(results.as_slice(), ["a/b/cat1.png", "cat2.png"]);

        let raw = request.await.unwrap();
        let text = String::from_utf8_lossy(&raw);
        assert!(text.starts_with("POST /search HTTP/1.1"));
        assert!(text.to_lowercase().contains("content-type: multipart/form-data"));
        assert!(text.contains(r#"name="file""#));
        assert!(text.contains(r#"filename="cat.png""#));
        assert!(text.contains("PNGDATA"));
    }

    #[tokio::test]
    async fn test_non_success_status_is_failure() {
        let (origin, _request) =
            serve_once("500 Internal Server Error", r#"{"similar_images": ["x.png"]}"#).await;
        let service = HttpSimilarityService::new(&origin);

        assert_eq!(service.search(&cat()).await, Err(SearchError::Status(500)));
    }

    #[tokio::test]
    async fn test_unreachable_service_is_network_error() {
        // Bind then drop to get a port nothing listens on
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let origin = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let service = HttpSimilarityService::new(&origin);
        assert!(matches!(
            service.search(&cat()).await,
            Err(SearchError::Network(_))
        ));
    }
}
