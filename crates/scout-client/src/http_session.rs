use std::time::Duration;

use reqwest::Client;
use scout_core::error::AppError;
use scout_core::traits::{RenderSession, RenderedPage, WaitSpec, has_marker};

const DEFAULT_USER_AGENT: &str = "Scout/0.1 (talent crawler)";

/// Render session backed by plain HTTP GETs.
///
/// No JavaScript runs, so the marker must already be present in the served
/// HTML. Suited to server-rendered sites and offline fixtures; client-side
/// rendered search pages need the browser session.
#[derive(Clone)]
pub struct HttpSession {
    client: Client,
}

impl HttpSession {
    pub fn new() -> Result<Self, AppError> {
        Self::with_user_agent(DEFAULT_USER_AGENT)
    }

    pub fn with_user_agent(user_agent: &str) -> Result<Self, AppError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .build()
            .map_err(|e| AppError::HttpError(e.to_string()))?;
        Ok(Self { client })
    }

    async fn fetch(&self, url: &str, timeout: Duration) -> Result<RenderedPage, AppError> {
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AppError::Timeout(timeout.as_secs())
                } else if e.is_connect() {
                    AppError::NetworkError(format!("Connection failed: {e}"))
                } else {
                    AppError::HttpError(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::HttpError(format!(
                "HTTP {} for {}",
                status.as_u16(),
                url
            )));
        }

        let final_url = response.url().to_string();
        let html = response
            .text()
            .await
            .map_err(|e| AppError::HttpError(format!("Failed to read response body: {e}")))?;

        Ok(RenderedPage {
            url: final_url,
            html,
        })
    }
}

impl RenderSession for HttpSession {
    async fn render(&mut self, url: &str, wait: &WaitSpec) -> Result<RenderedPage, AppError> {
        let page = self.fetch(url, wait.timeout).await?;
        if !has_marker(&page.html, &wait.marker)? {
            tracing::debug!(%url, marker = %wait.marker, "Marker absent from served HTML");
            return Err(wait.timed_out());
        }
        Ok(page)
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    use super::*;

    /// Serve one canned HTTP response per connection, forever.
    async fn serve(status: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let mut buf = [0u8; 4096];
                let _ = socket.read(&mut buf).await;
                let response = format!(
                    "HTTP/1.1 {status}\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = socket.write_all(response.as_bytes()).await;
            }
        });
        format!("http://{addr}/freelancers/~01")
    }

    fn wait(marker: &str) -> WaitSpec {
        WaitSpec::new(marker, Duration::from_secs(5))
    }

    #[tokio::test]
    async fn returns_html_when_marker_present() {
        let url = serve("200 OK", r#"<div class="profiles-list"><a href="/x">x</a></div>"#).await;
        let mut session = HttpSession::new().unwrap();

        let page = session.render(&url, &wait(".profiles-list")).await.unwrap();

        assert_eq!(page.url, url);
        assert!(page.html.contains("profiles-list"));
    }

    #[tokio::test]
    async fn missing_marker_is_marker_timeout() {
        let url = serve("200 OK", "<p>Please enable JavaScript</p>").await;
        let mut session = HttpSession::new().unwrap();

        let err = session.render(&url, &wait(".profiles-list")).await.unwrap_err();

        assert!(matches!(err, AppError::MarkerTimeout { .. }));
    }

    #[tokio::test]
    async fn error_status_is_http_error() {
        let url = serve("503 Service Unavailable", "busy").await;
        let mut session = HttpSession::new().unwrap();

        let err = session.render(&url, &wait("body")).await.unwrap_err();

        assert!(err.to_string().contains("503"), "got: {err}");
    }

    #[tokio::test]
    async fn refused_connection_is_network_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let mut session = HttpSession::new().unwrap();

        let err = session
            .render(&format!("http://{addr}/"), &wait("body"))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NetworkError(_)), "got: {err:?}");
    }
}
