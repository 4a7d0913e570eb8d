//! HTTP transcription target.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use bytes::Bytes;
use probe_core::{ACCEPTED_STATUSES, TestResult};
use reqwest::header::{COOKIE, HeaderMap, SET_COOKIE};
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::response::apply_body;
use crate::session::{Session, SessionToken};
use crate::{ClientError, Result, TranscribeTarget};

pub const LOGIN_PATH: &str = "/auth/login";
pub const TRANSCRIBE_PATH: &str = "/visits/transcribe";

/// Multipart field the audio is uploaded under.
pub const UPLOAD_FIELD: &str = "file";

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    identifier: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    access_token: Option<String>,
}

/// Backend reached over HTTP.
#[derive(Debug, Clone)]
pub struct HttpTarget {
    client: reqwest::Client,
}

impl HttpTarget {
    /// Create a target whose requests give up after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    fn upload_form(payload: Bytes, filename: &str) -> std::result::Result<Form, reqwest::Error> {
        let len = payload.len() as u64;
        let part = Part::stream_with_length(payload, len)
            .file_name(filename.to_string())
            .mime_str(probe_payload::CONTENT_TYPE)?;
        Ok(Form::new().part(UPLOAD_FIELD, part))
    }
}

/// Collect `name=value` pairs from every `Set-Cookie` header.
fn session_cookie(headers: &HeaderMap) -> Option<String> {
    let pairs: Vec<&str> = headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|v| v.split(';').next())
        .map(str::trim)
        .filter(|pair| pair.contains('='))
        .collect();

    (!pairs.is_empty()).then(|| pairs.join("; "))
}

#[async_trait]
impl TranscribeTarget for HttpTarget {
    async fn authenticate(&self, session: &mut Session) -> Result<()> {
        info!(username = session.username(), "Authenticating");

        let response = self
            .client
            .post(session.url(LOGIN_PATH))
            .json(&LoginRequest {
                identifier: session.username(),
                password: session.password(),
            })
            .send()
            .await?;

        let status = response.status().as_u16();
        let cookie = session_cookie(response.headers());
        let body = response.text().await.map_err(|e| {
            error!(status, error = %e, "Failed to read login response body");
            ClientError::Transport(e)
        })?;

        if !ACCEPTED_STATUSES.contains(&status) {
            error!(status, body = %body, "Authentication failed");
            return Err(ClientError::Auth { status, body });
        }

        let bearer = serde_json::from_str::<LoginResponse>(&body)
            .ok()
            .and_then(|r| r.access_token);

        debug!(
            has_cookie = cookie.is_some(),
            has_bearer = bearer.is_some(),
            "Session established"
        );
        if cookie.is_none() && bearer.is_none() {
            warn!("Login succeeded but returned neither cookies nor an access token");
        }

        session.set_token(SessionToken { cookie, bearer });
        info!("Authentication successful");
        Ok(())
    }

    async fn submit(
        &self,
        session: &Session,
        payload: Bytes,
        filename: &str,
        test_name: &str,
    ) -> TestResult {
        let size = payload.len();

        let Some(token) = session.token() else {
            error!(test_name, "Not authenticated, skipping upload");
            return TestResult::unauthenticated(test_name, filename, size);
        };

        let mut result = TestResult::new(test_name, filename, size);

        let form = match Self::upload_form(payload, filename) {
            Ok(form) => form,
            Err(e) => {
                error!(error = %e, "Failed to build upload form");
                result.error = Some(e.to_string());
                return result;
            }
        };

        let url = session.url(TRANSCRIBE_PATH);
        let mut request = self.client.post(&url).multipart(form);
        if let Some(cookie) = &token.cookie {
            request = request.header(COOKIE, cookie);
        }
        if let Some(bearer) = &token.bearer {
            request = request.bearer_auth(bearer);
        }

        info!(url = %url, bytes = size, "Sending transcription request");
        let start = Instant::now();

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                result.set_elapsed(start.elapsed());
                error!(error = %e, "Request failed");
                result.error = Some(e.to_string());
                return result;
            }
        };

        let status = response.status().as_u16();
        let body = response.text().await;
        result.set_elapsed(start.elapsed());

        // A body cut off mid-read is a transport failure, not a response
        let body = match body {
            Ok(body) => body,
            Err(e) => {
                error!(status, error = %e, "Failed to read response body");
                result.error = Some(e.to_string());
                return result;
            }
        };
        result.set_status(status);

        if result.success {
            info!(
                status,
                elapsed = ?result.elapsed(),
                "Transcription accepted"
            );
            apply_body(&mut result, &body);
        } else {
            error!(status, body = %body, "Transcription rejected");
            result.error = Some(body);
        }

        result
    }

    fn name(&self) -> &str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_json, header, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn target() -> HttpTarget {
        HttpTarget::new(Duration::from_secs(5)).unwrap()
    }

    async fn logged_in(server: &MockServer) -> Session {
        Mock::given(method("POST"))
            .and(path(LOGIN_PATH))
            .respond_with(
                ResponseTemplate::new(201)
                    .append_header("set-cookie", "auth_token=abc123; HttpOnly; Path=/")
                    .set_body_json(json!({"access_token": "abc123"})),
            )
            .mount(server)
            .await;

        let mut session = Session::new(server.uri(), "admin@clinic.test", "password123");
        target().authenticate(&mut session).await.unwrap();
        session
    }

    #[tokio::test]
    async fn authenticate_captures_cookie_and_token() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(LOGIN_PATH))
            .and(body_json(json!({
                "identifier": "admin@clinic.test",
                "password": "password123"
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .append_header("set-cookie", "auth_token=abc123; HttpOnly; Path=/")
                    .set_body_json(json!({"access_token": "abc123", "user": {"id": 1}})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let mut session = Session::new(server.uri(), "admin@clinic.test", "password123");
        target().authenticate(&mut session).await.unwrap();

        let token = session.token().unwrap();
        assert_eq!(token.cookie.as_deref(), Some("auth_token=abc123"));
        assert_eq!(token.bearer.as_deref(), Some("abc123"));
    }

    #[tokio::test]
    async fn authenticate_rejected() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(LOGIN_PATH))
            .respond_with(ResponseTemplate::new(401).set_body_string("Invalid credentials"))
            .mount(&server)
            .await;

        let mut session = Session::new(server.uri(), "admin@clinic.test", "wrong");
        let err = target().authenticate(&mut session).await.unwrap_err();

        assert!(matches!(err, ClientError::Auth { status: 401, ref body } if body == "Invalid credentials"));
        assert!(!session.is_authenticated());
    }

    /// Serve one connection: read the request, then send `head` followed by
    /// a body shorter than the advertised Content-Length and hang up.
    async fn truncated_body_server(head: &'static str) -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();

            let mut request = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                request.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&request).to_lowercase();
                if let Some(end) = text.find("\r\n\r\n") {
                    let body_len = text[..end]
                        .lines()
                        .find_map(|l| l.strip_prefix("content-length:"))
                        .and_then(|v| v.trim().parse::<usize>().ok())
                        .unwrap_or(0);
                    if request.len() >= end + 4 + body_len {
                        break;
                    }
                }
                if n == 0 {
                    break;
                }
            }

            socket.write_all(head.as_bytes()).await.unwrap();
            socket.write_all(b"{\"access_tok").await.unwrap();
            socket.shutdown().await.ok();
        });

        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn authenticate_body_cut_off_is_transport_error() {
        let url = truncated_body_server(
            "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: 64\r\n\r\n",
        )
        .await;

        let mut session = Session::new(url, "admin@clinic.test", "password123");
        let err = target().authenticate(&mut session).await.unwrap_err();

        assert!(matches!(err, ClientError::Transport(_)));
        assert!(!session.is_authenticated());
    }

    #[tokio::test]
    async fn authenticate_unreachable() {
        // Nothing listens on the discard port
        let mut session = Session::new("http://127.0.0.1:9", "u", "p");
        let err = target().authenticate(&mut session).await.unwrap_err();
        assert!(matches!(err, ClientError::Transport(_)));
        assert!(!session.is_authenticated());
    }

    #[tokio::test]
    async fn submit_without_session_sends_nothing() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(TRANSCRIBE_PATH))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let session = Session::new(server.uri(), "u", "p");
        let result = target()
            .submit(&session, probe_payload::generate(128), "a.webm", "A")
            .await;

        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("Not authenticated"));
        assert_eq!(result.file_size_bytes, 128);
    }

    #[tokio::test]
    async fn submit_success_parses_transcript() {
        let server = MockServer::start().await;
        let session = logged_in(&server).await;

        Mock::given(method("POST"))
            .and(path(TRANSCRIBE_PATH))
            .and(header("cookie", "auth_token=abc123"))
            .and(header("authorization", "Bearer abc123"))
            .and(header_exists("content-type"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"text": "hello", "segments": [1, 2]})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let result = target()
            .submit(&session, probe_payload::generate(2048), "small.webm", "Small")
            .await;

        assert!(result.success);
        assert_eq!(result.status_code, Some(200));
        assert_eq!(result.transcript_length, Some(5));
        assert_eq!(result.segments_count, Some(2));
        assert_eq!(result.file_size_bytes, 2048);
        assert!(result.elapsed_time_seconds.is_some());
        assert!(result.error.is_none());
    }

    #[tokio::test]
    async fn submit_sends_multipart_file_field() {
        let server = MockServer::start().await;
        let session = logged_in(&server).await;

        Mock::given(method("POST"))
            .and(path(TRANSCRIBE_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"text": ""})))
            .mount(&server)
            .await;

        target()
            .submit(&session, probe_payload::generate(256), "probe.webm", "Probe")
            .await;

        let requests = server.received_requests().await.unwrap();
        let upload = requests
            .iter()
            .find(|r| r.url.path() == TRANSCRIBE_PATH)
            .unwrap();
        let content_type = upload.headers.get("content-type").unwrap().to_str().unwrap();
        assert!(content_type.starts_with("multipart/form-data"));

        let body = String::from_utf8_lossy(&upload.body).to_lowercase();
        assert!(body.contains(r#"name="file"; filename="probe.webm""#));
        assert!(body.contains("content-type: audio/webm"));
    }

    #[tokio::test]
    async fn submit_unexpected_status_records_body() {
        let server = MockServer::start().await;
        let session = logged_in(&server).await;

        Mock::given(method("POST"))
            .and(path(TRANSCRIBE_PATH))
            .respond_with(ResponseTemplate::new(413).set_body_string("Payload Too Large"))
            .mount(&server)
            .await;

        let result = target()
            .submit(&session, probe_payload::generate(64), "big.webm", "Big")
            .await;

        assert!(!result.success);
        assert_eq!(result.status_code, Some(413));
        assert_eq!(result.error.as_deref(), Some("Payload Too Large"));
        assert_eq!(result.transcript_length, None);
    }

    #[tokio::test]
    async fn submit_timeout_is_transport_failure() {
        let server = MockServer::start().await;
        let session = logged_in(&server).await;

        Mock::given(method("POST"))
            .and(path(TRANSCRIBE_PATH))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
            .mount(&server)
            .await;

        let short = HttpTarget::new(Duration::from_millis(200)).unwrap();
        let result = short
            .submit(&session, probe_payload::generate(64), "slow.webm", "Slow")
            .await;

        assert!(!result.success);
        assert_eq!(result.status_code, None);
        assert!(result.error.is_some());
    }

    #[test]
    fn test_session_cookie_joins_pairs() {
        let mut headers = HeaderMap::new();
        headers.append(SET_COOKIE, "a=1; Path=/".parse().unwrap());
        headers.append(SET_COOKIE, "b=2; HttpOnly".parse().unwrap());
        headers.append(SET_COOKIE, "garbage".parse().unwrap());
        assert_eq!(session_cookie(&headers).as_deref(), Some("a=1; b=2"));

        assert_eq!(session_cookie(&HeaderMap::new()), None);
    }
}
