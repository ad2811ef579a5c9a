//! REST client for the game-hosting API.

use super::{AccountInfo, HostingApi, HostingError, ServerInfo, extract_status};
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

const USER_AGENT: &str = concat!("gsbot/", env!("CARGO_PKG_VERSION"));

/// Response wrapper used by every endpoint.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    error: Option<String>,
    data: Option<T>,
}

pub struct HttpHostingClient {
    http: Client,
    base_url: String,
}

impl HttpHostingClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, HostingError> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn request(&self, method: Method, path: &str, api_key: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}{}", self.base_url, path))
            .bearer_auth(api_key)
    }

    async fn call<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        path: &str,
    ) -> Result<Option<T>, HostingError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        debug!(path, status = status.as_u16(), "Hosting API reply");

        let envelope: Envelope<T> = match serde_json::from_str(&body) {
            Ok(envelope) => envelope,
            Err(e) if status.is_success() && status.as_u16() != 208 => {
                return Err(HostingError::Decode(e.to_string()));
            }
            Err(_) => return Err(HostingError::from_status(status.as_u16(), Some(body))),
        };

        if status.is_success() && envelope.success {
            return Ok(envelope.data);
        }

        // Some failures arrive with a 200 and the real code inside the message.
        let code = envelope
            .error
            .as_deref()
            .and_then(extract_status)
            .filter(|_| status.as_u16() == 200)
            .unwrap_or(status.as_u16());
        Err(HostingError::from_status(code, envelope.error))
    }

    async fn call_data<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        path: &str,
    ) -> Result<T, HostingError> {
        self.call(request, path)
            .await?
            .ok_or_else(|| HostingError::Decode(format!("{path}: reply carries no data")))
    }
}

#[async_trait]
impl HostingApi for HttpHostingClient {
    async fn account(&self, api_key: &str) -> Result<AccountInfo, HostingError> {
        let path = "/account/";
        self.call_data(self.request(Method::GET, path, api_key), path)
            .await
    }

    async fn list_servers(&self, api_key: &str) -> Result<Vec<ServerInfo>, HostingError> {
        let path = "/servers/";
        let servers: Option<Vec<ServerInfo>> =
            self.call(self.request(Method::GET, path, api_key), path).await?;
        Ok(servers.unwrap_or_default())
    }

    async fn start_server(
        &self,
        api_key: &str,
        server_id: &str,
        use_own_credits: bool,
    ) -> Result<(), HostingError> {
        let path = format!("/servers/{server_id}/start/");
        let request = self
            .request(Method::POST, &path, api_key)
            .json(&serde_json::json!({ "useOwnCredits": use_own_credits }));
        self.call::<serde_json::Value>(request, &path).await?;
        Ok(())
    }

    async fn stop_server(&self, api_key: &str, server_id: &str) -> Result<(), HostingError> {
        let path = format!("/servers/{server_id}/stop/");
        self.call::<serde_json::Value>(self.request(Method::GET, &path, api_key), &path)
            .await?;
        Ok(())
    }

    async fn server_info(&self, api_key: &str, server_id: &str) -> Result<ServerInfo, HostingError> {
        let path = format!("/servers/{server_id}/");
        self.call_data(self.request(Method::GET, &path, api_key), &path)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hosting::ServerStatus;
    use axum::extract::Path;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::{Value, json};

    fn authorized(headers: &HeaderMap) -> bool {
        headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            == Some("Bearer good")
    }

    fn server_json(id: &str, status: i64) -> Value {
        json!({
            "id": id,
            "name": "Survival",
            "address": "survival.example.net",
            "motd": "hi",
            "status": status,
            "host": null,
            "port": null,
            "players": {"max": 10, "count": 0, "list": []},
            "software": {"id": "s", "name": "Paper", "version": "1.21"},
            "shared": false
        })
    }

    async fn serve() -> String {
        let app = Router::new()
            .route(
                "/account/",
                get(|headers: HeaderMap| async move {
                    if authorized(&headers) {
                        (
                            StatusCode::OK,
                            Json(json!({"success": true, "error": null, "data": {
                                "name": "tester", "email": "t@example.net",
                                "verified": true, "credits": 3.5
                            }})),
                        )
                    } else {
                        (
                            StatusCode::FORBIDDEN,
                            Json(json!({"success": false, "error": "Invalid API key", "data": null})),
                        )
                    }
                }),
            )
            .route(
                "/servers/",
                get(|| async {
                    Json(json!({"success": true, "error": null, "data": [server_json("a1", 0), server_json("b2", 1)]}))
                }),
            )
            .route(
                "/servers/:id/",
                get(|Path(id): Path<String>| async move {
                    Json(json!({"success": true, "error": null, "data": server_json(&id, 2)}))
                }),
            )
            .route(
                "/servers/:id/start/",
                post(|Json(body): Json<Value>| async move {
                    assert_eq!(body["useOwnCredits"], json!(false));
                    Json(json!({"success": true}))
                }),
            )
            .route(
                "/servers/:id/stop/",
                get(|| async {
                    (
                        StatusCode::ALREADY_REPORTED,
                        Json(json!({"success": false, "error": "Server is not online", "data": null})),
                    )
                }),
            );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/")
    }

    fn client(base: &str) -> HttpHostingClient {
        HttpHostingClient::new(base, Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn account_with_valid_key() {
        let base = serve().await;
        let account = client(&base).account("good").await.unwrap();
        assert_eq!(account.name, "tester");
        assert!(account.verified);
    }

    #[tokio::test]
    async fn account_with_bad_key_is_forbidden() {
        let base = serve().await;
        let err = client(&base).account("bad").await.unwrap_err();
        assert!(matches!(err, HostingError::Forbidden(ref m) if m == "Invalid API key"));
    }

    #[tokio::test]
    async fn servers_are_listed_in_order() {
        let base = serve().await;
        let servers = client(&base).list_servers("good").await.unwrap();
        let ids: Vec<&str> = servers.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["a1", "b2"]);
        assert_eq!(servers[1].status, ServerStatus::Online);
    }

    #[tokio::test]
    async fn server_info_and_start() {
        let base = serve().await;
        let api = client(&base);
        let info = api.server_info("good", "a1").await.unwrap();
        assert_eq!(info.id, "a1");
        assert_eq!(info.status, ServerStatus::Starting);
        api.start_server("good", "a1", false).await.unwrap();
    }

    #[tokio::test]
    async fn stopping_twice_is_already_reported() {
        let base = serve().await;
        let err = client(&base).stop_server("good", "a1").await.unwrap_err();
        assert!(matches!(err, HostingError::AlreadyReported(ref m) if m == "Server is not online"));
    }

    #[tokio::test]
    async fn reply_without_data_field_is_accepted() {
        let base = serve().await;
        let api = client(&base);
        let path = "/servers/a1/start/";
        let request = api
            .request(Method::POST, path, "good")
            .json(&json!({"useOwnCredits": false}));

        let reply: Option<Value> = api.call(request, path).await.unwrap();
        assert!(reply.is_none());
    }
}
