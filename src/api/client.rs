use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::rate_limit::retry_api;
use super::types::{OverviewData, Project, RecentActivity, Task, Team, User};
use super::ApiSource;
use crate::config::Config;
use crate::error::{Error, Result};

/// Responses may be bare or wrapped in a `data` envelope.
#[derive(Deserialize)]
#[serde(untagged)]
enum Envelope<T> {
    Wrapped { data: T },
    Bare(T),
}

impl<T> Envelope<T> {
    fn into_inner(self) -> T {
        match self {
            Envelope::Wrapped { data } => data,
            Envelope::Bare(inner) => inner,
        }
    }
}

/// `ApiSource` backed by the dashboard's REST API.
#[derive(Clone)]
pub struct HttpApiClient {
    client: Client,
    base_url: Url,
    token: Option<String>,
}

impl HttpApiClient {
    pub fn new(base_url: &str, token: Option<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: normalize_base(base_url)?,
            token,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            &config.api_url,
            config.token.clone(),
            Duration::from_secs(config.timeout_secs.max(1)),
        )
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve an endpoint path (e.g. `/users`) against the base URL.
    pub fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    /// GET `path`, retrying rate-limited responses.
    pub async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        retry_api!(self.get_once::<T>(path, query))
    }

    async fn get_once<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        let url = self.endpoint(path)?;
        let mut request = self
            .client
            .get(url)
            .header(header::ACCEPT, "application/json")
            .query(query);
        if let Some(ref token) = self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.bytes().await?;
        check_status(status, path)?;
        decode_body(path, &body)
    }
}

#[async_trait]
impl ApiSource for HttpApiClient {
    async fn users(&self) -> Result<Vec<User>> {
        self.get("/users", &[]).await
    }

    async fn tasks(&self) -> Result<Vec<Task>> {
        self.get("/tasks", &[]).await
    }

    async fn projects(&self) -> Result<Vec<Project>> {
        self.get("/projects", &[]).await
    }

    async fn teams(&self) -> Result<Vec<Team>> {
        self.get("/teams", &[]).await
    }

    async fn overview(&self) -> Result<OverviewData> {
        self.get("/dashboard/overview", &[]).await
    }

    async fn recent_activities(&self, limit: u32) -> Result<Vec<RecentActivity>> {
        self.get("/dashboard/activities", &[("limit", limit.to_string())])
            .await
    }
}

/// `Url::join` drops the last path segment unless the base ends with `/`.
fn normalize_base(base: &str) -> Result<Url> {
    let trimmed = base.trim();
    let with_slash = if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{trimmed}/")
    };
    let url = Url::parse(&with_slash)?;
    if url.cannot_be_a_base() {
        return Err(Error::Url(format!("not usable as a base URL: {base}")));
    }
    Ok(url)
}

fn check_status(status: StatusCode, path: &str) -> Result<()> {
    if status == StatusCode::UNAUTHORIZED {
        return Err(Error::Unauthorized(path.to_string()));
    }
    if !status.is_success() {
        return Err(Error::Status {
            status: status.as_u16(),
            path: path.to_string(),
        });
    }
    Ok(())
}

fn decode_body<T: DeserializeOwned>(path: &str, body: &[u8]) -> Result<T> {
    serde_json::from_slice::<Envelope<T>>(body)
        .map(Envelope::into_inner)
        .map_err(|e| Error::Decode {
            path: path.to_string(),
            message: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_keeps_base_path() {
        let client =
            HttpApiClient::new("https://dash.example.com/api", None, Duration::from_secs(5))
                .unwrap();
        assert_eq!(
            client.endpoint("/users").unwrap().as_str(),
            "https://dash.example.com/api/users"
        );
        assert_eq!(
            client.endpoint("dashboard/overview").unwrap().as_str(),
            "https://dash.example.com/api/dashboard/overview"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            HttpApiClient::new("not a url", None, Duration::from_secs(5)),
            Err(Error::Url(_))
        ));
    }

    #[test]
    fn test_check_status() {
        assert!(check_status(StatusCode::OK, "/users").is_ok());
        assert!(matches!(
            check_status(StatusCode::UNAUTHORIZED, "/users"),
            Err(Error::Unauthorized(_))
        ));
        match check_status(StatusCode::BAD_GATEWAY, "/teams") {
            Err(Error::Status { status, path }) => {
                assert_eq!(status, 502);
                assert_eq!(path, "/teams");
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[test]
    fn test_decode_bare_and_wrapped() {
        let bare: Vec<User> =
            decode_body("/users", br#"[{"id": 1, "name": "Ann", "role": "ceo"}]"#).unwrap();
        assert_eq!(bare.len(), 1);

        let wrapped: Vec<User> = decode_body(
            "/users",
            br#"{"data": [{"id": 1, "name": "Ann"}, {"id": 2, "name": "Bo"}]}"#,
        )
        .unwrap();
        assert_eq!(wrapped.len(), 2);

        let overview: OverviewData =
            decode_body("/dashboard/overview", br#"{"data": {"totalTasks": 4}}"#).unwrap();
        assert_eq!(overview.total_tasks, 4);
    }

    #[test]
    fn test_decode_malformed_is_typed_error() {
        let res: Result<Vec<Task>> = decode_body("/tasks", br#"[{"id": 1}]"#);
        match res {
            Err(Error::Decode { path, .. }) => assert_eq!(path, "/tasks"),
            other => panic!("expected decode error, got {other:?}"),
        }
    }
}
