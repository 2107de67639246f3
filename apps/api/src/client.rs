//! Typed client for the auth API plus the view gating a frontend builds on it.
//!
//! Holds the signed-in user in memory. The session cookie lives in reqwest's
//! cookie store, so every call after login rides the same server session.

use reqwest::{Client, Url};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tracing::debug;

use crate::auth::AuthSession;
use crate::models::user::PublicUser;
use crate::resume::handlers::AnalyzeResponse;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server rejected the call; `message` is its `{message}` body.
    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("Please enter a valid URL")]
    InvalidJobLink,

    #[error("Not signed in")]
    SignedOut,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Dashboard sub-sections.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    #[default]
    Overview,
    Upload,
    Jobs,
    Skills,
    Settings,
}

/// Which view tree to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Landing,
    Dashboard(Section),
}

/// Progress label of a submitted job link. Only the oldest link is shown as
/// analyzed; the next one is in progress and the rest wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum JobLinkStatus {
    Analyzed,
    Processing,
    Queued,
}

impl JobLinkStatus {
    fn at(position: usize) -> Self {
        match position {
            0 => JobLinkStatus::Analyzed,
            1 => JobLinkStatus::Processing,
            _ => JobLinkStatus::Queued,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            JobLinkStatus::Analyzed => "Analyzed",
            JobLinkStatus::Processing => "Processing",
            JobLinkStatus::Queued => "Queued",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobLink {
    pub url: String,
    /// Host without a leading `www.`.
    pub domain: String,
    pub status: JobLinkStatus,
}

pub struct SessionClient {
    http: Client,
    base_url: String,
    user: Option<PublicUser>,
    section: Section,
    job_links: Vec<Url>,
}

impl SessionClient {
    /// `base_url` is the server root, e.g. `http://localhost:5000`.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        let http = Client::builder().cookie_store(true).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            user: None,
            section: Section::default(),
            job_links: Vec::new(),
        })
    }

    pub fn user(&self) -> Option<&PublicUser> {
        self.user.as_ref()
    }

    pub fn is_signed_in(&self) -> bool {
        self.user.is_some()
    }

    pub fn view(&self) -> View {
        match self.user {
            Some(_) => View::Dashboard(self.section),
            None => View::Landing,
        }
    }

    /// Switches dashboard section. Ignored while signed out.
    pub fn navigate(&mut self, section: Section) {
        if self.is_signed_in() {
            self.section = section;
        }
    }

    /// Records a job posting URL for later analysis. Links are kept in memory
    /// for the current sign-in only.
    pub fn add_job_link(&mut self, raw: &str) -> Result<JobLink, ClientError> {
        if !self.is_signed_in() {
            return Err(ClientError::SignedOut);
        }
        let url = Url::parse(raw.trim()).map_err(|_| ClientError::InvalidJobLink)?;
        self.job_links.push(url);

        let position = self.job_links.len() - 1;
        Ok(job_link(position, &self.job_links[position]))
    }

    /// Submitted links in submission order, each with its status.
    pub fn job_links(&self) -> Vec<JobLink> {
        self.job_links
            .iter()
            .enumerate()
            .map(|(position, url)| job_link(position, url))
            .collect()
    }

    pub async fn register(
        &mut self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, ClientError> {
        let session: AuthSession = self
            .post_json(
                "/api/auth/register",
                json!({"name": name, "email": email, "password": password}),
            )
            .await?;
        self.sign_in(session.user.clone());
        Ok(session)
    }

    pub async fn login(&mut self, email: &str, password: &str) -> Result<AuthSession, ClientError> {
        let session: AuthSession = self
            .post_json(
                "/api/auth/login",
                json!({"email": email, "password": password}),
            )
            .await?;
        self.sign_in(session.user.clone());
        Ok(session)
    }

    /// Asks the server who the session belongs to. Any failure leaves the
    /// client signed out rather than erroring.
    pub async fn restore(&mut self) -> Option<&PublicUser> {
        let result = match self.http.get(self.url("/api/auth/me")).send().await {
            Ok(response) => Self::decode::<PublicUser>(response).await,
            Err(e) => Err(e.into()),
        };

        match result {
            Ok(user) => self.sign_in(user),
            Err(e) => {
                debug!("Session restore failed: {e}");
                self.sign_out();
            }
        }
        self.user.as_ref()
    }

    /// Clears local state even if the server call fails.
    pub async fn logout(&mut self) -> Result<(), ClientError> {
        let result = self.http.post(self.url("/api/auth/logout")).send().await;
        self.sign_out();

        let response = result?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(Self::api_error(response).await)
        }
    }

    /// Sends a resume for analysis under the current session.
    pub async fn upload_resume(
        &self,
        file_name: &str,
        content: Vec<u8>,
    ) -> Result<AnalyzeResponse, ClientError> {
        let part = reqwest::multipart::Part::bytes(content).file_name(file_name.to_string());
        let form = reqwest::multipart::Form::new().part("file", part);
        let response = self
            .http
            .post(self.url("/api/resume/analyze"))
            .multipart(form)
            .send()
            .await?;
        Self::decode(response).await
    }

    fn sign_in(&mut self, user: PublicUser) {
        if self.user.as_ref().map(|u| u.id) != Some(user.id) {
            self.job_links.clear();
        }
        self.user = Some(user);
        self.section = Section::default();
    }

    fn sign_out(&mut self) {
        self.user = None;
        self.section = Section::default();
        self.job_links.clear();
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        path: &str,
        body: serde_json::Value,
    ) -> Result<T, ClientError> {
        let response = self.http.post(self.url(path)).json(&body).send().await?;
        Self::decode(response).await
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ClientError> {
        if response.status().is_success() {
            Ok(response.json().await?)
        } else {
            Err(Self::api_error(response).await)
        }
    }

    async fn api_error(response: reqwest::Response) -> ClientError {
        let status = response.status();
        let message = response
            .json::<ErrorBody>()
            .await
            .ok()
            .and_then(|b| b.message)
            .unwrap_or_else(|| format!("Request failed with status {status}"));
        ClientError::Api {
            status: status.as_u16(),
            message,
        }
    }
}

fn job_link(position: usize, url: &Url) -> JobLink {
    let domain = match url.host_str() {
        Some(host) => host.strip_prefix("www.").unwrap_or(host).to_string(),
        None => url.to_string(),
    };
    JobLink {
        url: url.to_string(),
        domain,
        status: JobLinkStatus::at(position),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::build_router;
    use crate::test_support::test_state;

    async fn spawn_server() -> String {
        let app = build_router(test_state("http://127.0.0.1:9/process_resume"));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn test_signed_out_client_sees_landing() {
        let mut client = SessionClient::new("http://localhost:5000").unwrap();
        assert_eq!(client.view(), View::Landing);
        client.navigate(Section::Skills);
        assert_eq!(client.view(), View::Landing);
    }

    #[tokio::test]
    async fn test_register_gates_dashboard_and_navigation() {
        let base = spawn_server().await;
        let mut client = SessionClient::new(&base).unwrap();

        let session = client.register("Ana", "ana@x.com", "secret1").await.unwrap();
        assert_eq!(session.user.email, "ana@x.com");
        assert_eq!(client.view(), View::Dashboard(Section::Overview));

        client.navigate(Section::Upload);
        assert_eq!(client.view(), View::Dashboard(Section::Upload));
    }

    #[tokio::test]
    async fn test_restore_uses_session_cookie() {
        let base = spawn_server().await;
        let mut client = SessionClient::new(&base).unwrap();
        assert!(client.restore().await.is_none());

        client.register("Ana", "ana@x.com", "secret1").await.unwrap();
        let restored = client.restore().await.cloned().unwrap();
        assert_eq!(restored.name, "Ana");
    }

    #[tokio::test]
    async fn test_logout_returns_to_landing_and_drops_session() {
        let base = spawn_server().await;
        let mut client = SessionClient::new(&base).unwrap();
        client.register("Ana", "ana@x.com", "secret1").await.unwrap();

        client.logout().await.unwrap();
        assert_eq!(client.view(), View::Landing);
        assert!(client.restore().await.is_none());
    }

    #[tokio::test]
    async fn test_server_message_is_surfaced() {
        let base = spawn_server().await;
        let mut client = SessionClient::new(&base).unwrap();
        client.register("Ana", "ana@x.com", "secret1").await.unwrap();

        let mut other = SessionClient::new(&base).unwrap();
        let err = other.login("ana@x.com", "wrong").await.unwrap_err();
        match err {
            ClientError::Api { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "Invalid credentials");
            }
            e => panic!("unexpected error: {e}"),
        }
        assert_eq!(other.view(), View::Landing);
    }

    #[tokio::test]
    async fn test_job_links_track_domain_and_status() {
        let base = spawn_server().await;
        let mut client = SessionClient::new(&base).unwrap();
        client.register("Ana", "ana@x.com", "secret1").await.unwrap();

        let first = client
            .add_job_link("https://www.linkedin.com/jobs/view/123")
            .unwrap();
        assert_eq!(first.domain, "linkedin.com");
        assert_eq!(first.status, JobLinkStatus::Analyzed);

        client.add_job_link("https://jobs.lever.co/acme/42").unwrap();
        client.add_job_link("http://example.com/careers").unwrap();

        let links = client.job_links();
        let labels: Vec<_> = links.iter().map(|l| l.status.label()).collect();
        assert_eq!(labels, ["Analyzed", "Processing", "Queued"]);
        assert_eq!(links[1].domain, "jobs.lever.co");
        assert_eq!(links[2].url, "http://example.com/careers");
    }

    #[tokio::test]
    async fn test_invalid_job_link_is_rejected() {
        let base = spawn_server().await;
        let mut client = SessionClient::new(&base).unwrap();
        client.register("Ana", "ana@x.com", "secret1").await.unwrap();

        for raw in ["not a url", "linkedin.com/jobs", "   "] {
            let err = client.add_job_link(raw).unwrap_err();
            assert!(matches!(err, ClientError::InvalidJobLink));
            assert_eq!(err.to_string(), "Please enter a valid URL");
        }
        assert!(client.job_links().is_empty());
    }

    #[tokio::test]
    async fn test_job_links_need_sign_in_and_reset_on_logout() {
        let base = spawn_server().await;
        let mut client = SessionClient::new(&base).unwrap();
        assert!(matches!(
            client.add_job_link("https://example.com/job"),
            Err(ClientError::SignedOut)
        ));

        client.register("Ana", "ana@x.com", "secret1").await.unwrap();
        client.add_job_link("https://example.com/job").unwrap();
        client.restore().await.unwrap();
        assert_eq!(client.job_links().len(), 1);

        client.logout().await.unwrap();
        assert!(client.job_links().is_empty());
    }
}
