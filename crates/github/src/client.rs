use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pipeline::{
    Assignee, CommitSha, CommitSummary, IssueNumber, IssueSummary, PullRequestNumber,
    RepositoryName, SourceRepository, SourceRepositoryError,
};
use reqwest::{header::HeaderMap, RequestBuilder, Response, StatusCode};
use serde::{de::IgnoredAny, de::DeserializeOwned, Deserialize};
use tracing::{debug, instrument, warn};

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;

/// Page size requested from list endpoints (GitHub's maximum).
const PER_PAGE: usize = 100;

/// GitHub stops listing pull request commits after 250 entries.
const MAX_COMMIT_PAGES: u32 = 3;

/// Upper bound on label listings; larger backlogs are truncated.
const MAX_ISSUE_PAGES: u32 = 10;

const API_VERSION: &str = "2022-11-28";

/// Connection settings for [`GithubClient`].
#[derive(Clone)]
pub struct GithubClientConfig {
    /// REST API root, without a trailing slash.
    pub api_base_url: String,
    /// Personal access or installation token. Public repositories can be read
    /// without one, at a much lower rate limit.
    pub token: Option<String>,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl GithubClientConfig {
    pub const DEFAULT_API_BASE_URL: &'static str = "https://api.github.com";
}

impl Default for GithubClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: Self::DEFAULT_API_BASE_URL.to_string(),
            token: None,
            timeout: Duration::from_secs(10),
        }
    }
}

impl std::fmt::Debug for GithubClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GithubClientConfig")
            .field("api_base_url", &self.api_base_url)
            .field("token", &self.token.as_ref().map(|_| "<REDACTED>"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// The HTTP client could not be constructed.
#[derive(Debug, thiserror::Error)]
#[error("Failed to build GitHub HTTP client: {0}")]
pub struct ClientBuildError(#[from] reqwest::Error);

/// [`SourceRepository`] backed by the GitHub REST API.
#[derive(Clone)]
pub struct GithubClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl std::fmt::Debug for GithubClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GithubClient")
            .field("base_url", &self.base_url)
            .field("authenticated", &self.token.is_some())
            .finish()
    }
}

impl GithubClient {
    pub fn new(config: GithubClientConfig) -> Result<Self, ClientBuildError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("herald/", env!("CARGO_PKG_VERSION")))
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            http,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            token: config.token,
        })
    }

    fn get(&self, path: &str) -> RequestBuilder {
        let request = self
            .http
            .get(format!("{}{}", self.base_url, path))
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION);

        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn fetch_page<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        resource: &str,
    ) -> Result<Vec<T>, SourceRepositoryError> {
        let response = request.send().await.map_err(transport_error)?;
        let response = check_status(response, resource).await?;

        response
            .json::<Vec<T>>()
            .await
            .map_err(|e| SourceRepositoryError::Decode {
                message: e.to_string(),
            })
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct CommitResponse {
    sha: String,
    commit: CommitDetail,
}

#[derive(Debug, Deserialize)]
struct CommitDetail {
    message: String,
}

#[derive(Debug, Deserialize)]
struct IssueResponse {
    number: u64,
    title: String,
    html_url: String,
    assignee: Option<UserResponse>,
    /// Present only when the "issue" is really a pull request.
    #[serde(default)]
    pull_request: Option<IgnoredAny>,
}

#[derive(Debug, Deserialize)]
struct UserResponse {
    login: String,
    avatar_url: String,
}

impl CommitResponse {
    fn into_summary(self) -> Result<CommitSummary, SourceRepositoryError> {
        let sha = CommitSha::new(self.sha).ok_or_else(|| SourceRepositoryError::Decode {
            message: "commit has an empty sha".to_string(),
        })?;
        Ok(CommitSummary {
            sha,
            message: self.commit.message,
        })
    }
}

impl From<IssueResponse> for IssueSummary {
    fn from(issue: IssueResponse) -> Self {
        IssueSummary {
            number: IssueNumber::new(issue.number),
            title: issue.title,
            url: issue.html_url,
            assignee: issue.assignee.map(|user| Assignee {
                login: user.login,
                avatar_url: user.avatar_url,
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Error mapping
// ---------------------------------------------------------------------------

fn transport_error(error: reqwest::Error) -> SourceRepositoryError {
    SourceRepositoryError::Transport {
        message: error.to_string(),
    }
}

fn is_rate_limited(status: StatusCode, headers: &HeaderMap) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS
        || (status == StatusCode::FORBIDDEN
            && headers
                .get("x-ratelimit-remaining")
                .and_then(|v| v.to_str().ok())
                == Some("0"))
}

fn rate_limit_reset(headers: &HeaderMap) -> Option<DateTime<Utc>> {
    let epoch = headers
        .get("x-ratelimit-reset")?
        .to_str()
        .ok()?
        .parse::<i64>()
        .ok()?;
    DateTime::from_timestamp(epoch, 0)
}

async fn check_status(
    response: Response,
    resource: &str,
) -> Result<Response, SourceRepositoryError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    if is_rate_limited(status, response.headers()) {
        let reset_at = rate_limit_reset(response.headers());
        warn!(resource, ?reset_at, "GitHub rate limit exhausted");
        return Err(SourceRepositoryError::RateLimited { reset_at });
    }

    match status {
        StatusCode::NOT_FOUND => Err(SourceRepositoryError::NotFound {
            resource: resource.to_string(),
        }),
        StatusCode::UNAUTHORIZED => Err(SourceRepositoryError::Unauthorized),
        _ => {
            let message = response.text().await.unwrap_or_default();
            Err(SourceRepositoryError::Http {
                status: status.as_u16(),
                message,
            })
        }
    }
}

// ---------------------------------------------------------------------------
// SourceRepository
// ---------------------------------------------------------------------------

#[async_trait]
impl SourceRepository for GithubClient {
    #[instrument(skip_all, fields(repository = %repository, pull_request = %pull_request))]
    async fn get_pull_request_commits(
        &self,
        repository: &RepositoryName,
        pull_request: PullRequestNumber,
    ) -> Result<Vec<CommitSummary>, SourceRepositoryError> {
        let path = format!(
            "/repos/{}/{}/pulls/{}/commits",
            repository.owner(),
            repository.name(),
            pull_request
        );

        let mut commits = Vec::new();
        for page in 1..=MAX_COMMIT_PAGES {
            let request = self
                .get(&path)
                .query(&[("per_page", PER_PAGE.to_string()), ("page", page.to_string())]);
            let batch: Vec<CommitResponse> = self.fetch_page(request, &path).await?;
            let last_page = batch.len() < PER_PAGE;

            for commit in batch {
                commits.push(commit.into_summary()?);
            }
            if last_page {
                break;
            }
        }

        debug!(count = commits.len(), "Fetched pull request commits");
        Ok(commits)
    }

    #[instrument(skip_all, fields(repository = %repository, label = %label))]
    async fn get_issues_by_label(
        &self,
        repository: &RepositoryName,
        label: &str,
    ) -> Result<Vec<IssueSummary>, SourceRepositoryError> {
        let path = format!("/repos/{}/{}/issues", repository.owner(), repository.name());

        let mut issues = Vec::new();
        for page in 1..=MAX_ISSUE_PAGES {
            let request = self.get(&path).query(&[
                ("labels", label.to_string()),
                ("per_page", PER_PAGE.to_string()),
                ("page", page.to_string()),
            ]);
            let batch: Vec<IssueResponse> = self.fetch_page(request, &path).await?;
            // Pull requests count toward the page size.
            let last_page = batch.len() < PER_PAGE;

            issues.extend(
                batch
                    .into_iter()
                    .filter(|issue| issue.pull_request.is_none())
                    .map(IssueSummary::from),
            );
            if last_page {
                break;
            }
            if page == MAX_ISSUE_PAGES {
                warn!(
                    count = issues.len(),
                    max_pages = MAX_ISSUE_PAGES,
                    "Issue listing truncated at page limit"
                );
            }
        }

        debug!(count = issues.len(), "Fetched labelled issues");
        Ok(issues)
    }
}
