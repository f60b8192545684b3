use anyhow::{Context, Result};
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::debug;

use crate::annotation::ApiAnnotation;

/// Identifier of a check-run held by the external service.
pub(crate) type CheckId = u64;

/// Final state reported when a check-run is closed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Conclusion {
    Success,
    Failure,
}

impl Conclusion {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failure => "failure",
        }
    }
}

/// Commit check-run publishing service. Calls are issued strictly
/// sequentially by the pusher.
pub(crate) trait ChecksService {
    /// Open a new in-progress check-run for the head commit.
    fn create(&self, name: &str) -> Result<CheckId>;

    /// Push one chunk of annotations into an open check-run.
    fn update(
        &self,
        check_id: CheckId,
        title: &str,
        summary: &str,
        annotations: &[ApiAnnotation],
    ) -> Result<()>;

    /// Mark the check-run completed with its conclusion and final summary.
    fn close(&self, check_id: CheckId, conclusion: Conclusion, title: &str, summary: &str)
    -> Result<()>;
}

/// GitHub Checks API client over a blocking HTTP transport.
pub(crate) struct GitHubChecks {
    client: Client,
    api_url: String,
    owner: String,
    repo: String,
    head_sha: String,
    token: String,
}

impl GitHubChecks {
    pub(crate) fn new(
        api_url: &str,
        owner: &str,
        repo: &str,
        head_sha: &str,
        token: &str,
    ) -> Result<Self> {
        let client = Client::builder()
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            owner: owner.to_string(),
            repo: repo.to_string(),
            head_sha: head_sha.to_string(),
            token: token.to_string(),
        })
    }

    fn runs_url(&self) -> String {
        format!(
            "{}/repos/{}/{}/check-runs",
            self.api_url, self.owner, self.repo
        )
    }

    fn run_url(&self, check_id: CheckId) -> String {
        format!("{}/{check_id}", self.runs_url())
    }

    fn send(&self, request: RequestBuilder, payload: &impl Serialize) -> Result<Response> {
        let response = request
            .bearer_auth(&self.token)
            .header(header::ACCEPT, "application/vnd.github+json")
            .header(
                header::USER_AGENT,
                concat!("sarif-annotate/", env!("CARGO_PKG_VERSION")),
            )
            .json(payload)
            .send()?;
        Ok(response.error_for_status()?)
    }
}

impl ChecksService for GitHubChecks {
    fn create(&self, name: &str) -> Result<CheckId> {
        let payload = CreateCheck {
            name,
            head_sha: &self.head_sha,
            status: "in_progress",
            started_at: now_rfc3339()?,
        };
        let response = self
            .send(self.client.post(self.runs_url()), &payload)
            .context("failed to create check-run")?;
        let created: CreatedCheck = response
            .json()
            .context("failed to decode check-run create response")?;
        debug!(check_id = created.id, "created check-run");
        Ok(created.id)
    }

    fn update(
        &self,
        check_id: CheckId,
        title: &str,
        summary: &str,
        annotations: &[ApiAnnotation],
    ) -> Result<()> {
        let payload = UpdateCheck {
            status: "in_progress",
            conclusion: None,
            completed_at: None,
            output: CheckOutput {
                title,
                summary,
                annotations: Some(annotations),
            },
        };
        self.send(self.client.patch(self.run_url(check_id)), &payload)
            .context("failed to update check-run")?;
        debug!(check_id, count = annotations.len(), "updated check-run");
        Ok(())
    }

    fn close(
        &self,
        check_id: CheckId,
        conclusion: Conclusion,
        title: &str,
        summary: &str,
    ) -> Result<()> {
        let payload = UpdateCheck {
            status: "completed",
            conclusion: Some(conclusion.as_str()),
            completed_at: Some(now_rfc3339()?),
            output: CheckOutput {
                title,
                summary,
                annotations: None,
            },
        };
        self.send(self.client.patch(self.run_url(check_id)), &payload)
            .context("failed to close check-run")?;
        debug!(check_id, conclusion = conclusion.as_str(), "closed check-run");
        Ok(())
    }
}

fn now_rfc3339() -> Result<String> {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .context("failed to format timestamp")
}

#[derive(Serialize)]
struct CreateCheck<'a> {
    name: &'a str,
    head_sha: &'a str,
    status: &'a str,
    started_at: String,
}

#[derive(Serialize)]
struct UpdateCheck<'a> {
    status: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    conclusion: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    completed_at: Option<String>,
    output: CheckOutput<'a>,
}

#[derive(Serialize)]
struct CheckOutput<'a> {
    title: &'a str,
    summary: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    annotations: Option<&'a [ApiAnnotation]>,
}

#[derive(Deserialize)]
struct CreatedCheck {
    id: u64,
}
