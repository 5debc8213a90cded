use chrono::{DateTime, Duration, TimeDelta, TimeZone, Utc};
use reqwest::{header, header::HeaderValue, Method, StatusCode, Url};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, trace};

use super::models::{
    Branch, ClientError, GitCommit, NewCommit, NewTree, RateLimitOverview, Reference, Tree,
    UpdateReference,
};
use super::{Auth, ClientBuilder, Error, Result};

// -------------------------------------------------------------------------------------------------
// Client
// -------------------------------------------------------------------------------------------------
pub struct Client {
    pub(super) base_url: Url,
    pub(super) inner: reqwest::Client,
    pub(super) auth: Auth,
}

impl Client {
    pub fn new() -> Result<Self> {
        ClientBuilder::new().build()
    }

    pub fn is_authenticated(&self) -> bool {
        match self.auth {
            Auth::Unauthenticated => false,
            Auth::Token(_) => true,
        }
    }

    pub async fn get_rate_limit(&self) -> Result<RateLimitOverview> {
        self.send_json(Method::GET, &["rate_limit"], None::<&()>).await
    }

    /// Get a branch, including its head commit and that commit's tree.
    ///
    /// The branch name may contain slashes.
    pub async fn get_branch(&self, owner: &str, repo: &str, branch: &str) -> Result<Branch> {
        let mut path = vec!["repos", owner, repo, "branches"];
        path.extend(branch.split('/'));
        self.send_json(Method::GET, &path, None::<&()>).await
    }

    pub async fn create_tree(&self, owner: &str, repo: &str, tree: &NewTree<'_>) -> Result<Tree> {
        self.send_json(Method::POST, &["repos", owner, repo, "git", "trees"], Some(tree))
            .await
    }

    pub async fn create_commit(
        &self,
        owner: &str,
        repo: &str,
        commit: &NewCommit<'_>,
    ) -> Result<GitCommit> {
        self.send_json(Method::POST, &["repos", owner, repo, "git", "commits"], Some(commit))
            .await
    }

    /// Move `refs/heads/<branch>` to a new commit.
    pub async fn update_ref(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
        update: &UpdateReference,
    ) -> Result<Reference> {
        let mut path = vec!["repos", owner, repo, "git", "refs", "heads"];
        path.extend(branch.split('/'));
        self.send_json(Method::PATCH, &path, Some(update)).await
    }
}

/// Create a URL from the given base, path parts, and parameters.
///
/// Each path part becomes one percent-encoded path segment, so characters like `#`, `?`, and `%`
/// in a branch name stay in the path. The path parts should not contain slashes.
fn url_from_path_parts_and_params(
    base_url: Url,
    path_parts: &[&str],
    params: &[(&str, &str)],
) -> Result<Url> {
    if let Some(p) = path_parts.iter().find(|p| p.contains('/')) {
        return Err(Error::UrlSlashError(p.to_string()));
    }

    let mut url = base_url.clone();
    url.set_query(None);
    url.set_fragment(None);
    {
        let mut segments = url
            .path_segments_mut()
            .map_err(|()| Error::UrlBaseError(base_url))?;
        segments.pop_if_empty().extend(path_parts);
        if path_parts.is_empty() {
            segments.push("");
        }
    }
    if !params.is_empty() {
        url.query_pairs_mut().extend_pairs(params);
    }
    Ok(url)
}


// private implementation
impl Client {
    /// Construct a `Url` from the given path parts and query parameters.
    fn make_url(&self, path_parts: &[&str], params: &[(&str, &str)]) -> Result<Url> {
        url_from_path_parts_and_params(self.base_url.clone(), path_parts, params)
    }

    async fn send_json<B, T>(
        &self,
        method: Method,
        path_parts: &[&str],
        body: Option<&B>,
    ) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.send(method, path_parts, body).await?;
        let body = response.json().await?;
        Ok(body)
    }

    async fn send<B>(
        &self,
        method: Method,
        path_parts: &[&str],
        body: Option<&B>,
    ) -> Result<reqwest::Response>
    where
        B: Serialize + ?Sized,
    {
        let url = self.make_url(path_parts, &[])?;
        debug!("{method} {url}");

        // build request, handling authentication if any
        let request_builder = self
            .inner
            .request(method, url)
            .header(header::ACCEPT, "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28");
        let request_builder = match &self.auth {
            Auth::Token(token) => request_builder.bearer_auth(token.expose_secret()),
            Auth::Unauthenticated => request_builder,
        };
        let request_builder = match body {
            Some(body) => request_builder.json(body),
            None => request_builder,
        };

        // send request and wait for response
        let response = request_builder.send().await?;
        trace!("Response status: {}", response.status());

        // Check for rate limiting.
        //
        // Instead of using an HTTP 429 response code, GitHub uses 403 and sets the
        // `x-ratelimit-remaining` header to 0.
        //
        // From the GitHub docs on secondary rate limits: if the Retry-After response header is
        // present, retry after that many seconds. Otherwise, retry after the time given by the
        // x-ratelimit-reset header, in UTC epoch seconds.
        if response.status() == StatusCode::FORBIDDEN {
            if let Some(retry_after) = response.headers().get("Retry-After") {
                let wait =
                    atoi::atoi::<i64>(retry_after.as_bytes()).and_then(TimeDelta::try_seconds);
                let client_error = response.json().await?;
                return Err(Error::RateLimited { client_error, wait });
            }

            if let Some(b"0") = response
                .headers()
                .get("x-ratelimit-remaining")
                .map(HeaderValue::as_bytes)
            {
                let wait = || -> Option<Duration> {
                    let date = response.headers().get("date")?.to_str().ok()?;
                    let date = DateTime::parse_from_rfc2822(date).ok()?.with_timezone(&Utc);

                    let reset_time = response
                        .headers()
                        .get("x-ratelimit-reset")?
                        .to_str()
                        .ok()?
                        .parse::<i64>()
                        .ok()?;
                    let reset_time = Utc.timestamp_opt(reset_time, 0).single()?;

                    Some(reset_time - date)
                }();

                let client_error = response.json().await?;
                return Err(Error::RateLimited { client_error, wait });
            }
        }

        let status = response.status();
        if !status.is_success() {
            let client_error = response.json::<ClientError>().await.ok();
            return Err(Error::ApiError {
                status,
                client_error,
            });
        }

        Ok(response)
    }
}
