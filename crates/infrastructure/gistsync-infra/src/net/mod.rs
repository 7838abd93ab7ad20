use bytes::Bytes;
use gistsync_config::{GIST_PAGE_SIZE, USER_AGENT};
use gistsync_core::formats::{CreateGistRequest, EditGistRequest, GistExternal};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::{Client, Response, StatusCode, Url};
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum GistApiError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("access token rejected (HTTP {0})")]
    Unauthorized(u16),
    #[error("invalid api url {0}")]
    InvalidUrl(String),
    #[error("HTTP {status} from {url}: {body}")]
    Status {
        status: u16,
        url: String,
        body: String,
    },
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Shared HTTP client with the headers the gist API expects.
pub fn default_http_client() -> reqwest::Result<Client> {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("application/vnd.github+json"),
    );
    Client::builder()
        .user_agent(USER_AGENT)
        .default_headers(headers)
        .build()
}

/// Thin client over the gist endpoints of the GitHub REST API.
///
/// Every call is a single request; nothing here retries.
#[derive(Clone)]
pub struct GistClient {
    client: Client,
    api_base: Url,
    token: String,
}

impl GistClient {
    pub fn new(
        client: Client,
        api_base: &str,
        token: impl Into<String>,
    ) -> Result<Self, GistApiError> {
        let api_base =
            Url::parse(api_base).map_err(|e| GistApiError::InvalidUrl(format!("{api_base}: {e}")))?;
        if api_base.cannot_be_a_base() {
            return Err(GistApiError::InvalidUrl(api_base.to_string()));
        }
        Ok(Self {
            client,
            api_base,
            token: token.into(),
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, GistApiError> {
        let mut url = self.api_base.clone();
        {
            let mut segs = url
                .path_segments_mut()
                .map_err(|_| GistApiError::InvalidUrl(self.api_base.to_string()))?;
            segs.pop_if_empty();
            for s in segments {
                segs.push(s);
            }
        }
        Ok(url)
    }

    /// `GET /gists/{id}`
    pub async fn get_gist(&self, id: &str) -> Result<GistExternal, GistApiError> {
        let url = self.endpoint(&["gists", id])?;
        debug!("GET {}", url);
        let resp = self.client.get(url).bearer_auth(&self.token).send().await?;
        let resp = check_status(resp, &format!("gist {id}")).await?;
        Ok(resp.json().await?)
    }

    /// `GET /gists`, following pages until a short one comes back.
    pub async fn list_gists(&self) -> Result<Vec<GistExternal>, GistApiError> {
        let mut gists = Vec::new();
        let mut page = 1usize;
        loop {
            let mut url = self.endpoint(&["gists"])?;
            url.query_pairs_mut()
                .append_pair("per_page", &GIST_PAGE_SIZE.to_string())
                .append_pair("page", &page.to_string());
            debug!("GET {}", url);

            let resp = self.client.get(url).bearer_auth(&self.token).send().await?;
            let resp = check_status(resp, "gist listing").await?;
            let batch: Vec<GistExternal> = resp.json().await?;
            let done = batch.len() < GIST_PAGE_SIZE;
            gists.extend(batch);
            if done {
                break;
            }
            page += 1;
        }
        Ok(gists)
    }

    /// `POST /gists`
    pub async fn create_gist(
        &self,
        body: &CreateGistRequest,
    ) -> Result<GistExternal, GistApiError> {
        let url = self.endpoint(&["gists"])?;
        debug!("POST {} ({} files)", url, body.files.len());
        let resp = self
            .client
            .post(url)
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await?;
        let resp = check_status(resp, "new gist").await?;
        Ok(resp.json().await?)
    }

    /// `PATCH /gists/{id}`; all file changes land in one revision.
    pub async fn edit_gist(
        &self,
        id: &str,
        body: &EditGistRequest,
    ) -> Result<GistExternal, GistApiError> {
        let url = self.endpoint(&["gists", id])?;
        debug!("PATCH {} ({} files)", url, body.files.len());
        let resp = self
            .client
            .patch(url)
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await?;
        let resp = check_status(resp, &format!("gist {id}")).await?;
        Ok(resp.json().await?)
    }

    /// Full content of one gist file, independent of API truncation.
    ///
    /// The token is only sent when `raw_url` shares the API's origin.
    pub async fn download_raw(&self, raw_url: &str) -> Result<Bytes, GistApiError> {
        let url =
            Url::parse(raw_url).map_err(|e| GistApiError::InvalidUrl(format!("{raw_url}: {e}")))?;
        debug!("GET {}", url);
        let same_origin = url.origin() == self.api_base.origin();
        let mut req = self.client.get(url);
        if same_origin {
            req = req.bearer_auth(&self.token);
        }
        let resp = req.send().await?;
        let resp = check_status(resp, raw_url).await?;
        Ok(resp.bytes().await?)
    }
}

async fn check_status(resp: Response, what: &str) -> Result<Response, GistApiError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    match status {
        StatusCode::NOT_FOUND => Err(GistApiError::NotFound(what.to_string())),
        StatusCode::UNAUTHORIZED => Err(GistApiError::Unauthorized(status.as_u16())),
        _ => {
            let url = resp.url().to_string();
            let body = resp.text().await.unwrap_or_default();
            Err(GistApiError::Status {
                status: status.as_u16(),
                url,
                body,
            })
        }
    }
}
