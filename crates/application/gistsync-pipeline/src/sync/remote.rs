use std::collections::BTreeMap;

use bytes::Bytes;
use gistsync_core::formats::{CreateGistRequest, EditGistRequest};
use gistsync_core::{EditSet, RemoteFile, RemoteGist, Visibility};
use gistsync_infra::{default_http_client, GistApiError, GistClient};

use crate::sync::{SyncContext, SyncError};

/// The gist service as the sync engine sees it.
#[async_trait::async_trait]
pub trait RemoteGistProvider: Send + Sync {
    /// Fails with `RemoteNotFound` when the id does not resolve.
    async fn get_gist(&self, id: &str) -> Result<RemoteGist, SyncError>;
    /// Every gist of the authenticated user. Listings carry no history version.
    async fn list_gists(&self) -> Result<Vec<RemoteGist>, SyncError>;
    async fn create_gist(
        &self,
        visibility: Visibility,
        files: BTreeMap<String, String>,
    ) -> Result<RemoteGist, SyncError>;
    /// Apply every change of `edits` as one revision and return the new state.
    async fn edit_gist(&self, id: &str, edits: &EditSet) -> Result<RemoteGist, SyncError>;
    async fn download_file(&self, file: &RemoteFile) -> Result<Bytes, SyncError>;
}

/// Provider backed by the GitHub REST API.
pub struct HttpRemoteGistProvider {
    client: GistClient,
}

impl HttpRemoteGistProvider {
    pub fn new(ctx: &SyncContext) -> Result<Self, SyncError> {
        let http = default_http_client().map_err(GistApiError::from)?;
        let client = GistClient::new(http, &ctx.api_url, ctx.token.clone())?;
        Ok(Self { client })
    }
}

fn not_found_as(id: &str) -> impl FnOnce(GistApiError) -> SyncError + '_ {
    move |e| match e {
        GistApiError::NotFound(_) => SyncError::RemoteNotFound(id.to_string()),
        other => SyncError::Remote(other),
    }
}

#[async_trait::async_trait]
impl RemoteGistProvider for HttpRemoteGistProvider {
    async fn get_gist(&self, id: &str) -> Result<RemoteGist, SyncError> {
        let gist = self.client.get_gist(id).await.map_err(not_found_as(id))?;
        Ok(gist.into())
    }

    async fn list_gists(&self) -> Result<Vec<RemoteGist>, SyncError> {
        let gists = self.client.list_gists().await?;
        Ok(gists.into_iter().map(RemoteGist::from).collect())
    }

    async fn create_gist(
        &self,
        visibility: Visibility,
        files: BTreeMap<String, String>,
    ) -> Result<RemoteGist, SyncError> {
        let body = CreateGistRequest::new(visibility, None, files);
        Ok(self.client.create_gist(&body).await?.into())
    }

    async fn edit_gist(&self, id: &str, edits: &EditSet) -> Result<RemoteGist, SyncError> {
        let body = EditGistRequest::from(edits);
        let gist = self
            .client
            .edit_gist(id, &body)
            .await
            .map_err(not_found_as(id))?;
        Ok(gist.into())
    }

    async fn download_file(&self, file: &RemoteFile) -> Result<Bytes, SyncError> {
        Ok(self.client.download_raw(&file.raw_url).await?)
    }
}
