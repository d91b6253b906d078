//! Report blobs in Cloud Storage for Firebase.

use async_trait::async_trait;
use clubcal_core::store::BlobStorage;
use clubcal_core::{BlobPath, ClubCalError, ClubCalResult};
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, info};
use url::Url;

use crate::client::{FirebaseClient, expect_success};

#[derive(Clone)]
pub struct FirebaseStorage {
    client: FirebaseClient,
}

/// The parts of an object's metadata we read.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ObjectMetadata {
    #[serde(default)]
    download_tokens: Option<String>,
}

impl FirebaseStorage {
    pub fn new(client: FirebaseClient) -> Self {
        FirebaseStorage { client }
    }

    fn upload_url(&self, path: &BlobPath) -> ClubCalResult<Url> {
        // Uploads go to the bucket's object list with the path as `name`.
        let mut url = self.client.objects_url()?;
        url.query_pairs_mut()
            .append_pair("uploadType", "media")
            .append_pair("name", path.as_str());
        Ok(url)
    }
}

/// Public URL of an object, using the first of its download tokens.
fn download_url_for(object: &Url, download_tokens: &str) -> Option<String> {
    let token = download_tokens.split(',').map(str::trim).find(|t| !t.is_empty())?;
    let mut url = object.clone();
    url.query_pairs_mut()
        .append_pair("alt", "media")
        .append_pair("token", token);
    Some(url.into())
}

#[async_trait]
impl BlobStorage for FirebaseStorage {
    async fn put(&self, path: &BlobPath, bytes: &[u8]) -> ClubCalResult<()> {
        let token = self.client.bearer().await?;

        let response = self
            .client
            .http
            .post(self.upload_url(path)?)
            .bearer_auth(token)
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(bytes.to_vec())
            .send()
            .await
            .map_err(ClubCalError::backend)?;

        expect_success(response).await?;
        info!(path = %path, size = bytes.len(), "stored blob");
        Ok(())
    }

    async fn download_url(&self, path: &BlobPath) -> ClubCalResult<String> {
        let token = self.client.bearer().await?;
        let object = self.client.object_url(path.as_str())?;

        let response = self
            .client
            .http
            .get(object.clone())
            .bearer_auth(token)
            .send()
            .await
            .map_err(ClubCalError::backend)?;

        let metadata: ObjectMetadata = expect_success(response)
            .await?
            .json()
            .await
            .map_err(ClubCalError::backend)?;

        metadata
            .download_tokens
            .as_deref()
            .and_then(|tokens| download_url_for(&object, tokens))
            .ok_or_else(|| {
                ClubCalError::BackendUnavailable(format!("'{}' has no download token", path))
            })
    }

    async fn delete(&self, path: &BlobPath) -> ClubCalResult<()> {
        let token = self.client.bearer().await?;

        let response = self
            .client
            .http
            .delete(self.client.object_url(path.as_str())?)
            .bearer_auth(token)
            .send()
            .await
            .map_err(ClubCalError::backend)?;

        if response.status() == StatusCode::NOT_FOUND {
            debug!(path = %path, "blob already gone");
            return Ok(());
        }

        expect_success(response).await?;
        Ok(())
    }
}
