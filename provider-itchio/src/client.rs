//! itch.io API client
//!
//! Implements the store-side seams for the sideload engine: the owned
//! catalog, the tag-filtered candidate universe, and asset downloads.
//!
//! All API calls authenticate with a bare API key in the `authorization`
//! header. The tag listing is public and needs no key; its `format=json`
//! variant returns an HTML fragment that is scraped for game titles.

use async_trait::async_trait;
use scraper::{Html, Selector};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, instrument};

use bridge_traits::{BridgeError, FileStore, HttpClient, HttpRequest};
use core_sideload::{
    AssetDownloader, CandidatePage, CandidateUniverse, DownloadInfo, ItemId, OwnedCatalogSource,
    OwnedItem, SideloadError,
};

use crate::error::{ItchError, Result};
use crate::types::{
    DownloadSessionResponse, LoginResponse, OwnedKeysResponse, TagPageResponse, UploadsResponse,
};

/// itch.io serverside API base URL
const ITCH_API_BASE: &str = "https://api.itch.io";

/// Tag listing for Playdate games, paginated via `?page=N&format=json`
const TAG_LISTING_URL: &str = "https://itch.io/games/tag-playdate";

/// CSS selector for game titles inside a tag listing fragment
const TITLE_SELECTOR: &str = ".game_cell_data .title";

/// itch.io API client
///
/// One instance covers all store-side operations of a run. Construct via
/// [`ItchClient::login`] with account credentials, or
/// [`ItchClient::with_api_key`] when a key is already at hand.
pub struct ItchClient {
    http_client: Arc<dyn HttpClient>,
    api_key: String,
    file_store: Arc<dyn FileStore>,
}

impl ItchClient {
    /// Log in with account credentials and build a client around the
    /// returned API key.
    #[instrument(skip_all, fields(username = %username))]
    pub async fn login(
        http_client: Arc<dyn HttpClient>,
        file_store: Arc<dyn FileStore>,
        username: &str,
        password: &str,
    ) -> Result<Self> {
        let request = HttpRequest::post(format!("{ITCH_API_BASE}/login")).form([
            ("username", username),
            ("password", password),
            ("source", "desktop"),
        ]);

        let response = http_client.execute(request).await?;
        if !response.is_success() {
            return Err(ItchError::AuthenticationFailed(format!(
                "login rejected with status {}",
                response.status
            )));
        }

        let login: LoginResponse = response
            .json()
            .map_err(|e| ItchError::AuthenticationFailed(e.to_string()))?;
        info!("itch.io login succeeded");

        Ok(Self::with_api_key(http_client, file_store, login.key.key))
    }

    /// Build a client from an existing API key.
    pub fn with_api_key(
        http_client: Arc<dyn HttpClient>,
        file_store: Arc<dyn FileStore>,
        api_key: String,
    ) -> Self {
        Self {
            http_client,
            api_key,
            file_store,
        }
    }

    /// Authenticated GET returning a deserialized JSON body.
    async fn api_get<T: serde::de::DeserializeOwned>(&self, url: String) -> Result<T> {
        let request = HttpRequest::get(url).header("authorization", &self.api_key);
        let response = self
            .http_client
            .execute(request)
            .await?
            .error_for_status()
            .map_err(into_api_error)?;
        Ok(response.json()?)
    }
}

fn into_api_error(error: BridgeError) -> ItchError {
    match error {
        BridgeError::Http { status, message } => ItchError::ApiError {
            status_code: status,
            message,
        },
        other => other.into(),
    }
}

/// Extract game titles from a tag listing HTML fragment.
pub fn parse_candidate_titles(content: &str) -> Result<Vec<String>> {
    let selector = Selector::parse(TITLE_SELECTOR)
        .map_err(|e| ItchError::ParseError(format!("selector {TITLE_SELECTOR}: {e:?}")))?;

    let fragment = Html::parse_fragment(content);
    Ok(fragment
        .select(&selector)
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|title| !title.is_empty())
        .collect())
}

#[async_trait]
impl OwnedCatalogSource for ItchClient {
    async fn page(&self, page: u32) -> core_sideload::Result<Vec<OwnedItem>> {
        let url = format!("{ITCH_API_BASE}/profile/owned-keys?page={page}");
        let response: OwnedKeysResponse = self
            .api_get(url)
            .await
            .map_err(|e| SideloadError::Catalog(e.to_string()))?;

        debug!(page, keys = response.owned_keys.len(), "Fetched owned keys page");
        Ok(response
            .owned_keys
            .into_iter()
            .map(|key| OwnedItem {
                id: ItemId(key.game_id),
                title: key.game.title,
                download_key_id: key.id,
            })
            .collect())
    }
}

#[async_trait]
impl CandidateUniverse for ItchClient {
    async fn page(&self, page: u32) -> core_sideload::Result<CandidatePage> {
        // Public listing; no authorization header.
        let request = HttpRequest::get(format!("{TAG_LISTING_URL}?page={page}&format=json"));
        let response: TagPageResponse = self
            .http_client
            .execute(request)
            .await
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.json())
            .map_err(|e| SideloadError::Catalog(e.to_string()))?;

        if response.num_items == 0 {
            return Ok(CandidatePage {
                titles: vec![],
                num_items: 0,
            });
        }

        let titles = parse_candidate_titles(&response.content)
            .map_err(|e| SideloadError::Catalog(e.to_string()))?;
        debug!(page, titles = titles.len(), "Parsed tag listing page");
        Ok(CandidatePage {
            titles,
            num_items: response.num_items,
        })
    }
}

#[async_trait]
impl AssetDownloader for ItchClient {
    async fn download_info(&self, item: &OwnedItem) -> core_sideload::Result<DownloadInfo> {
        let url = format!(
            "{ITCH_API_BASE}/games/{}/uploads?download_key_id={}",
            item.id, item.download_key_id
        );
        let response: UploadsResponse = self
            .api_get(url)
            .await
            .map_err(|e| SideloadError::Asset(e.to_string()))?;

        // The first upload is the downloadable build for this key.
        let upload = response
            .uploads
            .into_iter()
            .next()
            .ok_or_else(|| {
                SideloadError::Asset(ItchError::MissingUpload { game_id: item.id.0 }.to_string())
            })?;

        let fingerprint = upload.md5_hash.ok_or_else(|| {
            SideloadError::Asset(
                ItchError::MissingFingerprint {
                    upload_id: upload.id,
                }
                .to_string(),
            )
        })?;

        Ok(DownloadInfo {
            fingerprint,
            upload_id: upload.id,
            filename: upload.filename,
        })
    }

    async fn download(
        &self,
        item: &OwnedItem,
        info: &DownloadInfo,
    ) -> core_sideload::Result<PathBuf> {
        let session: DownloadSessionResponse = async {
            let request = HttpRequest::post(format!(
                "{ITCH_API_BASE}/games/{}/download-sessions",
                item.id
            ))
            .header("authorization", &self.api_key);
            self.http_client
                .execute(request)
                .await?
                .error_for_status()?
                .json()
        }
        .await
        .map_err(|e| SideloadError::Asset(e.to_string()))?;

        let url = format!(
            "{ITCH_API_BASE}/uploads/{}/download?api_key={}&download_key_id={}&uuid={}",
            info.upload_id,
            urlencoding::encode(&self.api_key),
            item.download_key_id,
            session.uuid
        );

        let staging = self
            .file_store
            .staging_dir()
            .await
            .map_err(|e| SideloadError::Asset(e.to_string()))?;
        let dest = staging.join(&info.filename);

        let request = HttpRequest::get(url).header("authorization", &self.api_key);
        let bytes = self
            .http_client
            .download_to_file(request, &dest)
            .await
            .map_err(|e| SideloadError::Asset(e.to_string()))?;

        debug!(title = %item.title, bytes, dest = %dest.display(), "Asset downloaded");
        Ok(dest)
    }
}
