//! Microsoft Graph client that turns drive items into download URLs.
//!
//! `GET {base}/drives/{drive-id}/items/{item-id}` returns the item metadata,
//! including the pre-authenticated `@microsoft.graph.downloadUrl`. That URL
//! needs no bearer token but only stays valid for a few minutes.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use cirrus_core::model::{DriveId, ItemId};
use cirrus_core::{LocationResolver, ResolveError};
use log::{debug, info, warn};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use url::Url;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// The subset of a Graph `driveItem` we read.
#[derive(Debug, Deserialize)]
pub struct DriveItem {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "@microsoft.graph.downloadUrl", default)]
    pub download_url: Option<String>,
}

impl DriveItem {
    pub fn download_location(&self) -> Result<Url, ResolveError> {
        let raw = self
            .download_url
            .as_deref()
            .ok_or(ResolveError::MissingDownloadUrl)?;
        Url::parse(raw).map_err(|err| ResolveError::InvalidUrl(err.to_string()))
    }
}

/// Map a Graph response status to the resolver's error kinds. `None` for
/// success.
pub fn status_error(status: StatusCode) -> Option<ResolveError> {
    match status {
        s if s.is_success() => None,
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            Some(ResolveError::Unauthorized)
        }
        StatusCode::NOT_FOUND | StatusCode::GONE => {
            Some(ResolveError::NotFound)
        }
        s => Some(ResolveError::Transport(format!(
            "unexpected status {}",
            s
        ))),
    }
}

/// Add a scheme if missing and trim trailing slashes.
pub fn normalize_base_url(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    let with_scheme =
        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            trimmed.to_string()
        } else {
            format!("https://{}", trimmed)
        };
    if with_scheme != raw {
        warn!(
            "[Graph] Normalized base URL from '{}' to '{}'",
            raw, with_scheme
        );
    }
    with_scheme
}

pub struct GraphResolver {
    client: Client,
    base_url: String,
    token: String,
}

impl std::fmt::Debug for GraphResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphResolver")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl GraphResolver {
    pub fn new(
        base_url: &str,
        token: impl Into<String>,
    ) -> anyhow::Result<Self> {
        let base_url = normalize_base_url(base_url);
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("failed to build HTTP client")?;

        info!("[Graph] Using Graph endpoint {}", base_url);

        Ok(Self {
            client,
            base_url,
            token: token.into(),
        })
    }

    pub fn item_url(&self, drive_id: &DriveId, item_id: &ItemId) -> String {
        format!(
            "{}/drives/{}/items/{}",
            self.base_url,
            urlencoding::encode(drive_id.as_str()),
            urlencoding::encode(item_id.as_str())
        )
    }
}

#[async_trait]
impl LocationResolver for GraphResolver {
    async fn resolve_download_location(
        &self,
        drive_id: &DriveId,
        item_id: &ItemId,
    ) -> Result<Url, ResolveError> {
        let url = self.item_url(drive_id, item_id);
        debug!("[Graph] GET {}", url);

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|err| ResolveError::Transport(err.to_string()))?;

        if let Some(err) = status_error(response.status()) {
            warn!(
                "[Graph] {} answered {}: {}",
                url,
                response.status(),
                err
            );
            return Err(err);
        }

        let item: DriveItem = response
            .json()
            .await
            .map_err(|err| ResolveError::Transport(err.to_string()))?;
        let location = item.download_location()?;
        debug!(
            "[Graph] Resolved {} to {}",
            item.name.as_deref().unwrap_or(item_id.as_str()),
            location.host_str().unwrap_or("<no host>")
        );
        Ok(location)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_map_to_error_kinds() {
        assert!(status_error(StatusCode::OK).is_none());
        assert!(matches!(
            status_error(StatusCode::UNAUTHORIZED),
            Some(ResolveError::Unauthorized)
        ));
        assert!(matches!(
            status_error(StatusCode::FORBIDDEN),
            Some(ResolveError::Unauthorized)
        ));
        assert!(matches!(
            status_error(StatusCode::NOT_FOUND),
            Some(ResolveError::NotFound)
        ));
        assert!(matches!(
            status_error(StatusCode::SERVICE_UNAVAILABLE),
            Some(ResolveError::Transport(_))
        ));
    }

    #[test]
    fn download_url_is_read_from_graph_annotation() {
        let item: DriveItem = serde_json::from_str(
            r#"{
                "id": "01ITEM",
                "name": "holiday.mp4",
                "@microsoft.graph.downloadUrl": "https://public.dm.files.1drv.com/y4m?x=1"
            }"#,
        )
        .unwrap();

        let location = item.download_location().unwrap();
        assert_eq!(location.host_str(), Some("public.dm.files.1drv.com"));
    }

    #[test]
    fn folders_have_no_download_url() {
        let item: DriveItem =
            serde_json::from_str(r#"{"id": "01DIR", "folder": {}}"#).unwrap();
        assert!(matches!(
            item.download_location(),
            Err(ResolveError::MissingDownloadUrl)
        ));
    }

    #[test]
    fn malformed_download_url_is_rejected() {
        let item = DriveItem {
            name: None,
            download_url: Some("not a url".into()),
        };
        assert!(matches!(
            item.download_location(),
            Err(ResolveError::InvalidUrl(_))
        ));
    }

    #[test]
    fn base_url_is_normalized() {
        assert_eq!(
            normalize_base_url("graph.microsoft.com/v1.0/"),
            "https://graph.microsoft.com/v1.0"
        );
        assert_eq!(
            normalize_base_url("http://127.0.0.1:8080"),
            "http://127.0.0.1:8080"
        );
    }

    #[test]
    fn item_url_escapes_ids() {
        let resolver =
            GraphResolver::new("https://graph.microsoft.com/v1.0", "t")
                .unwrap();
        let drive = DriveId::new("b!a/b c").unwrap();
        let item = ItemId::new("01ABC").unwrap();

        assert_eq!(
            resolver.item_url(&drive, &item),
            "https://graph.microsoft.com/v1.0/drives/b%21a%2Fb%20c/items/01ABC"
        );
    }
}
