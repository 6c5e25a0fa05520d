//! Downloads media attachments to disk.
//!
//! Assets are collected from a batch response, deduplicated, and fetched
//! one at a time. A failed asset never aborts the run; every outcome is
//! accumulated into a [`DownloadReport`] and the caller decides what the
//! aggregate means.

use crate::response::{ApiResponse, Fields};
use itertools::Itertools;
use log::{debug, warn};
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Where media files land unless the caller says otherwise.
pub const DEFAULT_OUTPUT_DIR: &str = "media";

/// Which media field an asset's URL came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AssetSource {
    Url,
    PreviewImageUrl,
}

impl AssetSource {
    /// The tag embedded in downloaded filenames.
    pub fn tag(&self) -> &'static str {
        match self {
            AssetSource::Url => "url",
            AssetSource::PreviewImageUrl => "preview_image_url",
        }
    }
}

/// A single fetchable media attachment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Asset {
    pub post_id: String,
    pub media_key: String,
    pub kind: String,
    pub url: String,
    pub source: AssetSource,
}

impl Asset {
    /// The filename this asset downloads to.
    pub fn filename(&self) -> String {
        format!(
            "{}-{}-{}{}",
            sanitize(&self.post_id),
            sanitize(&self.media_key),
            self.source.tag(),
            self.extension(),
        )
    }

    /// The file extension, inferred from the URL path when it looks like
    /// a real extension and from the media type otherwise.
    fn extension(&self) -> String {
        if let Some(ext) = path_extension(&self.url) {
            return format!(".{ext}");
        }
        if self.kind == "photo" || self.source == AssetSource::PreviewImageUrl {
            return ".jpg".to_string();
        }
        match self.kind.as_str() {
            "video" => ".mp4".to_string(),
            "animated_gif" => ".gif".to_string(),
            _ => ".bin".to_string(),
        }
    }
}

/// Replaces runs of characters outside `[A-Za-z0-9._-]` with a single
/// underscore and trims underscores from the edges. An input with
/// nothing usable left becomes `"item"`.
fn sanitize(part: &str) -> String {
    let mut out = String::with_capacity(part.len());
    let mut pending = false;
    for ch in part.chars() {
        if ch.is_ascii_alphanumeric() || ch == '.' || ch == '_' || ch == '-' {
            if pending && !out.is_empty() {
                out.push('_');
            }
            pending = false;
            out.push(ch);
        } else {
            pending = true;
        }
    }
    let out = out.trim_matches('_').to_string();
    if out.is_empty() { "item".to_string() } else { out }
}

/// The extension at the end of a URL path, if it is a plausible one:
/// one to eight alphanumeric characters.
fn path_extension(url: &str) -> Option<String> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let name = path.rsplit('/').next()?;
    let (_, ext) = name.rsplit_once('.')?;
    let plausible =
        (1..=8).contains(&ext.len()) && ext.chars().all(|ch| ch.is_ascii_alphanumeric());
    plausible.then(|| ext.to_lowercase())
}

/// Collects the downloadable assets from a batch post response,
/// deduplicated by (post ID, media key, URL).
///
/// A media object's `url` is preferred; `preview_image_url` is the
/// fallback. Media with neither is not downloadable.
pub fn collect_assets(response: &ApiResponse) -> Vec<Asset> {
    let media = response.includes("media");
    let index = crate::enrich::media_index(&media);

    let mut assets = Vec::new();
    for post in response.data() {
        let post_id = post.str_field("id").unwrap_or_default();
        let keys = post
            .object_field("attachments")
            .and_then(|attachments| attachments.array_field("media_keys"))
            .map(|keys| keys.iter().filter_map(Value::as_str).collect::<Vec<_>>())
            .unwrap_or_default();
        for key in keys {
            let Some(media) = index.get(key) else {
                continue;
            };
            let Some((url, source)) = asset_url(media) else {
                continue;
            };
            assets.push(Asset {
                post_id: post_id.to_string(),
                media_key: key.to_string(),
                kind: media.str_field("type").unwrap_or("unknown").to_string(),
                url: url.to_string(),
                source,
            });
        }
    }

    assets
        .into_iter()
        .unique_by(|asset| (asset.post_id.clone(), asset.media_key.clone(), asset.url.clone()))
        .collect()
}

fn asset_url(media: &Value) -> Option<(&str, AssetSource)> {
    if let Some(url) = media.str_field("url") {
        return Some((url, AssetSource::Url));
    }
    media
        .str_field("preview_image_url")
        .map(|url| (url, AssetSource::PreviewImageUrl))
}

/// What happened during a download run.
#[derive(Debug, Default)]
pub struct DownloadReport {
    pub output_dir: PathBuf,
    pub attempted: usize,
    pub downloaded: usize,
    pub failed: usize,
    pub files: Vec<PathBuf>,
    pub errors: Vec<String>,
}

/// Downloads every asset into `output_dir`, one fetch per asset.
///
/// Failures are independent: each failed asset adds an error entry and
/// the run continues. Nothing is retried.
pub async fn download_all(
    client: &reqwest::Client,
    assets: &[Asset],
    output_dir: &Path,
) -> DownloadReport {
    let mut report = DownloadReport {
        output_dir: output_dir.to_path_buf(),
        ..DownloadReport::default()
    };

    if let Err(err) = tokio::fs::create_dir_all(output_dir).await {
        report.attempted = assets.len();
        report.failed = assets.len();
        report
            .errors
            .push(format!("could not create {}: {err}", output_dir.display()));
        return report;
    }

    for asset in assets {
        report.attempted += 1;
        match download_one(client, asset, output_dir).await {
            Ok(path) => {
                debug!("downloaded {} to {}", asset.url, path.display());
                report.downloaded += 1;
                report.files.push(path);
            }
            Err(reason) => {
                warn!("could not download {}: {reason}", asset.url);
                report.failed += 1;
                report.errors.push(format!("{}: {reason}", asset.url));
            }
        }
    }

    report
}

async fn download_one(
    client: &reqwest::Client,
    asset: &Asset,
    output_dir: &Path,
) -> Result<PathBuf, String> {
    let resp = client
        .get(&asset.url)
        .send()
        .await
        .map_err(|err| err.to_string())?;
    if !resp.status().is_success() {
        return Err(format!("HTTP {}", resp.status()));
    }
    let bytes = resp.bytes().await.map_err(|err| err.to_string())?;
    let path = output_dir.join(asset.filename());
    tokio::fs::write(&path, &bytes)
        .await
        .map_err(|err| err.to_string())?;
    Ok(path)
}
