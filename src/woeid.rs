// SPDX-License-Identifier: Apache-2.0
// Copyright (C) 2025 Michael Dippery <michael@monkey-robot.com>

//! The WOEID location index.
//!
//! Trend queries are scoped by WOEID, a numeric code identifying a
//! geographic place. The full mapping of place names to codes lives in a
//! remote JSON dataset that changes rarely, so it is cached on disk and
//! searched offline with a weighted fuzzy score.
//!
//! Loading degrades gracefully: a cache file younger than a week is used
//! without touching the network; otherwise the index is fetched and
//! persisted; if the fetch fails, a stale cache of any age is better than
//! nothing; only when neither exists does loading fail.

use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::env;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Where the remote index lives.
pub const INDEX_URL: &str = "https://raw.githubusercontent.com/mdippery/birdseye/main/data/woeids.json";

/// Environment variable overriding the cache file path.
pub const CACHE_PATH_VAR: &str = "BIRDSEYE_WOEID_CACHE";

/// Cache files older than this trigger a refresh.
pub const MAX_CACHE_AGE: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// A place that trends can be scoped to.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Location {
    pub place_name: String,
    pub country: String,
    #[serde(default)]
    pub country_code: Option<String>,
    #[serde(rename = "type")]
    pub place_type: String,
    pub woeid: i64,
}

impl Location {
    fn is_valid(&self) -> bool {
        !self.place_name.trim().is_empty() && self.woeid > 0
    }
}

/// A [`Location`] with its search score.
#[derive(Clone, Debug, PartialEq)]
pub struct ScoredLocation {
    pub location: Location,
    pub score: u32,
}

/// An error loading the location index.
#[derive(Debug, Error)]
pub enum Error {
    /// The network fetch failed and no cache file exists at all.
    #[error("Could not load the location index: network unavailable and no cached copy exists.")]
    Offline,
}

/// Backing storage for the serialized index.
///
/// The production implementation is [`CacheFile`]; tests substitute an
/// in-memory fake to drive the fallback chain.
pub trait Store {
    /// Returns the stored index text, or `None` if it does not exist or
    /// is older than `max_age` (when given).
    fn read(&self, max_age: Option<Duration>) -> Option<String>;

    /// Persists the index text.
    fn write(&self, data: &str) -> io::Result<()>;
}

/// The on-disk cache file, age-gated by modification time.
#[derive(Debug)]
pub struct CacheFile {
    path: PathBuf,
}

impl CacheFile {
    pub fn new(path: PathBuf) -> Self {
        CacheFile { path }
    }

    /// The default cache location: `$BIRDSEYE_WOEID_CACHE` if set, else
    /// `woeid.json` under the platform cache directory.
    pub fn default_path() -> PathBuf {
        if let Some(path) = env::var_os(CACHE_PATH_VAR) {
            return PathBuf::from(path);
        }
        dirs::cache_dir()
            .unwrap_or_else(env::temp_dir)
            .join("birdseye")
            .join("woeid.json")
    }

    fn age(&self) -> Option<Duration> {
        let modified = fs::metadata(&self.path).ok()?.modified().ok()?;
        modified.elapsed().ok()
    }
}

impl Default for CacheFile {
    fn default() -> Self {
        CacheFile::new(CacheFile::default_path())
    }
}

impl Store for CacheFile {
    fn read(&self, max_age: Option<Duration>) -> Option<String> {
        if let Some(max_age) = max_age {
            if self.age()? > max_age {
                return None;
            }
        }
        fs::read_to_string(&self.path).ok()
    }

    fn write(&self, data: &str) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, data)
    }
}

/// A source for the remote index.
pub trait Source {
    fn fetch(&self) -> impl Future<Output = Result<String, String>>;
}

/// Fetches the index over HTTP from [`INDEX_URL`].
#[derive(Debug, Default)]
pub struct RemoteSource {
    client: reqwest::Client,
}

impl Source for RemoteSource {
    async fn fetch(&self) -> Result<String, String> {
        let resp = self
            .client
            .get(INDEX_URL)
            .send()
            .await
            .map_err(|err| err.to_string())?;
        if !resp.status().is_success() {
            return Err(format!("index fetch returned HTTP {}", resp.status()));
        }
        resp.text().await.map_err(|err| err.to_string())
    }
}

/// Decodes the serialized index, discarding rows that fail validation.
/// Returns `None` unless at least one valid row survives.
fn parse_index(text: &str) -> Option<Vec<Location>> {
    let rows: Vec<Value> = serde_json::from_str(text).ok()?;
    let locations: Vec<Location> = rows
        .into_iter()
        .filter_map(|row| serde_json::from_value::<Location>(row).ok())
        .filter(Location::is_valid)
        .collect();
    if locations.is_empty() {
        None
    } else {
        Some(locations)
    }
}

/// The searchable location index.
#[derive(Debug)]
pub struct Index {
    locations: Vec<Location>,
}

impl Index {
    /// Loads the index using the default cache file and the remote source.
    pub async fn load() -> Result<Self, Error> {
        Index::load_with(&CacheFile::default(), &RemoteSource::default()).await
    }

    /// Loads the index through the fallback chain: fresh cache, then the
    /// network (persisting on success), then a stale cache of any age.
    pub async fn load_with<S: Store, R: Source>(store: &S, source: &R) -> Result<Self, Error> {
        if let Some(locations) = store.read(Some(MAX_CACHE_AGE)).and_then(|t| parse_index(&t)) {
            return Ok(Index { locations });
        }

        match source.fetch().await {
            Ok(body) => {
                if let Some(locations) = parse_index(&body) {
                    if let Err(err) = store.write(&body) {
                        warn!("could not write the location cache: {err}");
                    }
                    return Ok(Index { locations });
                }
                warn!("location index response is not a usable index");
            }
            Err(err) => warn!("could not fetch the location index: {err}"),
        }

        store
            .read(None)
            .and_then(|t| parse_index(&t))
            .map(|locations| Index { locations })
            .ok_or(Error::Offline)
    }

    /// Builds an index directly from records. Mostly useful in tests.
    pub fn from_locations(locations: Vec<Location>) -> Self {
        Index { locations }
    }

    /// Number of places in the index.
    pub fn len(&self) -> usize {
        self.locations.len()
    }

    /// True if the index holds no places.
    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    /// Searches the index for places matching `query`.
    ///
    /// Matching is offline and fuzzy: the query and each candidate are
    /// normalized (diacritics stripped, lowercased, punctuation collapsed)
    /// and scored on exact, prefix, substring, and per-token signals.
    /// Only positive scores are returned, strongest first, ties broken by
    /// place name.
    pub fn search(&self, query: &str, limit: usize) -> Vec<ScoredLocation> {
        let query = normalize(query);
        if query.is_empty() {
            return vec![];
        }

        let mut matches: Vec<ScoredLocation> = self
            .locations
            .iter()
            .filter_map(|location| {
                let score = score(&query, location);
                (score > 0).then(|| ScoredLocation {
                    location: location.clone(),
                    score,
                })
            })
            .collect();
        matches.sort_by(|lhs, rhs| {
            rhs.score
                .cmp(&lhs.score)
                .then_with(|| lhs.location.place_name.cmp(&rhs.location.place_name))
        });
        matches.truncate(limit);
        matches
    }

    /// The single best match for `query`, if any.
    pub fn best_match(&self, query: &str) -> Option<ScoredLocation> {
        self.search(query, 1).into_iter().next()
    }
}

/// Normalizes text for comparison: Unicode-decomposes, strips combining
/// marks, lowercases, and collapses runs of non-alphanumerics to single
/// spaces.
fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_space = false;
    for ch in text.nfd().filter(|ch| !is_combining_mark(*ch)) {
        if ch.is_alphanumeric() {
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
            out.extend(ch.to_lowercase());
        } else {
            pending_space = true;
        }
    }
    out
}

/// Scores a normalized query against one location. Name and combined
/// name-plus-country signals are additive across families; within a
/// family only the strongest signal counts.
fn score(query: &str, location: &Location) -> u32 {
    let name = normalize(&location.place_name);
    let country = normalize(&location.country);
    let combined = format!("{name} {country}");

    let mut total = 0;
    total += if query == name {
        200
    } else if name.starts_with(query) {
        120
    } else if name.contains(query) {
        80
    } else {
        0
    };
    total += if query == combined {
        240
    } else if combined.starts_with(query) {
        100
    } else if combined.contains(query) {
        60
    } else {
        0
    };
    for token in query.split_whitespace() {
        if name.contains(token) {
            total += 24;
        } else if country.contains(token) {
            total += 12;
        }
    }
    total
}
