//! Where processed files are read from.
//!
//! A [`FileSource`] lists file names in one flat directory and fetches
//! their bytes. Two implementations exist: a local directory and a Google
//! Cloud Storage prefix read through the JSON API.

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use reqwest::Url;
use reqwest::blocking::Client;
use serde::Deserialize;
use tracing::debug;

use crate::error::{DashboardError, Result};

/// Environment variable naming the cloud project.
pub const PROJECT_ID_ENV: &str = "PROJECT_ID";
/// Environment variable naming the bucket holding processed data.
pub const BUCKET_NAME_ENV: &str = "BUCKET_NAME";
/// Optional OAuth bearer token for private buckets.
pub const ACCESS_TOKEN_ENV: &str = "GOOGLE_OAUTH_ACCESS_TOKEN";

/// Object prefix of the processed data inside the bucket.
pub const PROCESSED_PREFIX: &str = "final_project/data/processed_data/";

const STORAGE_API: &str = "https://storage.googleapis.com/storage/v1/b";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Read access to a flat directory of processed CSV files.
pub trait FileSource {
    /// Human-readable location, used in logs and errors.
    fn describe(&self) -> String;

    /// File names (without directory) available in the source, sorted.
    fn list(&self) -> Result<Vec<String>>;

    /// Raw bytes of one listed file.
    fn fetch(&self, name: &str) -> Result<Vec<u8>>;
}

/// A local processed-data directory.
#[derive(Debug, Clone)]
pub struct LocalSource {
    dir: PathBuf,
}

impl LocalSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl FileSource for LocalSource {
    fn describe(&self) -> String {
        self.dir.display().to_string()
    }

    fn list(&self) -> Result<Vec<String>> {
        if !self.dir.is_dir() {
            return Err(DashboardError::DirectoryNotFound {
                path: self.dir.clone(),
            });
        }
        let entries = fs::read_dir(&self.dir).map_err(|source| DashboardError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| DashboardError::Io {
                path: self.dir.clone(),
                source,
            })?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                names.push(name.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    fn fetch(&self, name: &str) -> Result<Vec<u8>> {
        let path = self.dir.join(name);
        fs::read(&path).map_err(|source| DashboardError::Io { path, source })
    }
}

/// Bucket location of the processed data, normally taken from the
/// environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectStoreLocation {
    pub project_id: String,
    pub bucket: String,
    pub prefix: String,
}

impl ObjectStoreLocation {
    /// Build the location from `PROJECT_ID` and `BUCKET_NAME`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build the location from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let read = |var: &'static str| {
            lookup(var)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .ok_or(DashboardError::MissingEnv { var })
        };
        Ok(Self {
            project_id: read(PROJECT_ID_ENV)?,
            bucket: read(BUCKET_NAME_ENV)?,
            prefix: PROCESSED_PREFIX.to_string(),
        })
    }

    /// `gs://<bucket>/<prefix>`
    pub fn uri(&self) -> String {
        format!("gs://{}/{}", self.bucket, self.prefix)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ObjectList {
    #[serde(default)]
    items: Vec<ObjectItem>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ObjectItem {
    name: String,
}

/// Google Cloud Storage prefix read through the JSON API.
#[derive(Debug, Clone)]
pub struct GcsSource {
    location: ObjectStoreLocation,
    token: Option<String>,
    client: Client,
}

impl GcsSource {
    pub fn new(location: ObjectStoreLocation, token: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| DashboardError::http(STORAGE_API, e))?;
        Ok(Self {
            location,
            token,
            client,
        })
    }

    /// Location from the environment, with the optional access token.
    pub fn from_env() -> Result<Self> {
        let token = std::env::var(ACCESS_TOKEN_ENV)
            .ok()
            .filter(|t| !t.trim().is_empty());
        Self::new(ObjectStoreLocation::from_env()?, token)
    }

    fn objects_url(&self) -> Result<Url> {
        let base = format!("{STORAGE_API}/{}/o", self.location.bucket);
        Url::parse(&base).map_err(|e| DashboardError::http(&base, e))
    }

    fn get(&self, url: Url) -> Result<reqwest::blocking::Response> {
        let url_text = url.to_string();
        let mut request = self.client.get(url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        let response = request
            .send()
            .map_err(|e| DashboardError::http(&url_text, e))?;
        response
            .error_for_status()
            .map_err(|e| DashboardError::http(&url_text, e))
    }
}

impl FileSource for GcsSource {
    fn describe(&self) -> String {
        self.location.uri()
    }

    fn list(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let mut url = self.objects_url()?;
            {
                let mut query = url.query_pairs_mut();
                query.append_pair("prefix", &self.location.prefix);
                query.append_pair("fields", "items(name),nextPageToken");
                if let Some(token) = &page_token {
                    query.append_pair("pageToken", token);
                }
            }
            let url_text = url.to_string();
            let page: ObjectList = self
                .get(url)?
                .json()
                .map_err(|e| DashboardError::http(&url_text, e))?;
            debug!(objects = page.items.len(), "listed object page");

            names.extend(page.items.into_iter().filter_map(|item| {
                let name = item.name.strip_prefix(&self.location.prefix)?;
                (!name.is_empty() && !name.contains('/')).then(|| name.to_string())
            }));

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }
        names.sort();
        Ok(names)
    }

    fn fetch(&self, name: &str) -> Result<Vec<u8>> {
        let mut url = self.objects_url()?;
        let object = format!("{}{}", self.location.prefix, name);
        url.path_segments_mut()
            .map_err(|()| DashboardError::http(STORAGE_API, "URL cannot be a base"))?
            .push(&object);
        url.query_pairs_mut().append_pair("alt", "media");
        let url_text = url.to_string();
        let bytes = self
            .get(url)?
            .bytes()
            .map_err(|e| DashboardError::http(&url_text, e))?;
        Ok(bytes.to_vec())
    }
}

/// Where the dashboard reads processed files from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    Local(PathBuf),
    /// Bucket location read from the environment at open time.
    ObjectStore,
}

impl DataSource {
    pub fn open(&self) -> Result<Box<dyn FileSource>> {
        match self {
            DataSource::Local(dir) => Ok(Box::new(LocalSource::new(dir.clone()))),
            DataSource::ObjectStore => Ok(Box::new(GcsSource::from_env()?)),
        }
    }
}
