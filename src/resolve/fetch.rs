use crate::consts::mime;
use crate::util::uri;
use std::path::{Path, PathBuf};

/// Alias for `Result<T, FetchError>`.
pub type FetchResult<T> = Result<T, FetchError>;

/// Possible errors when retrieving a referenced resource.
///
/// These never abort assembly: the resolver logs them and
/// applies its fallback for the reference.
#[non_exhaustive]
#[derive(thiserror::Error, Debug)]
pub enum FetchError {
    /// No fetcher handles the reference (e.g., a remote URL without
    /// the `remote` feature).
    #[error("Unsupported reference: {0}")]
    Unsupported(String),

    /// None of the candidate locations exist.
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// The server answered with a non-success status.
    #[error("`{url}` responded with status {status}")]
    Status {
        /// The requested URL.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[cfg(feature = "remote")]
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// A retrieved resource.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fetched {
    pub data: Vec<u8>,
    /// The declared media type (e.g., an HTTP `Content-Type`), if known.
    pub media_type: Option<String>,
}

impl Fetched {
    pub fn new(data: Vec<u8>, media_type: Option<String>) -> Self {
        Self { data, media_type }
    }

    /// The declared media type, then sniffed image bytes, then the
    /// extension of `name`, then `application/octet-stream`.
    pub(crate) fn resolve_media_type(&self, name: &str) -> String {
        self.media_type
            .as_deref()
            .map(|declared| declared.split(';').next().unwrap_or(declared).trim())
            .filter(|declared| !declared.is_empty() && *declared != mime::OCTET_STREAM)
            .or_else(|| mime::sniff_image(&self.data))
            .or_else(|| mime::from_path(name))
            .unwrap_or(mime::OCTET_STREAM)
            .to_owned()
    }
}

/// Retrieves the resources referenced by book content.
///
/// `location` is either a remote URL or a local path. Local paths are
/// tried as given and then relative to the configured document root.
///
/// # Examples
/// An in-memory fetcher:
/// ```
/// # use bindery::resolve::{Fetched, FetchError, FetchResult, ResourceFetcher};
/// # use std::collections::HashMap;
/// struct Memory(HashMap<String, Vec<u8>>);
///
/// impl ResourceFetcher for Memory {
///     fn fetch(&self, location: &str) -> FetchResult<Fetched> {
///         self.0
///             .get(location)
///             .map(|data| Fetched::new(data.clone(), None))
///             .ok_or_else(|| FetchError::NotFound(location.to_owned()))
///     }
/// }
/// ```
pub trait ResourceFetcher {
    fn fetch(&self, location: &str) -> FetchResult<Fetched>;

    /// A file on disk holding `location`, so it can be streamed into the
    /// container instead of buffered.
    fn locate(&self, _location: &str) -> Option<PathBuf> {
        None
    }
}

/// Reads local references from the filesystem.
#[derive(Clone, Debug, Default)]
pub struct FileSystemFetcher {
    doc_root: Option<PathBuf>,
}

impl FileSystemFetcher {
    pub fn new(doc_root: Option<PathBuf>) -> Self {
        Self { doc_root }
    }

    fn candidates(&self, location: &str) -> Vec<PathBuf> {
        let decoded = uri::decode(uri::strip_query(location)).into_owned();
        let mut candidates = vec![PathBuf::from(&decoded)];

        if let Some(root) = &self.doc_root {
            candidates.push(root.join(decoded.trim_start_matches('/')));
        }
        candidates
    }
}

impl ResourceFetcher for FileSystemFetcher {
    fn fetch(&self, location: &str) -> FetchResult<Fetched> {
        if uri::is_remote(location) {
            return Err(FetchError::Unsupported(location.to_owned()));
        }
        let path = self
            .locate(location)
            .ok_or_else(|| FetchError::NotFound(location.to_owned()))?;
        let data = std::fs::read(&path)?;

        Ok(Fetched::new(data, None))
    }

    fn locate(&self, location: &str) -> Option<PathBuf> {
        if uri::is_remote(location) {
            return None;
        }
        self.candidates(location)
            .into_iter()
            .find(|candidate| Path::is_file(candidate))
    }
}

/// Downloads remote references with a blocking HTTP client.
#[cfg(feature = "remote")]
#[derive(Clone, Debug)]
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

#[cfg(feature = "remote")]
impl HttpFetcher {
    const TIMEOUT: std::time::Duration = std::time::Duration::from_secs(120);
    const MAX_REDIRECTS: usize = 10;

    pub fn new() -> FetchResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .connect_timeout(Self::TIMEOUT)
            .timeout(Self::TIMEOUT)
            .redirect(reqwest::redirect::Policy::limited(Self::MAX_REDIRECTS))
            .user_agent(concat!("bindery/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

#[cfg(feature = "remote")]
impl ResourceFetcher for HttpFetcher {
    fn fetch(&self, location: &str) -> FetchResult<Fetched> {
        let url = location.replace(' ', "%20");
        let response = self.client.get(&url).send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url,
                status: status.as_u16(),
            });
        }
        let media_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        let data = response.bytes()?.to_vec();

        tracing::debug!(%url, bytes = data.len(), "downloaded remote resource");
        Ok(Fetched::new(data, media_type))
    }
}

/// Routes local references to a [`FileSystemFetcher`] and, with the
/// `remote` feature, remote references to an `HttpFetcher`.
#[derive(Debug, Default)]
pub struct DefaultFetcher {
    local: FileSystemFetcher,
    #[cfg(feature = "remote")]
    remote: Option<HttpFetcher>,
}

impl DefaultFetcher {
    pub fn new(doc_root: Option<PathBuf>) -> Self {
        Self {
            local: FileSystemFetcher::new(doc_root),
            #[cfg(feature = "remote")]
            remote: HttpFetcher::new()
                .inspect_err(|error| tracing::warn!(%error, "remote fetching is unavailable"))
                .ok(),
        }
    }
}

impl ResourceFetcher for DefaultFetcher {
    fn fetch(&self, location: &str) -> FetchResult<Fetched> {
        if !uri::is_remote(location) {
            return self.local.fetch(location);
        }
        #[cfg(feature = "remote")]
        if let Some(remote) = &self.remote {
            return remote.fetch(location);
        }
        Err(FetchError::Unsupported(location.to_owned()))
    }

    fn locate(&self, location: &str) -> Option<PathBuf> {
        self.local.locate(location)
    }
}
