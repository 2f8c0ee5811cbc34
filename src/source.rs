//! Turning a source URL into a local, playable file.
//!
//! Remote sources are downloaded into a temporary "blob" file that lives
//! exactly as long as its [`LocalResource`]. Dropping the resource deletes
//! the file, so release happens once and only once.
//!
//! [`SourceLoader`] runs fetches on worker threads and tags each one with a
//! generation. When the source changes before an older fetch finishes, the
//! late result is released on arrival and never delivered.

use crossbeam_channel::{unbounded, Receiver, Sender};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use tempfile::NamedTempFile;

use crate::error::{PlayerError, Result};

/// A playable local reference to a source.
#[derive(Debug)]
pub struct LocalResource {
    url: String,
    backing: Backing,
}

#[derive(Debug)]
enum Backing {
    /// Downloaded copy, deleted on drop
    Blob(NamedTempFile),
    /// File the user already had; nothing to release
    File(PathBuf),
}

impl LocalResource {
    pub fn blob(url: impl Into<String>, file: NamedTempFile) -> Self {
        Self {
            url: url.into(),
            backing: Backing::Blob(file),
        }
    }

    pub fn file(url: impl Into<String>, path: PathBuf) -> Self {
        Self {
            url: url.into(),
            backing: Backing::File(path),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn path(&self) -> &Path {
        match &self.backing {
            Backing::Blob(file) => file.path(),
            Backing::File(path) => path,
        }
    }

    pub fn is_blob(&self) -> bool {
        matches!(self.backing, Backing::Blob(_))
    }
}

impl Drop for LocalResource {
    fn drop(&mut self) {
        if self.is_blob() {
            log::debug!("Releasing blob for {}", self.url);
        }
    }
}

/// Given a URL, obtain a playable local reference.
pub trait Fetcher: Send + Sync + 'static {
    fn fetch(&self, url: &str) -> Result<LocalResource>;
}

/// Downloads `http(s)` URLs into blobs; `file://` URLs and plain paths are
/// used in place.
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    pub fn new(user_agent: &str) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .redirect(reqwest::redirect::Policy::limited(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self { client })
    }

    fn download(&self, url: &str) -> Result<LocalResource> {
        let mut response = self.client.get(url).send()?;
        if !response.status().is_success() {
            return Err(PlayerError::Fetch(format!("HTTP status: {}", response.status())));
        }

        let mut blob = tempfile::Builder::new()
            .prefix("cinema-")
            .suffix(&extension_suffix(url))
            .tempfile()?;
        let written = response.copy_to(blob.as_file_mut())?;
        blob.as_file_mut().flush()?;

        log::debug!("Fetched {} ({} bytes) into {:?}", url, written, blob.path());
        Ok(LocalResource::blob(url, blob))
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<LocalResource> {
        if url.starts_with("http://") || url.starts_with("https://") {
            return self.download(url);
        }

        let path = PathBuf::from(url.strip_prefix("file://").unwrap_or(url));
        if path.is_file() {
            Ok(LocalResource::file(url, path))
        } else {
            Err(PlayerError::InvalidSource(url.to_string()))
        }
    }
}

/// Keep the container extension so demuxer probing has a hint.
fn extension_suffix(url: &str) -> String {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let name = path.rsplit('/').next().unwrap_or(path);
    match name.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() && ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric()) => {
            format!(".{ext}")
        }
        _ => String::new(),
    }
}

/// What a poll of the loader produced.
#[derive(Debug)]
pub enum SourceEvent {
    Ready(LocalResource),
    Failed { url: String, error: PlayerError },
}

struct Fetched {
    generation: u64,
    url: String,
    result: Result<LocalResource>,
}

/// Generation-guarded source acquisition.
pub struct SourceLoader<F: Fetcher> {
    fetcher: Arc<F>,
    generation: u64,
    pending: Option<String>,
    results_tx: Sender<Fetched>,
    results_rx: Receiver<Fetched>,
}

impl<F: Fetcher> SourceLoader<F> {
    pub fn new(fetcher: F) -> Self {
        let (results_tx, results_rx) = unbounded();
        Self {
            fetcher: Arc::new(fetcher),
            generation: 0,
            pending: None,
            results_tx,
            results_rx,
        }
    }

    /// Start fetching `url`. Supersedes any fetch still in flight.
    pub fn load(&mut self, url: impl Into<String>) {
        let url = url.into();
        self.generation += 1;
        self.pending = Some(url.clone());

        let generation = self.generation;
        let fetcher = Arc::clone(&self.fetcher);
        let results = self.results_tx.clone();

        let spawned = thread::Builder::new()
            .name("cinema-fetch".into())
            .spawn(move || {
                let result = fetcher.fetch(&url);
                // A closed channel hands the message back; dropping it releases the blob
                let _ = results.send(Fetched {
                    generation,
                    url,
                    result,
                });
            });

        if let Err(e) = spawned {
            log::warn!("Could not start fetch thread: {}", e);
            let url = self.pending.take().unwrap_or_default();
            let _ = self.results_tx.send(Fetched {
                generation,
                url,
                result: Err(PlayerError::Io(e)),
            });
        }
    }

    /// Forget the current source. In-flight fetches are released on arrival.
    pub fn cancel(&mut self) {
        self.generation += 1;
        self.pending = None;
    }

    /// URL of the fetch currently awaited, if any.
    pub fn pending(&self) -> Option<&str> {
        self.pending.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    /// Deliver the result of the current fetch, if it has finished.
    /// Superseded results are dropped here, releasing their blobs.
    pub fn poll(&mut self) -> Option<SourceEvent> {
        let mut delivered = None;

        for fetched in self.results_rx.try_iter() {
            if fetched.generation != self.generation {
                log::debug!("Discarding superseded fetch of {}", fetched.url);
                continue;
            }
            self.pending = None;
            delivered = Some(match fetched.result {
                Ok(resource) => SourceEvent::Ready(resource),
                Err(error) => {
                    log::warn!("Failed to load {}: {}", fetched.url, error);
                    SourceEvent::Failed {
                        url: fetched.url,
                        error,
                    }
                }
            });
        }

        delivered
    }
}
