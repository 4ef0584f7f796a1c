use anyhow::{bail, Context, Result};
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::fs;
use std::io::Read;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver};
use std::thread;
use std::time::Duration;

/// A point of interest from the dataset
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Place {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub address: String,
    pub lat: f64,
    pub lng: f64,
    /// 0 means unrated
    #[serde(default, deserialize_with = "null_as_default")]
    pub rating: f64,
    /// Category tags, first entry is the primary type
    #[serde(default, deserialize_with = "null_as_default")]
    pub types: Vec<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub website: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub wheelchair_accessible: Option<bool>,
    #[serde(default)]
    pub open_now: Option<bool>,
}

impl Place {
    /// Minimal constructor, mostly for tests and benches
    pub fn new(name: &str, lat: f64, lng: f64, rating: f64, types: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            address: String::new(),
            lat,
            lng,
            rating,
            types: types.iter().map(|t| t.to_string()).collect(),
            website: None,
            phone: None,
            id: None,
            wheelchair_accessible: None,
            open_now: None,
        }
    }

    pub fn primary_type(&self) -> Option<&str> {
        self.types.first().map(String::as_str)
    }

    pub fn is_rated(&self) -> bool {
        self.rating > 0.0
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// The scraper writes `""` for a missing website or phone
fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}

/// Document-level fields written alongside the place list
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DatasetMeta {
    pub last_updated: Option<String>,
    pub total_places: Option<usize>,
}

/// Places in file order, never mutated after load
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub places: Vec<Place>,
    pub meta: DatasetMeta,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.places.len()
    }

    pub fn is_empty(&self) -> bool {
        self.places.is_empty()
    }
}

#[derive(Deserialize)]
struct Document {
    places: Vec<Place>,
    #[serde(default)]
    last_updated: Option<String>,
    #[serde(default)]
    total_places: Option<usize>,
}

/// Where the place document comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Path(PathBuf),
    Url(String),
}

impl Source {
    pub fn parse(raw: &str) -> Self {
        if raw.starts_with("http://") || raw.starts_with("https://") {
            Source::Url(raw.to_string())
        } else {
            Source::Path(PathBuf::from(raw))
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Path(path) => write!(f, "{}", path.display()),
            Source::Url(url) => f.write_str(url),
        }
    }
}

/// Parse a place document. The buffer is used as simd-json scratch space.
pub fn parse(bytes: &mut [u8]) -> Result<Dataset> {
    let doc: Document =
        simd_json::serde::from_slice(bytes).context("place document is not valid JSON")?;
    Ok(Dataset {
        places: doc.places,
        meta: DatasetMeta {
            last_updated: doc.last_updated,
            total_places: doc.total_places,
        },
    })
}

fn fetch(url: &str) -> Result<Vec<u8>> {
    // ureq follows redirects and reports 4xx/5xx as errors
    let response = match ureq::get(url).call() {
        Ok(response) => response,
        Err(ureq::Error::Status(code, response)) => {
            bail!("{url} answered {code} {}", response.status_text())
        }
        Err(e) => return Err(anyhow::Error::new(e).context(format!("requesting {url}"))),
    };

    let mut bytes = Vec::new();
    response
        .into_reader()
        .read_to_end(&mut bytes)
        .with_context(|| format!("reading body of {url}"))?;
    Ok(bytes)
}

/// Read and parse the place document. Blocks the calling thread.
pub fn load(source: &Source) -> Result<Dataset> {
    let mut bytes = match source {
        Source::Path(path) => {
            fs::read(path).with_context(|| format!("reading {}", path.display()))?
        }
        Source::Url(url) => fetch(url)?,
    };
    parse(&mut bytes).with_context(|| format!("loading places from {source}"))
}

pub type LoadOutcome = Result<Dataset>;

/// Run [`load`] on a worker thread. A successful load is held back for
/// `min_latency` before it is delivered; failures are delivered at once.
/// Exactly one outcome is sent.
pub fn spawn_load(source: Source, min_latency: Duration) -> Receiver<LoadOutcome> {
    let (tx, rx) = mpsc::channel();
    let worker_tx = tx.clone();

    let spawned = thread::Builder::new()
        .name("placemap-loader".into())
        .spawn(move || {
            let outcome = load(&source);
            if outcome.is_ok() && !min_latency.is_zero() {
                thread::sleep(min_latency);
            }
            if worker_tx.send(outcome).is_err() {
                log::debug!("load of {source} finished after the receiver went away");
            }
        });

    if let Err(e) = spawned {
        let _ = tx.send(Err(anyhow::Error::new(e).context("starting loader thread")));
    }

    rx
}
