//! Fetcher/normalizer worker.
//!
//! One run fetches each level in the order given, normalizes its features, and
//! emits the levels accumulated so far after every successful level. A level
//! that fails is logged and skipped. The run always ends with [`FetchMessage::Done`]
//! unless the receiver has gone away.

mod normalize;

use std::sync::Arc;

use serde::{ser::SerializeStruct, Deserialize, Serialize, Serializer};
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::{
    config::PipelineConfig,
    error::FetchError,
    source::{resolve_url, FeatureSource, SourceResponse},
    unit::{Level, LevelMap},
    worker::decode_message,
};

pub use normalize::{Feature, FeatureCollection, Normalizer};

/// One level to fetch. `url` may be relative to the request domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelDescriptor {
    pub level: Level,
    pub url: String,
}

/// Inbound message: which levels to fetch for which caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchRequest {
    pub domain: String,
    pub centroids: Vec<LevelDescriptor>,
    /// Opaque tag echoed on every progress message.
    pub identifier: Value,
}

/// Outbound message of a fetch run.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchMessage {
    /// All levels completed so far in this run, not just the latest one.
    Progress { identifier: Value, data: LevelMap },
    /// Last message of a run.
    Done,
}

impl FetchMessage {
    pub fn is_done(&self) -> bool { matches!(self, FetchMessage::Done) }
}

impl Serialize for FetchMessage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FetchMessage::Progress { identifier, data } => {
                let mut s = serializer.serialize_struct("Progress", 2)?;
                s.serialize_field("identifier", identifier)?;
                s.serialize_field("data", data)?;
                s.end()
            }
            FetchMessage::Done => {
                let mut s = serializer.serialize_struct("Done", 1)?;
                s.serialize_field("isDone", &true)?;
                s.end()
            }
        }
    }
}

/// Spawns fetch runs against a shared source. Runs share no state.
#[derive(Clone)]
pub struct FetchWorker {
    source: Arc<dyn FeatureSource>,
    config: Arc<PipelineConfig>,
}

impl FetchWorker {
    pub fn new(source: Arc<dyn FeatureSource>, config: Arc<PipelineConfig>) -> Self {
        Self { source, config }
    }

    /// Starts a run and returns its message stream.
    pub fn post(&self, request: FetchRequest) -> mpsc::Receiver<FetchMessage> {
        let (tx, rx) = mpsc::channel(self.config.channel_capacity.max(1));
        tokio::spawn(run_fetch(self.source.clone(), self.config.clone(), request, tx));
        rx
    }

    /// Like [`post`](Self::post) for a JSON request; malformed input starts nothing.
    pub fn post_json(&self, raw: &str) -> Option<mpsc::Receiver<FetchMessage>> {
        decode_message::<FetchRequest>("fetch", raw).map(|request| self.post(request))
    }
}

/// Drives one run to completion, strictly one level at a time.
pub async fn run_fetch(
    source: Arc<dyn FeatureSource>,
    config: Arc<PipelineConfig>,
    request: FetchRequest,
    tx: mpsc::Sender<FetchMessage>,
) {
    let mut normalizer = Normalizer::new(&config);

    for descriptor in &request.centroids {
        let url = resolve_url(&request.domain, &descriptor.url);
        let collection = match fetch_level(source.as_ref(), &url).await {
            Ok(collection) => collection,
            Err(err) => {
                warn!(identifier = %request.identifier, level = descriptor.level, %err, "skipping level");
                continue;
            }
        };

        let added = normalizer.add_level(descriptor.level, &collection);
        debug!(identifier = %request.identifier, level = descriptor.level, added, "level normalized");

        let progress = FetchMessage::Progress {
            identifier: request.identifier.clone(),
            data: normalizer.levels().clone(),
        };
        if tx.send(progress).await.is_err() {
            debug!(identifier = %request.identifier, "receiver dropped, abandoning run");
            return;
        }
    }

    info!(identifier = %request.identifier, levels = normalizer.levels().len(), "fetch run complete");
    let _ = tx.send(FetchMessage::Done).await;
}

/// Fetches and decodes one level's feature collection.
pub async fn fetch_level(source: &dyn FeatureSource, url: &str) -> Result<FeatureCollection, FetchError> {
    let resp = source.get(url).await
        .map_err(|err| FetchError::Transport { url: url.to_string(), message: format!("{err:#}") })?;

    if !resp.is_success() {
        return Err(FetchError::Status {
            url: url.to_string(),
            status: resp.status,
            message: error_message(&resp),
        });
    }

    serde_json::from_slice(&resp.body)
        .map_err(|err| FetchError::Decode { url: url.to_string(), message: err.to_string() })
}

/// Message carried by an error response, or one built from its status line.
pub fn error_message(resp: &SourceResponse) -> String {
    let parsed = serde_json::from_slice::<Value>(&resp.body).ok().and_then(|body| match body {
        Value::String(s) => Some(s),
        Value::Object(map) => ["detail", "message", "error"].iter()
            .find_map(|key| map.get(*key).and_then(Value::as_str).map(str::to_string)),
        _ => None,
    });
    parsed.unwrap_or_else(|| format!("{} {}", resp.status, resp.status_text))
}
