//! Session state: the current raw document and the editable working rows.
//!
//! Both live under two logical keys ([`statics::KEY_UPLOADED_JSON`] and
//! [`statics::KEY_WORKING_ROWS`]). A session opened on a directory mirrors each
//! key to `<dir>/<key>.json` so the state survives restarts.

use crate::extract::document_from_result;
use crate::normalize::normalize_document;
use crate::order::SummaryRow;
use crate::statics;
use anyhow::{Context, bail};
use serde_json::Value;
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// The raw document was replaced (load, ingestion or committed edit).
    DocumentReplaced,
    /// Working rows were edited, deleted or saved away.
    RowsChanged,
    /// Everything was cleared.
    Cleared,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&SessionEvent)>;

pub struct Session {
    dir: Option<PathBuf>,
    document: Option<Value>,
    working_rows: Option<Vec<SummaryRow>>,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("dir", &self.dir)
            .field("document", &self.document.is_some())
            .field("working_rows", &self.working_rows.as_ref().map(Vec::len))
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl Session {
    pub fn in_memory() -> Self {
        Self {
            dir: None,
            document: None,
            working_rows: None,
            listeners: Vec::new(),
            next_subscription: 0,
        }
    }

    /// Opens a persistent session, loading whatever state `dir` holds.
    pub fn open(dir: &Path) -> anyhow::Result<Self> {
        fs::create_dir_all(dir).with_context(|| format!("creating session dir {dir:?}"))?;
        let mut session = Self::in_memory();
        session.dir = Some(dir.to_path_buf());

        session.document = load_key::<Value>(dir, statics::KEY_UPLOADED_JSON);
        session.working_rows = load_key::<Vec<SummaryRow>>(dir, statics::KEY_WORKING_ROWS);
        info!(
            dir = ?dir,
            document = session.document.is_some(),
            working_rows = session.working_rows.as_ref().map(Vec::len),
            "session opened"
        );
        Ok(session)
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&SessionEvent) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        self.listeners.len() != before
    }

    pub fn document(&self) -> Option<&Value> {
        self.document.as_ref()
    }

    /// Replaces the raw document. Working rows already present are kept and
    /// keep taking precedence over the new document.
    pub fn replace_document(&mut self, doc: Value) -> anyhow::Result<()> {
        self.document = Some(doc);
        self.persist_document()?;
        info!("document replaced");
        self.notify(SessionEvent::DocumentReplaced);
        Ok(())
    }

    /// Stores an AI workflow result as `{ "text": ... }` and drops working rows.
    /// Returns `false` when the result carries no usable text.
    pub fn ingest_extraction(&mut self, result: &Value) -> anyhow::Result<bool> {
        let Some(doc) = document_from_result(result) else {
            warn!("extraction result had no text payload");
            return Ok(false);
        };
        self.document = Some(doc);
        self.working_rows = None;
        self.persist_document()?;
        self.persist_rows()?;
        info!("extraction result ingested");
        self.notify(SessionEvent::DocumentReplaced);
        Ok(true)
    }

    /// Commits a mutated document; derived rows are dropped and recomputed.
    pub fn commit_document(&mut self, doc: Value) -> anyhow::Result<()> {
        self.document = Some(doc);
        self.working_rows = None;
        self.persist_document()?;
        self.persist_rows()?;
        info!("edited document committed");
        self.notify(SessionEvent::DocumentReplaced);
        Ok(())
    }

    /// The working rows, normalizing the document on first access. Without a
    /// document there is nothing to cache.
    pub fn rows(&mut self) -> &[SummaryRow] {
        if self.working_rows.is_none()
            && let Some(doc) = &self.document
        {
            self.working_rows = Some(normalize_document(doc));
            if let Err(err) = self.persist_rows() {
                warn!(error = %err, "could not persist working rows");
            }
        }
        self.working_rows.as_deref().unwrap_or_default()
    }

    pub fn update_row(&mut self, index: usize, row: SummaryRow) -> anyhow::Result<()> {
        let count = self.rows().len();
        let Some(slot) = self.working_rows.as_mut().and_then(|rows| rows.get_mut(index)) else {
            bail!("row {index} out of range ({count} rows)");
        };
        *slot = row;
        self.rows_changed()
    }

    pub fn delete_row(&mut self, index: usize) -> anyhow::Result<SummaryRow> {
        let count = self.rows().len();
        if index >= count {
            bail!("row {index} out of range ({count} rows)");
        }
        let removed = self
            .working_rows
            .as_mut()
            .map(|rows| rows.remove(index))
            .unwrap_or_default();
        self.rows_changed()?;
        Ok(removed)
    }

    /// Keeps only rows for which `keep(index, row)` holds; returns how many were removed.
    pub fn retain_rows(
        &mut self,
        mut keep: impl FnMut(usize, &SummaryRow) -> bool,
    ) -> anyhow::Result<usize> {
        let before = self.rows().len();
        let Some(rows) = self.working_rows.take() else {
            return Ok(0);
        };
        let kept: Vec<SummaryRow> = rows
            .into_iter()
            .enumerate()
            .filter(|(i, row)| keep(*i, row))
            .map(|(_, row)| row)
            .collect();
        let removed = before - kept.len();
        self.working_rows = Some(kept);
        self.rows_changed()?;
        Ok(removed)
    }

    pub fn clear(&mut self) -> anyhow::Result<()> {
        self.document = None;
        self.working_rows = None;
        self.persist_document()?;
        self.persist_rows()?;
        info!("session cleared");
        self.notify(SessionEvent::Cleared);
        Ok(())
    }

    fn rows_changed(&mut self) -> anyhow::Result<()> {
        self.persist_rows()?;
        self.notify(SessionEvent::RowsChanged);
        Ok(())
    }

    fn notify(&mut self, event: SessionEvent) {
        for (_, listener) in &mut self.listeners {
            listener(&event);
        }
    }

    fn persist_document(&self) -> anyhow::Result<()> {
        let Some(dir) = &self.dir else {
            return Ok(());
        };
        store_key(dir, statics::KEY_UPLOADED_JSON, self.document.as_ref())
    }

    fn persist_rows(&self) -> anyhow::Result<()> {
        let Some(dir) = &self.dir else {
            return Ok(());
        };
        store_key(dir, statics::KEY_WORKING_ROWS, self.working_rows.as_ref())
    }
}

fn key_path(dir: &Path, key: &str) -> PathBuf {
    dir.join(format!("{key}.json"))
}

fn load_key<T: serde::de::DeserializeOwned>(dir: &Path, key: &str) -> Option<T> {
    let path = key_path(dir, key);
    let text = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return None,
        Err(err) => {
            warn!(path = ?path, error = %err, "could not read session key");
            return None;
        }
    };
    match serde_json::from_str(&text) {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(path = ?path, error = %err, "ignoring unreadable session key");
            None
        }
    }
}

/// Writes `value` under `key`, or removes the key when `None`.
fn store_key<T: serde::Serialize>(dir: &Path, key: &str, value: Option<&T>) -> anyhow::Result<()> {
    let path = key_path(dir, key);
    match value {
        Some(value) => {
            let text = serde_json::to_string(value).with_context(|| format!("encoding {key}"))?;
            fs::write(&path, text).with_context(|| format!("writing {path:?}"))
        }
        None => match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err).with_context(|| format!("removing {path:?}")),
        },
    }
}

/// Loads a user-picked document file.
///
/// Strict JSON is tried first; JSON5 (comments, trailing commas, single quotes)
/// is accepted as a fallback.
pub fn read_document_file(path: &Path) -> anyhow::Result<Value> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {path:?}"))?;
    let doc = match serde_json::from_str::<Value>(&text) {
        Ok(doc) => doc,
        Err(_) => json5::from_str::<Value>(&text).with_context(|| format!("parsing {path:?}"))?,
    };
    info!(path = ?path, "document file loaded");
    Ok(doc)
}
