//! Client for the AI extraction workflow service.
//!
//! Scanned images are uploaded one by one, then a blocking workflow run gets the
//! file ids together with the current document and working rows. The run result
//! carries the extracted orders as text somewhere in its body.

use crate::config::AppConfig;
use crate::statics;
use reqwest::blocking::{Client, RequestBuilder, Response, multipart};
use serde::Serialize;
use serde_json::{Map, Value, json};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("{} is not configured", statics::ENV_API_KEY)]
    NotConfigured,
    #[error("no files to upload")]
    NoFiles,
    #[error("reading {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("workflow service returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("upload response carried no file id: {0}")]
    MissingFileId(Value),
}

/// What the extraction needs besides the images.
#[derive(Debug, Clone, Default)]
pub struct ExtractionContext {
    /// The current raw document, sent as `order_json`.
    pub document: Option<Value>,
    /// The current working rows, sent as `working_rows`.
    pub working_rows: Vec<Value>,
}

pub trait ExtractionService {
    /// Runs the extraction over `images` and returns the raw run result.
    fn extract(&self, images: &[PathBuf], context: &ExtractionContext) -> Result<Value, WorkflowError>;
}

#[derive(Debug, Clone, Serialize)]
pub struct RunRequest {
    pub inputs: Value,
    pub response_mode: String,
    pub user: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workflow_id: Option<String>,
}

impl RunRequest {
    /// Blocking run over uploaded file ids.
    pub fn for_files(file_ids: &[String], context: &ExtractionContext, user: &str) -> Self {
        let input_file: Vec<Value> = file_ids
            .iter()
            .map(|id| {
                json!({
                    "type": "image",
                    "transfer_method": "local_file",
                    "upload_file_id": id,
                })
            })
            .collect();
        Self {
            inputs: json!({
                "order_json": context.document.clone().unwrap_or(Value::Null),
                "working_rows": context.working_rows,
                "input_file": input_file,
            }),
            response_mode: "blocking".to_string(),
            user: user.to_string(),
            workflow_id: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct WorkflowClient {
    http: Client,
    base_url: String,
    api_key: String,
    workflow_id: Option<String>,
    run_endpoint: String,
    detail_endpoint: String,
    user: String,
}

impl WorkflowClient {
    pub fn new(config: &AppConfig) -> Result<Self, WorkflowError> {
        let api_key = config.api_key.clone().ok_or(WorkflowError::NotConfigured)?;
        let http = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            http,
            base_url: config.api_base_url.clone(),
            api_key,
            workflow_id: config.workflow_id.clone(),
            run_endpoint: config.run_endpoint.clone(),
            detail_endpoint: config.detail_endpoint.clone(),
            user: config.user.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{path}", self.base_url)
        } else {
            format!("{}/{path}", self.base_url)
        }
    }

    fn send(&self, request: RequestBuilder) -> Result<Value, WorkflowError> {
        let response = request.bearer_auth(&self.api_key).send()?;
        json_body(response)
    }

    /// Uploads one image and returns the service's file id.
    pub fn upload_file(&self, path: &Path) -> Result<String, WorkflowError> {
        let form = multipart::Form::new()
            .file("file", path)
            .map_err(|source| WorkflowError::Io {
                path: path.to_path_buf(),
                source,
            })?
            .text("purpose", "workflow");
        let body = self.send(self.http.post(self.url("/v1/files/upload")).multipart(form))?;
        let id = upload_file_id(&body).ok_or_else(|| WorkflowError::MissingFileId(body.clone()))?;
        info!(path = ?path, file_id = %id, "image uploaded");
        Ok(id)
    }

    pub fn run(&self, request: &RunRequest) -> Result<Value, WorkflowError> {
        let mut request = request.clone();
        if request.workflow_id.is_none() {
            request.workflow_id = self.workflow_id.clone();
        }
        let url = self.url(&self.run_endpoint);
        info!(url = %url, "running workflow");
        self.send(self.http.post(url).json(&request))
    }

    /// Run detail URL with the id substituted into the configured template.
    fn run_detail_url(&self, run_id: &str) -> String {
        let path = self
            .detail_endpoint
            .replace(statics::RUN_ID_PLACEHOLDER, &urlencoding::encode(run_id));
        self.url(&path)
    }

    /// Fetches a previous run by id.
    pub fn run_detail(&self, run_id: &str) -> Result<Value, WorkflowError> {
        self.send(self.http.get(self.run_detail_url(run_id)))
    }
}

impl ExtractionService for WorkflowClient {
    fn extract(&self, images: &[PathBuf], context: &ExtractionContext) -> Result<Value, WorkflowError> {
        if images.is_empty() {
            return Err(WorkflowError::NoFiles);
        }
        let file_ids = images
            .iter()
            .map(|path| self.upload_file(path))
            .collect::<Result<Vec<_>, _>>()?;
        self.run(&RunRequest::for_files(&file_ids, context, &self.user))
    }
}

fn json_body(response: Response) -> Result<Value, WorkflowError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().unwrap_or_default();
        warn!(status = status.as_u16(), "workflow service error");
        return Err(WorkflowError::Status {
            status: status.as_u16(),
            body,
        });
    }
    // Some endpoints answer with an empty body.
    let text = response.text()?;
    Ok(serde_json::from_str(&text).unwrap_or_else(|_| json!({})))
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value.and_then(Value::as_str).filter(|s| !s.is_empty())
}

/// File id from an upload response: `data.id`, `id`, `data.file_id` or `file_id`.
pub fn upload_file_id(body: &Value) -> Option<String> {
    [
        body.pointer("/data/id"),
        body.get("id"),
        body.pointer("/data/file_id"),
        body.get("file_id"),
    ]
    .into_iter()
    .find_map(|v| match v {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// First non-empty string among `text`, `data.text`, `data.outputs.text`,
/// `outputs.text` and `result`.
pub fn extract_result_text(result: &Value) -> Option<&str> {
    [
        result.get("text"),
        result.pointer("/data/text"),
        result.pointer("/data/outputs/text"),
        result.pointer("/outputs/text"),
        result.get("result"),
    ]
    .into_iter()
    .find_map(non_empty_str)
}

/// The document an extraction result becomes: `{ "text": ... }`.
pub fn document_from_result(result: &Value) -> Option<Value> {
    let text = extract_result_text(result)?;
    let mut doc = Map::new();
    doc.insert(statics::F_TEXT.to_string(), Value::String(text.to_string()));
    Some(Value::Object(doc))
}
