//! Format-specific document loaders.
//!
//! A [`LoadSource`] names a file (on disk or already in memory); its
//! extension picks the loader. Every loader returns zero or more
//! [`RawDocument`]s tagged with a `source` metadata entry.
//!
//! | Extension | Documents produced |
//! |-----------|--------------------|
//! | `txt`, `md`, `markdown` | the whole file as one document |
//! | `json` | one per `{content, metadata?}` record, or one flattened `key.path: value` listing |
//! | `csv` | one per record, rendered as `header: value` lines |
//! | `pdf` (feature `pdf`) | one per non-empty line of extracted text |

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::document::RawDocument;
use crate::error::{RagError, Result};

/// Metadata key holding the name of the file a document was loaded from.
pub const SOURCE_KEY: &str = "source";

/// Where to read a document source from.
#[derive(Debug, Clone)]
pub enum LoadSource {
    /// A file on disk.
    Path(PathBuf),
    /// File contents already in memory (e.g. an HTTP upload).
    Bytes {
        /// File name, used for format detection and `source` metadata.
        name: String,
        /// Raw file contents.
        data: Vec<u8>,
    },
}

impl LoadSource {
    /// A source backed by a file on disk.
    pub fn path(path: impl Into<PathBuf>) -> Self {
        Self::Path(path.into())
    }

    /// A source backed by in-memory bytes.
    pub fn bytes(name: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self::Bytes { name: name.into(), data: data.into() }
    }

    /// The file name recorded as `source` metadata.
    pub fn name(&self) -> String {
        match self {
            Self::Path(path) => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string()),
            Self::Bytes { name, .. } => name.clone(),
        }
    }

    /// The detected format of this source.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::UnsupportedFormat`] for unknown or missing extensions.
    pub fn format(&self) -> Result<SourceFormat> {
        let extension = match self {
            Self::Path(path) => extension_of(path),
            Self::Bytes { name, .. } => extension_of(Path::new(name)),
        };
        SourceFormat::from_extension(&extension)
    }

    async fn read(&self) -> Result<Vec<u8>> {
        match self {
            Self::Path(path) => Ok(tokio::fs::read(path).await?),
            Self::Bytes { data, .. } => Ok(data.clone()),
        }
    }
}

fn extension_of(path: &Path) -> String {
    path.extension().map(|e| e.to_string_lossy().to_lowercase()).unwrap_or_default()
}

/// Supported source formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// Plain text or markdown.
    Text,
    /// JSON records or an arbitrary JSON document.
    Json,
    /// Comma-separated values with a header row.
    Csv,
    /// PDF text extraction.
    #[cfg(feature = "pdf")]
    Pdf,
}

impl SourceFormat {
    /// Map a lower-case file extension to a format.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::UnsupportedFormat`] if no loader handles `extension`.
    pub fn from_extension(extension: &str) -> Result<Self> {
        match extension {
            "txt" | "text" | "md" | "markdown" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            #[cfg(feature = "pdf")]
            "pdf" => Ok(Self::Pdf),
            other => Err(RagError::UnsupportedFormat { extension: other.to_string() }),
        }
    }
}

/// Read and parse `source` into raw documents.
///
/// # Errors
///
/// Returns [`RagError::UnsupportedFormat`] before reading anything if the
/// extension is unknown, [`RagError::Io`] if the file cannot be read, and
/// [`RagError::Loader`] if the contents are malformed.
pub async fn load(source: &LoadSource) -> Result<Vec<RawDocument>> {
    let format = source.format()?;
    let data = source.read().await?;
    parse(format, &source.name(), &data)
}

/// Parse in-memory contents of the given format.
pub fn parse(format: SourceFormat, name: &str, data: &[u8]) -> Result<Vec<RawDocument>> {
    let documents = match format {
        SourceFormat::Text => load_text(data)?,
        SourceFormat::Json => load_json(data)?,
        SourceFormat::Csv => load_csv(data)?,
        #[cfg(feature = "pdf")]
        SourceFormat::Pdf => load_pdf(data)?,
    };
    debug!(source = name, ?format, document_count = documents.len(), "parsed source");

    Ok(documents
        .into_iter()
        .map(|mut doc| {
            doc.metadata.insert(SOURCE_KEY.to_string(), name.to_string());
            doc
        })
        .collect())
}

fn utf8<'a>(format: &str, data: &'a [u8]) -> Result<&'a str> {
    std::str::from_utf8(data).map_err(|e| RagError::loader(format, e))
}

fn load_text(data: &[u8]) -> Result<Vec<RawDocument>> {
    let text = utf8("text", data)?;
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    Ok(vec![RawDocument::new(text)])
}

fn load_json(data: &[u8]) -> Result<Vec<RawDocument>> {
    let value: Value = serde_json::from_slice(data).map_err(|e| RagError::loader("json", e))?;

    if let Value::Array(items) = &value {
        if !items.is_empty() && items.iter().all(is_record) {
            return Ok(items.iter().map(record_to_document).collect());
        }
    }

    let mut pairs = Vec::new();
    flatten_json(&value, String::new(), &mut pairs);
    let content = pairs
        .into_iter()
        .map(|(key, value)| if key.is_empty() { value } else { format!("{key}: {value}") })
        .collect::<Vec<_>>()
        .join("\n");

    if content.trim().is_empty() {
        return Ok(Vec::new());
    }
    Ok(vec![RawDocument::new(content)])
}

/// `{ "content": "...", "metadata": { ... } }` with optional metadata.
fn is_record(item: &Value) -> bool {
    let Some(object) = item.as_object() else {
        return false;
    };
    object.get("content").is_some_and(Value::is_string)
        && object.get("metadata").is_none_or(|m| m.is_object() || m.is_null())
}

fn record_to_document(item: &Value) -> RawDocument {
    let content = item.get("content").and_then(Value::as_str).unwrap_or_default();
    let mut document = RawDocument::new(content);
    if let Some(metadata) = item.get("metadata").and_then(Value::as_object) {
        for (key, value) in metadata {
            document.metadata.insert(key.clone(), scalar_to_string(value));
        }
    }
    document
}

fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Flatten nested objects and arrays into `a.b[0].c` key paths.
fn flatten_json(value: &Value, prefix: String, out: &mut Vec<(String, String)>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let path = if prefix.is_empty() { key.clone() } else { format!("{prefix}.{key}") };
                flatten_json(child, path, out);
            }
        }
        Value::Array(items) => {
            for (i, child) in items.iter().enumerate() {
                flatten_json(child, format!("{prefix}[{i}]"), out);
            }
        }
        scalar => out.push((prefix, scalar_to_string(scalar))),
    }
}

fn load_csv(data: &[u8]) -> Result<Vec<RawDocument>> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(data);
    let headers = reader.headers().map_err(|e| RagError::loader("csv", e))?.clone();

    let mut documents = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record.map_err(|e| RagError::loader("csv", e))?;
        if record.iter().all(|field| field.trim().is_empty()) {
            continue;
        }
        let content = headers
            .iter()
            .zip(record.iter())
            .map(|(header, field)| format!("{header}: {field}"))
            .collect::<Vec<_>>()
            .join("\n");
        documents.push(RawDocument::new(content).with_metadata("row", row.to_string()));
    }

    Ok(documents)
}

#[cfg(feature = "pdf")]
fn load_pdf(data: &[u8]) -> Result<Vec<RawDocument>> {
    let text = pdf_extract::extract_text_from_mem(data).map_err(|e| RagError::loader("pdf", e))?;

    Ok(text
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| RawDocument::new(line.trim()).with_metadata("line", (i + 1).to_string()))
        .collect())
}
