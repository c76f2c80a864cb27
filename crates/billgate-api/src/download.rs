//! File delivery from object storage
//!
//! A download copies the object into a private temp directory, then streams
//! the copy to the client. The [`DownloadTicket`] owning that directory
//! travels with the response body, so the copy is removed when the body
//! finishes, fails, or is dropped by a disconnecting client. Fetch failures
//! remove it immediately.

use axum::{
    body::Body,
    http::{
        header::{CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE},
        HeaderValue, StatusCode,
    },
    response::Response,
};
use billgate_backend::ObjectStorage;
use billgate_core::FileName;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use std::io;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::task::{Context, Poll};
use tempfile::TempDir;
use tokio::fs::File;
use tokio_util::io::ReaderStream;
use tracing::{debug, error};

use crate::error::{ApiError, ApiResult};

/// Local copy of one object for the span of one download
#[derive(Debug)]
pub struct DownloadTicket {
    file_name: FileName,
    local_path: PathBuf,
    dir: TempDir,
}

impl DownloadTicket {
    /// Reserve a fresh directory under `temp_root` for `file_name`
    pub fn create(temp_root: &Path, file_name: FileName) -> io::Result<Self> {
        std::fs::create_dir_all(temp_root)?;
        let dir = tempfile::Builder::new()
            .prefix("billgate-download-")
            .tempdir_in(temp_root)?;
        let local_path = dir.path().join(file_name.as_str());

        Ok(Self {
            file_name,
            local_path,
            dir,
        })
    }

    pub fn file_name(&self) -> &FileName {
        &self.file_name
    }

    pub fn local_path(&self) -> &Path {
        &self.local_path
    }
}

impl Drop for DownloadTicket {
    fn drop(&mut self) {
        debug!(path = %self.dir.path().display(), "Releasing download");
    }
}

/// File stream that owns its ticket
struct DownloadStream {
    inner: ReaderStream<File>,
    _ticket: DownloadTicket,
}

impl Stream for DownloadStream {
    type Item = io::Result<Bytes>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().inner.poll_next_unpin(cx)
    }
}

/// Fetch `object_key` and stream it inline as `file_name`
pub async fn deliver(
    storage: &dyn ObjectStorage,
    temp_root: &Path,
    object_key: &str,
    file_name: FileName,
) -> ApiResult<Response> {
    let ticket = DownloadTicket::create(temp_root, file_name).map_err(|e| {
        error!(error = %e, root = %temp_root.display(), "Failed to reserve download directory");
        ApiError::resource()
    })?;

    if let Err(e) = storage.fetch_to_file(object_key, ticket.local_path()).await {
        error!(error = %e, key = object_key, "Failed to fetch file from object storage");
        return Err(ApiError::resource());
    }

    let file = File::open(ticket.local_path()).await.map_err(|e| {
        error!(error = %e, key = object_key, "Failed to open downloaded file");
        ApiError::resource()
    })?;
    let length = file.metadata().await.map(|m| m.len()).ok();

    let content_type = content_type_for(ticket.file_name());
    let disposition = HeaderValue::from_str(&format!(
        "inline; filename=\"{}\"",
        ticket.file_name().as_str().replace('"', "\\\"")
    ))
    .map_err(|e| {
        error!(error = %e, "File name cannot be sent in a header");
        ApiError::resource()
    })?;

    let stream = DownloadStream {
        inner: ReaderStream::new(file),
        _ticket: ticket,
    };

    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, content_type)
        .header(CONTENT_DISPOSITION, disposition);
    if let Some(length) = length {
        builder = builder.header(CONTENT_LENGTH, length);
    }

    builder.body(Body::from_stream(stream)).map_err(|e| {
        error!(error = %e, "Failed to build download response");
        ApiError::resource()
    })
}

/// MIME type from the file extension
pub fn content_type_for(file_name: &FileName) -> &'static str {
    match file_name.extension().as_deref() {
        Some("pdf") => "application/pdf",
        Some("csv") => "text/csv",
        Some("xlsx") => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        Some("xls") => "application/vnd.ms-excel",
        Some("json") => "application/json",
        Some("txt") => "text/plain",
        Some("zip") => "application/zip",
        _ => "application/octet-stream",
    }
}
