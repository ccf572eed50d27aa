//! Resumable file upload protocol
//!
//! Attachments travel out-of-band, before the chat turn that references
//! them, in two phases: an initiation request that returns an
//! upload-session endpoint via a response header, then a single streamed
//! transfer of the raw bytes with an explicit "upload, finalize" command.
//! Failure at either phase is fatal to the enclosing turn and is not
//! retried.

use crate::attachments::Attachment;
use crate::error::{DocuchatError, Result};
use crate::gateway::types::{StoredFile, UploadResponse};
use crate::gateway::ModelGateway;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use reqwest::StatusCode;
use tokio::sync::mpsc;

const UPLOAD_PROTOCOL_HEADER: &str = "X-Goog-Upload-Protocol";
const UPLOAD_COMMAND_HEADER: &str = "X-Goog-Upload-Command";
const UPLOAD_CONTENT_LENGTH_HEADER: &str = "X-Goog-Upload-Header-Content-Length";
const UPLOAD_CONTENT_TYPE_HEADER: &str = "X-Goog-Upload-Header-Content-Type";
const UPLOAD_OFFSET_HEADER: &str = "X-Goog-Upload-Offset";
const UPLOAD_URL_HEADER: &str = "x-goog-upload-url";

/// Transfer body chunk size; progress is reported once per chunk sent
const UPLOAD_CHUNK_BYTES: usize = 256 * 1024;

impl ModelGateway {
    /// Upload one attachment and return its stored-file reference
    ///
    /// `on_progress` receives `(bytes_sent, bytes_total)` pairs
    /// proportional to transfer progress, suitable for a progress bar.
    ///
    /// # Errors
    ///
    /// Returns an upload error if either phase fails, or an
    /// authentication error if the credential is rejected.
    pub async fn upload(
        &self,
        key: &str,
        attachment: &Attachment,
        mut on_progress: impl FnMut(u64, u64),
    ) -> Result<StoredFile> {
        let total = attachment.len() as u64;
        on_progress(0, total);

        let session_url = self.begin_upload(key, attachment).await?;
        tracing::debug!(file = %attachment.name, "upload session opened");

        let stored = self
            .transfer_upload(&session_url, attachment, &mut on_progress)
            .await?;
        on_progress(total, total);
        tracing::info!(file = %attachment.name, uri = %stored.uri, "upload complete");
        Ok(stored)
    }

    /// Phase one: declare length and type, receive the session endpoint
    async fn begin_upload(&self, key: &str, attachment: &Attachment) -> Result<String> {
        let url = format!("{}/upload/v1beta/files", self.api_base());
        let body = serde_json::json!({ "file": { "display_name": attachment.name } });

        let response = self
            .http()
            .post(&url)
            .query(&[("key", key)])
            .header(UPLOAD_PROTOCOL_HEADER, "resumable")
            .header(UPLOAD_COMMAND_HEADER, "start")
            .header(UPLOAD_CONTENT_LENGTH_HEADER, attachment.len().to_string())
            .header(UPLOAD_CONTENT_TYPE_HEADER, attachment.mime_type.as_str())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(DocuchatError::Authentication(format!(
                "upload rejected the credential (status {})",
                status
            ))
            .into());
        }
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(DocuchatError::Upload(format!(
                "initiation for {} failed with status {}: {}",
                attachment.name, status, detail
            ))
            .into());
        }

        response
            .headers()
            .get(UPLOAD_URL_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| {
                DocuchatError::Upload(format!(
                    "initiation for {} returned no upload session URL",
                    attachment.name
                ))
                .into()
            })
    }

    /// Phase two: stream the raw bytes to the session endpoint
    async fn transfer_upload(
        &self,
        session_url: &str,
        attachment: &Attachment,
        on_progress: &mut impl FnMut(u64, u64),
    ) -> Result<StoredFile> {
        let total = attachment.len() as u64;
        let (progress_tx, mut progress_rx) = mpsc::unbounded_channel::<u64>();
        let body = progress_body(attachment.data.clone(), progress_tx);

        let request = self
            .http()
            .post(session_url)
            .header(UPLOAD_COMMAND_HEADER, "upload, finalize")
            .header(UPLOAD_OFFSET_HEADER, "0")
            .header(reqwest::header::CONTENT_LENGTH, total)
            .body(reqwest::Body::wrap_stream(body))
            .send();
        tokio::pin!(request);

        // Drive the request while draining progress reports from the body
        // stream as its chunks are consumed.
        let mut progress_open = true;
        let response = loop {
            tokio::select! {
                sent = progress_rx.recv(), if progress_open => match sent {
                    Some(sent) => on_progress(sent, total),
                    None => progress_open = false,
                },
                result = &mut request => break result?,
            }
        };
        while let Ok(sent) = progress_rx.try_recv() {
            on_progress(sent, total);
        }

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(DocuchatError::Authentication(format!(
                "upload rejected the credential (status {})",
                status
            ))
            .into());
        }
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(DocuchatError::Upload(format!(
                "transfer for {} failed with status {}: {}",
                attachment.name, status, detail
            ))
            .into());
        }

        let parsed: UploadResponse = response.json().await.map_err(|err| {
            DocuchatError::Upload(format!(
                "transfer for {} returned a malformed response: {}",
                attachment.name, err
            ))
        })?;
        Ok(parsed.file)
    }
}

/// Chunked request body that reports cumulative bytes handed to the
/// transport through `progress_tx`
fn progress_body(
    data: Bytes,
    progress_tx: mpsc::UnboundedSender<u64>,
) -> impl Stream<Item = std::result::Result<Bytes, std::io::Error>> + Send + 'static {
    let mut chunks = Vec::with_capacity(data.len() / UPLOAD_CHUNK_BYTES + 1);
    let mut offset = 0;
    while offset < data.len() {
        let end = (offset + UPLOAD_CHUNK_BYTES).min(data.len());
        chunks.push(data.slice(offset..end));
        offset = end;
    }

    let mut sent = 0u64;
    futures::stream::iter(chunks).map(move |chunk| {
        sent += chunk.len() as u64;
        let _ = progress_tx.send(sent);
        Ok(chunk)
    })
}
