//! Session orchestration
//!
//! The orchestrator owns all mutable session state (transcript,
//! attachment queue, remote conversation context, credential, loading
//! flag) and drives one turn at a time: prompt composition, sequential
//! attachment upload, token counting, streaming ingestion, and error
//! routing. Every state change is reported to the [`Renderer`].

use crate::attachments::{Attachment, AttachmentQueue};
use crate::credentials::CredentialStore;
use crate::error::{DocuchatError, Result};
use crate::gateway::{ChatContext, Content, ModelGateway, Part, StoredFile};
use crate::prompts::{self, PromptLibrary};
use crate::render::Renderer;
use crate::session::transcript::Transcript;
use futures::StreamExt;

/// The session state machine
///
/// Constructed once per process; all mutation goes through its methods.
/// A submitted turn runs to completion or failure; the loading flag is
/// the signal that gates destructive actions meanwhile.
pub struct SessionOrchestrator<R: Renderer> {
    transcript: Transcript,
    queue: AttachmentQueue,
    context: Option<ChatContext>,
    gateway: ModelGateway,
    prompts: PromptLibrary,
    credential_store: CredentialStore,
    credential: Option<String>,
    active_prefix: Option<String>,
    loading: bool,
    renderer: R,
}

impl<R: Renderer> SessionOrchestrator<R> {
    /// Create an orchestrator and seed the greeting message
    pub fn new(
        gateway: ModelGateway,
        prompts: PromptLibrary,
        credential_store: CredentialStore,
        credential: Option<String>,
        renderer: R,
    ) -> Self {
        let mut orchestrator = Self {
            transcript: Transcript::new(),
            queue: AttachmentQueue::new(),
            context: None,
            gateway,
            prompts,
            credential_store,
            credential,
            active_prefix: None,
            loading: false,
            renderer,
        };
        orchestrator.transcript.push_model(prompts::GREETING);
        orchestrator
            .renderer
            .display_transcript(&orchestrator.transcript, false);
        orchestrator
    }

    /// The visible conversation
    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Pending attachments
    pub fn attachments(&self) -> &AttachmentQueue {
        &self.queue
    }

    /// True while a turn is in flight
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// True when a credential is available for sending
    pub fn has_credential(&self) -> bool {
        self.credential.is_some()
    }

    /// True when a remote conversation context exists
    pub fn has_remote_context(&self) -> bool {
        self.context.is_some()
    }

    /// The currently selected model id
    pub fn model(&self) -> &str {
        self.gateway.model()
    }

    /// The prompt library backing prefix selection
    pub fn prompt_library(&self) -> &PromptLibrary {
        &self.prompts
    }

    /// Id of the active prompt prefix, if one is selected
    pub fn active_prefix(&self) -> Option<&str> {
        self.active_prefix.as_deref()
    }

    /// Queue an attachment for the next turn
    ///
    /// # Returns
    ///
    /// `Ok(true)` if queued, `Ok(false)` if skipped as a duplicate.
    ///
    /// # Errors
    ///
    /// Returns a validation error for disallowed file types.
    pub fn attach(&mut self, attachment: Attachment) -> Result<bool> {
        let added = self.queue.add(attachment)?;
        self.renderer.display_transcript(&self.transcript, self.loading);
        Ok(added)
    }

    /// Remove one pending attachment by index
    pub fn remove_attachment(&mut self, index: usize) -> Option<Attachment> {
        let removed = self.queue.remove_at(index);
        if removed.is_some() {
            self.renderer.display_transcript(&self.transcript, self.loading);
        }
        removed
    }

    /// Drop all pending attachments
    pub fn clear_attachments(&mut self) {
        self.queue.clear();
        self.renderer.display_transcript(&self.transcript, self.loading);
    }

    /// Store a new credential and discard the remote conversation context
    ///
    /// The visible transcript is untouched; only the server-side history
    /// is forgotten.
    pub fn set_credential(&mut self, token: String) -> Result<()> {
        self.credential_store.store(&token)?;
        self.credential = Some(token);
        self.context = None;
        tracing::info!("credential updated, remote conversation context discarded");
        Ok(())
    }

    /// Select a different model and discard the remote conversation context
    pub fn set_model(&mut self, model: &str) {
        if model == self.gateway.model() {
            return;
        }
        self.gateway.set_model(model);
        self.context = None;
        tracing::info!(model = %model, "model changed, remote conversation context discarded");
    }

    /// Activate a prompt prefix by id
    ///
    /// # Errors
    ///
    /// Returns a validation error if the id is not in the library.
    pub fn set_active_prefix(&mut self, id: &str) -> Result<()> {
        if self.prompts.get(id).is_none() {
            return Err(DocuchatError::Validation(format!("unknown prompt prefix: {}", id)).into());
        }
        self.active_prefix = Some(id.to_string());
        Ok(())
    }

    /// Deactivate the prompt prefix
    pub fn clear_active_prefix(&mut self) {
        self.active_prefix = None;
    }

    /// Reset the whole session
    ///
    /// Clears the transcript and the attachment queue, discards the
    /// remote conversation context, and re-seeds the greeting.
    pub fn reset_session(&mut self) {
        self.transcript.clear();
        self.queue.clear();
        self.context = None;
        self.transcript.push_model(prompts::GREETING);
        self.renderer.display_transcript(&self.transcript, self.loading);
        tracing::info!("session reset");
    }

    /// Submit one turn: the user's text plus all queued attachments
    ///
    /// Turn-level failures (upload, network, stream) are routed into the
    /// transcript as the turn's model message and the orchestrator
    /// returns to idle with `Ok(())`. The only error returned to the
    /// caller is [`DocuchatError::CredentialRequired`], raised before any
    /// state changes so the caller can prompt for a credential.
    pub async fn submit(&mut self, user_text: &str) -> Result<()> {
        if self.credential.is_none() {
            return Err(DocuchatError::CredentialRequired.into());
        }
        let text = user_text.trim();
        if text.is_empty() && self.queue.is_empty() {
            return Ok(());
        }

        let outgoing = self.compose_outgoing(text);

        // The transcript shows the unprefixed original text; the prefix is
        // an internal augmentation.
        if !text.is_empty() {
            self.transcript.push_user(text);
        }
        self.renderer.display_transcript(&self.transcript, self.loading);

        self.loading = true;
        self.renderer.display_transcript(&self.transcript, true);

        let placeholder = self.transcript.push_model("");
        let had_attachments = !self.queue.is_empty();

        match self.run_turn(placeholder, &outgoing).await {
            Ok(()) => {
                if had_attachments {
                    self.queue.clear();
                }
            }
            Err(err) => {
                tracing::error!("turn failed: {:#}", err);
                if matches!(
                    err.downcast_ref::<DocuchatError>(),
                    Some(DocuchatError::Authentication(_))
                ) {
                    self.invalidate_credential();
                }
                let description = err.to_string();
                if self.transcript.text_of(placeholder).map_or(true, str::is_empty) {
                    self.transcript.append_to(placeholder, &description);
                } else {
                    self.transcript
                        .append_to(placeholder, &format!("\n\n{}", description));
                }
            }
        }

        self.loading = false;
        self.renderer.display_transcript(&self.transcript, false);
        Ok(())
    }

    /// Compose the outgoing text for a turn
    ///
    /// `prefix + blank line + body`, where the body is the typed text or,
    /// when only files were provided, a synthesized analysis request.
    /// With files attached, the document-identification instruction is
    /// appended.
    fn compose_outgoing(&self, user_text: &str) -> String {
        let body = if user_text.is_empty() {
            prompts::file_analysis_request(self.queue.len())
        } else {
            user_text.to_string()
        };
        let mut outgoing = match self.active_prefix_content() {
            Some(prefix) => format!("{}\n\n{}", prefix, body),
            None => body,
        };
        if !self.queue.is_empty() {
            outgoing.push_str(prompts::DOCUMENT_IDENTIFICATION_SUFFIX);
        }
        outgoing
    }

    fn active_prefix_content(&self) -> Option<&str> {
        self.active_prefix
            .as_deref()
            .and_then(|id| self.prompts.get(id))
            .map(|prefix| prefix.content)
    }

    fn invalidate_credential(&mut self) {
        self.credential = None;
        self.context = None;
        self.credential_store.clear();
        tracing::warn!("stored credential invalidated; re-authentication required");
    }

    /// Run the network portion of one turn against the placeholder message
    async fn run_turn(&mut self, placeholder: u64, outgoing: &str) -> Result<()> {
        let Self {
            transcript,
            queue,
            context,
            gateway,
            credential,
            renderer,
            ..
        } = self;
        let Some(key) = credential.as_deref() else {
            return Err(DocuchatError::CredentialRequired.into());
        };
        let context = context.get_or_insert_with(ChatContext::new);

        // Uploads are strictly sequential so file-reference order in the
        // outgoing request matches attachment order.
        let file_count = queue.len();
        let mut stored = Vec::with_capacity(file_count);
        for (index, attachment) in queue.iter().enumerate() {
            tracing::info!(
                file = %attachment.name,
                size = attachment.len(),
                "uploading attachment {}/{}",
                index + 1,
                file_count
            );
            let label = format!("Uploading {}", attachment.name);
            let progress_renderer = &mut *renderer;
            let file = gateway
                .upload(key, attachment, |sent, total| {
                    let percent = if total == 0 {
                        100
                    } else {
                        (sent.saturating_mul(100) / total) as u8
                    };
                    progress_renderer.display_progress(percent, &label);
                })
                .await?;
            stored.push(file);
        }

        let content = build_user_content(outgoing, &stored);
        let mut response_text = String::new();

        {
            // The token count races the response stream inside one task;
            // whichever resolves first is applied first. A counting error
            // never fails the turn.
            let mut stream = gateway.stream_turn(key, &*context, &content).await?;
            let count_tokens = gateway.count_tokens(key, &*context, &content);
            tokio::pin!(count_tokens);
            let mut count_pending = true;

            loop {
                tokio::select! {
                    count = &mut count_tokens, if count_pending => {
                        count_pending = false;
                        match count {
                            Ok(total) => {
                                transcript.set_input_tokens(placeholder, total);
                                renderer.display_transcript(transcript, true);
                            }
                            Err(err) => {
                                tracing::warn!("token count failed, continuing without estimate: {:#}", err);
                            }
                        }
                    }
                    delta = stream.next() => {
                        match delta {
                            Some(Ok(delta)) => {
                                if !delta.text.is_empty() {
                                    transcript.append_to(placeholder, &delta.text);
                                    response_text.push_str(&delta.text);
                                }
                                if let Some(usage) = delta.usage {
                                    transcript.merge_usage(placeholder, usage);
                                }
                                if let Some(reason) = &delta.finish_reason {
                                    if !reason.is_normal() {
                                        let note = format!("\n\n[{}]", reason.describe());
                                        transcript.append_to(placeholder, &note);
                                        response_text.push_str(&note);
                                    }
                                }
                                renderer.display_transcript(transcript, true);
                            }
                            Some(Err(err)) => return Err(err),
                            None => break,
                        }
                    }
                }
            }

            if count_pending {
                match count_tokens.await {
                    Ok(total) => {
                        transcript.set_input_tokens(placeholder, total);
                        renderer.display_transcript(transcript, true);
                    }
                    Err(err) => {
                        tracing::warn!("token count failed, continuing without estimate: {:#}", err);
                    }
                }
            }
        }

        context.record_turn(&content, &response_text);
        Ok(())
    }
}

/// Assemble the turn's content parts: optional text, then one file
/// reference per uploaded attachment in upload order
fn build_user_content(text: &str, files: &[StoredFile]) -> Content {
    let mut parts = Vec::with_capacity(files.len() + 1);
    if !text.is_empty() {
        parts.push(Part::text(text));
    }
    for file in files {
        parts.push(Part::file_ref(file.mime_type.clone(), file.uri.clone()));
    }
    Content::user(parts)
}
