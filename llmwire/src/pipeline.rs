//! The request pipeline.
//!
//! [`ChatPipeline`] resolves a provider id to its adapter, builds the
//! request, posts it with retries and decodes the answer through the
//! stream-tag machine. Every call owns its own SSE parser, decoder and tag
//! machine; only the client cache is shared.
//!
//! Deltas reach the caller as [`StreamEvent`]s. A dropped connection is
//! resumed in place when the server tagged its events with ids; otherwise
//! the request is replayed from the start and the caller is told to
//! discard what it has with [`StreamEvent::Restart`].

use crate::config::{PipelineConfig, Transport};
use crate::error::{PipelineError, PipelineResult};
use crate::files;
use futures::StreamExt;
use llmwire_core::{
    BuildParams, ChatMessage, FileReference, ProviderConfig, ProviderKind, TokenUsage, ToolCall,
};
use llmwire_models::{lookup, tools, Adapter, AdapterContext, AdapterResult, ClientCache, Completion, Dialect};
use llmwire_retries::{check_response, with_retry, RetryableError};
use llmwire_streaming::{
    ChannelDelta, ErrorAction, SseParser, SseStream, StreamError, TagMachine, TaggedOutput,
};
use reqwest::header::ACCEPT;
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

/// Anthropic API version sent with every Messages request.
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

/// One chat turn to send.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    /// Provider id, e.g. `"openai"` or `"anthropic"`.
    pub provider: String,
    /// Conversation and turn options.
    pub params: BuildParams,
    /// Provider settings.
    pub config: ProviderConfig,
    /// Model override taking precedence over `config.model`.
    pub model: Option<String>,
}

impl ChatRequest {
    /// Create a request.
    pub fn new(provider: impl Into<String>, params: BuildParams, config: ProviderConfig) -> Self {
        Self {
            provider: provider.into(),
            params,
            config,
            model: None,
        }
    }

    /// Override the model.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }
}

/// One message on the stream channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// Text routed to a channel.
    Delta(ChannelDelta),
    /// The connection dropped and the request was sent again from the
    /// start. Every delta received before this event is void.
    Restart {
        /// One-based reconnection attempt.
        attempt: u32,
    },
}

/// Final result of one response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamOutcome {
    /// Answer text.
    pub response: String,
    /// Thinking text.
    pub thinking: String,
    /// Thinking summary.
    pub summary: String,
    /// Last token usage reported.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<TokenUsage>,
    /// Whether a tool call was resolved before the answer.
    pub used_tool: bool,
}

impl StreamOutcome {
    fn new(output: TaggedOutput, used_tool: bool) -> Self {
        Self {
            response: output.response,
            thinking: output.thinking,
            summary: output.summary,
            usage: output.usage,
            used_tool,
        }
    }
}

/// Outcome of the tool-resolution call.
enum ToolResolution {
    /// No tool applies to this turn.
    NotOffered,
    /// The model answered without calling the tool.
    Answered(Completion),
    /// The tool ran and its result was added to the request.
    Called,
}

/// Everything needed to post one resolved request.
struct Target {
    adapter: &'static dyn Adapter,
    request: AdapterResult,
    client: Client,
    api_key: Option<String>,
    files: Vec<FileReference>,
}

/// Sends chat requests and decodes their responses.
#[derive(Debug, Clone, Default)]
pub struct ChatPipeline {
    config: PipelineConfig,
    cache: Arc<ClientCache>,
}

impl ChatPipeline {
    /// Create a pipeline with its own client cache.
    #[must_use]
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            cache: Arc::new(ClientCache::new()),
        }
    }

    /// Share a client cache with other pipelines.
    #[must_use]
    pub fn with_cache(mut self, cache: Arc<ClientCache>) -> Self {
        self.cache = cache;
        self
    }

    /// Pipeline settings.
    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// The client cache.
    #[must_use]
    pub fn cache(&self) -> &Arc<ClientCache> {
        &self.cache
    }

    /// Build the request for a turn without sending it.
    pub fn build(&self, request: &ChatRequest) -> PipelineResult<AdapterResult> {
        let (provider, adapter) = lookup(&request.provider)?;
        Ok(adapter.build(&context(provider, request))?)
    }

    /// Send a turn without streaming and return the decoded answer.
    ///
    /// The extracted text runs through the same tag machine as a stream, so
    /// summary delimiters are removed identically.
    pub async fn complete(&self, request: &ChatRequest) -> PipelineResult<StreamOutcome> {
        let mut target = self.prepare(request)?;
        let (completion, used_tool) = match self.resolve_tools(&mut target).await? {
            ToolResolution::Answered(completion) => (completion, false),
            ToolResolution::Called => (self.fetch_completion(&target).await?, true),
            ToolResolution::NotOffered => (self.fetch_completion(&target).await?, false),
        };

        let mut machine = self.tag_machine();
        for chunk in completion.sentinel_chunks() {
            machine.ingest(&chunk);
        }
        Ok(StreamOutcome::new(machine.finalize(), used_tool))
    }

    /// Stream a turn, forwarding each channel delta in arrival order.
    ///
    /// A read error reconnects with the parser's backoff while attempts
    /// remain. If the server sent event ids, the new request carries
    /// `Last-Event-ID` and decoding continues where it stopped. Otherwise
    /// the tag machine and decoder start over and a [`StreamEvent::Restart`]
    /// precedes the replayed text, so the outcome never holds text from an
    /// abandoned attempt. Cancelling stops reading at once and returns
    /// [`PipelineError::Cancelled`] without a final flush.
    pub async fn stream_chat(
        &self,
        request: &ChatRequest,
        sender: mpsc::Sender<StreamEvent>,
        cancel: CancellationToken,
    ) -> PipelineResult<StreamOutcome> {
        let mut target = self.prepare(request)?;
        let mut machine = self.tag_machine();

        let resolution = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(PipelineError::Cancelled),
            resolution = self.resolve_tools(&mut target) => resolution?,
        };
        let used_tool = match resolution {
            ToolResolution::Answered(completion) => {
                for chunk in completion.sentinel_chunks() {
                    forward(&sender, machine.ingest(&chunk)).await;
                }
                forward(&sender, machine.flush()).await;
                return Ok(StreamOutcome::new(machine.finalize(), false));
            }
            ToolResolution::Called => true,
            ToolResolution::NotOffered => false,
        };

        let body = target.request.to_body(true)?;
        let mut decoder = target.adapter.decoder();
        let mut parser = SseParser::with_config(self.config.sse_config());

        loop {
            let last_event_id = parser.last_event_id().map(str::to_owned);
            let response = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(PipelineError::Cancelled),
                response = self.post(&target, &body, true, last_event_id.as_deref()) => response?,
            };

            let mut events = SseStream::with_parser(response.bytes_stream().boxed(), parser);
            let failure = loop {
                let next = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        debug!(provider = %target.request.provider, "stream cancelled");
                        return Err(PipelineError::Cancelled);
                    }
                    next = events.next() => next,
                };
                match next {
                    Some(Ok(event)) => {
                        for chunk in decoder.decode(&event)? {
                            forward(&sender, machine.ingest(&chunk)).await;
                        }
                    }
                    Some(Err(err)) if err.is_recoverable() => break Some(err),
                    Some(Err(err)) => return Err(err.into()),
                    None => break None,
                }
            };
            parser = events.into_parser();

            let Some(err) = failure else { break };
            match parser.handle_error(&err) {
                ErrorAction::Retry { attempt, delay } => {
                    let resumable = parser.last_event_id().is_some();
                    warn!(
                        provider = %target.request.provider,
                        attempt,
                        resumable,
                        wait_ms = delay.as_millis() as u64,
                        error = %err,
                        "stream interrupted, reconnecting"
                    );
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => return Err(PipelineError::Cancelled),
                        _ = tokio::time::sleep(delay) => {}
                    }
                    parser.prepare_reconnect();
                    if !resumable {
                        machine.reset();
                        decoder = target.adapter.decoder();
                        if sender.send(StreamEvent::Restart { attempt }).await.is_err() {
                            trace!("delta receiver dropped");
                        }
                    }
                }
                ErrorAction::Stop => {
                    return Err(StreamError::RetriesExhausted {
                        attempts: parser.retry_count() + 1,
                        message: err.to_string(),
                    }
                    .into());
                }
            }
        }

        for chunk in decoder.finish() {
            forward(&sender, machine.ingest(&chunk)).await;
        }
        forward(&sender, machine.flush()).await;

        let outcome = StreamOutcome::new(machine.finalize(), used_tool);
        info!(
            provider = %target.request.provider,
            model = %target.request.model,
            response_chars = outcome.response.len(),
            "stream finished"
        );
        Ok(outcome)
    }

    fn tag_machine(&self) -> TagMachine {
        TagMachine::with_summary_limit(self.config.max_summary_chars)
    }

    /// Resolve the adapter, check credentials and build the request.
    ///
    /// Fails before any network traffic.
    fn prepare(&self, request: &ChatRequest) -> PipelineResult<Target> {
        let (provider, adapter) = lookup(&request.provider)?;

        let configured_key = request
            .config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty());
        let api_key = match &self.config.transport {
            Transport::Direct if provider.requires_api_key() => {
                Some(request.config.require_api_key(provider)?.to_string())
            }
            _ => configured_key.map(str::to_string),
        };

        let built = adapter.build(&context(provider, request))?;
        let client = self.cache.get_or_create(provider, &request.config)?;
        debug!(
            provider = %provider,
            model = %built.model,
            dialect = built.dialect().name(),
            "request built"
        );

        Ok(Target {
            adapter,
            request: built,
            client,
            api_key,
            files: request.params.local_files(),
        })
    }

    /// Run the tool-resolution call if this turn offers a tool.
    async fn resolve_tools(&self, target: &mut Target) -> PipelineResult<ToolResolution> {
        let Some(body) = target.request.tool_resolution_body()? else {
            return Ok(ToolResolution::NotOffered);
        };

        debug!(provider = %target.request.provider, "resolving tool call");
        let response = self.post(target, &body, false, None).await?;
        let value: Value = response.json().await?;
        let completion = target.adapter.extract_completion(&value)?;
        if !completion.has_tool_calls() {
            return Ok(ToolResolution::Answered(completion));
        }

        let mut results = Vec::with_capacity(completion.tool_calls.len());
        for call in &completion.tool_calls {
            let output = run_tool(call, &target.files).await;
            results.push(ChatMessage::tool(&call.id, output));
        }
        let assistant = ChatMessage::assistant_tool_calls(completion.tool_calls);
        target.request = target.request.with_tool_exchange(assistant, results)?;
        Ok(ToolResolution::Called)
    }

    async fn fetch_completion(&self, target: &Target) -> PipelineResult<Completion> {
        let body = target.request.to_body(false)?;
        let response = self.post(target, &body, false, None).await?;
        let value: Value = response.json().await?;
        Ok(target.adapter.extract_completion(&value)?)
    }

    /// Post a body with retries, returning the first successful response.
    async fn post(
        &self,
        target: &Target,
        body: &Value,
        stream: bool,
        last_event_id: Option<&str>,
    ) -> PipelineResult<Response> {
        let response = with_retry(&self.config.retry, || {
            let builder = self.request_builder(target, body, stream, last_event_id);
            async move {
                let response = builder.send().await.map_err(RetryableError::from)?;
                check_response(response).await
            }
        })
        .await?;
        Ok(response)
    }

    fn request_builder(
        &self,
        target: &Target,
        body: &Value,
        stream: bool,
        last_event_id: Option<&str>,
    ) -> RequestBuilder {
        let request = &target.request;
        let key = target.api_key.as_deref();

        let mut builder = match &self.config.transport {
            Transport::Direct => {
                let builder = target.client.post(request.url(stream)).json(body);
                match (request.dialect(), key) {
                    (Dialect::Anthropic, key) => {
                        let builder = builder.header("anthropic-version", ANTHROPIC_VERSION);
                        match key {
                            Some(key) => builder.header("x-api-key", key),
                            None => builder,
                        }
                    }
                    (Dialect::Google, Some(key)) => builder.header("x-goog-api-key", key),
                    (_, Some(key)) => builder.bearer_auth(key),
                    (_, None) => builder,
                }
            }
            Transport::Proxy { url } => {
                let envelope = json!({
                    "provider": request.provider.as_str(),
                    "endpoint": request.url(stream),
                    "stream": stream,
                    "body": body,
                });
                let builder = target.client.post(url).json(&envelope);
                match key {
                    Some(key) => builder.bearer_auth(key),
                    None => builder,
                }
            }
        };

        if stream {
            builder = builder.header(ACCEPT, "text/event-stream");
        } else if let Some(timeout) = self.config.request_timeout() {
            builder = builder.timeout(timeout);
        }
        if let Some(id) = last_event_id {
            builder = builder.header("Last-Event-ID", id);
        }
        builder
    }
}

fn context(provider: ProviderKind, request: &ChatRequest) -> AdapterContext<'_> {
    let ctx = AdapterContext::new(provider, &request.params, &request.config);
    match request.model.as_deref() {
        Some(model) => ctx.with_model(model),
        None => ctx,
    }
}

async fn run_tool(call: &ToolCall, files: &[FileReference]) -> String {
    let name = call.function.name.as_str();
    debug!(tool = %name, "running tool");
    if name == tools::READ_FILE_TOOL {
        return files::read_file(&call.function.arguments, files).await;
    }
    tools::execute(name).unwrap_or_else(|| {
        warn!(tool = %name, "model called an unknown tool");
        json!({ "error": format!("unknown tool '{name}'") }).to_string()
    })
}

async fn forward(sender: &mpsc::Sender<StreamEvent>, deltas: Vec<ChannelDelta>) {
    for delta in deltas {
        if sender.send(StreamEvent::Delta(delta)).await.is_err() {
            trace!("delta receiver dropped");
            return;
        }
    }
}
