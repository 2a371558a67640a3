//! Fluent single-transfer client.
//!
//! # Design
//! A `Client` owns one engine handle and a `Request` snapshot. Setters only
//! touch the snapshot; each request resets the handle and derives the full
//! engine option set from the snapshot, so no option leaks from one request
//! into the next. Results are captured onto the client and read back
//! through accessors.
//!
//! Transport failures are not errors: check `error_code()` before trusting
//! `response_code()` or the body.

use std::fs::File;
use std::path::{Path, PathBuf};

use crate::capture::{Progress, Sink};
use crate::config::ClientConfig;
use crate::encode::Payload;
use crate::engine::{Engine, EngineOption, Outcome, TransferInfo};
use crate::error::{Error, Result};
use crate::http::{Body, ContentType, Method, Target};
use crate::request::Request;
use crate::response::{decode_json, Response, ResponseBody, DEFAULT_JSON_DEPTH};
use crate::url::build_url;

/// Whether requests execute immediately or wait for a `Coordinator`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Single,
    Batched,
}

#[derive(Debug)]
pub struct Client {
    engine: Option<Engine>,
    config: ClientConfig,
    mode: Mode,
    /// Nesting bound when JSON decoding is armed.
    json_depth: Option<usize>,
    download: Option<PathBuf>,
    request: Request,
    response: Response,
    outcome: Outcome,
    sent_headers: Vec<String>,
}

impl Client {
    pub fn new() -> Result<Self> {
        Self::with_config(ClientConfig::default())
    }

    /// Acquire an engine handle configured with `config` as its baseline.
    pub fn with_config(config: ClientConfig) -> Result<Self> {
        let engine = Engine::new(&config)?;
        Ok(Self {
            engine: Some(engine),
            config,
            mode: Mode::Single,
            json_depth: None,
            download: None,
            request: Request::default(),
            response: Response::default(),
            outcome: Outcome::default(),
            sent_headers: Vec::new(),
        })
    }

    pub fn get(&mut self, url: impl Into<Target>) -> Result<&mut Self> {
        self.request(url, Method::Get, Body::Empty)
    }

    pub fn post(&mut self, url: impl Into<Target>, data: impl Into<Body>) -> Result<&mut Self> {
        self.request(url, Method::Post, data)
    }

    pub fn put(&mut self, url: impl Into<Target>, data: impl Into<Body>) -> Result<&mut Self> {
        self.request(url, Method::Put, data)
    }

    pub fn patch(&mut self, url: impl Into<Target>, data: impl Into<Body>) -> Result<&mut Self> {
        self.request(url, Method::Patch, data)
    }

    pub fn delete(&mut self, url: impl Into<Target>, data: impl Into<Body>) -> Result<&mut Self> {
        self.request(url, Method::Delete, data)
    }

    pub fn options(&mut self, url: impl Into<Target>, data: impl Into<Body>) -> Result<&mut Self> {
        self.request(url, Method::Options, data)
    }

    /// Configure a request and, unless batched, execute it.
    ///
    /// The verb is normalized first, so `Method::Custom("get")` is a plain
    /// GET. GET ignores `data`. A POST with registered uploads is sent as
    /// multipart form data. Encoding errors are returned before the engine
    /// is touched.
    pub fn request(
        &mut self,
        url: impl Into<Target>,
        method: Method,
        data: impl Into<Body>,
    ) -> Result<&mut Self> {
        let method = Method::parse(method.as_str());
        let url = build_url(&url.into())?;
        let body = data.into();
        let payload = match method {
            Method::Get => Payload::None,
            _ => self.request.payload(&method, &body)?,
        };
        // The snapshot only changes once the engine accepted every option.
        let mut staged = self.request.clone();
        if method == Method::Post && !staged.uploads.is_empty() {
            staged.set_content_type(ContentType::FormData);
        }

        let engine = self.engine.as_mut().ok_or(Error::Closed)?;
        let progress = engine.collector().progress.is_some();
        let options = options_for(&staged, &method, &url, payload, progress)?;
        engine.reset(&self.config)?;
        for option in options {
            engine.set(option)?;
        }

        staged.method = Some(method);
        staged.url = Some(url);
        staged.body = body;
        self.request = staged;
        if self.mode == Mode::Batched {
            tracing::debug!(url = self.request.url.as_deref(), "request deferred to batch");
            return Ok(self);
        }
        self.exec()
    }

    /// Perform the configured transfer and capture its results.
    ///
    /// A batched client has already been driven by its coordinator; only
    /// diagnostics are refreshed.
    pub fn exec(&mut self) -> Result<&mut Self> {
        let engine = self.engine.as_mut().ok_or(Error::Closed)?;
        if self.mode == Mode::Batched {
            self.response.info = engine.info();
            self.response.status = engine.response_code();
            self.sent_headers = engine.sent_headers();
            return Ok(self);
        }
        tracing::debug!(
            method = self.request.method.as_ref().map(Method::as_str),
            url = self.request.url.as_deref(),
            "executing request"
        );
        let outcome = engine.perform();
        self.finish(outcome);
        Ok(self)
    }

    /// Capture everything the engine produced for the last transfer.
    pub(crate) fn finish(&mut self, outcome: Outcome) {
        let Some(engine) = self.engine.as_mut() else {
            return;
        };
        let collector = engine.collector();
        let raw = collector.take_body();
        let headers = std::mem::take(&mut collector.headers);
        collector.release_file();

        let body = match (self.download.take(), self.json_depth) {
            _ if outcome.code != 0 => ResponseBody::Raw(raw.clone()),
            (Some(path), _) => ResponseBody::Saved(path),
            (None, Some(depth)) => match decode_json(&raw, depth) {
                Some(value) => ResponseBody::Json(value),
                None => ResponseBody::Raw(raw.clone()),
            },
            (None, None) => ResponseBody::Raw(raw.clone()),
        };
        self.response = Response {
            body,
            raw,
            status: engine.response_code(),
            headers,
            info: engine.info(),
        };
        self.sent_headers = engine.sent_headers();
        if outcome.code != 0 {
            tracing::debug!(code = outcome.code, message = %outcome.message, "transfer failed");
        }
        self.outcome = outcome;
    }

    /// Stream a GET response into `path`. Returns whether the transfer and
    /// every write succeeded; a batched client defers and returns `false`.
    pub fn download(&mut self, url: impl Into<Target>, path: impl AsRef<Path>) -> Result<bool> {
        let path = path.as_ref();
        let engine = self.engine.as_mut().ok_or(Error::Closed)?;
        engine.collector().sink = Sink::File(File::create(path)?);
        self.download = Some(path.to_path_buf());
        if let Err(err) = self.get(url) {
            self.download = None;
            if let Some(engine) = self.engine.as_mut() {
                engine.collector().release_file();
            }
            return Err(err);
        }
        Ok(self.mode == Mode::Single && self.outcome.code == 0)
    }

    /// Register a file-backed form field for the next POST.
    pub fn add_upload_file(&mut self, field: &str, path: impl Into<PathBuf>) -> &mut Self {
        self.request.add_upload(field, path);
        self
    }

    /// Decode response bodies as JSON.
    pub fn as_json(&mut self) -> &mut Self {
        self.as_json_with_depth(DEFAULT_JSON_DEPTH)
    }

    pub fn as_json_with_depth(&mut self, depth: usize) -> &mut Self {
        self.json_depth = Some(depth);
        self
    }

    /// Keep response bodies raw.
    pub fn as_text(&mut self) -> &mut Self {
        self.json_depth = None;
        self
    }

    /// Defer execution to a `Coordinator` batch.
    pub fn multi(&mut self) -> &mut Self {
        self.mode = Mode::Batched;
        self
    }

    pub fn set_header(&mut self, key: &str, value: impl Into<String>) -> &mut Self {
        self.request.set_header(key, value);
        self
    }

    pub fn set_cookie(&mut self, key: &str, value: impl Into<String>) -> &mut Self {
        self.request.set_cookie(key, value);
        self
    }

    pub fn set_content_type(&mut self, content_type: ContentType) -> &mut Self {
        self.request.set_content_type(content_type);
        self
    }

    pub fn set_content_type_urlencoded(&mut self) -> &mut Self {
        self.set_content_type(ContentType::Urlencoded)
    }

    pub fn set_content_type_form_data(&mut self) -> &mut Self {
        self.set_content_type(ContentType::FormData)
    }

    pub fn set_content_type_json(&mut self) -> &mut Self {
        self.set_content_type(ContentType::Json)
    }

    pub fn set_content_type_xml(&mut self) -> &mut Self {
        self.set_content_type(ContentType::Xml)
    }

    pub fn set_content_type_text(&mut self) -> &mut Self {
        self.set_content_type(ContentType::Text)
    }

    pub fn set_user_agent(&mut self, value: impl Into<String>) -> &mut Self {
        self.request.user_agent = Some(value.into());
        self
    }

    pub fn set_ajax(&mut self) -> &mut Self {
        self.set_header("X-Requested-With", "XMLHttpRequest")
    }

    /// Observe transfer progress; returning `false` aborts the transfer.
    pub fn set_progress_callback<F>(&mut self, callback: F) -> &mut Self
    where
        F: FnMut(Progress) -> bool + Send + 'static,
    {
        if let Some(engine) = self.engine.as_mut() {
            engine.collector().progress = Some(Box::new(callback));
        }
        self
    }

    /// Back to the freshly constructed state on the same engine handle.
    /// A closed client acquires a new handle.
    pub fn reset(&mut self) -> Result<&mut Self> {
        match self.engine.as_mut() {
            Some(engine) => {
                engine.reset(&self.config)?;
                let collector = engine.collector();
                collector.release_file();
                collector.progress = None;
                collector.begin();
            }
            None => self.engine = Some(Engine::new(&self.config)?),
        }
        self.mode = Mode::Single;
        self.json_depth = None;
        self.download = None;
        self.request = Request::default();
        self.response = Response::default();
        self.outcome = Outcome::default();
        self.sent_headers.clear();
        Ok(self)
    }

    /// Release the engine handle and any open download file. Idempotent.
    pub fn close(&mut self) -> &mut Self {
        if let Some(mut engine) = self.engine.take() {
            engine.collector().release_file();
        }
        self
    }

    pub fn is_closed(&self) -> bool {
        self.engine.is_none()
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Engine error code of the last transfer; 0 means no transport failure.
    pub fn error_code(&self) -> i32 {
        self.outcome.code
    }

    pub fn error_message(&self) -> &str {
        &self.outcome.message
    }

    pub fn request_snapshot(&self) -> &Request {
        &self.request
    }

    pub fn request_url(&self) -> Option<&str> {
        self.request.url.as_deref()
    }

    pub fn request_body(&self) -> &Body {
        &self.request.body
    }

    /// Header lines the engine actually sent on the last transfer.
    pub fn sent_headers(&self) -> &[String] {
        &self.sent_headers
    }

    pub fn response(&self) -> &Response {
        &self.response
    }

    pub fn response_body(&self) -> &ResponseBody {
        &self.response.body
    }

    pub fn response_json(&self) -> Option<&serde_json::Value> {
        self.response.json()
    }

    pub fn response_text(&self) -> String {
        self.response.text()
    }

    pub fn response_code(&self) -> u32 {
        self.response.status
    }

    pub fn response_headers(&self) -> &[String] {
        &self.response.headers
    }

    pub fn response_header(&self, name: &str) -> Option<&str> {
        self.response.header(name)
    }

    pub fn response_info(&self) -> &TransferInfo {
        &self.response.info
    }

    pub(crate) fn take_engine(&mut self) -> Result<Engine> {
        self.engine.take().ok_or(Error::Closed)
    }

    pub(crate) fn restore_engine(&mut self, engine: Engine) {
        self.engine = Some(engine);
    }
}

/// The complete engine option set for one request.
fn options_for(
    request: &Request,
    method: &Method,
    url: &str,
    payload: Payload,
    progress: bool,
) -> Result<Vec<EngineOption>> {
    let mut options = vec![EngineOption::Url(url.to_string())];
    match method {
        Method::Get => options.push(EngineOption::HttpGet),
        Method::Post => options.push(EngineOption::Post),
        other => options.push(EngineOption::CustomRequest(other.as_str().to_string())),
    }
    match payload {
        Payload::None if *method == Method::Post => options.push(EngineOption::PostFields(Vec::new())),
        Payload::None => {}
        Payload::Bytes(bytes) => options.push(EngineOption::PostFields(bytes)),
        Payload::Form(parts) => options.push(EngineOption::Form(parts)),
    }
    if !request.headers.is_empty() {
        options.push(EngineOption::Headers(request.header_lines()));
    }
    if let Some(line) = request.cookie_line()? {
        options.push(EngineOption::Cookie(line));
    }
    if let Some(agent) = &request.user_agent {
        options.push(EngineOption::UserAgent(agent.clone()));
    }
    if progress {
        options.push(EngineOption::Progress(true));
    }
    Ok(options)
}
