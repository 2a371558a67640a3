//! Adapter over one libcurl easy handle.
//!
//! # Design
//! Every option the client can set is a variant of `EngineOption`, so the
//! set of engine knobs is closed and typed. The handle carries a
//! `Collector` that captures headers and body for both single and batched
//! execution.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use curl::easy::{Easy2, Form, List};
use serde::Serialize;

use crate::capture::{split_header_trace, Collector};
use crate::config::ClientConfig;
use crate::encode::{FormPart, PartValue};
use crate::error::{Error, Result};

/// A single engine setting.
#[derive(Debug, Clone)]
pub enum EngineOption {
    Url(String),
    HttpGet,
    Post,
    CustomRequest(String),
    PostFields(Vec<u8>),
    Form(Vec<FormPart>),
    Headers(Vec<String>),
    Cookie(String),
    UserAgent(String),
    Timeout(Duration),
    FollowLocation(bool),
    MaxRedirects(u32),
    AutoReferer(bool),
    VerifyPeer(bool),
    VerifyHost(bool),
    Progress(bool),
    /// Feed the outgoing request headers to the collector.
    TraceHeaders(bool),
}

/// Diagnostics read back from the engine after a transfer.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TransferInfo {
    pub effective_url: Option<String>,
    pub response_code: u32,
    pub content_type: Option<String>,
    pub total_time: f64,
    pub namelookup_time: f64,
    pub connect_time: f64,
    pub redirect_count: u32,
    pub primary_ip: Option<String>,
    pub size_download: f64,
}

impl TransferInfo {
    /// The diagnostics as a free-form key/value map.
    pub fn to_map(&self) -> BTreeMap<String, serde_json::Value> {
        match serde_json::to_value(self) {
            Ok(serde_json::Value::Object(map)) => map.into_iter().collect(),
            _ => BTreeMap::new(),
        }
    }
}

/// Transport-level result of one transfer: `code == 0` means no failure.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outcome {
    pub code: i32,
    pub message: String,
}

impl Outcome {
    pub(crate) fn from_result(result: std::result::Result<(), curl::Error>) -> Self {
        match result {
            Ok(()) => Outcome::default(),
            Err(err) => Outcome {
                code: err.code() as i32,
                message: err.extra_description().unwrap_or(err.description()).to_string(),
            },
        }
    }
}

pub struct Engine {
    easy: Easy2<Collector>,
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine").field("collector", self.easy.get_ref()).finish()
    }
}

impl Engine {
    /// Acquire a handle and apply the baseline options.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let mut engine = Engine {
            easy: Easy2::new(Collector::default()),
        };
        engine.apply_baseline(config).map_err(|err| match err {
            Error::Engine(err) => Error::EngineUnavailable(err),
            other => other,
        })?;
        Ok(engine)
    }

    fn apply_baseline(&mut self, config: &ClientConfig) -> Result<()> {
        let mut options = vec![
            EngineOption::TraceHeaders(true),
            EngineOption::Timeout(config.timeout),
            EngineOption::AutoReferer(config.auto_referer),
            EngineOption::FollowLocation(config.follow_redirects),
            EngineOption::MaxRedirects(config.max_redirects),
            EngineOption::VerifyPeer(config.verify_tls),
            EngineOption::VerifyHost(config.verify_tls),
        ];
        if let Some(agent) = &config.user_agent {
            options.push(EngineOption::UserAgent(agent.clone()));
        }
        options.into_iter().try_for_each(|option| self.set(option))
    }

    /// Apply one option to the handle.
    pub fn set(&mut self, option: EngineOption) -> Result<()> {
        let easy = &mut self.easy;
        match option {
            EngineOption::Url(url) => easy.url(&url)?,
            EngineOption::HttpGet => easy.get(true)?,
            EngineOption::Post => easy.post(true)?,
            EngineOption::CustomRequest(verb) => easy.custom_request(&verb)?,
            EngineOption::PostFields(bytes) => easy.post_fields_copy(&bytes)?,
            EngineOption::Form(parts) => {
                let mut form = Form::new();
                for part in &parts {
                    match &part.value {
                        PartValue::Text(text) => form.part(&part.name).contents(text.as_bytes()).add()?,
                        PartValue::File(path) => form.part(&part.name).file(path).add()?,
                    }
                }
                easy.httppost(form)?
            }
            EngineOption::Headers(lines) => {
                let mut list = List::new();
                for line in &lines {
                    list.append(line)?;
                }
                easy.http_headers(list)?
            }
            EngineOption::Cookie(line) => easy.cookie(&line)?,
            EngineOption::UserAgent(agent) => easy.useragent(&agent)?,
            EngineOption::Timeout(timeout) => easy.timeout(timeout)?,
            EngineOption::FollowLocation(on) => easy.follow_location(on)?,
            EngineOption::MaxRedirects(max) => easy.max_redirections(max)?,
            EngineOption::AutoReferer(on) => easy.autoreferer(on)?,
            EngineOption::VerifyPeer(on) => easy.ssl_verify_peer(on)?,
            EngineOption::VerifyHost(on) => easy.ssl_verify_host(on)?,
            EngineOption::Progress(on) => easy.progress(on)?,
            EngineOption::TraceHeaders(on) => easy.verbose(on)?,
        }
        Ok(())
    }

    /// Restore the handle's default option set, then the baseline.
    /// Live connections are kept for reuse.
    pub fn reset(&mut self, config: &ClientConfig) -> Result<()> {
        self.easy.reset();
        self.apply_baseline(config)
    }

    /// Run the transfer to completion on the calling thread.
    pub fn perform(&mut self) -> Outcome {
        self.collector().begin();
        Outcome::from_result(self.easy.perform())
    }

    pub fn collector(&mut self) -> &mut Collector {
        self.easy.get_mut()
    }

    pub fn response_code(&mut self) -> u32 {
        self.easy.response_code().unwrap_or(0)
    }

    /// Request headers the engine actually sent on the last transfer.
    pub fn sent_headers(&self) -> Vec<String> {
        split_header_trace(&self.easy.get_ref().header_trace)
    }

    pub fn info(&mut self) -> TransferInfo {
        let easy = &mut self.easy;
        TransferInfo {
            effective_url: easy.effective_url().ok().flatten().map(str::to_string),
            response_code: easy.response_code().unwrap_or(0),
            content_type: easy.content_type().ok().flatten().map(str::to_string),
            total_time: easy.total_time().map(|d| d.as_secs_f64()).unwrap_or(0.0),
            namelookup_time: easy.namelookup_time().map(|d| d.as_secs_f64()).unwrap_or(0.0),
            connect_time: easy.connect_time().map(|d| d.as_secs_f64()).unwrap_or(0.0),
            redirect_count: easy.redirect_count().unwrap_or(0),
            primary_ip: easy.primary_ip().ok().flatten().map(str::to_string),
            size_download: easy.download_size().unwrap_or(0.0),
        }
    }

    pub(crate) fn into_easy(self) -> Easy2<Collector> {
        self.easy
    }

    pub(crate) fn from_easy(easy: Easy2<Collector>) -> Self {
        Engine { easy }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_success_has_zero_code() {
        let outcome = Outcome::from_result(Ok(()));
        assert_eq!(outcome.code, 0);
        assert!(outcome.message.is_empty());
    }

    #[test]
    fn outcome_failure_keeps_code_and_message() {
        let err = curl::Error::new(7);
        let outcome = Outcome::from_result(Err(err));
        assert_eq!(outcome.code, 7);
        assert!(!outcome.message.is_empty());
    }

    #[test]
    fn info_map_exposes_every_field() {
        let info = TransferInfo {
            response_code: 200,
            effective_url: Some("http://h/get".to_string()),
            ..Default::default()
        };
        let map = info.to_map();
        assert_eq!(map["response_code"], 200);
        assert_eq!(map["effective_url"], "http://h/get");
        assert!(map.contains_key("total_time"));
    }

    #[test]
    fn baseline_applies_and_resets() {
        let config = ClientConfig::default();
        let mut engine = Engine::new(&config).unwrap();
        engine.set(EngineOption::Url("http://127.0.0.1:1/".to_string())).unwrap();
        engine.reset(&config).unwrap();
        assert!(engine.sent_headers().is_empty());
    }
}
