//! Concurrent execution of batched clients over one multi-handle.
//!
//! # Design
//! The coordinator is an explicitly owned value rather than process-wide
//! state. Its multi-handle is created on first use and kept across batches
//! until `close()`. During `exec` each client's engine handle is lent to the
//! multi-handle and always handed back, whether the batch succeeds or not.
//!
//! There are no worker threads: the calling thread waits for socket
//! readiness and lets libcurl advance every transfer, until none is active.

use std::fmt;
use std::thread;
use std::time::Duration;

use curl::easy::Easy2;
use curl::multi::{Easy2Handle, Multi};

use crate::capture::Collector;
use crate::client::Client;
use crate::engine::{Engine, Outcome};
use crate::error::Result;

/// Longest single readiness wait before transfers are advanced again.
const WAIT_TIMEOUT: Duration = Duration::from_secs(1);

/// Pause taken when a wait reports no activity, so the loop never spins.
const IDLE_BACKOFF: Duration = Duration::from_millis(1);

#[derive(Default)]
pub struct Coordinator {
    multi: Option<Multi>,
}

impl fmt::Debug for Coordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Coordinator")
            .field("open", &self.multi.is_some())
            .finish()
    }
}

impl Coordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the shared multi-handle currently exists.
    pub fn is_open(&self) -> bool {
        self.multi.is_some()
    }

    /// Drive every client's configured transfer to completion.
    ///
    /// Each client ends with fully captured results; a transport failure on
    /// one client is recorded on that client only. `Err` is returned only
    /// when the multi-handle itself fails or a client is closed, and then
    /// every engine handle is returned to its client untouched.
    pub fn exec(&mut self, clients: &mut [&mut Client]) -> Result<()> {
        let multi = self.multi.get_or_insert_with(Multi::new);
        tracing::debug!(transfers = clients.len(), "executing batch");

        let mut handles = Vec::with_capacity(clients.len());
        for token in 0..clients.len() {
            let attached = clients[token].take_engine().and_then(|engine| {
                let mut easy = engine.into_easy();
                easy.get_mut().begin();
                attach(multi, easy, token)
            });
            match attached {
                Ok(handle) => handles.push(handle),
                Err(err) => {
                    detach_all(multi, handles, clients);
                    return Err(err);
                }
            }
        }

        if let Err(err) = drive(multi) {
            detach_all(multi, handles, clients);
            return Err(err);
        }

        let mut outcomes: Vec<Option<Outcome>> = vec![None; handles.len()];
        multi.messages(|message| {
            if let Ok(token) = message.token() {
                if let Some(result) = handles.get(token).and_then(|h| message.result_for2(h)) {
                    outcomes[token] = Some(Outcome::from_result(result));
                }
            }
        });

        for (token, handle) in handles.into_iter().enumerate() {
            let client = &mut clients[token];
            match multi.remove2(handle) {
                Ok(easy) => client.restore_engine(Engine::from_easy(easy)),
                Err(err) => {
                    tracing::warn!(%err, token, "detaching transfer failed");
                    continue;
                }
            }
            let outcome = outcomes[token].take().unwrap_or_else(|| {
                tracing::warn!(token, "transfer finished without a completion message");
                Outcome::default()
            });
            client.finish(outcome);
        }
        Ok(())
    }

    /// Release the multi-handle. Safe when none was ever created.
    pub fn close(&mut self) {
        self.multi = None;
    }
}

fn attach(multi: &Multi, easy: Easy2<Collector>, token: usize) -> Result<Easy2Handle<Collector>> {
    let mut handle = multi.add2(easy)?;
    handle.set_token(token)?;
    Ok(handle)
}

/// Wait-then-advance until no transfer is running.
fn drive(multi: &Multi) -> Result<()> {
    while multi.perform()? > 0 {
        if multi.wait(&mut [], WAIT_TIMEOUT)? == 0 {
            thread::sleep(IDLE_BACKOFF);
        }
    }
    Ok(())
}

/// Hand every attached engine back to its client after a failed batch.
fn detach_all(multi: &Multi, handles: Vec<Easy2Handle<Collector>>, clients: &mut [&mut Client]) {
    for (token, handle) in handles.into_iter().enumerate() {
        match multi.remove2(handle) {
            Ok(easy) => clients[token].restore_engine(Engine::from_easy(easy)),
            Err(err) => tracing::warn!(%err, token, "detaching transfer failed"),
        }
    }
}
