//! Scripted transport and recording observer shared by the fetcher tests

use crate::fetcher::observer::AttemptObserver;
use crate::fetcher::transport::{RawResponse, Transport, TransportError};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use url::Url;

pub(crate) type Scripted = Result<RawResponse, TransportError>;

pub(crate) fn ok(body: &str) -> Scripted {
    Ok(RawResponse::new(200, "http://api.test/offers", body))
}

pub(crate) fn status(code: u16) -> Scripted {
    Ok(RawResponse::new(code, "http://api.test/offers", ""))
}

/// Replays a fixed list of outcomes, one per request
pub(crate) struct ScriptedTransport {
    script: Mutex<VecDeque<Scripted>>,
    requested: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    pub(crate) fn new(script: Vec<Scripted>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            requested: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.requested.lock().unwrap().len()
    }

    pub(crate) fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn get(&self, url: &Url) -> Result<RawResponse, TransportError> {
        self.requested.lock().unwrap().push(url.to_string());
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("unexpected request to {url}"))
    }
}

/// Keeps the status (or `None` for transport errors) of every attempt
#[derive(Default)]
pub(crate) struct RecordingObserver {
    seen: Mutex<Vec<Option<u16>>>,
}

impl RecordingObserver {
    pub(crate) fn statuses(&self) -> Vec<Option<u16>> {
        self.seen.lock().unwrap().clone()
    }
}

impl AttemptObserver for RecordingObserver {
    fn on_response(&self, _attempt: u32, status: u16, _url: &str) {
        self.seen.lock().unwrap().push(Some(status));
    }

    fn on_transport_error(&self, _attempt: u32, _url: &str, _error: &TransportError) {
        self.seen.lock().unwrap().push(None);
    }
}
