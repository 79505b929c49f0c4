//! Scripted transport for unit tests.

use crate::transport::{HttpMethod, HttpResponse, Transport, TransportError};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use zabbix_rpc_core::Request;

#[derive(Debug, Clone)]
enum Scripted {
    Reply(HttpResponse),
    Fail(String),
}

/// One request as it reached the transport.
#[derive(Debug, Clone)]
pub(crate) struct Sent {
    pub method: HttpMethod,
    pub url: String,
    pub body: String,
    pub content_type: String,
}

/// Answers per RPC method from a queue. Once a method's queue runs dry its
/// last answer repeats.
#[derive(Debug, Default)]
pub(crate) struct ScriptedTransport {
    script: Mutex<HashMap<String, VecDeque<Scripted>>>,
    last: Mutex<HashMap<String, Scripted>>,
    sent: Mutex<Vec<Sent>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, method: &str, scripted: Scripted) {
        self.script
            .lock()
            .unwrap()
            .entry(method.to_string())
            .or_default()
            .push_back(scripted);
    }

    pub fn reply(&self, method: &str, body: &str) {
        self.reply_with_status(method, 200, body);
    }

    pub fn reply_with_status(&self, method: &str, status: u16, body: &str) {
        self.push(method, Scripted::Reply(HttpResponse::new(status, body)));
    }

    pub fn fail(&self, method: &str, message: &str) {
        self.push(method, Scripted::Fail(message.to_string()));
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    /// Every request body, parsed back into an envelope.
    pub fn requests(&self) -> Vec<Request> {
        self.sent()
            .iter()
            .map(|sent| serde_json::from_str(&sent.body).unwrap())
            .collect()
    }

    /// How many requests were sent for `method`.
    pub fn count(&self, method: &str) -> usize {
        self.requests().iter().filter(|r| r.method == method).count()
    }

    fn next(&self, method: &str) -> Option<Scripted> {
        let queued = self
            .script
            .lock()
            .unwrap()
            .get_mut(method)
            .and_then(VecDeque::pop_front);
        let mut last = self.last.lock().unwrap();
        match queued {
            Some(scripted) => {
                last.insert(method.to_string(), scripted.clone());
                Some(scripted)
            }
            None => last.get(method).cloned(),
        }
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(
        &self,
        method: HttpMethod,
        url: &str,
        body: &str,
        content_type: &str,
    ) -> Result<HttpResponse, TransportError> {
        self.sent.lock().unwrap().push(Sent {
            method,
            url: url.to_string(),
            body: body.to_string(),
            content_type: content_type.to_string(),
        });

        let request: Request = serde_json::from_str(body)
            .map_err(|e| TransportError::Other(format!("unparseable request: {e}")))?;
        match self.next(&request.method) {
            Some(Scripted::Reply(response)) => Ok(response),
            Some(Scripted::Fail(message)) => Err(TransportError::Other(message)),
            None => Err(TransportError::Other(format!(
                "no reply scripted for {}",
                request.method
            ))),
        }
    }
}
