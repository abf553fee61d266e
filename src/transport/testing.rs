//! A scripted [`NetworkHandle`] for driving the state machine without
//! network I/O. Tests preload the response fields and synthesize
//! notifications deterministically.

use crate::base::neterror::TransportError;
use crate::base::readystate::ReadyState;
use crate::http::headers::HeaderEntry;
use crate::http::requestbody::Payload;
use crate::http::responsebody::{ResponseBody, ResponseType};
use crate::transport::handle::NetworkHandle;
use std::time::Duration;

#[derive(Debug, Default)]
pub(crate) struct FakeHandle {
    pub ready_state: ReadyState,
    pub opened_with: Option<(String, String)>,
    pub applied_headers: Vec<HeaderEntry>,
    pub rejected_header_names: Vec<String>,
    pub timeout: Option<Duration>,
    pub with_credentials: bool,
    pub sent_payload: Option<Payload>,
    pub fail_send: bool,
    pub abort_requested: bool,
    pub status: u16,
    pub status_text: String,
    pub header_block: Option<String>,
    pub response_type: ResponseType,
    pub decodes_natively: bool,
    pub native: Option<ResponseBody>,
    pub xml: Option<ResponseBody>,
    pub text: String,
    pub fail_accessors: bool,
}

impl FakeHandle {
    pub fn new() -> Self {
        Self::default()
    }

    fn accessor_guard(&self) -> Result<(), TransportError> {
        if self.fail_accessors {
            Err(TransportError::Network("response store unavailable".into()))
        } else {
            Ok(())
        }
    }
}

impl NetworkHandle for FakeHandle {
    fn ready_state(&self) -> ReadyState {
        self.ready_state
    }

    fn open(&mut self, method: &str, url: &str) {
        self.ready_state = ReadyState::Opened;
        self.opened_with = Some((method.to_string(), url.to_string()));
    }

    fn set_header(&mut self, name: &str, value: &str) -> Result<(), TransportError> {
        if self.rejected_header_names.iter().any(|n| n == name) {
            return Err(TransportError::Network(format!("forbidden header {name}")));
        }
        self.applied_headers.push(HeaderEntry::new(name, value));
        Ok(())
    }

    fn set_timeout(&mut self, timeout: Option<Duration>) {
        self.timeout = timeout;
    }

    fn set_with_credentials(&mut self, with_credentials: bool) {
        self.with_credentials = with_credentials;
    }

    fn send(&mut self, payload: Payload) -> Result<(), TransportError> {
        if self.fail_send {
            return Err(TransportError::Network("connection refused".into()));
        }
        self.ready_state = ReadyState::Loading;
        self.sent_payload = Some(payload);
        Ok(())
    }

    fn abort(&mut self) {
        self.abort_requested = true;
    }

    fn status(&self) -> u16 {
        self.status
    }

    fn status_text(&self) -> String {
        self.status_text.clone()
    }

    fn response_headers(&self) -> Option<String> {
        self.header_block.clone()
    }

    fn response_type(&self) -> ResponseType {
        self.response_type
    }

    fn decodes_natively(&self) -> bool {
        self.decodes_natively
    }

    fn response(&self) -> Result<Option<ResponseBody>, TransportError> {
        self.accessor_guard()?;
        Ok(self.native.clone())
    }

    fn response_xml(&self) -> Result<Option<ResponseBody>, TransportError> {
        self.accessor_guard()?;
        Ok(self.xml.clone())
    }

    fn response_text(&self) -> Result<String, TransportError> {
        self.accessor_guard()?;
        Ok(self.text.clone())
    }
}
