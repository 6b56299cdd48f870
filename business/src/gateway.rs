//! Remote operations behind the kiosk.
//!
//! The flows call the backend through the [`Gateway`] trait so tests can
//! substitute scripted implementations. The production [`HttpGateway`]
//! speaks JSON-over-HTTP via `ehttp`; completions are delivered on
//! whatever thread the transport finishes on, and the flows re-enter
//! through their own locks.

use std::fmt::Debug;

use ustr::Ustr;

use crate::api::{
    FaceCaptureRequest, LenientBody, MessageResponse, RegisterRequest, ScanCardResponse,
    VerifyRequest, VerifyResponse, decode_lenient,
};
use crate::config::BusinessConfig;

/// Transport-level failure of a remote operation.
///
/// Semantic failures (no card, mismatch, closed window) arrive as ordinary
/// responses carrying a message; only a failed exchange is an error. The
/// flows render every transport failure as the literal text `Error`.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{0}")]
pub struct GatewayError(pub String);

pub type ScanDone = Box<dyn FnOnce(Result<ScanCardResponse, GatewayError>) + Send + 'static>;
pub type MessageDone = Box<dyn FnOnce(Result<MessageResponse, GatewayError>) + Send + 'static>;
pub type VerifyDone = Box<dyn FnOnce(Result<VerifyResponse, GatewayError>) + Send + 'static>;

/// The four remote operations the kiosk depends on.
pub trait Gateway: Send + Sync + Debug {
    fn scan_card(&self, on_done: ScanDone);
    fn capture_and_register_face(&self, request: FaceCaptureRequest, on_done: MessageDone);
    fn register_identity(&self, request: RegisterRequest, on_done: MessageDone);
    fn verify_card_and_face(&self, request: VerifyRequest, on_done: VerifyDone);
}

/// Production gateway posting JSON to the backend.
#[derive(Debug)]
pub struct HttpGateway {
    base: Ustr,
}

impl HttpGateway {
    pub fn new(config: &BusinessConfig) -> Self {
        Self {
            base: config.api_url(),
        }
    }

    /// POSTs `body` to `path` and decodes the response leniently.
    ///
    /// The backend uses 4xx statuses with meaningful message bodies, so
    /// every completed exchange is surfaced as a response regardless of
    /// status; only transport failures become errors.
    fn post<T>(
        &self,
        path: &str,
        body: Vec<u8>,
        on_done: Box<dyn FnOnce(Result<T, GatewayError>) + Send + 'static>,
    ) where
        T: serde::de::DeserializeOwned + LenientBody + 'static,
    {
        let url = format!("{}{path}", self.base);
        let mut request = ehttp::Request::post(&url, body);
        request.headers.insert("Content-Type", "application/json");

        ehttp::fetch(request, move |result| match result {
            Ok(response) => on_done(Ok(decode_lenient(&response.bytes))),
            Err(err) => {
                log::error!("HttpGateway: {url} failed: {err}");
                on_done(Err(GatewayError(err)));
            }
        });
    }

    fn post_json<B, T>(
        &self,
        path: &str,
        payload: &B,
        on_done: Box<dyn FnOnce(Result<T, GatewayError>) + Send + 'static>,
    ) where
        B: serde::Serialize,
        T: serde::de::DeserializeOwned + LenientBody + 'static,
    {
        match serde_json::to_vec(payload) {
            Ok(body) => self.post(path, body, on_done),
            Err(err) => {
                log::error!("HttpGateway: failed to serialize request for {path}: {err}");
                on_done(Err(GatewayError(format!("serialize: {err}"))));
            }
        }
    }
}

impl Gateway for HttpGateway {
    fn scan_card(&self, on_done: ScanDone) {
        self.post("/scan_rfid", b"{}".to_vec(), on_done);
    }

    fn capture_and_register_face(&self, request: FaceCaptureRequest, on_done: MessageDone) {
        self.post_json("/capture_face", &request, on_done);
    }

    fn register_identity(&self, request: RegisterRequest, on_done: MessageDone) {
        self.post_json("/register_student", &request, on_done);
    }

    fn verify_card_and_face(&self, request: VerifyRequest, on_done: VerifyDone) {
        self.post_json("/verify_both", &request, on_done);
    }
}
