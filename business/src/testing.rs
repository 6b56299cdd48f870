//! Test doubles for the gateway and the video source.
//!
//! Compiled for this crate's own tests and, behind the `test-utils`
//! feature, for downstream crates' tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tokio::runtime::Handle;

use crate::api::{
    FaceCaptureRequest, MessageResponse, RegisterRequest, ScanCardResponse, VerifyResponse,
};
use crate::capture::{Frame, FrameSource};
use crate::gateway::{Gateway, GatewayError, MessageDone, ScanDone, VerifyDone};

type Script<T> = Mutex<VecDeque<Result<T, GatewayError>>>;

fn pop<T>(script: &Script<T>) -> Result<T, GatewayError> {
    script
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .pop_front()
        .expect("scripted gateway ran out of responses")
}

fn push<T>(script: &Script<T>, response: Result<T, GatewayError>) {
    script
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .push_back(response);
}

/// Records how many calls of each kind were issued.
#[derive(Debug, Default)]
pub struct CallCounts {
    pub scan: AtomicUsize,
    pub capture: AtomicUsize,
    pub register: AtomicUsize,
    pub verify: AtomicUsize,
}

/// Gateway that answers each operation from a scripted queue,
/// synchronously on the calling thread.
#[derive(Debug, Default)]
pub struct ScriptedGateway {
    pub calls: CallCounts,
    scan: Script<ScanCardResponse>,
    capture: Script<MessageResponse>,
    register: Script<MessageResponse>,
    verify: Script<VerifyResponse>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_scan(&self, response: Result<ScanCardResponse, GatewayError>) {
        push(&self.scan, response);
    }

    pub fn push_capture(&self, response: Result<MessageResponse, GatewayError>) {
        push(&self.capture, response);
    }

    pub fn push_register(&self, response: Result<MessageResponse, GatewayError>) {
        push(&self.register, response);
    }

    pub fn push_verify(&self, response: Result<VerifyResponse, GatewayError>) {
        push(&self.verify, response);
    }

    /// Scripts a successful scan of `rfid`.
    pub fn push_card(&self, rfid: &str) {
        self.push_scan(Ok(ScanCardResponse {
            rfid: Some(rfid.to_owned()),
            message: format!("RFID (demo): {rfid}"),
        }));
    }
}

impl Gateway for ScriptedGateway {
    fn scan_card(&self, on_done: ScanDone) {
        self.calls.scan.fetch_add(1, Ordering::SeqCst);
        on_done(pop(&self.scan));
    }

    fn capture_and_register_face(&self, _request: FaceCaptureRequest, on_done: MessageDone) {
        self.calls.capture.fetch_add(1, Ordering::SeqCst);
        on_done(pop(&self.capture));
    }

    fn register_identity(&self, _request: RegisterRequest, on_done: MessageDone) {
        self.calls.register.fetch_add(1, Ordering::SeqCst);
        on_done(pop(&self.register));
    }

    fn verify_card_and_face(&self, _request: VerifyRequest, on_done: VerifyDone) {
        self.calls.verify.fetch_add(1, Ordering::SeqCst);
        on_done(pop(&self.verify));
    }
}

/// Gateway that never answers. The flows stay in their in-flight phase,
/// which is exactly what single-flight tests need to observe.
#[derive(Debug, Default)]
pub struct PendingGateway {
    pub calls: CallCounts,
}

impl Gateway for PendingGateway {
    fn scan_card(&self, _on_done: ScanDone) {
        self.calls.scan.fetch_add(1, Ordering::SeqCst);
    }

    fn capture_and_register_face(&self, _request: FaceCaptureRequest, _on_done: MessageDone) {
        self.calls.capture.fetch_add(1, Ordering::SeqCst);
    }

    fn register_identity(&self, _request: RegisterRequest, _on_done: MessageDone) {
        self.calls.register.fetch_add(1, Ordering::SeqCst);
    }

    fn verify_card_and_face(&self, _request: VerifyRequest, _on_done: VerifyDone) {
        self.calls.verify.fetch_add(1, Ordering::SeqCst);
    }
}

/// Gateway that answers from a script after a fixed (virtual-clock
/// friendly) delay on the runtime it was created on.
#[derive(Debug)]
pub struct DelayedGateway {
    pub script: ScriptedGateway,
    delay: Duration,
    rt: Handle,
}

impl DelayedGateway {
    /// Captures the current tokio runtime; call from inside a runtime.
    pub fn new(delay: Duration) -> Self {
        Self {
            script: ScriptedGateway::new(),
            delay,
            rt: Handle::current(),
        }
    }

    fn answer<T: Send + 'static>(
        &self,
        response: Result<T, GatewayError>,
        on_done: Box<dyn FnOnce(Result<T, GatewayError>) + Send + 'static>,
    ) {
        let delay = self.delay;
        self.rt.spawn(async move {
            tokio::time::sleep(delay).await;
            on_done(response);
        });
    }
}

impl Gateway for DelayedGateway {
    fn scan_card(&self, on_done: ScanDone) {
        self.script.calls.scan.fetch_add(1, Ordering::SeqCst);
        self.answer(pop(&self.script.scan), on_done);
    }

    fn capture_and_register_face(&self, _request: FaceCaptureRequest, on_done: MessageDone) {
        self.script.calls.capture.fetch_add(1, Ordering::SeqCst);
        self.answer(pop(&self.script.capture), on_done);
    }

    fn register_identity(&self, _request: RegisterRequest, on_done: MessageDone) {
        self.script.calls.register.fetch_add(1, Ordering::SeqCst);
        self.answer(pop(&self.script.register), on_done);
    }

    fn verify_card_and_face(&self, _request: VerifyRequest, on_done: VerifyDone) {
        self.script.calls.verify.fetch_add(1, Ordering::SeqCst);
        self.answer(pop(&self.script.verify), on_done);
    }
}

/// Frame source returning a constant synthetic frame, or nothing at all.
#[derive(Debug, Clone)]
pub struct TestFrames {
    frame: Option<Frame>,
}

impl TestFrames {
    /// A streaming source producing a small gray frame.
    pub fn streaming() -> Self {
        Self {
            frame: Some(Frame {
                width: 8,
                height: 6,
                rgb: vec![96; 8 * 6 * 3],
            }),
        }
    }

    /// A source that is not delivering frames.
    pub fn offline() -> Self {
        Self { frame: None }
    }
}

impl FrameSource for TestFrames {
    fn latest_frame(&self) -> Option<Frame> {
        self.frame.clone()
    }
}
