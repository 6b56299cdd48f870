//! UI-free interaction core for the Rollcall kiosk.
//!
//! Two flows drive the kiosk: enrolling a new student (form, card scan,
//! face capture, submit) and recording attendance for a known one (card
//! scan, joint card+face verification). Both are modelled as an explicit
//! phase enum plus a pure transition function, driven by a thin executor
//! that talks to the backend through the [`Gateway`] trait and to the
//! camera through [`VideoFeed`]. Nothing in this crate depends on a UI
//! toolkit, so the gating rules are testable head-less.

pub mod api;
pub mod attendance;
pub mod capture;
pub mod config;
pub mod enroll;
pub mod gateway;
#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use api::{
    FACE_CAPTURED, FaceCaptureRequest, MARKED_PRESENT, MessageResponse, RegisterRequest,
    ScanCardResponse, VerifyRequest, VerifyResponse,
};
pub use attendance::{AttendFlow, AttendPhase};
pub use capture::{CaptureArtifact, CaptureError, Frame, FrameSource, VideoFeed};
pub use config::BusinessConfig;
pub use enroll::{EnrollFlow, EnrollForm, EnrollPhase, FieldErrors};
pub use gateway::{Gateway, GatewayError, HttpGateway};
