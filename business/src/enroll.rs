//! Enrollment flow: validate the identity form, read a card, capture a
//! face, submit the registration, then reset.
//!
//! The flow is a phase enum plus a pure [`transition`] function returning
//! the next phase and a list of side effects; [`EnrollFlow`] executes the
//! effects against the gateway, the video feed, and the status lines.
//! Remote completions and timers feed back in as events, so every gating
//! rule lives in one place and is testable without a UI.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use rollcall_states::{CancelHandle, Countdown, StatusLine, run_after};
use tokio::runtime::Handle;

use crate::api::{self, FaceCaptureRequest, RegisterRequest};
use crate::capture::VideoFeed;
use crate::gateway::Gateway;

/// Seconds shown by the card-scan countdown.
pub const SCAN_COUNTDOWN_SECS: u32 = 10;

/// Delay before a successful registration clears the whole form.
pub const RESET_DELAY: Duration = Duration::from_secs(5);

/// Editable identity fields.
///
/// Validity is computed from the trimmed values; the scan step only opens
/// up once all three fields pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnrollForm {
    pub roll: String,
    pub name: String,
    pub email: String,
}

impl EnrollForm {
    pub fn roll_error(&self) -> Option<&'static str> {
        let roll = self.roll.trim();
        if roll.is_empty() {
            Some("Roll number is required")
        } else if !roll.bytes().all(|b| b.is_ascii_digit()) {
            Some("Roll number must be digits")
        } else {
            None
        }
    }

    pub fn name_error(&self) -> Option<&'static str> {
        if self.name.trim().is_empty() {
            Some("Name is required")
        } else {
            None
        }
    }

    /// Distinguishes a missing address from a malformed one.
    pub fn email_error(&self) -> Option<&'static str> {
        let email = self.email.trim();
        if email.is_empty() {
            Some("Email is required")
        } else if !is_valid_email(email) {
            Some("Enter a valid email address")
        } else {
            None
        }
    }

    pub fn is_valid(&self) -> bool {
        self.roll_error().is_none() && self.name_error().is_none() && self.email_error().is_none()
    }
}

fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.chars().any(char::is_whitespace)
        && !domain.contains('@')
}

/// Inline error text per field, shown only once the user touched the
/// field. A freshly loaded (or freshly reset) form shows no errors even
/// though its empty fields are invalid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FieldErrors {
    pub roll: Option<&'static str>,
    pub name: Option<&'static str>,
    pub email: Option<&'static str>,
}

/// Where the enrollment flow currently stands.
///
/// Form validity is data next to the phase: it gates the scan control but
/// does not move the phase by itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum EnrollPhase {
    /// No card read yet.
    #[default]
    Idle,
    /// A card-scan call is outstanding.
    Scanning,
    /// A card was read; face capture is available.
    Scanned { rfid: String },
    /// A face-capture call is outstanding.
    Capturing { rfid: String },
    /// The backend stored a face; submission is available.
    Confirmed { rfid: String },
    /// The final registration call is outstanding.
    Submitting { rfid: String },
}

impl EnrollPhase {
    /// Session token currently held, if any.
    pub fn token(&self) -> Option<&str> {
        match self {
            Self::Idle | Self::Scanning => None,
            Self::Scanned { rfid }
            | Self::Capturing { rfid }
            | Self::Confirmed { rfid }
            | Self::Submitting { rfid } => Some(rfid),
        }
    }

    /// True while one of the three remote calls is outstanding.
    pub fn in_flight(&self) -> bool {
        matches!(
            self,
            Self::Scanning | Self::Capturing { .. } | Self::Submitting { .. }
        )
    }

    pub fn face_confirmed(&self) -> bool {
        matches!(self, Self::Confirmed { .. } | Self::Submitting { .. })
    }
}

/// Inputs to [`transition`]: user actions, remote completions, timers.
#[derive(Debug)]
pub enum EnrollEvent {
    ScanPressed,
    ScanResolved { token: Option<String>, message: String },
    ScanErrored,
    CapturePressed,
    CaptureResolved { message: String },
    CaptureErrored,
    SubmitPressed,
    SubmitResolved { message: String },
    SubmitErrored,
    /// The delayed post-registration reset came due. Stale generations are
    /// ignored so a reset never wipes a flow the user already restarted.
    ResetDue { generation: u64 },
}

/// Side effects the executor performs after a transition.
#[derive(Debug, PartialEq, Eq)]
pub enum EnrollEffect {
    StartCountdown,
    StopCountdown,
    CallScanCard,
    SetScanStatus(String),
    ShowVideo,
    HideVideo,
    /// Snapshot the feed and send the face-capture request.
    CaptureAndSend { rfid: String },
    SetFaceStatus(String),
    SubmitRegistration { rfid: String },
    SetResult(String),
    ScheduleReset,
    /// Clear the form, the errors, every status line, and the token.
    ClearAll,
}

/// Computes the next phase and effects for `event`.
///
/// Events that do not apply to the current phase (stale completions,
/// presses on gated-off controls) leave the phase untouched and produce no
/// effects.
pub fn transition(
    phase: EnrollPhase,
    form_valid: bool,
    generation: u64,
    event: EnrollEvent,
) -> (EnrollPhase, Vec<EnrollEffect>) {
    use EnrollEffect as Fx;
    use EnrollEvent as Ev;
    use EnrollPhase as Ph;

    match (phase, event) {
        (phase, Ev::ScanPressed) if form_valid && !phase.in_flight() => {
            // Any previously held card is dropped here: the fresh scan
            // replaces it, and the capture step stays locked until the new
            // card arrives.
            (Ph::Scanning, vec![Fx::StartCountdown, Fx::CallScanCard])
        }
        (Ph::Scanning, Ev::ScanResolved { token, message }) => match token {
            Some(rfid) => (
                Ph::Scanned { rfid },
                vec![Fx::StopCountdown, Fx::SetScanStatus(message)],
            ),
            None => (
                Ph::Idle,
                vec![Fx::StopCountdown, Fx::SetScanStatus(message)],
            ),
        },
        (Ph::Scanning, Ev::ScanErrored) => (
            Ph::Idle,
            vec![
                Fx::StopCountdown,
                Fx::SetScanStatus("Error".to_owned()),
            ],
        ),
        (Ph::Scanned { rfid } | Ph::Confirmed { rfid }, Ev::CapturePressed) => (
            Ph::Capturing { rfid: rfid.clone() },
            vec![Fx::ShowVideo, Fx::CaptureAndSend { rfid }],
        ),
        (Ph::Capturing { rfid }, Ev::CaptureResolved { message }) => {
            let confirmed = message == api::FACE_CAPTURED;
            let effects = vec![Fx::SetFaceStatus(message), Fx::HideVideo];
            if confirmed {
                (Ph::Confirmed { rfid }, effects)
            } else {
                (Ph::Scanned { rfid }, effects)
            }
        }
        (Ph::Capturing { rfid }, Ev::CaptureErrored) => (
            Ph::Scanned { rfid },
            vec![Fx::SetFaceStatus("Error".to_owned()), Fx::HideVideo],
        ),
        (Ph::Confirmed { rfid }, Ev::SubmitPressed) => (
            Ph::Submitting { rfid: rfid.clone() },
            vec![Fx::SubmitRegistration { rfid }],
        ),
        (Ph::Submitting { rfid }, Ev::SubmitResolved { message }) => (
            // The flow stays interactable during the reset window; the
            // delayed reset then returns everything to Idle.
            Ph::Confirmed { rfid },
            vec![Fx::SetResult(message), Fx::ScheduleReset],
        ),
        (Ph::Submitting { rfid }, Ev::SubmitErrored) => (
            // No reset on failure: the user keeps the filled form and the
            // confirmed face, and may retry the submission.
            Ph::Confirmed { rfid },
            vec![Fx::SetResult("Error".to_owned())],
        ),
        (_, Ev::ResetDue { generation: due }) if due == generation => {
            (Ph::Idle, vec![Fx::ClearAll])
        }
        (phase, event) => {
            log::debug!("EnrollFlow: ignoring {event:?} in phase {phase:?}");
            (phase, vec![])
        }
    }
}

#[derive(Debug, Default)]
struct EnrollInner {
    phase: EnrollPhase,
    form: EnrollForm,
    errors: FieldErrors,
    /// Bumped whenever the user re-engages; pending resets compare against
    /// it and go stale.
    generation: u64,
    countdown: Option<CancelHandle>,
}

/// Drives the enrollment flow. Cheap to clone; clones share all state.
#[derive(Debug, Clone)]
pub struct EnrollFlow {
    inner: Arc<Mutex<EnrollInner>>,
    gateway: Arc<dyn Gateway>,
    video: VideoFeed,
    rt: Handle,
    /// Line under the scan control (countdown, card id, scan errors).
    pub scan_status: StatusLine,
    /// Line under the capture control.
    pub face_status: StatusLine,
    /// Terminal registration result.
    pub result: StatusLine,
}

impl EnrollFlow {
    pub fn new(gateway: Arc<dyn Gateway>, video: VideoFeed, rt: Handle) -> Self {
        Self {
            inner: Arc::new(Mutex::new(EnrollInner::default())),
            gateway,
            video,
            rt,
            scan_status: StatusLine::new(),
            face_status: StatusLine::new(),
            result: StatusLine::new(),
        }
    }

    // ── Form editing ────────────────────────────────────────────────────

    pub fn set_roll(&self, value: impl Into<String>) {
        let mut inner = self.lock();
        inner.form.roll = value.into();
        inner.errors.roll = inner.form.roll_error();
    }

    pub fn set_name(&self, value: impl Into<String>) {
        let mut inner = self.lock();
        inner.form.name = value.into();
        inner.errors.name = inner.form.name_error();
    }

    pub fn set_email(&self, value: impl Into<String>) {
        let mut inner = self.lock();
        inner.form.email = value.into();
        inner.errors.email = inner.form.email_error();
    }

    pub fn form(&self) -> EnrollForm {
        self.lock().form.clone()
    }

    pub fn field_errors(&self) -> FieldErrors {
        self.lock().errors
    }

    pub fn phase(&self) -> EnrollPhase {
        self.lock().phase.clone()
    }

    // ── Gating ──────────────────────────────────────────────────────────

    pub fn can_scan(&self) -> bool {
        let inner = self.lock();
        inner.form.is_valid() && !inner.phase.in_flight()
    }

    pub fn can_capture(&self) -> bool {
        let inner = self.lock();
        inner.phase.token().is_some() && !inner.phase.in_flight()
    }

    pub fn can_submit(&self) -> bool {
        matches!(self.lock().phase, EnrollPhase::Confirmed { .. })
    }

    // ── User actions ────────────────────────────────────────────────────

    pub fn scan(&self) {
        self.apply(EnrollEvent::ScanPressed);
    }

    pub fn capture(&self) {
        self.apply(EnrollEvent::CapturePressed);
    }

    pub fn submit(&self) {
        self.apply(EnrollEvent::SubmitPressed);
    }

    // ── Event loop ──────────────────────────────────────────────────────

    fn apply(&self, event: EnrollEvent) {
        let is_press = matches!(
            event,
            EnrollEvent::ScanPressed | EnrollEvent::CapturePressed | EnrollEvent::SubmitPressed
        );
        let effects = {
            let mut inner = self.lock();
            let (next, effects) = transition(
                inner.phase.clone(),
                inner.form.is_valid(),
                inner.generation,
                event,
            );
            if is_press && next != inner.phase {
                inner.generation += 1;
            }
            inner.phase = next;
            effects
        };
        // Effects run outside the lock: a gateway that completes
        // synchronously re-enters apply() without deadlocking.
        self.run_effects(effects);
    }

    fn run_effects(&self, effects: Vec<EnrollEffect>) {
        for effect in effects {
            match effect {
                EnrollEffect::StartCountdown => {
                    let handle = Countdown::start(
                        &self.rt,
                        SCAN_COUNTDOWN_SECS,
                        &self.scan_status,
                        api::waiting_for_card,
                    );
                    if let Some(previous) = self.lock().countdown.replace(handle) {
                        previous.cancel();
                    }
                }
                EnrollEffect::StopCountdown => {
                    if let Some(handle) = self.lock().countdown.take() {
                        handle.cancel();
                    }
                }
                EnrollEffect::CallScanCard => {
                    let flow = self.clone();
                    self.gateway.scan_card(Box::new(move |result| match result {
                        Ok(response) => {
                            let token = response.token().map(str::to_owned);
                            flow.apply(EnrollEvent::ScanResolved {
                                token,
                                message: response.message,
                            });
                        }
                        Err(err) => {
                            log::error!("EnrollFlow: card scan failed: {err}");
                            flow.apply(EnrollEvent::ScanErrored);
                        }
                    }));
                }
                EnrollEffect::SetScanStatus(text) => {
                    self.scan_status.set(text);
                }
                EnrollEffect::ShowVideo => self.video.show(),
                EnrollEffect::HideVideo => self.video.hide(),
                EnrollEffect::CaptureAndSend { rfid } => match self.video.snapshot() {
                    Ok(artifact) => {
                        let flow = self.clone();
                        self.gateway.capture_and_register_face(
                            FaceCaptureRequest {
                                rfid,
                                image: artifact.into_data_uri(),
                            },
                            Box::new(move |result| match result {
                                Ok(response) => flow.apply(EnrollEvent::CaptureResolved {
                                    message: response.message,
                                }),
                                Err(err) => {
                                    log::error!("EnrollFlow: face capture failed: {err}");
                                    flow.apply(EnrollEvent::CaptureErrored);
                                }
                            }),
                        );
                    }
                    Err(err) => {
                        log::warn!("EnrollFlow: snapshot failed: {err}");
                        self.apply(EnrollEvent::CaptureResolved {
                            message: err.to_string(),
                        });
                    }
                },
                EnrollEffect::SetFaceStatus(text) => {
                    self.face_status.set(text);
                }
                EnrollEffect::SubmitRegistration { rfid } => {
                    let form = self.lock().form.clone();
                    let request = RegisterRequest {
                        rfid,
                        roll: form.roll.trim().to_owned(),
                        name: form.name.trim().to_owned(),
                        email: form.email.trim().to_owned(),
                    };
                    let flow = self.clone();
                    self.gateway.register_identity(
                        request,
                        Box::new(move |result| match result {
                            Ok(response) => flow.apply(EnrollEvent::SubmitResolved {
                                message: response.message,
                            }),
                            Err(err) => {
                                log::error!("EnrollFlow: registration failed: {err}");
                                flow.apply(EnrollEvent::SubmitErrored);
                            }
                        }),
                    );
                }
                EnrollEffect::SetResult(text) => {
                    self.result.set(text);
                }
                EnrollEffect::ScheduleReset => {
                    let generation = self.lock().generation;
                    let flow = self.clone();
                    run_after(&self.rt, RESET_DELAY, move || {
                        flow.apply(EnrollEvent::ResetDue { generation });
                    });
                }
                EnrollEffect::ClearAll => {
                    {
                        let mut inner = self.lock();
                        inner.form = EnrollForm::default();
                        inner.errors = FieldErrors::default();
                        inner.generation += 1;
                    }
                    self.scan_status.clear();
                    self.face_status.clear();
                    self.result.clear();
                    log::info!("EnrollFlow: reset to a fresh form");
                }
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, EnrollInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod form {
        use super::*;

        fn filled() -> EnrollForm {
            EnrollForm {
                roll: "21".to_owned(),
                name: "Asha".to_owned(),
                email: "a@x.com".to_owned(),
            }
        }

        #[test]
        fn complete_form_is_valid() {
            assert!(filled().is_valid());
        }

        #[test]
        fn empty_fields_have_required_messages() {
            let form = EnrollForm::default();
            assert_eq!(form.roll_error(), Some("Roll number is required"));
            assert_eq!(form.name_error(), Some("Name is required"));
            assert_eq!(form.email_error(), Some("Email is required"));
            assert!(!form.is_valid());
        }

        #[test]
        fn malformed_email_gets_the_specialized_message() {
            let mut form = filled();
            form.email = "not-an-address".to_owned();
            assert_eq!(form.email_error(), Some("Enter a valid email address"));
            form.email = "a@nodot".to_owned();
            assert_eq!(form.email_error(), Some("Enter a valid email address"));
            form.email = "a b@x.com".to_owned();
            assert_eq!(form.email_error(), Some("Enter a valid email address"));
        }

        #[test]
        fn non_numeric_roll_is_invalid() {
            let mut form = filled();
            form.roll = "21a".to_owned();
            assert_eq!(form.roll_error(), Some("Roll number must be digits"));
            assert!(!form.is_valid());
        }

        #[test]
        fn whitespace_only_fields_are_invalid() {
            let form = EnrollForm {
                roll: "  ".to_owned(),
                name: " ".to_owned(),
                email: " ".to_owned(),
            };
            assert!(!form.is_valid());
        }
    }

    mod transitions {
        use super::*;
        use EnrollEffect as Fx;
        use EnrollEvent as Ev;
        use EnrollPhase as Ph;

        fn scanned() -> Ph {
            Ph::Scanned {
                rfid: "e3b4a936".to_owned(),
            }
        }

        #[test]
        fn scan_press_needs_a_valid_form() {
            let (next, effects) = transition(Ph::Idle, false, 0, Ev::ScanPressed);
            assert_eq!(next, Ph::Idle);
            assert!(effects.is_empty());

            let (next, effects) = transition(Ph::Idle, true, 0, Ev::ScanPressed);
            assert_eq!(next, Ph::Scanning);
            assert_eq!(effects, vec![Fx::StartCountdown, Fx::CallScanCard]);
        }

        #[test]
        fn scan_press_is_ignored_while_any_call_is_in_flight() {
            for phase in [
                Ph::Scanning,
                Ph::Capturing {
                    rfid: "x".to_owned(),
                },
                Ph::Submitting {
                    rfid: "x".to_owned(),
                },
            ] {
                let (next, effects) = transition(phase.clone(), true, 0, Ev::ScanPressed);
                assert_eq!(next, phase);
                assert!(effects.is_empty());
            }
        }

        #[test]
        fn rescan_from_a_held_token_drops_it() {
            let (next, _) = transition(scanned(), true, 0, Ev::ScanPressed);
            assert_eq!(next, Ph::Scanning);
            assert_eq!(next.token(), None);
        }

        #[test]
        fn scan_resolution_with_a_card_opens_capture() {
            let (next, effects) = transition(
                Ph::Scanning,
                true,
                0,
                Ev::ScanResolved {
                    token: Some("e3b4a936".to_owned()),
                    message: "RFID (demo): e3b4a936".to_owned(),
                },
            );
            assert_eq!(next.token(), Some("e3b4a936"));
            assert_eq!(
                effects,
                vec![
                    Fx::StopCountdown,
                    Fx::SetScanStatus("RFID (demo): e3b4a936".to_owned())
                ]
            );
        }

        #[test]
        fn scan_resolution_without_a_card_keeps_capture_locked() {
            let (next, effects) = transition(
                Ph::Scanning,
                true,
                0,
                Ev::ScanResolved {
                    token: None,
                    message: "No tag found".to_owned(),
                },
            );
            assert_eq!(next, Ph::Idle);
            assert!(effects.contains(&Fx::SetScanStatus("No tag found".to_owned())));
            assert!(effects.contains(&Fx::StopCountdown));
        }

        #[test]
        fn scan_error_shows_error_and_stops_the_countdown() {
            let (next, effects) = transition(Ph::Scanning, true, 0, Ev::ScanErrored);
            assert_eq!(next, Ph::Idle);
            assert_eq!(
                effects,
                vec![Fx::StopCountdown, Fx::SetScanStatus("Error".to_owned())]
            );
        }

        #[test]
        fn capture_needs_a_token() {
            let (next, effects) = transition(Ph::Idle, true, 0, Ev::CapturePressed);
            assert_eq!(next, Ph::Idle);
            assert!(effects.is_empty());

            let (next, effects) = transition(scanned(), true, 0, Ev::CapturePressed);
            assert!(matches!(next, Ph::Capturing { .. }));
            assert!(effects.contains(&Fx::ShowVideo));
        }

        #[test]
        fn only_the_sentinel_message_confirms_the_face() {
            let capturing = Ph::Capturing {
                rfid: "e3b4a936".to_owned(),
            };
            let (next, effects) = transition(
                capturing.clone(),
                true,
                0,
                Ev::CaptureResolved {
                    message: "No face detected".to_owned(),
                },
            );
            assert!(matches!(next, Ph::Scanned { .. }));
            assert!(effects.contains(&Fx::HideVideo));

            let (next, _) = transition(
                capturing,
                true,
                0,
                Ev::CaptureResolved {
                    message: api::FACE_CAPTURED.to_owned(),
                },
            );
            assert!(next.face_confirmed());
        }

        #[test]
        fn video_is_hidden_on_every_capture_outcome() {
            let capturing = Ph::Capturing {
                rfid: "x".to_owned(),
            };
            for event in [
                Ev::CaptureResolved {
                    message: "anything".to_owned(),
                },
                Ev::CaptureErrored,
            ] {
                let (_, effects) = transition(capturing.clone(), true, 0, event);
                assert!(effects.contains(&Fx::HideVideo));
            }
        }

        #[test]
        fn submit_success_schedules_the_reset() {
            let (next, effects) = transition(
                Ph::Submitting {
                    rfid: "x".to_owned(),
                },
                true,
                3,
                Ev::SubmitResolved {
                    message: "Asha registered".to_owned(),
                },
            );
            assert!(matches!(next, Ph::Confirmed { .. }));
            assert!(effects.contains(&Fx::ScheduleReset));
        }

        #[test]
        fn submit_failure_schedules_nothing() {
            let (next, effects) = transition(
                Ph::Submitting {
                    rfid: "x".to_owned(),
                },
                true,
                3,
                Ev::SubmitErrored,
            );
            assert!(matches!(next, Ph::Confirmed { .. }));
            assert_eq!(effects, vec![Fx::SetResult("Error".to_owned())]);
        }

        #[test]
        fn stale_reset_is_ignored() {
            let (next, effects) = transition(scanned(), true, 7, Ev::ResetDue { generation: 6 });
            assert_eq!(next, scanned());
            assert!(effects.is_empty());
        }

        #[test]
        fn current_reset_clears_everything() {
            let (next, effects) = transition(
                Ph::Confirmed {
                    rfid: "x".to_owned(),
                },
                true,
                7,
                Ev::ResetDue { generation: 7 },
            );
            assert_eq!(next, Ph::Idle);
            assert_eq!(effects, vec![Fx::ClearAll]);
        }

        /// Token and face gating hold in every reachable phase.
        #[test]
        fn gating_invariants_across_phases() {
            let phases = [
                Ph::Idle,
                Ph::Scanning,
                scanned(),
                Ph::Capturing {
                    rfid: "x".to_owned(),
                },
                Ph::Confirmed {
                    rfid: "x".to_owned(),
                },
                Ph::Submitting {
                    rfid: "x".to_owned(),
                },
            ];
            for phase in phases {
                let token_held = phase.token().is_some();
                match &phase {
                    Ph::Idle | Ph::Scanning => assert!(!token_held),
                    _ => assert!(token_held),
                }
                // Face confirmation implies a held token.
                if phase.face_confirmed() {
                    assert!(token_held);
                }
            }
        }
    }
}
