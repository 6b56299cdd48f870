//! Attendance flow: read a card, verify card and face together, show the
//! outcome, reset.
//!
//! Same shape as the enrollment flow: a phase enum, a pure [`transition`]
//! function, and an executor ([`AttendFlow`]) that performs the effects.
//! All of this flow's messages share one status line, and every transient
//! message schedules its own scoped auto-clear.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use rollcall_states::{CancelHandle, Countdown, StatusLine, run_after};
use tokio::runtime::Handle;

use crate::api::{self, VerifyRequest, VerifyResponse};
use crate::capture::VideoFeed;
use crate::enroll::SCAN_COUNTDOWN_SECS;
use crate::gateway::Gateway;

/// How long a verification outcome stays on screen.
pub const OUTCOME_CLEAR_DELAY: Duration = Duration::from_secs(3);

/// How long scan failures, transport errors, and guard messages stay.
pub const ERROR_CLEAR_DELAY: Duration = Duration::from_secs(2);

/// Where the attendance flow currently stands.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AttendPhase {
    /// Nothing pending; scan is available.
    #[default]
    Idle,
    /// A card-scan call is outstanding.
    Scanning,
    /// A card was read; verification is available.
    Scanned { rfid: String },
    /// A verification call is outstanding.
    Verifying { rfid: String },
}

impl AttendPhase {
    pub fn token(&self) -> Option<&str> {
        match self {
            Self::Idle | Self::Scanning => None,
            Self::Scanned { rfid } | Self::Verifying { rfid } => Some(rfid),
        }
    }

    pub fn in_flight(&self) -> bool {
        matches!(self, Self::Scanning | Self::Verifying { .. })
    }
}

#[derive(Debug)]
pub enum AttendEvent {
    ScanPressed,
    ScanResolved { token: Option<String>, message: String },
    ScanErrored,
    VerifyPressed,
    VerifyResolved { response: VerifyResponse },
    VerifyErrored,
}

#[derive(Debug, PartialEq, Eq)]
pub enum AttendEffect {
    StartCountdown,
    StopCountdown,
    CallScanCard,
    SetMessage(String),
    /// Clear the message after `delay`, scoped to the message version the
    /// preceding `SetMessage` produced.
    ScheduleClear { delay: Duration },
    ShowVideo,
    HideVideo,
    /// Snapshot the feed and send the verification request.
    CaptureAndVerify { rfid: String },
}

/// Renders a verification response for display.
///
/// A positive match gets the multi-line confirmation; everything else is
/// the backend message verbatim.
fn render_outcome(response: &VerifyResponse) -> String {
    if response.is_positive_match() {
        format!(
            "{}\nRoll: {}\nName: {}\nEmail: {}\nTime: {}",
            response.message,
            response.roll.as_deref().unwrap_or_default(),
            response.name.as_deref().unwrap_or_default(),
            response.email.as_deref().unwrap_or_default(),
            response.time.as_deref().unwrap_or_default(),
        )
    } else {
        response.message.clone()
    }
}

/// Computes the next phase and effects for `event`.
pub fn transition(phase: AttendPhase, event: AttendEvent) -> (AttendPhase, Vec<AttendEffect>) {
    use AttendEffect as Fx;
    use AttendEvent as Ev;
    use AttendPhase as Ph;

    match (phase, event) {
        (Ph::Idle | Ph::Scanned { .. }, Ev::ScanPressed) => {
            (Ph::Scanning, vec![Fx::StartCountdown, Fx::CallScanCard])
        }
        (Ph::Scanning, Ev::ScanResolved { token, message }) => match token {
            Some(rfid) => (
                Ph::Scanned { rfid },
                vec![Fx::StopCountdown, Fx::SetMessage(message)],
            ),
            None => (
                Ph::Idle,
                vec![
                    Fx::StopCountdown,
                    Fx::SetMessage(message),
                    Fx::ScheduleClear {
                        delay: ERROR_CLEAR_DELAY,
                    },
                ],
            ),
        },
        (Ph::Scanning, Ev::ScanErrored) => (
            Ph::Idle,
            vec![
                Fx::StopCountdown,
                Fx::SetMessage("Error".to_owned()),
                Fx::ScheduleClear {
                    delay: ERROR_CLEAR_DELAY,
                },
            ],
        ),
        (Ph::Scanned { rfid }, Ev::VerifyPressed) => (
            Ph::Verifying { rfid: rfid.clone() },
            vec![Fx::ShowVideo, Fx::CaptureAndVerify { rfid }],
        ),
        (Ph::Idle, Ev::VerifyPressed) => (
            // The control is disabled without a token; this guard catches
            // the path anyway.
            Ph::Idle,
            vec![
                Fx::SetMessage("Scan RFID first".to_owned()),
                Fx::ScheduleClear {
                    delay: ERROR_CLEAR_DELAY,
                },
            ],
        ),
        (Ph::Verifying { .. }, Ev::VerifyResolved { response }) => (
            // The token is spent regardless of the outcome; the next
            // attempt starts from a fresh scan.
            Ph::Idle,
            vec![
                Fx::SetMessage(render_outcome(&response)),
                Fx::ScheduleClear {
                    delay: OUTCOME_CLEAR_DELAY,
                },
                Fx::HideVideo,
            ],
        ),
        (Ph::Verifying { .. }, Ev::VerifyErrored) => (
            Ph::Idle,
            vec![
                Fx::SetMessage("Error".to_owned()),
                Fx::ScheduleClear {
                    delay: ERROR_CLEAR_DELAY,
                },
                Fx::HideVideo,
            ],
        ),
        (phase, event) => {
            log::debug!("AttendFlow: ignoring {event:?} in phase {phase:?}");
            (phase, vec![])
        }
    }
}

#[derive(Debug, Default)]
struct AttendInner {
    phase: AttendPhase,
    countdown: Option<CancelHandle>,
}

/// Drives the attendance flow. Cheap to clone; clones share all state.
#[derive(Debug, Clone)]
pub struct AttendFlow {
    inner: Arc<Mutex<AttendInner>>,
    gateway: Arc<dyn Gateway>,
    video: VideoFeed,
    rt: Handle,
    /// The single status line of this flow.
    pub message: StatusLine,
}

impl AttendFlow {
    pub fn new(gateway: Arc<dyn Gateway>, video: VideoFeed, rt: Handle) -> Self {
        Self {
            inner: Arc::new(Mutex::new(AttendInner::default())),
            gateway,
            video,
            rt,
            message: StatusLine::new(),
        }
    }

    pub fn phase(&self) -> AttendPhase {
        self.lock().phase.clone()
    }

    pub fn can_scan(&self) -> bool {
        !self.lock().phase.in_flight()
    }

    pub fn can_verify(&self) -> bool {
        matches!(self.lock().phase, AttendPhase::Scanned { .. })
    }

    pub fn scan(&self) {
        self.apply(AttendEvent::ScanPressed);
    }

    pub fn verify(&self) {
        self.apply(AttendEvent::VerifyPressed);
    }

    fn apply(&self, event: AttendEvent) {
        let effects = {
            let mut inner = self.lock();
            let (next, effects) = transition(inner.phase.clone(), event);
            inner.phase = next;
            effects
        };
        // Outside the lock, so synchronous gateway completions may
        // re-enter apply() safely.
        self.run_effects(effects);
    }

    fn run_effects(&self, effects: Vec<AttendEffect>) {
        for effect in effects {
            match effect {
                AttendEffect::StartCountdown => {
                    let handle = Countdown::start(
                        &self.rt,
                        SCAN_COUNTDOWN_SECS,
                        &self.message,
                        api::waiting_for_card,
                    );
                    if let Some(previous) = self.lock().countdown.replace(handle) {
                        previous.cancel();
                    }
                }
                AttendEffect::StopCountdown => {
                    if let Some(handle) = self.lock().countdown.take() {
                        handle.cancel();
                    }
                }
                AttendEffect::CallScanCard => {
                    let flow = self.clone();
                    self.gateway.scan_card(Box::new(move |result| match result {
                        Ok(response) => {
                            let token = response.token().map(str::to_owned);
                            flow.apply(AttendEvent::ScanResolved {
                                token,
                                message: response.message,
                            });
                        }
                        Err(err) => {
                            log::error!("AttendFlow: card scan failed: {err}");
                            flow.apply(AttendEvent::ScanErrored);
                        }
                    }));
                }
                AttendEffect::SetMessage(text) => {
                    self.message.set(text);
                }
                AttendEffect::ScheduleClear { delay } => {
                    // Scoped to the message that was just set: if something
                    // newer lands in the meantime, this clear is a no-op.
                    let version = self.message.version();
                    let line = self.message.clone();
                    run_after(&self.rt, delay, move || {
                        line.clear_if(version);
                    });
                }
                AttendEffect::ShowVideo => self.video.show(),
                AttendEffect::HideVideo => self.video.hide(),
                AttendEffect::CaptureAndVerify { rfid } => match self.video.snapshot() {
                    Ok(artifact) => {
                        let flow = self.clone();
                        self.gateway.verify_card_and_face(
                            VerifyRequest {
                                rfid,
                                image: artifact.into_data_uri(),
                            },
                            Box::new(move |result| match result {
                                Ok(response) => {
                                    flow.apply(AttendEvent::VerifyResolved { response });
                                }
                                Err(err) => {
                                    log::error!("AttendFlow: verification failed: {err}");
                                    flow.apply(AttendEvent::VerifyErrored);
                                }
                            }),
                        );
                    }
                    Err(err) => {
                        log::warn!("AttendFlow: snapshot failed: {err}");
                        flow_snapshot_failure(self, err.to_string());
                    }
                },
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, AttendInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A local capture failure resolves the verification like a semantic
/// miss: the message is shown, the token is spent, the video hides.
fn flow_snapshot_failure(flow: &AttendFlow, message: String) {
    flow.apply(AttendEvent::VerifyResolved {
        response: VerifyResponse {
            message,
            ..VerifyResponse::default()
        },
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use AttendEffect as Fx;
    use AttendEvent as Ev;
    use AttendPhase as Ph;

    fn scanned() -> Ph {
        Ph::Scanned {
            rfid: "05D4E6F7".to_owned(),
        }
    }

    fn marked_present() -> VerifyResponse {
        VerifyResponse {
            message: "Marked Present".to_owned(),
            roll: Some("21".to_owned()),
            name: Some("Asha".to_owned()),
            email: Some("a@x.com".to_owned()),
            time: Some("09:00".to_owned()),
        }
    }

    #[test]
    fn scan_is_open_from_idle_and_scanned() {
        for phase in [Ph::Idle, scanned()] {
            let (next, effects) = transition(phase, Ev::ScanPressed);
            assert_eq!(next, Ph::Scanning);
            assert_eq!(effects, vec![Fx::StartCountdown, Fx::CallScanCard]);
        }
    }

    #[test]
    fn scan_press_is_ignored_mid_flight() {
        for phase in [
            Ph::Scanning,
            Ph::Verifying {
                rfid: "x".to_owned(),
            },
        ] {
            let (next, effects) = transition(phase.clone(), Ev::ScanPressed);
            assert_eq!(next, phase);
            assert!(effects.is_empty());
        }
    }

    #[test]
    fn card_found_enables_verify_without_an_auto_clear() {
        let (next, effects) = transition(
            Ph::Scanning,
            Ev::ScanResolved {
                token: Some("05D4E6F7".to_owned()),
                message: "RFID (demo): 05D4E6F7".to_owned(),
            },
        );
        assert_eq!(next.token(), Some("05D4E6F7"));
        assert!(
            !effects
                .iter()
                .any(|fx| matches!(fx, Fx::ScheduleClear { .. }))
        );
    }

    #[test]
    fn no_card_clears_after_two_seconds() {
        let (next, effects) = transition(
            Ph::Scanning,
            Ev::ScanResolved {
                token: None,
                message: "No tag found".to_owned(),
            },
        );
        assert_eq!(next, Ph::Idle);
        assert!(effects.contains(&Fx::ScheduleClear {
            delay: ERROR_CLEAR_DELAY
        }));
    }

    #[test]
    fn verify_without_a_token_shows_the_guard_message() {
        let (next, effects) = transition(Ph::Idle, Ev::VerifyPressed);
        assert_eq!(next, Ph::Idle);
        assert!(effects.contains(&Fx::SetMessage("Scan RFID first".to_owned())));
        assert!(effects.contains(&Fx::ScheduleClear {
            delay: ERROR_CLEAR_DELAY
        }));
    }

    #[test]
    fn positive_match_renders_all_identity_fields() {
        let (next, effects) = transition(
            Ph::Verifying {
                rfid: "05D4E6F7".to_owned(),
            },
            Ev::VerifyResolved {
                response: marked_present(),
            },
        );
        assert_eq!(next, Ph::Idle);
        let rendered = effects
            .iter()
            .find_map(|fx| match fx {
                Fx::SetMessage(text) => Some(text.clone()),
                _ => None,
            })
            .expect("a message must be set");
        for needle in ["Marked Present", "Roll: 21", "Name: Asha", "Email: a@x.com", "Time: 09:00"]
        {
            assert!(rendered.contains(needle), "missing {needle:?} in {rendered:?}");
        }
        assert!(effects.contains(&Fx::ScheduleClear {
            delay: OUTCOME_CLEAR_DELAY
        }));
    }

    #[test]
    fn negative_match_shows_the_plain_message() {
        let (next, effects) = transition(
            Ph::Verifying {
                rfid: "05D4E6F7".to_owned(),
            },
            Ev::VerifyResolved {
                response: VerifyResponse {
                    message: "Face mismatch".to_owned(),
                    ..VerifyResponse::default()
                },
            },
        );
        assert_eq!(next, Ph::Idle);
        assert!(effects.contains(&Fx::SetMessage("Face mismatch".to_owned())));
        assert!(effects.contains(&Fx::HideVideo));
    }

    #[test]
    fn verification_always_spends_the_token() {
        for event in [
            Ev::VerifyResolved {
                response: marked_present(),
            },
            Ev::VerifyErrored,
        ] {
            let (next, effects) = transition(
                Ph::Verifying {
                    rfid: "05D4E6F7".to_owned(),
                },
                event,
            );
            assert_eq!(next.token(), None);
            assert!(effects.contains(&Fx::HideVideo));
        }
    }

    #[test]
    fn transport_error_clears_after_two_seconds() {
        let (_, effects) = transition(Ph::Scanning, Ev::ScanErrored);
        assert!(effects.contains(&Fx::SetMessage("Error".to_owned())));
        assert!(effects.contains(&Fx::ScheduleClear {
            delay: ERROR_CLEAR_DELAY
        }));
    }
}
