//! The four kiosk endpoints.
//!
//! Demo-mode semantics: the card reader answers with a preset UID, and no
//! real face matching happens; a stored face for the card is enough. The
//! message texts and status codes are what the kiosk front end expects;
//! every body carries a displayable `message`.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::AppState;
use crate::roster::{MarkOutcome, Student};

#[derive(Debug, Serialize)]
pub struct ScanBody {
    pub rfid: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct MessageBody {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct VerifyBody {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roll: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FacePayload {
    #[serde(default)]
    pub rfid: String,
    #[serde(default)]
    pub image: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct RegisterPayload {
    #[serde(default)]
    pub rfid: String,
    #[serde(default)]
    pub roll: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
}

fn message(status: StatusCode, text: impl Into<String>) -> (StatusCode, Json<MessageBody>) {
    (
        status,
        Json(MessageBody {
            message: text.into(),
        }),
    )
}

fn now() -> chrono::NaiveDateTime {
    chrono::Local::now().naive_local()
}

fn time_of_day() -> String {
    now().format("%H:%M:%S").to_string()
}

/// A capture payload must be a data URI to count as an image at all.
fn has_image(payload_image: &str) -> bool {
    payload_image.starts_with("data:image")
}

pub async fn scan_rfid(State(state): State<AppState>) -> (StatusCode, Json<ScanBody>) {
    if !state.config.windows().is_open(now()) {
        return (
            StatusCode::FORBIDDEN,
            Json(ScanBody {
                rfid: String::new(),
                message: "Attendance closed".to_owned(),
            }),
        );
    }

    match state.config.demo_uid() {
        Some(uid) => {
            debug!(%uid, "demo scan");
            (
                StatusCode::OK,
                Json(ScanBody {
                    rfid: uid.to_owned(),
                    message: format!("RFID (demo): {uid}"),
                }),
            )
        }
        None => (
            StatusCode::BAD_REQUEST,
            Json(ScanBody {
                rfid: String::new(),
                message: "No demo UID configured".to_owned(),
            }),
        ),
    }
}

pub async fn capture_face(
    State(state): State<AppState>,
    Json(payload): Json<FacePayload>,
) -> (StatusCode, Json<MessageBody>) {
    if !state.config.windows().is_open(now()) {
        return message(StatusCode::FORBIDDEN, "Registration closed");
    }

    let rfid = payload.rfid.trim();
    if rfid.is_empty() {
        return message(StatusCode::BAD_REQUEST, "RFID missing");
    }
    if state.roster.contains(rfid) {
        return message(StatusCode::BAD_REQUEST, "RFID already registered");
    }
    if !has_image(&payload.image) {
        return message(StatusCode::BAD_REQUEST, "Image data missing");
    }

    state.roster.record_face(rfid);
    info!(%rfid, "face stored");
    message(StatusCode::OK, "Face captured")
}

pub async fn register_student(
    State(state): State<AppState>,
    Json(payload): Json<RegisterPayload>,
) -> (StatusCode, Json<MessageBody>) {
    if !state.config.windows().is_open(now()) {
        return message(StatusCode::FORBIDDEN, "Registration closed");
    }

    let (rfid, roll, name, email) = (
        payload.rfid.trim(),
        payload.roll.trim(),
        payload.name.trim(),
        payload.email.trim(),
    );
    if [rfid, roll, name, email].iter().any(|field| field.is_empty()) {
        return message(StatusCode::BAD_REQUEST, "All fields required");
    }

    let student = Student {
        rfid: rfid.to_owned(),
        roll: roll.to_owned(),
        name: name.to_owned(),
        email: email.to_owned(),
    };
    if !state.roster.register(student) {
        return message(StatusCode::BAD_REQUEST, "RFID already registered");
    }

    info!(%rfid, %name, "student registered");
    message(StatusCode::OK, format!("{name} registered"))
}

pub async fn verify_both(
    State(state): State<AppState>,
    Json(payload): Json<FacePayload>,
) -> (StatusCode, Json<VerifyBody>) {
    let plain = |status: StatusCode, text: &str| {
        (
            status,
            Json(VerifyBody {
                message: text.to_owned(),
                roll: None,
                name: None,
                email: None,
                time: None,
            }),
        )
    };

    if !state.config.windows().is_open(now()) {
        return plain(StatusCode::FORBIDDEN, "Attendance closed");
    }

    let rfid = payload.rfid.trim();
    if rfid.is_empty() {
        return plain(StatusCode::BAD_REQUEST, "RFID missing");
    }
    if !state.roster.contains(rfid) {
        return plain(
            StatusCode::OK,
            "Student not registered, please register first",
        );
    }
    if !has_image(&payload.image) {
        return plain(StatusCode::BAD_REQUEST, "Image data missing");
    }
    if !state.roster.has_face(rfid) {
        return plain(StatusCode::OK, "Face not recognized");
    }

    let result = match state.roster.mark_present(rfid, time_of_day()) {
        MarkOutcome::Marked { name } => {
            info!(%rfid, %name, "marked present");
            format!("{name} Marked Present")
        }
        MarkOutcome::AlreadyPresent => "Already Present".to_owned(),
        MarkOutcome::Unknown => "Student Unknown".to_owned(),
    };

    // Identity details ride along on every recognized outcome.
    let student = state.roster.get(rfid);
    (
        StatusCode::OK,
        Json(VerifyBody {
            message: result,
            roll: student.as_ref().map(|s| s.roll.clone()),
            name: student.as_ref().map(|s| s.name.clone()),
            email: student.as_ref().map(|s| s.email.clone()),
            time: Some(time_of_day()),
        }),
    )
}
