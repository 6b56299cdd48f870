//! Wire types for the four backend operations.
//!
//! The backend is textual-first: every response carries a `message` meant
//! for direct display, and bodies that fail to parse as JSON are still
//! surfaced to the user as raw text through [`decode_lenient`]. The kiosk
//! never crashes on a malformed response, it only degrades.

use serde::{Deserialize, Serialize};

/// Message announced by the backend when a face was stored during
/// enrollment. Anything else leaves the submit step locked.
pub const FACE_CAPTURED: &str = "Face captured";

/// Substring present in the verification message when attendance was
/// recorded for a recognized student.
pub const MARKED_PRESENT: &str = "Marked Present";

/// Status text shown while the card reader is being polled.
pub fn waiting_for_card(secs: u32) -> String {
    format!("Waiting for card ({secs}s)…")
}

/// Response of `POST /scan_rfid`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScanCardResponse {
    /// Card UID, absent or empty when no card was read.
    #[serde(default)]
    pub rfid: Option<String>,
    #[serde(default)]
    pub message: String,
}

impl ScanCardResponse {
    /// The session token, if a card was actually read.
    ///
    /// The backend reports "no card" either by omitting `rfid` or by
    /// sending an empty string; both count as no token.
    pub fn token(&self) -> Option<&str> {
        self.rfid.as_deref().filter(|id| !id.is_empty())
    }
}

/// Request of `POST /capture_face`.
#[derive(Debug, Clone, Serialize)]
pub struct FaceCaptureRequest {
    pub rfid: String,
    /// JPEG still as a `data:image/jpeg;base64,…` URI.
    pub image: String,
}

/// Request of `POST /register_student`.
#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub rfid: String,
    pub roll: String,
    pub name: String,
    pub email: String,
}

/// Request of `POST /verify_both`.
#[derive(Debug, Clone, Serialize)]
pub struct VerifyRequest {
    pub rfid: String,
    pub image: String,
}

/// Message-only response, used by face capture and registration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: String,
}

/// Response of `POST /verify_both`.
///
/// Identity fields are only present when the backend recognized the
/// student; on "not registered" or mismatch outcomes the message stands
/// alone.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VerifyResponse {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub roll: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
}

impl VerifyResponse {
    /// Whether attendance was recorded for a recognized student.
    ///
    /// Both conditions are required: "Already Present" responses carry a
    /// roll but no [`MARKED_PRESENT`] message, and a bare message match
    /// without identity fields would have nothing to render.
    pub fn is_positive_match(&self) -> bool {
        self.roll.is_some() && self.message.contains(MARKED_PRESENT)
    }
}

/// Responses that can be rebuilt from a raw, unparsable body.
pub trait LenientBody: Sized {
    fn from_raw_text(text: String) -> Self;
}

impl LenientBody for ScanCardResponse {
    fn from_raw_text(text: String) -> Self {
        Self {
            rfid: None,
            message: text,
        }
    }
}

impl LenientBody for MessageResponse {
    fn from_raw_text(text: String) -> Self {
        Self { message: text }
    }
}

impl LenientBody for VerifyResponse {
    fn from_raw_text(text: String) -> Self {
        Self {
            message: text,
            ..Self::default()
        }
    }
}

/// Decodes a response body as JSON, falling back to the raw text as the
/// user-facing message.
pub fn decode_lenient<T>(body: &[u8]) -> T
where
    T: serde::de::DeserializeOwned + LenientBody,
{
    match serde_json::from_slice(body) {
        Ok(parsed) => parsed,
        Err(err) => {
            log::warn!("decode_lenient: body is not JSON ({err}), surfacing raw text");
            T::from_raw_text(String::from_utf8_lossy(body).into_owned())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_response_with_card() {
        let response: ScanCardResponse =
            serde_json::from_str(r#"{"rfid": "e3b4a936", "message": "RFID (demo): e3b4a936"}"#)
                .expect("should deserialize");
        assert_eq!(response.token(), Some("e3b4a936"));
    }

    #[test]
    fn empty_rfid_counts_as_no_token() {
        let response: ScanCardResponse =
            serde_json::from_str(r#"{"rfid": "", "message": "No tag found"}"#)
                .expect("should deserialize");
        assert_eq!(response.token(), None);
        assert_eq!(response.message, "No tag found");
    }

    #[test]
    fn missing_rfid_counts_as_no_token() {
        let response: ScanCardResponse =
            serde_json::from_str(r#"{"message": "Attendance closed"}"#).expect("should deserialize");
        assert_eq!(response.token(), None);
    }

    #[test]
    fn capture_request_serialization() {
        let request = FaceCaptureRequest {
            rfid: "e3b4a936".to_owned(),
            image: "data:image/jpeg;base64,AAAA".to_owned(),
        };
        let json = serde_json::to_string(&request).expect("should serialize");
        assert!(json.contains(r#""rfid":"e3b4a936""#));
        assert!(json.contains(r#""image":"data:image/jpeg;base64,AAAA""#));
    }

    #[test]
    fn positive_match_needs_both_roll_and_message() {
        let marked = VerifyResponse {
            message: "Asha Marked Present".to_owned(),
            roll: Some("21".to_owned()),
            ..VerifyResponse::default()
        };
        assert!(marked.is_positive_match());

        let already = VerifyResponse {
            message: "Already Present".to_owned(),
            roll: Some("21".to_owned()),
            ..VerifyResponse::default()
        };
        assert!(!already.is_positive_match());

        let no_roll = VerifyResponse {
            message: "Asha Marked Present".to_owned(),
            ..VerifyResponse::default()
        };
        assert!(!no_roll.is_positive_match());
    }

    #[test]
    fn lenient_decode_parses_json() {
        let decoded: MessageResponse = decode_lenient(br#"{"message": "Face captured"}"#);
        assert_eq!(decoded.message, "Face captured");
    }

    #[test]
    fn lenient_decode_falls_back_to_raw_text() {
        let decoded: MessageResponse = decode_lenient(b"<html>502 Bad Gateway</html>");
        assert_eq!(decoded.message, "<html>502 Bad Gateway</html>");
    }

    #[test]
    fn lenient_decode_never_panics_on_invalid_utf8() {
        let decoded: VerifyResponse = decode_lenient(&[0xff, 0xfe, 0x00]);
        assert!(!decoded.message.is_empty());
        assert!(decoded.roll.is_none());
    }

    #[test]
    fn lenient_decode_on_mistyped_fields_keeps_the_body_visible() {
        // A numeric roll fails the typed parse; the raw body must still
        // reach the user instead of an error.
        let decoded: VerifyResponse = decode_lenient(br#"{"message": "ok", "roll": 21}"#);
        assert!(decoded.message.contains("21"));
    }

    #[test]
    fn waiting_text_format() {
        assert_eq!(waiting_for_card(10), "Waiting for card (10s)…");
        assert_eq!(waiting_for_card(0), "Waiting for card (0s)…");
    }
}
