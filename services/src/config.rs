//! Environment-driven service configuration.

use serde::Deserialize;
use tracing::info;

use crate::window::WindowPolicy;

/// Demo card UID handed out by `/scan_rfid` when no override is set.
pub const DEFAULT_DEMO_UID: &str = "e3b4a936";

/// Raw environment view; every knob is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfig {
    /// `ROLLCALL_ADDR`, default `0.0.0.0`.
    #[serde(default)]
    pub rollcall_addr: Option<String>,
    /// `ROLLCALL_PORT`, default `5000`.
    #[serde(default)]
    pub rollcall_port: Option<u16>,
    /// `ROLLCALL_DEMO_UID`; set to an empty string to disable the demo
    /// reader entirely.
    #[serde(default)]
    pub rollcall_demo_uid: Option<String>,
    /// `ROLLCALL_WINDOWS`, e.g. `13:45@Mon,Wed;16:00@Tue`. Unset means the
    /// kiosk is always open.
    #[serde(default)]
    pub rollcall_windows: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Config {
    addr: String,
    port: u16,
    demo_uid: Option<String>,
    windows: WindowPolicy,
}

impl Config {
    pub fn init() -> anyhow::Result<Self> {
        let raw: RawConfig = serde_env::from_env()?;
        Self::from_raw(raw)
    }

    pub fn from_raw(raw: RawConfig) -> anyhow::Result<Self> {
        let windows = match raw.rollcall_windows.as_deref() {
            None => WindowPolicy::AlwaysOpen,
            Some(specs) => WindowPolicy::parse(specs)?,
        };
        let demo_uid = match raw.rollcall_demo_uid {
            None => Some(DEFAULT_DEMO_UID.to_owned()),
            Some(uid) if uid.trim().is_empty() => None,
            Some(uid) => Some(uid),
        };
        if demo_uid.is_none() {
            info!("demo card reader disabled; /scan_rfid will report no UID");
        }
        Ok(Self {
            addr: raw.rollcall_addr.unwrap_or_else(|| "0.0.0.0".to_owned()),
            port: raw.rollcall_port.unwrap_or(5000),
            demo_uid,
            windows,
        })
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn demo_uid(&self) -> Option<&str> {
        self.demo_uid.as_deref()
    }

    pub fn windows(&self) -> &WindowPolicy {
        &self.windows
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_raw(RawConfig::default()).expect("defaults are valid")
    }
}
