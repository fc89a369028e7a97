//! Unified device state.
//!
//! This crate merges battery, network, sound, locale, power and location
//! readings into one [`Device`] snapshot. Each reading comes from a
//! [`Monitor`] the host implements on top of its platform APIs, and
//! [`DeviceManager`] keeps the snapshot current and broadcasts every change.

#![warn(missing_docs)]

mod manager;
mod monitor;

pub use manager::{DeviceManager, DeviceManagerBuilder};
pub use monitor::{DeviceIdentityProvider, LocationMonitor, Monitor, NullMonitor, StateSink};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Kind of network the device is currently using.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum NetworkType {
    /// Offline.
    #[default]
    None,
    /// Wi-Fi.
    Wifi,
    /// Mobile data.
    Cellular,
    /// Ethernet, VPN or anything else.
    Other,
}

/// Output volume levels.
///
/// Stream levels are only exposed on Android. iOS only reports the
/// normalized output volume.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SoundVolume {
    /// Ring stream level, `0..=max_ring_volume`.
    pub ring_volume: Option<u32>,
    /// Music stream level, `0..=max_music_volume`.
    pub music_volume: Option<u32>,
    /// Maximum ring stream level.
    pub max_ring_volume: Option<u32>,
    /// Maximum music stream level.
    pub max_music_volume: Option<u32>,
    /// Output volume in `0.0..=1.0`.
    pub normalized_output_volume: Option<f32>,
}

/// Battery level and charging state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatteryStatus {
    /// Charge in percent, `0..=100`.
    pub percent: Option<u8>,
    /// Whether the device is charging.
    pub is_charging: Option<bool>,
}

impl BatteryStatus {
    /// Builds a status from a raw level/scale pair as reported by battery
    /// broadcasts. Invalid scales yield an unknown percentage.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn from_level(level: i32, scale: i32, is_charging: Option<bool>) -> Self {
        // Clamped to 0..=100 before the cast.
        let percent = (level >= 0 && scale > 0).then(|| {
            let ratio = f64::from(level) / f64::from(scale);
            (ratio * 100.0).round().clamp(0.0, 100.0) as u8
        });
        Self {
            percent,
            is_charging,
        }
    }
}

/// Locale and time zone.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocaleTimeState {
    /// BCP-47 tag such as `ko-KR`.
    pub locale_tag: Option<String>,
    /// IANA zone such as `Asia/Seoul`.
    pub timezone_id: Option<String>,
}

/// Power-saving state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PowerState {
    /// Low Power Mode on iOS, battery saver on Android.
    pub is_low_power_mode_enabled: Option<bool>,
}

/// Static description of the device and the running app.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceIdentity {
    /// `Android`, `iOS`, ...
    pub platform_name: String,
    /// OS version, e.g. `14 (34)` or `18.1.1`.
    pub platform_version: Option<String>,
    /// Device manufacturer.
    pub manufacturer: Option<String>,
    /// Device model name.
    pub model: Option<String>,
    /// App version name, e.g. `1.2.3`.
    pub app_version_name: Option<String>,
    /// App build number.
    pub app_version_code: Option<String>,
    /// `ANDROID_ID` or `identifierForVendor`.
    pub device_unique_id: Option<String>,
}

/// A location fix.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    /// Latitude in degrees.
    pub latitude: Option<f64>,
    /// Longitude in degrees.
    pub longitude: Option<f64>,
    /// Horizontal accuracy radius in meters.
    pub horizontal_accuracy_meters: Option<f64>,
    /// Ground speed in meters per second.
    pub speed_meters_per_second: Option<f64>,
    /// Course over ground in degrees.
    pub bearing_degrees: Option<f64>,
}

/// Ringer mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SoundMode {
    /// Ringer on.
    Normal,
    /// Vibrate only.
    Vibrate,
    /// Fully silent.
    Silent,
    /// Not exposed by the platform.
    #[default]
    Unknown,
}

/// Ringer mode plus Do Not Disturb.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SoundModeState {
    /// Current ringer mode.
    pub mode: SoundMode,
    /// Whether Do Not Disturb is on. iOS Focus has no public API, so this is
    /// `None` there.
    pub is_do_not_disturb_enabled: Option<bool>,
}

/// Composite device snapshot.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    /// Static identity.
    pub identity: DeviceIdentity,
    /// Locale and time zone.
    pub locale_time_state: LocaleTimeState,
    /// Battery, if the platform reports one.
    pub battery_status: Option<BatteryStatus>,
    /// Current network.
    pub network_type: NetworkType,
    /// Volume levels.
    pub sound_volume: Option<SoundVolume>,
    /// Ringer mode.
    pub sound_mode_state: Option<SoundModeState>,
    /// Power saving.
    pub power_state: Option<PowerState>,
    /// Last location fix.
    pub location: Option<Location>,
}

/// Errors that can occur while monitoring device state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeviceError {
    /// A monitor failed to start or deliver.
    #[error("{name} monitor failed: {reason}")]
    Monitor {
        /// Monitor that failed.
        name: &'static str,
        /// Platform message.
        reason: String,
    },
    /// Live location tracking cannot be toggled.
    #[error("live location unavailable: {0}")]
    LiveLocationUnavailable(String),
}
