//! Cross-platform permission request escalation.
//!
//! This crate turns the raw permission primitive every mobile platform offers
//! (one yes/no dialog whose denial may or may not be final) into a single,
//! deterministic [`Outcome`]. A request is prompted once, retried once when the
//! platform says the user can still be asked, and finally escalated to the
//! system settings screen before giving up.
//!
//! The platform itself is reached through two small traits,
//! [`PermissionStatusSource`] and [`PermissionPrompter`], which the host
//! application implements on top of its native bindings.
//!
//! ```no_run
//! use devicekit_permission::{PermissionController, PermissionKind, Outcome};
//! # use devicekit_permission::{PermissionPrompter, PermissionStatusSource};
//!
//! # async fn demo(platform: &(impl PermissionStatusSource + PermissionPrompter)) {
//! let controller = PermissionController::new();
//! match controller.request_location_always(platform, platform).await {
//!     Ok(Outcome::Granted) => println!("tracking in background"),
//!     Ok(Outcome::Denied { can_ask_again: true }) => println!("explain and retry later"),
//!     Ok(_) => println!("send the user to settings"),
//!     Err(err) => eprintln!("permission flow failed: {err}"),
//! }
//! # }
//! ```

#![warn(missing_docs)]

mod controller;
mod engine;
mod guard;
mod source;

/// Platform-specific implementations.
pub mod sys;

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use controller::PermissionController;
pub use engine::{EscalationPolicy, RequestSession, Resolution, Stage};
pub use guard::{GuardToken, InFlightGuard};
pub use source::{PermissionPrompter, PermissionStatusSource, PlatformError};

/// A set of permission kinds requested together in one dialog batch.
pub type KindSet = BTreeSet<PermissionKind>;

/// Types of permissions that can be requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[non_exhaustive]
pub enum PermissionKind {
    /// Location while the app is in use.
    ForegroundLocation,
    /// Location while the app is in the background. Requires
    /// [`PermissionKind::ForegroundLocation`] first.
    BackgroundLocation,
    /// Posting user-visible notifications.
    Notifications,
    /// Access to device camera.
    Camera,
    /// Access to device microphone.
    Microphone,
    /// Access to photo library.
    Photos,
    /// Access to shared storage.
    Storage,
    /// Scanning for and connecting to Bluetooth devices.
    Bluetooth,
    /// Access to contacts.
    Contacts,
    /// Access to calendar.
    Calendar,
}

impl PermissionKind {
    /// Every permission kind, in declaration order.
    pub const ALL: [Self; 10] = [
        Self::ForegroundLocation,
        Self::BackgroundLocation,
        Self::Notifications,
        Self::Camera,
        Self::Microphone,
        Self::Photos,
        Self::Storage,
        Self::Bluetooth,
        Self::Contacts,
        Self::Calendar,
    ];

    /// The bit this kind occupies in an [`InFlightGuard`].
    #[must_use]
    pub const fn bit(self) -> u32 {
        1 << self as u32
    }
}

/// Live grant state of a single permission kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GrantState {
    /// The user granted the permission.
    Granted,
    /// Access to a user-selected subset only, such as the iOS 14 limited
    /// photo library.
    Limited,
    /// The user denied the permission but the dialog can still be shown.
    Denied,
    /// The user denied the permission for good. Only system settings can
    /// change it.
    PermanentlyDenied,
    /// Device policy (parental controls, MDM) blocks the permission. Neither
    /// a dialog nor the user can change it.
    Restricted,
    /// The platform cannot tell whether the user was ever asked.
    Undetermined,
}

impl GrantState {
    /// Returns `true` for [`GrantState::Granted`].
    #[must_use]
    pub const fn is_granted(self) -> bool {
        matches!(self, Self::Granted)
    }

    /// Returns `true` if the app can use the resource, fully or in part.
    #[must_use]
    pub const fn allows_access(self) -> bool {
        matches!(self, Self::Granted | Self::Limited)
    }

    /// Returns `true` for both kinds of user denial.
    #[must_use]
    pub const fn is_denied(self) -> bool {
        matches!(self, Self::Denied | Self::PermanentlyDenied)
    }

    /// Returns `true` if only a settings change can grant the permission,
    /// or nothing at all can.
    #[must_use]
    pub const fn is_final(self) -> bool {
        matches!(self, Self::PermanentlyDenied | Self::Restricted)
    }
}

impl From<bool> for GrantState {
    fn from(granted: bool) -> Self {
        if granted { Self::Granted } else { Self::Denied }
    }
}

/// Final result of a permission request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "kebab-case")]
pub enum Outcome {
    /// Every requested kind is granted.
    Granted,
    /// At least one requested kind is denied.
    Denied {
        /// Whether prompting again in-app can still succeed. When `false`,
        /// only the system settings screen can change the decision.
        can_ask_again: bool,
    },
    /// The platform could not produce a decision, for example because the
    /// dialog failed to present.
    NotDetermined,
}

impl Outcome {
    /// Returns `true` for [`Outcome::Granted`].
    #[must_use]
    pub const fn is_granted(self) -> bool {
        matches!(self, Self::Granted)
    }

    /// Returns `true` if the request may be repeated in-app.
    #[must_use]
    pub const fn can_ask_again(self) -> bool {
        matches!(self, Self::Denied { can_ask_again: true } | Self::NotDetermined)
    }
}

/// Errors that can occur while resolving a permission request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PermissionError {
    /// The platform capability cannot be reached, or the hosting UI is gone.
    #[error("platform unavailable: {0}")]
    PlatformUnavailable(String),
    /// Another request for an overlapping set of kinds is still in flight.
    #[error("permission request already in progress for {kinds:?}")]
    ConcurrentRequestRejected {
        /// Kinds that are currently reserved by the other request.
        kinds: Vec<PermissionKind>,
    },
    /// The request was abandoned before reaching an outcome.
    #[error("permission request cancelled")]
    Cancelled,
}
