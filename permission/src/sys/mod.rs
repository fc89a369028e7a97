//! Platform-specific permission implementations.
//!
//! Mobile platforms present runtime dialogs that need a live UI host
//! (an Android `ComponentActivity`, an iOS view controller), so their bindings
//! are supplied by the application through [`crate::PermissionStatusSource`]
//! and [`crate::PermissionPrompter`]. What this module provides is the
//! collaborator for hosts that have no runtime permission model at all.

cfg_if::cfg_if! {
    if #[cfg(any(target_os = "linux", target_os = "windows"))] {
        mod desktop;
        use desktop as imp;
    } else {
        mod unsupported;
        use unsupported as imp;
    }
}

use std::collections::BTreeMap;

use crate::{KindSet, PermissionKind, PermissionPrompter, PermissionStatusSource, PlatformError};

/// Permission collaborator backed by the current operating system.
///
/// On desktop Linux and Windows, access is decided by the OS account and
/// sandbox rather than by dialogs. Every kind reads as granted and prompting
/// is a no-op. Elsewhere each call reports [`PlatformError::Unavailable`] and
/// the host has to inject its own binding.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemPermissions;

impl PermissionStatusSource for SystemPermissions {
    async fn is_granted(&self, kind: PermissionKind) -> Result<bool, PlatformError> {
        imp::is_granted(kind)
    }

    async fn should_explain(&self, kind: PermissionKind) -> Result<bool, PlatformError> {
        imp::should_explain(kind)
    }

    fn requires_runtime_request(&self, kind: PermissionKind) -> bool {
        imp::requires_runtime_request(kind)
    }
}

impl PermissionPrompter for SystemPermissions {
    async fn prompt(&self, kinds: &KindSet) -> Result<BTreeMap<PermissionKind, bool>, PlatformError> {
        kinds
            .iter()
            .map(|&kind| imp::is_granted(kind).map(|granted| (kind, granted)))
            .collect()
    }

    async fn open_settings_and_await_return(&self) -> Result<(), PlatformError> {
        imp::open_settings()
    }
}
