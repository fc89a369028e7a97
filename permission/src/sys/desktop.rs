//! Desktop hosts without runtime permission prompts.
//!
//! Access to location, camera or microphone is governed by file permissions,
//! user groups or a sandbox portal. None of those can be asked for from inside
//! the application, so there is nothing to escalate.

use crate::{PermissionKind, PlatformError};

pub(super) const fn is_granted(_kind: PermissionKind) -> Result<bool, PlatformError> {
    Ok(true)
}

pub(super) const fn should_explain(_kind: PermissionKind) -> Result<bool, PlatformError> {
    Ok(false)
}

pub(super) const fn requires_runtime_request(_kind: PermissionKind) -> bool {
    false
}

pub(super) const fn open_settings() -> Result<(), PlatformError> {
    Ok(())
}
