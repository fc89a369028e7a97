//! Targets whose permission dialogs need an application-provided binding.

use crate::{PermissionKind, PlatformError};

const HINT: &str = "no built-in permission binding for this target; inject a platform collaborator";

pub(super) fn is_granted(_kind: PermissionKind) -> Result<bool, PlatformError> {
    Err(PlatformError::Unavailable(HINT.into()))
}

pub(super) fn should_explain(_kind: PermissionKind) -> Result<bool, PlatformError> {
    Err(PlatformError::Unavailable(HINT.into()))
}

pub(super) const fn requires_runtime_request(_kind: PermissionKind) -> bool {
    true
}

pub(super) fn open_settings() -> Result<(), PlatformError> {
    Err(PlatformError::Unavailable(HINT.into()))
}
