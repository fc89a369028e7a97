//! Capability traits the host platform implements.

use std::collections::BTreeMap;
use std::future::Future;

use thiserror::Error;

use crate::{GrantState, KindSet, PermissionKind};

/// Errors reported by a platform collaborator.
///
/// Only [`PlatformError::Unavailable`] and [`PlatformError::Cancelled`] ever
/// reach the caller of the controller. [`PlatformError::Failed`] is absorbed:
/// a failed dialog becomes [`crate::Outcome::NotDetermined`] and a failed query
/// reads as `false`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlatformError {
    /// The capability cannot be queried, or the hosting UI has been destroyed.
    #[error("unavailable: {0}")]
    Unavailable(String),
    /// The host abandoned the pending dialog or settings visit.
    #[error("cancelled")]
    Cancelled,
    /// Any other platform failure.
    #[error("failed: {0}")]
    Failed(String),
}

/// Reports the live permission state. The platform is the source of truth;
/// nothing read here is cached across calls.
pub trait PermissionStatusSource: Send + Sync {
    /// Whether `kind` is currently granted. Limited access counts as granted,
    /// since a new dialog cannot widen it.
    fn is_granted(
        &self,
        kind: PermissionKind,
    ) -> impl Future<Output = Result<bool, PlatformError>> + Send;

    /// Whether the platform suggests explaining `kind` before asking again.
    ///
    /// This is `true` only while the decision is still askable. Platforms
    /// without a rationale signal approximate it with their not-determined
    /// state.
    fn should_explain(
        &self,
        kind: PermissionKind,
    ) -> impl Future<Output = Result<bool, PlatformError>> + Send;

    /// Tri-state grant status of `kind`.
    ///
    /// The default cannot tell a refusal from "never asked" and reports
    /// [`GrantState::Undetermined`] for anything not granted. Platforms that
    /// track explicit denial, device restrictions or limited access should
    /// override it.
    fn grant_state(
        &self,
        kind: PermissionKind,
    ) -> impl Future<Output = Result<GrantState, PlatformError>> + Send {
        async move {
            Ok(if self.is_granted(kind).await? {
                GrantState::Granted
            } else {
                GrantState::Undetermined
            })
        }
    }

    /// Whether `kind` exists as a runtime permission on this OS version.
    ///
    /// Kinds introduced after the running OS version (background location
    /// before Android 10, notifications before Android 13) return `false` and
    /// are treated as implicitly granted where the controller depends on them.
    fn requires_runtime_request(&self, kind: PermissionKind) -> bool {
        let _ = kind;
        true
    }
}

/// Presents permission dialogs and the system settings screen.
pub trait PermissionPrompter: Send + Sync {
    /// Shows one dialog batch for `kinds` and waits for it to be dismissed.
    ///
    /// Returns the per-kind answer. Kinds without a runtime dialog at the
    /// current OS version may be answered immediately with their current state.
    /// Kinds missing from the map are treated as not granted.
    fn prompt(
        &self,
        kinds: &KindSet,
    ) -> impl Future<Output = Result<BTreeMap<PermissionKind, bool>, PlatformError>> + Send;

    /// Opens the app's page in system settings and waits until the user
    /// navigates back.
    fn open_settings_and_await_return(
        &self,
    ) -> impl Future<Output = Result<(), PlatformError>> + Send;
}
