//! Public request surface: batch and dependent requests, status reads and
//! the per-feature shortcuts.

use std::collections::BTreeMap;

use log::debug;

use crate::engine::{self, EscalationPolicy, RequestSession, Resolution};
use crate::guard::InFlightGuard;
use crate::source::{PermissionPrompter, PermissionStatusSource};
use crate::{GrantState, KindSet, Outcome, PermissionError, PermissionKind};

/// Entry point for permission requests.
///
/// The controller holds no reference to platform or UI objects. The status
/// source and prompter are passed to every call, and the controller only
/// keeps the in-flight reservations and the escalation policy.
#[derive(Debug, Clone, Default)]
pub struct PermissionController {
    guard: InFlightGuard,
    policy: EscalationPolicy,
}

impl PermissionController {
    /// Creates a controller with the full escalation flow.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a controller using `policy`.
    #[must_use]
    pub fn with_policy(policy: EscalationPolicy) -> Self {
        Self {
            guard: InFlightGuard::new(),
            policy,
        }
    }

    /// The escalation policy in use.
    #[must_use]
    pub const fn policy(&self) -> EscalationPolicy {
        self.policy
    }

    /// Whether a request involving `kind` is in flight.
    #[must_use]
    pub fn is_in_flight(&self, kind: PermissionKind) -> bool {
        self.guard.is_reserved(kind)
    }

    /// Requests every kind in `kinds` as one dialog batch and escalates until
    /// an outcome is reached.
    ///
    /// An empty request is granted without touching the platform. Dropping the
    /// returned future abandons the request and releases its reservation.
    ///
    /// # Errors
    /// - [`PermissionError::ConcurrentRequestRejected`] if a request for an
    ///   overlapping kind is in flight.
    /// - [`PermissionError::PlatformUnavailable`] if the platform cannot be
    ///   reached.
    /// - [`PermissionError::Cancelled`] if the host abandoned the dialog.
    pub async fn resolve<S, P>(
        &self,
        source: &S,
        prompter: &P,
        kinds: impl IntoIterator<Item = PermissionKind>,
    ) -> Result<Outcome, PermissionError>
    where
        S: PermissionStatusSource,
        P: PermissionPrompter,
    {
        self.resolve_each(source, prompter, kinds)
            .await
            .map(|resolution| resolution.outcome)
    }

    /// Like [`PermissionController::resolve`], but also reports the state each
    /// kind ended in, so callers can tell which kind of a batch was refused.
    ///
    /// # Errors
    /// Same as [`PermissionController::resolve`].
    pub async fn resolve_each<S, P>(
        &self,
        source: &S,
        prompter: &P,
        kinds: impl IntoIterator<Item = PermissionKind>,
    ) -> Result<Resolution, PermissionError>
    where
        S: PermissionStatusSource,
        P: PermissionPrompter,
    {
        let kinds: KindSet = kinds.into_iter().collect();
        if kinds.is_empty() {
            return Ok(Resolution {
                outcome: Outcome::Granted,
                states: BTreeMap::new(),
            });
        }
        let _token = self.guard.try_reserve(kinds.iter().copied())?;
        let mut session = RequestSession::new(kinds);
        let outcome = engine::run(source, prompter, &mut session, self.policy).await?;
        Ok(session.into_resolution(outcome))
    }

    /// Requests `secondary`, which the platform only grants on top of
    /// `primary` (background location on top of foreground location).
    ///
    /// `secondary` is never prompted unless `primary` was confirmed granted
    /// right before. If the platform has no runtime concept of `secondary`,
    /// granting `primary` is enough.
    ///
    /// # Errors
    /// Same as [`PermissionController::resolve`]. Both kinds are reserved for
    /// the whole call.
    pub async fn resolve_dependent<S, P>(
        &self,
        source: &S,
        prompter: &P,
        primary: PermissionKind,
        secondary: PermissionKind,
    ) -> Result<Outcome, PermissionError>
    where
        S: PermissionStatusSource,
        P: PermissionPrompter,
    {
        if primary == secondary {
            return self.resolve(source, prompter, [primary]).await;
        }

        let secondary_required = source.requires_runtime_request(secondary);
        let _token = self.guard.try_reserve([primary, secondary])?;

        let mut session = RequestSession::new(KindSet::from([primary]));
        let outcome = engine::run(source, prompter, &mut session, self.policy).await?;
        if !outcome.is_granted() {
            return Ok(outcome);
        }

        if !secondary_required {
            debug!("{secondary:?} has no runtime permission here; {primary:?} is enough");
            return Ok(Outcome::Granted);
        }

        // Settings round trips are user-driven; the grant may have been
        // revoked while the primary flow was finishing.
        let still_granted =
            engine::query(source.is_granted(primary).await, "is_granted", primary)?;
        if !still_granted {
            debug!("{primary:?} was revoked before {secondary:?} could be requested");
            // The secondary was never asked, so a late re-grant cannot make
            // this call granted.
            let outcome = engine::current_outcome(source, &KindSet::from([primary])).await?;
            return Ok(if outcome.is_granted() {
                Outcome::NotDetermined
            } else {
                outcome
            });
        }

        let mut session = RequestSession::new(KindSet::from([secondary]));
        engine::run(source, prompter, &mut session, self.policy).await
    }

    /// Reports the outcome `kinds` would have right now, reading status only.
    ///
    /// # Errors
    /// [`PermissionError::PlatformUnavailable`] or
    /// [`PermissionError::Cancelled`] from the status source.
    pub async fn current_outcome<S>(
        &self,
        source: &S,
        kinds: impl IntoIterator<Item = PermissionKind>,
    ) -> Result<Outcome, PermissionError>
    where
        S: PermissionStatusSource,
    {
        let kinds: KindSet = kinds.into_iter().collect();
        engine::current_outcome(source, &kinds).await
    }

    /// Reads the state of a single kind without prompting or reserving it.
    ///
    /// [`GrantState::Limited`] and [`GrantState::Restricted`] come straight
    /// from [`PermissionStatusSource::grant_state`]. A kind the source reports
    /// as undetermined but wants explained reads as [`GrantState::Denied`].
    ///
    /// # Errors
    /// [`PermissionError::PlatformUnavailable`] or
    /// [`PermissionError::Cancelled`] from the status source.
    pub async fn status<S>(&self, source: &S, kind: PermissionKind) -> Result<GrantState, PermissionError>
    where
        S: PermissionStatusSource,
    {
        engine::status(source, kind).await
    }

    /// Requests location access while the app is in use.
    ///
    /// # Errors
    /// Same as [`PermissionController::resolve`].
    pub async fn request_location_when_in_use<S, P>(
        &self,
        source: &S,
        prompter: &P,
    ) -> Result<Outcome, PermissionError>
    where
        S: PermissionStatusSource,
        P: PermissionPrompter,
    {
        self.request_unless_granted(source, prompter, PermissionKind::ForegroundLocation)
            .await
    }

    /// Requests background location, asking for foreground location first.
    /// Returns at once if background location is already granted.
    ///
    /// # Errors
    /// Same as [`PermissionController::resolve_dependent`].
    pub async fn request_location_always<S, P>(
        &self,
        source: &S,
        prompter: &P,
    ) -> Result<Outcome, PermissionError>
    where
        S: PermissionStatusSource,
        P: PermissionPrompter,
    {
        let background = PermissionKind::BackgroundLocation;
        if source.requires_runtime_request(background)
            && engine::query(source.is_granted(background).await, "is_granted", background)?
        {
            return Ok(Outcome::Granted);
        }
        self.resolve_dependent(
            source,
            prompter,
            PermissionKind::ForegroundLocation,
            PermissionKind::BackgroundLocation,
        )
        .await
    }

    /// Requests permission to post notifications.
    ///
    /// # Errors
    /// Same as [`PermissionController::resolve`].
    pub async fn request_notifications<S, P>(
        &self,
        source: &S,
        prompter: &P,
    ) -> Result<Outcome, PermissionError>
    where
        S: PermissionStatusSource,
        P: PermissionPrompter,
    {
        self.request_unless_granted(source, prompter, PermissionKind::Notifications)
            .await
    }

    async fn request_unless_granted<S, P>(
        &self,
        source: &S,
        prompter: &P,
        kind: PermissionKind,
    ) -> Result<Outcome, PermissionError>
    where
        S: PermissionStatusSource,
        P: PermissionPrompter,
    {
        if engine::query(source.is_granted(kind).await, "is_granted", kind)? {
            return Ok(Outcome::Granted);
        }
        self.resolve(source, prompter, [kind]).await
    }
}
