//! The prompt → rationale → re-prompt → settings escalation flow.

use std::collections::BTreeMap;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::source::{PermissionPrompter, PermissionStatusSource, PlatformError};
use crate::{GrantState, KindSet, Outcome, PermissionError, PermissionKind};

/// Which escalation steps run after a denied first prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EscalationPolicy {
    /// Re-prompt the whole batch once if any denied kind is still explainable.
    pub retry_on_rationale: bool,
    /// Open system settings as a last resort and re-read the status on return.
    pub escalate_to_settings: bool,
}

impl EscalationPolicy {
    /// Ask once and report the answer, without retrying or opening settings.
    #[must_use]
    pub const fn prompt_only() -> Self {
        Self {
            retry_on_rationale: false,
            escalate_to_settings: false,
        }
    }
}

impl Default for EscalationPolicy {
    fn default() -> Self {
        Self {
            retry_on_rationale: true,
            escalate_to_settings: true,
        }
    }
}

/// Position of a [`RequestSession`] in the escalation flow. Sessions only move
/// forward through these stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    /// Nothing has been asked yet.
    Start,
    /// The first dialog has been answered.
    Prompted,
    /// Some denied kind is still explainable; one more dialog is owed.
    NeedsRationale,
    /// The retry dialog has been answered.
    RePrompted,
    /// In-app prompting is exhausted.
    NeedsSettings,
    /// The user came back from system settings.
    SettingsReturned,
    /// Every requested kind is granted.
    Granted,
    /// The flow ended with at least one kind denied.
    Denied,
}

/// Per-call record of a permission request. Created when a request starts
/// and dropped when it returns.
#[derive(Debug, Clone)]
pub struct RequestSession {
    kinds: KindSet,
    states: BTreeMap<PermissionKind, GrantState>,
    explainable: KindSet,
    stage: Stage,
    prompts: u8,
}

impl RequestSession {
    /// Starts a session for `kinds` with every kind undetermined.
    #[must_use]
    pub fn new(kinds: KindSet) -> Self {
        let states = kinds
            .iter()
            .map(|&kind| (kind, GrantState::Undetermined))
            .collect();
        Self {
            kinds,
            states,
            explainable: KindSet::new(),
            stage: Stage::Start,
            prompts: 0,
        }
    }

    /// Requested kinds.
    #[must_use]
    pub const fn kinds(&self) -> &KindSet {
        &self.kinds
    }

    /// Last known state of `kind`, if it belongs to this session.
    #[must_use]
    pub fn state(&self, kind: PermissionKind) -> Option<GrantState> {
        self.states.get(&kind).copied()
    }

    /// Current stage.
    #[must_use]
    pub const fn stage(&self) -> Stage {
        self.stage
    }

    /// Number of dialogs issued so far.
    #[must_use]
    pub const fn prompts(&self) -> u8 {
        self.prompts
    }

    /// Kinds that are not granted yet.
    #[must_use]
    pub fn outstanding(&self) -> Vec<PermissionKind> {
        self.states
            .iter()
            .filter(|(_, state)| !state.is_granted())
            .map(|(&kind, _)| kind)
            .collect()
    }

    /// Last known state of every requested kind.
    #[must_use]
    pub const fn states(&self) -> &BTreeMap<PermissionKind, GrantState> {
        &self.states
    }

    /// Whether every requested kind is granted.
    #[must_use]
    pub fn all_granted(&self) -> bool {
        self.states.values().all(|state| state.is_granted())
    }

    fn advance(&mut self, next: Stage) {
        debug_assert!(next > self.stage, "{:?} -> {next:?} revisits a stage", self.stage);
        debug!("permission session {:?}: {:?} -> {next:?}", self.kinds, self.stage);
        self.stage = next;
    }

    fn record_prompt(&mut self, answers: &BTreeMap<PermissionKind, bool>) {
        self.prompts += 1;
        for (kind, state) in &mut self.states {
            *state = answers
                .get(kind)
                .map_or(GrantState::Undetermined, |&granted| granted.into());
        }
    }

    fn record_status(&mut self, kind: PermissionKind, granted: bool) {
        if let Some(state) = self.states.get_mut(&kind) {
            *state = granted.into();
        }
    }

    fn finish_granted(&mut self) -> Outcome {
        self.advance(Stage::Granted);
        Outcome::Granted
    }

    fn finish_denied(&mut self) -> Outcome {
        self.advance(Stage::Denied);
        // The post-settings status cannot say whether asking again is useful;
        // only the rationale signal collected before escalation can.
        let mut can_ask_again = false;
        for (kind, state) in &mut self.states {
            if *state != GrantState::Denied {
                continue;
            }
            if self.explainable.contains(kind) {
                can_ask_again = true;
            } else {
                *state = GrantState::PermanentlyDenied;
            }
        }
        Outcome::Denied { can_ask_again }
    }

    pub(crate) fn into_resolution(self, outcome: Outcome) -> Resolution {
        Resolution {
            outcome,
            states: self.states,
        }
    }
}

/// Result of a batch request: the combined [`Outcome`] plus the last known
/// state of each requested kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    /// Combined outcome of the batch.
    pub outcome: Outcome,
    /// Per-kind state when the flow ended. Kinds still refused after the
    /// rationale check without asking to be explained are
    /// [`GrantState::PermanentlyDenied`].
    pub states: BTreeMap<PermissionKind, GrantState>,
}

impl Resolution {
    /// State of `kind`, if it was part of the request.
    #[must_use]
    pub fn state(&self, kind: PermissionKind) -> Option<GrantState> {
        self.states.get(&kind).copied()
    }

    /// Kinds the user refused, temporarily or for good.
    #[must_use]
    pub fn refused(&self) -> Vec<PermissionKind> {
        self.states
            .iter()
            .filter(|(_, state)| state.is_denied())
            .map(|(&kind, _)| kind)
            .collect()
    }
}

/// Drives `session` to its outcome. The caller holds the guard for the
/// session's kinds.
pub(crate) async fn run<S, P>(
    source: &S,
    prompter: &P,
    session: &mut RequestSession,
    policy: EscalationPolicy,
) -> Result<Outcome, PermissionError>
where
    S: PermissionStatusSource,
    P: PermissionPrompter,
{
    if session.kinds.is_empty() {
        return Ok(session.finish_granted());
    }

    match prompter.prompt(&session.kinds).await {
        Ok(answers) => session.record_prompt(&answers),
        Err(err) => return abandon(session, "prompt", err),
    }
    session.advance(Stage::Prompted);
    if session.all_granted() {
        return Ok(session.finish_granted());
    }

    for kind in session.outstanding() {
        if query(source.should_explain(kind).await, "should_explain", kind)? {
            session.explainable.insert(kind);
        }
    }

    if policy.retry_on_rationale && !session.explainable.is_empty() {
        session.advance(Stage::NeedsRationale);
        match prompter.prompt(&session.kinds).await {
            Ok(answers) => session.record_prompt(&answers),
            Err(err) => return abandon(session, "re-prompt", err),
        }
        session.advance(Stage::RePrompted);
        if session.all_granted() {
            return Ok(session.finish_granted());
        }
    }

    if !policy.escalate_to_settings {
        return Ok(session.finish_denied());
    }

    session.advance(Stage::NeedsSettings);
    if let Err(err) = prompter.open_settings_and_await_return().await {
        return abandon(session, "settings", err);
    }
    session.advance(Stage::SettingsReturned);

    // The dialog cannot be shown again once dismissed for good, so only a
    // passive read is allowed after settings.
    for kind in session.outstanding() {
        let granted = query(source.is_granted(kind).await, "is_granted", kind)?;
        session.record_status(kind, granted);
    }

    if session.all_granted() {
        Ok(session.finish_granted())
    } else {
        Ok(session.finish_denied())
    }
}

/// Reads the outcome `kinds` would have right now, without prompting.
pub(crate) async fn current_outcome<S>(source: &S, kinds: &KindSet) -> Result<Outcome, PermissionError>
where
    S: PermissionStatusSource,
{
    let mut outstanding = Vec::new();
    for &kind in kinds {
        if !query(source.is_granted(kind).await, "is_granted", kind)? {
            outstanding.push(kind);
        }
    }
    if outstanding.is_empty() {
        return Ok(Outcome::Granted);
    }

    for &kind in &outstanding {
        if query(source.should_explain(kind).await, "should_explain", kind)? {
            return Ok(Outcome::Denied {
                can_ask_again: true,
            });
        }
    }

    for &kind in &outstanding {
        match source.grant_state(kind).await {
            Ok(state) if state.is_denied() || state.is_final() => {
                return Ok(Outcome::Denied {
                    can_ask_again: false,
                });
            }
            Ok(_) => {}
            Err(err) => {
                propagate(err, "grant_state", kind)?;
            }
        }
    }
    Ok(Outcome::NotDetermined)
}

/// Reads the state of one kind without prompting. A kind the platform cannot
/// classify but still wants explained reads as [`GrantState::Denied`].
pub(crate) async fn status<S>(source: &S, kind: PermissionKind) -> Result<GrantState, PermissionError>
where
    S: PermissionStatusSource,
{
    let state = match source.grant_state(kind).await {
        Ok(state) => state,
        Err(err) => {
            propagate(err, "grant_state", kind)?;
            GrantState::Undetermined
        }
    };
    if state == GrantState::Undetermined
        && query(source.should_explain(kind).await, "should_explain", kind)?
    {
        return Ok(GrantState::Denied);
    }
    Ok(state)
}

/// Normalizes a yes/no query: hard failures propagate, anything else reads as `false`.
pub(crate) fn query(
    result: Result<bool, PlatformError>,
    what: &str,
    kind: PermissionKind,
) -> Result<bool, PermissionError> {
    match result {
        Ok(value) => Ok(value),
        Err(err) => propagate(err, what, kind).map(|()| false),
    }
}

fn propagate(err: PlatformError, what: &str, kind: PermissionKind) -> Result<(), PermissionError> {
    match err {
        PlatformError::Unavailable(reason) => Err(PermissionError::PlatformUnavailable(reason)),
        PlatformError::Cancelled => Err(PermissionError::Cancelled),
        PlatformError::Failed(reason) => {
            warn!("{what}({kind:?}) failed, treating as false: {reason}");
            Ok(())
        }
    }
}

fn abandon(
    session: &RequestSession,
    step: &str,
    err: PlatformError,
) -> Result<Outcome, PermissionError> {
    match err {
        PlatformError::Unavailable(reason) => Err(PermissionError::PlatformUnavailable(reason)),
        PlatformError::Cancelled => Err(PermissionError::Cancelled),
        PlatformError::Failed(reason) => {
            // A dialog that failed to present is not a refusal.
            warn!(
                "permission {step} for {:?} failed at {:?}: {reason}",
                session.kinds, session.stage
            );
            Ok(Outcome::NotDetermined)
        }
    }
}
