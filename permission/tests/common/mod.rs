//! Scripted platform collaborator shared by the integration tests.

#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::Mutex;

use devicekit_permission::{
    GrantState, KindSet, PermissionKind, PermissionPrompter, PermissionStatusSource,
    PlatformError,
};

/// A collaborator call, recorded in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Prompt(Vec<PermissionKind>),
    Settings,
    IsGranted(PermissionKind),
    ShouldExplain(PermissionKind),
    GrantState(PermissionKind),
}

type PromptReply = Result<Vec<(PermissionKind, bool)>, PlatformError>;

/// Fake platform that answers dialogs from a script and keeps a live grant
/// table the way an OS would.
#[derive(Debug, Default)]
pub struct ScriptedPlatform {
    replies: Mutex<VecDeque<PromptReply>>,
    granted: Mutex<BTreeSet<PermissionKind>>,
    reported: BTreeMap<PermissionKind, GrantState>,
    first_read_misses: Mutex<BTreeSet<PermissionKind>>,
    explains: BTreeSet<PermissionKind>,
    granted_in_settings: BTreeSet<PermissionKind>,
    not_sticky: BTreeSet<PermissionKind>,
    no_runtime: BTreeSet<PermissionKind>,
    settings_error: Option<PlatformError>,
    explain_error: Option<PlatformError>,
    gate: Option<async_channel::Receiver<()>>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues the answer for the next dialog.
    pub fn answers(self, answer: &[(PermissionKind, bool)]) -> Self {
        self.replies.lock().unwrap().push_back(Ok(answer.to_vec()));
        self
    }

    /// Queues a failure for the next dialog.
    pub fn prompt_fails(self, err: PlatformError) -> Self {
        self.replies.lock().unwrap().push_back(Err(err));
        self
    }

    pub fn already_granted(self, kind: PermissionKind) -> Self {
        self.granted.lock().unwrap().insert(kind);
        self
    }

    /// Marks `kind` as explicitly refused in `grant_state`.
    pub fn refused(self, kind: PermissionKind) -> Self {
        self.reports(kind, GrantState::Denied)
    }

    /// `grant_state` answers `state` for `kind` regardless of the live table.
    pub fn reports(mut self, kind: PermissionKind, state: GrantState) -> Self {
        self.reported.insert(kind, state);
        self
    }

    /// The next `is_granted` read of `kind` says no; later reads see the live
    /// table again.
    pub fn misses_first_read(self, kind: PermissionKind) -> Self {
        self.first_read_misses.lock().unwrap().insert(kind);
        self
    }

    pub fn explains(mut self, kind: PermissionKind) -> Self {
        self.explains.insert(kind);
        self
    }

    /// The user flips `kind` on while in system settings.
    pub fn grants_in_settings(mut self, kind: PermissionKind) -> Self {
        self.granted_in_settings.insert(kind);
        self
    }

    /// A dialog grant for `kind` is gone again by the time anyone reads the
    /// live state, like a one-time grant revoked as the dialog closes.
    pub fn grant_does_not_stick(mut self, kind: PermissionKind) -> Self {
        self.not_sticky.insert(kind);
        self
    }

    pub fn without_runtime_request(mut self, kind: PermissionKind) -> Self {
        self.no_runtime.insert(kind);
        self
    }

    pub fn settings_fails(mut self, err: PlatformError) -> Self {
        self.settings_error = Some(err);
        self
    }

    pub fn explain_fails(mut self, err: PlatformError) -> Self {
        self.explain_error = Some(err);
        self
    }

    /// Holds every dialog open until a message arrives on the gate.
    pub fn gated(mut self, gate: async_channel::Receiver<()>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn prompts(&self) -> Vec<Vec<PermissionKind>> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Prompt(kinds) => Some(kinds),
                _ => None,
            })
            .collect()
    }

    pub fn settings_visits(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| **call == Call::Settings)
            .count()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn is_live_granted(&self, kind: PermissionKind) -> bool {
        self.granted.lock().unwrap().contains(&kind)
    }
}

impl PermissionStatusSource for ScriptedPlatform {
    async fn is_granted(&self, kind: PermissionKind) -> Result<bool, PlatformError> {
        self.record(Call::IsGranted(kind));
        if self.first_read_misses.lock().unwrap().remove(&kind) {
            return Ok(false);
        }
        Ok(self.is_live_granted(kind))
    }

    async fn should_explain(&self, kind: PermissionKind) -> Result<bool, PlatformError> {
        self.record(Call::ShouldExplain(kind));
        if let Some(err) = &self.explain_error {
            return Err(err.clone());
        }
        Ok(self.explains.contains(&kind))
    }

    async fn grant_state(&self, kind: PermissionKind) -> Result<GrantState, PlatformError> {
        self.record(Call::GrantState(kind));
        Ok(if let Some(&state) = self.reported.get(&kind) {
            state
        } else if self.is_live_granted(kind) {
            GrantState::Granted
        } else {
            GrantState::Undetermined
        })
    }

    fn requires_runtime_request(&self, kind: PermissionKind) -> bool {
        !self.no_runtime.contains(&kind)
    }
}

impl PermissionPrompter for ScriptedPlatform {
    async fn prompt(&self, kinds: &KindSet) -> Result<BTreeMap<PermissionKind, bool>, PlatformError> {
        self.record(Call::Prompt(kinds.iter().copied().collect()));
        if let Some(gate) = &self.gate {
            gate.recv()
                .await
                .map_err(|_| PlatformError::Cancelled)?;
        }

        let reply = self.replies.lock().unwrap().pop_front();
        let answers: BTreeMap<_, _> = match reply {
            Some(reply) => reply?.into_iter().collect(),
            None => kinds
                .iter()
                .map(|&kind| (kind, self.is_live_granted(kind)))
                .collect(),
        };

        let mut granted = self.granted.lock().unwrap();
        for (&kind, &yes) in &answers {
            if yes && !self.not_sticky.contains(&kind) {
                granted.insert(kind);
            }
        }
        Ok(answers)
    }

    async fn open_settings_and_await_return(&self) -> Result<(), PlatformError> {
        self.record(Call::Settings);
        if let Some(err) = &self.settings_error {
            return Err(err.clone());
        }
        let mut granted = self.granted.lock().unwrap();
        granted.extend(self.granted_in_settings.iter().copied());
        Ok(())
    }
}
