//! Single-slot reservations that keep two dialogs for the same permission
//! from being in flight at once.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::{PermissionError, PermissionKind};

/// Tracks which permission kinds currently have a request in flight.
///
/// Reservation never blocks: an overlapping request is rejected immediately
/// so the caller can show a "please wait" state instead of queueing behind a
/// dialog the user has not dismissed yet.
#[derive(Clone, Default)]
pub struct InFlightGuard {
    reserved: Arc<AtomicU32>,
}

impl InFlightGuard {
    /// Creates a guard with no reservations.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserves every kind in `kinds`, or none of them.
    ///
    /// # Errors
    /// Returns [`PermissionError::ConcurrentRequestRejected`] listing the kinds
    /// already held by another request.
    pub fn try_reserve(
        &self,
        kinds: impl IntoIterator<Item = PermissionKind>,
    ) -> Result<GuardToken, PermissionError> {
        let mask = kinds.into_iter().fold(0, |mask, kind| mask | kind.bit());
        let mut current = self.reserved.load(Ordering::Acquire);
        loop {
            let overlap = current & mask;
            if overlap != 0 {
                return Err(PermissionError::ConcurrentRequestRejected {
                    kinds: kinds_in(overlap),
                });
            }
            match self.reserved.compare_exchange_weak(
                current,
                current | mask,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => break,
                Err(actual) => current = actual,
            }
        }
        Ok(GuardToken {
            reserved: Arc::clone(&self.reserved),
            mask,
        })
    }

    /// Whether a request for `kind` is in flight.
    #[must_use]
    pub fn is_reserved(&self, kind: PermissionKind) -> bool {
        self.reserved.load(Ordering::Acquire) & kind.bit() != 0
    }
}

impl fmt::Debug for InFlightGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InFlightGuard")
            .field(
                "reserved",
                &kinds_in(self.reserved.load(Ordering::Acquire)),
            )
            .finish()
    }
}

/// Proof of a reservation. Dropping it releases the kinds, including when the
/// owning future is dropped mid-dialog.
#[must_use = "the reservation is released as soon as the token is dropped"]
pub struct GuardToken {
    reserved: Arc<AtomicU32>,
    mask: u32,
}

impl GuardToken {
    /// Kinds held by this token.
    #[must_use]
    pub fn kinds(&self) -> Vec<PermissionKind> {
        kinds_in(self.mask)
    }
}

impl Drop for GuardToken {
    fn drop(&mut self) {
        self.reserved.fetch_and(!self.mask, Ordering::AcqRel);
    }
}

impl fmt::Debug for GuardToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GuardToken")
            .field("kinds", &self.kinds())
            .finish()
    }
}

fn kinds_in(mask: u32) -> Vec<PermissionKind> {
    PermissionKind::ALL
        .into_iter()
        .filter(|kind| mask & kind.bit() != 0)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use PermissionKind::{BackgroundLocation, Camera, ForegroundLocation, Notifications};

    #[test]
    fn overlapping_reservation_is_rejected() {
        let guard = InFlightGuard::new();
        let _held = guard
            .try_reserve([ForegroundLocation, BackgroundLocation])
            .unwrap();

        let err = guard
            .try_reserve([BackgroundLocation, Notifications])
            .unwrap_err();
        assert_eq!(
            err,
            PermissionError::ConcurrentRequestRejected {
                kinds: vec![BackgroundLocation]
            }
        );
        // A rejected attempt must not leave a partial reservation behind.
        assert!(!guard.is_reserved(Notifications));
    }

    #[test]
    fn disjoint_reservations_coexist() {
        let guard = InFlightGuard::new();
        let location = guard.try_reserve([ForegroundLocation]).unwrap();
        let camera = guard.try_reserve([Camera]).unwrap();

        assert_eq!(location.kinds(), vec![ForegroundLocation]);
        assert_eq!(camera.kinds(), vec![Camera]);
        assert!(guard.is_reserved(ForegroundLocation));
        assert!(guard.is_reserved(Camera));
    }

    #[test]
    fn dropping_token_releases_only_its_kinds() {
        let guard = InFlightGuard::new();
        let location = guard.try_reserve([ForegroundLocation]).unwrap();
        let camera = guard.try_reserve([Camera]).unwrap();

        drop(location);
        assert!(!guard.is_reserved(ForegroundLocation));
        assert!(guard.is_reserved(Camera));

        drop(camera);
        assert!(guard.try_reserve(PermissionKind::ALL).is_ok());
    }

    #[test]
    fn contended_reservation_has_single_winner() {
        let guard = InFlightGuard::new();
        let winners = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| scope.spawn(|| guard.try_reserve([Notifications]).ok()))
                .collect();
            handles
                .into_iter()
                .filter_map(|handle| handle.join().unwrap())
                .collect::<Vec<_>>()
        });
        assert_eq!(winners.len(), 1);
    }
}
