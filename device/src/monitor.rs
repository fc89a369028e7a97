//! Capability traits for platform state sources.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::{DeviceError, DeviceIdentity, Location};

/// Receives state changes from a running [`Monitor`].
pub struct StateSink<T> {
    apply: Arc<dyn Fn(T) + Send + Sync>,
}

impl<T> StateSink<T> {
    /// Wraps a callback that is invoked with every new state.
    pub fn new(apply: impl Fn(T) + Send + Sync + 'static) -> Self {
        Self {
            apply: Arc::new(apply),
        }
    }

    /// Publishes a new state.
    pub fn emit(&self, state: T) {
        (self.apply)(state);
    }
}

impl<T> Clone for StateSink<T> {
    fn clone(&self) -> Self {
        Self {
            apply: Arc::clone(&self.apply),
        }
    }
}

impl<T> fmt::Debug for StateSink<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateSink").finish_non_exhaustive()
    }
}

/// A source of one piece of device state, such as a battery broadcast
/// receiver or a connectivity callback.
pub trait Monitor<T>: Send + Sync + fmt::Debug {
    /// The state right now, readable before and after monitoring.
    fn current(&self) -> T;

    /// Starts pushing changes into `sink` until [`Monitor::stop`].
    ///
    /// # Errors
    /// Returns [`DeviceError::Monitor`] if the platform source cannot be
    /// registered.
    fn start(&self, sink: StateSink<T>) -> Result<(), DeviceError>;

    /// Stops pushing changes and releases platform registrations.
    fn stop(&self);
}

/// Location monitor with an optional high-frequency mode.
pub trait LocationMonitor: Monitor<Option<Location>> {
    /// Switches continuous location updates on or off.
    ///
    /// # Errors
    /// Returns [`DeviceError::LiveLocationUnavailable`] if location services or
    /// the location permission are missing.
    fn enable_live_tracking(&self, enable: bool) -> Result<(), DeviceError>;
}

/// Supplies the static device identity.
pub trait DeviceIdentityProvider: Send + Sync + fmt::Debug {
    /// Reads platform, model and app version information.
    fn read_identity(&self) -> DeviceIdentity;
}

/// Monitor for state the platform does not expose. Always reports the
/// default value and never emits.
pub struct NullMonitor<T>(PhantomData<fn() -> T>);

impl<T> NullMonitor<T> {
    /// Creates the monitor.
    #[must_use]
    pub const fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> Default for NullMonitor<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for NullMonitor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("NullMonitor")
    }
}

impl<T: Default> Monitor<T> for NullMonitor<T> {
    fn current(&self) -> T {
        T::default()
    }

    fn start(&self, _sink: StateSink<T>) -> Result<(), DeviceError> {
        Ok(())
    }

    fn stop(&self) {}
}

impl LocationMonitor for NullMonitor<Option<Location>> {
    fn enable_live_tracking(&self, _enable: bool) -> Result<(), DeviceError> {
        Err(DeviceError::LiveLocationUnavailable(
            "no location monitor configured".into(),
        ))
    }
}
