use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_channel::{Receiver, Sender, bounded};
use log::{debug, warn};

use crate::monitor::{DeviceIdentityProvider, LocationMonitor, Monitor, NullMonitor, StateSink};
use crate::{
    BatteryStatus, Device, DeviceError, LocaleTimeState, Location, NetworkType, PowerState,
    SoundModeState, SoundVolume,
};

type Boxed<T> = Box<dyn Monitor<T>>;

/// Builder for [`DeviceManager`]. Monitors left unset report nothing.
#[derive(Debug)]
pub struct DeviceManagerBuilder {
    identity: Box<dyn DeviceIdentityProvider>,
    monitors: Monitors,
}

impl DeviceManagerBuilder {
    /// Sets the battery monitor.
    #[must_use]
    pub fn battery(mut self, monitor: impl Monitor<Option<BatteryStatus>> + 'static) -> Self {
        self.monitors.battery = Box::new(monitor);
        self
    }

    /// Sets the location monitor.
    #[must_use]
    pub fn location(mut self, monitor: impl LocationMonitor + 'static) -> Self {
        self.monitors.location = Box::new(monitor);
        self
    }

    /// Sets the volume monitor.
    #[must_use]
    pub fn volume(mut self, monitor: impl Monitor<Option<SoundVolume>> + 'static) -> Self {
        self.monitors.volume = Box::new(monitor);
        self
    }

    /// Sets the network monitor.
    #[must_use]
    pub fn network(mut self, monitor: impl Monitor<NetworkType> + 'static) -> Self {
        self.monitors.network = Box::new(monitor);
        self
    }

    /// Sets the locale and time zone monitor.
    #[must_use]
    pub fn locale_time(mut self, monitor: impl Monitor<LocaleTimeState> + 'static) -> Self {
        self.monitors.locale_time = Box::new(monitor);
        self
    }

    /// Sets the power-saving monitor.
    #[must_use]
    pub fn power(mut self, monitor: impl Monitor<Option<PowerState>> + 'static) -> Self {
        self.monitors.power = Box::new(monitor);
        self
    }

    /// Sets the ringer mode monitor.
    #[must_use]
    pub fn sound_mode(mut self, monitor: impl Monitor<Option<SoundModeState>> + 'static) -> Self {
        self.monitors.sound_mode = Box::new(monitor);
        self
    }

    /// Reads the identity and every monitor's current state once and builds
    /// the manager. Nothing is monitored until [`DeviceManager::start`].
    #[must_use]
    pub fn build(self) -> DeviceManager {
        let mut device = Device {
            identity: self.identity.read_identity(),
            ..Device::default()
        };
        self.monitors.read_into(&mut device);
        DeviceManager {
            monitors: self.monitors,
            shared: Arc::new(Shared {
                device: Mutex::new(device),
                subscribers: Mutex::new(Vec::new()),
            }),
            started: AtomicBool::new(false),
        }
    }
}

#[derive(Debug)]
struct Monitors {
    battery: Boxed<Option<BatteryStatus>>,
    location: Box<dyn LocationMonitor>,
    volume: Boxed<Option<SoundVolume>>,
    network: Boxed<NetworkType>,
    locale_time: Boxed<LocaleTimeState>,
    power: Boxed<Option<PowerState>>,
    sound_mode: Boxed<Option<SoundModeState>>,
}

impl Default for Monitors {
    fn default() -> Self {
        Self {
            battery: Box::new(NullMonitor::<Option<BatteryStatus>>::new()),
            location: Box::new(NullMonitor::<Option<Location>>::new()),
            volume: Box::new(NullMonitor::<Option<SoundVolume>>::new()),
            network: Box::new(NullMonitor::<NetworkType>::new()),
            locale_time: Box::new(NullMonitor::<LocaleTimeState>::new()),
            power: Box::new(NullMonitor::<Option<PowerState>>::new()),
            sound_mode: Box::new(NullMonitor::<Option<SoundModeState>>::new()),
        }
    }
}

impl Monitors {
    fn read_into(&self, device: &mut Device) {
        device.battery_status = self.battery.current();
        device.location = self.location.current();
        device.sound_volume = self.volume.current();
        device.network_type = self.network.current();
        device.locale_time_state = self.locale_time.current();
        device.power_state = self.power.current();
        device.sound_mode_state = self.sound_mode.current();
    }
}

#[derive(Debug)]
struct Shared {
    device: Mutex<Device>,
    subscribers: Mutex<Vec<Sender<Device>>>,
}

impl Shared {
    fn update(&self, apply: impl FnOnce(&mut Device)) {
        let mut device = lock(&self.device);
        apply(&mut device);
        // Broadcast under the snapshot lock so subscribers see updates in order.
        // A subscriber that has not read yet gets its stale snapshot replaced.
        lock(&self.subscribers).retain(|subscriber| subscriber.force_send(device.clone()).is_ok());
    }
}

/// Keeps a [`Device`] snapshot current from a set of monitors.
#[derive(Debug)]
pub struct DeviceManager {
    monitors: Monitors,
    shared: Arc<Shared>,
    started: AtomicBool,
}

impl DeviceManager {
    /// Starts building a manager around `identity`.
    #[must_use]
    pub fn builder(identity: impl DeviceIdentityProvider + 'static) -> DeviceManagerBuilder {
        DeviceManagerBuilder {
            identity: Box::new(identity),
            monitors: Monitors::default(),
        }
    }

    /// Current snapshot.
    #[must_use]
    pub fn device(&self) -> Device {
        lock(&self.shared.device).clone()
    }

    /// Whether monitoring is running.
    #[must_use]
    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::Acquire)
    }

    /// Receives the current snapshot immediately, then every change until
    /// [`DeviceManager::stop`].
    ///
    /// The subscription holds at most one snapshot. A reader that falls
    /// behind skips straight to the newest state.
    #[must_use]
    pub fn subscribe(&self) -> Receiver<Device> {
        let (sender, receiver) = bounded(1);
        let device = lock(&self.shared.device);
        if sender.force_send(device.clone()).is_ok() {
            lock(&self.shared.subscribers).push(sender);
        }
        receiver
    }

    /// Refreshes the snapshot and starts every monitor. Calling it while
    /// already started does nothing.
    ///
    /// A monitor that fails to start is logged and left out; its field keeps
    /// the last value read.
    pub fn start(&self) {
        if self
            .started
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }
        debug!("starting device monitors");

        let mut fresh = self.device();
        self.monitors.read_into(&mut fresh);
        self.shared.update(|device| *device = fresh);

        let monitors = &self.monitors;
        report(
            "battery",
            monitors.battery.start(self.sink(|device, state| device.battery_status = state)),
        );
        report(
            "location",
            monitors.location.start(self.sink(|device, state| device.location = state)),
        );
        report(
            "volume",
            monitors.volume.start(self.sink(|device, state| device.sound_volume = state)),
        );
        report(
            "network",
            monitors.network.start(self.sink(|device, state| device.network_type = state)),
        );
        report(
            "locale_time",
            monitors
                .locale_time
                .start(self.sink(|device, state| device.locale_time_state = state)),
        );
        report(
            "power",
            monitors.power.start(self.sink(|device, state| device.power_state = state)),
        );
        report(
            "sound_mode",
            monitors
                .sound_mode
                .start(self.sink(|device, state| device.sound_mode_state = state)),
        );
    }

    /// Stops every monitor and closes all subscriptions. Calling it while
    /// stopped does nothing.
    pub fn stop(&self) {
        if self
            .started
            .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }
        debug!("stopping device monitors");

        self.monitors.battery.stop();
        self.monitors.location.stop();
        self.monitors.volume.stop();
        self.monitors.network.stop();
        self.monitors.locale_time.stop();
        self.monitors.power.stop();
        self.monitors.sound_mode.stop();
        lock(&self.shared.subscribers).clear();
    }

    /// Switches continuous location updates on or off. Failures are logged
    /// and otherwise ignored.
    pub fn enable_live_location(&self, enable: bool) {
        if let Err(err) = self.monitors.location.enable_live_tracking(enable) {
            warn!("could not switch live location to {enable}: {err}");
        }
    }

    fn sink<T: 'static>(&self, apply: fn(&mut Device, T)) -> StateSink<T> {
        let shared = Arc::clone(&self.shared);
        StateSink::new(move |state| shared.update(|device| apply(device, state)))
    }
}

fn report(name: &str, result: Result<(), DeviceError>) {
    if let Err(err) = result {
        warn!("{name} monitor did not start: {err}");
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
