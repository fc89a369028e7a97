//! # Devicekit
//!
//! Runtime permission escalation and unified device state for mobile apps.
//!
//! Devicekit is modular. Enable only the features you need:
//!
//! - `permission`: request permissions with rationale retry and a settings
//!   fallback, plus the background-location dependent flow.
//! - `device`: a single [`Device`](device::Device) snapshot fed by battery,
//!   network, sound, locale, power and location monitors.
//!
//! Use the `full` feature to enable everything.
//!
//! ## Example
//!
//! ```toml
//! [dependencies]
//! devicekit = { version = "0.1", features = ["permission"] }
//! ```
//!
//! ```rust,ignore
//! use devicekit::permission::{Outcome, PermissionController};
//! use devicekit::permission::sys::SystemPermissions;
//!
//! async fn track() {
//!     let controller = PermissionController::new();
//!     let system = SystemPermissions;
//!     if let Ok(Outcome::Granted) = controller.request_location_always(&system, &system).await {
//!         println!("background location granted");
//!     }
//! }
//! ```

#[cfg(feature = "device")]
pub use devicekit_device as device;

#[cfg(feature = "permission")]
pub use devicekit_permission as permission;
