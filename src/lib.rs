//! Transient toast notifications rendered into a host region.
//!
//! A [`Notifier`] appends an alert element to its injected host region and
//! removes it again once the dismiss delay has elapsed.

pub mod config;
pub mod modules;

pub use config::{Config, ToastSettings};
pub use modules::dom::{Document, Element, HostRegion};
pub use modules::notifier::Notifier;
pub use modules::toast::{DEFAULT_STYLE, DISMISS_AFTER, MessagePolicy, TOAST_AREA_ID, Toast, ToastId};
