pub mod dom;
pub mod notifier;
pub mod toast;
