use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep_until};

use crate::config::ToastSettings;
use crate::modules::dom::{Document, HostRegion, WeakHostRegion};
use crate::modules::toast::Toast;

/// A toast still waiting for its removal timer.
struct Scheduled {
    task: JoinHandle<()>,
    // Region the toast was appended to; the notifier's host may change later.
    region: WeakHostRegion,
    shown_at: DateTime<Local>,
}

type Timers = Arc<Mutex<HashMap<String, Scheduled>>>;

/// Renders toasts into a host region and removes each one after the
/// configured delay.
///
/// The host is injected rather than looked up on every call. A notifier
/// without a host accepts every call and does nothing.
pub struct Notifier {
    host: Option<HostRegion>,
    settings: ToastSettings,
    runtime: Handle,
    timers: Timers,
}

impl Notifier {
    /// Must be called from inside a tokio runtime; removals are spawned on it.
    pub fn new(host: Option<HostRegion>, settings: ToastSettings) -> Result<Self> {
        let runtime = Handle::try_current().context("Toast notifier needs a running tokio runtime")?;
        Ok(Self {
            host,
            settings,
            runtime,
            timers: Arc::new(Mutex::new(HashMap::new())),
        })
    }

    /// Resolves the host by the configured area id. A missing region is not an
    /// error.
    pub fn from_document(document: &Document, settings: ToastSettings) -> Result<Self> {
        let host = document.get_element_by_id(&settings.area_id);
        Self::new(host, settings)
    }

    pub fn host(&self) -> Option<&HostRegion> {
        self.host.as_ref()
    }

    /// Re-binds where new toasts go. Toasts already shown keep their timers
    /// and are still removed from the region they were appended to.
    pub fn set_host(&mut self, host: Option<HostRegion>) {
        self.host = host;
    }

    pub fn settings(&self) -> &ToastSettings {
        &self.settings
    }

    pub fn notify(&self, message: impl Into<String>) {
        let style = self.settings.default_style.clone();
        self.notify_with(message, &style);
    }

    pub fn notify_with(&self, message: impl Into<String>, style: &str) {
        let Some(host) = &self.host else {
            return;
        };

        let toast = Toast::new(message, style);
        let dom_id = toast.id().dom_id();
        host.append_child(toast.render(self.settings.message_policy()));

        let deadline = Instant::now() + self.settings.dismiss_after();
        let timers = Arc::clone(&self.timers);
        let key = dom_id.clone();
        // Held until the spawned task is registered so it cannot finish first.
        let mut pending = lock(&self.timers);
        let task = self.runtime.spawn(async move {
            sleep_until(deadline).await;
            let entry = lock(&timers).remove(&key);
            let Some(region) = entry.and_then(|e| e.region.upgrade()) else {
                return;
            };
            if region.remove_child(&key) {
                tracing::debug!(toast = %key, area = region.id(), "toast expired");
            }
        });
        pending.insert(
            dom_id.clone(),
            Scheduled {
                task,
                region: host.downgrade(),
                shown_at: toast.created_at(),
            },
        );
        drop(pending);

        tracing::debug!(
            toast = %dom_id,
            style = toast.style(),
            after_ms = self.settings.dismiss_after_ms,
            "toast shown"
        );
    }

    /// Removes a toast before its timer fires and cancels that timer.
    /// Returns `false` if the toast is already gone.
    pub fn dismiss(&self, dom_id: &str) -> bool {
        let removed = match lock(&self.timers).remove(dom_id) {
            Some(scheduled) => {
                scheduled.task.abort();
                scheduled
                    .region
                    .upgrade()
                    .is_some_and(|region| region.remove_child(dom_id))
            }
            None => self.host.as_ref().is_some_and(|h| h.remove_child(dom_id)),
        };
        if removed {
            tracing::debug!(toast = %dom_id, "toast dismissed");
        }
        removed
    }

    /// When a toast that is still waiting for removal was shown.
    pub fn shown_at(&self, dom_id: &str) -> Option<DateTime<Local>> {
        lock(&self.timers).get(dom_id).map(|s| s.shown_at)
    }

    /// Removals scheduled but not yet run.
    pub fn pending(&self) -> usize {
        lock(&self.timers).len()
    }
}

fn lock(timers: &Timers) -> MutexGuard<'_, HashMap<String, Scheduled>> {
    timers.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::toast::{DEFAULT_STYLE, TOAST_AREA_ID};
    use std::time::Duration;

    fn document_with_area() -> (Document, HostRegion) {
        let host = HostRegion::new(TOAST_AREA_ID);
        let mut doc = Document::new();
        doc.insert(host.clone());
        (doc, host)
    }

    async fn settle() {
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }
    }

    fn only_child_id(host: &HostRegion) -> String {
        let children = host.children();
        assert_eq!(children.len(), 1);
        children[0].id().map(str::to_string).unwrap_or_default()
    }

    #[tokio::test]
    async fn appends_one_child_with_message_and_style() {
        let (doc, host) = document_with_area();
        let notifier = Notifier::from_document(&doc, ToastSettings::default()).unwrap();

        notifier.notify_with("Saved", "bg-success");

        let children = host.children();
        assert_eq!(children.len(), 1);
        assert!(children[0].text_content().contains("Saved"));
        assert!(children[0].has_class("bg-success"));
    }

    #[tokio::test]
    async fn missing_host_is_a_silent_noop() {
        let doc = Document::new();
        let notifier = Notifier::from_document(&doc, ToastSettings::default()).unwrap();

        notifier.notify("x");

        assert!(notifier.host().is_none());
        assert_eq!(notifier.pending(), 0);
        assert!(doc.get_element_by_id(TOAST_AREA_ID).is_none());
    }

    #[tokio::test]
    async fn other_regions_are_untouched() {
        let mut doc = Document::new();
        let elsewhere = HostRegion::new("sidebar");
        doc.insert(elsewhere.clone());
        let notifier = Notifier::from_document(&doc, ToastSettings::default()).unwrap();

        notifier.notify("x");

        assert!(elsewhere.is_empty());
    }

    #[tokio::test]
    async fn toasts_stack_in_call_order() {
        let (_doc, host) = document_with_area();
        let notifier = Notifier::new(Some(host.clone()), ToastSettings::default()).unwrap();

        notifier.notify("A");
        notifier.notify("B");

        let texts: Vec<_> = host.children().iter().map(|c| c.text_content()).collect();
        assert_eq!(texts, ["A", "B"]);
    }

    #[tokio::test]
    async fn default_style_is_applied() {
        let (_doc, host) = document_with_area();
        let notifier = Notifier::new(Some(host.clone()), ToastSettings::default()).unwrap();

        notifier.notify("x");

        assert!(host.children()[0].has_class(DEFAULT_STYLE));
    }

    #[tokio::test(start_paused = true)]
    async fn removed_after_five_seconds() {
        let (_doc, host) = document_with_area();
        let notifier = Notifier::new(Some(host.clone()), ToastSettings::default()).unwrap();

        notifier.notify("gone soon");
        let id = only_child_id(&host);

        tokio::time::advance(Duration::from_millis(5000)).await;
        settle().await;

        assert!(!host.contains(&id));
        assert_eq!(notifier.pending(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn still_present_before_timeout() {
        let (_doc, host) = document_with_area();
        let notifier = Notifier::new(Some(host.clone()), ToastSettings::default()).unwrap();

        notifier.notify("still here");
        let id = only_child_id(&host);

        tokio::time::advance(Duration::from_millis(4999)).await;
        settle().await;

        assert!(host.contains(&id));
        assert!(host.contains(&id));
        assert_eq!(notifier.pending(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn each_toast_runs_its_own_timer() {
        let (_doc, host) = document_with_area();
        let notifier = Notifier::new(Some(host.clone()), ToastSettings::default()).unwrap();

        notifier.notify("first");
        tokio::time::advance(Duration::from_millis(2000)).await;
        notifier.notify("second");

        tokio::time::advance(Duration::from_millis(3000)).await;
        settle().await;
        let texts: Vec<_> = host.children().iter().map(|c| c.text_content()).collect();
        assert_eq!(texts, ["second"]);

        tokio::time::advance(Duration::from_millis(2000)).await;
        settle().await;
        assert!(host.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn dismiss_removes_and_cancels_timer() {
        let (_doc, host) = document_with_area();
        let notifier = Notifier::new(Some(host.clone()), ToastSettings::default()).unwrap();

        notifier.notify("bye");
        let id = only_child_id(&host);

        assert!(notifier.dismiss(&id));
        assert!(host.is_empty());
        assert_eq!(notifier.pending(), 0);
        assert!(!notifier.dismiss(&id));

        tokio::time::advance(Duration::from_millis(5000)).await;
        settle().await;
        assert!(host.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn timer_is_noop_after_region_teardown() {
        let (mut doc, host) = document_with_area();
        let mut notifier = Notifier::from_document(&doc, ToastSettings::default()).unwrap();
        notifier.notify("orphan");
        let weak = host.downgrade();
        assert_eq!(notifier.pending(), 1);

        notifier.set_host(None);
        drop(host);
        drop(doc.remove(TOAST_AREA_ID));
        assert!(weak.upgrade().is_none());

        tokio::time::advance(Duration::from_millis(5000)).await;
        settle().await;

        assert_eq!(notifier.pending(), 0);
        assert!(weak.upgrade().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn dismiss_after_rebinding_host_removes_from_original_region() {
        let old = HostRegion::new(TOAST_AREA_ID);
        let new = HostRegion::new(TOAST_AREA_ID);
        let mut notifier = Notifier::new(Some(old.clone()), ToastSettings::default()).unwrap();
        notifier.notify("moved away");
        let id = only_child_id(&old);

        notifier.set_host(Some(new.clone()));
        assert!(notifier.dismiss(&id));
        assert!(!old.contains(&id));
        assert_eq!(notifier.pending(), 0);

        tokio::time::advance(Duration::from_millis(10_000)).await;
        settle().await;
        assert!(old.is_empty());
        assert!(new.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn timer_removes_from_original_region_after_rebinding_host() {
        let old = HostRegion::new(TOAST_AREA_ID);
        let mut notifier = Notifier::new(Some(old.clone()), ToastSettings::default()).unwrap();
        notifier.notify("left behind");

        notifier.set_host(Some(HostRegion::new("elsewhere")));
        tokio::time::advance(Duration::from_millis(5000)).await;
        settle().await;

        assert!(old.is_empty());
        assert_eq!(notifier.pending(), 0);
    }

    #[tokio::test]
    async fn shown_at_tracks_pending_toasts_only() {
        let (_doc, host) = document_with_area();
        let notifier = Notifier::new(Some(host.clone()), ToastSettings::default()).unwrap();

        let before = Local::now();
        notifier.notify("x");
        let id = only_child_id(&host);

        let shown = notifier.shown_at(&id).unwrap();
        assert!(shown >= before && shown <= Local::now());

        notifier.dismiss(&id);
        assert!(notifier.shown_at(&id).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn configured_delay_and_escaping_are_honored() {
        let (_doc, host) = document_with_area();
        let settings = ToastSettings { dismiss_after_ms: 1000, escape_messages: true, ..ToastSettings::default() };
        let notifier = Notifier::new(Some(host.clone()), settings).unwrap();

        notifier.notify("<script>");
        assert!(host.children()[0].inner_html().contains("&lt;script&gt;"));

        tokio::time::advance(Duration::from_millis(1000)).await;
        settle().await;
        assert!(host.is_empty());
    }

    #[test]
    fn construction_outside_runtime_fails() {
        let err = Notifier::new(None, ToastSettings::default()).err().map(|e| e.to_string());
        assert_eq!(err.as_deref(), Some("Toast notifier needs a running tokio runtime"));
    }
}
