use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Local};

use crate::modules::dom::Element;

/// Id of the container toasts are appended into.
pub const TOAST_AREA_ID: &str = "toast-area";
/// Neutral treatment used when no style is given.
pub const DEFAULT_STYLE: &str = "bg-dark";
/// Lifetime of a toast before it is removed.
pub const DISMISS_AFTER: Duration = Duration::from_millis(5000);

const BASE_CLASSES: &str = "toast align-items-center text-white";
const TRAILING_CLASSES: &str = "border-0 show mb-2";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ToastId(u64);

impl ToastId {
    pub fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Id used to address the rendered element.
    pub fn dom_id(&self) -> String {
        format!("t{}", self.0)
    }
}

impl fmt::Display for ToastId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{}", self.0)
    }
}

/// How the message text is placed into the toast body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MessagePolicy {
    /// Inserted as markup, unchanged. Callers must only pass trusted content.
    #[default]
    Verbatim,
    /// Markup-significant characters are entity escaped.
    Escaped,
}

impl MessagePolicy {
    pub fn from_escape_flag(escape: bool) -> Self {
        if escape { Self::Escaped } else { Self::Verbatim }
    }

    fn apply<'a>(&self, message: &'a str) -> std::borrow::Cow<'a, str> {
        match self {
            Self::Verbatim => message.into(),
            Self::Escaped => escape_html(message).into(),
        }
    }
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

#[derive(Debug, Clone)]
pub struct Toast {
    id: ToastId,
    message: String,
    style: String,
    created_at: DateTime<Local>,
}

impl Toast {
    /// An empty or blank style falls back to [`DEFAULT_STYLE`].
    pub fn new(message: impl Into<String>, style: &str) -> Self {
        let style = style.trim();
        Self {
            id: ToastId::next(),
            message: message.into(),
            style: if style.is_empty() { DEFAULT_STYLE } else { style }.to_string(),
            created_at: Local::now(),
        }
    }

    pub fn with_default_style(message: impl Into<String>) -> Self {
        Self::new(message, DEFAULT_STYLE)
    }

    pub fn id(&self) -> ToastId {
        self.id
    }

    pub fn style(&self) -> &str {
        &self.style
    }

    pub fn created_at(&self) -> DateTime<Local> {
        self.created_at
    }

    /// Builds the alert element: a live region holding the message body and a
    /// close button wired through `data-bs-dismiss`.
    pub fn render(&self, policy: MessagePolicy) -> Element {
        let class_name = format!("{} {} {}", BASE_CLASSES, self.style, TRAILING_CLASSES);
        let mut el = Element::new("div")
            .with_id(self.id.dom_id())
            .with_classes(&class_name);
        el.set_attribute("role", "alert");
        el.set_attribute("aria-live", "assertive");
        el.set_attribute("aria-atomic", "true");
        el.set_inner_html(format!(
            r#"
    <div class="d-flex">
      <div class="toast-body">{}</div>
      <button type="button" class="btn-close btn-close-white me-2 m-auto" data-bs-dismiss="toast" aria-label="Close"></button>
    </div>
  "#,
            policy.apply(&self.message)
        ));
        el
    }
}
