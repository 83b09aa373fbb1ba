use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

/// A single node in the host tree. Content below the element itself is kept
/// as raw markup, the way it would be assigned through `innerHTML`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    tag: String,
    id: Option<String>,
    classes: Vec<String>,
    attributes: Vec<(String, String)>,
    inner_html: String,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            id: None,
            classes: Vec::new(),
            attributes: Vec::new(),
            inner_html: String::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Sets the class list from a whitespace separated string, like `className`.
    pub fn with_classes(mut self, class_name: &str) -> Self {
        self.classes = class_name.split_whitespace().map(str::to_string).collect();
        self
    }

    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(n, _)| *n == name) {
            Some((_, v)) => *v = value,
            None => self.attributes.push((name, value)),
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn attributes(&self) -> &[(String, String)] {
        &self.attributes
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn has_class(&self, token: &str) -> bool {
        self.classes.iter().any(|c| c == token)
    }

    pub fn inner_html(&self) -> &str {
        &self.inner_html
    }

    pub fn set_inner_html(&mut self, markup: impl Into<String>) {
        self.inner_html = markup.into();
    }

    /// Visible text of the element: markup with tags dropped and runs of
    /// whitespace collapsed to a single space.
    pub fn text_content(&self) -> String {
        let mut text = String::with_capacity(self.inner_html.len());
        let mut in_tag = false;
        for ch in self.inner_html.chars() {
            match ch {
                '<' => in_tag = true,
                '>' if in_tag => {
                    in_tag = false;
                    text.push(' ');
                }
                _ if !in_tag => text.push(ch),
                _ => {}
            }
        }
        text.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    pub fn outer_html(&self) -> String {
        let mut out = format!("<{}", self.tag);
        if let Some(id) = &self.id {
            out.push_str(&format!(" id=\"{}\"", id));
        }
        if !self.classes.is_empty() {
            out.push_str(&format!(" class=\"{}\"", self.classes.join(" ")));
        }
        for (name, value) in &self.attributes {
            out.push_str(&format!(" {}=\"{}\"", name, value));
        }
        out.push('>');
        out.push_str(&self.inner_html);
        out.push_str(&format!("</{}>", self.tag));
        out
    }
}

#[derive(Debug)]
struct RegionInner {
    id: String,
    children: Mutex<Vec<Element>>,
}

/// Shared handle to a container element that toasts are appended into.
/// Clones address the same region.
#[derive(Debug, Clone)]
pub struct HostRegion {
    inner: Arc<RegionInner>,
}

/// Non-owning handle used by deferred work; it stops resolving once the
/// region has been torn down.
#[derive(Debug, Clone)]
pub struct WeakHostRegion {
    inner: Weak<RegionInner>,
}

impl WeakHostRegion {
    pub fn upgrade(&self) -> Option<HostRegion> {
        self.inner.upgrade().map(|inner| HostRegion { inner })
    }
}

impl HostRegion {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(RegionInner {
                id: id.into(),
                children: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn id(&self) -> &str {
        &self.inner.id
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Element>> {
        self.inner
            .children
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn append_child(&self, element: Element) {
        self.lock().push(element);
    }

    /// Removes the child with the given id. Returns `false` when no such child
    /// is attached anymore.
    pub fn remove_child(&self, id: &str) -> bool {
        let mut children = self.lock();
        match children.iter().position(|c| c.id() == Some(id)) {
            Some(pos) => {
                children.remove(pos);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.lock().iter().any(|c| c.id() == Some(id))
    }

    pub fn children(&self) -> Vec<Element> {
        self.lock().clone()
    }

    pub fn last_child_id(&self) -> Option<String> {
        self.lock().last().and_then(|c| c.id().map(str::to_string))
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn downgrade(&self) -> WeakHostRegion {
        WeakHostRegion {
            inner: Arc::downgrade(&self.inner),
        }
    }
}

/// Registry of addressable regions, standing in for the page document.
#[derive(Debug, Default)]
pub struct Document {
    regions: HashMap<String, HostRegion>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, region: HostRegion) {
        self.regions.insert(region.id().to_string(), region);
    }

    pub fn remove(&mut self, id: &str) -> Option<HostRegion> {
        self.regions.remove(id)
    }

    pub fn get_element_by_id(&self, id: &str) -> Option<HostRegion> {
        self.regions.get(id).cloned()
    }
}
