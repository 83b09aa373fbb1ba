use anyhow::Result;
use chrono::{DateTime, Local};
use std::time::Duration;

use toaster::{Config, Document, Element, HostRegion, Notifier};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AppState {
    Normal,
    Input,
}

const SAMPLES: &[&str] = &[
    "Saved",
    "Settings updated",
    "Member record created",
    "Upload finished",
    "Connection lost, retrying",
];

pub struct App {
    pub state: AppState,
    pub input_buffer: String,
    pub input_cursor: usize,
    pub status_message: String,
    pub show_detail: bool,
    pub show_help: bool,
    pub styles: Vec<String>,
    pub selected_style: usize,

    document: Document,
    notifier: Notifier,
    // Region taken out of the document while detached; re-inserted on attach.
    detached: Option<HostRegion>,
    area_id: String,
    samples_sent: usize,
}

impl App {
    pub fn new(config: Config) -> Result<Self> {
        let area_id = config.toast.area_id.clone();
        let mut document = Document::new();
        document.insert(HostRegion::new(area_id.clone()));
        let notifier = Notifier::from_document(&document, config.toast.clone())?;

        Ok(Self {
            state: AppState::Normal,
            input_buffer: String::new(),
            input_cursor: 0,
            status_message: String::from("Welcome to toaster! Press '?' for help"),
            show_detail: false,
            show_help: false,
            styles: config.ui.styles.clone(),
            selected_style: 0,
            document,
            notifier,
            detached: None,
            area_id,
            samples_sent: 0,
        })
    }

    pub fn current_style(&self) -> &str {
        self.styles
            .get(self.selected_style)
            .map(String::as_str)
            .unwrap_or(self.notifier.settings().default_style.as_str())
    }

    pub fn next_style(&mut self) {
        if !self.styles.is_empty() {
            self.selected_style = (self.selected_style + 1) % self.styles.len();
        }
    }

    pub fn previous_style(&mut self) {
        let len = self.styles.len();
        if len > 0 {
            self.selected_style = if self.selected_style == 0 { len - 1 } else { self.selected_style - 1 };
        }
    }

    pub fn select_style(&mut self, index: usize) {
        if index < self.styles.len() {
            self.selected_style = index;
        }
    }

    pub fn toggle_detail(&mut self) {
        self.show_detail = !self.show_detail;
    }

    pub fn host_attached(&self) -> bool {
        self.notifier.host().is_some()
    }

    pub fn area_id(&self) -> &str {
        &self.area_id
    }

    pub fn dismiss_after(&self) -> Duration {
        self.notifier.settings().dismiss_after()
    }

    /// Toasts currently in the host region, oldest first. Empty while detached.
    pub fn toasts(&self) -> Vec<Element> {
        self.notifier.host().map(HostRegion::children).unwrap_or_default()
    }

    pub fn pending_removals(&self) -> usize {
        self.notifier.pending()
    }

    /// Time left before `toast` expires. `None` once its timer has run.
    pub fn remaining(&self, toast: &Element, now: DateTime<Local>) -> Option<Duration> {
        let created = self.notifier.shown_at(toast.id()?)?;
        let age = now.signed_duration_since(created).to_std().unwrap_or_default();
        Some(self.dismiss_after().saturating_sub(age))
    }

    pub fn send(&mut self, message: &str) {
        let style = self.current_style().to_string();
        self.notifier.notify_with(message, &style);
        self.status_message = if self.host_attached() {
            format!("Sent [{}] {}", style, message)
        } else {
            format!("No #{} region, nothing shown", self.area_id)
        };
    }

    pub fn send_sample(&mut self) {
        let message = SAMPLES[self.samples_sent % SAMPLES.len()];
        self.samples_sent += 1;
        self.send(message);
    }

    pub fn dismiss_latest(&mut self) {
        let latest = self.notifier.host().and_then(HostRegion::last_child_id);
        match latest {
            Some(id) if self.notifier.dismiss(&id) => {
                self.status_message = format!("Dismissed {}", id);
            }
            _ => self.status_message = "Nothing to dismiss".to_string(),
        }
    }

    /// Takes the toast area out of the document, or puts it back. The notifier
    /// resolves its host through the document either way.
    pub fn toggle_host(&mut self) {
        match self.detached.take() {
            Some(region) => {
                self.document.insert(region);
                self.status_message = format!("#{} attached", self.area_id);
            }
            None => {
                self.detached = self.document.remove(&self.area_id);
                self.status_message = format!("#{} detached, toasts are dropped", self.area_id);
            }
        }
        self.notifier.set_host(self.document.get_element_by_id(&self.area_id));
    }

    // Compose mode
    pub fn open_input(&mut self) {
        self.state = AppState::Input;
        self.input_buffer.clear();
        self.input_cursor = 0;
    }

    pub fn cancel_input(&mut self) {
        self.state = AppState::Normal;
        self.input_buffer.clear();
        self.input_cursor = 0;
    }

    pub fn submit_input(&mut self) {
        let message = self.input_buffer.trim().to_string();
        self.cancel_input();
        if message.is_empty() {
            self.status_message = "Empty message, nothing sent".to_string();
            return;
        }
        self.send(&message);
    }

    fn byte_cursor(&self) -> usize {
        self.input_buffer
            .char_indices()
            .nth(self.input_cursor)
            .map(|(i, _)| i)
            .unwrap_or(self.input_buffer.len())
    }

    pub fn input_char(&mut self, c: char) {
        let at = self.byte_cursor();
        self.input_buffer.insert(at, c);
        self.input_cursor += 1;
    }

    pub fn input_backspace(&mut self) {
        if self.input_cursor > 0 {
            self.input_cursor -= 1;
            let at = self.byte_cursor();
            self.input_buffer.remove(at);
        }
    }

    pub fn input_move_left(&mut self) {
        if self.input_cursor > 0 {
            self.input_cursor -= 1;
        }
    }

    pub fn input_move_right(&mut self) {
        if self.input_cursor < self.input_buffer.chars().count() {
            self.input_cursor += 1;
        }
    }
}
