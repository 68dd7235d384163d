use std::time::{Duration, Instant};

use eframe::egui;
use egui::Color32;

use crate::validation::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Success,
    Error,
}

impl StatusLevel {
    fn color(&self) -> Color32 {
        match self {
            StatusLevel::Info => Color32::from_rgb(0x60, 0xa5, 0xfa),
            StatusLevel::Success => Color32::from_rgb(0x34, 0xd3, 0x99),
            StatusLevel::Error => Color32::from_rgb(0xf8, 0x71, 0x71),
        }
    }

    fn icon(&self) -> &'static str {
        match self {
            StatusLevel::Info => "ⓘ",
            StatusLevel::Success => "✓",
            StatusLevel::Error => "✗",
        }
    }
}

/// Inline message under a form or toolbar. Messages built with
/// [`expires_after`](Self::expires_after) hide themselves.
#[derive(Debug, Clone)]
pub struct StatusMessage {
    pub level: StatusLevel,
    pub message: String,
    expires_at: Option<Instant>,
}

impl StatusMessage {
    pub fn info(message: impl Into<String>) -> Self {
        Self::with_level(StatusLevel::Info, message)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::with_level(StatusLevel::Success, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::with_level(StatusLevel::Error, message)
    }

    fn with_level(level: StatusLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            expires_at: None,
        }
    }

    pub fn expires_after(mut self, ttl: Duration) -> Self {
        self.expires_at = Some(Instant::now() + ttl);
        self
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Instant::now() >= at)
    }

    pub fn show(&self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.colored_label(self.level.color(), self.level.icon());
            ui.colored_label(self.level.color(), &self.message);
        });
    }
}

impl From<&ValidationError> for StatusMessage {
    fn from(err: &ValidationError) -> Self {
        StatusMessage::error(err.to_string())
    }
}

/// Show `slot` and clear it once it has expired
pub fn show_status_slot(ui: &mut egui::Ui, slot: &mut Option<StatusMessage>) {
    if slot.as_ref().is_some_and(StatusMessage::is_expired) {
        *slot = None;
    }
    if let Some(status) = slot {
        status.show(ui);
        if status.expires_at.is_some() {
            ui.ctx().request_repaint_after(Duration::from_millis(250));
        }
    }
}

pub fn show_spinner_with_text(ui: &mut egui::Ui, text: &str) {
    ui.horizontal(|ui| {
        ui.spinner();
        ui.label(text);
    });
}
