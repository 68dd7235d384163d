use eframe::egui;
use egui::{Color32, RichText, Vec2};

pub const ACCENT: Color32 = Color32::from_rgb(0x63, 0x66, 0xf1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonStyle {
    Primary,
    Secondary,
    Danger,
    Success,
}

impl ButtonStyle {
    fn fill(&self) -> Color32 {
        match self {
            ButtonStyle::Primary => ACCENT,
            ButtonStyle::Secondary => Color32::from_rgb(0x37, 0x41, 0x51),
            ButtonStyle::Danger => Color32::from_rgb(0xdc, 0x26, 0x26),
            ButtonStyle::Success => Color32::from_rgb(0x05, 0x96, 0x69),
        }
    }
}

pub struct StyledButton {
    text: String,
    style: ButtonStyle,
    min_size: Option<Vec2>,
    enabled: bool,
}

impl StyledButton {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: ButtonStyle::Primary,
            min_size: None,
            enabled: true,
        }
    }

    pub fn style(mut self, style: ButtonStyle) -> Self {
        self.style = style;
        self
    }

    pub fn min_size(mut self, size: Vec2) -> Self {
        self.min_size = Some(size);
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn show(self, ui: &mut egui::Ui) -> egui::Response {
        let mut button = egui::Button::new(RichText::new(&self.text).color(Color32::WHITE).strong())
            .fill(self.style.fill());

        if let Some(size) = self.min_size {
            button = button.min_size(size);
        }

        ui.add_enabled(self.enabled, button)
    }
}

/// Full-width sidebar entry, highlighted when `active`
pub fn nav_button(ui: &mut egui::Ui, label: &str, active: bool) -> egui::Response {
    let text = if active {
        RichText::new(label).color(Color32::WHITE).strong()
    } else {
        RichText::new(label).color(Color32::from_gray(0xb0))
    };
    let fill = if active { ACCENT } else { Color32::TRANSPARENT };
    ui.add_sized(
        [ui.available_width(), 32.0],
        egui::Button::new(text).fill(fill).frame(active),
    )
}

/// Rounded toggle used for genre filters and category tabs
pub fn pill(ui: &mut egui::Ui, label: &str, selected: bool) -> egui::Response {
    let fill = if selected {
        ACCENT
    } else {
        Color32::from_rgb(0x37, 0x41, 0x51)
    };
    ui.add(
        egui::Button::new(RichText::new(label).color(Color32::WHITE))
            .fill(fill)
            .corner_radius(12.0),
    )
}

pub fn loading_button(ui: &mut egui::Ui, text: &str, loading: bool) -> egui::Response {
    ui.horizontal(|ui| {
        if loading {
            ui.spinner();
        }
        ui.add_enabled(!loading, egui::Button::new(text))
    })
    .inner
}
