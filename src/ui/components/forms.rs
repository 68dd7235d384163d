use eframe::egui;

pub struct FormField<'a> {
    pub label: &'a str,
    pub value: &'a mut String,
    pub multiline: Option<usize>,
    pub placeholder: Option<&'a str>,
    pub validation_error: Option<&'a str>,
}

impl<'a> FormField<'a> {
    pub fn new(label: &'a str, value: &'a mut String) -> Self {
        Self {
            label,
            value,
            multiline: None,
            placeholder: None,
            validation_error: None,
        }
    }

    /// Text area with the given number of rows
    pub fn multiline(mut self, rows: usize) -> Self {
        self.multiline = Some(rows);
        self
    }

    pub fn placeholder(mut self, placeholder: &'a str) -> Self {
        self.placeholder = Some(placeholder);
        self
    }

    pub fn validation_error(mut self, error: Option<&'a str>) -> Self {
        self.validation_error = error;
        self
    }

    pub fn show(self, ui: &mut egui::Ui) -> egui::Response {
        ui.label(self.label);

        let mut text_edit = match self.multiline {
            Some(rows) => egui::TextEdit::multiline(self.value).desired_rows(rows),
            None => egui::TextEdit::singleline(self.value),
        }
        .desired_width(f32::INFINITY);

        if let Some(placeholder) = self.placeholder {
            text_edit = text_edit.hint_text(placeholder);
        }

        let response = ui.add(text_edit);

        if let Some(error) = self.validation_error {
            ui.colored_label(egui::Color32::from_rgb(0xf8, 0x71, 0x71), error);
        }

        ui.add_space(8.0);
        response
    }
}

pub struct ComboField<'a, T> {
    pub label: &'a str,
    pub selected: &'a mut T,
    pub options: &'a [(T, &'a str)],
}

impl<'a, T: PartialEq + Clone> ComboField<'a, T> {
    pub fn new(label: &'a str, selected: &'a mut T, options: &'a [(T, &'a str)]) -> Self {
        Self {
            label,
            selected,
            options,
        }
    }

    /// Returns true when the selection changed
    pub fn show(self, ui: &mut egui::Ui) -> bool {
        ui.label(self.label);

        let selected_text = self
            .options
            .iter()
            .find(|(value, _)| value == &*self.selected)
            .map(|(_, text)| *text)
            .unwrap_or("Unknown");

        let mut changed = false;
        egui::ComboBox::from_id_salt(self.label)
            .selected_text(selected_text)
            .show_ui(ui, |ui| {
                for (value, text) in self.options {
                    changed |= ui.selectable_value(self.selected, value.clone(), *text).changed();
                }
            });

        ui.add_space(8.0);
        changed
    }
}
