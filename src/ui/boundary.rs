use std::any::Any;
use std::backtrace::Backtrace;
use std::panic::{self, AssertUnwindSafe};

use eframe::egui;
use egui::{Color32, RichText};
use thiserror::Error;
use tracing::{debug, error};
use uuid::Uuid;

/// Failure while composing a view
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderFailure {
    #[error("{kind} '{id}' not found")]
    MissingRecord { kind: &'static str, id: String },

    #[error("view panicked: {0}")]
    Panicked(String),

    #[error("{0}")]
    Message(String),
}

impl RenderFailure {
    pub fn missing(kind: &'static str, id: impl Into<String>) -> Self {
        RenderFailure::MissingRecord { kind, id: id.into() }
    }

    pub fn message(msg: impl Into<String>) -> Self {
        RenderFailure::Message(msg.into())
    }

    fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let text = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic payload".to_string()
        };
        RenderFailure::Panicked(text)
    }
}

/// Extra detail handed to the reporter alongside the failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureContext {
    pub region: String,
    pub failure_id: Uuid,
    pub backtrace: String,
}

impl FailureContext {
    /// Short form shown to the user
    pub fn short_id(&self) -> String {
        self.failure_id.simple().to_string()[..8].to_string()
    }
}

/// What the user picked on a fallback screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackAction {
    Retry,
    /// Rebuild the whole application state
    Reload,
    /// Go to Home and retry
    ReturnHome,
}

pub enum BoundaryOutcome<R> {
    Rendered(R),
    Fallback(Option<FallbackAction>),
}

impl<R> BoundaryOutcome<R> {
    pub fn action(&self) -> Option<FallbackAction> {
        match self {
            BoundaryOutcome::Rendered(_) => None,
            BoundaryOutcome::Fallback(action) => *action,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, BoundaryOutcome::Fallback(_))
    }
}

pub type Reporter = Box<dyn FnMut(&RenderFailure, &FailureContext)>;

/// Contains failures raised by a view subtree.
///
/// Both `Err` returns and panics from the guarded closure are captured.
/// Once captured, the subtree is skipped until [`retry`](Self::retry).
pub struct ErrorBoundary {
    region: String,
    top_level: bool,
    reporter: Option<Reporter>,
    captured: Option<(RenderFailure, FailureContext)>,
}

impl ErrorBoundary {
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            top_level: false,
            reporter: None,
            captured: None,
        }
    }

    /// The outermost boundary also offers "Return Home"
    pub fn top_level(mut self) -> Self {
        self.top_level = true;
        self
    }

    pub fn with_reporter<F>(mut self, reporter: F) -> Self
    where
        F: FnMut(&RenderFailure, &FailureContext) + 'static,
    {
        self.reporter = Some(Box::new(reporter));
        self
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn failure(&self) -> Option<&RenderFailure> {
        self.captured.as_ref().map(|(f, _)| f)
    }

    pub fn context(&self) -> Option<&FailureContext> {
        self.captured.as_ref().map(|(_, c)| c)
    }

    pub fn has_failed(&self) -> bool {
        self.captured.is_some()
    }

    pub fn retry(&mut self) {
        if self.captured.take().is_some() {
            debug!("Boundary '{}' retrying", self.region);
        }
    }

    /// Run `content` unless a failure is already captured.
    /// Returns the output when the subtree rendered.
    pub fn guard<R, F>(&mut self, content: F) -> Option<R>
    where
        F: FnOnce() -> Result<R, RenderFailure>,
    {
        if self.captured.is_some() {
            return None;
        }
        match panic::catch_unwind(AssertUnwindSafe(content)) {
            Ok(Ok(output)) => Some(output),
            Ok(Err(failure)) => {
                self.capture(failure, Backtrace::capture().to_string());
                None
            }
            Err(payload) => {
                self.capture(RenderFailure::from_panic(payload), String::new());
                None
            }
        }
    }

    /// Render `content` into `ui`, or the default fallback if it failed
    pub fn show<R, F>(&mut self, ui: &mut egui::Ui, content: F) -> BoundaryOutcome<R>
    where
        F: FnOnce(&mut egui::Ui) -> Result<R, RenderFailure>,
    {
        let top_level = self.top_level;
        self.show_with(ui, content, |ui, failure, context| {
            default_fallback(ui, failure, context, top_level)
        })
    }

    /// Like [`show`](Self::show) with a caller-supplied fallback
    pub fn show_with<R, F, G>(&mut self, ui: &mut egui::Ui, content: F, fallback: G) -> BoundaryOutcome<R>
    where
        F: FnOnce(&mut egui::Ui) -> Result<R, RenderFailure>,
        G: FnOnce(&mut egui::Ui, &RenderFailure, &FailureContext) -> Option<FallbackAction>,
    {
        if let Some(output) = self.guard(|| content(ui)) {
            return BoundaryOutcome::Rendered(output);
        }

        let action = match &self.captured {
            Some((failure, context)) => fallback(ui, failure, context),
            None => None,
        };
        if matches!(action, Some(FallbackAction::Retry | FallbackAction::ReturnHome)) {
            self.retry();
        }
        BoundaryOutcome::Fallback(action)
    }

    fn capture(&mut self, failure: RenderFailure, backtrace: String) {
        let context = FailureContext {
            region: self.region.clone(),
            failure_id: Uuid::new_v4(),
            backtrace,
        };
        error!(
            "Boundary '{}' caught a failure ({}): {}",
            self.region,
            context.short_id(),
            failure
        );
        if let Some(reporter) = self.reporter.as_mut() {
            reporter(&failure, &context);
        }
        self.captured = Some((failure, context));
    }
}

/// "Oops! Something went wrong" with Try Again and Reload, plus Return Home
/// on the top-level boundary
pub fn default_fallback(
    ui: &mut egui::Ui,
    failure: &RenderFailure,
    context: &FailureContext,
    top_level: bool,
) -> Option<FallbackAction> {
    let mut action = None;
    egui::Frame::group(ui.style())
        .fill(Color32::from_rgb(0x1f, 0x29, 0x37))
        .inner_margin(24.0)
        .show(ui, |ui| {
            ui.vertical_centered(|ui| {
                ui.label(
                    RichText::new("Oops! Something went wrong")
                        .heading()
                        .color(Color32::from_rgb(0xf8, 0x71, 0x71)),
                );
                ui.label(
                    "We encountered an unexpected error. This has been logged and we'll look into it.",
                );

                if cfg!(debug_assertions) {
                    ui.collapsing("Error Details", |ui| {
                        ui.monospace(failure.to_string());
                        if !context.backtrace.is_empty() {
                            ui.monospace(&context.backtrace);
                        }
                    });
                }

                ui.add_space(12.0);
                ui.horizontal(|ui| {
                    if ui.button("Try Again").clicked() {
                        action = Some(FallbackAction::Retry);
                    }
                    if ui.button("Reload").clicked() {
                        action = Some(FallbackAction::Reload);
                    }
                    if top_level && ui.button("Return Home").clicked() {
                        action = Some(FallbackAction::ReturnHome);
                    }
                });

                ui.small(format!("Error ID: {}", context.short_id()));
            });
        });
    action
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn test_err_is_captured_and_reported_once() {
        let reports = Rc::new(Cell::new(0));
        let counter = reports.clone();
        let mut boundary =
            ErrorBoundary::new("discover").with_reporter(move |_, _| counter.set(counter.get() + 1));

        let out: Option<()> = boundary.guard(|| Err(RenderFailure::missing("experience", "10")));
        assert!(out.is_none());
        assert_eq!(reports.get(), 1);

        // Captured failures skip the subtree and do not report again
        let mut ran = false;
        boundary.guard(|| {
            ran = true;
            Ok(())
        });
        assert!(!ran);
        assert_eq!(reports.get(), 1);
        assert_eq!(
            boundary.failure(),
            Some(&RenderFailure::missing("experience", "10"))
        );
    }

    #[test]
    fn test_panic_is_captured() {
        let mut boundary = ErrorBoundary::new("card");
        let out: Option<()> = boundary.guard(|| panic!("bad card"));
        assert!(out.is_none());
        assert_eq!(boundary.failure(), Some(&RenderFailure::Panicked("bad card".into())));
        assert_eq!(boundary.context().map(|c| c.region.as_str()), Some("card"));
    }

    #[test]
    fn test_retry_renders_again() {
        let mut boundary = ErrorBoundary::new("home");
        boundary.guard::<(), _>(|| Err(RenderFailure::message("first")));
        boundary.retry();
        assert!(!boundary.has_failed());
        assert_eq!(boundary.guard(|| Ok(7)), Some(7));
    }

    #[test]
    fn test_each_occurrence_gets_its_own_id() {
        let ids = Rc::new(std::cell::RefCell::new(Vec::new()));
        let sink = ids.clone();
        let mut boundary =
            ErrorBoundary::new("grid").with_reporter(move |_, ctx| sink.borrow_mut().push(ctx.failure_id));

        for _ in 0..2 {
            boundary.guard::<(), _>(|| Err(RenderFailure::message("again")));
            boundary.retry();
        }
        let ids = ids.borrow();
        assert_eq!(ids.len(), 2);
        assert_ne!(ids[0], ids[1]);
    }
}
