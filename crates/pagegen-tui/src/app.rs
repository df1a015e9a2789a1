use std::path::PathBuf;

use pagegen_core::{
    preview, spawn_generation, Category, GenerationOutcome, GeneratorView, OpenRouterClient,
    PreviewLine,
};
use tokio::sync::mpsc::UnboundedSender;

use crate::clipboard::Clipboard;
use crate::tui::AppEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Idea,
    Category,
    Generate,
    Preview,
    Source,
}

/// A message the user has to acknowledge before doing anything else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Copied,
    Exported(PathBuf),
    Error(String),
}

impl Notice {
    pub fn title(&self) -> &'static str {
        match self {
            Notice::Copied | Notice::Exported(_) => " Done ",
            Notice::Error(_) => " Error ",
        }
    }

    pub fn message(&self) -> String {
        match self {
            Notice::Copied => "Copied to clipboard!".to_string(),
            Notice::Exported(path) => format!("Preview written to {}", path.display()),
            Notice::Error(msg) => msg.clone(),
        }
    }
}

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub struct App {
    pub should_quit: bool,
    pub focus: Focus,

    // Form + generation state
    pub view: GeneratorView,
    pub idea_cursor: usize,

    // Result panes
    pub preview_lines: Vec<PreviewLine>,
    pub preview_scroll: u16,
    pub source_scroll: u16,

    pub notice: Option<Notice>,

    // Animation state
    pub animation_frame: u8, // 0-2 for the in-flight spinner

    pub client: OpenRouterClient,
    pub key_source: Option<&'static str>,
    pub export_dir: Option<PathBuf>,

    clipboard: Box<dyn Clipboard>,
    events: UnboundedSender<AppEvent>,
}

impl App {
    pub fn new(
        client: OpenRouterClient,
        key_source: Option<&'static str>,
        clipboard: Box<dyn Clipboard>,
        events: UnboundedSender<AppEvent>,
    ) -> Self {
        Self {
            should_quit: false,
            focus: Focus::Idea,

            view: GeneratorView::new(),
            idea_cursor: 0,

            preview_lines: Vec::new(),
            preview_scroll: 0,
            source_scroll: 0,

            notice: None,
            animation_frame: 0,

            client,
            key_source,
            export_dir: preview::default_export_dir(),

            clipboard,
            events,
        }
    }

    pub fn button_label(&self) -> String {
        if self.view.is_busy() {
            "Generating...".to_string()
        } else {
            "Generate Landing Page".to_string()
        }
    }

    pub fn spinner(&self) -> &'static str {
        const FRAMES: [&str; 3] = ["⠋", "⠙", "⠸"];
        FRAMES[self.animation_frame as usize % FRAMES.len()]
    }

    // Idea editing
    pub fn set_idea(&mut self, idea: impl Into<String>) {
        self.view.set_idea(idea);
        self.idea_cursor = self.view.idea().chars().count();
    }

    pub fn insert_char(&mut self, c: char) {
        let mut idea = self.view.idea().to_string();
        let byte_pos = char_to_byte_index(&idea, self.idea_cursor);
        idea.insert(byte_pos, c);
        self.view.set_idea(idea);
        self.idea_cursor += 1;
    }

    pub fn delete_before_cursor(&mut self) {
        if self.idea_cursor == 0 {
            return;
        }
        self.idea_cursor -= 1;
        let mut idea = self.view.idea().to_string();
        let byte_pos = char_to_byte_index(&idea, self.idea_cursor);
        idea.remove(byte_pos);
        self.view.set_idea(idea);
    }

    pub fn delete_at_cursor(&mut self) {
        let mut idea = self.view.idea().to_string();
        if self.idea_cursor < idea.chars().count() {
            let byte_pos = char_to_byte_index(&idea, self.idea_cursor);
            idea.remove(byte_pos);
            self.view.set_idea(idea);
        }
    }

    pub fn cursor_left(&mut self) {
        self.idea_cursor = self.idea_cursor.saturating_sub(1);
    }

    pub fn cursor_right(&mut self) {
        let len = self.view.idea().chars().count();
        self.idea_cursor = (self.idea_cursor + 1).min(len);
    }

    pub fn cursor_home(&mut self) {
        self.idea_cursor = 0;
    }

    pub fn cursor_end(&mut self) {
        self.idea_cursor = self.view.idea().chars().count();
    }

    // Category selector
    pub fn next_category(&mut self) {
        self.view.set_category(self.view.category().next());
    }

    pub fn prev_category(&mut self) {
        self.view.set_category(self.view.category().prev());
    }

    pub fn set_category(&mut self, category: Category) {
        self.view.set_category(category);
    }

    // Focus
    fn focus_order(&self) -> Vec<Focus> {
        let mut order = vec![Focus::Idea, Focus::Category, Focus::Generate];
        if self.view.has_result() {
            order.extend([Focus::Preview, Focus::Source]);
        }
        order
    }

    pub fn focus_next(&mut self) {
        let order = self.focus_order();
        let i = order.iter().position(|f| *f == self.focus).unwrap_or(0);
        self.focus = order[(i + 1) % order.len()];
    }

    pub fn focus_prev(&mut self) {
        let order = self.focus_order();
        let i = order.iter().position(|f| *f == self.focus).unwrap_or(0);
        self.focus = order[(i + order.len() - 1) % order.len()];
    }

    /// Submit the current idea and category. Overlapping submissions are
    /// allowed; each one reports back as an `AppEvent::Generation`.
    pub fn generate(&mut self) {
        let ticket = self.view.begin();
        let category = self.view.category();
        let idea = self.view.idea().to_string();
        log::info!("submitting request {} for {} idea ({} chars)", ticket.id(), category, idea.chars().count());

        let events = self.events.clone();
        spawn_generation(self.client.clone(), category, idea, ticket, move |outcome| {
            let _ = events.send(AppEvent::Generation(outcome));
        });
    }

    pub fn on_generation(&mut self, outcome: GenerationOutcome) {
        let succeeded = outcome.result.is_ok();
        if !self.view.settle(outcome.ticket, outcome.result) {
            return;
        }
        if succeeded {
            self.preview_lines = preview::render_preview(self.view.result_text());
            self.preview_scroll = 0;
            self.source_scroll = 0;
        }
    }

    /// Copy the current result (possibly empty) and report how it went.
    pub fn copy_result(&mut self) {
        let notice = match self.clipboard.set_text(self.view.result_text()) {
            Ok(()) => Notice::Copied,
            Err(e) => {
                log::warn!("clipboard write failed: {}", e);
                Notice::Error(format!("Copy failed: {}", e))
            }
        };
        self.notice = Some(notice);
    }

    pub fn export_preview(&mut self) {
        if !self.view.has_result() {
            self.notice = Some(Notice::Error("Nothing to export yet".to_string()));
            return;
        }
        let Some(dir) = self.export_dir.clone() else {
            self.notice = Some(Notice::Error("Could not determine an export directory".to_string()));
            return;
        };

        let title = format!("{} - {}", self.view.idea(), self.view.category());
        self.notice = Some(match preview::export_preview(&dir, self.view.result_text(), &title) {
            Ok(path) => {
                log::info!("exported preview to {}", path.display());
                Notice::Exported(path)
            }
            Err(e) => Notice::Error(format!("Export failed: {:#}", e)),
        });
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    // Scrolling
    pub fn scroll_down(&mut self, amount: u16) {
        match self.focus {
            Focus::Preview => self.preview_scroll = self.preview_scroll.saturating_add(amount),
            Focus::Source => self.source_scroll = self.source_scroll.saturating_add(amount),
            _ => {}
        }
    }

    pub fn scroll_up(&mut self, amount: u16) {
        match self.focus {
            Focus::Preview => self.preview_scroll = self.preview_scroll.saturating_sub(amount),
            Focus::Source => self.source_scroll = self.source_scroll.saturating_sub(amount),
            _ => {}
        }
    }

    pub fn scroll_top(&mut self) {
        match self.focus {
            Focus::Preview => self.preview_scroll = 0,
            Focus::Source => self.source_scroll = 0,
            _ => {}
        }
    }

    pub fn tick_animation(&mut self) {
        if self.view.is_busy() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }
}
