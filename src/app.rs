use chrono::{DateTime, Local};
use std::path::Path;
use std::time::{Duration, Instant};

use crate::events::AppEvent;
use crate::export::{self, ClipboardSink};
use crate::models::{GeneratedApp, GeneratedFile, GenerationStatus};

pub const LOADING_STEPS: [&str; 6] = [
    "Analyzing Vercel environment requirements...",
    "Architecting high-performance components...",
    "Generating vercel.json and package.json...",
    "Implementing UI logic and state management...",
    "Optimizing for Vercel Edge Runtime...",
    "Finalizing deployment-ready bundle...",
];

pub const PRESET_PROMPTS: [(&str, &str); 2] = [
    (
        "Vercel Dashboard",
        "A professional dashboard with vercel analytic integrations, a sleek sidebar, and dark mode.",
    ),
    (
        "Landing Page",
        "A landing page for a startup with high-performance animations and contact form handling.",
    ),
];

const COPIED_FLAG_DURATION: Duration = Duration::from_secs(2);
const SPINNER_FRAME_INTERVAL: Duration = Duration::from_millis(120);

#[derive(Debug)]
pub struct App {
    pub should_quit: bool,
    pub show_help: bool,
    pub exit_pending: bool,
    pub model: String,
    pub title: String,

    pub input: String,
    pub last_prompt: Option<String>,
    pub status: GenerationStatus,
    pub generated_app: Option<GeneratedApp>,
    pub generated_at: Option<DateTime<Local>>,
    pub active_file_index: usize,
    pub code_scroll: usize,
    pub error: Option<String>,
    pub error_retryable: bool,
    /// Transient one-line feedback for copy/download actions
    pub notice: Option<String>,

    pub copied_at: Option<Instant>,
    pub loading_step: usize,
    pub loading_step_changed_at: Option<Instant>,
    pub caption_interval: Duration,
    pub thinking_since: Option<Instant>,
    pub spinner_frame: usize,
}

impl App {
    pub fn new(title: String, model: String, caption_interval: Duration) -> Self {
        Self {
            should_quit: false,
            show_help: false,
            exit_pending: false,
            model,
            title,
            input: String::new(),
            last_prompt: None,
            status: GenerationStatus::Idle,
            generated_app: None,
            generated_at: None,
            active_file_index: 0,
            code_scroll: 0,
            error: None,
            error_retryable: false,
            notice: None,
            copied_at: None,
            loading_step: 0,
            loading_step_changed_at: None,
            caption_interval,
            thinking_since: None,
            spinner_frame: 0,
        }
    }

    pub const fn quit(&mut self) {
        self.should_quit = true;
    }

    pub const fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    pub fn is_thinking(&self) -> bool {
        self.status == GenerationStatus::Thinking
    }

    /// Submit the prompt currently in the input box.
    pub fn submit(&mut self) -> Option<String> {
        let prompt = self.input.clone();
        self.submit_prompt(&prompt)
    }

    /// Start a generation for `prompt`. Returns the prompt to send when a
    /// request must be issued, or `None` when the submission is ignored.
    pub fn submit_prompt(&mut self, prompt: &str) -> Option<String> {
        if prompt.trim().is_empty() || self.is_thinking() {
            return None;
        }

        self.last_prompt = Some(prompt.to_string());
        self.generated_app = None;
        self.generated_at = None;
        self.error = None;
        self.error_retryable = false;
        self.notice = None;
        self.copied_at = None;
        self.status = GenerationStatus::Thinking;
        let now = Instant::now();
        self.loading_step = 0;
        self.loading_step_changed_at = Some(now);
        self.thinking_since = Some(now);
        self.spinner_frame = 0;

        tracing::debug!(prompt_len = prompt.len(), "Generation submitted");
        Some(prompt.to_string())
    }

    pub fn retry(&mut self) -> Option<String> {
        let prompt = self.last_prompt.clone()?;
        self.submit_prompt(&prompt)
    }

    pub fn handle_event(&mut self, event: AppEvent) {
        // Only the completion of the in-flight request may leave Thinking
        if !self.is_thinking() {
            tracing::warn!("Dropping generation result received outside of a request");
            return;
        }

        match event {
            AppEvent::GenerationSucceeded(app) => {
                self.generated_app = Some(app);
                self.generated_at = Some(Local::now());
                self.active_file_index = 0;
                self.code_scroll = 0;
                self.status = GenerationStatus::Success;
            }
            AppEvent::GenerationFailed { message, retryable } => {
                self.error = Some(if message.trim().is_empty() {
                    "An unexpected error occurred during generation.".to_string()
                } else {
                    message
                });
                self.error_retryable = retryable;
                self.status = GenerationStatus::Error;
            }
        }
        self.loading_step = 0;
        self.loading_step_changed_at = None;
        self.thinking_since = None;
        self.spinner_frame = 0;
    }

    /// Advance time-based cosmetic state: the spinner and progress caption
    /// while thinking, and expiry of the "copied" flag.
    pub fn tick(&mut self, now: Instant) {
        if self.is_thinking() {
            let since = *self.thinking_since.get_or_insert(now);
            let elapsed = now.saturating_duration_since(since);
            #[allow(clippy::cast_possible_truncation)]
            let frame = (elapsed.as_millis() / SPINNER_FRAME_INTERVAL.as_millis()) as usize;
            self.spinner_frame = frame;

            let changed_at = *self.loading_step_changed_at.get_or_insert(now);
            if now.saturating_duration_since(changed_at) >= self.caption_interval {
                self.loading_step = (self.loading_step + 1) % LOADING_STEPS.len();
                self.loading_step_changed_at = Some(now);
            }
        } else {
            self.loading_step = 0;
            self.loading_step_changed_at = None;
            self.thinking_since = None;
            self.spinner_frame = 0;
        }

        if self
            .copied_at
            .is_some_and(|at| now.saturating_duration_since(at) >= COPIED_FLAG_DURATION)
        {
            self.copied_at = None;
        }
    }

    pub fn loading_caption(&self) -> &'static str {
        LOADING_STEPS[self.loading_step % LOADING_STEPS.len()]
    }

    pub fn active_file(&self) -> Option<&GeneratedFile> {
        self.generated_app
            .as_ref()
            .and_then(|app| app.files.get(self.active_file_index))
    }

    pub fn file_count(&self) -> usize {
        self.generated_app.as_ref().map_or(0, |app| app.files.len())
    }

    pub fn select_file(&mut self, index: usize) {
        if index < self.file_count() && index != self.active_file_index {
            self.active_file_index = index;
            self.code_scroll = 0;
            self.copied_at = None;
        }
    }

    pub fn next_file(&mut self) {
        let count = self.file_count();
        if count > 0 {
            self.select_file((self.active_file_index + 1) % count);
        }
    }

    pub fn previous_file(&mut self) {
        let count = self.file_count();
        if count > 0 {
            self.select_file((self.active_file_index + count - 1) % count);
        }
    }

    pub const fn scroll_code_up(&mut self, amount: usize) {
        self.code_scroll = self.code_scroll.saturating_sub(amount);
    }

    pub fn scroll_code_down(&mut self, amount: usize) {
        let max = self
            .active_file()
            .map_or(0, |file| file.content.lines().count().saturating_sub(1));
        self.code_scroll = self.code_scroll.saturating_add(amount).min(max);
    }

    pub fn is_copied(&self) -> bool {
        self.copied_at.is_some()
    }

    pub fn copy_active_file(&mut self, clipboard: &mut dyn ClipboardSink) {
        let Some(file) = self.active_file() else {
            return;
        };
        let path = file.path.clone();

        match clipboard.set_text(&file.content) {
            Ok(()) => {
                self.copied_at = Some(Instant::now());
                self.notice = Some(format!("Copied {path} to clipboard"));
            }
            Err(e) => {
                tracing::warn!(error = %e, "Copy to clipboard failed");
                self.notice = Some(format!("Copy failed: {e}"));
            }
        }
    }

    pub fn download_project(&mut self, dir: &Path) {
        let Some(app) = self.generated_app.as_ref() else {
            return;
        };

        self.notice = Some(match export::write_bundle(app, dir) {
            Ok(path) => format!("Saved {}", path.display()),
            Err(e) => {
                tracing::warn!(error = %e, "Project download failed");
                format!("Download failed: {e:#}")
            }
        });
    }

    pub fn load_preset(&mut self, index: usize) {
        if let Some((_, prompt)) = PRESET_PROMPTS.get(index) {
            self.input = (*prompt).to_string();
        }
    }
}
