//! Terminal rendering of the chat page.

use std::{
    io::{self, Write},
    time::Duration,
};

use client_core::{ChatView, RenderedMessage};
use colored::Colorize;
use console::Term;
use indicatif::{ProgressBar, ProgressStyle};
use shared::domain::MessageOrigin;
use tracing::warn;

/// Website URL and scrape flag as entered on the setup prompt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SetupForm {
    pub website_url: String,
    pub force_scrape: bool,
}

pub struct TerminalView<W: Write + Send> {
    out: W,
    form: SetupForm,
    input: String,
    spinner: Option<ProgressBar>,
    /// Present only when the log is an interactive terminal that can be cleared.
    term: Option<Term>,
}

impl TerminalView<io::Stdout> {
    pub fn stdout() -> Self {
        let term = Term::stdout();
        let mut view = Self::new(io::stdout());
        view.term = term.is_term().then_some(term);
        view
    }
}

impl<W: Write + Send> TerminalView<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            form: SetupForm::default(),
            input: String::new(),
            spinner: None,
            term: None,
        }
    }

    pub fn set_setup_form(&mut self, form: SetupForm) {
        self.form = form;
    }

    pub fn set_message_input(&mut self, input: impl Into<String>) {
        self.input = input.into();
    }

    #[cfg(test)]
    pub fn output(&self) -> &W {
        &self.out
    }

    fn write_line(&mut self, line: &str) {
        if let Err(err) = writeln!(self.out, "{line}") {
            warn!(%err, "terminal: write failed");
        }
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }
}

impl<W: Write + Send> ChatView for TerminalView<W> {
    fn website_url(&self) -> String {
        self.form.website_url.clone()
    }

    fn force_scrape(&self) -> bool {
        self.form.force_scrape
    }

    fn show_loading(&mut self) {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(Self::spinner_style());
        spinner.set_message("Initializing chatbot...");
        spinner.enable_steady_tick(Duration::from_millis(100));
        self.spinner = Some(spinner);
    }

    fn hide_loading(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
    }

    fn show_chat_view(&mut self) {
        self.write_line(&format!(
            "{} Type a message and press Enter. /clear clears the log, /quit exits.",
            "Chat ready.".green().bold()
        ));
    }

    fn message_input(&self) -> String {
        self.input.clone()
    }

    fn clear_message_input(&mut self) {
        self.input.clear();
    }

    fn append_message(&mut self, message: RenderedMessage) {
        let label = match message.origin {
            MessageOrigin::User => "You:".cyan().bold(),
            MessageOrigin::Bot => "Bot:".green().bold(),
        };
        self.write_line(&format!("{label} {}", message.text));
        if let Some(sources) = &message.sources_line {
            self.write_line(&format!("     {}", sources.dimmed()));
        }
    }

    fn scroll_to_latest(&mut self) {
        if let Err(err) = self.out.flush() {
            warn!(%err, "terminal: flush failed");
        }
    }

    fn clear_messages(&mut self) {
        let Some(term) = &self.term else {
            return;
        };
        if let Err(err) = self.out.flush().and_then(|()| term.clear_screen()) {
            warn!(%err, "terminal: clear failed");
        }
    }

    fn notify(&mut self, notice: &str) {
        self.hide_loading();
        self.write_line(&format!("{} {notice}", "!".red().bold()));
    }
}
