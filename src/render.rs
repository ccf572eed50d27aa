//! Rendering contract and terminal implementation
//!
//! The core owns no presentation logic; it calls [`Renderer`] after every
//! state change. The terminal implementation prints only what it has not
//! shown yet, so streamed model text appears incrementally.

use crate::session::transcript::{Role, Transcript};
use colored::Colorize;
use std::io::Write;

/// Projection of session state to visual output
pub trait Renderer {
    /// Show the transcript and the current loading state
    ///
    /// Called after every transcript or queue mutation, including once per
    /// streamed delta.
    fn display_transcript(&mut self, transcript: &Transcript, loading: bool);

    /// Show upload progress for the current long-running operation
    fn display_progress(&mut self, percent: u8, label: &str);
}

/// Renderer that writes to stdout
///
/// Tracks the last message it printed and how many bytes of it were
/// already written; repeated calls during streaming print only the new
/// suffix.
pub struct TerminalRenderer {
    last_message_id: Option<u64>,
    printed_bytes: usize,
    line_open: bool,
    progress_open: bool,
    show_token_counts: bool,
}

impl TerminalRenderer {
    /// Create a terminal renderer
    pub fn new(show_token_counts: bool) -> Self {
        Self {
            last_message_id: None,
            printed_bytes: 0,
            line_open: false,
            progress_open: false,
            show_token_counts,
        }
    }

    fn finish_progress_line(&mut self) {
        if self.progress_open {
            println!();
            self.progress_open = false;
        }
    }

    fn print_header(&self, role: Role) {
        match role {
            Role::User => println!("{}", "you:".bold().cyan()),
            Role::Model => println!("{}", "model:".bold().green()),
        }
    }
}

impl Renderer for TerminalRenderer {
    fn display_transcript(&mut self, transcript: &Transcript, loading: bool) {
        for message in transcript.messages() {
            match self.last_message_id {
                Some(last) if message.id < last => continue,
                Some(last) if message.id == last => {
                    // Streaming mutation of the message already on screen:
                    // print the unseen suffix. Appends always land on byte
                    // boundaries previously printed, so slicing is safe.
                    if message.text.len() > self.printed_bytes {
                        self.finish_progress_line();
                        print!("{}", &message.text[self.printed_bytes..]);
                        let _ = std::io::stdout().flush();
                        self.printed_bytes = message.text.len();
                        self.line_open = true;
                    }
                }
                _ => {
                    self.finish_progress_line();
                    if self.line_open {
                        println!();
                        self.line_open = false;
                    }
                    self.print_header(message.role);
                    print!("{}", message.text);
                    let _ = std::io::stdout().flush();
                    self.last_message_id = Some(message.id);
                    self.printed_bytes = message.text.len();
                    self.line_open = true;
                }
            }
        }

        if !loading && self.line_open {
            println!();
            self.line_open = false;
            if self.show_token_counts {
                if let Some(counts) = transcript
                    .last()
                    .filter(|message| message.role == Role::Model)
                    .and_then(|message| message.token_counts)
                {
                    println!(
                        "{}",
                        format!(
                            "tokens: {} in / {} out / {} total",
                            counts.input, counts.output, counts.total
                        )
                        .dimmed()
                    );
                }
            }
        }
    }

    fn display_progress(&mut self, percent: u8, label: &str) {
        print!("\r{} {}%", label.dimmed(), percent.min(100));
        let _ = std::io::stdout().flush();
        self.progress_open = true;
        if percent >= 100 {
            self.finish_progress_line();
        }
    }
}
