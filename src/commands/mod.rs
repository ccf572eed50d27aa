//! Command handlers for the Docuchat CLI
//!
//! Each subcommand gets a handler module. The interactive chat handler
//! owns the readline loop and translates slash commands into orchestrator
//! calls; everything the user sees flows through the renderer.

use crate::error::Result;
use thiserror::Error;

/// Errors that can occur when parsing slash commands
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Unknown command was entered
    #[error("Unknown command: {0}\n\nType '/help' to see available commands")]
    UnknownCommand(String),

    /// Command requires an argument but none was provided
    #[error("Command {command} requires an argument\n\nUsage: {usage}")]
    MissingArgument { command: String, usage: String },

    /// Command was given an argument it cannot use
    #[error("Invalid argument for {command}: {arg}")]
    InvalidArgument { command: String, arg: String },
}

/// Slash commands available during an interactive session
///
/// These commands modify session state or show information rather than
/// being sent to the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlashCommand {
    /// Queue a file for the next turn
    Attach(String),
    /// List pending attachments
    ListFiles,
    /// Remove one pending attachment (1-based index as displayed)
    Remove(usize),
    /// Drop all pending attachments
    ClearFiles,
    /// Activate a prompt prefix by id
    UsePrefix(String),
    /// Deactivate the prompt prefix
    ClearPrefix,
    /// List available prompt prefixes
    ListPrompts,
    /// Switch the active model
    SwitchModel(String),
    /// Reset the session (transcript, attachments, remote context)
    Reset,
    /// Display help
    Help,
    /// Leave the session
    Exit,
    /// Not a slash command; send the line to the model
    None,
}

/// Parse a line of input into a slash command
///
/// Lines not starting with `/` are regular messages and parse to
/// [`SlashCommand::None`]. Command names are case-insensitive; arguments
/// keep their original case.
pub fn parse_slash_command(input: &str) -> std::result::Result<SlashCommand, CommandError> {
    let trimmed = input.trim();
    if !trimmed.starts_with('/') {
        return Ok(SlashCommand::None);
    }

    let (command, argument) = match trimmed.split_once(char::is_whitespace) {
        Some((command, rest)) => (command.to_lowercase(), rest.trim()),
        None => (trimmed.to_lowercase(), ""),
    };

    match command.as_str() {
        "/attach" => {
            if argument.is_empty() {
                Err(CommandError::MissingArgument {
                    command: "/attach".to_string(),
                    usage: "/attach <path>".to_string(),
                })
            } else {
                Ok(SlashCommand::Attach(argument.to_string()))
            }
        }
        "/files" => Ok(SlashCommand::ListFiles),
        "/remove" => {
            if argument.is_empty() {
                Err(CommandError::MissingArgument {
                    command: "/remove".to_string(),
                    usage: "/remove <number>".to_string(),
                })
            } else {
                argument
                    .parse::<usize>()
                    .ok()
                    .filter(|index| *index >= 1)
                    .map(SlashCommand::Remove)
                    .ok_or_else(|| CommandError::InvalidArgument {
                        command: "/remove".to_string(),
                        arg: argument.to_string(),
                    })
            }
        }
        "/clearfiles" => Ok(SlashCommand::ClearFiles),
        "/prompt" => {
            if argument.is_empty() {
                Err(CommandError::MissingArgument {
                    command: "/prompt".to_string(),
                    usage: "/prompt <id>".to_string(),
                })
            } else {
                Ok(SlashCommand::UsePrefix(argument.to_string()))
            }
        }
        "/noprompt" => Ok(SlashCommand::ClearPrefix),
        "/prompts" => Ok(SlashCommand::ListPrompts),
        "/model" => {
            if argument.is_empty() {
                Err(CommandError::MissingArgument {
                    command: "/model".to_string(),
                    usage: "/model <id>".to_string(),
                })
            } else {
                Ok(SlashCommand::SwitchModel(argument.to_string()))
            }
        }
        "/reset" => Ok(SlashCommand::Reset),
        "/help" => Ok(SlashCommand::Help),
        "/exit" | "/quit" => Ok(SlashCommand::Exit),
        other => Err(CommandError::UnknownCommand(other.to_string())),
    }
}

// Chat command handler
pub mod chat {
    //! Interactive chat session handler.
    //!
    //! Builds the gateway and orchestrator, then runs a readline loop that
    //! routes slash commands to orchestrator methods and everything else
    //! to `submit`. A missing credential is prompted for inline and the
    //! message is retried once.

    use super::*;
    use crate::attachments::Attachment;
    use crate::config::Config;
    use crate::credentials::CredentialStore;
    use crate::error::DocuchatError;
    use crate::gateway::ModelGateway;
    use crate::prompts::PromptLibrary;
    use crate::render::{Renderer, TerminalRenderer};
    use crate::session::SessionOrchestrator;
    use colored::Colorize;
    use rustyline::error::ReadlineError;
    use rustyline::DefaultEditor;
    use std::path::Path;

    /// Start an interactive chat session
    ///
    /// # Arguments
    ///
    /// * `config` - Global configuration (consumed)
    /// * `model` - Optional override for the configured model
    /// * `prefix` - Optional prompt prefix id to activate for the session
    pub async fn run_chat(
        config: Config,
        model: Option<String>,
        prefix: Option<String>,
    ) -> Result<()> {
        let mut gateway_config = config.gateway.clone();
        if let Some(model) = model {
            gateway_config.model = model;
        }

        let credential_store = CredentialStore::new();
        let credential = credential_store.load();
        if credential.is_none() {
            tracing::info!("no stored credential; the first send will prompt for one");
        }

        let gateway = ModelGateway::new(&gateway_config)?;
        let renderer = TerminalRenderer::new(config.chat.show_token_counts);
        let mut orchestrator = SessionOrchestrator::new(
            gateway,
            PromptLibrary::builtin(),
            credential_store,
            credential,
            renderer,
        );
        if let Some(id) = prefix {
            orchestrator.set_active_prefix(&id)?;
        }

        print_welcome_banner(orchestrator.model());

        let mut rl = DefaultEditor::new()?;
        loop {
            match rl.readline(">> ") {
                Ok(line) => {
                    let trimmed = line.trim().to_string();
                    if trimmed.is_empty() && orchestrator.attachments().is_empty() {
                        continue;
                    }
                    if !trimmed.is_empty() {
                        rl.add_history_entry(&trimmed)?;
                    }

                    match parse_slash_command(&trimmed) {
                        Ok(SlashCommand::Exit) => break,
                        Ok(SlashCommand::None) => {
                            submit_line(&mut orchestrator, &mut rl, &trimmed).await?;
                        }
                        Ok(command) => handle_command(&mut orchestrator, command),
                        Err(err) => println!("{}", err.to_string().yellow()),
                    }
                }
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
                Err(err) => return Err(err.into()),
            }
        }

        Ok(())
    }

    /// Submit a message, prompting once for a credential if none is stored
    async fn submit_line<R: Renderer>(
        orchestrator: &mut SessionOrchestrator<R>,
        rl: &mut DefaultEditor,
        text: &str,
    ) -> Result<()> {
        match orchestrator.submit(text).await {
            Ok(()) => Ok(()),
            Err(err)
                if matches!(
                    err.downcast_ref::<DocuchatError>(),
                    Some(DocuchatError::CredentialRequired)
                ) =>
            {
                println!("{}", "No API credential is configured.".yellow());
                let token = rl.readline("Enter API credential: ")?;
                let token = token.trim();
                if token.is_empty() {
                    println!("No credential entered; message not sent.");
                    return Ok(());
                }
                orchestrator.set_credential(token.to_string())?;
                orchestrator.submit(text).await
            }
            Err(err) => Err(err),
        }
    }

    fn handle_command<R: Renderer>(
        orchestrator: &mut SessionOrchestrator<R>,
        command: SlashCommand,
    ) {
        match command {
            SlashCommand::Attach(path) => match Attachment::from_path(Path::new(&path)) {
                Ok(attachment) => {
                    let name = attachment.name.clone();
                    match orchestrator.attach(attachment) {
                        Ok(true) => println!("{}", format!("Attached {}", name).green()),
                        Ok(false) => {
                            println!("{}", format!("{} is already attached", name).yellow())
                        }
                        Err(err) => println!("{}", err.to_string().red()),
                    }
                }
                Err(err) => println!("{}", err.to_string().red()),
            },
            SlashCommand::ListFiles => {
                if orchestrator.attachments().is_empty() {
                    println!("No files attached.");
                } else {
                    for (index, attachment) in orchestrator.attachments().iter().enumerate() {
                        println!(
                            "  {}. {} ({} bytes, {})",
                            index + 1,
                            attachment.name,
                            attachment.len(),
                            attachment.mime_type
                        );
                    }
                }
            }
            SlashCommand::Remove(display_index) => {
                match orchestrator.remove_attachment(display_index - 1) {
                    Some(removed) => println!("Removed {}", removed.name),
                    None => println!("{}", "No attachment at that position.".yellow()),
                }
            }
            SlashCommand::ClearFiles => {
                orchestrator.clear_attachments();
                println!("Cleared all attachments.");
            }
            SlashCommand::UsePrefix(id) => match orchestrator.set_active_prefix(&id) {
                Ok(()) => println!("{}", format!("Prompt prefix '{}' active", id).green()),
                Err(err) => println!("{}", err.to_string().red()),
            },
            SlashCommand::ClearPrefix => {
                orchestrator.clear_active_prefix();
                println!("Prompt prefix deactivated.");
            }
            SlashCommand::ListPrompts => {
                let active = orchestrator.active_prefix().map(str::to_string);
                for prefix in orchestrator.prompt_library().list() {
                    let mut markers = String::new();
                    if prefix.is_default {
                        markers.push_str(" (default)");
                    }
                    if active.as_deref() == Some(prefix.id) {
                        markers.push_str(" (active)");
                    }
                    println!("  {}{} - {}", prefix.id.green(), markers, prefix.name);
                }
            }
            SlashCommand::SwitchModel(model) => {
                orchestrator.set_model(&model);
                println!(
                    "{}",
                    format!("Model set to {}; conversation context reset", model).green()
                );
            }
            SlashCommand::Reset => {
                orchestrator.reset_session();
                println!("Session reset.");
            }
            SlashCommand::Help => print_help(),
            SlashCommand::Exit | SlashCommand::None => {}
        }
    }

    fn print_welcome_banner(model: &str) {
        println!("{}", "docuchat".bold());
        println!("Model: {}", model.green());
        println!("Type a message, or /help for commands. /exit leaves.\n");
    }

    fn print_help() {
        println!("Available commands:");
        println!("  /attach <path>   Queue a file for the next message");
        println!("  /files           List pending attachments");
        println!("  /remove <n>      Remove attachment n (as numbered by /files)");
        println!("  /clearfiles      Remove all pending attachments");
        println!("  /prompts         List prompt prefixes");
        println!("  /prompt <id>     Activate a prompt prefix");
        println!("  /noprompt        Deactivate the prompt prefix");
        println!("  /model <id>      Switch model (resets conversation context)");
        println!("  /reset           Clear the conversation and attachments");
        println!("  /help            Show this help");
        println!("  /exit            Leave the session");
        println!();
        println!("Sending with attachments and no text asks the model to analyze the files.");
    }
}

// Auth command handler
pub mod auth {
    //! Credential entry and removal.

    use super::*;
    use crate::credentials::CredentialStore;
    use crate::error::DocuchatError;
    use rustyline::DefaultEditor;

    /// Store or clear the API credential
    ///
    /// # Arguments
    ///
    /// * `clear` - If true, clear the stored credential instead of
    ///   prompting for a new one
    pub fn run_auth(clear: bool) -> Result<()> {
        let store = CredentialStore::new();

        if clear {
            store.clear();
            println!("Stored credential cleared.");
            return Ok(());
        }

        let mut rl = DefaultEditor::new()?;
        let token = rl.readline("Enter API credential: ")?;
        let token = token.trim();
        if token.is_empty() {
            return Err(
                DocuchatError::Validation("credential must not be empty".to_string()).into(),
            );
        }

        store.store(token)?;
        println!("Credential stored.");
        Ok(())
    }
}

// Prompts command handler
pub mod prompts {
    //! Prompt library listing.

    use crate::prompts::PromptLibrary;
    use colored::Colorize;

    /// Print the built-in prompt prefixes
    pub fn run_prompts() {
        let library = PromptLibrary::builtin();
        println!("{}", "Available prompt prefixes:".bold());
        for prefix in library.list() {
            let marker = if prefix.is_default { " (default)" } else { "" };
            println!("  {}{} - {}", prefix.id.green(), marker, prefix.name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_not_a_command() {
        assert_eq!(
            parse_slash_command("summarize this").unwrap(),
            SlashCommand::None
        );
        assert_eq!(parse_slash_command("").unwrap(), SlashCommand::None);
    }

    #[test]
    fn test_parse_attach_with_path() {
        assert_eq!(
            parse_slash_command("/attach reports/q3.pdf").unwrap(),
            SlashCommand::Attach("reports/q3.pdf".to_string())
        );
    }

    #[test]
    fn test_parse_attach_keeps_spaces_in_path() {
        assert_eq!(
            parse_slash_command("/attach annual report.pdf").unwrap(),
            SlashCommand::Attach("annual report.pdf".to_string())
        );
    }

    #[test]
    fn test_parse_attach_requires_argument() {
        assert!(matches!(
            parse_slash_command("/attach"),
            Err(CommandError::MissingArgument { .. })
        ));
    }

    #[test]
    fn test_parse_remove_index() {
        assert_eq!(
            parse_slash_command("/remove 2").unwrap(),
            SlashCommand::Remove(2)
        );
    }

    #[test]
    fn test_parse_remove_rejects_non_numeric_and_zero() {
        assert!(matches!(
            parse_slash_command("/remove abc"),
            Err(CommandError::InvalidArgument { .. })
        ));
        assert!(matches!(
            parse_slash_command("/remove 0"),
            Err(CommandError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_parse_simple_commands() {
        assert_eq!(parse_slash_command("/files").unwrap(), SlashCommand::ListFiles);
        assert_eq!(
            parse_slash_command("/clearfiles").unwrap(),
            SlashCommand::ClearFiles
        );
        assert_eq!(
            parse_slash_command("/noprompt").unwrap(),
            SlashCommand::ClearPrefix
        );
        assert_eq!(
            parse_slash_command("/prompts").unwrap(),
            SlashCommand::ListPrompts
        );
        assert_eq!(parse_slash_command("/reset").unwrap(), SlashCommand::Reset);
        assert_eq!(parse_slash_command("/help").unwrap(), SlashCommand::Help);
    }

    #[test]
    fn test_parse_exit_variants() {
        assert_eq!(parse_slash_command("/exit").unwrap(), SlashCommand::Exit);
        assert_eq!(parse_slash_command("/quit").unwrap(), SlashCommand::Exit);
    }

    #[test]
    fn test_command_names_are_case_insensitive() {
        assert_eq!(parse_slash_command("/HELP").unwrap(), SlashCommand::Help);
        assert_eq!(
            parse_slash_command("/Prompt Summary").unwrap(),
            SlashCommand::UsePrefix("Summary".to_string())
        );
    }

    #[test]
    fn test_parse_model_switch() {
        assert_eq!(
            parse_slash_command("/model gemini-2.0-pro").unwrap(),
            SlashCommand::SwitchModel("gemini-2.0-pro".to_string())
        );
        assert!(matches!(
            parse_slash_command("/model"),
            Err(CommandError::MissingArgument { .. })
        ));
    }

    #[test]
    fn test_unknown_command_is_an_error() {
        let err = parse_slash_command("/frobnicate").unwrap_err();
        assert!(matches!(err, CommandError::UnknownCommand(_)));
        assert!(err.to_string().contains("/help"));
    }
}
