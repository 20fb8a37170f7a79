//! Interactive chat against Groq-hosted models.
//!
//! This binary provides a REPL that forwards each message, together with a
//! bounded window of recent history, to the Groq chat completions API.
//!
//! # Usage
//!
//! ```bash
//! # Key from the environment or ./.env
//! groqchat
//!
//! # Prefer a model, falling back to the first listed one if it is gone
//! groqchat --model llama-3.3-70b-versatile
//!
//! # Send the last 4 messages as context
//! groqchat --window 4
//!
//! # Settings from a YAML file, flags still win
//! groqchat --config groqchat.yaml --no-color
//! ```
//!
//! # Commands
//!
//! While chatting, you can use slash commands:
//! - `/help` - Show available commands
//! - `/clear` - Clear conversation history
//! - `/model <name>` - Switch to another listed model
//! - `/window <n>` - Change the memory window
//! - `/stats` - Show session statistics
//! - `/quit` - Exit the application

use std::process::ExitCode;
use std::sync::Arc;

use arrrg::CommandLine;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing_subscriber::EnvFilter;

use groqchat::chat::{
    ChatArgs, ChatCommand, ChatConfig, MemoryWindow, PlainTextRenderer, Renderer, Session,
    TurnProcessor, help_text, parse_command,
};
use groqchat::client::API_KEY_VAR;
use groqchat::{EnvFile, Groq, ModelCatalog, TracingClientLogger};

/// Main entry point for the groqchat application.
#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let (args, _) = ChatArgs::from_command_line_relaxed("groqchat [OPTIONS]");
    init_tracing();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("groqchat: {err}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("groqchat=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(args: ChatArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = ChatConfig::from_args(args)?;
    let mut renderer = PlainTextRenderer::with_color(config.use_color);

    let env_file = EnvFile::load(&config.env_file)?;
    let Some(api_key) = env_file.resolve(API_KEY_VAR) else {
        return Err(format!(
            "{API_KEY_VAR} missing from the environment and {}",
            config.env_file.display()
        )
        .into());
    };

    let client = Groq::with_options(Some(api_key), config.base_url.clone(), Some(config.timeout))?
        .with_logger(Arc::new(TracingClientLogger));

    let mut session = open_session(&client, config.model.as_deref(), config.memory_window).await?;
    if let Some(preferred) = config.model.as_deref()
        && preferred != session.model()
    {
        renderer.print_info(&format!(
            "{preferred} is not available; using {}",
            session.model()
        ));
    }

    let processor = TurnProcessor::with_system_instruction(client, config.system_instruction);
    let mut rl = DefaultEditor::new()?;

    println!(
        "Groq Chat (model: {}, memory window: {})",
        session.model(),
        session.memory_window()
    );
    println!("Type /help for commands, /quit to exit\n");

    loop {
        let readline = rl.readline("You: ");

        match readline {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                let _ = rl.add_history_entry(line);

                // Check for slash commands
                if let Some(cmd) = parse_command(line) {
                    match cmd {
                        ChatCommand::Quit => {
                            println!("Goodbye!");
                            break;
                        }
                        ChatCommand::Clear => {
                            session.clear();
                            renderer.print_info("Conversation cleared.");
                        }
                        ChatCommand::Help => {
                            for line in help_text().lines() {
                                println!("    {}", line);
                            }
                        }
                        ChatCommand::Model(model) => match session.set_model(&model) {
                            Ok(()) => renderer.print_info(&format!("Model changed to: {model}")),
                            Err(err) => renderer.print_error(&err.to_string()),
                        },
                        ChatCommand::ListModels => {
                            print_models(&session);
                        }
                        ChatCommand::Window(window) => {
                            session.set_memory_window(window);
                            renderer.print_info(&format!("Memory window set to {window} messages"));
                        }
                        ChatCommand::History => {
                            if session.transcript().is_empty() {
                                renderer.print_info("(no messages yet)");
                            }
                            for message in session.transcript().iter() {
                                renderer.print_entry(message);
                            }
                        }
                        ChatCommand::Stats => {
                            print_stats(&session);
                        }
                        ChatCommand::ShowConfig => {
                            print_config(&session, processor.system_instruction());
                        }
                        ChatCommand::Invalid(message) => {
                            renderer.print_error(&message);
                        }
                    }
                    continue;
                }

                // Regular message - one request, reply or error lands in the transcript
                renderer.start_reply();
                let outcome = processor.take_turn(&mut session, line).await;
                if let Some(reply) = session.transcript().last() {
                    renderer.print_reply(reply, outcome.is_error());
                }
            }
            Err(ReadlineError::Interrupted) => {
                // Ctrl+C at prompt - soft interrupt
                println!();
                continue;
            }
            Err(ReadlineError::Eof) => {
                // Ctrl+D - exit
                println!("\nGoodbye!");
                break;
            }
            Err(err) => {
                renderer.print_error(&format!("Input error: {}", err));
                break;
            }
        }
    }

    Ok(())
}

/// Lists models and starts the session.
///
/// Only a failed listing call is reported as a connection failure; an empty
/// listing keeps its own message.
async fn open_session<M: ModelCatalog + ?Sized>(
    catalog: &M,
    preferred: Option<&str>,
    memory_window: MemoryWindow,
) -> Result<Session, String> {
    let models = catalog
        .list_models()
        .await
        .map_err(|err| format!("Groq connection failed: {err}"))?;
    Session::new(models, preferred, memory_window).map_err(|err| err.to_string())
}

fn print_models(session: &Session) {
    println!("    Available models:");
    for model in session.available_models() {
        let marker = if model == session.model() { "*" } else { " " };
        println!("    {marker} {model}");
    }
}

fn print_stats(session: &Session) {
    let stats = session.stats();
    println!("    Session Statistics:");
    println!("      Model: {}", stats.model);
    println!("      Messages: {}", stats.message_count);
    println!("      Memory window: {}", stats.memory_window);
    println!(
        "      Turns: {} ({} failed)",
        stats.turns, stats.failed_turns
    );
    println!("      Models available: {}", stats.available_models);
}

fn print_config(session: &Session, system_instruction: &str) {
    let config = session.config();
    println!("    Current Configuration:");
    println!("      Model: {}", config.selected_model);
    println!("      Memory window: {}", config.memory_window);
    println!("      System instruction: {}", system_instruction);
}
