use std::{
    io::{self, Write},
    path::PathBuf,
};

use anyhow::{Context, Result};
use clap::Parser;
use client_core::{ChatController, Phase};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::debug;
use tracing_subscriber::EnvFilter;
use url::Url;

mod config;
mod view;

use config::load_settings;
use view::{SetupForm, TerminalView};

#[derive(Parser, Debug)]
#[command(name = "sitechat", version, about = "Terminal chat client for a website chatbot")]
struct Args {
    /// Chatbot server base URL (overrides config and environment).
    #[arg(long)]
    server_url: Option<String>,
    /// Website to build the chatbot from; skips the setup prompt.
    #[arg(long)]
    url: Option<String>,
    #[arg(long)]
    force_scrape: bool,
    #[arg(long)]
    config: Option<PathBuf>,
}

type StdinLines = Lines<BufReader<Stdin>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChatCommand {
    Quit,
    Clear,
    Message,
}

fn parse_command(line: &str) -> ChatCommand {
    match line.trim().to_ascii_lowercase().as_str() {
        "/quit" => ChatCommand::Quit,
        "/clear" => ChatCommand::Clear,
        _ => ChatCommand::Message,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let mut settings = load_settings(args.config.as_deref())?;
    if let Some(server_url) = args.server_url.clone() {
        settings.server_url = server_url;
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.log_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let server_url = Url::parse(&settings.server_url)
        .with_context(|| format!("invalid server url: {}", settings.server_url))?;
    let mut controller = ChatController::for_server(TerminalView::stdout(), &server_url)?;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    let mut prefilled = args.url.map(|website_url| SetupForm {
        website_url,
        force_scrape: args.force_scrape,
    });
    while controller.phase() == Phase::Setup {
        let form = match prefilled.take() {
            Some(form) => form,
            None => match prompt_setup(&mut lines).await? {
                Some(form) => form,
                None => return Ok(()),
            },
        };
        controller.view_mut().set_setup_form(form);
        if let Err(err) = controller.submit_initialization().await {
            debug!(%err, "setup: initialization attempt failed");
        }
    }

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read stdin")? else {
                    break;
                };
                match parse_command(&line) {
                    ChatCommand::Quit => break,
                    ChatCommand::Clear => controller.clear_messages(),
                    ChatCommand::Message => {
                        controller.view_mut().set_message_input(line);
                        let outcome = controller.send_message().await;
                        debug!(?outcome, "chat: send attempted");
                    }
                }
            }
            Some(event) = controller.next_stream_event() => {
                controller.handle_stream_event(event);
            }
        }
    }

    controller.teardown().await;
    Ok(())
}

async fn prompt_setup(lines: &mut StdinLines) -> Result<Option<SetupForm>> {
    let Some(website_url) = prompt(lines, "Website URL: ").await? else {
        return Ok(None);
    };
    let Some(answer) = prompt(lines, "Force new scrape? [y/N]: ").await? else {
        return Ok(None);
    };
    Ok(Some(SetupForm {
        website_url,
        force_scrape: parse_yes(&answer),
    }))
}

async fn prompt(lines: &mut StdinLines, label: &str) -> Result<Option<String>> {
    print!("{label}");
    io::stdout().flush().context("failed to flush stdout")?;
    lines.next_line().await.context("failed to read stdin")
}

fn parse_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
