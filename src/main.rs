use std::io::{self, Read, Write};
use std::sync::Arc;

use color_eyre::eyre::{eyre, WrapErr};
use color_eyre::Result;
use tokio_util::sync::CancellationToken;

use donkin::adapters::ReqwestHttpClient;
use donkin::cli::{apply_run_args, parse_args, run_cli_command, CliCommand, USAGE};
use donkin::{telemetry, ChatConfig, ChatStatus, ChatStore, StoreMessage, StreamTransport};

/// Exit code after Ctrl+C, as a shell would report SIGINT.
const EXIT_INTERRUPTED: i32 = 130;

/// Writes the growth of the streamed reply: text to stdout, reasoning to
/// stderr. The store holds accumulated text, so only the unseen suffix is
/// printed.
#[derive(Default)]
struct ReplyPrinter {
    text: String,
    reasoning: String,
}

impl ReplyPrinter {
    fn show(&mut self, store: &ChatStore, message_id: &str) -> io::Result<()> {
        let Some(message) = store.get_message(message_id) else {
            return Ok(());
        };

        if let Some(reasoning) = &message.reasoning {
            if let Some(delta) = delta(&self.reasoning, &reasoning.content) {
                let mut err = io::stderr().lock();
                err.write_all(delta.as_bytes())?;
                err.flush()?;
                self.reasoning = reasoning.content.clone();
            }
        }

        if let Some(delta) = delta(&self.text, message.text()) {
            if !self.reasoning.is_empty() && self.text.is_empty() {
                eprintln!();
            }
            let mut out = io::stdout().lock();
            out.write_all(delta.as_bytes())?;
            out.flush()?;
            self.text = message.text().to_string();
        }
        Ok(())
    }
}

/// What to print to move from `shown` to `current`, if anything.
fn delta<'a>(shown: &str, current: &'a str) -> Option<std::borrow::Cow<'a, str>> {
    if current == shown {
        return None;
    }
    match current.strip_prefix(shown) {
        Some(rest) => Some(rest.into()),
        // Replaced rather than extended (message_end carried the full text)
        None => Some(format!("\n{}", current).into()),
    }
}

fn read_stdin_prompt() -> Result<String> {
    let mut prompt = String::new();
    io::stdin()
        .read_to_string(&mut prompt)
        .wrap_err("failed to read prompt from stdin")?;
    Ok(prompt)
}

/// Submit `prompt` and stream the reply until the turn ends.
async fn run_prompt(config: ChatConfig, endpoint: String, prompt: String) -> Result<ChatStatus> {
    let client = ReqwestHttpClient::with_connect_timeout(config.connect_timeout)
        .map_err(|e| eyre!("failed to build HTTP client: {}", e))?;
    let transport =
        StreamTransport::new(Arc::new(client)).with_auth_token(config.auth_token.clone());
    let mut store = ChatStore::new(transport, endpoint)
        .with_thread_id(config.thread_id.clone())
        .with_enabled(config.enabled);

    let interrupt = CancellationToken::new();
    let on_interrupt = interrupt.clone();
    // Install the handler - ignore errors if already set
    let _ = ctrlc::set_handler(move || on_interrupt.cancel());

    if !store.handle_submit(Some(prompt), None) {
        return Err(eyre!("nothing to send: empty prompt or chat disabled"));
    }
    let reply_id = store
        .get_last_message()
        .map(|m| m.id.clone())
        .ok_or_else(|| eyre!("submit produced no reply message"))?;

    enum Step {
        Interrupted,
        Applied(Option<StoreMessage>),
    }

    let mut printer = ReplyPrinter::default();
    let mut interrupted = false;
    while store.is_in_flight() {
        let step = tokio::select! {
            biased;
            () = interrupt.cancelled(), if !interrupted => Step::Interrupted,
            message = store.process_next() => Step::Applied(message),
        };
        match step {
            Step::Interrupted => {
                interrupted = true;
                store.handle_cancel();
            }
            Step::Applied(Some(_)) => printer.show(&store, &reply_id)?,
            Step::Applied(None) => break,
        }
    }

    if !printer.text.is_empty() {
        println!();
    }

    let status = store.status();
    if status == ChatStatus::Error {
        if let Some(error) = store.get_message(&reply_id).and_then(|m| m.error.as_ref()) {
            eprintln!("error [{}]: {}", error.code, error.message);
            if let Some(hint) = error.hint.as_deref() {
                eprintln!("hint: {}", hint);
            }
        }
    }
    if let Some(thread_id) = store.state().thread_id.as_deref() {
        tracing::info!(thread_id, "Turn finished");
    }
    if interrupted {
        eprintln!("cancelled");
    }
    Ok(status)
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let command = match parse_args(std::env::args()) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("error: {}\n\n{}", e, USAGE);
            std::process::exit(2);
        }
    };
    if run_cli_command(&command) {
        return Ok(());
    }
    let CliCommand::Run(run) = command else {
        return Ok(());
    };

    telemetry::init();

    let config = apply_run_args(ChatConfig::from_env()?, &run);
    let endpoint = config.endpoint()?.to_string();
    let prompt = if run.prompt.trim().is_empty() {
        read_stdin_prompt()?
    } else {
        run.prompt.clone()
    };

    let runtime = tokio::runtime::Runtime::new()?;
    let status = runtime.block_on(run_prompt(config, endpoint, prompt))?;

    match status {
        ChatStatus::Error => std::process::exit(1),
        ChatStatus::Idle => std::process::exit(EXIT_INTERRUPTED),
        ChatStatus::Streaming | ChatStatus::Success => Ok(()),
    }
}
