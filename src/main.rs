use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tokio::io::{BufReader, Stdin};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use voice_concierge::config::{InputBackend, OutputBackend};
use voice_concierge::controls::{CONTROLS_HELP, ControlsExit, TerminalControls};
use voice_concierge::session::{self, UtteranceId};
use voice_concierge::voice::{Microphone, SpeechOutput, rms, typed_lines};
use voice_concierge::{Assistant, Config, SessionEvent, TerminalSurface, assistant, route_text};

/// Concierge - scripted voice assistant in the terminal
#[derive(Parser)]
#[command(name = "concierge", version, about)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Speech input backend, overrides `CONCIERGE_INPUT`
    #[arg(long, value_enum)]
    input: Option<InputBackend>,

    /// Speech output backend, overrides `CONCIERGE_OUTPUT`
    #[arg(long, value_enum)]
    output: Option<OutputBackend>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Show how an utterance is routed
    Route {
        /// Utterance text
        text: String,
    },
    /// Speak text through the configured TTS program
    TestTts {
        /// Text to speak
        #[arg(default_value = "Hola, esta es una prueba de voz.")]
        text: String,
    },
    /// Test microphone input
    TestMic {
        /// Duration in seconds
        #[arg(short, long, default_value = "5")]
        duration: u64,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "warn,voice_concierge=info",
        1 => "info,voice_concierge=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            tracing::error!("fatal: failed to start runtime: {e}");
            return ExitCode::FAILURE;
        }
    };
    let result = runtime.block_on(run(cli));
    // A pending stdin read cannot be cancelled; don't wait on it
    runtime.shutdown_background();

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

#[allow(clippy::future_not_send)]
async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = Config::load()?;
    if let Some(input) = cli.input {
        config.voice.input = input;
    }
    if let Some(output) = cli.output {
        config.voice.output = output;
    }

    if let Some(cmd) = cli.command {
        return match cmd {
            Command::Route { text } => {
                cmd_route(&text);
                Ok(())
            }
            Command::TestTts { text } => test_tts(&config, &text).await,
            Command::TestMic { duration } => test_mic(duration).await,
        };
    }

    tracing::debug!(
        input = ?config.voice.input,
        output = ?config.voice.output,
        "loaded configuration"
    );

    let console_input = config.voice.input == InputBackend::Console;
    let (typed_tx, typed_rx) = typed_lines();
    let assistant = Assistant::new(&config, Box::new(TerminalSurface::stdout()), typed_rx)?;
    let handle = assistant.handle();
    let (shutdown_tx, mut shutdown_rx) = mpsc::channel(1);

    let controls = TerminalControls::stdin(handle.clone(), console_input.then_some(typed_tx));
    tokio::spawn(async move {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => tracing::info!("interrupted"),
            () = wait_for_quit(controls, console_input) => {}
        }
        let _ = shutdown_tx.send(()).await;
    });

    eprintln!("{CONTROLS_HELP}");
    handle.activate()?;
    assistant.run(&mut shutdown_rx).await;
    Ok(())
}

/// Resolve when the user quits through the terminal controls
///
/// End of input only quits when stdin was also the speech source; otherwise
/// the session keeps running until Ctrl-C.
async fn wait_for_quit(controls: TerminalControls<BufReader<Stdin>>, console_input: bool) {
    match controls.run().await {
        Ok(ControlsExit::Quit) => return,
        Ok(ControlsExit::EndOfInput) if console_input => return,
        Ok(ControlsExit::EndOfInput) => tracing::debug!("stdin closed, controls unavailable"),
        Err(e) => tracing::warn!(error = %e, "terminal controls stopped"),
    }
    std::future::pending::<()>().await;
}

/// Print the routing decision for an utterance
fn cmd_route(text: &str) {
    let routed = route_text(text);
    println!("category: {}", routed.category);
    println!("response: {}", routed.response);
    if let Some(effect) = routed.side_effect {
        println!("effect:   {effect:?}");
    }
}

/// Speak text and wait for the speech to finish
async fn test_tts(config: &Config, text: &str) -> anyhow::Result<()> {
    let synthesizer = assistant::build_synthesizer(&config.voice)?;
    if synthesizer.is_none() {
        anyhow::bail!("no speech output available (install espeak-ng or set CONCIERGE_TTS_COMMAND)");
    }

    let (events, mut rx) = session::channel();
    let mut output = SpeechOutput::new(synthesizer, events);

    println!("Speaking: \"{text}\"");
    output.speak(UtteranceId(1), text);

    match rx.recv().await {
        Some(SessionEvent::SpeechEnded(_)) => println!("Done."),
        other => anyhow::bail!("unexpected speech event: {other:?}"),
    }
    Ok(())
}

/// Print microphone levels once a second
#[allow(clippy::future_not_send)]
async fn test_mic(duration: u64) -> anyhow::Result<()> {
    println!("Testing microphone for {duration} seconds...");
    println!("Speak into your microphone!\n");

    let mut microphone = Microphone::open()?;
    microphone.start()?;

    for i in 0..duration {
        tokio::time::sleep(Duration::from_secs(1)).await;

        let samples = microphone.drain();
        let energy = rms(&samples);

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let meter_len = (energy * 100.0).min(50.0) as usize;
        let meter = "#".repeat(meter_len) + &" ".repeat(50 - meter_len);

        println!("[{:2}s] RMS: {energy:.4} | [{meter}]", i + 1);
    }

    microphone.stop();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_aliases_parse() {
        let cli = Cli::try_parse_from(["concierge", "--input", "mic", "--output", "off"]).unwrap();
        assert_eq!(cli.input, Some(InputBackend::Whisper));
        assert_eq!(cli.output, Some(OutputBackend::None));
    }

    #[test]
    fn test_backend_env_left_to_config() {
        // Backend env vars are read by config only; no flag means no override
        let cli = Cli::try_parse_from(["concierge"]).unwrap();
        assert!(cli.input.is_none());
        assert!(cli.output.is_none());
    }
}
