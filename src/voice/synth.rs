//! System TTS program synthesizer

use std::path::PathBuf;
use std::process::Stdio;

use tokio::process::Command;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::session::{EventSender, SessionEvent, UtteranceId};
use crate::{Error, Result};

use super::output::Synthesizer;

/// Known TTS programs and the arguments that select a Spanish voice
const KNOWN_PROGRAMS: &[(&str, &[&str])] = &[
    ("espeak-ng", &["-v", "es"]),
    ("espeak", &["-v", "es"]),
    ("say", &["-v", "Monica"]),
];

struct Playing {
    cancel: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

/// Speaks by running a TTS program with the text as its last argument
pub struct CommandSynthesizer {
    program: PathBuf,
    args: Vec<String>,
    playing: Option<Playing>,
}

impl CommandSynthesizer {
    /// Use an explicit program and arguments
    #[must_use]
    pub const fn new(program: PathBuf, args: Vec<String>) -> Self {
        Self {
            program,
            args,
            playing: None,
        }
    }

    /// Parse a command line such as `"espeak-ng -v es+f3"`
    ///
    /// # Errors
    ///
    /// Returns error if the command is empty or the program is not found
    pub fn from_command_line(command: &str) -> Result<Self> {
        let mut parts = command.split_whitespace();
        let program = parts
            .next()
            .ok_or_else(|| Error::Config("empty TTS command".to_string()))?;
        let program = which::which(program)
            .map_err(|e| Error::Config(format!("TTS program {program}: {e}")))?;
        Ok(Self::new(program, parts.map(ToString::to_string).collect()))
    }

    /// Find the first known TTS program on `PATH`
    #[must_use]
    pub fn detect() -> Option<Self> {
        KNOWN_PROGRAMS.iter().find_map(|(name, args)| {
            which::which(name).ok().map(|program| {
                tracing::debug!(program = %program.display(), "found TTS program");
                Self::new(program, args.iter().map(ToString::to_string).collect())
            })
        })
    }

    /// Program that will be run
    #[must_use]
    pub fn program(&self) -> &std::path::Path {
        &self.program
    }
}

impl Synthesizer for CommandSynthesizer {
    fn speak(&mut self, utterance: UtteranceId, text: &str, events: EventSender) -> Result<()> {
        self.cancel();

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .arg(text)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::Tts(format!("failed to run {}: {e}", self.program.display())))?;

        let (cancel_tx, cancel_rx) = oneshot::channel();
        let task = tokio::spawn(async move {
            tokio::select! {
                status = child.wait() => match status {
                    Ok(status) if !status.success() => {
                        tracing::warn!(%status, "TTS program exited with failure");
                    }
                    Err(e) => tracing::warn!(error = %e, "failed to wait for TTS program"),
                    Ok(_) => {}
                },
                _ = cancel_rx => {
                    if let Err(e) = child.kill().await {
                        tracing::debug!(error = %e, "TTS program already gone");
                    }
                }
            }
            let _ = events.send(SessionEvent::SpeechEnded(utterance));
        });

        self.playing = Some(Playing {
            cancel: cancel_tx,
            task,
        });
        Ok(())
    }

    fn cancel(&mut self) {
        if let Some(playing) = self.playing.take() {
            let _ = playing.cancel.send(());
        }
    }

    fn is_speaking(&self) -> bool {
        self.playing.as_ref().is_some_and(|p| !p.task.is_finished())
    }
}
