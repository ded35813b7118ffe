use async_trait::async_trait;
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::error::LinkError;

#[async_trait]
pub trait Clipboard: Send + Sync {
    async fn write_text(&self, text: &str) -> Result<(), LinkError>;
}

/// Desktop clipboard through whichever copy utility is installed.
#[derive(Debug, Clone)]
pub struct SystemClipboard {
    commands: Vec<(String, Vec<String>)>,
}

impl Default for SystemClipboard {
    fn default() -> Self {
        let commands: &[(&str, &[&str])] = &[
            ("wl-copy", &[]),
            ("xclip", &["-selection", "clipboard"]),
            ("xsel", &["--clipboard", "--input"]),
            ("pbcopy", &[]),
            ("clip.exe", &[]),
        ];
        Self::with_commands(
            commands
                .iter()
                .map(|(program, args)| {
                    (
                        (*program).to_owned(),
                        args.iter().map(|a| (*a).to_owned()).collect(),
                    )
                })
                .collect(),
        )
    }
}

impl SystemClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a custom ordered list of `(program, args)` copy commands.
    pub fn with_commands(commands: Vec<(String, Vec<String>)>) -> Self {
        Self { commands }
    }

    async fn pipe_to(program: &str, args: &[String], text: &str) -> Result<(), String> {
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| format!("{program}: {e}"))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(text.as_bytes())
                .await
                .map_err(|e| format!("{program}: {e}"))?;
        }

        let status = child.wait().await.map_err(|e| format!("{program}: {e}"))?;
        if status.success() {
            Ok(())
        } else {
            Err(format!("{program} exited with {status}"))
        }
    }
}

#[async_trait]
impl Clipboard for SystemClipboard {
    async fn write_text(&self, text: &str) -> Result<(), LinkError> {
        let mut last = None;
        for (program, args) in &self.commands {
            match Self::pipe_to(program, args, text).await {
                Ok(()) => return Ok(()),
                Err(detail) => {
                    tracing::debug!("clipboard command failed: {}", detail);
                    last = Some(detail);
                }
            }
        }
        Err(LinkError::ClipboardUnavailable(
            last.unwrap_or_else(|| "no clipboard command configured".into()),
        ))
    }
}

/// In-process clipboard for headless use and tests.
#[derive(Debug, Default)]
pub struct MemoryClipboard {
    contents: Mutex<Option<String>>,
    unavailable: AtomicBool,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// A clipboard whose every write fails.
    pub fn unavailable() -> Self {
        let clipboard = Self::default();
        clipboard.set_available(false);
        clipboard
    }

    pub fn set_available(&self, available: bool) {
        self.unavailable.store(!available, Ordering::SeqCst);
    }

    pub fn contents(&self) -> Option<String> {
        self.contents
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl Clipboard for MemoryClipboard {
    async fn write_text(&self, text: &str) -> Result<(), LinkError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(LinkError::ClipboardUnavailable(
                "clipboard access denied".into(),
            ));
        }
        *self.contents.lock().unwrap_or_else(PoisonError::into_inner) = Some(text.to_owned());
        Ok(())
    }
}
