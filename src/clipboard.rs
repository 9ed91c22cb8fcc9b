/*!
 * Clipboard support for repo-serializer
 *
 * Copies the serialized document to the system clipboard by piping it into
 * whichever clipboard command the platform provides.
 */

use std::env;
use std::io::{self, Write};
use std::path::Path;
use std::process::{Command, Stdio};

use thiserror::Error;

/// Error type for clipboard operations
#[derive(Error, Debug)]
pub enum ClipboardError {
    /// Failed to execute the command
    #[error("Command failed: {0}")]
    CommandFailed(String),

    /// No suitable clipboard mechanism was found
    #[error("No suitable clipboard mechanism found")]
    NoClipboardFound,

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Result type for clipboard operations
pub type Result<T> = std::result::Result<T, ClipboardError>;

/// Clipboard command line tools, in order of preference per platform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ClipboardProvider {
    /// tmux paste buffer
    Tmux,
    /// Wayland clipboard
    Wayland,
    /// X11 clipboard with xsel
    Xsel,
    /// X11 clipboard with xclip
    Xclip,
    /// macOS clipboard
    MacOS,
    /// Windows clipboard, also reachable from WSL
    Windows,
    /// Termux clipboard
    Termux,
}

impl ClipboardProvider {
    fn command(self) -> (&'static str, &'static [&'static str]) {
        match self {
            Self::Tmux => ("tmux", &["load-buffer", "-w", "-"]),
            Self::Wayland => ("wl-copy", &[]),
            Self::Xsel => ("xsel", &["-b", "-i"]),
            Self::Xclip => ("xclip", &["-selection", "clipboard", "-in"]),
            Self::MacOS => ("pbcopy", &[]),
            Self::Windows => ("clip.exe", &[]),
            Self::Termux => ("termux-clipboard-set", &[]),
        }
    }

    fn copy(self, text: &str) -> Result<()> {
        let (cmd, args) = self.command();
        let mut child = Command::new(cmd)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| ClipboardError::CommandFailed(format!("Failed to spawn {}: {}", cmd, e)))?;

        {
            let stdin = child.stdin.as_mut().ok_or_else(|| {
                ClipboardError::CommandFailed(format!("Failed to open stdin for {}", cmd))
            })?;
            stdin.write_all(text.as_bytes())?;
        }
        // Close stdin so the command sees end of input
        drop(child.stdin.take());

        let status = child.wait()?;
        if status.success() {
            Ok(())
        } else {
            Err(ClipboardError::CommandFailed(format!(
                "{} exited with status: {}",
                cmd, status
            )))
        }
    }
}

/// Copy text to the system clipboard
///
/// Providers are tried in order of preference until one succeeds.
pub fn copy_to_clipboard(text: &str) -> Result<()> {
    let providers = available_providers();
    if providers.is_empty() {
        return Err(ClipboardError::NoClipboardFound);
    }

    let mut last_error = ClipboardError::NoClipboardFound;
    for provider in providers {
        match provider.copy(text) {
            Ok(()) => {
                log::debug!("Copied {} bytes with {:?}", text.len(), provider);
                return Ok(());
            }
            Err(e) => {
                log::debug!("Clipboard provider {:?} failed: {}", provider, e);
                last_error = e;
            }
        }
    }

    Err(last_error)
}

/// Check if a command exists in the PATH
pub fn command_exists(command: &str) -> bool {
    env::var_os("PATH").is_some_and(|paths| {
        env::split_paths(&paths).any(|dir| is_executable(&dir.join(command)))
    })
}

fn is_executable(path: &Path) -> bool {
    path.is_file()
}

/// Providers installed on this system, most preferred first
fn available_providers() -> Vec<ClipboardProvider> {
    let mut candidates = Vec::new();

    if env::var_os("TMUX").is_some() {
        candidates.push(ClipboardProvider::Tmux);
    }

    if cfg!(target_os = "macos") {
        candidates.push(ClipboardProvider::MacOS);
    } else if cfg!(target_os = "windows") || env::var_os("WSL_DISTRO_NAME").is_some() {
        candidates.push(ClipboardProvider::Windows);
    } else if cfg!(target_os = "android") {
        candidates.push(ClipboardProvider::Termux);
    } else {
        if env::var_os("WAYLAND_DISPLAY").is_some() {
            candidates.push(ClipboardProvider::Wayland);
        }
        candidates.push(ClipboardProvider::Xsel);
        candidates.push(ClipboardProvider::Xclip);
    }

    candidates
        .into_iter()
        .filter(|p| command_exists(p.command().0))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[test]
    fn test_command_exists() {
        assert!(command_exists("sh"));
        assert!(!command_exists("nonexistentcommandxyz"));
    }

    #[test]
    fn test_available_providers_are_installed() {
        for provider in available_providers() {
            assert!(command_exists(provider.command().0));
        }
    }

    #[test]
    #[ignore] // Requires a running tmux session
    fn test_tmux_clipboard() {
        if env::var_os("TMUX").is_none() || !command_exists("tmux") {
            return;
        }

        let text = "Test text for tmux clipboard";
        ClipboardProvider::Tmux
            .copy(text)
            .expect("Failed to copy to tmux clipboard");

        let output = Command::new("tmux")
            .args(["show-buffer"])
            .output()
            .expect("Failed to execute tmux show-buffer");
        assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), text);
    }
}
