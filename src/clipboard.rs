use anyhow::{Context, Result, anyhow};
use std::io::Write;
use std::process::{Command, Stdio};
use tracing::{error, info};

use crate::utils::is_program_installed;

// A clipboard utility found on PATH, with the arguments for each direction.
struct ClipboardTool {
    copy: (&'static str, &'static [&'static str]),
    paste: (&'static str, &'static [&'static str]),
}

const TOOLS: &[ClipboardTool] = &[
    ClipboardTool {
        copy: ("pbcopy", &[]),
        paste: ("pbpaste", &[]),
    },
    ClipboardTool {
        copy: ("wl-copy", &[]),
        paste: ("wl-paste", &["--no-newline"]),
    },
    ClipboardTool {
        copy: ("xclip", &["-selection", "clipboard"]),
        paste: ("xclip", &["-selection", "clipboard", "-o"]),
    },
    ClipboardTool {
        copy: ("xsel", &["--clipboard", "--input"]),
        paste: ("xsel", &["--clipboard", "--output"]),
    },
];

fn find_tool() -> Result<&'static ClipboardTool> {
    TOOLS
        .iter()
        .find(|tool| is_program_installed(tool.copy.0))
        .ok_or_else(|| anyhow!("no clipboard utility found (tried pbcopy, wl-copy, xclip, xsel)"))
}

pub fn copy_to_clipboard(text: &str) -> Result<()> {
    let result = write_clipboard(text);
    match &result {
        Ok(()) => info!("Copied to clipboard: {}", text),
        Err(e) => error!("Failed to copy to clipboard: {:#}", e),
    }
    result
}

fn write_clipboard(text: &str) -> Result<()> {
    let (program, args) = find_tool()?.copy;

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .with_context(|| format!("Failed to start {}", program))?;

    child
        .stdin
        .take()
        .context("Clipboard stdin unavailable")?
        .write_all(text.as_bytes())
        .with_context(|| format!("Failed to write to {}", program))?;

    let status = child.wait()?;
    if !status.success() {
        return Err(anyhow!("{} exited with {}", program, status));
    }
    Ok(())
}

pub fn get_from_clipboard() -> Result<String> {
    let (program, args) = find_tool()?.paste;

    let output = Command::new(program)
        .args(args)
        .stderr(Stdio::null())
        .output()
        .with_context(|| format!("Failed to start {}", program))?;

    if !output.status.success() {
        return Err(anyhow!("{} exited with {}", program, output.status));
    }

    String::from_utf8(output.stdout).context("Clipboard content is not UTF-8")
}

