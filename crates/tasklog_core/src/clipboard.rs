use crate::error::AppError;
use std::cell::RefCell;
use std::io::Write;
use std::process::{Command, Stdio};

pub trait Clipboard {
    fn write_text(&self, text: &str) -> Result<(), AppError>;
}

/// Pipes text into the platform clipboard tool.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClipboard;

impl Clipboard for SystemClipboard {
    fn write_text(&self, text: &str) -> Result<(), AppError> {
        let mut last_error = AppError::clipboard("no clipboard tool available");
        for tool in CLIPBOARD_TOOLS {
            match pipe_into(tool.program, tool.args, text) {
                Ok(()) => return Ok(()),
                Err(err) => last_error = err,
            }
        }
        Err(last_error)
    }
}

struct ClipboardTool {
    program: &'static str,
    args: &'static [&'static str],
}

#[cfg(target_os = "macos")]
const CLIPBOARD_TOOLS: &[ClipboardTool] = &[ClipboardTool {
    program: "pbcopy",
    args: &[],
}];

#[cfg(target_os = "linux")]
const CLIPBOARD_TOOLS: &[ClipboardTool] = &[
    ClipboardTool {
        program: "wl-copy",
        args: &[],
    },
    ClipboardTool {
        program: "xclip",
        args: &["-selection", "clipboard"],
    },
];

#[cfg(windows)]
const CLIPBOARD_TOOLS: &[ClipboardTool] = &[ClipboardTool {
    program: "clip",
    args: &[],
}];

#[cfg(not(any(target_os = "macos", target_os = "linux", windows)))]
const CLIPBOARD_TOOLS: &[ClipboardTool] = &[];

fn pipe_into(program: &str, args: &[&str], text: &str) -> Result<(), AppError> {
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|err| AppError::clipboard(format!("{program}: {err}")))?;

    // Dropping stdin closes the pipe so the tool sees EOF.
    let written = match child.stdin.take() {
        Some(mut stdin) => stdin.write_all(text.as_bytes()),
        None => Ok(()),
    };
    if let Err(err) = written {
        child.kill().ok();
        child.wait().ok();
        return Err(AppError::clipboard(format!("{program}: {err}")));
    }

    let status = child
        .wait()
        .map_err(|err| AppError::clipboard(format!("{program}: {err}")))?;
    if status.success() {
        Ok(())
    } else {
        Err(AppError::clipboard(format!("{program} exited with {status}")))
    }
}

/// Records copied text instead of touching the system clipboard.
#[derive(Debug, Default)]
pub struct MemoryClipboard {
    pub copied: RefCell<Vec<String>>,
}

impl Clipboard for MemoryClipboard {
    fn write_text(&self, text: &str) -> Result<(), AppError> {
        self.copied.borrow_mut().push(text.to_string());
        Ok(())
    }
}
