//! Subprocess execution with a live view on the output.

use crate::cmd::CommandBuilder;
use bstr::ByteSlice;
use color_eyre::eyre::{eyre, Result};
use crossbeam_channel::{unbounded, Sender};
use std::io::Read;
use std::process::{ExitStatus, Stdio};

/// Captured result of a streamed subprocess.
pub(crate) struct StreamedOutput {
    /// Exit status of the command.
    pub status: ExitStatus,
    /// Interleaved stdout and stderr, in arrival order.
    pub log: Vec<u8>,
}

/// Run a command, forwarding each output line to `on_line` as it arrives.
/// Stdout and stderr are drained from their own threads so the child never
/// blocks on a full pipe.
pub(crate) fn run_streaming(
    cmd: &CommandBuilder,
    mut on_line: impl FnMut(&str),
) -> Result<StreamedOutput> {
    let mut command = cmd.build();
    command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    let mut child = command
        .spawn()
        .map_err(|err| eyre!("could not spawn `{}`: {err}", cmd.display()))?;
    let stdout = child.stdout.take().unwrap();
    let stderr = child.stderr.take().unwrap();

    let mut log = Vec::new();
    let status = std::thread::scope(|s| -> Result<ExitStatus> {
        let (send, recv) = unbounded();
        let stdout_send = send.clone();
        s.spawn(move || read_lines(stdout, stdout_send));
        s.spawn(move || read_lines(stderr, send));
        for line in recv.iter() {
            on_line(String::from_utf8_lossy(&line).trim_end());
            log.extend_from_slice(&line);
        }
        Ok(child.wait()?)
    })?;
    Ok(StreamedOutput { status, log })
}

fn read_lines(mut pipe: impl Read, send: Sender<Vec<u8>>) {
    let mut buf = [0u8; 4096];
    let mut pending = Vec::new();
    loop {
        match pipe.read(&mut buf) {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                pending.extend_from_slice(&buf[..n]);
                while let Some(pos) = pending.find_byte(b'\n') {
                    let rest = pending.split_off(pos + 1);
                    let line = std::mem::replace(&mut pending, rest);
                    if send.send(line).is_err() {
                        return;
                    }
                }
            }
        }
    }
    if !pending.is_empty() {
        let _ = send.send(pending);
    }
}
