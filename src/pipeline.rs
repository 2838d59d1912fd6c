use crate::error::GifError;
use anyhow::{Context, Result};
use log::debug;
use std::io::Read;
use std::process::{ChildStderr, ChildStdout, Command, Stdio};
use std::sync::mpsc;
use std::thread;

/// One external process in the pipeline.
pub struct Stage {
    pub name: &'static str,
    pub command: Command,
}

/// Launch every stage, wiring consecutive stages stdout-to-stdin, then
/// drain the merged diagnostic channel until end-of-stream and inspect the
/// exit statuses in stage order. The first stage reads nothing; the last
/// stage writes its artifact to the output path itself, so its stdout is
/// discarded.
///
/// `log_lines` is verbose-and-not-quiet, folded by the caller.
pub fn run(stages: Vec<Stage>, log_lines: bool) -> Result<()> {
    let (tx, rx) = mpsc::channel::<(usize, Vec<u8>)>();
    let mut children = Vec::with_capacity(stages.len());
    let mut drains = Vec::with_capacity(stages.len());
    let mut upstream: Option<ChildStdout> = None;

    let last = stages.len() - 1;
    for (idx, mut stage) in stages.into_iter().enumerate() {
        match upstream.take() {
            Some(pipe) => stage.command.stdin(Stdio::from(pipe)),
            None => stage.command.stdin(Stdio::null()),
        };
        if idx < last {
            stage.command.stdout(Stdio::piped());
        } else {
            stage.command.stdout(Stdio::null());
        }
        stage.command.stderr(Stdio::piped());

        let mut child = stage
            .command
            .spawn()
            .with_context(|| format!("failed to spawn {}", stage.name))?;
        if idx < last {
            upstream = Some(
                child
                    .stdout
                    .take()
                    .with_context(|| format!("failed to capture {} output", stage.name))?,
            );
        }
        let stderr = child
            .stderr
            .take()
            .with_context(|| format!("failed to capture {} diagnostics", stage.name))?;
        drains.push(spawn_chunk_reader(idx, stderr, tx.clone()));
        children.push((stage.name, child));
    }
    // the drain loop below ends once every reader thread hangs up
    drop(tx);

    // Must run while the processes do: an unread stderr buffer would
    // eventually block the writer. Chunks are reassembled into lines per
    // stage when forwarding; interleaving between stages is arbitrary.
    let mut partial: Vec<String> = children.iter().map(|_| String::new()).collect();
    for (idx, chunk) in rx {
        if !log_lines {
            continue;
        }
        partial[idx].push_str(&String::from_utf8_lossy(&chunk));
        while let Some(pos) = partial[idx].find('\n') {
            let rest = partial[idx].split_off(pos + 1);
            let line = std::mem::replace(&mut partial[idx], rest);
            debug!("[{}] {}", children[idx].0, line.trim_end());
        }
    }
    for handle in drains {
        let _ = handle.join();
    }

    for (name, mut child) in children {
        let status = child
            .wait()
            .with_context(|| format!("failed to wait for {name}"))?;
        if !status.success() {
            return Err(GifError::ExternalProcessFailure {
                tool: name.to_string(),
                status,
            }
            .into());
        }
    }
    Ok(())
}

fn spawn_chunk_reader(
    idx: usize,
    mut pipe: ChildStderr,
    tx: mpsc::Sender<(usize, Vec<u8>)>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let mut buf = [0u8; 1024];
        loop {
            match pipe.read(&mut buf) {
                Ok(0) | Err(_) => break,
                Ok(n) => {
                    if tx.send((idx, buf[..n].to_vec())).is_err() {
                        break;
                    }
                }
            }
        }
    })
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(script: &str) -> Command {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", script]);
        cmd
    }

    #[test]
    fn test_single_stage_success() {
        let stages = vec![Stage {
            name: "ffmpeg",
            command: sh("exit 0"),
        }];
        assert!(run(stages, false).is_ok());
    }

    #[test]
    fn test_single_stage_failure_names_the_stage() {
        let stages = vec![Stage {
            name: "ffmpeg",
            command: sh("echo oops >&2; exit 3"),
        }];
        let err = run(stages, false).unwrap_err();
        assert!(err.to_string().contains("ffmpeg"));
    }

    #[test]
    fn test_first_failure_wins_even_when_second_stage_succeeds() {
        let stages = vec![
            Stage {
                name: "ffmpeg",
                command: sh("exit 3"),
            },
            Stage {
                name: "gifsicle",
                command: sh("cat >/dev/null; exit 0"),
            },
        ];
        let err = run(stages, false).unwrap_err();
        assert!(err.to_string().contains("ffmpeg"));
    }

    #[test]
    fn test_second_stage_failure_is_reported() {
        let stages = vec![
            Stage {
                name: "ffmpeg",
                command: sh("exit 0"),
            },
            Stage {
                name: "gifsicle",
                command: sh("cat >/dev/null; exit 1"),
            },
        ];
        let err = run(stages, false).unwrap_err();
        assert!(err.to_string().contains("gifsicle"));
    }

    #[test]
    fn test_consecutive_stages_share_a_pipe() {
        let out = std::env::temp_dir().join(format!("vid2gif_pipe_{}", std::process::id()));
        let stages = vec![
            Stage {
                name: "ffmpeg",
                command: sh("printf gif-bytes"),
            },
            Stage {
                name: "gifsicle",
                command: sh(&format!("cat > '{}'", out.display())),
            },
        ];
        run(stages, false).unwrap();
        let written = std::fs::read_to_string(&out).unwrap();
        let _ = std::fs::remove_file(&out);
        assert_eq!(written, "gif-bytes");
    }

    #[test]
    fn test_noisy_diagnostics_are_drained() {
        // enough output to fill an unread pipe buffer several times over
        let stages = vec![Stage {
            name: "ffmpeg",
            command: sh("i=0; while [ $i -lt 20000 ]; do echo line-$i >&2; i=$((i+1)); done"),
        }];
        assert!(run(stages, false).is_ok());
    }
}
