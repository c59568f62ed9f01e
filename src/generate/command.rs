//! Local command transport for the field generation service.
//!
//! The command gets the JSON request on stdin and must print the JSON response
//! envelope on stdout. This lets any local model wrapper stand in for the
//! hosted service. The command is killed once `timeout` elapses.
use anyhow::{anyhow, Context, Result};
use std::io::{ErrorKind, Read, Write};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use super::{parse_generation_response, FieldGenerator, GenerateFieldsRequest, GeneratedField};

const POLL_INTERVAL: Duration = Duration::from_millis(25);

pub struct CommandFieldGenerator {
    command: String,
    timeout: Duration,
}

struct Finished {
    status: ExitStatus,
    stdout: Vec<u8>,
    stderr: Vec<u8>,
}

impl CommandFieldGenerator {
    pub fn new(command: String, timeout: Duration) -> Self {
        Self { command, timeout }
    }

    fn spawn(&self) -> Result<Child> {
        let argv = shell_words::split(&self.command)
            .with_context(|| format!("parse generator command: {}", self.command))?;
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| anyhow!("generator command is empty"))?;
        Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("spawn generator command: {program}"))
    }

    /// Feed `request` to the command and collect its output, or kill it at the deadline.
    fn exchange(&self, request: &[u8]) -> Result<Finished> {
        let mut child = self.spawn()?;
        let deadline = Instant::now() + self.timeout;
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        if let Some(mut stdin) = child.stdin.take() {
            match stdin.write_all(request) {
                Ok(()) => {}
                // The command may answer without reading its input.
                Err(err) if err.kind() == ErrorKind::BrokenPipe => {}
                Err(err) => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(err).context("write request to generator stdin");
                }
            }
        }

        let status = loop {
            if let Some(status) = child.try_wait().context("poll generator command")? {
                break status;
            }
            if Instant::now() >= deadline {
                let _ = child.kill();
                let _ = child.wait();
                return Err(anyhow!(
                    "generator command timed out after {}ms",
                    self.timeout.as_millis()
                ));
            }
            thread::sleep(POLL_INTERVAL);
        };

        Ok(Finished {
            status,
            stdout: collect(stdout)?,
            stderr: collect(stderr)?,
        })
    }
}

impl FieldGenerator for CommandFieldGenerator {
    fn generate(&self, prompt: &str) -> Result<Vec<GeneratedField>> {
        let request = serde_json::to_vec(&GenerateFieldsRequest { prompt })
            .context("serialize generation request")?;
        let started = Instant::now();
        let finished = self.exchange(&request)?;
        tracing::info!(
            elapsed_ms = started.elapsed().as_millis(),
            status = %finished.status,
            response_bytes = finished.stdout.len(),
            "generator command finished"
        );
        if !finished.status.success() {
            return Err(anyhow!(
                "generator command failed with {}: {}",
                finished.status,
                String::from_utf8_lossy(&finished.stderr).trim()
            ));
        }
        let body = String::from_utf8(finished.stdout).context("decode generator stdout as UTF-8")?;
        Ok(parse_generation_response(&body)?)
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> JoinHandle<std::io::Result<Vec<u8>>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            pipe.read_to_end(&mut buf)?;
        }
        Ok(buf)
    })
}

fn collect(reader: JoinHandle<std::io::Result<Vec<u8>>>) -> Result<Vec<u8>> {
    reader
        .join()
        .map_err(|_| anyhow!("generator output reader panicked"))?
        .context("read generator output")
}
