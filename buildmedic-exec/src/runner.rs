use camino::{Utf8Path, Utf8PathBuf};
use std::io::{Read, Seek, SeekFrom};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::debug;

/// A fully described subprocess invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<Utf8PathBuf>,
    /// Bounded wait; the process is killed when it expires.
    pub timeout: Option<Duration>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            timeout: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn cwd(mut self, dir: impl AsRef<Utf8Path>) -> Self {
        self.cwd = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// `program arg1 arg2 ...`, used for logs and scripted matching.
    pub fn command_line(&self) -> String {
        let mut out = self.program.clone();
        for a in &self.args {
            out.push(' ');
            out.push_str(a);
        }
        out
    }
}

/// Captured result of a process that ran to completion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// `None` when the process was terminated by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    pub fn with_stderr(mut self, stderr: impl Into<String>) -> Self {
        self.stderr = stderr.into();
        self
    }

    pub fn with_stdout(mut self, stdout: impl Into<String>) -> Self {
        self.stdout = stdout.into();
        self
    }

    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// stdout followed by stderr; the text handed to pattern matching.
    pub fn combined(&self) -> String {
        match (self.stdout.trim().is_empty(), self.stderr.trim().is_empty()) {
            (true, true) => String::new(),
            (false, true) => self.stdout.clone(),
            (true, false) => self.stderr.clone(),
            (false, false) => format!("{}\n{}", self.stdout, self.stderr),
        }
    }

    /// Short failure description for step reports.
    pub fn failure_reason(&self) -> String {
        let text = self.combined();
        let last = text
            .lines()
            .rev()
            .find(|l| !l.trim().is_empty())
            .unwrap_or("")
            .trim();
        match (self.code, last.is_empty()) {
            (Some(c), true) => format!("exit code {c}"),
            (Some(c), false) => format!("exit code {c}: {last}"),
            (None, true) => "terminated by signal".to_string(),
            (None, false) => format!("terminated by signal: {last}"),
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExecError {
    #[error("failed to start {program}: {message}")]
    Spawn { program: String, message: String },

    #[error("{program} did not finish within {secs}s")]
    Timeout { program: String, secs: u64 },

    #[error("failed waiting for {program}: {message}")]
    Wait { program: String, message: String },
}

/// Port for running external tools. All calls block until completion.
pub trait CommandRunner: Send + Sync {
    fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, ExecError>;

    /// Whether `program` resolves on `PATH`.
    fn exists(&self, program: &str) -> bool {
        let probe = if cfg!(target_os = "windows") {
            CommandSpec::new("where").arg(program)
        } else {
            CommandSpec::new("which").arg(program)
        };
        matches!(self.run(&probe), Ok(out) if out.success())
    }
}

/// Runs commands on the host via `std::process`.
#[derive(Debug, Clone, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, ExecError> {
        debug!(command = %spec.command_line(), cwd = ?spec.cwd, "running");
        match spec.timeout {
            None => run_to_completion(spec),
            Some(limit) => run_bounded(spec, limit),
        }
    }
}

fn base_command(spec: &CommandSpec) -> Command {
    let mut cmd = Command::new(&spec.program);
    cmd.args(&spec.args).stdin(Stdio::null());
    if let Some(dir) = &spec.cwd {
        cmd.current_dir(dir);
    }
    cmd
}

fn spawn_error(spec: &CommandSpec, e: std::io::Error) -> ExecError {
    ExecError::Spawn {
        program: spec.program.clone(),
        message: e.to_string(),
    }
}

fn run_to_completion(spec: &CommandSpec) -> Result<CommandOutput, ExecError> {
    let output = base_command(spec)
        .output()
        .map_err(|e| spawn_error(spec, e))?;
    Ok(CommandOutput {
        code: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}

// Output goes to temp files so a chatty child cannot block on a full pipe
// while we poll for exit.
fn run_bounded(spec: &CommandSpec, limit: Duration) -> Result<CommandOutput, ExecError> {
    let wait_err = |e: std::io::Error| ExecError::Wait {
        program: spec.program.clone(),
        message: e.to_string(),
    };

    let mut out_file = tempfile::tempfile().map_err(wait_err)?;
    let mut err_file = tempfile::tempfile().map_err(wait_err)?;

    let mut child = base_command(spec)
        .stdout(Stdio::from(out_file.try_clone().map_err(wait_err)?))
        .stderr(Stdio::from(err_file.try_clone().map_err(wait_err)?))
        .spawn()
        .map_err(|e| spawn_error(spec, e))?;

    let deadline = Instant::now() + limit;
    let status = loop {
        if let Some(status) = child.try_wait().map_err(wait_err)? {
            break status;
        }
        if Instant::now() >= deadline {
            let _ = child.kill();
            let _ = child.wait();
            return Err(ExecError::Timeout {
                program: spec.program.clone(),
                secs: limit.as_secs(),
            });
        }
        std::thread::sleep(Duration::from_millis(50));
    };

    let read_all = |f: &mut std::fs::File| -> Result<String, ExecError> {
        let mut buf = Vec::new();
        f.seek(SeekFrom::Start(0)).map_err(wait_err)?;
        f.read_to_end(&mut buf).map_err(wait_err)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    };

    Ok(CommandOutput {
        code: status.code(),
        stdout: read_all(&mut out_file)?,
        stderr: read_all(&mut err_file)?,
    })
}
