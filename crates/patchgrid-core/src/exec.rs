//! External command execution.
//!
//! gcloud and ansible-playbook are only reached through an [`Executor`].
//! `query` is for read-only calls whose stdout we consume; `run` is for
//! calls with side effects. [`DryRunExecutor`] prints `run` commands instead
//! of executing them but still answers queries.

use std::fmt;
use std::io;
use std::process::{Command, Stdio};

use thiserror::Error;
use tracing::{debug, info};

/// Cloud CLI used for inventory queries and storage uploads.
pub const GCLOUD: &str = "gcloud";

/// A fully assembled external command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    /// Added on top of the inherited environment for this child only.
    pub envs: Vec<(String, String)>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            envs: Vec::new(),
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

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    pub fn env_value(&self, key: &str) -> Option<&str> {
        self.envs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .envs(self.envs.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        cmd
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("'{program}' not found. Is it installed and on PATH?")]
    NotFound { program: String },

    #[error("failed to execute '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("`{command}` failed ({}){}", exit_label(.code), stderr_suffix(.stderr))]
    Failed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "terminated by signal".to_string(),
    }
}

fn stderr_suffix(stderr: &str) -> String {
    if stderr.is_empty() {
        String::new()
    } else {
        format!(": {stderr}")
    }
}

fn spawn_error(program: &str, source: io::Error) -> ExecError {
    if source.kind() == io::ErrorKind::NotFound {
        ExecError::NotFound {
            program: program.to_string(),
        }
    } else {
        ExecError::Spawn {
            program: program.to_string(),
            source,
        }
    }
}

pub trait Executor {
    /// Run a read-only command to completion and return its stdout.
    fn query(&self, cmd: &CommandSpec) -> Result<String, ExecError>;

    /// Run a command with side effects, blocking until it exits.
    fn run(&self, cmd: &CommandSpec) -> Result<(), ExecError>;

    fn is_dry_run(&self) -> bool {
        false
    }
}

/// Spawns real child processes.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemExecutor;

impl Executor for SystemExecutor {
    fn query(&self, cmd: &CommandSpec) -> Result<String, ExecError> {
        debug!(command = %cmd, "querying");
        let output = cmd
            .command()
            .stdin(Stdio::null())
            .output()
            .map_err(|e| spawn_error(&cmd.program, e))?;

        if !output.status.success() {
            return Err(ExecError::Failed {
                command: cmd.to_string(),
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn run(&self, cmd: &CommandSpec) -> Result<(), ExecError> {
        info!("Executing: {cmd}");
        // Inherit stdio so password prompts and runner output reach the operator
        let status = cmd
            .command()
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .map_err(|e| spawn_error(&cmd.program, e))?;

        if !status.success() {
            return Err(ExecError::Failed {
                command: cmd.to_string(),
                code: status.code(),
                stderr: String::new(),
            });
        }

        Ok(())
    }
}

/// Prints side-effecting commands instead of running them.
#[derive(Debug, Default, Clone, Copy)]
pub struct DryRunExecutor;

impl Executor for DryRunExecutor {
    fn query(&self, cmd: &CommandSpec) -> Result<String, ExecError> {
        SystemExecutor.query(cmd)
    }

    fn run(&self, cmd: &CommandSpec) -> Result<(), ExecError> {
        println!("Debug: {cmd}");
        Ok(())
    }

    fn is_dry_run(&self) -> bool {
        true
    }
}
