//! An [`Executor`] that records commands instead of spawning them.

use std::cell::RefCell;

use crate::exec::{CommandSpec, ExecError, Executor};

type Hook = Box<dyn Fn(&CommandSpec)>;

/// Matchers are substrings of the rendered command line.
#[derive(Default)]
pub struct RecordingExecutor {
    queries: RefCell<Vec<CommandSpec>>,
    runs: RefCell<Vec<CommandSpec>>,
    responses: Vec<(String, String)>,
    failures: Vec<String>,
    hooks: Vec<(String, Hook)>,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer matching queries with `stdout`. First match wins.
    pub fn with_response(mut self, matcher: &str, stdout: &str) -> Self {
        self.responses.push((matcher.to_string(), stdout.to_string()));
        self
    }

    /// Make matching commands exit with code 2.
    pub fn failing(mut self, matcher: &str) -> Self {
        self.failures.push(matcher.to_string());
        self
    }

    /// Call `hook` whenever a matching command is run, before it "exits".
    pub fn with_hook(mut self, matcher: &str, hook: impl Fn(&CommandSpec) + 'static) -> Self {
        self.hooks.push((matcher.to_string(), Box::new(hook)));
        self
    }

    pub fn queries(&self) -> Vec<CommandSpec> {
        self.queries.borrow().clone()
    }

    pub fn runs(&self) -> Vec<CommandSpec> {
        self.runs.borrow().clone()
    }

    fn check_failure(&self, cmd: &CommandSpec) -> Result<(), ExecError> {
        let line = cmd.to_string();
        if self.failures.iter().any(|m| line.contains(m.as_str())) {
            return Err(ExecError::Failed {
                command: line,
                code: Some(2),
                stderr: String::new(),
            });
        }
        Ok(())
    }
}

impl Executor for RecordingExecutor {
    fn query(&self, cmd: &CommandSpec) -> Result<String, ExecError> {
        self.queries.borrow_mut().push(cmd.clone());
        self.check_failure(cmd)?;

        let line = cmd.to_string();
        Ok(self
            .responses
            .iter()
            .find(|(m, _)| line.contains(m.as_str()))
            .map(|(_, stdout)| stdout.clone())
            .unwrap_or_default())
    }

    fn run(&self, cmd: &CommandSpec) -> Result<(), ExecError> {
        self.runs.borrow_mut().push(cmd.clone());

        let line = cmd.to_string();
        for (matcher, hook) in &self.hooks {
            if line.contains(matcher.as_str()) {
                hook(cmd);
            }
        }
        self.check_failure(cmd)
    }
}
