use crate::runner::{CommandOutput, CommandRunner, CommandSpec, ExecError};
use std::collections::VecDeque;
use std::sync::Mutex;

struct Rule {
    prefix: String,
    responses: VecDeque<Result<CommandOutput, ExecError>>,
}

impl Rule {
    // The final response repeats once the queue drains to it.
    fn next(&mut self) -> Result<CommandOutput, ExecError> {
        if self.responses.len() > 1 {
            self.responses.pop_front().unwrap_or_else(|| Ok(CommandOutput::default()))
        } else {
            self.responses
                .front()
                .cloned()
                .unwrap_or_else(|| Ok(CommandOutput::default()))
        }
    }
}

#[derive(Default)]
struct State {
    rules: Vec<Rule>,
    calls: Vec<String>,
}

/// Replays canned output keyed by command-line prefix.
///
/// The most recently registered matching prefix wins, so a broad default can
/// be overridden by a narrower rule added later. Unmatched commands fail to
/// spawn, as an absent tool would.
#[derive(Default)]
pub struct ScriptedRunner {
    state: Mutex<State>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(self, prefix: impl Into<String>, output: CommandOutput) -> Self {
        self.push_rule(prefix.into(), vec![Ok(output)]);
        self
    }

    /// Successive calls consume `outputs` in order; the last one repeats.
    pub fn on_sequence(self, prefix: impl Into<String>, outputs: Vec<CommandOutput>) -> Self {
        self.push_rule(prefix.into(), outputs.into_iter().map(Ok).collect());
        self
    }

    pub fn fail_spawn(self, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        let program = prefix.split_whitespace().next().unwrap_or_default().to_string();
        self.push_rule(
            prefix,
            vec![Err(ExecError::Spawn {
                program,
                message: "not found".to_string(),
            })],
        );
        self
    }

    fn push_rule(&self, prefix: String, responses: Vec<Result<CommandOutput, ExecError>>) {
        let mut state = self.lock();
        state.rules.push(Rule {
            prefix,
            responses: responses.into(),
        });
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        // A panicking test thread must not hide the recorded calls.
        self.state.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Every command line run so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    pub fn called(&self, prefix: &str) -> bool {
        self.count(prefix) > 0
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, ExecError> {
        let line = spec.command_line();
        let mut state = self.lock();
        state.calls.push(line.clone());
        match state.rules.iter_mut().rev().find(|r| line.starts_with(&r.prefix)) {
            Some(rule) => rule.next(),
            None => Err(ExecError::Spawn {
                program: spec.program.clone(),
                message: "no scripted response".to_string(),
            }),
        }
    }

    fn exists(&self, program: &str) -> bool {
        let with_args = format!("{program} ");
        let state = self.lock();
        state
            .rules
            .iter()
            .rev()
            .find(|r| r.prefix == program || r.prefix.starts_with(&with_args))
            .is_some_and(|r| matches!(r.responses.front(), Some(Ok(_))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latest_matching_rule_wins() {
        let runner = ScriptedRunner::new()
            .on("adb", CommandOutput::ok("generic"))
            .on("adb shell pm", CommandOutput::ok("specific"));

        let out = runner
            .run(&CommandSpec::new("adb").args(["shell", "pm", "path", "x"]))
            .expect("scripted");
        assert_eq!(out.stdout, "specific");

        let out = runner
            .run(&CommandSpec::new("adb").arg("devices"))
            .expect("scripted");
        assert_eq!(out.stdout, "generic");
    }

    #[test]
    fn sequence_repeats_last_output() {
        let runner = ScriptedRunner::new().on_sequence(
            "adb install",
            vec![CommandOutput::failed(1, "first"), CommandOutput::ok("second")],
        );
        let spec = CommandSpec::new("adb").args(["install", "-r", "app.apk"]);
        assert!(!runner.run(&spec).expect("first").success());
        assert!(runner.run(&spec).expect("second").success());
        assert!(runner.run(&spec).expect("third").success());
        assert_eq!(runner.count("adb install"), 3);
    }

    #[test]
    fn unmatched_and_failing_commands_do_not_exist() {
        let runner = ScriptedRunner::new()
            .on("node --version", CommandOutput::ok("v18.17.0"))
            .fail_spawn("java");
        assert!(runner.exists("node"));
        assert!(!runner.exists("java"));
        assert!(!runner.exists("npm"));
        assert!(runner.run(&CommandSpec::new("npm").arg("-v")).is_err());
        assert!(runner.called("npm"));
    }
}
