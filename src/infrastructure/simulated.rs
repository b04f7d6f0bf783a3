//! In-memory engine for tests
//!
//! Records every call in order and answers from a scripted table of exit
//! codes and failures.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use futures::StreamExt;
use futures::stream;
use parking_lot::Mutex;

use super::engine::{
    Engine, EngineError, ExecOutput, ExecSpec, OutputStream, PullProgress, PullStream,
    RemoveOptions,
};

/// A recorded engine call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCall {
    Pull(String),
    Create { id: String, name: String, image: String },
    Start(String),
    Exec { id: String, cmd: Vec<String>, env: Vec<String>, tty: bool },
    Inspect(String),
    Remove { id: String, options: RemoveOptions },
}

#[derive(Default)]
struct State {
    calls: Vec<EngineCall>,
    next_id: u32,
    execs: HashMap<String, (String, bool)>,
    emitted: Vec<ExecOutput>,
    exit_codes: HashMap<String, i64>,
    failing_pulls: HashSet<String>,
    hanging: HashSet<String>,
    unreachable: bool,
    fail_start: bool,
    fail_remove: bool,
    unready_probes: u32,
}

#[derive(Default)]
pub struct SimulatedEngine {
    state: Mutex<State>,
}

impl SimulatedEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// `command` exits with `code` instead of zero
    pub fn with_exit_code(self, command: &str, code: i64) -> Self {
        self.state.lock().exit_codes.insert(command.to_string(), code);
        self
    }

    /// Pulling `image` fails
    pub fn failing_pull(self, image: &str) -> Self {
        self.state.lock().failing_pulls.insert(image.to_string());
        self
    }

    /// Every ping fails
    pub fn unreachable(self) -> Self {
        self.state.lock().unreachable = true;
        self
    }

    /// Every start call fails
    pub fn failing_start(self) -> Self {
        self.state.lock().fail_start = true;
        self
    }

    /// Every remove call fails (after being recorded)
    pub fn failing_remove(self) -> Self {
        self.state.lock().fail_remove = true;
        self
    }

    /// The first `probes` readiness probes exit non-zero
    pub fn unready_for(self, probes: u32) -> Self {
        self.state.lock().unready_probes = probes;
        self
    }

    /// Output of `command` never ends
    pub fn hanging_on(self, command: &str) -> Self {
        self.state.lock().hanging.insert(command.to_string());
        self
    }

    pub fn calls(&self) -> Vec<EngineCall> {
        self.state.lock().calls.clone()
    }

    /// Commands executed, without the shell prefix, probes excluded
    pub fn commands(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                EngineCall::Exec { cmd, .. } => cmd.last().cloned(),
                _ => None,
            })
            .filter(|command| command != PROBE)
            .collect()
    }

    /// Output chunks handed to attached readers, probes included
    pub fn emitted(&self) -> Vec<ExecOutput> {
        self.state.lock().emitted.clone()
    }

    pub fn created_images(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                EngineCall::Create { image, .. } => Some(image),
                _ => None,
            })
            .collect()
    }

    pub fn removed(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                EngineCall::Remove { id, .. } => Some(id),
                _ => None,
            })
            .collect()
    }
}

const PROBE: &str = "true";

#[async_trait]
impl Engine for SimulatedEngine {
    fn name(&self) -> &'static str {
        "simulated"
    }

    async fn ping(&self) -> Result<(), EngineError> {
        if self.state.lock().unreachable {
            return Err(EngineError::Connection("daemon not running".to_string()));
        }
        Ok(())
    }

    fn pull_image(&self, reference: &str) -> PullStream {
        let mut state = self.state.lock();
        state.calls.push(EngineCall::Pull(reference.to_string()));
        if state.failing_pulls.contains(reference) {
            let error = EngineError::Pull {
                image: reference.to_string(),
                reason: "manifest unknown".to_string(),
            };
            return stream::iter(vec![Err(error)]).boxed();
        }
        let progress = PullProgress {
            id: None,
            status: format!("Pulled {reference}"),
            progress: None,
        };
        stream::iter(vec![Ok(progress)]).boxed()
    }

    async fn create_context(
        &self,
        name: &str,
        image: &str,
        _placeholder: &[String],
    ) -> Result<String, EngineError> {
        let mut state = self.state.lock();
        state.next_id += 1;
        let id = format!("ctx-{}", state.next_id);
        state.calls.push(EngineCall::Create {
            id: id.clone(),
            name: name.to_string(),
            image: image.to_string(),
        });
        Ok(id)
    }

    async fn start_context(&self, id: &str) -> Result<(), EngineError> {
        let mut state = self.state.lock();
        state.calls.push(EngineCall::Start(id.to_string()));
        if state.fail_start {
            return Err(EngineError::Start(format!("cannot start {id}")));
        }
        Ok(())
    }

    async fn exec_in_context(&self, id: &str, spec: &ExecSpec) -> Result<String, EngineError> {
        let mut state = self.state.lock();
        state.next_id += 1;
        let exec_id = format!("exec-{}", state.next_id);
        state.calls.push(EngineCall::Exec {
            id: id.to_string(),
            cmd: spec.cmd.clone(),
            env: spec.env.clone(),
            tty: spec.tty,
        });
        let command = spec.cmd.last().cloned().unwrap_or_default();
        state.execs.insert(exec_id.clone(), (command, spec.tty));
        Ok(exec_id)
    }

    async fn attach(&self, exec_id: &str) -> Result<OutputStream, EngineError> {
        let mut state = self.state.lock();
        let (command, tty) = state
            .execs
            .get(exec_id)
            .cloned()
            .ok_or_else(|| EngineError::Attach(format!("no such exec {exec_id}")))?;
        if state.hanging.contains(&command) {
            return Ok(stream::pending().boxed());
        }
        let line = format!("{command}\n").into_bytes();
        let chunk = if tty {
            ExecOutput::Console(line)
        } else {
            ExecOutput::Stdout(line)
        };
        state.emitted.push(chunk.clone());
        Ok(stream::iter(vec![Ok(chunk)]).boxed())
    }

    async fn inspect_exec(&self, exec_id: &str) -> Result<i64, EngineError> {
        let mut state = self.state.lock();
        state.calls.push(EngineCall::Inspect(exec_id.to_string()));
        let (command, _) = state
            .execs
            .get(exec_id)
            .cloned()
            .ok_or_else(|| EngineError::Inspect(format!("no such exec {exec_id}")))?;
        if command == PROBE && state.unready_probes > 0 {
            state.unready_probes -= 1;
            return Ok(1);
        }
        Ok(state.exit_codes.get(&command).copied().unwrap_or(0))
    }

    async fn remove_context(&self, id: &str, options: RemoveOptions) -> Result<(), EngineError> {
        let mut state = self.state.lock();
        state.calls.push(EngineCall::Remove {
            id: id.to_string(),
            options,
        });
        if state.fail_remove {
            return Err(EngineError::Remove(format!("cannot remove {id}")));
        }
        Ok(())
    }
}
