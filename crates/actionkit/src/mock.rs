//! In-memory fakes for every capability trait.
//!
//! These let actions, probes, the fetcher and the executor be tested
//! without a network, a package manager or a real terminal.

use crate::action::Action;
use crate::context::{
    CommandRunner, ExecutionContext, HostQuery, InputProvider, ProgressCallback, SudoProvider,
};
use crate::error::{ActionError, TransferError};
use crate::fetch::{Fetcher, Transport};
use crate::probe::Probe;
use crate::retry::RetryConfig;
use crate::types::{ActionResult, CommandOutput, CommandSpec};
use manifest::Manifest;
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet, VecDeque};
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;

#[derive(Debug, Clone)]
enum Reply {
    Serve(Vec<u8>),
    Fail(TransferError),
    Partial(Vec<u8>, TransferError),
}

/// Scripted transport.
///
/// Replies queued for a URL are consumed in order; the last one repeats.
/// Unknown URLs fail with a network error.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    replies: Rc<RefCell<HashMap<String, VecDeque<Reply>>>>,
    calls: Rc<RefCell<Vec<String>>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful reply
    pub fn serve(self, url: &str, body: &[u8]) -> Self {
        self.push(url, Reply::Serve(body.to_vec()))
    }

    /// Queue a failure
    pub fn fail(self, url: &str, err: TransferError) -> Self {
        self.push(url, Reply::Fail(err))
    }

    /// Queue a failure that leaves `body` behind in the destination
    pub fn partial(self, url: &str, body: &[u8], err: TransferError) -> Self {
        self.push(url, Reply::Partial(body.to_vec(), err))
    }

    /// URLs requested so far, one entry per attempt
    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    fn push(self, url: &str, reply: Reply) -> Self {
        self.replies
            .borrow_mut()
            .entry(url.to_string())
            .or_default()
            .push_back(reply);
        self
    }

    fn next_reply(&self, url: &str) -> Option<Reply> {
        let mut replies = self.replies.borrow_mut();
        let queue = replies.get_mut(url)?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

impl Transport for MockTransport {
    fn download(&self, url: &str, dest: &Path) -> Result<u64, TransferError> {
        self.calls.borrow_mut().push(url.to_string());
        match self.next_reply(url) {
            Some(Reply::Serve(body)) => {
                std::fs::write(dest, &body)?;
                Ok(body.len() as u64)
            }
            Some(Reply::Fail(err)) => Err(err),
            Some(Reply::Partial(body, err)) => {
                std::fs::write(dest, &body)?;
                Err(err)
            }
            None => Err(TransferError::Network {
                message: format!("no route to {url}"),
            }),
        }
    }
}

/// Fake host state for status probes.
#[derive(Debug, Clone, Default)]
pub struct FakeHost {
    commands: HashSet<String>,
    files: HashMap<PathBuf, Result<String, io::ErrorKind>>,
    executables: HashSet<PathBuf>,
    enabled: HashSet<String>,
    active: HashSet<String>,
    queries: Rc<RefCell<usize>>,
}

impl FakeHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_command(mut self, name: &str) -> Self {
        self.commands.insert(name.to_string());
        self
    }

    pub fn with_file(mut self, path: impl Into<PathBuf>, content: &str) -> Self {
        self.files.insert(path.into(), Ok(content.to_string()));
        self
    }

    /// A file that exists but cannot be read
    pub fn with_unreadable(mut self, path: impl Into<PathBuf>) -> Self {
        self.files
            .insert(path.into(), Err(io::ErrorKind::PermissionDenied));
        self
    }

    pub fn with_executable(mut self, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        self.files.entry(path.clone()).or_insert(Ok(String::new()));
        self.executables.insert(path);
        self
    }

    pub fn with_service(mut self, unit: &str, enabled: bool, active: bool) -> Self {
        if enabled {
            self.enabled.insert(unit.to_string());
        }
        if active {
            self.active.insert(unit.to_string());
        }
        self
    }

    /// Number of queries answered so far
    pub fn queries(&self) -> usize {
        *self.queries.borrow()
    }

    fn count(&self) {
        *self.queries.borrow_mut() += 1;
    }
}

impl HostQuery for FakeHost {
    fn command_exists(&self, name: &str) -> bool {
        self.count();
        self.commands.contains(name)
    }

    fn path_exists(&self, path: &Path) -> bool {
        self.count();
        self.files.contains_key(path)
    }

    fn read_file(&self, path: &Path) -> io::Result<String> {
        self.count();
        match self.files.get(path) {
            Some(Ok(content)) => Ok(content.clone()),
            Some(Err(kind)) => Err(io::Error::from(*kind)),
            None => Err(io::Error::from(io::ErrorKind::NotFound)),
        }
    }

    fn is_executable(&self, path: &Path) -> bool {
        self.count();
        self.executables.contains(path)
    }

    fn user_service_enabled(&self, unit: &str) -> bool {
        self.count();
        self.enabled.contains(unit)
    }

    fn user_service_active(&self, unit: &str) -> bool {
        self.count();
        self.active.contains(unit)
    }
}

/// Operator input from a fixed script; `None` once the script runs out.
#[derive(Debug, Clone, Default)]
pub struct ScriptedInput {
    lines: VecDeque<String>,
    prompts: Vec<String>,
}

impl ScriptedInput {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
            prompts: Vec::new(),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Prompts shown so far
    pub fn prompts(&self) -> Vec<&str> {
        self.prompts.iter().map(String::as_str).collect()
    }
}

impl InputProvider for ScriptedInput {
    fn read_line(&mut self, prompt: &str) -> Option<String> {
        self.prompts.push(prompt.to_string());
        self.lines.pop_front()
    }
}

/// Records every command; programs can be scripted to fail or print.
#[derive(Debug, Clone, Default)]
pub struct RecordingRunner {
    replies: HashMap<String, CommandOutput>,
    spawn_failures: HashSet<String>,
    log: Rc<RefCell<Vec<CommandSpec>>>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `program` exit non-zero with `stderr`
    pub fn fail(mut self, program: &str, stderr: &str) -> Self {
        self.replies
            .insert(program.to_string(), CommandOutput::failed(stderr));
        self
    }

    /// Make `program` succeed with `stdout`
    pub fn stdout(mut self, program: &str, stdout: &str) -> Self {
        self.replies
            .insert(program.to_string(), CommandOutput::ok(stdout));
        self
    }

    /// Make `program` impossible to start
    pub fn missing(mut self, program: &str) -> Self {
        self.spawn_failures.insert(program.to_string());
        self
    }

    pub fn commands(&self) -> Vec<CommandSpec> {
        self.log.borrow().clone()
    }

    pub fn programs(&self) -> Vec<String> {
        self.log.borrow().iter().map(|s| s.program.clone()).collect()
    }

    /// Command lines, rendered
    pub fn lines(&self) -> Vec<String> {
        self.log.borrow().iter().map(ToString::to_string).collect()
    }

    fn reply(&self, spec: &CommandSpec) -> io::Result<CommandOutput> {
        self.log.borrow_mut().push(spec.clone());
        if self.spawn_failures.contains(&spec.program) {
            return Err(io::Error::from(io::ErrorKind::NotFound));
        }
        Ok(self
            .replies
            .get(&spec.program)
            .cloned()
            .unwrap_or_else(|| CommandOutput::ok("")))
    }
}

impl CommandRunner for RecordingRunner {
    fn run(&self, spec: &CommandSpec) -> io::Result<CommandOutput> {
        self.reply(spec)
    }
}

/// Mock sudo provider recording elevated commands and writes.
#[derive(Debug, Clone, Default)]
pub struct MockSudo {
    runner: RecordingRunner,
    writes: Rc<RefCell<Vec<(PathBuf, Vec<u8>, u32)>>>,
}

impl MockSudo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Elevated commands behave like this runner
    pub fn with_runner(runner: RecordingRunner) -> Self {
        Self {
            runner,
            writes: Rc::default(),
        }
    }

    pub fn commands(&self) -> Vec<String> {
        self.runner.lines()
    }

    /// Files written, with their mode
    pub fn writes(&self) -> Vec<(PathBuf, Vec<u8>, u32)> {
        self.writes.borrow().clone()
    }
}

impl SudoProvider for MockSudo {
    fn run(&self, spec: &CommandSpec) -> io::Result<CommandOutput> {
        self.runner.reply(spec)
    }

    fn write_file(&self, path: &Path, contents: &[u8], mode: u32) -> Result<(), ActionError> {
        self.writes
            .borrow_mut()
            .push((path.to_path_buf(), contents.to_vec(), mode));
        Ok(())
    }
}

/// Progress callback that records events as strings.
#[derive(Debug, Clone, Default)]
pub struct RecordingProgress {
    pub events: Vec<String>,
}

impl ProgressCallback for RecordingProgress {
    fn on_action_start(&mut self, id: &str, _label: &str) {
        self.events.push(format!("start {id}"));
    }

    fn on_step(&mut self, step: &str) {
        self.events.push(format!("step {step}"));
    }

    fn on_action_complete(&mut self, id: &str, result: &ActionResult) {
        let status = if result.is_success() { "ok" } else { "failed" };
        self.events.push(format!("{status} {id}"));
    }

    fn on_invalid(&mut self, id: &str) {
        self.events.push(format!("invalid {id}"));
    }
}

/// Owns everything an [`ExecutionContext`] borrows, for tests.
pub struct TestBed {
    pub host: FakeHost,
    pub input: ScriptedInput,
    pub progress: RecordingProgress,
    pub fetcher: Fetcher,
    pub work_dir: PathBuf,
}

impl TestBed {
    pub fn new() -> Self {
        Self {
            host: FakeHost::new(),
            input: ScriptedInput::empty(),
            progress: RecordingProgress::default(),
            fetcher: Fetcher::new(Box::new(MockTransport::new()))
                .with_retry(RetryConfig::new(2, Duration::ZERO)),
            work_dir: std::env::temp_dir(),
        }
    }

    pub fn with_host(mut self, host: FakeHost) -> Self {
        self.host = host;
        self
    }

    pub fn with_input(mut self, input: ScriptedInput) -> Self {
        self.input = input;
        self
    }

    pub fn with_transport(mut self, transport: MockTransport) -> Self {
        self.fetcher =
            Fetcher::new(Box::new(transport)).with_retry(RetryConfig::new(2, Duration::ZERO));
        self
    }

    pub fn with_work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.work_dir = dir.into();
        self
    }

    pub fn context<'a>(
        &'a mut self,
        runner: &'a dyn CommandRunner,
        sudo: Option<&'a dyn SudoProvider>,
    ) -> ExecutionContext<'a> {
        ExecutionContext {
            selected: Vec::new(),
            runner,
            sudo,
            host: &self.host,
            input: &mut self.input,
            progress: &mut self.progress,
            fetcher: &self.fetcher,
            work_dir: self.work_dir.clone(),
        }
    }
}

impl Default for TestBed {
    fn default() -> Self {
        Self::new()
    }
}

/// Action with a fixed result that counts its executions.
#[derive(Debug, Clone)]
pub struct StubAction {
    id: String,
    label: String,
    error: Option<String>,
    probe: Option<Probe>,
    runs: Rc<Cell<usize>>,
}

impl StubAction {
    pub fn ok(id: &str, label: &str) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            error: None,
            probe: None,
            runs: Rc::default(),
        }
    }

    /// Fails with a step error named after the label
    pub fn failing(id: &str, label: &str, message: &str) -> Self {
        Self {
            error: Some(message.to_string()),
            ..Self::ok(id, label)
        }
    }

    pub fn with_probe(mut self, probe: Probe) -> Self {
        self.probe = Some(probe);
        self
    }

    /// Times executed, shared between clones
    pub fn runs(&self) -> usize {
        self.runs.get()
    }
}

impl Action for StubAction {
    fn id(&self) -> &str {
        &self.id
    }

    fn label(&self) -> &str {
        &self.label
    }

    fn probe(&self) -> Option<&Probe> {
        self.probe.as_ref()
    }

    fn execute(
        &self,
        _manifest: &Manifest,
        _ctx: &mut ExecutionContext<'_>,
    ) -> Result<ActionResult, ActionError> {
        self.runs.set(self.runs.get() + 1);
        match &self.error {
            Some(message) => Err(ActionError::step(&self.label, message)),
            None => Ok(ActionResult::success()),
        }
    }
}
