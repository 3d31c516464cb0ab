//! Execution engine - runs selected actions in order with a continue/abort policy

use crate::action::{Action, Registry};
use crate::context::{ExecutionContext, InputProvider};
use crate::error::ActionError;
use crate::probe::StatusState;
use crate::types::{ActionResult, Outcome, RunReport};
use manifest::Manifest;

/// Decides whether a batch proceeds past a failed action
pub trait ContinuePolicy {
    fn should_continue(&mut self, id: &str, reason: &str, input: &mut dyn InputProvider) -> bool;
}

/// Fixed answer: `true` always continues, `false` stops at the first failure
impl ContinuePolicy for bool {
    fn should_continue(&mut self, _id: &str, _reason: &str, _input: &mut dyn InputProvider) -> bool {
        *self
    }
}

/// Ask the operator after every failure; no answer means stop
pub struct AskOperator;

impl ContinuePolicy for AskOperator {
    fn should_continue(&mut self, id: &str, reason: &str, input: &mut dyn InputProvider) -> bool {
        log::debug!("asking whether to continue after '{id}' failed: {reason}");
        input.confirm("Do you want to continue?", false)
    }
}

/// Runs selected ids against one registry
pub struct Executor<'r> {
    registry: &'r Registry,
}

impl<'r> Executor<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Self { registry }
    }

    /// Run `selected` strictly in order
    ///
    /// Unknown ids are recorded as `Failure("invalid option")` without
    /// executing anything and do not stop the batch. When a valid action
    /// fails and `policy` declines, processing stops and later ids are
    /// neither attempted nor reported.
    pub fn run(
        &self,
        selected: &[String],
        manifest: &Manifest,
        ctx: &mut ExecutionContext<'_>,
        policy: &mut dyn ContinuePolicy,
    ) -> RunReport {
        ctx.selected = selected.to_vec();
        let mut report = RunReport::default();

        for id in selected {
            let Some(action) = self.registry.get(id) else {
                log::warn!("invalid option: {id}");
                ctx.progress.on_invalid(id);
                report.outcomes.push(Outcome {
                    id: id.clone(),
                    result: ActionResult::failure(ActionError::InvalidSelection(id.clone()).to_string()),
                });
                continue;
            };

            ctx.progress.on_action_start(id, action.label());
            let result = run_action(action, manifest, ctx);
            ctx.progress.on_action_complete(id, &result);

            let failed = result.reason().map(str::to_string);
            report.outcomes.push(Outcome {
                id: id.clone(),
                result,
            });

            if let Some(reason) = failed
                && !policy.should_continue(id, &reason, &mut *ctx.input)
            {
                log::info!("stopping after '{id}'");
                report.halted = true;
                break;
            }
        }

        report
    }
}

/// Consult the probe, then execute; never returns an error
fn run_action(action: &dyn Action, manifest: &Manifest, ctx: &mut ExecutionContext<'_>) -> ActionResult {
    match action.status(ctx.host) {
        // Without a probe the action names its own missing prerequisite.
        Some(StatusState::Unavailable) => {
            if let Some(probe) = action.probe() {
                let missing = format!("requires {}", probe.prerequisite());
                return ActionResult::failure(ActionError::PrerequisiteMissing(missing).to_string());
            }
        }
        Some(StatusState::Configured) => {
            let question = format!("{} is already configured. Skip it?", action.label());
            if ctx.input.confirm(&question, false) {
                log::info!("skipping '{}': already configured", action.id());
                return ActionResult::success_with("already configured");
            }
        }
        Some(StatusState::NotConfigured) | None => {}
    }

    match action.execute(manifest, ctx) {
        Ok(result) => result,
        Err(e) => {
            log::error!("{}: {e}", action.label());
            ActionResult::Failure {
                reason: e.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{FakeHost, RecordingRunner, ScriptedInput, StubAction, TestBed};
    use crate::probe::{Marker, Prerequisite, Probe};

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_string()).collect()
    }

    fn registry() -> (Registry, Vec<StubAction>) {
        let stubs = vec![
            StubAction::ok("0", "dev"),
            StubAction::failing("1", "dwm", "make: *** [dwm] Error 2"),
            StubAction::ok("2", "utils"),
        ];
        let registry = stubs
            .iter()
            .cloned()
            .fold(Registry::new(), |r, s| r.register(s));
        (registry, stubs)
    }

    #[test]
    fn test_one_outcome_per_id_in_order() {
        let (registry, stubs) = registry();
        let runner = RecordingRunner::new();
        let mut bed = TestBed::new();
        let mut ctx = bed.context(&runner, None);

        let report = Executor::new(&registry).run(
            &ids(&["2", "0", "1"]),
            &Manifest::new(),
            &mut ctx,
            &mut true,
        );

        assert_eq!(report.ids(), vec!["2", "0", "1"]);
        assert!(!report.halted);
        assert!(stubs.iter().all(|s| s.runs() == 1));
    }

    #[test]
    fn test_stops_after_first_failure() {
        let (registry, stubs) = registry();
        let runner = RecordingRunner::new();
        let mut bed = TestBed::new();
        let mut ctx = bed.context(&runner, None);

        let report = Executor::new(&registry).run(
            &ids(&["0", "1", "2"]),
            &Manifest::new(),
            &mut ctx,
            &mut false,
        );

        assert_eq!(report.ids(), vec!["0", "1"]);
        assert!(report.halted);
        assert_eq!(
            report.outcomes[1].result.reason(),
            Some("dwm failed: make: *** [dwm] Error 2")
        );
        assert_eq!(stubs[2].runs(), 0);
    }

    #[test]
    fn test_continue_on_failure_runs_everything() {
        let (registry, _) = registry();
        let runner = RecordingRunner::new();
        let mut bed = TestBed::new();
        let mut ctx = bed.context(&runner, None);

        let report = Executor::new(&registry).run(
            &ids(&["1", "2"]),
            &Manifest::new(),
            &mut ctx,
            &mut true,
        );

        assert_eq!(report.ids(), vec!["1", "2"]);
        assert_eq!(report.succeeded(), 1);
        assert!(report.has_failure());
    }

    #[test]
    fn test_invalid_id_is_failure_without_io() {
        let (registry, stubs) = registry();
        let runner = RecordingRunner::new();
        let mut bed = TestBed::new();
        let mut ctx = bed.context(&runner, None);

        let report = Executor::new(&registry).run(
            &ids(&["bogus-id"]),
            &Manifest::new(),
            &mut ctx,
            &mut false,
        );
        drop(ctx);

        assert_eq!(report.outcomes.len(), 1);
        assert_eq!(report.outcomes[0].result, ActionResult::failure("invalid option"));
        assert!(!report.halted);
        assert!(runner.programs().is_empty());
        assert!(stubs.iter().all(|s| s.runs() == 0));
        assert_eq!(bed.host.queries(), 0);
        assert_eq!(bed.progress.events, vec!["invalid bogus-id"]);
    }

    #[test]
    fn test_ask_operator_declines() {
        let (registry, stubs) = registry();
        let runner = RecordingRunner::new();
        let mut bed = TestBed::new().with_input(ScriptedInput::new(["n"]));
        let mut ctx = bed.context(&runner, None);

        let report = Executor::new(&registry).run(
            &ids(&["1", "2"]),
            &Manifest::new(),
            &mut ctx,
            &mut AskOperator,
        );

        assert_eq!(report.ids(), vec!["1"]);
        assert!(report.halted);
        assert_eq!(stubs[2].runs(), 0);
    }

    #[test]
    fn test_ask_operator_accepts() {
        let (registry, _) = registry();
        let runner = RecordingRunner::new();
        let mut bed = TestBed::new().with_input(ScriptedInput::new(["y"]));
        let mut ctx = bed.context(&runner, None);

        let report = Executor::new(&registry).run(
            &ids(&["1", "2"]),
            &Manifest::new(),
            &mut ctx,
            &mut AskOperator,
        );

        assert_eq!(report.ids(), vec!["1", "2"]);
        assert!(!report.halted);
    }

    #[test]
    fn test_unavailable_setting_not_executed() {
        let stub = StubAction::ok("1", "Emacs daemon").with_probe(
            Probe::new(Prerequisite::command("emacs")).marker(Marker::service_active("emacs.service")),
        );
        let registry = Registry::new().register(stub.clone());
        let runner = RecordingRunner::new();
        let mut bed = TestBed::new();
        let mut ctx = bed.context(&runner, None);

        let report =
            Executor::new(&registry).run(&ids(&["1"]), &Manifest::new(), &mut ctx, &mut true);

        assert_eq!(
            report.outcomes[0].result.reason(),
            Some("requires command 'emacs'")
        );
        assert_eq!(stub.runs(), 0);
    }

    #[test]
    fn test_configured_setting_skipped_only_on_confirmation() {
        let stub = StubAction::ok("4", "DWM session")
            .with_probe(Probe::new(Prerequisite::command("dwm")));
        let registry = Registry::new().register(stub.clone());
        let runner = RecordingRunner::new();
        let host = FakeHost::new().with_command("dwm");

        let mut bed = TestBed::new()
            .with_host(host.clone())
            .with_input(ScriptedInput::new(["y"]));
        let mut ctx = bed.context(&runner, None);
        let report =
            Executor::new(&registry).run(&ids(&["4"]), &Manifest::new(), &mut ctx, &mut true);
        assert_eq!(
            report.outcomes[0].result,
            ActionResult::success_with("already configured")
        );
        assert_eq!(stub.runs(), 0);

        // No answer means re-run.
        let mut bed = TestBed::new().with_host(host);
        let mut ctx = bed.context(&runner, None);
        Executor::new(&registry).run(&ids(&["4"]), &Manifest::new(), &mut ctx, &mut true);
        assert_eq!(stub.runs(), 1);
    }

    #[test]
    fn test_context_records_selection() {
        let (registry, _) = registry();
        let runner = RecordingRunner::new();
        let mut bed = TestBed::new();
        let mut ctx = bed.context(&runner, None);

        Executor::new(&registry).run(&ids(&["0", "2"]), &Manifest::new(), &mut ctx, &mut true);
        assert_eq!(ctx.selected, vec!["0", "2"]);
    }
}
