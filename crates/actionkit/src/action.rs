//! Action trait and registry
//!
//! An [`Action`] is a named, independently selectable unit of provisioning
//! work. Each menu owns a [`Registry`] built once at startup; ids are
//! unique within it and registration order is display and `all` order.

use crate::context::{ExecutionContext, HostQuery};
use crate::error::ActionError;
use crate::probe::{Probe, StatusState};
use crate::types::ActionResult;
use manifest::Manifest;
use std::fmt;

/// Core trait for provisioning actions
///
/// # Example
///
/// ```ignore
/// use actionkit::{Action, ActionError, ActionResult, CommandSpec, ExecutionContext};
/// use manifest::Manifest;
///
/// #[derive(Debug)]
/// struct Hello;
///
/// impl Action for Hello {
///     fn id(&self) -> &str { "0" }
///     fn label(&self) -> &str { "Say hello" }
///
///     fn execute(
///         &self,
///         _manifest: &Manifest,
///         ctx: &mut ExecutionContext<'_>,
///     ) -> Result<ActionResult, ActionError> {
///         ctx.run_step("Greeting", &CommandSpec::new("echo", ["hello"]))?;
///         Ok(ActionResult::success())
///     }
/// }
/// ```
pub trait Action: fmt::Debug {
    /// Identifier typed by the operator, unique within a registry
    fn id(&self) -> &str;

    /// Human-readable description (display only)
    fn label(&self) -> &str;

    /// Status probe, for actions whose completion can be detected
    fn probe(&self) -> Option<&Probe> {
        None
    }

    fn is_idempotent(&self) -> bool {
        self.probe().is_some()
    }

    /// Current state, or `None` when the action has no probe
    fn status(&self, host: &dyn HostQuery) -> Option<StatusState> {
        self.probe().map(|p| p.evaluate(host))
    }

    /// Perform the work
    ///
    /// Composite actions stop at the first failing step and return its
    /// error; completed steps are not rolled back. The executor converts
    /// any `Err` into [`ActionResult::Failure`].
    fn execute(
        &self,
        manifest: &Manifest,
        ctx: &mut ExecutionContext<'_>,
    ) -> Result<ActionResult, ActionError>;
}

/// Ordered id-to-action table for one menu
#[derive(Debug, Default)]
pub struct Registry {
    actions: Vec<Box<dyn Action>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an action; an id that is already registered is ignored
    #[must_use]
    pub fn register(mut self, action: impl Action + 'static) -> Self {
        if self.get(action.id()).is_some() {
            log::warn!("duplicate action id '{}' ignored", action.id());
            return self;
        }
        self.actions.push(Box::new(action));
        self
    }

    pub fn get(&self, id: &str) -> Option<&dyn Action> {
        self.actions
            .iter()
            .find(|a| a.id() == id)
            .map(AsRef::as_ref)
    }

    /// All ids in registration order
    pub fn ids(&self) -> Vec<String> {
        self.actions.iter().map(|a| a.id().to_string()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn Action> {
        self.actions.iter().map(AsRef::as_ref)
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}
