//! # Actionkit
//!
//! Sequential execution of named provisioning actions.
//!
//! ## Core Concepts
//!
//! - **Action**: a named unit of work with a uniform `execute` contract
//! - **Registry**: the ordered id-to-action table of one menu
//! - **Probe**: tri-state readiness check (`O`/`X`/`N`) against injected host queries
//! - **Fetcher**: ordered mirror fallback with a small per-mirror retry budget
//! - **Executor**: runs selected ids in order under a continue/abort policy
//!
//! Everything the engine needs from the host (subprocesses, privilege
//! elevation, host state, operator input, downloads) is behind a trait in
//! [`context`] or [`fetch`]; [`mock`] has in-memory fakes for all of them.
//!
//! ## Example
//!
//! ```
//! use actionkit::mock::{RecordingRunner, StubAction, TestBed};
//! use actionkit::{Executor, Registry};
//! use manifest::Manifest;
//!
//! let registry = Registry::new()
//!     .register(StubAction::ok("0", "Basic dev"))
//!     .register(StubAction::failing("1", "DWM", "make failed"));
//!
//! let runner = RecordingRunner::new();
//! let mut bed = TestBed::new();
//! let mut ctx = bed.context(&runner, None);
//!
//! let selected = vec!["0".to_string(), "1".to_string()];
//! let report = Executor::new(&registry).run(&selected, &Manifest::new(), &mut ctx, &mut false);
//! assert_eq!(report.succeeded(), 1);
//! assert!(report.has_failure());
//! ```

pub mod action;
pub mod context;
pub mod error;
pub mod executor;
pub mod fetch;
pub mod mock;
pub mod probe;
pub mod retry;
pub mod types;

pub use action::{Action, Registry};
pub use context::{
    CommandRunner, ExecutionContext, HostQuery, InputProvider, NoProgress, ProgressCallback,
    SudoProvider, parse_yes_no,
};
pub use error::{ActionError, ErrorCategory, FetchError, TransferError};
pub use executor::{AskOperator, ContinuePolicy, Executor};
pub use fetch::{FetchReport, Fetcher, HttpTransport, Transport, expand_templates};
pub use probe::{Marker, Prerequisite, Probe, StatusState, contains_line};
pub use retry::{PollConfig, RetryConfig, Strategy, poll_first, with_retry};
pub use types::{ActionResult, CommandOutput, CommandSpec, Outcome, RunReport};
