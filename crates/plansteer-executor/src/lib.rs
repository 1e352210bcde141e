//! Plan executor node: validates a plan, optionally pauses it for human
//! review, and routes the step that is due to its downstream node.
//!
//! The `PlanExecutor` composes the three parts. Each invocation reads a
//! `WorkflowState` snapshot and returns a `Decision`, which renders to the
//! partial `StateUpdate` the outer engine merges.

pub mod decision;
pub mod executor;
pub mod review;
pub mod router;
pub mod validator;

pub use decision::Decision;
pub use executor::PlanExecutor;
pub use review::ReviewGate;
pub use router::StepRouter;
pub use validator::PlanValidator;
