pub mod config;
pub mod error;
pub mod node;
pub mod plan;
pub mod state;

pub use config::{AppConfig, NodeCatalog};
pub use error::{PlanSteerError, Result};
pub use node::{NextNode, ToolNode};
pub use plan::{ExecutionStep, Plan, PlanData};
pub use state::{StateUpdate, WorkflowState};
