pub mod cache;
pub mod dispatcher;
pub mod enumerate;
pub mod error;
pub mod frontier;
pub mod instance;
pub mod layout;
pub mod model;
pub mod oracle;
pub mod orchestrator;
pub mod report;
pub mod schedule;

pub use error::{Result, SearchError};
pub use model::{Combination, Container, ContainerId, Dimensions, Item, Position};
pub use schedule::schedule;
pub use enumerate::{enumerate, Combinations, Strategy};
pub use frontier::FailureFrontier;
pub use cache::{FeasibilityCache, FeasibilityRecord};
pub use layout::{OutputLayout, RunId};
pub use oracle::{Deadline, Oracle, OracleFailure, SolveRequest, SolverGateway, SolverKind, Verdict};
pub use orchestrator::{SearchOptions, SearchOrchestrator};
pub use dispatcher::{default_workers, DispatchReport, ParallelDispatcher, Unit, UnitCallback, UnitFailure};
pub use instance::{Instance, Task, TaskList};
pub use report::{
    CombinationResult, Provenance, PrunedEntry, ResolutionLog, ResolutionSummary, SweepSummary,
};
