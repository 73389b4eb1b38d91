/*!
Aggregation, insights, comparisons and what-if projections over recorded
election results.

A [`Dataset`] is assembled once with a [`builder::DatasetBuilder`] and then
only read. The query modules are plain functions over it:

- [`aggregation`]: totals per position, party, section and geographic unit, and rankings
- [`insights`]: leader insights, per-candidate metrics, zone distribution and competitors
- [`recommendations`]: a fixed rule table applied to the metrics of a candidate
- [`comparison`]: two candidates unit by unit
- [`projection`]: per-city multipliers applied to a candidate, and the simulation session

Unknown candidates, zones or scenarios never raise an error: the queries return
empty or zero results. See the [`manual`] for the command line front end.
*/

mod config;

pub mod aggregation;
pub mod builder;
pub mod collaborators;
pub mod comparison;
pub mod dataset;
pub mod insights;
pub mod manual;
pub mod projection;
pub mod recommendations;
pub mod scenarios;

pub use crate::config::*;
pub use crate::dataset::Dataset;

pub use crate::collaborators::{AnalysisAssistant, AssistantContext, CollaboratorFailure, DatasetProvider};
pub use crate::projection::{recompute, ProjectionResult, SimulationSession};
pub use crate::scenarios::{Scenario, ScenarioCatalog, ScenarioOutlook};
