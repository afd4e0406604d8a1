//! JSON report written after a search.

use std::{fs, path::Path};

use serde::Serialize;

use siteplan::{
    Problem,
    classifier::ProblemSummary,
    constraints::{ConstraintHandler, ValidationReport},
    fitness::FitnessBreakdown,
    generator::SeedAnchor,
    placement::Placement,
    search::{SearchOutcome, SearchStats, Solution},
};

use crate::CliError;

/// Everything the CLI reports about one run.
#[derive(Debug, Serialize)]
pub struct Report<'a> {
    pub problem: ProblemSummary,
    pub stats: &'a SearchStats,
    pub solutions: Vec<SolutionReport>,
}

#[derive(Debug, Serialize)]
pub struct SolutionReport {
    pub rank: usize,
    pub code: String,
    pub anchor: SeedAnchor,
    pub fitness: f32,
    pub breakdown: FitnessBreakdown,
    pub units: Vec<UnitReport>,
    pub unplaced: Vec<String>,
    pub validation: ValidationReport,
    pub suggestions: Vec<&'static str>,
}

#[derive(Debug, Serialize)]
pub struct UnitReport {
    pub id: String,
    pub building_type: &'static str,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub rotation: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachment: Option<AttachmentReport>,
}

#[derive(Debug, Serialize)]
pub struct AttachmentReport {
    pub direction: &'static str,
    pub gap: f32,
}

impl<'a> Report<'a> {
    pub fn new(problem: &Problem, outcome: &'a SearchOutcome, constraints: &ConstraintHandler<'_>) -> Self {
        Self {
            problem: problem.summary(),
            stats: &outcome.stats,
            solutions: outcome
                .solutions
                .iter()
                .map(|solution| SolutionReport::new(solution, constraints))
                .collect(),
        }
    }
}

impl SolutionReport {
    fn new(solution: &Solution, constraints: &ConstraintHandler<'_>) -> Self {
        let state = solution.state();
        Self {
            rank: solution.rank(),
            code: solution.code().to_string(),
            anchor: solution.anchor(),
            fitness: solution.fitness().total,
            breakdown: *solution.fitness(),
            units: state.iter().map(UnitReport::from).collect(),
            unplaced: state.unplaced().iter().map(ToString::to_string).collect(),
            validation: constraints.report(state),
            suggestions: solution.fitness().suggestions(),
        }
    }
}

impl From<&Placement> for UnitReport {
    fn from(placement: &Placement) -> Self {
        let bounds = placement.bounds();
        Self {
            id: placement.id().to_string(),
            building_type: placement.building_type().as_str(),
            x: bounds.min_x(),
            y: bounds.min_y(),
            width: bounds.width(),
            height: bounds.height(),
            rotation: placement.rotation().degrees(),
            attachment: placement.attachment().map(|attachment| AttachmentReport {
                direction: attachment.direction().as_str(),
                gap: attachment.gap(),
            }),
        }
    }
}

/// Writes `report` as pretty-printed JSON.
///
/// # Errors
///
/// Returns [`CliError::Output`] when serialization fails and
/// [`CliError::Io`] when the file cannot be written.
pub fn write_report(path: impl AsRef<Path>, report: &Report<'_>) -> Result<(), CliError> {
    let json = serde_json::to_string_pretty(report).map_err(CliError::Output)?;
    fs::write(path, json)?;
    Ok(())
}
