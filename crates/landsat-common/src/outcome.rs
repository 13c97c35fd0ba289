//! Per-unit results and their aggregation into a batch report.

use serde::Serialize;
use std::fmt;

/// Which step of the workflow a unit belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Requesting and fetching an archive.
    Download,
    /// Turning an archive into a PNG.
    Extract,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Download => write!(f, "download"),
            Stage::Extract => write!(f, "extract"),
        }
    }
}

/// Result of processing a single unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum UnitOutcome {
    /// The unit produced its artifact.
    Succeeded,
    /// Nothing to do (for example, no images in the catalog for the window).
    Skipped { reason: String },
    /// The unit failed; the batch carried on without it.
    Failed { reason: String },
}

impl UnitOutcome {
    /// Shorthand for [`UnitOutcome::Skipped`].
    pub fn skipped(reason: impl Into<String>) -> Self {
        UnitOutcome::Skipped {
            reason: reason.into(),
        }
    }

    /// Shorthand for [`UnitOutcome::Failed`].
    pub fn failed(reason: impl Into<String>) -> Self {
        UnitOutcome::Failed {
            reason: reason.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, UnitOutcome::Succeeded)
    }
}

/// One line of the batch report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitReport {
    /// Region identifier.
    pub region: String,
    /// Archive or image name the unit produced (or would have).
    pub unit: String,
    /// Workflow step.
    pub stage: Stage,
    /// What happened.
    #[serde(flatten)]
    pub outcome: UnitOutcome,
}

/// All unit results of a batch, in processing order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    units: Vec<UnitReport>,
}

impl BatchReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome of one unit.
    pub fn record(
        &mut self,
        region: impl Into<String>,
        unit: impl Into<String>,
        stage: Stage,
        outcome: UnitOutcome,
    ) {
        self.units.push(UnitReport {
            region: region.into(),
            unit: unit.into(),
            stage,
            outcome,
        });
    }

    /// Append every unit of `other`, preserving its order.
    pub fn merge(&mut self, other: BatchReport) {
        self.units.extend(other.units);
    }

    pub fn units(&self) -> &[UnitReport] {
        &self.units
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Units for one region.
    pub fn for_region<'a>(&'a self, region: &'a str) -> impl Iterator<Item = &'a UnitReport> + 'a {
        self.units.iter().filter(move |u| u.region == region)
    }

    pub fn succeeded(&self) -> usize {
        self.count(|o| matches!(o, UnitOutcome::Succeeded))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, UnitOutcome::Skipped { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, UnitOutcome::Failed { .. }))
    }

    fn count(&self, pred: impl Fn(&UnitOutcome) -> bool) -> usize {
        self.units.iter().filter(|u| pred(&u.outcome)).count()
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} units: {} succeeded, {} skipped, {} failed",
            self.units.len(),
            self.succeeded(),
            self.skipped(),
            self.failed()
        )?;
        for unit in &self.units {
            match &unit.outcome {
                UnitOutcome::Succeeded => {}
                UnitOutcome::Skipped { reason } => {
                    writeln!(f, "  [{}] {} skipped: {}", unit.stage, unit.unit, reason)?
                }
                UnitOutcome::Failed { reason } => {
                    writeln!(f, "  [{}] {} failed: {}", unit.stage, unit.unit, reason)?
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> BatchReport {
        let mut report = BatchReport::new();
        report.record("R1", "R1_2010_5", Stage::Download, UnitOutcome::Succeeded);
        report.record("R1", "R1_2010_5", Stage::Extract, UnitOutcome::failed("missing band B3.tif"));
        report.record("R2", "R2_2010_5", Stage::Download, UnitOutcome::skipped("no images"));
        report
    }

    #[test]
    fn test_counts() {
        let report = sample();
        assert_eq!(report.units().len(), 3);
        assert_eq!(report.succeeded(), 1);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.skipped(), 1);
        assert_eq!(report.for_region("R1").count(), 2);
    }

    #[test]
    fn test_merge_keeps_order() {
        let mut a = BatchReport::new();
        a.record("A", "a", Stage::Download, UnitOutcome::Succeeded);
        let mut b = sample();
        b.record("Z", "z", Stage::Extract, UnitOutcome::Succeeded);
        a.merge(b);

        let regions: Vec<_> = a.units().iter().map(|u| u.region.as_str()).collect();
        assert_eq!(regions, vec!["A", "R1", "R1", "R2", "Z"]);
    }

    #[test]
    fn test_serialize_flattens_outcome() {
        let report = sample();
        let json = serde_json::to_value(&report).unwrap();
        let second = &json["units"][1];
        assert_eq!(second["stage"], "extract");
        assert_eq!(second["status"], "failed");
        assert_eq!(second["reason"], "missing band B3.tif");
        assert_eq!(json["units"][0]["status"], "succeeded");
    }

    #[test]
    fn test_display_lists_problems_only() {
        let text = sample().to_string();
        assert!(text.starts_with("3 units: 1 succeeded, 1 skipped, 1 failed"));
        assert!(text.contains("R1_2010_5 failed: missing band B3.tif"));
        assert!(text.contains("R2_2010_5 skipped: no images"));
        assert_eq!(text.lines().count(), 3);
    }
}
