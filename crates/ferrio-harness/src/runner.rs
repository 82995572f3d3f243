//! Scenario execution engine.

use std::time::Instant;

use crate::fixtures::Scenario;
use crate::structured_log::{LogEmitter, LogEntry, LogLevel, Outcome};
use crate::HarnessError;

/// Result of one executed scenario.
pub struct VerificationResult {
    pub name: String,
    pub contract: String,
    pub passed: bool,
    pub detail: Option<String>,
    pub duration_ms: u64,
}

/// Runs scenarios and logs structured results.
pub struct Runner {
    pub campaign: String,
}

impl Runner {
    #[must_use]
    pub fn new(campaign: impl Into<String>) -> Self {
        Self {
            campaign: campaign.into(),
        }
    }

    /// Run the scenarios matching `filter` (substring; empty matches
    /// all), emitting one JSONL record per scenario.
    pub fn run(
        &self,
        scenarios: &[Scenario],
        filter: &str,
        log: &mut LogEmitter,
    ) -> Result<Vec<VerificationResult>, HarnessError> {
        let _guard = crate::fixtures::serial_guard();
        let mut results = Vec::new();
        for scenario in scenarios {
            if !filter.is_empty() && !scenario.name.contains(filter) {
                continue;
            }
            let start = Instant::now();
            let outcome = (scenario.run)();
            let duration_ms = start.elapsed().as_millis() as u64;

            let passed = outcome.is_ok();
            let detail = outcome.err();
            let mut entry = LogEntry::new(
                &self.campaign,
                if passed { LogLevel::Info } else { LogLevel::Error },
                "scenario_finished",
            )
            .scenario(scenario.name, scenario.contract)
            .outcome(if passed { Outcome::Pass } else { Outcome::Fail });
            entry.duration_ms = Some(duration_ms);
            if let Some(d) = &detail {
                entry = entry.detail(d.clone());
            }
            log.emit(&entry)?;

            results.push(VerificationResult {
                name: scenario.name.to_string(),
                contract: scenario.contract.to_string(),
                passed,
                detail,
                duration_ms,
            });
        }
        Ok(results)
    }
}
