//! Static remediation suggestions keyed by (metric, tier).

use std::collections::{HashMap, HashSet};

use hostwatch_core::{ClassifiedMetric, MetricKind, Severity};

/// Looks up human-readable remediation hints for classified metrics.
#[derive(Debug, Clone)]
pub struct SuggestionEngine {
    rules: HashMap<(MetricKind, Severity), Vec<&'static str>>,
}

impl SuggestionEngine {
    pub fn new() -> Self {
        Self {
            rules: builtin_rules(),
        }
    }

    /// Suggestions for every matched metric, de-duplicated in first-seen order.
    pub fn generate(&self, classified: &[ClassifiedMetric]) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();

        for item in classified {
            let Some(hints) = self.rules.get(&(item.metric, item.tier)) else {
                continue;
            };
            for hint in hints {
                if seen.insert(*hint) {
                    out.push((*hint).to_string());
                }
            }
        }

        if !out.is_empty() {
            tracing::debug!(count = out.len(), "generated optimization suggestions");
        }
        out
    }
}

impl Default for SuggestionEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn builtin_rules() -> HashMap<(MetricKind, Severity), Vec<&'static str>> {
    use MetricKind::*;
    use Severity::*;

    HashMap::from([
        (
            (Cpu, Warning),
            vec![
                "Close unnecessary background applications.",
                "Check for high CPU-consuming processes.",
            ],
        ),
        (
            (Cpu, High),
            vec![
                "Restart heavy applications.",
                "Scan system for malware or runaway processes.",
                "Consider upgrading CPU or optimizing workloads.",
            ],
        ),
        (
            (Cpu, Critical),
            vec![
                "Immediate action required: stop non-essential services.",
                "System may overheat or become unstable.",
                "Restart system if safe to do so.",
            ],
        ),
        (
            (Ram, Warning),
            vec![
                "Close unused browser tabs and applications.",
                "Monitor memory usage of running programs.",
            ],
        ),
        (
            (Ram, High),
            vec![
                "Clear memory-intensive background services.",
                "Increase swap memory if supported.",
            ],
        ),
        (
            (Ram, Critical),
            vec![
                "System memory exhausted, risk of crash.",
                "Restart system and consider adding more RAM.",
            ],
        ),
        (
            (Disk, Warning),
            vec![
                "Clean temporary files and unused data.",
                "Check disk usage by large folders.",
            ],
        ),
        (
            (Disk, High),
            vec![
                "Move data to external storage.",
                "Uninstall unused applications.",
            ],
        ),
        (
            (Disk, Critical),
            vec![
                "Disk almost full, system performance severely impacted.",
                "Free disk space immediately or upgrade storage.",
            ],
        ),
        (
            (Network, Warning),
            vec![
                "Check background downloads or uploads.",
                "Monitor network usage per application.",
            ],
        ),
        (
            (Network, High),
            vec![
                "Limit bandwidth-heavy applications.",
                "Check for unauthorized network activity.",
            ],
        ),
        (
            (Network, Critical),
            vec![
                "Possible network congestion or misuse detected.",
                "Disconnect unnecessary devices and investigate traffic.",
            ],
        ),
        (
            (Temperature, Warning),
            vec![
                "Ensure proper ventilation around the system.",
                "Clean dust from fans and vents.",
            ],
        ),
        (
            (Temperature, High),
            vec![
                "Reduce system load immediately.",
                "Check cooling system or fan operation.",
            ],
        ),
        (
            (Temperature, Critical),
            vec![
                "Critical overheating detected.",
                "Shut down system to prevent hardware damage.",
            ],
        ),
        (
            (ProcessCount, High),
            vec!["Review long-running or orphaned processes."],
        ),
        (
            (ProcessCount, Critical),
            vec![
                "Review long-running or orphaned processes.",
                "Check for fork loops or runaway service restarts.",
            ],
        ),
        (
            (LoadAverage, High),
            vec!["Check for high CPU-consuming processes."],
        ),
        (
            (LoadAverage, Critical),
            vec![
                "Check for high CPU-consuming processes.",
                "Investigate processes blocked on I/O.",
            ],
        ),
    ])
}
