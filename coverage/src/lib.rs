//! Instruction coverage for a test run.
//!
//! Tests claim credit for the instructions they exercise with
//! `CoverageRegistry::track`; `report` prints which catalog instructions
//! were hit, by which tests, and which never were. A registry lives for one
//! test run and is cleared with `reset`.

use {serde::Serialize, std::collections::HashMap};

/// Every instruction of the Omnipair program.
pub const OMNIPAIR_INSTRUCTIONS: &[&str] = &[
    "viewPairData",
    "viewUserPositionData",
    "initFutarchyAuthority",
    "updateFutarchyAuthority",
    "claimProtocolFees",
    "distributeTokens",
    "initialize",
    "addLiquidity",
    "removeLiquidity",
    "swap",
    "addCollateral",
    "removeCollateral",
    "borrow",
    "repay",
    "liquidate",
    "flashloan",
];

const RULE_WIDTH: usize = 70;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct InstructionUsage {
    pub count: u64,
    /// Distinct test names, in first-seen order.
    pub tests: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageReport {
    pub covered: usize,
    pub total: usize,
    /// Rounded to two decimals.
    pub percentage: f64,
    pub tested_instructions: Vec<String>,
    pub untested_instructions: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct CoverageRegistry {
    catalog: Vec<String>,
    // Tracked names in first-tracked order.
    tracked: Vec<String>,
    usage: HashMap<String, InstructionUsage>,
}

impl CoverageRegistry {
    pub fn new<I, S>(catalog: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            catalog: catalog.into_iter().map(Into::into).collect(),
            tracked: Vec::new(),
            usage: HashMap::new(),
        }
    }

    pub fn omnipair() -> Self {
        Self::new(OMNIPAIR_INSTRUCTIONS.iter().copied())
    }

    /// Record one use of `instruction`, optionally crediting `test`.
    ///
    /// The invocation count always goes up; a test name is only added once
    /// per instruction.
    pub fn track(&mut self, instruction: &str, test: Option<&str>) {
        if !self.usage.contains_key(instruction) {
            self.tracked.push(instruction.to_string());
        }
        let usage = self.usage.entry(instruction.to_string()).or_default();
        usage.count += 1;
        if let Some(test) = test {
            if !usage.tests.iter().any(|known| known == test) {
                usage.tests.push(test.to_string());
            }
        }
        println!("  ✓ Tested: {instruction}");
    }

    pub fn usage(&self, instruction: &str) -> Option<&InstructionUsage> {
        self.usage.get(instruction)
    }

    pub fn catalog(&self) -> &[String] {
        &self.catalog
    }

    /// Coverage numbers without printing anything.
    pub fn data(&self) -> CoverageReport {
        let covered = self.tracked.len();
        let total = self.catalog.len();
        let percentage = if total == 0 {
            0.0
        } else {
            (covered as f64 / total as f64 * 10_000.0).round() / 100.0
        };
        CoverageReport {
            covered,
            total,
            percentage,
            tested_instructions: self.tracked.clone(),
            untested_instructions: self
                .catalog
                .iter()
                .filter(|name| !self.usage.contains_key(name.as_str()))
                .cloned()
                .collect(),
        }
    }

    /// Print the coverage report to stdout and return its numbers.
    pub fn report(&self) -> CoverageReport {
        let report = self.data();
        let rule = "═".repeat(RULE_WIDTH);

        println!("\n{rule}");
        println!("📊 INSTRUCTION COVERAGE REPORT");
        println!("{rule}");
        println!(
            "\n✅ Covered Instructions: {}/{} ({:.2}%)\n",
            report.covered, report.total, report.percentage
        );
        for name in &report.tested_instructions {
            let tests = self
                .usage
                .get(name)
                .map(|usage| usage.tests.as_slice())
                .unwrap_or_default();
            println!("  ✓ {:<25} [{} test(s)]", name, tests.len());
            for test in tests {
                println!("    └─ {test}");
            }
        }
        if !report.untested_instructions.is_empty() {
            println!(
                "\n❌ Untested Instructions: {}/{}\n",
                report.untested_instructions.len(),
                report.total
            );
            for name in &report.untested_instructions {
                println!("  ✗ {name}");
            }
        }
        println!("\n{rule}");
        println!(
            "Coverage: {:.2}% | Tests: {}/{}",
            report.percentage, report.covered, report.total
        );
        println!("{rule}\n");

        report
    }

    pub fn reset(&mut self) {
        self.tracked.clear();
        self.usage.clear();
    }
}

impl Default for CoverageRegistry {
    fn default() -> Self {
        Self::omnipair()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentage_rounding() {
        let mut registry = CoverageRegistry::new(["a", "b", "c"]);
        registry.track("a", None);
        assert_eq!(registry.data().percentage, 33.33);
        registry.track("b", None);
        assert_eq!(registry.data().percentage, 66.67);
    }

    #[test]
    fn test_empty_catalog() {
        let registry = CoverageRegistry::new(Vec::<String>::new());
        let data = registry.data();
        assert_eq!(data.total, 0);
        assert_eq!(data.percentage, 0.0);
    }
}
