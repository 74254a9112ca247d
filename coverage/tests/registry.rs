use {
    omnipair_harness_coverage::{CoverageRegistry, InstructionUsage, OMNIPAIR_INSTRUCTIONS},
    serde_json::json,
    std::sync::{Mutex, MutexGuard, OnceLock},
};

/// One registry shared by every test in this file, the way a suite shares it
/// across its cases.
fn shared_registry() -> MutexGuard<'static, CoverageRegistry> {
    static REGISTRY: OnceLock<Mutex<CoverageRegistry>> = OnceLock::new();
    REGISTRY
        .get_or_init(|| Mutex::new(CoverageRegistry::omnipair()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[test]
fn test_track_is_idempotent_per_test_name() {
    let mut registry = CoverageRegistry::omnipair();

    registry.track("swap", Some("testA"));
    registry.track("swap", Some("testA"));
    assert_eq!(
        registry.usage("swap"),
        Some(&InstructionUsage {
            count: 2,
            tests: vec!["testA".to_string()],
        })
    );
    assert_eq!(registry.data().covered, 1);

    registry.track("swap", Some("testB"));
    let usage = registry.usage("swap").unwrap();
    assert_eq!(usage.count, 3);
    assert_eq!(usage.tests, vec!["testA", "testB"]);
    assert_eq!(registry.data().covered, 1);

    registry.track("swap", None);
    assert_eq!(registry.usage("swap").unwrap().count, 4);
    assert_eq!(registry.usage("swap").unwrap().tests.len(), 2);
}

#[test]
fn test_report_completeness() {
    let mut registry = CoverageRegistry::omnipair();
    for name in ["borrow", "repay", "swap", "borrow"] {
        registry.track(name, Some("lending"));
    }

    let report = registry.report();
    assert_eq!(report.total, OMNIPAIR_INSTRUCTIONS.len());
    assert_eq!(report.covered, 3);
    assert_eq!(report.percentage, 18.75);
    assert_eq!(report.tested_instructions, vec!["borrow", "repay", "swap"]);

    let expected_untested: Vec<&str> = OMNIPAIR_INSTRUCTIONS
        .iter()
        .copied()
        .filter(|name| !["borrow", "repay", "swap"].contains(name))
        .collect();
    assert_eq!(report.untested_instructions, expected_untested);
    assert_eq!(report, registry.data());
}

#[test]
fn test_full_coverage() {
    let mut registry = CoverageRegistry::omnipair();
    for name in OMNIPAIR_INSTRUCTIONS {
        registry.track(name, None);
    }
    let report = registry.report();
    assert_eq!(report.covered, 16);
    assert_eq!(report.percentage, 100.0);
    assert!(report.untested_instructions.is_empty());
}

#[test]
fn test_names_outside_catalog_are_counted() {
    let mut registry = CoverageRegistry::new(["swap", "borrow"]);
    registry.track("skim", Some("misc"));
    let data = registry.data();
    assert_eq!(data.covered, 1);
    assert_eq!(data.total, 2);
    assert_eq!(data.percentage, 50.0);
    assert_eq!(data.untested_instructions, vec!["swap", "borrow"]);
}

#[test]
fn test_reset() {
    let mut registry = CoverageRegistry::omnipair();
    registry.track("flashloan", Some("flash"));
    registry.reset();

    let data = registry.data();
    assert_eq!(data.covered, 0);
    assert_eq!(data.percentage, 0.0);
    assert!(data.tested_instructions.is_empty());
    assert_eq!(data.untested_instructions.len(), OMNIPAIR_INSTRUCTIONS.len());
    assert_eq!(registry.usage("flashloan"), None);
}

#[test]
fn test_report_serializes_camel_case() {
    let mut registry = CoverageRegistry::new(["initialize", "swap"]);
    registry.track("initialize", None);
    assert_eq!(
        serde_json::to_value(registry.data()).unwrap(),
        json!({
            "covered": 1,
            "total": 2,
            "percentage": 50.0,
            "testedInstructions": ["initialize"],
            "untestedInstructions": ["swap"],
        })
    );
}

#[test]
fn test_shared_registry_accumulates() {
    {
        let mut registry = shared_registry();
        registry.track("addLiquidity", Some("test_shared_registry_accumulates"));
    }
    {
        let mut registry = shared_registry();
        registry.track("removeLiquidity", Some("test_shared_registry_accumulates"));
    }

    let registry = shared_registry();
    let data = registry.data();
    assert!(data
        .tested_instructions
        .contains(&"addLiquidity".to_string()));
    assert!(data
        .tested_instructions
        .contains(&"removeLiquidity".to_string()));
}
