//! Integration tests for the modfence library API.

use modfence::model::{ConfigIssueKind, Visibility};
use modfence::output::{JsonOutput, OutputFormatter};
use modfence::snapshot::{CodebaseSnapshot, ReferenceRecord, UnitRecord};
use modfence::{Config, Verification, ViolationReason, verify_snapshot};

fn unit(namespace: &str, name: &str, visibility: Visibility) -> UnitRecord {
    UnitRecord {
        namespace: namespace.to_string(),
        name: name.to_string(),
        visibility,
        tags: Vec::new(),
        references: Vec::new(),
    }
}

fn referencing(mut record: UnitRecord, targets: &[&str]) -> UnitRecord {
    for target in targets {
        record.references.push(ReferenceRecord {
            to: target.to_string(),
            external: false,
        });
    }
    record
}

fn snapshot(units: Vec<UnitRecord>) -> CodebaseSnapshot {
    CodebaseSnapshot {
        root: "example".to_string(),
        units,
    }
}

fn json_report(verification: &Verification) -> Vec<u8> {
    let mut buffer = Vec::new();
    JsonOutput::new().format(verification, &mut buffer).unwrap();
    buffer
}

#[test]
fn test_unrestricted_modules_may_reference_exposed_units() {
    // Scenario: two modules, no declared dependencies. Exposed surface
    // is fair game; internals never are.
    let snapshot = snapshot(vec![
        referencing(
            unit("example.inventory", "InventoryManagement", Visibility::Exposed),
            &["example.order.OrderManagement", "example.order.OrderRepository"],
        ),
        unit("example.inventory", "InventoryStore", Visibility::Internal),
        unit("example.order", "OrderManagement", Visibility::Exposed),
        unit("example.order", "OrderRepository", Visibility::Internal),
    ]);
    let verification = verify_snapshot(&snapshot, &Config::default(), None).unwrap();

    assert_eq!(verification.modules.len(), 2);
    assert_eq!(verification.violations.len(), 1);
    let violation = &verification.violations[0];
    assert_eq!(violation.reason, ViolationReason::InternalAccess);
    assert_eq!(violation.source, "example.inventory.InventoryManagement");
    assert_eq!(violation.target, "example.order.OrderRepository");
    assert_eq!(violation.source_module, "inventory");
    assert_eq!(violation.target_module, "order");
}

#[test]
fn test_named_interface_grant_scopes_access() {
    // Scenario: inventory may only use order's spi interface.
    let config = Config::from_toml(
        r#"
        [modules.inventory]
        allowed-dependencies = ["order :: spi"]

        [[modules.order.interfaces]]
        name = "spi"
        namespace = "example.order.spi"
        "#,
    )
    .unwrap();
    let snapshot = snapshot(vec![
        referencing(
            unit("example.inventory", "InventoryManagement", Visibility::Exposed),
            &[
                "example.order.spi.SomeSpiInterface",
                "example.order.OrderManagement",
            ],
        ),
        unit("example.order", "OrderManagement", Visibility::Exposed),
        unit("example.order.spi", "SomeSpiInterface", Visibility::Exposed),
    ]);
    let verification = verify_snapshot(&snapshot, &config, None).unwrap();

    assert!(verification.config_issues.is_empty());
    assert_eq!(verification.violations.len(), 1);
    let violation = &verification.violations[0];
    assert_eq!(
        violation.reason,
        ViolationReason::MissingNamedInterfaceGrant
    );
    assert_eq!(violation.target, "example.order.OrderManagement");
}

#[test]
fn test_nested_module_scoping() {
    // Scenario: a nested module under inventory. Nested code reaches
    // ancestor internals; outsiders need a grant on the nested module
    // and never see its internals.
    let config = Config::from_toml(
        r#"
        [modules.nested]
        namespace = "example.inventory.nested"

        [modules.order]
        allowed-dependencies = ["inventory"]
        "#,
    )
    .unwrap();
    let snapshot = snapshot(vec![
        unit("example.inventory", "InventoryManagement", Visibility::Exposed),
        unit("example.inventory.internal", "HiddenStore", Visibility::Internal),
        referencing(
            unit("example.inventory.nested", "NestedApi", Visibility::Exposed),
            &["example.inventory.internal.HiddenStore"],
        ),
        unit("example.inventory.nested", "NestedInternal", Visibility::Internal),
        referencing(
            unit("example.order", "OrderManagement", Visibility::Exposed),
            &[
                "example.inventory.nested.NestedInternal",
                "example.inventory.nested.NestedApi",
            ],
        ),
    ]);
    let verification = verify_snapshot(&snapshot, &config, None).unwrap();

    // NestedApi -> ancestor internal raised nothing.
    let reasons: Vec<(&str, ViolationReason)> = verification
        .violations
        .iter()
        .map(|v| (v.target.as_str(), v.reason))
        .collect();
    assert_eq!(
        reasons,
        vec![
            (
                "example.inventory.nested.NestedApi",
                ViolationReason::MissingNamedInterfaceGrant
            ),
            (
                "example.inventory.nested.NestedInternal",
                ViolationReason::InternalAccess
            ),
        ]
    );

    // The same references pass once order is granted the nested module.
    let granted = Config::from_toml(
        r#"
        [modules.nested]
        namespace = "example.inventory.nested"

        [modules.order]
        allowed-dependencies = ["inventory.nested"]
        "#,
    )
    .unwrap();
    let verification = verify_snapshot(&snapshot, &granted, None).unwrap();
    assert_eq!(verification.violations.len(), 1);
    assert_eq!(
        verification.violations[0].target,
        "example.inventory.nested.NestedInternal"
    );
}

#[test]
fn test_annotated_detection_with_zero_candidates_is_not_fatal() {
    let config = Config::from_toml(
        r#"
        [detection]
        strategy = "explicitly-annotated"
        "#,
    )
    .unwrap();
    let snapshot = snapshot(vec![unit(
        "example.order",
        "OrderManagement",
        Visibility::Exposed,
    )]);
    let verification = verify_snapshot(&snapshot, &config, None).unwrap();

    assert!(verification.modules.is_empty());
    assert!(verification.violations.is_empty());
    assert_eq!(verification.config_issues.len(), 1);
    assert_eq!(
        verification.config_issues[0].kind,
        ConfigIssueKind::NoCandidates
    );
}

#[test]
fn test_wildcard_equals_union_of_explicit_grants() {
    let base = r#"
        [[modules.order.interfaces]]
        name = "spi"
        namespace = "example.order.spi"

        [[modules.order.interfaces]]
        name = "api"
        namespace = "example.order.api"
    "#;
    let wildcard = Config::from_toml(&format!(
        "{base}\n[modules.inventory]\nallowed-dependencies = [\"order :: *\"]\n"
    ))
    .unwrap();
    let explicit = Config::from_toml(&format!(
        "{base}\n[modules.inventory]\nallowed-dependencies = [\"order :: spi\", \"order :: api\"]\n"
    ))
    .unwrap();

    let snapshot = snapshot(vec![
        referencing(
            unit("example.inventory", "InventoryManagement", Visibility::Exposed),
            &[
                "example.order.spi.SomeSpiInterface",
                "example.order.api.OrderApi",
                "example.order.OrderManagement",
            ],
        ),
        unit("example.order", "OrderManagement", Visibility::Exposed),
        unit("example.order.spi", "SomeSpiInterface", Visibility::Exposed),
        unit("example.order.api", "OrderApi", Visibility::Exposed),
    ]);

    let with_wildcard = verify_snapshot(&snapshot, &wildcard, None).unwrap();
    let with_explicit = verify_snapshot(&snapshot, &explicit, None).unwrap();

    assert_eq!(with_wildcard.violations, with_explicit.violations);
    // The unnamed interface stays outside the wildcard.
    assert_eq!(with_wildcard.violations.len(), 1);
    assert_eq!(
        with_wildcard.violations[0].target,
        "example.order.OrderManagement"
    );
}

#[test]
fn test_open_module_exposes_whole_subtree_once() {
    let config = Config::from_toml(
        r#"
        [modules.order]
        open = true

        [[modules.order.interfaces]]
        name = "spi"
        namespace = "example.order.spi"
        "#,
    )
    .unwrap();
    let snapshot = snapshot(vec![
        referencing(
            unit("example.inventory", "InventoryManagement", Visibility::Exposed),
            &["example.order.deep.Helper"],
        ),
        unit("example.order", "OrderManagement", Visibility::Exposed),
        unit("example.order.deep", "Helper", Visibility::Exposed),
        unit("example.order.spi", "SomeSpiInterface", Visibility::Exposed),
        unit("example.order.deep", "Secret", Visibility::Internal),
    ]);
    let verification = verify_snapshot(&snapshot, &config, None).unwrap();

    // Open module: the deep exposed unit joined the unnamed interface,
    // so the unrestricted reference to it is allowed.
    assert!(verification.is_clean());

    let tree = &verification.modules;
    let order = tree.resolve_name("order").unwrap();
    let module = tree.module(order);
    // Disjoint partition: spi holds the spi unit, the unnamed interface
    // holds the other two exposed units, internals join nothing.
    assert_eq!(module.unnamed_interface().members.len(), 2);
    assert_eq!(module.named_interface("spi").unwrap().members.len(), 1);
    let claimed: usize = module.interfaces.iter().map(|i| i.members.len()).sum();
    assert_eq!(claimed, 3);
}

#[test]
fn test_repeated_runs_are_byte_identical() {
    let config = Config::from_toml(
        r#"
        [modules.inventory]
        allowed-dependencies = ["order :: spi"]

        [[modules.order.interfaces]]
        name = "spi"
        namespace = "example.order.spi"
        "#,
    )
    .unwrap();
    let snapshot = snapshot(vec![
        referencing(
            unit("example.inventory", "InventoryManagement", Visibility::Exposed),
            &["example.order.OrderManagement", "example.catalog.Catalog"],
        ),
        referencing(
            unit("example.catalog", "Catalog", Visibility::Exposed),
            &["example.inventory.InventoryManagement"],
        ),
        unit("example.order", "OrderManagement", Visibility::Exposed),
        unit("example.order.spi", "SomeSpiInterface", Visibility::Exposed),
    ]);

    let first = verify_snapshot(&snapshot, &config, None).unwrap();
    let second = verify_snapshot(&snapshot, &config, None).unwrap();
    assert_eq!(json_report(&first), json_report(&second));
}

#[test]
fn test_external_references_never_raise_violations() {
    let mut source = unit("example.order", "OrderManagement", Visibility::Exposed);
    source.references.push(ReferenceRecord {
        to: "java.util.List".to_string(),
        external: true,
    });
    let snapshot = snapshot(vec![
        source,
        unit("example.inventory", "InventoryManagement", Visibility::Exposed),
    ]);
    let verification = verify_snapshot(&snapshot, &Config::default(), None).unwrap();

    assert!(verification.is_clean());
    assert_eq!(verification.stats.external_references, 1);
    assert_eq!(verification.stats.references, 0);
}

#[test]
fn test_dangling_reference_is_a_fatal_contract_error() {
    let snapshot = snapshot(vec![referencing(
        unit("example.order", "OrderManagement", Visibility::Exposed),
        &["example.ghost.Missing"],
    )]);
    let result = verify_snapshot(&snapshot, &Config::default(), None);
    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("example.ghost.Missing"));
}

#[test]
fn test_unknown_grant_targets_degrade_to_config_issues() {
    let config = Config::from_toml(
        r#"
        [modules.inventory]
        allowed-dependencies = ["ghost", "order"]
        "#,
    )
    .unwrap();
    let snapshot = snapshot(vec![
        referencing(
            unit("example.inventory", "InventoryManagement", Visibility::Exposed),
            &["example.order.OrderManagement"],
        ),
        unit("example.order", "OrderManagement", Visibility::Exposed),
    ]);
    let verification = verify_snapshot(&snapshot, &config, None).unwrap();

    // The bad entry is reported; the good entry still grants access.
    assert!(verification.is_clean());
    assert_eq!(verification.config_issues.len(), 1);
    assert_eq!(
        verification.config_issues[0].kind,
        ConfigIssueKind::UnknownModule
    );
}
