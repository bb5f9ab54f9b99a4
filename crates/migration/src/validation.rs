//! Per-material migration gate.
//!
//! Decides whether a material may be migrated. Pure apart from the read-only
//! reference lookups delegated to a [`ReferenceChecker`].

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use variantforge_catalog::{CategoryId, Material, UnitOfMeasureId};

use crate::options::MigrationFlags;
use crate::ports::ReferenceChecker;

/// One failed check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "issue", rename_all = "snake_case")]
pub enum ValidationIssue {
    MissingName,
    MissingUnit,
    MissingCategory,
    UnknownCategory { category_id: CategoryId },
    UnknownUnit { unit_id: UnitOfMeasureId },
    InvalidQuantity { quantity: f64 },
    InvalidUnitValue { unit_value: f64 },
    /// The existence lookup itself failed; the reference is treated as unknown.
    LookupFailed {
        reference: Reference,
        id: String,
        message: String,
    },
}

/// Kind of reference a material points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reference {
    Category,
    Unit,
}

impl core::fmt::Display for Reference {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Reference::Category => f.write_str("category"),
            Reference::Unit => f.write_str("unit of measure"),
        }
    }
}

impl core::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ValidationIssue::MissingName => f.write_str("name is empty"),
            ValidationIssue::MissingUnit => f.write_str("unit of measure is missing"),
            ValidationIssue::MissingCategory => f.write_str("category is missing"),
            ValidationIssue::UnknownCategory { category_id } => {
                write!(f, "category {category_id} does not exist")
            }
            ValidationIssue::UnknownUnit { unit_id } => {
                write!(f, "unit of measure {unit_id} does not exist")
            }
            ValidationIssue::InvalidQuantity { quantity } => {
                write!(f, "quantity {quantity} is not a non-negative number")
            }
            ValidationIssue::InvalidUnitValue { unit_value } => {
                write!(f, "unit value {unit_value} is not a non-negative number")
            }
            ValidationIssue::LookupFailed { reference, id, message } => {
                write!(f, "could not verify {reference} {id}: {message}")
            }
        }
    }
}

impl ValidationIssue {
    fn unresolved_category(&self) -> bool {
        match self {
            ValidationIssue::UnknownCategory { .. } => true,
            ValidationIssue::LookupFailed { reference, .. } => *reference == Reference::Category,
            _ => false,
        }
    }

    fn unresolved_unit(&self) -> bool {
        match self {
            ValidationIssue::UnknownUnit { .. } => true,
            ValidationIssue::LookupFailed { reference, .. } => *reference == Reference::Unit,
            _ => false,
        }
    }
}

/// Verdict of the gate for one material.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationOutcome {
    /// Every check passed.
    Passed,
    /// Validation was bypassed on request.
    Skipped,
    /// Checks failed but force migration is on; proceed with defaults.
    PassedWithWarnings(Vec<ValidationIssue>),
    /// Checks failed; do not transform or persist.
    Rejected(Vec<ValidationIssue>),
}

impl ValidationOutcome {
    pub fn may_proceed(&self) -> bool {
        !matches!(self, ValidationOutcome::Rejected(_))
    }

    pub fn issues(&self) -> &[ValidationIssue] {
        match self {
            ValidationOutcome::Passed | ValidationOutcome::Skipped => &[],
            ValidationOutcome::PassedWithWarnings(issues) | ValidationOutcome::Rejected(issues) => {
                issues
            }
        }
    }

    /// Human-readable issue list, one entry per failed check.
    pub fn messages(&self) -> Vec<String> {
        self.issues().iter().map(ToString::to_string).collect()
    }

    /// Copy of `material` with unresolvable references replaced by defaults
    /// (no category, no unit). Identity for anything but a forced pass.
    pub fn apply_defaults(&self, material: &Material) -> Material {
        let mut adjusted = material.clone();
        if let ValidationOutcome::PassedWithWarnings(issues) = self {
            if issues.iter().any(ValidationIssue::unresolved_category) {
                adjusted.category_id = None;
            }
            if issues.iter().any(ValidationIssue::unresolved_unit) {
                adjusted.unit_id = None;
            }
        }
        adjusted
    }
}

/// Decides, per material, whether migration may proceed.
#[derive(Clone)]
pub struct ValidationGate {
    references: Arc<dyn ReferenceChecker>,
}

impl ValidationGate {
    pub fn new(references: Arc<dyn ReferenceChecker>) -> Self {
        Self { references }
    }

    pub async fn validate(&self, material: &Material, flags: MigrationFlags) -> ValidationOutcome {
        if flags.skip_validation {
            return ValidationOutcome::Skipped;
        }

        let issues = self.check(material).await;
        if issues.is_empty() {
            ValidationOutcome::Passed
        } else if flags.force_migration {
            ValidationOutcome::PassedWithWarnings(issues)
        } else {
            ValidationOutcome::Rejected(issues)
        }
    }

    /// Run every check and collect all failures (not just the first).
    pub async fn check(&self, material: &Material) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();

        if material.trimmed_name().is_none() {
            issues.push(ValidationIssue::MissingName);
        }
        if !material.quantity.is_finite() || material.quantity < 0.0 {
            issues.push(ValidationIssue::InvalidQuantity {
                quantity: material.quantity,
            });
        }
        if !material.unit_value.is_finite() || material.unit_value < 0.0 {
            issues.push(ValidationIssue::InvalidUnitValue {
                unit_value: material.unit_value,
            });
        }

        match material.category_id {
            None => issues.push(ValidationIssue::MissingCategory),
            Some(category_id) => match self.references.category_exists(category_id).await {
                Ok(true) => {}
                Ok(false) => issues.push(ValidationIssue::UnknownCategory { category_id }),
                Err(e) => issues.push(ValidationIssue::LookupFailed {
                    reference: Reference::Category,
                    id: category_id.to_string(),
                    message: e.to_string(),
                }),
            },
        }

        match material.unit_id {
            None => issues.push(ValidationIssue::MissingUnit),
            Some(unit_id) => match self.references.unit_exists(unit_id).await {
                Ok(true) => {}
                Ok(false) => issues.push(ValidationIssue::UnknownUnit { unit_id }),
                Err(e) => issues.push(ValidationIssue::LookupFailed {
                    reference: Reference::Unit,
                    id: unit_id.to_string(),
                    message: e.to_string(),
                }),
            },
        }

        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeReferences;
    use variantforge_catalog::MaterialId;

    fn gate(refs: FakeReferences) -> ValidationGate {
        ValidationGate::new(Arc::new(refs))
    }

    fn valid_material(refs: &FakeReferences) -> Material {
        Material::new(MaterialId::new(), "Paint-5L")
            .with_category(refs.category())
            .with_unit(refs.unit(), 5.0)
            .with_quantity(5.0)
    }

    #[tokio::test]
    async fn well_formed_material_passes() {
        let refs = FakeReferences::seeded();
        let material = valid_material(&refs);

        let outcome = gate(refs).validate(&material, MigrationFlags::default()).await;

        assert_eq!(outcome, ValidationOutcome::Passed);
    }

    #[tokio::test]
    async fn skip_validation_passes_anything() {
        let refs = FakeReferences::seeded();
        let material = Material::new(MaterialId::new(), "");
        let flags = MigrationFlags::default().with_skip_validation(true);

        let outcome = gate(refs).validate(&material, flags).await;

        assert_eq!(outcome, ValidationOutcome::Skipped);
        assert!(outcome.may_proceed());
    }

    #[tokio::test]
    async fn missing_category_is_rejected_without_force() {
        let refs = FakeReferences::seeded();
        let mut material = valid_material(&refs);
        material.category_id = None;

        let outcome = gate(refs).validate(&material, MigrationFlags::default()).await;

        assert_eq!(
            outcome,
            ValidationOutcome::Rejected(vec![ValidationIssue::MissingCategory])
        );
        assert!(!outcome.may_proceed());
    }

    #[tokio::test]
    async fn force_turns_rejection_into_warnings() {
        let refs = FakeReferences::seeded();
        let mut material = valid_material(&refs);
        material.category_id = None;
        let flags = MigrationFlags::default().with_force_migration(true);

        let outcome = gate(refs).validate(&material, flags).await;

        assert!(outcome.may_proceed());
        assert_eq!(outcome.messages(), vec!["category is missing".to_string()]);
    }

    #[tokio::test]
    async fn collects_every_failed_check() {
        let refs = FakeReferences::seeded();
        let material = Material::new(MaterialId::new(), "  ")
            .with_category(CategoryId::new())
            .with_quantity(-3.0);

        let issues = gate(refs).check(&material).await;

        assert_eq!(issues.len(), 4);
        assert!(issues.contains(&ValidationIssue::MissingName));
        assert!(issues.contains(&ValidationIssue::MissingUnit));
        assert!(issues.contains(&ValidationIssue::InvalidQuantity { quantity: -3.0 }));
        assert!(matches!(
            issues.iter().find(|i| matches!(i, ValidationIssue::UnknownCategory { .. })),
            Some(_)
        ));
    }

    #[tokio::test]
    async fn lookup_failure_is_an_issue_not_an_error() {
        let refs = FakeReferences::seeded().failing_lookups();
        let material = valid_material(&refs);

        let issues = gate(refs).check(&material).await;

        assert_eq!(issues.len(), 2);
        assert!(issues.iter().all(|i| matches!(i, ValidationIssue::LookupFailed { .. })));
    }

    #[tokio::test]
    async fn forced_defaults_drop_unknown_references() {
        let refs = FakeReferences::seeded();
        let material = Material::new(MaterialId::new(), "Tile")
            .with_category(CategoryId::new())
            .with_unit(UnitOfMeasureId::new(), 1.0);
        let flags = MigrationFlags::default().with_force_migration(true);

        let outcome = gate(refs).validate(&material, flags).await;
        let adjusted = outcome.apply_defaults(&material);

        assert_eq!(adjusted.category_id, None);
        assert_eq!(adjusted.unit_id, None);
        assert_eq!(adjusted.name, "Tile");
    }

    #[tokio::test]
    async fn defaults_are_not_applied_on_plain_pass() {
        let refs = FakeReferences::seeded();
        let material = valid_material(&refs);

        let outcome = gate(refs).validate(&material, MigrationFlags::default()).await;

        assert_eq!(outcome.apply_defaults(&material), material);
    }
}
