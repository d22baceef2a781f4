//! Suitability rule chain
//!
//! Compatibility of one resolved item with one template and the field's
//! static context is decided by a fixed, ordered table of total predicates.
//! Every rule is evaluated on every pass; there is no short-circuit, so the
//! outcome carries one message per violated rule and the operator sees every
//! reason at once.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::domain::messages;
use crate::domain::qcable::Qcable;
use crate::domain::template::{TagTemplate, TemplateCatalog};

/// Static per-field configuration, supplied once at monitor construction and
/// never mutated afterwards.
#[derive(Debug, Clone)]
pub struct FieldContext {
    /// Whether the field must resolve to a passing item for the gate to open.
    /// Optional fields pass vacuously on empty input.
    pub required: bool,
    /// Whether the pool feeding this field was tagged with a dual-indexed
    /// source.
    pub dual_index_expected: bool,
    /// Shared read-only template catalog.
    pub catalog: Arc<TemplateCatalog>,
}

impl FieldContext {
    /// Creates a field context around a shared catalog.
    #[must_use]
    pub fn new(required: bool, dual_index_expected: bool, catalog: Arc<TemplateCatalog>) -> Self {
        Self {
            required,
            dual_index_expected,
            catalog,
        }
    }
}

/// One entry of the rule table: a named total predicate plus the violation
/// message emitted when the predicate does not hold.
pub struct SuitabilityRule {
    /// Short identifier used in trace logs.
    pub name: &'static str,
    /// Violation message shown to the operator.
    pub message: &'static str,
    predicate: fn(&Qcable, &TagTemplate, &FieldContext) -> bool,
}

impl SuitabilityRule {
    /// Whether the rule holds for the given inputs.
    #[must_use]
    pub fn holds(&self, item: &Qcable, template: &TagTemplate, context: &FieldContext) -> bool {
        (self.predicate)(item, template, context)
    }
}

impl std::fmt::Debug for SuitabilityRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SuitabilityRule")
            .field("name", &self.name)
            .field("message", &self.message)
            .finish()
    }
}

/// Result of one rule-chain evaluation. Recreated on every evaluation;
/// `valid` holds exactly when `messages` is empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleOutcome {
    /// True when no rule was violated.
    pub valid: bool,
    /// One message per violated rule, in chain order.
    pub messages: Vec<String>,
}

/// Ordered, non-short-circuiting chain of suitability rules.
#[derive(Debug)]
pub struct RuleChain {
    rules: Vec<SuitabilityRule>,
}

impl RuleChain {
    /// The canonical tag-plate rule set, in its fixed evaluation order.
    #[must_use]
    pub fn tag_plate() -> Self {
        Self {
            rules: vec![
                SuitabilityRule {
                    name: "item_available",
                    message: messages::rule::ITEM_NOT_AVAILABLE,
                    predicate: |item, _, _| item.state.is_available(),
                },
                SuitabilityRule {
                    name: "template_recognized",
                    message: messages::rule::UNRECOGNISED_TEMPLATE,
                    predicate: |_, template, _| template.recognized,
                },
                SuitabilityRule {
                    name: "approved_for_pipeline",
                    message: messages::rule::NOT_APPROVED_FOR_PIPELINE,
                    predicate: |_, template, _| template.approved_for_pipeline,
                },
                SuitabilityRule {
                    name: "template_unused",
                    message: messages::rule::TEMPLATE_ALREADY_USED,
                    predicate: |_, template, _| {
                        !(template.used_already && template.dual_index_capable)
                    },
                },
                SuitabilityRule {
                    name: "dual_index_required",
                    message: messages::rule::DUAL_INDEX_REQUIRED,
                    predicate: |_, template, context| {
                        !(context.dual_index_expected && !template.dual_index_capable)
                    },
                },
                SuitabilityRule {
                    name: "dual_index_unsupported",
                    message: messages::rule::DUAL_INDEX_UNSUPPORTED,
                    predicate: |_, template, context| {
                        !(!context.dual_index_expected && template.dual_index_capable)
                    },
                },
            ],
        }
    }

    /// Evaluates every rule against the inputs and collects all violation
    /// messages. Pure and deterministic; the chain itself is never mutated.
    #[must_use]
    pub fn evaluate(
        &self,
        item: &Qcable,
        template: &TagTemplate,
        context: &FieldContext,
    ) -> RuleOutcome {
        let mut violations = Vec::new();
        for rule in &self.rules {
            if !rule.holds(item, template, context) {
                tracing::trace!(rule = rule.name, item = %item.identifier, "rule violated");
                violations.push(rule.message.to_string());
            }
        }

        RuleOutcome {
            valid: violations.is_empty(),
            messages: violations,
        }
    }

    /// Number of rules in the chain.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether the chain holds no rules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Default for RuleChain {
    fn default() -> Self {
        Self::tag_plate()
    }
}
