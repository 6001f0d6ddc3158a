use crate::catalog::{AttributeKind, ComponentType, RequiredAttribute};
use crate::diagram::{Details, Node};
use serde_json::Value;

/// Decides whether a single checklist value is filled in for its kind.
///
/// * Boolean: any explicit `true`/`false`.
/// * Number: a JSON number, or a string that parses to a finite number.
/// * Text: a string that is non-empty after trimming, or a number.
pub fn is_attribute_satisfied(kind: AttributeKind, value: Option<&Value>) -> bool {
    match (kind, value) {
        (_, None) | (_, Some(Value::Null)) => false,
        (AttributeKind::Boolean, Some(v)) => v.is_boolean(),
        (AttributeKind::Number, Some(Value::Number(n))) => n.as_f64().is_some_and(f64::is_finite),
        (AttributeKind::Number, Some(Value::String(s))) => {
            let trimmed = s.trim();
            !trimmed.is_empty() && trimmed.parse::<f64>().is_ok_and(f64::is_finite)
        }
        (AttributeKind::Text, Some(Value::String(s))) => !s.trim().is_empty(),
        (AttributeKind::Text, Some(Value::Number(_))) => true,
        _ => false,
    }
}

/// True if `details` satisfies every required attribute of `component_type`.
pub fn details_satisfy(component_type: ComponentType, details: &Details) -> bool {
    component_type
        .required_attributes()
        .iter()
        .all(|attr| is_attribute_satisfied(attr.kind, details.get(attr.name)))
}

/// Recomputes a node's `is_detailed` flag from its current details.
pub fn compute_is_detailed(node: &Node) -> bool {
    details_satisfy(node.component_type, &node.details)
}

/// The required attributes that are still unsatisfied, in checklist order.
pub fn missing_attributes(node: &Node) -> Vec<&'static RequiredAttribute> {
    node.component_type
        .required_attributes()
        .iter()
        .filter(|attr| !is_attribute_satisfied(attr.kind, node.details.get(attr.name)))
        .collect()
}
