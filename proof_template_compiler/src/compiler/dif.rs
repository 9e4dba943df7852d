use proof_template_types::{
    data_types::{
        operator::ValueOperator,
        presentation_definition::{
            ConstraintField, ConstraintFilter, Constraints, HolderConstraint, HolderDirective,
            InputDescriptor, SchemaUri,
        },
        template::{AttributeGroup, Condition},
    },
    error::ValidationError,
};
use serde_json::Number;
use uuid::Uuid;

use crate::errors::error::{CompilerError, CompilerResult};

/// Claim paths checked for the issuer identifier. Both spellings occur in
/// issued credentials, depending on whether the issuer is an object or a
/// bare identifier.
const ISSUER_PATHS: [&str; 2] = ["$.issuer.id", "$.issuer"];

/// Builds the input descriptor for one attribute group.
///
/// The descriptor id is derived from the expanded credential type within the
/// definition's namespace, salted with `occurrence` when several groups
/// target the same type, so repeated compilations stay byte-identical.
pub(crate) fn build_input_descriptor(
    group: &AttributeGroup,
    expanded_type: &str,
    definition_id: &Uuid,
    occurrence: usize,
) -> CompilerResult<InputDescriptor> {
    let descriptor_name = if occurrence <= 1 {
        expanded_type.to_owned()
    } else {
        format!("{expanded_type}#{occurrence}")
    };
    let descriptor_id = Uuid::new_v5(definition_id, descriptor_name.as_bytes());

    let mut fields = Vec::new();
    if let Some(issuer_did) = first_issuer_restriction(group) {
        fields.push(constraint_field(
            &descriptor_id,
            ISSUER_PATHS.map(str::to_owned).to_vec(),
            ConstraintFilter {
                const_value: Some(issuer_did.to_owned()),
                ..Default::default()
            },
        ));
    }
    for attribute in &group.attributes {
        if let Some(ref condition) = attribute.condition {
            fields.push(constraint_field(
                &descriptor_id,
                vec![format!("$.credentialSubject.{}", attribute.name)],
                condition_filter(condition)?,
            ));
        }
    }

    let is_holder = if fields.is_empty() {
        vec![]
    } else {
        vec![HolderConstraint {
            field_id: fields
                .iter()
                .filter_map(|field| field.id.clone())
                .collect(),
            directive: HolderDirective::Required,
        }]
    };

    Ok(InputDescriptor::builder()
        .id(descriptor_id.to_string())
        .schema(vec![SchemaUri {
            uri: expanded_type.to_owned(),
        }])
        .constraints(Constraints { fields, is_holder })
        .build())
}

/// Issuer alternatives beyond the first cannot be expressed inside a single
/// descriptor, where fields conjoin. The remaining restriction fields are
/// ledger concepts without a claim path and are not emitted at all.
fn first_issuer_restriction(group: &AttributeGroup) -> Option<&str> {
    group
        .restrictions
        .iter()
        .find_map(|restriction| restriction.issuer_did.as_deref())
}

fn constraint_field(
    descriptor_id: &Uuid,
    path: Vec<String>,
    filter: ConstraintFilter,
) -> ConstraintField {
    let field_id = Uuid::new_v5(descriptor_id, path[0].as_bytes());
    ConstraintField::builder()
        .id(Some(field_id.to_string()))
        .path(path)
        .filter(Some(filter))
        .build()
}

fn condition_filter(condition: &Condition) -> CompilerResult<ConstraintFilter> {
    let filter = match condition.operator {
        ValueOperator::Equals => ConstraintFilter {
            const_value: Some(condition.value.clone()),
            ..Default::default()
        },
        ValueOperator::GreaterThan => ConstraintFilter {
            exclusive_minimum: Some(bound(condition)?),
            ..Default::default()
        },
        ValueOperator::GreaterThanOrEqual => ConstraintFilter {
            minimum: Some(bound(condition)?),
            ..Default::default()
        },
        ValueOperator::LessThan => ConstraintFilter {
            exclusive_maximum: Some(bound(condition)?),
            ..Default::default()
        },
        ValueOperator::LessThanOrEqual => ConstraintFilter {
            maximum: Some(bound(condition)?),
            ..Default::default()
        },
    };
    Ok(filter)
}

fn bound(condition: &Condition) -> CompilerResult<Number> {
    let value: i32 = condition.value.parse().map_err(|_| {
        CompilerError::Validation(ValidationError::InvalidConditionValue {
            operator: condition.operator.as_ref().to_owned(),
            value: condition.value.clone(),
            reason: "predicate values must be 32-bit signed integers".to_owned(),
        })
    })?;
    Ok(Number::from(value))
}
