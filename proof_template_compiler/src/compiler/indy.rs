use std::collections::BTreeMap;

use proof_template_types::{
    data_types::{
        identifiers::LedgerSchemaId,
        operator::ValueOperator,
        proof_request::{PredicateValue, RequestedAttribute, RequestedPredicate, RestrictionFilter},
        restriction::SchemaRestriction,
        template::AttributeGroup,
    },
    error::ValidationError,
};

use super::revocation::NonRevocationApplicator;
use crate::errors::error::{CompilerError, CompilerResult};

/// Partial request derived from one attribute group. The orchestrator merges
/// these into the request maps under referent keys of its choosing.
#[derive(Debug)]
pub(crate) struct IndyGroupOutput {
    pub attribute_entry: Option<RequestedAttribute>,
    /// One entry per comparison attribute, keyed by attribute name.
    pub predicate_entries: Vec<(String, RequestedPredicate)>,
}

/// Compiles one attribute group against its resolved ledger schema.
///
/// Attributes without a condition, and attributes under an equality
/// condition, are revealed together through a single `names` entry in
/// template order. Every comparison attribute becomes its own predicate and
/// never appears in `names`.
pub(crate) fn compile_group(
    group: &AttributeGroup,
    ledger_schema_id: &LedgerSchemaId,
    applicator: &NonRevocationApplicator,
) -> CompilerResult<IndyGroupOutput> {
    let restrictions = build_restriction_filters(group, ledger_schema_id);

    let mut revealed_names = Vec::new();
    let mut predicate_entries = Vec::new();
    for attribute in &group.attributes {
        let comparison = attribute.condition.as_ref().and_then(|condition| {
            condition
                .operator
                .predicate_type()
                .map(|p_type| (condition, p_type))
        });
        match comparison {
            Some((condition, p_type)) => {
                let mut predicate = RequestedPredicate {
                    name: attribute.name.clone(),
                    p_type,
                    p_value: parse_predicate_value(condition.operator, &condition.value)?,
                    restrictions: restrictions.clone(),
                    non_revoked: None,
                };
                applicator.apply_to_predicate(&mut predicate);
                predicate_entries.push((attribute.name.clone(), predicate));
            }
            None => revealed_names.push(attribute.name.clone()),
        }
    }

    let attribute_entry = if revealed_names.is_empty() {
        None
    } else {
        let mut entry = RequestedAttribute {
            name: None,
            names: Some(revealed_names),
            restrictions,
            non_revoked: None,
        };
        applicator.apply_to_attribute(&mut entry);
        Some(entry)
    };

    Ok(IndyGroupOutput {
        attribute_entry,
        predicate_entries,
    })
}

/// One filter snapshot per template restriction, or a single snapshot scoped
/// only by schema when the group has none. Equality conditions tag every
/// snapshot, keeping the snapshots alternatives of each other.
pub(crate) fn build_restriction_filters(
    group: &AttributeGroup,
    ledger_schema_id: &LedgerSchemaId,
) -> Vec<RestrictionFilter> {
    let mut attr_value_tags = BTreeMap::new();
    for attribute in &group.attributes {
        if let Some(ref condition) = attribute.condition {
            if !condition.operator.handled_as_predicate() {
                attr_value_tags.insert(
                    RestrictionFilter::value_tag(&attribute.name),
                    condition.value.clone(),
                );
            }
        }
    }

    if group.restrictions.is_empty() {
        vec![filter_snapshot(None, ledger_schema_id, &attr_value_tags)]
    } else {
        group
            .restrictions
            .iter()
            .map(|restriction| {
                filter_snapshot(Some(restriction), ledger_schema_id, &attr_value_tags)
            })
            .collect()
    }
}

fn filter_snapshot(
    restriction: Option<&SchemaRestriction>,
    ledger_schema_id: &LedgerSchemaId,
    attr_value_tags: &BTreeMap<String, String>,
) -> RestrictionFilter {
    RestrictionFilter {
        schema_id: Some(ledger_schema_id.to_string()),
        schema_issuer_did: restriction.and_then(|r| r.schema_issuer_did.clone()),
        schema_name: restriction.and_then(|r| r.schema_name.clone()),
        schema_version: restriction.and_then(|r| r.schema_version.clone()),
        issuer_did: restriction.and_then(|r| r.issuer_did.clone()),
        cred_def_id: restriction.and_then(|r| r.cred_def_id.clone()),
        attr_value_tags: attr_value_tags.clone(),
    }
}

fn parse_predicate_value(operator: ValueOperator, value: &str) -> CompilerResult<PredicateValue> {
    value.parse().map_err(|_| {
        CompilerError::Validation(ValidationError::InvalidConditionValue {
            operator: operator.as_ref().to_owned(),
            value: value.to_owned(),
            reason: "predicate values must be 32-bit signed integers".to_owned(),
        })
    })
}
