//! The builder token grammar: `[alias,]field(,field)*` where each field is
//! either positional or `key=value`. The alias selects one of the subtypes
//! registered for the parameter's target type; when exactly one subtype is
//! registered the alias may be omitted.

use indexmap::IndexMap;

use crate::{
    coerce::{Coercer, ObjectValue, Value},
    error::CoerceError,
    name,
    spec::{Builder, Subtype, TypeSpec},
};

impl Coercer<'_> {
    /// Coerces one builder token into an [`ObjectValue`]. `what` names the
    /// owning parameter for error messages.
    pub(crate) fn build_value(
        &self,
        what: &str,
        spec: &Builder,
        token: &str,
    ) -> Result<Value, CoerceError> {
        let entries = self.registry().subtypes_of(&spec.target);
        if entries.is_empty() {
            return Err(CoerceError::UnregisteredTarget {
                param: what.to_string(),
                target: spec.target.clone(),
            });
        }

        let segments = name::split_unquoted(token, ',');
        let (subtype, fields) = select_subtype(what, entries, &segments)?;
        let filled = fill_fields(self, what, subtype, fields)?;
        Ok(Value::Object(ObjectValue { subtype: subtype.alias.clone(), fields: filled }))
    }
}

/// Picks the subtype the token addresses and returns the remaining field
/// segments. A leading bare segment that matches an alias always selects it;
/// with a single registered subtype a non-matching lead is treated as the
/// first constructor field instead.
fn select_subtype<'s, 'tok>(
    what: &str,
    entries: &'s [Subtype],
    segments: &'tok [String],
) -> Result<(&'s Subtype, &'tok [String]), CoerceError> {
    let lead = segments.first().map(String::as_str).unwrap_or("");
    let bare_lead = !lead.contains('=');
    if bare_lead {
        if let Some(subtype) = entries.iter().find(|s| s.alias == lead) {
            return Ok((subtype, &segments[1..]));
        }
    }
    if entries.len() == 1 {
        // Alias omissible: the whole token is fields.
        let segments = if segments.len() == 1 && lead.is_empty() { &[][..] } else { segments };
        return Ok((&entries[0], segments));
    }
    let known = || entries.iter().map(|s| s.alias.as_str()).collect::<Vec<_>>().join(", ");
    if bare_lead && !lead.is_empty() {
        return Err(CoerceError::UnknownAlias {
            param: what.to_string(),
            alias: lead.to_string(),
            known: known(),
        });
    }
    Err(CoerceError::MissingAlias { param: what.to_string(), known: known() })
}

fn fill_fields(
    coercer: &Coercer<'_>,
    what: &str,
    subtype: &Subtype,
    segments: &[String],
) -> Result<IndexMap<String, Value>, CoerceError> {
    let mut supplied: IndexMap<String, Value> = IndexMap::new();
    let mut next_positional = 0usize;
    let mut seen_keyed = false;

    for segment in segments {
        match segment.split_once('=') {
            Some((raw_key, raw_value)) => {
                seen_keyed = true;
                let key = name::normalize_word(raw_key).map_err(|_| CoerceError::UnknownField {
                    param: what.to_string(),
                    alias: subtype.alias.clone(),
                    key: raw_key.to_string(),
                })?;
                let field = subtype.fields.iter().find(|f| f.name == key).ok_or_else(|| {
                    CoerceError::UnknownField {
                        param: what.to_string(),
                        alias: subtype.alias.clone(),
                        key: key.clone(),
                    }
                })?;
                if supplied.contains_key(&key) {
                    return Err(CoerceError::DuplicateField {
                        param: what.to_string(),
                        key,
                    });
                }
                let label = format!("{what}.{key}");
                let value =
                    coercer.coerce_ty(&label, &field.ty, name::unwrap_quotes(raw_value))?;
                supplied.insert(key, value);
            }
            None => {
                if seen_keyed {
                    return Err(CoerceError::PositionalAfterKeyed {
                        param: what.to_string(),
                        token: segment.clone(),
                    });
                }
                let field = subtype.fields.get(next_positional).ok_or_else(|| {
                    CoerceError::ExtraField {
                        param: what.to_string(),
                        alias: subtype.alias.clone(),
                        token: segment.clone(),
                    }
                })?;
                next_positional += 1;
                let label = format!("{what}.{}", field.name);
                let value =
                    coercer.coerce_ty(&label, &field.ty, name::unwrap_quotes(segment))?;
                supplied.insert(field.name.clone(), value);
            }
        }
    }

    // Assemble in declaration order, falling back to defaults.
    let mut result = IndexMap::with_capacity(subtype.fields.len());
    let mut missing = Vec::new();
    for field in &subtype.fields {
        if let Some(value) = supplied.swap_remove(&field.name) {
            result.insert(field.name.clone(), value);
        } else if let Some(default) = &field.default {
            result.insert(field.name.clone(), default.clone());
        } else if matches!(field.ty, TypeSpec::Optional(_)) {
            result.insert(field.name.clone(), Value::Absent);
        } else {
            missing.push(format!("{} ({})", field.name, field.ty.display_name()));
        }
    }
    if !missing.is_empty() {
        return Err(CoerceError::MissingFields {
            param: what.to_string(),
            alias: subtype.alias.clone(),
            fields: missing.join(", "),
        });
    }
    Ok(result)
}
