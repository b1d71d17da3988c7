//! Turning raw command-line tokens into typed values.
//!
//! Coercion is driven entirely by the [`TypeSpec`] recorded on each
//! parameter; nothing here inspects the invocation as a whole. The engine is
//! handed whatever tokens the front end collected for one parameter (none,
//! one, or several for repeatable flags) and produces a single [`Value`].

use indexmap::IndexMap;

use crate::{
    error::{CoerceError, Error, ValidationError},
    name,
    spec::{ParamKind, ParamSpec, SubtypeRegistry, TypeSpec},
};

/// A fully coerced value, ready to hand to a command body.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// An omitted optional parameter.
    Absent,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    /// A choice member, stored by its normalized name.
    Choice(String),
    /// The OR of the bits of every flag-set member that appeared.
    Flags(u64),
    Tuple(Vec<Value>),
    List(Vec<Value>),
    /// A value constructed through the subtype registry.
    Object(ObjectValue),
}

/// The result of a builder token: which subtype was selected and the coerced
/// constructor fields, in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectValue {
    pub subtype: String,
    pub fields: IndexMap<String, Value>,
}

impl Value {
    pub fn is_absent(&self) -> bool {
        matches!(self, Value::Absent)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) | Value::Choice(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(it) => Some(*it),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(it) => Some(*it),
            _ => None,
        }
    }
}

/// What the front end collected for one parameter.
#[derive(Debug, Clone, Copy)]
pub enum RawInput<'a> {
    /// The parameter never appeared.
    Absent,
    /// The flag appeared once, with no value attached.
    Flag,
    /// The flag appeared `n` times, each time with no value attached. Used
    /// for counted options.
    Count(usize),
    /// A single token.
    Token(&'a str),
    /// One token per appearance, in order. Used for variadic positionals and
    /// repeatable list options.
    Tokens(&'a [&'a str]),
}

/// The coercion engine. Borrows the subtype registry so builder tokens can be
/// resolved; everything else it needs travels on the parameter spec.
#[derive(Debug, Clone, Copy)]
pub struct Coercer<'a> {
    registry: &'a SubtypeRegistry,
}

impl<'a> Coercer<'a> {
    pub fn new(registry: &'a SubtypeRegistry) -> Coercer<'a> {
        Coercer { registry }
    }

    /// Coerces whatever was collected for `param` into one [`Value`].
    ///
    /// Token-level failures come back as [`CoerceError`]; a missing required
    /// option is a [`ValidationError`].
    pub fn coerce(&self, param: &ParamSpec, input: RawInput<'_>) -> Result<Value, Error> {
        match input {
            RawInput::Absent => self.coerce_absent(param),
            RawInput::Flag => self.coerce_flag(param),
            RawInput::Count(n) => self.coerce_count(param, n),
            RawInput::Token(token) => self.coerce_tokens(param, &[token]),
            RawInput::Tokens(tokens) => self.coerce_tokens(param, tokens),
        }
    }

    fn coerce_absent(&self, param: &ParamSpec) -> Result<Value, Error> {
        if param.is_counted() {
            return Ok(param.default().cloned().unwrap_or(Value::Int(0)));
        }
        if param.kind() == ParamKind::Option && param.option_must_appear() {
            return Err(ValidationError::MissingOption { param: param.label().to_string() }.into());
        }
        if let Some(default) = param.default() {
            return Ok(default.clone());
        }
        match (param.kind(), param.ty()) {
            (ParamKind::Variadic, _) => Ok(Value::List(Vec::new())),
            (_, TypeSpec::Optional(_)) => Ok(Value::Absent),
            (_, TypeSpec::List(_)) => Ok(Value::List(Vec::new())),
            _ => Err(CoerceError::MissingValue { param: param.label().to_string() }.into()),
        }
    }

    /// The flag was given, but no token came with it. The per-param missing
    /// value wins; an optional type yields its sentinel without consulting
    /// the inner descriptor.
    fn coerce_flag(&self, param: &ParamSpec) -> Result<Value, Error> {
        if param.is_counted() {
            return Ok(Value::Int(1));
        }
        if let Some(missing) = param.missing_value() {
            return Ok(missing.clone());
        }
        if matches!(param.ty(), TypeSpec::Optional(_)) {
            return Ok(Value::Absent);
        }
        Err(CoerceError::MissingValue { param: param.label().to_string() }.into())
    }

    fn coerce_count(&self, param: &ParamSpec, count: usize) -> Result<Value, Error> {
        if count == 0 {
            return self.coerce_absent(param);
        }
        if param.is_counted() {
            return Ok(Value::Int(count as i64));
        }
        if count == 1 {
            return self.coerce_flag(param);
        }
        Err(CoerceError::Repeated { param: param.label().to_string() }.into())
    }

    fn coerce_tokens(&self, param: &ParamSpec, tokens: &[&str]) -> Result<Value, Error> {
        if tokens.is_empty() {
            return self.coerce_absent(param);
        }
        let what = param.label();
        if param.kind() == ParamKind::Variadic {
            let mut elements = Vec::with_capacity(tokens.len());
            for token in tokens {
                elements.push(self.coerce_ty(what, param.ty(), token)?);
            }
            return Ok(Value::List(elements));
        }
        // An optional list behaves like a list once any token appears.
        if let Some(inner) = list_element(param.ty()) {
            return Ok(self.coerce_list(what, inner, tokens)?);
        }
        if tokens.len() > 1 {
            return Err(CoerceError::Repeated { param: what.to_string() }.into());
        }
        Ok(self.coerce_ty(what, param.ty(), tokens[0])?)
    }

    /// Coerces one token against a type descriptor. `what` names the
    /// parameter (or builder field) for error messages.
    pub(crate) fn coerce_ty(
        &self,
        what: &str,
        ty: &TypeSpec,
        token: &str,
    ) -> Result<Value, CoerceError> {
        match ty {
            TypeSpec::Scalar(scalar) => {
                scalar.parse(token).map_err(|message| CoerceError::Scalar {
                    param: what.to_string(),
                    token: token.to_string(),
                    message,
                })
            }
            TypeSpec::Optional(inner) => self.coerce_ty(what, inner, token),
            TypeSpec::Tuple(fields) => {
                let pieces = name::split_unquoted(token, ',');
                if pieces.len() != fields.len() {
                    return Err(CoerceError::TupleArity {
                        param: what.to_string(),
                        token: token.to_string(),
                        expected: fields.len(),
                        found: pieces.len(),
                    });
                }
                let mut result = Vec::with_capacity(fields.len());
                for (field_ty, piece) in fields.iter().zip(&pieces) {
                    result.push(self.coerce_ty(what, field_ty, name::unwrap_quotes(piece))?);
                }
                Ok(Value::Tuple(result))
            }
            TypeSpec::List(inner) => self.coerce_list(what, inner, &[token]),
            TypeSpec::Choice(set) => {
                let normalized = name::normalize_word(token).map_err(|_| {
                    CoerceError::UnknownChoice {
                        param: what.to_string(),
                        token: token.to_string(),
                        choices: set.names(),
                    }
                })?;
                if !set.contains(&normalized) {
                    return Err(CoerceError::UnknownChoice {
                        param: what.to_string(),
                        token: token.to_string(),
                        choices: set.names(),
                    });
                }
                Ok(Value::Choice(normalized))
            }
            TypeSpec::Flags(_) => Err(CoerceError::FlagSetToken { param: what.to_string() }),
            TypeSpec::Builder(builder) => self.build_value(what, builder, token),
        }
    }

    /// Coerces one or more token batches into a list. Each batch is
    /// comma-split (quote-aware), except that builder elements consume a
    /// whole batch each, and a lone `-` batch contributes no elements.
    fn coerce_list(
        &self,
        what: &str,
        inner: &TypeSpec,
        batches: &[&str],
    ) -> Result<Value, CoerceError> {
        let mut result = Vec::new();
        for batch in batches {
            if *batch == "-" {
                continue;
            }
            if let TypeSpec::Builder(builder) = inner {
                result.push(self.build_value(what, builder, batch)?);
                continue;
            }
            for piece in name::split_unquoted(batch, ',') {
                result.push(self.coerce_ty(what, inner, name::unwrap_quotes(&piece))?);
            }
        }
        Ok(Value::List(result))
    }

    /// Folds the flag-set members that appeared into one bitmask value.
    /// `present` holds normalized member names, one entry per appearance.
    pub fn combine_flags(&self, param: &ParamSpec, present: &[&str]) -> Result<Value, CoerceError> {
        let set = match param.ty() {
            TypeSpec::Flags(set) => set,
            _ => return Err(CoerceError::FlagSetToken { param: param.label().to_string() }),
        };
        let mut bits = 0u64;
        for member in present {
            match set.bit_of(member) {
                Some(bit) => bits |= bit,
                None => {
                    return Err(CoerceError::UnknownChoice {
                        param: param.label().to_string(),
                        token: member.to_string(),
                        choices: set.names(),
                    });
                }
            }
        }
        Ok(Value::Flags(bits))
    }

    pub(crate) fn registry(&self) -> &'a SubtypeRegistry {
        self.registry
    }
}

/// Checks the coerced value against the parameter's non-empty marker.
pub fn validate(param: &ParamSpec, value: &Value) -> Result<(), ValidationError> {
    if param.is_required() {
        if let Value::List(elements) = value {
            if elements.is_empty() {
                return Err(ValidationError::Empty { param: param.label().to_string() });
            }
        }
    }
    Ok(())
}

fn list_element(ty: &TypeSpec) -> Option<&TypeSpec> {
    match ty {
        TypeSpec::List(inner) => Some(inner),
        TypeSpec::Optional(inner) => match &**inner {
            TypeSpec::List(element) => Some(element),
            _ => None,
        },
        _ => None,
    }
}
