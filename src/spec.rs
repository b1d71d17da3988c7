//! Declarative descriptions of commands, parameters, and value types.
//!
//! Everything here is built once during a setup phase by the collaborators
//! (signature introspection, docstring extraction, subtype registration) and
//! is immutable for the rest of the run.

use std::{fmt, sync::Arc};

use indexmap::IndexMap;

use crate::{coerce::Value, error::SpecError, name};

/// A named capability for turning one token into a typed value.
///
/// The conversion function is resolved ahead of time by the collaborator;
/// the engine never inspects types at runtime.
#[derive(Clone)]
pub struct Scalar {
    name: &'static str,
    parse: Arc<dyn Fn(&str) -> Result<Value, String> + Send + Sync>,
}

impl fmt::Debug for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Scalar").field(&self.name).finish()
    }
}

impl Scalar {
    pub fn new(
        name: &'static str,
        parse: impl Fn(&str) -> Result<Value, String> + Send + Sync + 'static,
    ) -> Scalar {
        Scalar { name, parse: Arc::new(parse) }
    }

    pub fn string() -> Scalar {
        Scalar::new("str", |token| Ok(Value::Str(token.to_string())))
    }

    pub fn int() -> Scalar {
        Scalar::new("int", |token| {
            token.parse::<i64>().map(Value::Int).map_err(|err| err.to_string())
        })
    }

    pub fn float() -> Scalar {
        Scalar::new("float", |token| {
            token.parse::<f64>().map(Value::Float).map_err(|err| err.to_string())
        })
    }

    pub fn bool() -> Scalar {
        Scalar::new("bool", |token| {
            token.parse::<bool>().map(Value::Bool).map_err(|err| err.to_string())
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub(crate) fn parse(&self, token: &str) -> Result<Value, String> {
        (self.parse)(token)
    }
}

/// A closed enumeration: the valid values are an exact, named, finite set.
#[derive(Debug, Clone)]
pub struct ChoiceSet {
    members: Vec<ChoiceMember>,
}

#[derive(Debug, Clone)]
pub struct ChoiceMember {
    pub(crate) name: String,
    pub(crate) help: String,
}

impl ChoiceSet {
    /// Builds a choice set from `(raw name, help)` pairs. Member names are
    /// normalized with the command-name rule; clashes are rejected.
    pub fn new<I, S>(members: I) -> Result<ChoiceSet, SpecError>
    where
        I: IntoIterator<Item = (S, S)>,
        S: Into<String>,
    {
        let mut result = Vec::new();
        for (raw, help) in members {
            let raw = raw.into();
            let normalized = name::normalize_word(&raw)?;
            if result.iter().any(|m: &ChoiceMember| m.name == normalized) {
                return Err(SpecError::ChoiceClash { member: normalized });
            }
            result.push(ChoiceMember { name: normalized, help: help.into() });
        }
        if result.is_empty() {
            return Err(SpecError::EmptyChoices);
        }
        Ok(ChoiceSet { members: result })
    }

    pub fn members(&self) -> impl Iterator<Item = (&str, &str)> {
        self.members.iter().map(|m| (m.name.as_str(), m.help.as_str()))
    }

    pub(crate) fn names(&self) -> String {
        self.members.iter().map(|m| m.name.as_str()).collect::<Vec<_>>().join(", ")
    }

    pub(crate) fn contains(&self, normalized: &str) -> bool {
        self.members.iter().any(|m| m.name == normalized)
    }
}

/// A bitmask-composable group of named boolean options sharing one logical
/// parameter. Expanded into one flag per member at spec-build time.
#[derive(Debug, Clone)]
pub struct FlagSet {
    members: Vec<FlagMember>,
}

#[derive(Debug, Clone)]
pub struct FlagMember {
    pub(crate) name: String,
    pub(crate) bit: u64,
    pub(crate) help: String,
}

impl FlagSet {
    /// Builds a flag set from `(raw name, bit value, help)` triples. A member's
    /// help may start with a `[-x]` short-flag directive.
    pub fn new<I, S>(members: I) -> Result<FlagSet, SpecError>
    where
        I: IntoIterator<Item = (S, u64, S)>,
        S: Into<String>,
    {
        let mut result = Vec::new();
        for (raw, bit, help) in members {
            let raw = raw.into();
            let normalized = name::normalize_word(&raw)?;
            if result.iter().any(|m: &FlagMember| m.name == normalized) {
                return Err(SpecError::FlagMemberClash { member: normalized });
            }
            result.push(FlagMember { name: normalized, bit, help: help.into() });
        }
        if result.is_empty() {
            return Err(SpecError::EmptyFlagSet);
        }
        Ok(FlagSet { members: result })
    }

    pub(crate) fn members(&self) -> &[FlagMember] {
        &self.members
    }

    pub(crate) fn bit_of(&self, normalized: &str) -> Option<u64> {
        self.members.iter().find(|m| m.name == normalized).map(|m| m.bit)
    }

    pub(crate) fn names(&self) -> String {
        self.members.iter().map(|m| m.name.as_str()).collect::<Vec<_>>().join(", ")
    }
}

/// Polymorphic construction of an abstract target type through a
/// [`SubtypeRegistry`], driven by the `[alias,]field(,field)*` token grammar.
#[derive(Debug, Clone)]
pub struct Builder {
    pub(crate) target: String,
}

impl Builder {
    pub fn new(target: impl Into<String>) -> Builder {
        Builder { target: target.into() }
    }
}

/// The closed set of value-type descriptors.
#[derive(Debug, Clone)]
pub enum TypeSpec {
    Scalar(Scalar),
    Optional(Box<TypeSpec>),
    Tuple(Vec<TypeSpec>),
    List(Box<TypeSpec>),
    Choice(ChoiceSet),
    Flags(FlagSet),
    Builder(Builder),
}

impl TypeSpec {
    pub(crate) fn kind_name(&self) -> &'static str {
        match self {
            TypeSpec::Scalar(_) => "scalar",
            TypeSpec::Optional(_) => "optional",
            TypeSpec::Tuple(_) => "tuple",
            TypeSpec::List(_) => "list",
            TypeSpec::Choice(_) => "choice",
            TypeSpec::Flags(_) => "flag-set",
            TypeSpec::Builder(_) => "builder",
        }
    }

    /// Short human name used in missing-field listings.
    pub(crate) fn display_name(&self) -> &str {
        match self {
            TypeSpec::Scalar(s) => s.name(),
            TypeSpec::Optional(inner) => inner.display_name(),
            TypeSpec::Builder(b) => &b.target,
            other => other.kind_name(),
        }
    }

    /// Enforces the nesting rules: no optional-of-optional, no list or tuple
    /// directly inside a list or tuple, and flag sets only at the top level.
    pub(crate) fn validate(&self) -> Result<(), SpecError> {
        match self {
            TypeSpec::Optional(inner) => {
                match **inner {
                    TypeSpec::Optional(_) | TypeSpec::Flags(_) => {
                        return Err(SpecError::InvalidNesting {
                            outer: self.kind_name(),
                            inner: inner.kind_name(),
                        });
                    }
                    _ => {}
                }
                inner.validate()
            }
            TypeSpec::Tuple(fields) => {
                for field in fields {
                    Self::check_element(self.kind_name(), field)?;
                }
                Ok(())
            }
            TypeSpec::List(inner) => Self::check_element(self.kind_name(), inner),
            _ => Ok(()),
        }
    }

    fn check_element(outer: &'static str, element: &TypeSpec) -> Result<(), SpecError> {
        match element {
            TypeSpec::Tuple(_) | TypeSpec::List(_) | TypeSpec::Flags(_) => {
                Err(SpecError::InvalidNesting { outer, inner: element.kind_name() })
            }
            _ => element.validate(),
        }
    }
}

/// One constructible form of a builder's abstract target type.
#[derive(Debug, Clone)]
pub struct Subtype {
    pub(crate) alias: String,
    pub(crate) fields: Vec<Field>,
}

#[derive(Debug, Clone)]
pub struct Field {
    pub(crate) name: String,
    pub(crate) ty: TypeSpec,
    pub(crate) default: Option<Value>,
}

impl Subtype {
    pub fn new(alias: impl Into<String>) -> Subtype {
        Subtype { alias: alias.into(), fields: Vec::new() }
    }

    /// Appends a required constructor field. Field types are restricted to
    /// scalars, optional scalars, and choices; everything richer has its own
    /// token grammar and cannot appear inside a builder token.
    pub fn field(self, name: &str, ty: TypeSpec) -> Result<Subtype, SpecError> {
        self.push_field(name, ty, None)
    }

    /// Appends a field that may be omitted from the token.
    pub fn field_with_default(
        self,
        name: &str,
        ty: TypeSpec,
        default: Value,
    ) -> Result<Subtype, SpecError> {
        self.push_field(name, ty, Some(default))
    }

    fn push_field(
        mut self,
        name: &str,
        ty: TypeSpec,
        default: Option<Value>,
    ) -> Result<Subtype, SpecError> {
        let allowed = match &ty {
            TypeSpec::Scalar(_) | TypeSpec::Choice(_) => true,
            TypeSpec::Optional(inner) => {
                matches!(**inner, TypeSpec::Scalar(_) | TypeSpec::Choice(_))
            }
            _ => false,
        };
        if !allowed {
            return Err(SpecError::BuilderField {
                alias: self.alias.clone(),
                field: name.to_string(),
            });
        }
        let normalized = name::normalize_word(name)?;
        self.fields.push(Field { name: normalized, ty, default });
        Ok(self)
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }
}

/// Alias -> constructor descriptors for every builder target. Populated once
/// by the registration collaborator before resolution.
#[derive(Debug, Default)]
pub struct SubtypeRegistry {
    by_target: IndexMap<String, Vec<Subtype>>,
}

impl SubtypeRegistry {
    pub fn new() -> SubtypeRegistry {
        SubtypeRegistry::default()
    }

    pub fn register(&mut self, target: &str, subtype: Subtype) -> Result<(), SpecError> {
        let entries = self.by_target.entry(target.to_string()).or_default();
        if entries.iter().any(|s| s.alias == subtype.alias) {
            return Err(SpecError::DuplicateAlias {
                target: target.to_string(),
                alias: subtype.alias,
            });
        }
        entries.push(subtype);
        Ok(())
    }

    pub(crate) fn subtypes_of(&self, target: &str) -> &[Subtype] {
        self.by_target.get(target).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// How a parameter is passed in on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// Positional, no default: must be supplied.
    Required,
    /// Positional with a default: may be omitted.
    Defaulted,
    /// Positional, zero or more tokens. At most one per command, last.
    Variadic,
    /// Matched by flag name, not position.
    Option,
}

/// A single parameter of a command, as supplied by the signature-introspection
/// collaborator. The classifier fills in the CLI-shape fields (normalized
/// name, flags, placeholders) when the tree is built.
#[derive(Debug, Clone)]
pub struct ParamSpec {
    pub(crate) name: String,
    pub(crate) cli_name: String,
    pub(crate) kind: ParamKind,
    pub(crate) ty: TypeSpec,
    pub(crate) default: Option<Value>,
    pub(crate) help: String,
    pub(crate) short: Option<char>,
    pub(crate) long: Option<String>,
    pub(crate) required: bool,
    pub(crate) counted: bool,
    pub(crate) missing: Option<Value>,
    pub(crate) placeholders: Vec<String>,
}

impl ParamSpec {
    fn new(name: &str, kind: ParamKind, ty: TypeSpec) -> ParamSpec {
        ParamSpec {
            name: name.to_string(),
            cli_name: String::new(),
            kind,
            ty,
            default: None,
            help: String::new(),
            short: None,
            long: None,
            required: false,
            counted: false,
            missing: None,
            placeholders: Vec::new(),
        }
    }

    pub fn positional(name: &str, ty: TypeSpec) -> ParamSpec {
        ParamSpec::new(name, ParamKind::Required, ty)
    }

    pub fn defaulted(name: &str, ty: TypeSpec, default: Value) -> ParamSpec {
        let mut p = ParamSpec::new(name, ParamKind::Defaulted, ty);
        p.default = Some(default);
        p
    }

    /// A variadic positional; `ty` describes one element.
    pub fn variadic(name: &str, ty: TypeSpec) -> ParamSpec {
        ParamSpec::new(name, ParamKind::Variadic, ty)
    }

    pub fn option(name: &str, ty: TypeSpec) -> ParamSpec {
        ParamSpec::new(name, ParamKind::Option, ty)
    }

    pub fn with_default(mut self, default: Value) -> ParamSpec {
        self.default = Some(default);
        self
    }

    /// Help text. May carry a leading `[-x]`-style flag directive and one
    /// `{word}` placeholder group; both are extracted by the classifier.
    pub fn with_help(mut self, help: &str) -> ParamSpec {
        self.help = help.to_string();
        self
    }

    /// The special-behavior marker: a variadic (or list-typed option) must
    /// receive at least one value, and a plain option must appear.
    pub fn required(mut self) -> ParamSpec {
        self.required = true;
        self
    }

    /// Marks an option as counted: its value is the number of times the flag
    /// appeared, zero when it never did.
    pub fn counted(mut self) -> ParamSpec {
        self.counted = true;
        self
    }

    /// The value produced when the flag appears with no value attached to it,
    /// letting an option double as a bare flag.
    pub fn when_missing(mut self, value: Value) -> ParamSpec {
        self.missing = Some(value);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The normalized CLI name. Empty until the owning tree is built.
    pub fn cli_name(&self) -> &str {
        &self.cli_name
    }

    pub fn kind(&self) -> ParamKind {
        self.kind
    }

    pub fn ty(&self) -> &TypeSpec {
        &self.ty
    }

    pub fn default(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    pub fn help(&self) -> &str {
        &self.help
    }

    pub fn short(&self) -> Option<char> {
        self.short
    }

    /// The long flag for an option, `None` when removed by a `[-x/]`
    /// directive or for positionals.
    pub fn long(&self) -> Option<&str> {
        self.long.as_deref()
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn is_counted(&self) -> bool {
        self.counted
    }

    pub fn missing_value(&self) -> Option<&Value> {
        self.missing.as_ref()
    }

    pub fn placeholders(&self) -> &[String] {
        &self.placeholders
    }

    pub(crate) fn label(&self) -> &str {
        if self.cli_name.is_empty() {
            &self.name
        } else {
            &self.cli_name
        }
    }

    /// An option must appear when it carries the required-override, or when it
    /// has no default and its type is not optional.
    pub(crate) fn option_must_appear(&self) -> bool {
        self.kind == ParamKind::Option
            && (self.required
                || (self.default.is_none()
                    && !matches!(self.ty, TypeSpec::Optional(_) | TypeSpec::List(_))))
    }
}

/// One command, as registered by the setup collaborator: a raw dotted path
/// (`__` separates hierarchy segments, `_` separates words), a description,
/// and an ordered parameter list.
#[derive(Debug, Clone)]
pub struct CommandSpec {
    pub(crate) raw_path: String,
    pub(crate) is_root: bool,
    pub(crate) is_async: bool,
    pub(crate) description: String,
    pub(crate) params: Vec<ParamSpec>,
}

impl CommandSpec {
    pub fn new(raw_path: &str) -> CommandSpec {
        CommandSpec {
            raw_path: raw_path.to_string(),
            is_root: false,
            is_async: false,
            description: String::new(),
            params: Vec::new(),
        }
    }

    /// The root command: sits above the path tree and heads every invocation
    /// chain. At most one per command set.
    pub fn root() -> CommandSpec {
        let mut spec = CommandSpec::new("");
        spec.is_root = true;
        spec
    }

    pub fn describe(mut self, description: &str) -> CommandSpec {
        self.description = description.to_string();
        self
    }

    pub fn param(mut self, param: ParamSpec) -> CommandSpec {
        self.params.push(param);
        self
    }

    /// Marks the body as asynchronously-executing. The invocation layer awaits
    /// it at its chain position; chain members never run concurrently.
    pub fn asynchronous(mut self) -> CommandSpec {
        self.is_async = true;
        self
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    pub fn is_root(&self) -> bool {
        self.is_root
    }

    pub fn is_async(&self) -> bool {
        self.is_async
    }
}
