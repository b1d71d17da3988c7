use thiserror::Error;

/// A mistake in how the command set itself is declared. Always fatal at build
/// time: no command runs.
#[derive(Debug, Error)]
pub enum SpecError {
    #[error("cannot normalize name `{raw}`, it is nothing but separators")]
    EmptyName { raw: String },

    #[error("command `{path}` is defined more than once")]
    DuplicateCommand { path: String },

    #[error("more than one command is marked as root")]
    MultipleRoots,

    #[error("command `{path}` cannot have both subcommands and positional parameters")]
    InnerPositionals { path: String },

    #[error("a {inner} cannot appear inside a {outer}")]
    InvalidNesting { outer: &'static str, inner: &'static str },

    #[error("required parameter `{param}` of `{command}` follows a defaulted parameter")]
    PositionalOrder { command: String, param: String },

    #[error("parameter `{param}` of `{command}` follows a variadic parameter")]
    AfterVariadic { command: String, param: String },

    #[error(
        "parameter `{param}` of `{command}` conflicts with `{other}`, \
         both names simplify to `{simplified}`"
    )]
    ParamClash { command: String, param: String, other: String, simplified: String },

    #[error("the non-empty marker on `{param}` of `{command}` requires a variadic or option parameter")]
    BadRequired { command: String, param: String },

    #[error("the counted marker on `{param}` of `{command}` requires an option parameter")]
    BadCounted { command: String, param: String },

    #[error("bad flag directive `[{text}]` on `{param}` of `{command}`")]
    Directive { command: String, param: String, text: String },

    #[error("flag directive on `{param}` of `{command}`, which is not an option")]
    DirectiveOnPositional { command: String, param: String },

    #[error("more than one placeholder group on `{param}` of `{command}`")]
    MultiplePlaceholders { command: String, param: String },

    #[error("`{param}` of `{command}` takes {expected} placeholder words, but its descriptor has {found}")]
    PlaceholderCount { command: String, param: String, expected: usize, found: usize },

    #[error("flag-set parameter `{param}` of `{command}` must be an option")]
    PositionalFlagSet { command: String, param: String },

    #[error("flag-set parameter `{param}` of `{command}` must have a default value")]
    FlagSetDefault { command: String, param: String },

    #[error("a choice set requires at least one member")]
    EmptyChoices,

    #[error("normalized choice name `{member}` is already taken")]
    ChoiceClash { member: String },

    #[error("a flag set requires at least one member")]
    EmptyFlagSet,

    #[error("normalized flag-set member name `{member}` is already taken")]
    FlagMemberClash { member: String },

    #[error("subtype alias `{alias}` is already registered for `{target}`")]
    DuplicateAlias { target: String, alias: String },

    #[error("field `{field}` of subtype `{alias}` must be a scalar, optional scalar, or choice")]
    BuilderField { alias: String, field: String },
}

/// A raw token (or one of its fields) could not be turned into a typed value.
/// Aborts before any chain member executes.
#[derive(Debug, Error)]
pub enum CoerceError {
    #[error("can't parse `{token}` for `{param}`, {message}")]
    Scalar { param: String, token: String, message: String },

    #[error("expected a value for `{param}`")]
    MissingValue { param: String },

    #[error("flag specified more than once: `--{param}`")]
    Repeated { param: String },

    #[error("expected {expected} comma-separated values for `{param}`, got {found}: `{token}`")]
    TupleArity { param: String, token: String, expected: usize, found: usize },

    #[error("invalid choice `{token}` for `{param}` (choose from {choices})")]
    UnknownChoice { param: String, token: String, choices: String },

    #[error("flag-set `{param}` takes no value, use its member flags")]
    FlagSetToken { param: String },

    #[error("no subtypes registered for `{target}` (parameter `{param}`)")]
    UnregisteredTarget { param: String, target: String },

    #[error("unknown subtype `{alias}` for `{param}` (known: {known})")]
    UnknownAlias { param: String, alias: String, known: String },

    #[error("a subtype alias is required for `{param}` (one of {known})")]
    MissingAlias { param: String, known: String },

    #[error("unexpected key `{key}` for `{alias}` value of `{param}`")]
    UnknownField { param: String, alias: String, key: String },

    #[error("unexpected field `{token}` for `{alias}` value of `{param}`")]
    ExtraField { param: String, alias: String, token: String },

    #[error("duplicate key `{key}` for `{param}`")]
    DuplicateField { param: String, key: String },

    #[error("positional field `{token}` follows a key=value field in `{param}`")]
    PositionalAfterKeyed { param: String, token: String },

    #[error("the following fields are required for `{alias}` value of `{param}`: {fields}")]
    MissingFields { param: String, alias: String, fields: String },
}

/// The tokens were individually well-formed, but the overall invocation is
/// not. Aborts before any chain member executes.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("flag is required: `--{param}`")]
    MissingOption { param: String },

    #[error("expected at least one value for `{param}`")]
    Empty { param: String },

    #[error("unknown command `{word}` (expected one of {expected})")]
    UnknownCommand { word: String, expected: String },

    #[error("a subcommand is required (one of {expected})")]
    CommandRequired { expected: String },
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Spec(#[from] SpecError),
    #[error(transparent)]
    Coerce(#[from] CoerceError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}
