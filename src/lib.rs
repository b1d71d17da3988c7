//! `argot` is the declarative core of a command-line framework: a registry of
//! commands arranged in a tree, plus a coercion engine that turns raw argv
//! tokens into typed values.
//!
//! It deliberately stops short of a full front end. Callers (macro layers,
//! reflection shims, REPLs) register [`CommandSpec`]s, build a
//! [`CommandTree`], resolve leading words to an [`InvocationContext`], and
//! coerce each parameter's tokens with a [`Coercer`]. Token splitting of the
//! shell kind, help rendering, and process exit are all left to the caller.
//!
//! ```
//! use argot::{
//!     Coercer, CommandSpec, CommandTree, ParamSpec, RawInput, Scalar, SubtypeRegistry,
//!     TypeSpec, Value,
//! };
//!
//! let tree = CommandTree::build(vec![
//!     CommandSpec::new("hey")
//!         .describe("Say hello.")
//!         .param(ParamSpec::positional("name", TypeSpec::Scalar(Scalar::string()))),
//! ])?;
//!
//! let ctx = tree.resolve(&["hey", "Alice"])?;
//! assert!(ctx.is_target());
//! assert_eq!(ctx.consumed(), 1);
//!
//! let registry = SubtypeRegistry::new();
//! let coercer = Coercer::new(&registry);
//! let name = &ctx.target().spec().params()[0];
//! assert_eq!(coercer.coerce(name, RawInput::Token("Alice"))?, Value::Str("Alice".into()));
//! # Ok::<(), argot::Error>(())
//! ```
//!
//! Command paths use `__` for hierarchy and `_` for word separation, so a
//! caller can derive them from ordinary identifiers: `s3__ls` becomes the
//! command `ls` under `s3`. Names are normalized once, at tree build time,
//! and invocations are matched against the normalized forms.

mod builder;
mod classify;
mod coerce;
mod error;
mod name;
mod spec;
mod tree;

pub use crate::{
    classify::FlagOption,
    coerce::{validate, Coercer, ObjectValue, RawInput, Value},
    error::{CoerceError, Error, SpecError, ValidationError},
    name::{normalize_path, normalize_word},
    spec::{
        Builder, ChoiceSet, CommandSpec, FlagSet, ParamKind, ParamSpec, Scalar, Subtype,
        SubtypeRegistry, TypeSpec,
    },
    tree::{CommandNode, CommandTree, InvocationContext},
};

pub type Result<T, E = Error> = std::result::Result<T, E>;
