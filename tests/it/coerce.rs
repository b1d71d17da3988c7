use argot::{
    ChoiceSet, Coercer, FlagSet, ParamSpec, RawInput, Result, Scalar, SubtypeRegistry, TypeSpec,
    Value,
};
use expect_test::expect;

use crate::check;

fn int() -> TypeSpec {
    TypeSpec::Scalar(Scalar::int())
}

fn string() -> TypeSpec {
    TypeSpec::Scalar(Scalar::string())
}

fn coerce(param: &ParamSpec, input: RawInput<'_>) -> Result<Value> {
    let registry = SubtypeRegistry::new();
    Coercer::new(&registry).coerce(param, input)
}

#[test]
fn scalars() {
    let count = ParamSpec::option("count", int());
    check(
        coerce(&count, RawInput::Token("42")),
        expect![[r#"
            Int(
                42,
            )
        "#]],
    );
    check(
        coerce(&count, RawInput::Token("4.2")),
        expect!["can't parse `4.2` for `count`, invalid digit found in string"],
    );
    check(
        coerce(&count, RawInput::Absent),
        expect!["flag is required: `--count`"],
    );
}

#[test]
fn tuples() {
    let point = ParamSpec::positional("point", TypeSpec::Tuple(vec![int(), int()]));
    check(
        coerce(&point, RawInput::Token("3,4")),
        expect![[r#"
            Tuple(
                [
                    Int(
                        3,
                    ),
                    Int(
                        4,
                    ),
                ],
            )
        "#]],
    );
    check(
        coerce(&point, RawInput::Token("3,4,5")),
        expect!["expected 2 comma-separated values for `point`, got 3: `3,4,5`"],
    );

    // A quoted field swallows its commas.
    let pair = ParamSpec::positional("pair", TypeSpec::Tuple(vec![string(), int()]));
    check(
        coerce(&pair, RawInput::Token("'a,b',7")),
        expect![[r#"
            Tuple(
                [
                    Str(
                        "a,b",
                    ),
                    Int(
                        7,
                    ),
                ],
            )
        "#]],
    );
}

#[test]
fn lists() {
    let ids = ParamSpec::option("ids", TypeSpec::List(Box::new(int())));
    check(
        coerce(&ids, RawInput::Tokens(&["1,2", "3"])),
        expect![[r#"
            List(
                [
                    Int(
                        1,
                    ),
                    Int(
                        2,
                    ),
                    Int(
                        3,
                    ),
                ],
            )
        "#]],
    );
    // The lone dash is the explicit empty list.
    check(
        coerce(&ids, RawInput::Token("-")),
        expect![[r#"
            List(
                [],
            )
        "#]],
    );
    // Omitting a list option entirely also yields the empty list.
    check(
        coerce(&ids, RawInput::Absent),
        expect![[r#"
            List(
                [],
            )
        "#]],
    );
}

#[test]
fn choices() {
    let set = ChoiceSet::new([("north", ""), ("south", ""), ("east", ""), ("west", "")]).unwrap();
    let heading = ParamSpec::positional("heading", TypeSpec::Choice(set));
    check(
        coerce(&heading, RawInput::Token("North")),
        expect![[r#"
            Choice(
                "north",
            )
        "#]],
    );
    check(
        coerce(&heading, RawInput::Token("up")),
        expect!["invalid choice `up` for `heading` (choose from north, south, east, west)"],
    );
}

#[test]
fn optionals_and_defaults() {
    let color = ParamSpec::option("color", TypeSpec::Optional(Box::new(string())));
    check(
        coerce(&color, RawInput::Absent),
        expect![[r#"
            Absent
        "#]],
    );

    let level = ParamSpec::option("level", int()).with_default(Value::Int(3));
    check(
        coerce(&level, RawInput::Absent),
        expect![[r#"
            Int(
                3,
            )
        "#]],
    );
    check(
        coerce(&level, RawInput::Tokens(&["1", "2"])),
        expect!["flag specified more than once: `--level`"],
    );
}

#[test]
fn variadics() {
    let sizes = ParamSpec::variadic("sizes", int());
    check(
        coerce(&sizes, RawInput::Tokens(&["8", "16"])),
        expect![[r#"
            List(
                [
                    Int(
                        8,
                    ),
                    Int(
                        16,
                    ),
                ],
            )
        "#]],
    );
    check(
        coerce(&sizes, RawInput::Absent),
        expect![[r#"
            List(
                [],
            )
        "#]],
    );

    let required = ParamSpec::variadic("paths", string()).required();
    let value = coerce(&required, RawInput::Absent).unwrap();
    check(
        argot::validate(&required, &value).map(|()| value).map_err(argot::Error::from),
        expect!["expected at least one value for `paths`"],
    );
}

#[test]
fn tuple_round_trip() {
    // Plain comma/quote-free fields survive join-then-coerce exactly.
    let words = ["alpha", "beta", "gamma"];
    let token = words.join(",");
    let triple =
        ParamSpec::positional("triple", TypeSpec::Tuple(vec![string(), string(), string()]));
    let value = coerce(&triple, RawInput::Token(&token)).unwrap();
    assert_eq!(
        value,
        Value::Tuple(words.iter().map(|w| Value::Str(w.to_string())).collect())
    );

    let token = ["8", "ok", "2.5"].join(",");
    let mixed = ParamSpec::positional(
        "mixed",
        TypeSpec::Tuple(vec![int(), string(), TypeSpec::Scalar(Scalar::float())]),
    );
    let value = coerce(&mixed, RawInput::Token(&token)).unwrap();
    assert_eq!(
        value,
        Value::Tuple(vec![Value::Int(8), Value::Str("ok".into()), Value::Float(2.5)])
    );
}

#[test]
fn bare_flag_yields_the_sentinel_not_the_default() {
    // The flag appeared without a value: the omitted-option default must not
    // apply, and an optional type short-circuits to the sentinel.
    let log = ParamSpec::option("log", TypeSpec::Optional(Box::new(string())))
        .with_default(Value::Str("fallback.txt".into()));
    check(
        coerce(&log, RawInput::Flag),
        expect![[r#"
            Absent
        "#]],
    );
    // Omitting the flag entirely still takes the default.
    check(
        coerce(&log, RawInput::Absent),
        expect![[r#"
            Str(
                "fallback.txt",
            )
        "#]],
    );
}

#[test]
fn bare_flag_takes_the_missing_value() {
    let log = ParamSpec::option("log", string())
        .with_default(Value::Str("none".into()))
        .when_missing(Value::Str("debug.log".into()));
    check(
        coerce(&log, RawInput::Flag),
        expect![[r#"
            Str(
                "debug.log",
            )
        "#]],
    );
    check(
        coerce(&log, RawInput::Token("other.log")),
        expect![[r#"
            Str(
                "other.log",
            )
        "#]],
    );

    // Without a missing value, a bare non-optional flag is an error, and a
    // required option that did appear is not reported as missing.
    let token = ParamSpec::option("token", string());
    check(
        coerce(&token, RawInput::Flag),
        expect!["expected a value for `token`"],
    );
}

#[test]
fn counted_options() {
    let verbose = ParamSpec::option("verbose", int()).counted();
    check(
        coerce(&verbose, RawInput::Count(3)),
        expect![[r#"
            Int(
                3,
            )
        "#]],
    );
    check(
        coerce(&verbose, RawInput::Flag),
        expect![[r#"
            Int(
                1,
            )
        "#]],
    );
    // Never given: zero, not a missing-option error.
    check(
        coerce(&verbose, RawInput::Absent),
        expect![[r#"
            Int(
                0,
            )
        "#]],
    );
    check(
        coerce(&verbose, RawInput::Count(0)),
        expect![[r#"
            Int(
                0,
            )
        "#]],
    );

    // An uncounted option still rejects repetition.
    let level = ParamSpec::option("level", int());
    check(
        coerce(&level, RawInput::Count(2)),
        expect!["flag specified more than once: `--level`"],
    );
}

#[test]
fn every_flag_subset_combines() {
    let set = FlagSet::new([("a", 1, ""), ("b", 2, ""), ("c", 4, "")]).unwrap();
    let members = ["a", "b", "c"];
    let toppings =
        ParamSpec::option("toppings", TypeSpec::Flags(set)).with_default(Value::Flags(0));
    let registry = SubtypeRegistry::new();
    let coercer = Coercer::new(&registry);

    for mask in 0u64..8 {
        let present: Vec<&str> =
            members.iter().enumerate().filter(|(i, _)| mask & (1 << i) != 0).map(|(_, m)| *m).collect();
        assert_eq!(coercer.combine_flags(&toppings, &present).unwrap(), Value::Flags(mask));
    }
}
