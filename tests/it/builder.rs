use argot::{
    Builder, Coercer, ParamSpec, RawInput, Result, Scalar, Subtype, SubtypeRegistry, TypeSpec,
    Value,
};
use expect_test::expect;

use crate::check;

fn string() -> TypeSpec {
    TypeSpec::Scalar(Scalar::string())
}

fn int() -> TypeSpec {
    TypeSpec::Scalar(Scalar::int())
}

/// The qemu-style fixture: an abstract `Nic` constructible as a tap device or
/// a user-mode device.
fn nic_registry() -> SubtypeRegistry {
    let mut registry = SubtypeRegistry::new();
    registry
        .register(
            "Nic",
            Subtype::new("tap")
                .field("model", string())
                .unwrap()
                .field_with_default("ports", int(), Value::Int(1))
                .unwrap(),
        )
        .unwrap();
    registry
        .register(
            "Nic",
            Subtype::new("user")
                .field_with_default("hostfwd", TypeSpec::Optional(Box::new(string())), Value::Absent)
                .unwrap(),
        )
        .unwrap();
    registry
}

fn coerce_nic(registry: &SubtypeRegistry, param: &ParamSpec, input: RawInput<'_>) -> Result<Value> {
    Coercer::new(registry).coerce(param, input)
}

#[test]
fn single_builder_option() {
    let registry = nic_registry();
    let nic = ParamSpec::option("nic", TypeSpec::Builder(Builder::new("Nic")));
    check(
        coerce_nic(&registry, &nic, RawInput::Token("tap,model=e1000")),
        expect![[r#"
            Object(
                ObjectValue {
                    subtype: "tap",
                    fields: {
                        "model": Str(
                            "e1000",
                        ),
                        "ports": Int(
                            1,
                        ),
                    },
                },
            )
        "#]],
    );
}

#[test]
fn colons_are_not_delimiters() {
    let registry = nic_registry();
    let nic = ParamSpec::option("nic", TypeSpec::Builder(Builder::new("Nic")));
    check(
        coerce_nic(&registry, &nic, RawInput::Token("user,hostfwd=tcp::10022-:22")),
        expect![[r#"
            Object(
                ObjectValue {
                    subtype: "user",
                    fields: {
                        "hostfwd": Str(
                            "tcp::10022-:22",
                        ),
                    },
                },
            )
        "#]],
    );
    // Quoting also works, for values that do embed commas.
    check(
        coerce_nic(&registry, &nic, RawInput::Token("user,hostfwd='tcp::10022-:22'")),
        expect![[r#"
            Object(
                ObjectValue {
                    subtype: "user",
                    fields: {
                        "hostfwd": Str(
                            "tcp::10022-:22",
                        ),
                    },
                },
            )
        "#]],
    );
}

#[test]
fn list_of_builders_takes_one_object_per_appearance() {
    let registry = nic_registry();
    let nics = ParamSpec::option(
        "nics",
        TypeSpec::List(Box::new(TypeSpec::Builder(Builder::new("Nic")))),
    );
    check(
        coerce_nic(&registry, &nics, RawInput::Tokens(&["tap,virtio", "user"])),
        expect![[r#"
            List(
                [
                    Object(
                        ObjectValue {
                            subtype: "tap",
                            fields: {
                                "model": Str(
                                    "virtio",
                                ),
                                "ports": Int(
                                    1,
                                ),
                            },
                        },
                    ),
                    Object(
                        ObjectValue {
                            subtype: "user",
                            fields: {
                                "hostfwd": Absent,
                            },
                        },
                    ),
                ],
            )
        "#]],
    );
    // No devices at all.
    check(
        coerce_nic(&registry, &nics, RawInput::Token("-")),
        expect![[r#"
            List(
                [],
            )
        "#]],
    );
}

#[test]
fn errors_name_the_subtype_and_parameter() {
    let registry = nic_registry();
    let nic = ParamSpec::option("nic", TypeSpec::Builder(Builder::new("Nic")));
    check(
        coerce_nic(&registry, &nic, RawInput::Token("tap")),
        expect!["the following fields are required for `tap` value of `nic`: model (str)"],
    );
    check(
        coerce_nic(&registry, &nic, RawInput::Token("bridge,br0")),
        expect!["unknown subtype `bridge` for `nic` (known: tap, user)"],
    );
    check(
        coerce_nic(&registry, &nic, RawInput::Token("model=e1000")),
        expect!["a subtype alias is required for `nic` (one of tap, user)"],
    );
    check(
        coerce_nic(&registry, &nic, RawInput::Token("tap,e1000,ports=oops")),
        expect!["can't parse `oops` for `nic.ports`, invalid digit found in string"],
    );

    let empty = SubtypeRegistry::new();
    check(
        coerce_nic(&empty, &nic, RawInput::Token("tap,e1000")),
        expect!["no subtypes registered for `Nic` (parameter `nic`)"],
    );
}
