//! Turns a command's ordered parameter list into CLI-shape metadata:
//! positional ordering checks, flag and placeholder directives embedded in
//! help text, name-collision detection, and flag-set expansion.

use std::collections::HashMap;

use crate::{
    error::SpecError,
    name,
    spec::{ParamKind, ParamSpec, TypeSpec},
};

/// A boolean option derived from one flag-set member. The coerced value of
/// the owning parameter is the bitwise OR of all members whose flag appeared.
#[derive(Debug, Clone)]
pub struct FlagOption {
    pub(crate) owner: String,
    pub(crate) long: String,
    pub(crate) short: Option<char>,
    pub(crate) bit: u64,
    pub(crate) help: String,
}

impl FlagOption {
    /// Normalized CLI name of the owning flag-set parameter.
    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn long(&self) -> &str {
        &self.long
    }

    pub fn short(&self) -> Option<char> {
        self.short
    }

    pub fn bit(&self) -> u64 {
        self.bit
    }

    pub fn help(&self) -> &str {
        &self.help
    }
}

enum LongOverride {
    Keep,
    Set(String),
    Remove,
}

struct Directive {
    short: Option<char>,
    long: LongOverride,
    rest: String,
}

pub(crate) fn classify(
    command: &str,
    params: Vec<ParamSpec>,
) -> Result<(Vec<ParamSpec>, Vec<FlagOption>), SpecError> {
    // 0: accepting required, 1: defaulted seen, 2: variadic seen.
    let mut stage = 0u8;
    let mut taken: HashMap<String, String> = HashMap::new();
    let mut out = Vec::with_capacity(params.len());
    let mut flag_options = Vec::new();

    for mut p in params {
        p.ty.validate()?;
        p.cli_name = name::normalize_word(&p.name)?;

        match p.kind {
            ParamKind::Required => {
                if stage >= 2 {
                    return Err(after_variadic(command, &p));
                }
                if stage >= 1 {
                    return Err(SpecError::PositionalOrder {
                        command: command.to_string(),
                        param: p.name.clone(),
                    });
                }
            }
            ParamKind::Defaulted | ParamKind::Variadic => {
                if stage >= 2 {
                    return Err(after_variadic(command, &p));
                }
                stage = if p.kind == ParamKind::Variadic { 2 } else { 1 };
            }
            ParamKind::Option => {}
        }

        if p.required && !matches!(p.kind, ParamKind::Variadic | ParamKind::Option) {
            return Err(SpecError::BadRequired {
                command: command.to_string(),
                param: p.name.clone(),
            });
        }

        if p.counted && p.kind != ParamKind::Option {
            return Err(SpecError::BadCounted {
                command: command.to_string(),
                param: p.name.clone(),
            });
        }

        if p.kind == ParamKind::Option {
            p.long = Some(p.cli_name.clone());
        }
        match flag_directive(&p.help).map_err(|text| SpecError::Directive {
            command: command.to_string(),
            param: p.name.clone(),
            text,
        })? {
            None => {}
            Some(directive) => {
                if p.kind != ParamKind::Option {
                    return Err(SpecError::DirectiveOnPositional {
                        command: command.to_string(),
                        param: p.name.clone(),
                    });
                }
                p.help = directive.rest;
                p.short = directive.short;
                match directive.long {
                    LongOverride::Keep => {}
                    LongOverride::Set(long) => p.long = Some(long),
                    LongOverride::Remove => p.long = None,
                }
            }
        }

        match placeholder_directive(&p.help) {
            Ok(None) => {}
            Ok(Some((words, cleaned))) => {
                p.help = cleaned;
                let expected = match &p.ty {
                    TypeSpec::Tuple(fields) => fields.len(),
                    _ => 1,
                };
                if p.kind == ParamKind::Variadic && words.len() != 1 {
                    return Err(SpecError::PlaceholderCount {
                        command: command.to_string(),
                        param: p.name.clone(),
                        expected: 1,
                        found: words.len(),
                    });
                }
                if words.len() == expected {
                    p.placeholders = words;
                } else if words.len() == 1 {
                    p.placeholders = vec![words[0].clone(); expected];
                } else {
                    return Err(SpecError::PlaceholderCount {
                        command: command.to_string(),
                        param: p.name.clone(),
                        expected,
                        found: words.len(),
                    });
                }
            }
            Err(()) => {
                return Err(SpecError::MultiplePlaceholders {
                    command: command.to_string(),
                    param: p.name.clone(),
                });
            }
        }

        if let TypeSpec::Flags(set) = &p.ty {
            if p.kind != ParamKind::Option {
                return Err(SpecError::PositionalFlagSet {
                    command: command.to_string(),
                    param: p.name.clone(),
                });
            }
            if p.default.is_none() {
                return Err(SpecError::FlagSetDefault {
                    command: command.to_string(),
                    param: p.name.clone(),
                });
            }
            for member in set.members() {
                let (short, help) =
                    match flag_directive(&member.help).map_err(|text| SpecError::Directive {
                        command: command.to_string(),
                        param: p.name.clone(),
                        text,
                    })? {
                        None => (None, member.help.clone()),
                        // Members derive their long flag from their own name;
                        // only a short form may be supplied.
                        Some(Directive { short: Some(c), long: LongOverride::Keep, rest }) => {
                            (Some(c), rest)
                        }
                        Some(_) => {
                            let close = member.help.find(']').unwrap_or(member.help.len());
                            return Err(SpecError::Directive {
                                command: command.to_string(),
                                param: p.name.clone(),
                                text: member.help[1..close].to_string(),
                            });
                        }
                    };
                claim(&mut taken, command, &member.name, &p.name)?;
                flag_options.push(FlagOption {
                    owner: p.cli_name.clone(),
                    long: member.name.clone(),
                    short,
                    bit: member.bit,
                    help,
                });
            }
        }

        claim(&mut taken, command, &p.cli_name, &p.name)?;
        if let Some(long) = &p.long {
            if *long != p.cli_name {
                let long = long.clone();
                claim(&mut taken, command, &long, &p.name)?;
            }
        }

        out.push(p);
    }

    Ok((out, flag_options))
}

fn claim(
    taken: &mut HashMap<String, String>,
    command: &str,
    key: &str,
    owner: &str,
) -> Result<(), SpecError> {
    if let Some(prev) = taken.insert(key.to_string(), owner.to_string()) {
        if prev != owner {
            return Err(SpecError::ParamClash {
                command: command.to_string(),
                param: owner.to_string(),
                other: prev,
                simplified: key.to_string(),
            });
        }
    }
    Ok(())
}

fn after_variadic(command: &str, p: &ParamSpec) -> SpecError {
    SpecError::AfterVariadic { command: command.to_string(), param: p.name.clone() }
}

/// Parses a leading `[-x]`, `[--long]`, `[-x/--long]`, or `[-x/]` directive.
/// `Err` carries the malformed directive text.
fn flag_directive(help: &str) -> Result<Option<Directive>, String> {
    if !help.starts_with("[-") {
        return Ok(None);
    }
    let close = match help.find(']') {
        Some(it) => it,
        None => return Ok(None),
    };
    let content = &help[1..close];
    let rest = help[close + 1..].trim_start().to_string();

    if let Some(long) = content.strip_prefix("--") {
        if !valid_long(long) {
            return Err(content.to_string());
        }
        return Ok(Some(Directive { short: None, long: LongOverride::Set(long.to_string()), rest }));
    }

    let body = &content[1..];
    let mut chars = body.chars();
    let short = match chars.next() {
        Some(c) if c.is_ascii_alphanumeric() => c,
        _ => return Err(content.to_string()),
    };
    let long = match chars.as_str() {
        "" => LongOverride::Keep,
        "/" => LongOverride::Remove,
        tail => match tail.strip_prefix("/--") {
            Some(long) if valid_long(long) => LongOverride::Set(long.to_string()),
            _ => return Err(content.to_string()),
        },
    };
    Ok(Some(Directive { short: Some(short), long, rest }))
}

fn valid_long(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

/// Extracts the `{word}` / `{a,b,c}` placeholder group, if any. `Err(())`
/// means more than one group was found.
fn placeholder_directive(help: &str) -> Result<Option<(Vec<String>, String)>, ()> {
    let mut found: Option<(usize, usize, Vec<String>)> = None;
    let mut from = 0;
    while let Some(open_rel) = help[from..].find('{') {
        let open = from + open_rel;
        let close = match help[open..].find('}') {
            Some(rel) => open + rel,
            None => break,
        };
        from = close + 1;
        let content = &help[open + 1..close];
        let items: Vec<&str> = content.split(',').map(str::trim).collect();
        let valid = !content.is_empty()
            && items.iter().all(|item| {
                !item.is_empty()
                    && item.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
            });
        if !valid {
            continue;
        }
        if found.is_some() {
            return Err(());
        }
        found = Some((open, close, items.iter().map(|it| it.to_uppercase()).collect()));
    }
    match found {
        None => Ok(None),
        Some((open, close, words)) => {
            let mut cleaned = String::with_capacity(help.len());
            cleaned.push_str(&help[..open]);
            cleaned.push_str(&help[open + 1..close]);
            cleaned.push_str(&help[close + 1..]);
            Ok(Some((words, cleaned)))
        }
    }
}
