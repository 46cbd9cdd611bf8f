//! Token parser.
//!
//! Pure classification of argv tokens against the active command: produces
//! operands, unknown option-shaped tokens for a child to re-parse, and an
//! ordered list of recognized-option events for the value resolver. The token
//! parser knows nothing about values, only about shape.

use std::collections::VecDeque;
use std::rc::Rc;

use crate::opt::Opt;

/// Snapshot of the parts of a command the token parser needs.
#[derive(Clone)]
pub(crate) struct TokenContext {
    pub(crate) options: Vec<Rc<Opt>>,
    pub(crate) combine_flag_and_optional_value: bool,
    pub(crate) enable_positional_options: bool,
    pub(crate) pass_through_options: bool,
    /// Child command names and aliases, for the positional-options cut.
    pub(crate) subcommand_names: Vec<String>,
    pub(crate) help_command_name: Option<String>,
    pub(crate) has_default_command: bool,
}

impl TokenContext {
    fn find_option(&self, flag: &str) -> Option<usize> {
        self.options.iter().position(|o| o.matches(flag))
    }

    fn is_subcommand(&self, token: &str) -> bool {
        self.subcommand_names.iter().any(|n| n == token)
    }
}

/// A recognized option occurrence, in argv order.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct OptEvent {
    /// Index into [`TokenContext::options`].
    pub(crate) opt: usize,
    /// Raw attached value, when one was consumed.
    pub(crate) raw: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct TokenOutcome {
    pub(crate) operands: Vec<String>,
    pub(crate) unknown: Vec<String>,
    pub(crate) events: Vec<OptEvent>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TokenError {
    /// A required-argument option was the last token.
    OptionMissingArgument { opt: usize },
}

/// An option-shaped token: starts with `-` and is longer than `-` itself.
fn maybe_option(token: &str) -> bool {
    token.len() > 1 && token.starts_with('-')
}

/// Classify `argv` against the active command.
///
/// Rules are evaluated per token, in order: `--` literal, pending variadic
/// collection, exact flag match, short cluster, `--flag=value`, unknown
/// option routing, positional/pass-through cuts, operand.
pub(crate) fn parse_tokens(
    ctx: &TokenContext,
    argv: &[String],
) -> Result<TokenOutcome, TokenError> {
    let mut operands: Vec<String> = Vec::new();
    let mut unknown: Vec<String> = Vec::new();
    let mut events: Vec<OptEvent> = Vec::new();
    let mut dest_unknown = false;
    let mut active_variadic: Option<usize> = None;
    let mut queue: VecDeque<String> = argv.iter().cloned().collect();

    while let Some(arg) = queue.pop_front() {
        // Everything after a literal `--` is an operand. The marker itself is
        // only kept when we are already routing to unknown, so a child
        // re-parse sees the same boundary.
        if arg == "--" {
            if dest_unknown {
                unknown.push(arg);
            }
            operands.extend(queue.drain(..));
            break;
        }

        if let Some(opt_idx) = active_variadic {
            if !maybe_option(&arg) {
                events.push(OptEvent {
                    opt: opt_idx,
                    raw: Some(arg),
                });
                continue;
            }
            active_variadic = None;
        }

        if maybe_option(&arg) {
            if let Some(opt_idx) = ctx.find_option(&arg) {
                let opt = &ctx.options[opt_idx];
                if opt.required {
                    let value = queue
                        .pop_front()
                        .ok_or(TokenError::OptionMissingArgument { opt: opt_idx })?;
                    events.push(OptEvent {
                        opt: opt_idx,
                        raw: Some(value),
                    });
                } else if opt.optional {
                    let raw = match queue.front() {
                        Some(next) if !maybe_option(next) => queue.pop_front(),
                        _ => None,
                    };
                    events.push(OptEvent { opt: opt_idx, raw });
                } else {
                    events.push(OptEvent {
                        opt: opt_idx,
                        raw: None,
                    });
                }
                active_variadic = ctx.options[opt_idx].variadic.then_some(opt_idx);
                continue;
            }
        }

        // Short cluster: `-Xrest` where `-X` is declared. The rest is the
        // option's value, or a re-queued `-rest` for boolean flags.
        if arg.len() > 2 && arg.starts_with('-') && !arg.starts_with("--") {
            if let Some(opt_idx) = ctx.find_option(&arg[..2]) {
                let opt = &ctx.options[opt_idx];
                if opt.required || (opt.optional && ctx.combine_flag_and_optional_value) {
                    events.push(OptEvent {
                        opt: opt_idx,
                        raw: Some(arg[2..].to_string()),
                    });
                } else {
                    events.push(OptEvent {
                        opt: opt_idx,
                        raw: None,
                    });
                    queue.push_front(format!("-{}", &arg[2..]));
                }
                continue;
            }
        }

        // `--flag=value` for options declared with an argument slot.
        if arg.starts_with("--") {
            if let Some(eq) = arg.find('=') {
                if eq > 2 {
                    if let Some(opt_idx) = ctx.find_option(&arg[..eq]) {
                        let opt = &ctx.options[opt_idx];
                        if opt.required || opt.optional {
                            events.push(OptEvent {
                                opt: opt_idx,
                                raw: Some(arg[eq + 1..].to_string()),
                            });
                            continue;
                        }
                    }
                }
            }
        }

        // An unrecognized option-shaped token switches the destination: it
        // and everything after it belong to a child for re-parsing.
        if maybe_option(&arg) {
            dest_unknown = true;
        }

        // In positional or pass-through mode, the first positional decides
        // everything that follows in one batch.
        if (ctx.enable_positional_options || ctx.pass_through_options)
            && operands.is_empty()
            && unknown.is_empty()
        {
            if ctx.is_subcommand(&arg) {
                operands.push(arg);
                unknown.extend(queue.drain(..));
                break;
            } else if ctx.help_command_name.as_deref() == Some(arg.as_str()) {
                operands.push(arg);
                operands.extend(queue.drain(..));
                break;
            } else if ctx.has_default_command {
                unknown.push(arg);
                unknown.extend(queue.drain(..));
                break;
            }
        }

        if ctx.pass_through_options {
            let dest = if dest_unknown { &mut unknown } else { &mut operands };
            dest.push(arg);
            dest.extend(queue.drain(..));
            break;
        }

        if dest_unknown {
            unknown.push(arg);
        } else {
            operands.push(arg);
        }
    }

    Ok(TokenOutcome {
        operands,
        unknown,
        events,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(flag_decls: &[&str]) -> TokenContext {
        TokenContext {
            options: flag_decls
                .iter()
                .map(|f| Rc::new(Opt::new(f, "")))
                .collect(),
            combine_flag_and_optional_value: true,
            enable_positional_options: false,
            pass_through_options: false,
            subcommand_names: Vec::new(),
            help_command_name: None,
            has_default_command: false,
        }
    }

    fn argv(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_boolean_and_required_options() {
        let ctx = ctx(&["-v, --verbose", "-p, --port <n>"]);
        let out = parse_tokens(&ctx, &argv(&["--verbose", "--port", "80", "file"])).unwrap();
        assert_eq!(out.operands, vec!["file"]);
        assert!(out.unknown.is_empty());
        assert_eq!(
            out.events,
            vec![
                OptEvent { opt: 0, raw: None },
                OptEvent {
                    opt: 1,
                    raw: Some("80".into())
                },
            ]
        );
    }

    #[test]
    fn test_required_option_missing_argument() {
        let ctx = ctx(&["-p, --port <n>"]);
        let err = parse_tokens(&ctx, &argv(&["--port"])).unwrap_err();
        assert_eq!(err, TokenError::OptionMissingArgument { opt: 0 });
    }

    #[test]
    fn test_optional_option_skips_option_shaped_value() {
        let ctx = ctx(&["-c, --cheese [type]", "-v"]);
        let out = parse_tokens(&ctx, &argv(&["--cheese", "-v"])).unwrap();
        assert_eq!(
            out.events,
            vec![OptEvent { opt: 0, raw: None }, OptEvent { opt: 1, raw: None }]
        );
    }

    #[test]
    fn test_short_cluster_with_required_value() {
        let ctx = ctx(&["-x <n>", "-y <n>"]);
        let out = parse_tokens(&ctx, &argv(&["-xn1", "-y", "2"])).unwrap();
        assert_eq!(
            out.events,
            vec![
                OptEvent {
                    opt: 0,
                    raw: Some("n1".into())
                },
                OptEvent {
                    opt: 1,
                    raw: Some("2".into())
                },
            ]
        );
    }

    #[test]
    fn test_short_cluster_boolean_requeues_rest() {
        let ctx = ctx(&["-a", "-b"]);
        let out = parse_tokens(&ctx, &argv(&["-ab"])).unwrap();
        assert_eq!(
            out.events,
            vec![OptEvent { opt: 0, raw: None }, OptEvent { opt: 1, raw: None }]
        );
    }

    #[test]
    fn test_combine_flag_and_optional_value_toggle() {
        let mut c = ctx(&["-f, --flag [v]"]);
        let out = parse_tokens(&c, &argv(&["-fb"])).unwrap();
        assert_eq!(
            out.events,
            vec![OptEvent {
                opt: 0,
                raw: Some("b".into())
            }]
        );

        c.combine_flag_and_optional_value = false;
        let out = parse_tokens(&c, &argv(&["-fb"])).unwrap();
        assert_eq!(out.events, vec![OptEvent { opt: 0, raw: None }]);
        assert_eq!(out.unknown, vec!["-b"]);
    }

    #[test]
    fn test_long_equals_form() {
        let ctx = ctx(&["--port <n>", "--flag"]);
        let out = parse_tokens(&ctx, &argv(&["--port=80"])).unwrap();
        assert_eq!(
            out.events,
            vec![OptEvent {
                opt: 0,
                raw: Some("80".into())
            }]
        );

        // a boolean flag does not accept `=value`; the token is unknown
        let out = parse_tokens(&ctx, &argv(&["--flag=yes"])).unwrap();
        assert!(out.events.is_empty());
        assert_eq!(out.unknown, vec!["--flag=yes"]);
    }

    #[test]
    fn test_double_dash_stops_option_parsing() {
        let ctx = ctx(&["-v"]);
        let out = parse_tokens(&ctx, &argv(&["a", "--", "-v", "b"])).unwrap();
        assert_eq!(out.operands, vec!["a", "-v", "b"]);
        assert!(out.events.is_empty());
        assert!(out.unknown.is_empty());
    }

    #[test]
    fn test_double_dash_kept_for_child_reparse() {
        let ctx = ctx(&[]);
        let out = parse_tokens(&ctx, &argv(&["--mystery", "--", "rest"])).unwrap();
        assert_eq!(out.unknown, vec!["--mystery", "--"]);
        assert_eq!(out.operands, vec!["rest"]);
    }

    #[test]
    fn test_unknown_option_switches_destination() {
        let ctx = ctx(&["-v"]);
        let out = parse_tokens(&ctx, &argv(&["one", "--strange", "two", "-v"])).unwrap();
        assert_eq!(out.operands, vec!["one"]);
        // declared flags are still recognized after the switch
        assert_eq!(out.unknown, vec!["--strange", "two"]);
        assert_eq!(out.events, vec![OptEvent { opt: 0, raw: None }]);
    }

    #[test]
    fn test_variadic_option_collects_until_option() {
        let ctx = ctx(&["-n, --number <value...>", "-v"]);
        let out = parse_tokens(&ctx, &argv(&["--number", "1", "2", "-v", "3"])).unwrap();
        assert_eq!(
            out.events,
            vec![
                OptEvent {
                    opt: 0,
                    raw: Some("1".into())
                },
                OptEvent {
                    opt: 0,
                    raw: Some("2".into())
                },
                OptEvent { opt: 1, raw: None },
            ]
        );
        assert_eq!(out.operands, vec!["3"]);
    }

    #[test]
    fn test_lone_dash_is_an_operand_and_variadic_value() {
        let ctx = ctx(&["-n <value...>"]);
        let out = parse_tokens(&ctx, &argv(&["-n", "x", "-", "rest"])).unwrap();
        assert_eq!(
            out.events,
            vec![
                OptEvent {
                    opt: 0,
                    raw: Some("x".into())
                },
                OptEvent {
                    opt: 0,
                    raw: Some("-".into())
                },
                OptEvent {
                    opt: 0,
                    raw: Some("rest".into())
                },
            ]
        );
    }

    #[test]
    fn test_positional_options_cut_at_subcommand() {
        let mut c = ctx(&["-d"]);
        c.enable_positional_options = true;
        c.subcommand_names = vec!["serve".to_string()];
        let out = parse_tokens(&c, &argv(&["-d", "serve", "-p", "80"])).unwrap();
        assert_eq!(out.events, vec![OptEvent { opt: 0, raw: None }]);
        assert_eq!(out.operands, vec!["serve"]);
        assert_eq!(out.unknown, vec!["-p", "80"]);
    }

    #[test]
    fn test_pass_through_stops_at_first_operand() {
        let mut c = ctx(&["-d"]);
        c.pass_through_options = true;
        let out = parse_tokens(&c, &argv(&["-d", "target", "-x", "--whatever"])).unwrap();
        assert_eq!(out.events, vec![OptEvent { opt: 0, raw: None }]);
        assert_eq!(out.operands, vec!["target", "-x", "--whatever"]);
        assert!(out.unknown.is_empty());
    }

    #[test]
    fn test_default_command_routes_batch_to_unknown() {
        let mut c = ctx(&[]);
        c.enable_positional_options = true;
        c.has_default_command = true;
        let out = parse_tokens(&c, &argv(&["build", "--fast"])).unwrap();
        assert!(out.operands.is_empty());
        assert_eq!(out.unknown, vec!["build", "--fast"]);
    }
}
