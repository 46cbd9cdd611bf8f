//! Value resolution: applying recognized-option events, the environment and
//! implied passes, and mandatory/conflict validation.

use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use crate::command::Command;
use crate::error::{codes, CliError};
use crate::opt::Opt;
use crate::value::{Value, ValueSource};

/// Classifies the options sharing a value attribute into positive/negative
/// pairs, and decides which of a pair a value likely came from: the negative
/// owns it iff it equals the negative's preset (or `false` without one).
pub(crate) struct DualOptions {
    negative: HashMap<String, Rc<Opt>>,
    dual: HashSet<String>,
}

impl DualOptions {
    pub(crate) fn new(options: &[Rc<Opt>]) -> Self {
        let mut positive: HashSet<String> = HashSet::new();
        let mut negative: HashMap<String, Rc<Opt>> = HashMap::new();
        for opt in options {
            if opt.negate {
                negative.insert(opt.attribute_name(), opt.clone());
            } else {
                positive.insert(opt.attribute_name());
            }
        }
        let dual = negative
            .keys()
            .filter(|k| positive.contains(*k))
            .cloned()
            .collect();
        Self { negative, dual }
    }

    pub(crate) fn value_from_option(&self, value: Option<&Value>, opt: &Opt) -> bool {
        let attr = opt.attribute_name();
        if !self.dual.contains(&attr) {
            return true;
        }
        let negative_value = self.negative[&attr]
            .preset
            .clone()
            .unwrap_or(Value::Bool(false));
        opt.negate == (value == Some(&negative_value))
    }
}

impl Command {
    /// Apply one recognized-option event (source `cli` or `env`) to the value
    /// store, honoring preset substitution, coercion, choices, variadic
    /// accumulation, and the boolean/negate fallbacks.
    pub(crate) fn apply_option_event(
        &self,
        opt: &Rc<Opt>,
        raw: Option<&str>,
        source: ValueSource,
    ) -> Result<(), CliError> {
        let attr = opt.attribute_name();
        let old = self.get_option_value(&attr);

        let mut staged: Option<Value> = match raw {
            Some(s) => Some(Value::Str(s.to_string())),
            None => opt.preset.clone(),
        };

        if let Some(value) = staged.take() {
            if let Value::Str(s) = &value {
                if let Some(choices) = &opt.choices {
                    if !choices.iter().any(|c| c == s) {
                        let hint = format!("Allowed choices are {}.", choices.join(", "));
                        return Err(self.invalid_option_value(opt, s, source, &hint));
                    }
                }
            }
            let coerced = match (opt.parser.as_ref(), value) {
                (Some(parser), Value::Str(s)) => parser(&s, old.as_ref())
                    .map_err(|msg| self.invalid_option_value(opt, &s, source, &msg))?,
                (_, v) if opt.variadic => {
                    concat_value(v, old.as_ref(), opt.default_value.as_ref())
                }
                (_, v) => v,
            };
            staged = Some(coerced);
        }

        let resolved = staged.unwrap_or_else(|| {
            if opt.negate {
                Value::Bool(false)
            } else if opt.is_boolean() || opt.optional {
                Value::Bool(true)
            } else {
                // required-argument option with no value; not reachable from
                // the token parser, kept as a defensive fallback
                Value::Str(String::new())
            }
        });
        self.set_option_value_with_source(&attr, resolved, source);

        // the version option short-circuits the parse
        let opt_name = opt.name();
        let is_version =
            self.inner.borrow().version_opt_name.as_deref() == Some(opt_name.as_str());
        if is_version && source == ValueSource::Cli {
            let version = self
                .inner
                .borrow()
                .version
                .clone()
                .unwrap_or_default();
            let cfg = self.config();
            (cfg.write_out)(&format!("{}\n", version));
            return Err(self.exit_with(0, codes::VERSION, &version));
        }
        Ok(())
    }

    fn invalid_option_value(
        &self,
        opt: &Opt,
        value: &str,
        source: ValueSource,
        hint: &str,
    ) -> CliError {
        let context = match (source, opt.env_var()) {
            (ValueSource::Env, Some(env)) => format!(
                "error: option '{}' value '{}' from env '{}' is invalid.",
                opt.flags(),
                value,
                env
            ),
            _ => format!(
                "error: option '{}' argument '{}' is invalid.",
                opt.flags(),
                value
            ),
        };
        let message = if hint.is_empty() {
            context
        } else {
            format!("{} {}", context, hint)
        };
        self.error_out(&message, codes::INVALID_ARGUMENT, 1)
    }

    /// Apply environment-bound options after CLI events. Only sources below
    /// `env` in precedence (or a previous env read) may be overwritten.
    pub(crate) fn parse_options_env(&self) -> Result<(), CliError> {
        let options: Vec<Rc<Opt>> = self.inner.borrow().options.clone();
        let cfg = self.config();
        for opt in options {
            let Some(env_name) = opt.env_var() else {
                continue;
            };
            let Some(env_value) = (cfg.env_lookup)(env_name) else {
                continue;
            };
            let attr = opt.attribute_name();
            let overwritable = self.get_option_value(&attr).is_none()
                || matches!(
                    self.get_option_value_source(&attr),
                    Some(ValueSource::Default | ValueSource::Config | ValueSource::Env)
                );
            if !overwritable {
                continue;
            }
            log::debug!("applying env '{}' to option '{}'", env_name, opt.flags());
            let raw = (opt.required || opt.optional).then_some(env_value.as_str());
            self.apply_option_event(&opt, raw, ValueSource::Env)?;
        }
        Ok(())
    }

    /// Apply implied values after the environment pass: an option that has a
    /// user-supplied value (and, for a dual pair, actually owns it) fills in
    /// targets whose current source is absent or default. An already-implied
    /// target is never overwritten, so the first implier sticks.
    pub(crate) fn parse_options_implied(&self) {
        let options: Vec<Rc<Opt>> = self.inner.borrow().options.clone();
        let dual = DualOptions::new(&options);
        let has_custom_value = |attr: &str| {
            self.get_option_value(attr).is_some()
                && !matches!(
                    self.get_option_value_source(attr),
                    Some(ValueSource::Default | ValueSource::Implied)
                )
        };
        let target_overwritable = |attr: &str| {
            matches!(
                self.get_option_value_source(attr),
                None | Some(ValueSource::Default)
            )
        };

        for opt in options.iter().filter(|o| !o.implied.is_empty()) {
            let attr = opt.attribute_name();
            if !has_custom_value(&attr) {
                continue;
            }
            let value = self.get_option_value(&attr);
            if !dual.value_from_option(value.as_ref(), opt) {
                continue;
            }
            for (implied_key, implied_value) in &opt.implied {
                if target_overwritable(implied_key) {
                    self.set_option_value_with_source(
                        implied_key,
                        implied_value.clone(),
                        ValueSource::Implied,
                    );
                }
            }
        }
    }

    /// Every mandatory option on this command and its ancestors must have a
    /// value by the time an action dispatches.
    pub(crate) fn check_missing_mandatory(&self) -> Result<(), CliError> {
        for cmd in self.command_and_ancestors() {
            let options: Vec<Rc<Opt>> = cmd.inner.borrow().options.clone();
            for opt in options.iter().filter(|o| o.mandatory) {
                if cmd.get_option_value(&opt.attribute_name()).is_none() {
                    return Err(self.error_out(
                        &format!("error: required option '{}' not specified", opt.flags()),
                        codes::MISSING_MANDATORY_OPTION_VALUE,
                        1,
                    ));
                }
            }
        }
        Ok(())
    }

    /// Conflicts are validated per command, on this command and each
    /// ancestor, over options whose value did not come from a default.
    pub(crate) fn check_conflicts(&self) -> Result<(), CliError> {
        for cmd in self.command_and_ancestors() {
            cmd.check_local_conflicts(self)?;
        }
        Ok(())
    }

    fn check_local_conflicts(&self, reporter: &Command) -> Result<(), CliError> {
        let options: Vec<Rc<Opt>> = self.inner.borrow().options.clone();
        let defined: Vec<Rc<Opt>> = options
            .iter()
            .filter(|o| {
                let attr = o.attribute_name();
                self.get_option_value(&attr).is_some()
                    && self.get_option_value_source(&attr) != Some(ValueSource::Default)
            })
            .cloned()
            .collect();

        for opt in defined.iter().filter(|o| !o.conflicts_with.is_empty()) {
            if let Some(conflicting) = defined
                .iter()
                .find(|d| opt.conflicts_with.contains(&d.attribute_name()))
            {
                let message = format!(
                    "error: {} cannot be used with {}",
                    self.describe_conflict_source(opt, &options),
                    self.describe_conflict_source(conflicting, &options)
                );
                return Err(reporter.error_out(&message, codes::CONFLICTING_OPTION, 1));
            }
        }
        Ok(())
    }

    /// Name the flag (or environment variable) that actually produced the
    /// value behind `opt`'s attribute, resolving dual pairs by value.
    fn describe_conflict_source(&self, opt: &Rc<Opt>, options: &[Rc<Opt>]) -> String {
        let attr = opt.attribute_name();
        let value = self.get_option_value(&attr);
        let negative = options
            .iter()
            .find(|o| o.negate && o.attribute_name() == attr);
        let positive = options
            .iter()
            .find(|o| !o.negate && o.attribute_name() == attr);

        let best = match negative {
            Some(neg) => {
                let negative_value = neg.preset.clone().unwrap_or(Value::Bool(false));
                if value.as_ref() == Some(&negative_value) {
                    neg
                } else {
                    positive.unwrap_or(opt)
                }
            }
            None => positive.unwrap_or(opt),
        };

        match (self.get_option_value_source(&best.attribute_name()), best.env_var()) {
            (Some(ValueSource::Env), Some(env)) => format!("environment variable '{}'", env),
            _ => format!("option '{}'", best.flags()),
        }
    }
}

/// Variadic accumulation: restart from the declared default, append to an
/// existing list otherwise.
fn concat_value(value: Value, old: Option<&Value>, default: Option<&Value>) -> Value {
    match old {
        Some(Value::List(items)) if old != default => {
            let mut items = items.clone();
            items.push(value);
            Value::List(items)
        }
        _ => Value::List(vec![value]),
    }
}
