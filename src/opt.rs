//! Option flag model.
//!
//! Parses declaration strings like `-p, --port <number>` into a structural
//! description consumed by the token parser and the value resolver.

use std::rc::Rc;

use crate::value::Value;

/// Coercion callback for option and argument values.
///
/// Receives the raw token and the previous value (used by variadic
/// accumulators); an `Err` message surfaces as `commander.invalidArgument`
/// with a context prefix naming the flag and source.
pub type ValueParser = Rc<dyn Fn(&str, Option<&Value>) -> Result<Value, String>>;

/// A declared option.
///
/// Built from a flag string and refined with the builder methods, then frozen
/// when registered on a command.
#[derive(Clone)]
pub struct Opt {
    pub(crate) flags: String,
    pub(crate) description: String,
    pub(crate) short: Option<String>,
    pub(crate) long: Option<String>,
    pub(crate) required: bool,
    pub(crate) optional: bool,
    pub(crate) variadic: bool,
    pub(crate) negate: bool,
    pub(crate) mandatory: bool,
    pub(crate) hidden: bool,
    pub(crate) default_value: Option<Value>,
    pub(crate) default_value_description: Option<String>,
    pub(crate) preset: Option<Value>,
    pub(crate) env_var: Option<String>,
    pub(crate) parser: Option<ValueParser>,
    pub(crate) choices: Option<Vec<String>>,
    pub(crate) conflicts_with: Vec<String>,
    pub(crate) implied: Vec<(String, Value)>,
}

impl std::fmt::Debug for Opt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Opt")
            .field("flags", &self.flags)
            .field("short", &self.short)
            .field("long", &self.long)
            .field("required", &self.required)
            .field("optional", &self.optional)
            .field("variadic", &self.variadic)
            .field("negate", &self.negate)
            .finish()
    }
}

impl Opt {
    /// Parse a flag declaration such as `-p, --port <number>` or `--no-color`.
    ///
    /// Panics when the declaration contains no flag at all; malformed
    /// declarations are authoring errors.
    pub fn new(flags: &str, description: &str) -> Self {
        let (short, long) = split_flags(flags);
        if short.is_none() && long.is_none() {
            panic!("option creation failed: no flags found in '{}'", flags);
        }

        let required = flags.contains('<');
        let optional = flags.contains('[');
        let trimmed = flags.trim_end();
        let variadic = trimmed.ends_with("...>") || trimmed.ends_with("...]");
        let negate = long.as_deref().is_some_and(|l| l.starts_with("--no-"));

        Self {
            flags: flags.to_string(),
            description: description.to_string(),
            short,
            long,
            required,
            optional,
            variadic,
            negate,
            mandatory: false,
            hidden: false,
            default_value: None,
            default_value_description: None,
            preset: None,
            env_var: None,
            parser: None,
            choices: None,
            conflicts_with: Vec::new(),
            implied: Vec::new(),
        }
    }

    /// Option name: the long flag without leading dashes, falling back to the
    /// short flag. `--no-color` has name `no-color`.
    pub fn name(&self) -> String {
        if let Some(long) = &self.long {
            return long[2..].to_string();
        }
        self.short.as_ref().expect("option has short or long")[1..].to_string()
    }

    /// Key under which the value is stored: name without any `no-` prefix,
    /// camel-cased on hyphens (`--dry-run` stores as `dryRun`).
    pub fn attribute_name(&self) -> String {
        let name = self.name();
        camelcase(name.strip_prefix("no-").unwrap_or(&name))
    }

    /// Whether `arg` is exactly this option's short or long flag.
    pub fn matches(&self, arg: &str) -> bool {
        self.short.as_deref() == Some(arg) || self.long.as_deref() == Some(arg)
    }

    /// True when the option takes no argument and is not a negation.
    pub fn is_boolean(&self) -> bool {
        !self.required && !self.optional && !self.negate
    }

    pub fn flags(&self) -> &str {
        &self.flags
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn long(&self) -> Option<&str> {
        self.long.as_deref()
    }

    pub fn short(&self) -> Option<&str> {
        self.short.as_deref()
    }

    pub fn env_var(&self) -> Option<&str> {
        self.env_var.as_deref()
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.default_value.as_ref()
    }

    // ---- builders -------------------------------------------------------

    /// Declare the default value, recorded with source `default` at
    /// registration time.
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    /// Default value plus the text shown for it in help output.
    pub fn default_described(mut self, value: impl Into<Value>, description: &str) -> Self {
        self.default_value = Some(value.into());
        self.default_value_description = Some(description.to_string());
        self
    }

    /// Value substituted when an optional-argument flag is given without a
    /// value (`--donate` with preset `"20"` behaves like `--donate 20`).
    pub fn preset(mut self, value: impl Into<Value>) -> Self {
        self.preset = Some(value.into());
        self
    }

    /// Bind to an environment variable, applied after CLI parsing with source
    /// `env` when the variable is present.
    pub fn env(mut self, name: &str) -> Self {
        self.env_var = Some(name.to_string());
        self
    }

    /// Restrict the raw value to a closed set of strings.
    pub fn choices<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.choices = Some(values.into_iter().map(Into::into).collect());
        self
    }

    /// Install a coercion callback.
    pub fn parser<F>(mut self, f: F) -> Self
    where
        F: Fn(&str, Option<&Value>) -> Result<Value, String> + 'static,
    {
        self.parser = Some(Rc::new(f));
        self
    }

    /// Declare a conflict with another option, by attribute name
    /// (`"verbose"`, not `"--verbose"`).
    pub fn conflicts(mut self, attribute_name: &str) -> Self {
        self.conflicts_with.push(attribute_name.to_string());
        self
    }

    /// Declare conflicts with several options at once.
    pub fn conflicts_all<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.conflicts_with.extend(names.into_iter().map(Into::into));
        self
    }

    /// When this option has a user-supplied value, set `attribute_name` to
    /// `value` (source `implied`) unless the target already has one.
    pub fn implies(mut self, attribute_name: &str, value: impl Into<Value>) -> Self {
        self.implied.push((attribute_name.to_string(), value.into()));
        self
    }

    /// Require the option to have a value once parsing completes.
    pub fn mandatory(mut self, mandatory: bool) -> Self {
        self.mandatory = mandatory;
        self
    }

    /// Exclude from help output and suggestions.
    pub fn hide(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }
}

/// Split a flag declaration into `(short, long)`.
///
/// The declaration is split on runs of spaces, commas, and pipes. A lone flag
/// matching `-x` is a short flag; any other lone flag is the long flag.
fn split_flags(flags: &str) -> (Option<String>, Option<String>) {
    let parts: Vec<&str> = flags
        .split([' ', ',', '|'])
        .filter(|p| !p.is_empty())
        .collect();

    let is_flag = |p: &str| !p.starts_with('<') && !p.starts_with('[');
    let first = parts.first().copied().filter(|p| is_flag(p));
    let second = parts.get(1).copied().filter(|p| first.is_some() && is_flag(p));

    match (first, second) {
        (Some(short), Some(long)) => (Some(short.to_string()), Some(long.to_string())),
        (Some(lone), None) if is_lone_short(lone) => (Some(lone.to_string()), None),
        (Some(lone), None) => (None, Some(lone.to_string())),
        _ => (None, None),
    }
}

fn is_lone_short(flag: &str) -> bool {
    let bytes = flag.as_bytes();
    bytes.len() == 2 && bytes[0] == b'-' && bytes[1] != b'-'
}

/// Lower-camel-case hyphenated segments: `some-name` becomes `someName`.
pub(crate) fn camelcase(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for (i, segment) in s.split('-').enumerate() {
        if i == 0 {
            out.push_str(segment);
            continue;
        }
        let mut chars = segment.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            out.push_str(chars.as_str());
        }
    }
    out
}
