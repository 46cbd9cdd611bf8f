//! Positional argument model.

use std::rc::Rc;

use crate::opt::ValueParser;
use crate::value::Value;

/// A declared positional argument.
///
/// `<name>` is required, `[name]` optional, a bare name is required; a
/// trailing `...` inside the brackets marks the argument variadic.
#[derive(Clone)]
pub struct Arg {
    pub(crate) name: String,
    pub(crate) description: String,
    pub(crate) required: bool,
    pub(crate) variadic: bool,
    pub(crate) default_value: Option<Value>,
    pub(crate) default_value_description: Option<String>,
    pub(crate) parser: Option<ValueParser>,
    pub(crate) choices: Option<Vec<String>>,
}

impl std::fmt::Debug for Arg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Arg")
            .field("name", &self.name)
            .field("required", &self.required)
            .field("variadic", &self.variadic)
            .finish()
    }
}

impl Arg {
    pub fn new(name: &str, description: &str) -> Self {
        let (mut name, required) = match name.as_bytes().first() {
            Some(b'<') => (name[1..name.len() - 1].to_string(), true),
            Some(b'[') => (name[1..name.len() - 1].to_string(), false),
            _ => (name.to_string(), true),
        };
        let variadic = if name.len() > 3 && name.ends_with("...") {
            name.truncate(name.len() - 3);
            true
        } else {
            false
        };

        Self {
            name,
            description: description.to_string(),
            required,
            variadic,
            default_value: None,
            default_value_description: None,
            parser: None,
            choices: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn is_variadic(&self) -> bool {
        self.variadic
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.default_value.as_ref()
    }

    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn default_described(mut self, value: impl Into<Value>, description: &str) -> Self {
        self.default_value = Some(value.into());
        self.default_value_description = Some(description.to_string());
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

    /// Install a coercion callback; for a variadic argument it is applied as
    /// a reduction seeded with the default value.
    pub fn parser<F>(mut self, f: F) -> Self
    where
        F: Fn(&str, Option<&Value>) -> Result<Value, String> + 'static,
    {
        self.parser = Some(Rc::new(f));
        self
    }
}

/// Render the argument the way usage strings show it: `<name...>`, `[name]`.
pub(crate) fn human_readable_arg_name(arg: &Arg) -> String {
    let name = if arg.variadic {
        format!("{}...", arg.name)
    } else {
        arg.name.clone()
    };
    if arg.required {
        format!("<{}>", name)
    } else {
        format!("[{}]", name)
    }
}
