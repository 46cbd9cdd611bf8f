//! Help model: visible items, terms, and plain formatting.
//!
//! The core calls into this module at defined points (help flag, help
//! command, help-after-error). Formatting is single-line per item; line
//! wrapping is left to embedders with custom output sinks.

use std::rc::Rc;

use unicode_width::UnicodeWidthStr;

use crate::argument::{human_readable_arg_name, Arg};
use crate::command::{Command, HelpOptionState};
use crate::opt::Opt;
use crate::value::Value;

/// Help rendering configuration, set per command with `configure_help`.
#[derive(Debug, Clone, Default)]
pub struct Help {
    /// Fixed width used instead of the configured width provider.
    pub help_width: Option<usize>,
    pub sort_subcommands: bool,
    pub sort_options: bool,
    pub show_global_options: bool,
}

impl Help {
    /// Children shown in help: non-hidden subcommands plus the help command
    /// when one applies.
    pub fn visible_commands(&self, cmd: &Command) -> Vec<Command> {
        let mut visible: Vec<Command> = cmd
            .inner
            .borrow()
            .commands
            .iter()
            .filter(|c| !c.inner.borrow().hidden)
            .cloned()
            .collect();
        if let Some(help) = cmd.help_command_lazy() {
            visible.push(help);
        }
        if self.sort_subcommands {
            visible.sort_by_key(|c| c.name());
        }
        visible
    }

    /// Options shown in help: non-hidden declared options, with the help
    /// option appended last.
    pub fn visible_options(&self, cmd: &Command) -> Vec<Rc<Opt>> {
        let mut visible: Vec<Rc<Opt>> = cmd
            .inner
            .borrow()
            .options
            .iter()
            .filter(|o| !o.hidden)
            .cloned()
            .collect();
        if self.sort_options {
            visible.sort_by_key(|o| o.name());
        }
        if let Some(help) = cmd.help_option_lazy() {
            visible.push(help);
        }
        visible
    }

    /// Non-hidden options of every ancestor, when global options are shown.
    pub fn visible_global_options(&self, cmd: &Command) -> Vec<Rc<Opt>> {
        if !self.show_global_options {
            return Vec::new();
        }
        let mut global: Vec<Rc<Opt>> = Vec::new();
        let mut current = cmd.parent();
        while let Some(ancestor) = current {
            global.extend(
                ancestor
                    .inner
                    .borrow()
                    .options
                    .iter()
                    .filter(|o| !o.hidden)
                    .cloned(),
            );
            current = ancestor.parent();
        }
        if self.sort_options {
            global.sort_by_key(|o| o.name());
        }
        global
    }

    /// Argument rows, shown only when at least one has a description.
    pub fn visible_arguments(&self, cmd: &Command) -> Vec<(String, String)> {
        let inner = cmd.inner.borrow();
        let rows: Vec<(String, String)> = inner
            .registered_arguments
            .iter()
            .map(|arg| {
                let fallback = inner.args_description.get(arg.name()).map(String::as_str);
                (
                    human_readable_arg_name(arg),
                    self.argument_description(arg, fallback),
                )
            })
            .collect();
        if rows.iter().any(|(_, description)| !description.is_empty()) {
            rows
        } else {
            Vec::new()
        }
    }

    pub fn option_term(&self, opt: &Opt) -> String {
        opt.flags().to_string()
    }

    pub fn subcommand_term(&self, cmd: &Command) -> String {
        let inner = cmd.inner.borrow();
        let mut term = inner.name.clone();
        if let Some(alias) = inner.aliases.first() {
            term.push('|');
            term.push_str(alias);
        }
        if !inner.options.is_empty() {
            term.push_str(" [options]");
        }
        let args: Vec<String> = inner
            .registered_arguments
            .iter()
            .map(|a| human_readable_arg_name(a))
            .collect();
        if !args.is_empty() {
            term.push(' ');
            term.push_str(&args.join(" "));
        }
        term
    }

    pub fn subcommand_description(&self, cmd: &Command) -> String {
        let inner = cmd.inner.borrow();
        inner
            .summary
            .clone()
            .unwrap_or_else(|| inner.description.clone())
    }

    /// Option description with the choices/default/preset/env hints.
    pub fn option_description(&self, opt: &Opt) -> String {
        let mut extra: Vec<String> = Vec::new();
        if let Some(choices) = &opt.choices {
            extra.push(format!("choices: {}", quoted_list(choices)));
        }
        if let Some(default) = opt.default_value() {
            let show_default = opt.required
                || opt.optional
                || (opt.is_boolean() && matches!(default, Value::Bool(_)));
            if show_default {
                let rendered = opt
                    .default_value_description
                    .clone()
                    .unwrap_or_else(|| default.to_string());
                extra.push(format!("default: {}", rendered));
            }
        }
        if opt.optional {
            if let Some(preset) = &opt.preset {
                extra.push(format!("preset: {}", preset));
            }
        }
        if let Some(env) = opt.env_var() {
            extra.push(format!("env: {}", env));
        }
        join_description(opt.description(), &extra)
    }

    fn argument_description(&self, arg: &Arg, fallback: Option<&str>) -> String {
        let base = if arg.description().is_empty() {
            fallback.unwrap_or("")
        } else {
            arg.description()
        };
        let mut extra: Vec<String> = Vec::new();
        if let Some(choices) = &arg.choices {
            extra.push(format!("choices: {}", quoted_list(choices)));
        }
        if let Some(default) = arg.default_value() {
            let rendered = arg
                .default_value_description
                .clone()
                .unwrap_or_else(|| default.to_string());
            extra.push(format!("default: {}", rendered));
        }
        join_description(base, &extra)
    }

    /// Full usage line: ancestor names, the command name with its first
    /// alias, and the usage string.
    pub fn command_usage(&self, cmd: &Command) -> String {
        let mut name = cmd.name();
        if let Some(alias) = cmd.inner.borrow().aliases.first() {
            name = format!("{}|{}", name, alias);
        }
        let mut prefix = String::new();
        let mut ancestor = cmd.parent();
        while let Some(a) = ancestor {
            prefix = format!("{} {}", a.name(), prefix);
            ancestor = a.parent();
        }
        format!("{}{} {}", prefix, name, self.usage(cmd))
    }

    fn usage(&self, cmd: &Command) -> String {
        let inner = cmd.inner.borrow();
        if let Some(usage) = &inner.usage {
            return usage.clone();
        }
        let mut parts: Vec<String> = Vec::new();
        let has_help_option = !matches!(inner.help_option, HelpOptionState::Disabled);
        if !inner.options.is_empty() || has_help_option {
            parts.push("[options]".to_string());
        }
        if !inner.commands.is_empty() {
            parts.push("[command]".to_string());
        }
        parts.extend(
            inner
                .registered_arguments
                .iter()
                .map(|a| human_readable_arg_name(a)),
        );
        parts.join(" ")
    }

    /// Width every item term is padded to.
    pub fn pad_width(&self, cmd: &Command) -> usize {
        let mut width = 0;
        for opt in self.visible_options(cmd) {
            width = width.max(self.option_term(&opt).width());
        }
        for opt in self.visible_global_options(cmd) {
            width = width.max(self.option_term(&opt).width());
        }
        for sub in self.visible_commands(cmd) {
            width = width.max(self.subcommand_term(&sub).width());
        }
        for (term, _) in self.visible_arguments(cmd) {
            width = width.max(term.width());
        }
        width
    }

    pub fn format_help(&self, cmd: &Command) -> String {
        let width = self.pad_width(cmd);
        let mut out = String::new();
        out.push_str(&format!("Usage: {}\n", self.command_usage(cmd)));

        let description = cmd.inner.borrow().description.clone();
        if !description.is_empty() {
            out.push_str(&format!("\n{}\n", description));
        }

        let arguments = self.visible_arguments(cmd);
        if !arguments.is_empty() {
            out.push_str("\nArguments:\n");
            for (term, description) in &arguments {
                out.push_str(&format_item(term, description, width));
            }
        }

        let options = self.visible_options(cmd);
        if !options.is_empty() {
            out.push_str("\nOptions:\n");
            for opt in &options {
                out.push_str(&format_item(
                    &self.option_term(opt),
                    &self.option_description(opt),
                    width,
                ));
            }
        }

        let global_options = self.visible_global_options(cmd);
        if !global_options.is_empty() {
            out.push_str("\nGlobal Options:\n");
            for opt in &global_options {
                out.push_str(&format_item(
                    &self.option_term(opt),
                    &self.option_description(opt),
                    width,
                ));
            }
        }

        let commands = self.visible_commands(cmd);
        if !commands.is_empty() {
            out.push_str("\nCommands:\n");
            for sub in &commands {
                out.push_str(&format_item(
                    &self.subcommand_term(sub),
                    &self.subcommand_description(sub),
                    width,
                ));
            }
        }
        out
    }
}

fn format_item(term: &str, description: &str, width: usize) -> String {
    if description.is_empty() {
        return format!("  {}\n", term);
    }
    let padding = width.saturating_sub(term.width());
    format!("  {}{}  {}\n", term, " ".repeat(padding), description)
}

fn quoted_list(items: &[String]) -> String {
    items
        .iter()
        .map(|i| format!("\"{}\"", i))
        .collect::<Vec<_>>()
        .join(", ")
}

fn join_description(base: &str, extra: &[String]) -> String {
    if extra.is_empty() {
        return base.to_string();
    }
    let extras = format!("({})", extra.join(", "));
    if base.is_empty() {
        extras
    } else {
        format!("{} {}", base, extras)
    }
}
