//! Command tree: declaration builders, per-parse state, and dispatch.
//!
//! A [`Command`] is a cheap reference-counted handle onto a tree node.
//! Children are owned by their parent's ordered list; the parent link is a
//! weak back-reference. Output configuration is shared with children and
//! copied on write when a child overrides a field.

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::PathBuf;
use std::rc::{Rc, Weak};

use crate::argument::Arg;
use crate::config::OutputConfig;
use crate::error::CliError;
use crate::help::Help;
use crate::opt::Opt;
use crate::value::{Value, ValueSource};

pub mod callbacks;
mod dispatch;
mod resolve;

#[cfg(test)]
mod tests;

use self::callbacks::{ActionFn, BoxFuture, CallbackReturn, FallbackFn, HookEvent, HookFn};

/// Where custom help text is placed relative to the built-in help.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HelpTextPosition {
    /// Before built-in help, also for ancestors' help output.
    BeforeAll,
    Before,
    After,
    /// After built-in help, also for ancestors' help output.
    AfterAll,
}

/// Options accepted when attaching a subcommand.
#[derive(Debug, Clone, Default)]
pub struct CommandOptions {
    /// Exclude from help output and suggestions.
    pub hidden: bool,
    /// Dispatch to this child when no subcommand name is given.
    pub is_default: bool,
    /// Executable file name override for executable subcommands.
    pub executable_file: Option<String>,
}

#[derive(Clone)]
pub(crate) enum HelpOptionState {
    /// Default `-h, --help` created on first query.
    Unset,
    Disabled,
    Set(Rc<Opt>),
}

pub(crate) struct CommandInner {
    pub(crate) name: String,
    pub(crate) aliases: Vec<String>,
    pub(crate) description: String,
    pub(crate) summary: Option<String>,
    pub(crate) usage: Option<String>,
    pub(crate) args_description: HashMap<String, String>,
    pub(crate) hidden: bool,

    pub(crate) options: Vec<Rc<Opt>>,
    pub(crate) registered_arguments: Vec<Rc<Arg>>,
    pub(crate) commands: Vec<Command>,
    pub(crate) parent: Weak<RefCell<CommandInner>>,

    pub(crate) allow_unknown_option: bool,
    pub(crate) allow_excess_arguments: bool,
    pub(crate) combine_flag_and_optional_value: bool,
    pub(crate) enable_positional_options: bool,
    pub(crate) pass_through_options: bool,

    pub(crate) default_command_name: Option<String>,
    pub(crate) executable_handler: bool,
    pub(crate) executable_file: Option<String>,
    pub(crate) executable_dir: Option<PathBuf>,

    pub(crate) help_option: HelpOptionState,
    pub(crate) help_command: Option<Command>,
    pub(crate) add_implicit_help_command: Option<bool>,
    pub(crate) help_texts: Vec<(HelpTextPosition, String)>,
    pub(crate) help_config: Help,

    pub(crate) version: Option<String>,
    pub(crate) version_opt_name: Option<String>,

    pub(crate) hooks_pre_subcommand: Vec<HookFn>,
    pub(crate) hooks_pre_action: Vec<HookFn>,
    pub(crate) hooks_post_action: Vec<HookFn>,
    pub(crate) action: Option<ActionFn>,
    pub(crate) command_fallback: Option<FallbackFn>,

    pub(crate) config: Rc<OutputConfig>,

    // per-invocation parse state
    pub(crate) raw_args: Vec<String>,
    pub(crate) script_path: Option<PathBuf>,
    pub(crate) args: Vec<String>,
    pub(crate) processed_args: Vec<Option<Value>>,
    pub(crate) option_values: HashMap<String, Value>,
    pub(crate) option_value_sources: HashMap<String, ValueSource>,
}

impl CommandInner {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            aliases: Vec::new(),
            description: String::new(),
            summary: None,
            usage: None,
            args_description: HashMap::new(),
            hidden: false,
            options: Vec::new(),
            registered_arguments: Vec::new(),
            commands: Vec::new(),
            parent: Weak::new(),
            allow_unknown_option: false,
            allow_excess_arguments: true,
            combine_flag_and_optional_value: true,
            enable_positional_options: false,
            pass_through_options: false,
            default_command_name: None,
            executable_handler: false,
            executable_file: None,
            executable_dir: None,
            help_option: HelpOptionState::Unset,
            help_command: None,
            add_implicit_help_command: None,
            help_texts: Vec::new(),
            help_config: Help::default(),
            version: None,
            version_opt_name: None,
            hooks_pre_subcommand: Vec::new(),
            hooks_pre_action: Vec::new(),
            hooks_post_action: Vec::new(),
            action: None,
            command_fallback: None,
            config: Rc::new(OutputConfig::default()),
            raw_args: Vec::new(),
            script_path: None,
            args: Vec::new(),
            processed_args: Vec::new(),
            option_values: HashMap::new(),
            option_value_sources: HashMap::new(),
        }
    }
}

/// Handle onto a command-tree node.
#[derive(Clone)]
pub struct Command {
    pub(crate) inner: Rc<RefCell<CommandInner>>,
}

impl PartialEq for Command {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Command")
            .field("name", &inner.name)
            .field("options", &inner.options.len())
            .field("commands", &inner.commands.len())
            .finish()
    }
}

impl Command {
    pub fn new(name: &str) -> Self {
        Self {
            inner: Rc::new(RefCell::new(CommandInner::new(name))),
        }
    }

    // ---- identity and tree ---------------------------------------------

    pub fn name(&self) -> String {
        self.inner.borrow().name.clone()
    }

    pub fn set_name(&self, name: &str) -> &Self {
        self.inner.borrow_mut().name = name.to_string();
        self
    }

    pub fn parent(&self) -> Option<Command> {
        self.inner
            .borrow()
            .parent
            .upgrade()
            .map(|inner| Command { inner })
    }

    /// This command followed by its ancestors up to the root.
    pub(crate) fn command_and_ancestors(&self) -> Vec<Command> {
        let mut chain = vec![self.clone()];
        let mut current = self.parent();
        while let Some(cmd) = current {
            current = cmd.parent();
            chain.push(cmd);
        }
        chain
    }

    /// Find a direct child by name or alias.
    pub(crate) fn find_command(&self, name: &str) -> Option<Command> {
        self.inner
            .borrow()
            .commands
            .iter()
            .find(|c| {
                let inner = c.inner.borrow();
                inner.name == name || inner.aliases.iter().any(|a| a == name)
            })
            .cloned()
    }

    pub(crate) fn find_option(&self, flag: &str) -> Option<Rc<Opt>> {
        self.inner
            .borrow()
            .options
            .iter()
            .find(|o| o.matches(flag))
            .cloned()
    }

    /// Add an alias; the first alias is the canonical one shown in help.
    ///
    /// Panics when the alias equals the command's own name or clashes with a
    /// sibling command.
    pub fn alias(&self, alias: &str) -> &Self {
        if alias == self.name() {
            panic!("Command alias can't be the same as its name");
        }
        if let Some(parent) = self.parent() {
            if let Some(matching) = parent.find_command(alias) {
                panic!(
                    "cannot add alias '{}' to command '{}' as already have command '{}'",
                    alias,
                    self.name(),
                    matching.name()
                );
            }
        }
        self.inner.borrow_mut().aliases.push(alias.to_string());
        self
    }

    pub fn aliases<I, S>(&self, aliases: I) -> &Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for alias in aliases {
            self.alias(alias.as_ref());
        }
        self
    }

    // ---- descriptive metadata ------------------------------------------

    pub fn description(&self, text: &str) -> &Self {
        self.inner.borrow_mut().description = text.to_string();
        self
    }

    /// Description plus per-argument descriptions for help output.
    pub fn description_with_args(&self, text: &str, args: &[(&str, &str)]) -> &Self {
        let mut inner = self.inner.borrow_mut();
        inner.description = text.to_string();
        inner.args_description = args
            .iter()
            .map(|(name, desc)| (name.to_string(), desc.to_string()))
            .collect();
        self
    }

    /// Short description used when listed as a subcommand.
    pub fn summary(&self, text: &str) -> &Self {
        self.inner.borrow_mut().summary = Some(text.to_string());
        self
    }

    pub fn usage(&self, text: &str) -> &Self {
        self.inner.borrow_mut().usage = Some(text.to_string());
        self
    }

    pub fn hide(&self, hidden: bool) -> &Self {
        self.inner.borrow_mut().hidden = hidden;
        self
    }

    // ---- options --------------------------------------------------------

    pub fn option(&self, flags: &str, description: &str) -> &Self {
        self.add_option(Opt::new(flags, description))
    }

    pub fn option_default(
        &self,
        flags: &str,
        description: &str,
        default: impl Into<Value>,
    ) -> &Self {
        self.add_option(Opt::new(flags, description).default(default))
    }

    pub fn option_parser<F>(&self, flags: &str, description: &str, parser: F) -> &Self
    where
        F: Fn(&str, Option<&Value>) -> Result<Value, String> + 'static,
    {
        self.add_option(Opt::new(flags, description).parser(parser))
    }

    /// Declare an option that must have a value once parsing completes.
    pub fn required_option(&self, flags: &str, description: &str) -> &Self {
        self.add_option(Opt::new(flags, description).mandatory(true))
    }

    /// Register a fully configured option. The declared default (or the
    /// implicit `true` of a lone negative option) is written immediately with
    /// source `default`.
    ///
    /// Panics when a flag clashes with an already registered option.
    pub fn add_option(&self, opt: Opt) -> &Self {
        let opt = Rc::new(opt);
        self.register_option(opt.clone());

        let attr = opt.attribute_name();
        if opt.negate {
            let positive_long = opt
                .long
                .as_ref()
                .map(|l| l.replacen("--no-", "--", 1))
                .unwrap_or_default();
            let has_positive = self
                .find_option(&positive_long)
                .map(|o| !o.negate)
                .unwrap_or(false);
            if !has_positive {
                let default = opt.default_value.clone().unwrap_or(Value::Bool(true));
                self.set_option_value_with_source(&attr, default, ValueSource::Default);
            }
        } else if let Some(default) = &opt.default_value {
            self.set_option_value_with_source(&attr, default.clone(), ValueSource::Default);
        }
        self
    }

    fn register_option(&self, opt: Rc<Opt>) {
        let clash = {
            let inner = self.inner.borrow();
            inner.options.iter().find_map(|existing| {
                for flag in [opt.long.as_deref(), opt.short.as_deref()].into_iter().flatten() {
                    if existing.matches(flag) {
                        return Some((flag.to_string(), existing.flags.clone()));
                    }
                }
                None
            })
        };
        if let Some((flag, existing_flags)) = clash {
            panic!(
                "Cannot add option '{}' to command '{}' due to conflicting flag '{}' - already used by option '{}'",
                opt.flags,
                self.name(),
                flag,
                existing_flags
            );
        }
        self.inner.borrow_mut().options.push(opt);
    }

    // ---- positional arguments ------------------------------------------

    pub fn argument(&self, name: &str, description: &str) -> &Self {
        self.add_argument(Arg::new(name, description))
    }

    /// Declare several arguments at once from a usage-like string, e.g.
    /// `"<source> [destination]"`.
    pub fn arguments(&self, names: &str) -> &Self {
        for name in names.split(' ').filter(|n| !n.is_empty()) {
            self.argument(name, "");
        }
        self
    }

    /// Register a fully configured argument.
    ///
    /// Panics when an earlier argument was variadic, or when a required
    /// argument declares a default without a coercion callback.
    pub fn add_argument(&self, arg: Arg) -> &Self {
        {
            let inner = self.inner.borrow();
            if let Some(previous) = inner.registered_arguments.last() {
                if previous.variadic {
                    panic!(
                        "only the last argument can be variadic '{}'",
                        previous.name()
                    );
                }
            }
        }
        if arg.required && arg.default_value.is_some() && arg.parser.is_none() {
            panic!(
                "a default value for a required argument is never used: '{}'",
                arg.name()
            );
        }
        self.inner.borrow_mut().registered_arguments.push(Rc::new(arg));
        self
    }

    // ---- subcommands ----------------------------------------------------

    /// Create and attach an action subcommand. `name_and_args` may declare
    /// positional arguments inline: `"clone <source> [destination]"`.
    /// Returns the child for further configuration.
    pub fn command(&self, name_and_args: &str) -> Command {
        self.command_with(name_and_args, CommandOptions::default())
    }

    pub fn command_with(&self, name_and_args: &str, opts: CommandOptions) -> Command {
        let child = self.build_child(name_and_args);
        self.attach(child.clone(), &opts);
        child
    }

    /// Create and attach a subcommand handled by a standalone executable
    /// (`<program>-<name>` unless overridden). Returns self so further
    /// subcommands can be declared.
    pub fn executable_command(&self, name_and_args: &str, description: &str) -> &Self {
        self.executable_command_with(name_and_args, description, CommandOptions::default())
    }

    pub fn executable_command_with(
        &self,
        name_and_args: &str,
        description: &str,
        opts: CommandOptions,
    ) -> &Self {
        let child = self.build_child(name_and_args);
        child.description(description);
        child.inner.borrow_mut().executable_handler = true;
        self.attach(child, &opts);
        self
    }

    fn build_child(&self, name_and_args: &str) -> Command {
        let (name, args) = match name_and_args.split_once(' ') {
            Some((name, rest)) => (name, Some(rest)),
            None => (name_and_args, None),
        };
        let child = Command::new(name);
        if let Some(args) = args {
            child.arguments(args);
        }
        self.copy_inherited_settings(&child);
        child
    }

    /// Attach a separately constructed command as a child.
    ///
    /// Panics when the command has no name, or when it uses pass-through
    /// options under a parent without positional options.
    pub fn add_command(&self, cmd: Command) -> &Self {
        self.add_command_with(cmd, CommandOptions::default())
    }

    pub fn add_command_with(&self, cmd: Command, opts: CommandOptions) -> &Self {
        if cmd.name().is_empty() {
            panic!("Command passed to add_command() must have a name");
        }
        self.attach(cmd, &opts);
        self
    }

    fn attach(&self, cmd: Command, opts: &CommandOptions) {
        {
            let mut child = cmd.inner.borrow_mut();
            child.parent = Rc::downgrade(&self.inner);
            if opts.hidden {
                child.hidden = true;
            }
            if let Some(file) = &opts.executable_file {
                child.executable_file = Some(file.clone());
            }
        }
        if opts.is_default {
            self.inner.borrow_mut().default_command_name = Some(cmd.name());
        }
        cmd.check_broken_pass_through();
        self.inner.borrow_mut().commands.push(cmd);
    }

    fn check_broken_pass_through(&self) {
        let inner = self.inner.borrow();
        if inner.pass_through_options {
            if let Some(parent) = inner.parent.upgrade() {
                if !parent.borrow().enable_positional_options {
                    panic!(
                        "passThroughOptions cannot be used for a subcommand if its parent does not have enablePositionalOptions"
                    );
                }
            }
        }
    }

    /// Directory searched for executable-subcommand files.
    pub fn executable_dir(&self, dir: impl Into<PathBuf>) -> &Self {
        self.inner.borrow_mut().executable_dir = Some(dir.into());
        self
    }

    // ---- behavioral flags ----------------------------------------------

    /// Pass unrecognized options through instead of raising an error.
    pub fn allow_unknown_option(&self, allow: bool) -> &Self {
        self.inner.borrow_mut().allow_unknown_option = allow;
        self
    }

    /// Tolerate more operands than declared arguments (on by default).
    pub fn allow_excess_arguments(&self, allow: bool) -> &Self {
        self.inner.borrow_mut().allow_excess_arguments = allow;
        self
    }

    /// Treat `-fb` as `-f b` for an optional-argument `-f` (on by default).
    pub fn combine_flag_and_optional_value(&self, combine: bool) -> &Self {
        self.inner.borrow_mut().combine_flag_and_optional_value = combine;
        self
    }

    /// Require global options before the subcommand name, letting children
    /// reuse option names.
    pub fn enable_positional_options(&self, positional: bool) -> &Self {
        self.inner.borrow_mut().enable_positional_options = positional;
        self
    }

    /// Deliver every token from the first operand onward verbatim.
    ///
    /// Panics when enabled on a subcommand whose parent does not have
    /// positional options enabled.
    pub fn pass_through_options(&self, pass: bool) -> &Self {
        self.inner.borrow_mut().pass_through_options = pass;
        if pass {
            self.check_broken_pass_through();
        }
        self
    }

    // ---- version --------------------------------------------------------

    pub fn version(&self, version: &str) -> &Self {
        self.version_with(version, "-V, --version", "output the version number")
    }

    pub fn version_with(&self, version: &str, flags: &str, description: &str) -> &Self {
        let opt = Rc::new(Opt::new(flags, description));
        {
            let mut inner = self.inner.borrow_mut();
            inner.version = Some(version.to_string());
            inner.version_opt_name = Some(opt.name());
        }
        self.register_option(opt);
        self
    }

    // ---- help configuration --------------------------------------------

    /// Replace the default `-h, --help` flags.
    pub fn help_option(&self, flags: &str, description: &str) -> &Self {
        self.inner.borrow_mut().help_option =
            HelpOptionState::Set(Rc::new(Opt::new(flags, description)));
        self
    }

    /// Enable or disable the help option entirely.
    pub fn help_option_enabled(&self, enabled: bool) -> &Self {
        self.inner.borrow_mut().help_option = if enabled {
            HelpOptionState::Unset
        } else {
            HelpOptionState::Disabled
        };
        self
    }

    /// Replace the default `help [command]` subcommand declaration.
    pub fn help_command(&self, name_and_args: &str, description: &str) -> &Self {
        let (name, args) = match name_and_args.split_once(' ') {
            Some((name, rest)) => (name, Some(rest)),
            None => (name_and_args, None),
        };
        let help = Command::new(name);
        help.help_option_enabled(false);
        if let Some(args) = args {
            help.arguments(args);
        }
        help.description(description);
        let mut inner = self.inner.borrow_mut();
        inner.add_implicit_help_command = Some(true);
        inner.help_command = Some(help);
        self
    }

    /// Force the implicit help command on or off regardless of heuristics.
    pub fn help_command_enabled(&self, enabled: bool) -> &Self {
        self.inner.borrow_mut().add_implicit_help_command = Some(enabled);
        self
    }

    /// Adjust help rendering (sorting, global options, width).
    pub fn configure_help(&self, f: impl FnOnce(&mut Help)) -> &Self {
        f(&mut self.inner.borrow_mut().help_config);
        self
    }

    /// Add custom text around the built-in help.
    pub fn add_help_text(&self, position: HelpTextPosition, text: &str) -> &Self {
        self.inner
            .borrow_mut()
            .help_texts
            .push((position, text.to_string()));
        self
    }

    /// The help option, creating the default `-h, --help` on first query.
    pub(crate) fn help_option_lazy(&self) -> Option<Rc<Opt>> {
        {
            let inner = self.inner.borrow();
            match &inner.help_option {
                HelpOptionState::Disabled => return None,
                HelpOptionState::Set(opt) => return Some(opt.clone()),
                HelpOptionState::Unset => {}
            }
        }
        let opt = Rc::new(Opt::new("-h, --help", "display help for command"));
        self.inner.borrow_mut().help_option = HelpOptionState::Set(opt.clone());
        Some(opt)
    }

    /// The help command when one applies: explicitly configured, or implicit
    /// for a command with children, no action, and no `help` child.
    pub(crate) fn help_command_lazy(&self) -> Option<Command> {
        let configured = self.inner.borrow().add_implicit_help_command;
        let wanted = match configured {
            Some(enabled) => enabled,
            None => {
                let eligible = {
                    let inner = self.inner.borrow();
                    !inner.commands.is_empty() && inner.action.is_none()
                };
                eligible && self.find_command("help").is_none()
            }
        };
        if !wanted {
            return None;
        }

        let existing = self.inner.borrow().help_command.clone();
        if let Some(cmd) = existing {
            return Some(cmd);
        }
        let help = Command::new("help");
        help.help_option_enabled(false);
        help.argument("[command]", "");
        help.description("display help for command");
        self.inner.borrow_mut().help_command = Some(help.clone());
        Some(help)
    }

    // ---- configuration --------------------------------------------------

    /// Override boundary output configuration. The record is shared with
    /// children created afterwards; overriding copies it for this command.
    pub fn configure_output(&self, f: impl FnOnce(&mut OutputConfig)) -> &Self {
        let mut inner = self.inner.borrow_mut();
        f(Rc::make_mut(&mut inner.config));
        self
    }

    /// Return structured errors from `parse*` instead of exiting the
    /// process.
    pub fn exit_override(&self) -> &Self {
        self.configure_output(|cfg| cfg.exit_override = true)
    }

    /// Print full help on the error sink after an error message.
    pub fn show_help_after_error(&self, show: bool) -> &Self {
        self.configure_output(|cfg| {
            cfg.show_help_after_error = if show {
                crate::config::HelpAfterError::Full
            } else {
                crate::config::HelpAfterError::Off
            }
        })
    }

    /// Print a fixed hint line after an error message.
    pub fn show_help_after_error_text(&self, text: &str) -> &Self {
        let text = text.to_string();
        self.configure_output(move |cfg| {
            cfg.show_help_after_error = crate::config::HelpAfterError::Text(text)
        })
    }

    pub fn show_suggestion_after_error(&self, show: bool) -> &Self {
        self.configure_output(|cfg| cfg.show_suggestion_after_error = show)
    }

    pub(crate) fn config(&self) -> Rc<OutputConfig> {
        self.inner.borrow().config.clone()
    }

    fn copy_inherited_settings(&self, child: &Command) {
        let inner = self.inner.borrow();
        let mut c = child.inner.borrow_mut();
        c.config = inner.config.clone();
        c.help_option = inner.help_option.clone();
        c.help_config = inner.help_config.clone();
        c.combine_flag_and_optional_value = inner.combine_flag_and_optional_value;
        c.allow_excess_arguments = inner.allow_excess_arguments;
        c.enable_positional_options = inner.enable_positional_options;
    }

    // ---- actions, hooks, fallback --------------------------------------

    /// Handler invoked when this command is the dispatch target. Read parsed
    /// state through the received handle (`opts()`, `processed_args()`).
    pub fn action<F>(&self, f: F) -> &Self
    where
        F: Fn(Command) -> Result<(), CliError> + 'static,
    {
        self.inner.borrow_mut().action =
            Some(Rc::new(move |cmd| CallbackReturn::Done(f(cmd))));
        self
    }

    /// Asynchronous action; drive the parse with `parse_async*`.
    pub fn action_async<F>(&self, f: F) -> &Self
    where
        F: Fn(Command) -> BoxFuture + 'static,
    {
        self.inner.borrow_mut().action =
            Some(Rc::new(move |cmd| CallbackReturn::Deferred(f(cmd))));
        self
    }

    /// Register a life-cycle hook; see [`HookEvent`] for the arguments.
    pub fn hook<F>(&self, event: HookEvent, f: F) -> &Self
    where
        F: Fn(Command, Command) -> Result<(), CliError> + 'static,
    {
        self.push_hook(event, Rc::new(move |a, b| CallbackReturn::Done(f(a, b))));
        self
    }

    /// Asynchronous life-cycle hook; drive the parse with `parse_async*`.
    pub fn hook_async<F>(&self, event: HookEvent, f: F) -> &Self
    where
        F: Fn(Command, Command) -> BoxFuture + 'static,
    {
        self.push_hook(event, Rc::new(move |a, b| CallbackReturn::Deferred(f(a, b))));
        self
    }

    fn push_hook(&self, event: HookEvent, hook: HookFn) {
        let mut inner = self.inner.borrow_mut();
        match event {
            HookEvent::PreSubcommand => inner.hooks_pre_subcommand.push(hook),
            HookEvent::PreAction => inner.hooks_pre_action.push(hook),
            HookEvent::PostAction => inner.hooks_post_action.push(hook),
        }
    }

    /// Fallback invoked for invocations no action handles; receives the
    /// subcommand name (or `"*"`), operands, and unknown tokens, and returns
    /// whether it handled them.
    pub fn on_command_fallback<F>(&self, f: F) -> &Self
    where
        F: Fn(&str, &[String], &[String]) -> bool + 'static,
    {
        self.inner.borrow_mut().command_fallback = Some(Rc::new(f));
        self
    }

    // ---- parse state accessors -----------------------------------------

    /// Current option values by attribute name.
    pub fn opts(&self) -> HashMap<String, Value> {
        self.inner.borrow().option_values.clone()
    }

    pub fn get_option_value(&self, key: &str) -> Option<Value> {
        self.inner.borrow().option_values.get(key).cloned()
    }

    pub fn get_option_value_source(&self, key: &str) -> Option<ValueSource> {
        self.inner.borrow().option_value_sources.get(key).copied()
    }

    /// Store a value without recording a source.
    pub fn set_option_value(&self, key: &str, value: impl Into<Value>) -> &Self {
        let mut inner = self.inner.borrow_mut();
        inner.option_values.insert(key.to_string(), value.into());
        inner.option_value_sources.remove(key);
        self
    }

    /// Store a value and record where it came from; `Config` is the source
    /// for values loaded by external configuration layers.
    pub fn set_option_value_with_source(
        &self,
        key: &str,
        value: impl Into<Value>,
        source: ValueSource,
    ) -> &Self {
        let mut inner = self.inner.borrow_mut();
        inner.option_values.insert(key.to_string(), value.into());
        inner.option_value_sources.insert(key.to_string(), source);
        self
    }

    /// Operands and unknown tokens remaining after option parsing.
    pub fn args(&self) -> Vec<String> {
        self.inner.borrow().args.clone()
    }

    pub fn raw_args(&self) -> Vec<String> {
        self.inner.borrow().raw_args.clone()
    }

    /// Positional arguments after coercion and variadic collection; `None`
    /// for an optional argument that was neither supplied nor defaulted.
    pub fn processed_args(&self) -> Vec<Option<Value>> {
        self.inner.borrow().processed_args.clone()
    }

    pub fn processed_arg(&self, index: usize) -> Option<Value> {
        self.inner
            .borrow()
            .processed_args
            .get(index)
            .cloned()
            .flatten()
    }
}
