//! Dispatcher: the per-command parse walk.
//!
//! Each command tokenizes its argv slice, resolves values, then either
//! descends into a subcommand or processes itself as a leaf: validation,
//! positional coercion, and the preAction/action/postAction chain. The walk
//! is one async pipeline; synchronous parse drives it with a no-op waker and
//! never blocks on a user completion.

use std::future::Future;
use std::path::PathBuf;
use std::task::{Context, Poll, Waker};

use crate::argument::Arg;
use crate::argv::{increment_inspector_port, prepare_user_args, ParseOptions};
use crate::command::callbacks::{BoxFuture, CallbackReturn, HookEvent, HookFn};
use crate::command::{Command, HelpTextPosition};
use crate::config::HelpAfterError;
use crate::error::{codes, CliError};
use crate::exec::ExecPlan;
use crate::help::Help;
use crate::token::{self, TokenContext, TokenError};
use crate::value::{Value, ValueSource};

impl Command {
    // ---- parse entry points --------------------------------------------

    /// Parse the process arguments with the default options.
    pub fn parse(&self) -> Result<(), CliError> {
        self.parse_from_with(std::env::args(), ParseOptions::default())
    }

    pub fn parse_from<I, S>(&self, argv: I) -> Result<(), CliError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.parse_from_with(argv, ParseOptions::default())
    }

    /// Parse the given argv. Without an exit override, terminal outcomes exit
    /// the process; with one, they are returned as structured errors.
    ///
    /// Panics if a hook or action registered as asynchronous actually
    /// suspends; drive those with [`Command::parse_async_from_with`].
    pub fn parse_from_with<I, S>(&self, argv: I, options: ParseOptions) -> Result<(), CliError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let argv: Vec<String> = argv.into_iter().map(Into::into).collect();
        finish_parse(drive_sync(self.start_parse(argv, &options)))
    }

    pub async fn parse_async(&self) -> Result<(), CliError> {
        self.parse_async_from_with(std::env::args(), ParseOptions::default())
            .await
    }

    pub async fn parse_async_from<I, S>(&self, argv: I) -> Result<(), CliError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.parse_async_from_with(argv, ParseOptions::default()).await
    }

    /// Parse the given argv, awaiting any asynchronous hooks and actions in
    /// sequence.
    pub async fn parse_async_from_with<I, S>(
        &self,
        argv: I,
        options: ParseOptions,
    ) -> Result<(), CliError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let argv: Vec<String> = argv.into_iter().map(Into::into).collect();
        finish_parse(self.start_parse(argv, &options).await)
    }

    fn start_parse(&self, argv: Vec<String>, options: &ParseOptions) -> BoxFuture {
        let prepared = prepare_user_args(&argv, options);
        {
            let mut inner = self.inner.borrow_mut();
            inner.raw_args = argv;
            inner.script_path = prepared.script_path.clone();
            if inner.name.is_empty() {
                if let Some(stem) = inner
                    .script_path
                    .as_ref()
                    .and_then(|p| p.file_stem())
                {
                    inner.name = stem.to_string_lossy().into_owned();
                }
            }
            if inner.name.is_empty() {
                inner.name = "program".to_string();
            }
        }
        self.dispatch(Vec::new(), prepared.user_args)
    }

    // ---- the walk -------------------------------------------------------

    fn dispatch(&self, operands: Vec<String>, unknown: Vec<String>) -> BoxFuture {
        let this = self.clone();
        Box::pin(async move { this.dispatch_inner(operands, unknown).await })
    }

    async fn dispatch_inner(
        &self,
        prior_operands: Vec<String>,
        argv: Vec<String>,
    ) -> Result<(), CliError> {
        let ctx = self.token_context();
        let outcome = token::parse_tokens(&ctx, &argv).map_err(|err| match err {
            TokenError::OptionMissingArgument { opt } => self.error_out(
                &format!(
                    "error: option '{}' argument missing",
                    ctx.options[opt].flags()
                ),
                codes::OPTION_MISSING_ARGUMENT,
                1,
            ),
        })?;

        for event in &outcome.events {
            let opt = ctx.options[event.opt].clone();
            self.apply_option_event(&opt, event.raw.as_deref(), ValueSource::Cli)?;
        }
        self.parse_options_env()?;
        self.parse_options_implied();

        let mut operands = prior_operands;
        operands.extend(outcome.operands);
        let unknown = outcome.unknown;
        self.inner.borrow_mut().args = operands.iter().chain(unknown.iter()).cloned().collect();

        if let Some(first) = operands.first() {
            if self.find_command(first).is_some() {
                let name = first.clone();
                let rest = operands[1..].to_vec();
                return self.dispatch_subcommand(&name, rest, unknown).await;
            }
        }
        let help_command_name = self.help_command_lazy().map(|c| c.name());
        if help_command_name.is_some()
            && operands.first().map(String::as_str) == help_command_name.as_deref()
        {
            return self
                .dispatch_help_command(operands.get(1).map(String::as_str))
                .await;
        }
        let default_command = self.inner.borrow().default_command_name.clone();
        if let Some(default_name) = default_command {
            self.output_help_if_requested(&unknown)?;
            return self.dispatch_subcommand(&default_name, operands, unknown).await;
        }

        let has_children = !self.inner.borrow().commands.is_empty();
        let has_action = self.inner.borrow().action.is_some();
        if has_children && !has_action && operands.is_empty() {
            return Err(self.help_exit(true));
        }

        self.output_help_if_requested(&unknown)?;
        self.check_missing_mandatory()?;
        self.check_conflicts()?;

        let action = self.inner.borrow().action.clone();
        if let Some(action) = action {
            self.check_for_unknown_options(&unknown)?;
            self.process_arguments()?;
            self.run_hooks(HookEvent::PreAction).await?;
            await_callback(action(self.clone())).await?;
            if let Some(parent) = self.parent() {
                parent.try_fallback(&self.name(), &operands, &unknown);
            }
            self.run_hooks(HookEvent::PostAction).await?;
            return Ok(());
        }

        if let Some(parent) = self.parent() {
            if parent.has_fallback() {
                self.check_for_unknown_options(&unknown)?;
                self.process_arguments()?;
                if parent.try_fallback(&self.name(), &operands, &unknown) {
                    return Ok(());
                }
            }
        }

        if !operands.is_empty() {
            if self.find_command("*").is_some() {
                return self.dispatch_subcommand("*", operands, unknown).await;
            }
            if self.has_fallback() && self.try_fallback("*", &operands, &unknown) {
                return Ok(());
            }
            if has_children {
                return Err(self.unknown_command_error());
            }
            self.check_for_unknown_options(&unknown)?;
            self.process_arguments()?;
        } else if has_children {
            return Err(self.help_exit(true));
        } else {
            self.check_for_unknown_options(&unknown)?;
            self.process_arguments()?;
        }
        Ok(())
    }

    fn dispatch_subcommand(
        &self,
        name: &str,
        operands: Vec<String>,
        unknown: Vec<String>,
    ) -> BoxFuture {
        let this = self.clone();
        let name = name.to_string();
        Box::pin(async move {
            let Some(child) = this.find_command(&name) else {
                return Err(this.help_exit(true));
            };
            log::debug!(
                "command '{}' dispatching to subcommand '{}'",
                this.name(),
                child.name()
            );
            let hooks: Vec<HookFn> = this.inner.borrow().hooks_pre_subcommand.clone();
            for hook in hooks {
                await_callback(hook(this.clone(), child.clone())).await?;
            }
            if child.inner.borrow().executable_handler {
                let mut args = operands;
                args.extend(unknown);
                this.execute_subcommand(&child, args)
            } else {
                child.dispatch(operands, unknown).await
            }
        })
    }

    fn dispatch_help_command(&self, subcommand_name: Option<&str>) -> BoxFuture {
        let this = self.clone();
        let name = subcommand_name.map(str::to_string);
        Box::pin(async move {
            let Some(name) = name else {
                return Err(this.help_exit(false));
            };
            if let Some(child) = this.find_command(&name) {
                if !child.inner.borrow().executable_handler {
                    return Err(child.help_exit(false));
                }
            }
            // executable subcommands render their own help in a re-spawn
            let help_flag = this
                .help_option_lazy()
                .and_then(|o| o.long().or(o.short()).map(str::to_string))
                .unwrap_or_else(|| "--help".to_string());
            this.dispatch_subcommand(&name, Vec::new(), vec![help_flag]).await
        })
    }

    fn execute_subcommand(&self, child: &Command, args: Vec<String>) -> Result<(), CliError> {
        let cfg = self.config();
        let child_name = child.name();
        let file = child
            .inner
            .borrow()
            .executable_file
            .clone()
            .unwrap_or_else(|| format!("{}-{}", self.name(), child_name));
        let file = match self.inner.borrow().executable_dir.clone() {
            Some(dir) => dir.join(file),
            None => PathBuf::from(file),
        };
        let plan = ExecPlan {
            file,
            args,
            interpreter_args: increment_inspector_port(&cfg.exec_argv),
        };
        log::debug!(
            "spawning executable subcommand '{}' from '{}'",
            child_name,
            plan.file.display()
        );
        let code = (cfg.spawner)(&plan).map_err(|err| {
            let message = format!(
                "error: failed to launch '{}' for subcommand '{}': {}",
                plan.file.display(),
                child_name,
                err
            );
            self.error_out(&message, codes::ERROR, 1).with_cause(err)
        })?;
        Err(self.exit_with(
            code,
            codes::EXECUTE_SUBCOMMAND_ASYNC,
            &format!("(spawned subcommand '{}')", child_name),
        ))
    }

    fn token_context(&self) -> TokenContext {
        let help_command_name = self.help_command_lazy().map(|c| c.name());
        let inner = self.inner.borrow();
        TokenContext {
            options: inner.options.clone(),
            combine_flag_and_optional_value: inner.combine_flag_and_optional_value,
            enable_positional_options: inner.enable_positional_options,
            pass_through_options: inner.pass_through_options,
            subcommand_names: inner
                .commands
                .iter()
                .flat_map(|c| {
                    let child = c.inner.borrow();
                    let mut names = vec![child.name.clone()];
                    names.extend(child.aliases.iter().cloned());
                    names
                })
                .collect(),
            help_command_name,
            has_default_command: inner.default_command_name.is_some(),
        }
    }

    // ---- hooks ----------------------------------------------------------

    async fn run_hooks(&self, event: HookEvent) -> Result<(), CliError> {
        let mut entries: Vec<(Command, HookFn)> = Vec::new();
        let mut chain = self.command_and_ancestors();
        chain.reverse(); // root first
        for cmd in chain {
            let hooks: Vec<HookFn> = {
                let inner = cmd.inner.borrow();
                match event {
                    HookEvent::PreSubcommand => inner.hooks_pre_subcommand.clone(),
                    HookEvent::PreAction => inner.hooks_pre_action.clone(),
                    HookEvent::PostAction => inner.hooks_post_action.clone(),
                }
            };
            entries.extend(hooks.into_iter().map(|hook| (cmd.clone(), hook)));
        }
        if event == HookEvent::PostAction {
            entries.reverse();
        }
        for (hooked, hook) in entries {
            await_callback(hook(hooked, self.clone())).await?;
        }
        Ok(())
    }

    fn has_fallback(&self) -> bool {
        self.inner.borrow().command_fallback.is_some()
    }

    fn try_fallback(&self, name: &str, operands: &[String], unknown: &[String]) -> bool {
        let fallback = self.inner.borrow().command_fallback.clone();
        match fallback {
            Some(f) => f(name, operands, unknown),
            None => false,
        }
    }

    // ---- positional-argument coercion ----------------------------------

    pub(crate) fn process_arguments(&self) -> Result<(), CliError> {
        let (registered, args, allow_excess) = {
            let inner = self.inner.borrow();
            (
                inner.registered_arguments.clone(),
                inner.args.clone(),
                inner.allow_excess_arguments,
            )
        };

        for (index, arg) in registered.iter().enumerate() {
            if arg.required && index >= args.len() {
                return Err(self.error_out(
                    &format!("error: missing required argument '{}'", arg.name()),
                    codes::MISSING_ARGUMENT,
                    1,
                ));
            }
        }
        let last_variadic = registered.last().map(|a| a.variadic).unwrap_or(false);
        if !last_variadic && args.len() > registered.len() && !allow_excess {
            let expected = registered.len();
            let s = if expected == 1 { "" } else { "s" };
            let for_subcommand = match self.parent() {
                Some(_) => format!(" for '{}'", self.name()),
                None => String::new(),
            };
            return Err(self.error_out(
                &format!(
                    "error: too many arguments{}. Expected {} argument{} but got {}.",
                    for_subcommand,
                    expected,
                    s,
                    args.len()
                ),
                codes::EXCESS_ARGUMENTS,
                1,
            ));
        }

        let mut processed: Vec<Option<Value>> = Vec::with_capacity(registered.len());
        for (index, arg) in registered.iter().enumerate() {
            let mut value = arg.default_value.clone();
            if arg.variadic {
                if index < args.len() {
                    let tail = &args[index..];
                    for raw in tail {
                        self.check_argument_choices(arg, raw)?;
                    }
                    value = Some(match &arg.parser {
                        Some(parser) => {
                            let mut acc = arg.default_value.clone();
                            for raw in tail {
                                acc = Some(parser(raw, acc.as_ref()).map_err(|msg| {
                                    self.invalid_argument_value(arg, raw, &msg)
                                })?);
                            }
                            acc.unwrap_or(Value::List(Vec::new()))
                        }
                        None => {
                            Value::List(tail.iter().map(|s| Value::Str(s.clone())).collect())
                        }
                    });
                } else if value.is_none() {
                    value = Some(Value::List(Vec::new()));
                }
            } else if index < args.len() {
                let raw = &args[index];
                self.check_argument_choices(arg, raw)?;
                value = Some(match &arg.parser {
                    Some(parser) => parser(raw, arg.default_value.as_ref())
                        .map_err(|msg| self.invalid_argument_value(arg, raw, &msg))?,
                    None => Value::Str(raw.clone()),
                });
            }
            processed.push(value);
        }
        self.inner.borrow_mut().processed_args = processed;
        Ok(())
    }

    fn check_argument_choices(&self, arg: &Arg, raw: &str) -> Result<(), CliError> {
        if let Some(choices) = &arg.choices {
            if !choices.iter().any(|c| c == raw) {
                let hint = format!("Allowed choices are {}.", choices.join(", "));
                return Err(self.invalid_argument_value(arg, raw, &hint));
            }
        }
        Ok(())
    }

    fn invalid_argument_value(&self, arg: &Arg, value: &str, hint: &str) -> CliError {
        let context = format!(
            "error: command-argument value '{}' is invalid for argument '{}'.",
            value,
            arg.name()
        );
        let message = if hint.is_empty() {
            context
        } else {
            format!("{} {}", context, hint)
        };
        self.error_out(&message, codes::INVALID_ARGUMENT, 1)
    }

    fn check_for_unknown_options(&self, unknown: &[String]) -> Result<(), CliError> {
        let allow = self.inner.borrow().allow_unknown_option;
        if !allow {
            if let Some(first) = unknown.first() {
                return Err(self.unknown_option_error(first));
            }
        }
        Ok(())
    }

    // ---- help output ----------------------------------------------------

    /// Write the built-in help (with any custom help text) to the out sink.
    pub fn output_help(&self) {
        self.output_help_to(false);
    }

    fn output_help_to(&self, error: bool) {
        let cfg = self.config();
        let write = if error {
            cfg.write_err.clone()
        } else {
            cfg.write_out.clone()
        };
        let texts = |cmd: &Command, position: HelpTextPosition| -> Vec<String> {
            cmd.inner
                .borrow()
                .help_texts
                .iter()
                .filter(|(p, _)| *p == position)
                .map(|(_, t)| t.clone())
                .collect()
        };

        let chain = self.command_and_ancestors();
        for cmd in chain.iter().rev() {
            for text in texts(cmd, HelpTextPosition::BeforeAll) {
                write(&format!("{}\n", text));
            }
        }
        for text in texts(self, HelpTextPosition::Before) {
            write(&format!("{}\n", text));
        }
        write(&self.help_information());
        for text in texts(self, HelpTextPosition::After) {
            write(&format!("{}\n", text));
        }
        for cmd in chain.iter() {
            for text in texts(cmd, HelpTextPosition::AfterAll) {
                write(&format!("{}\n", text));
            }
        }
    }

    /// Render the built-in help text without writing it anywhere.
    pub fn help_information(&self) -> String {
        let helper = self.inner.borrow().help_config.clone();
        helper.format_help(self)
    }

    /// Display help and produce the terminal help outcome; propagate the
    /// returned error from an action or hook.
    pub fn help(&self) -> CliError {
        self.help_exit(false)
    }

    pub(crate) fn help_exit(&self, error: bool) -> CliError {
        self.output_help_to(error);
        let exit_code = if error { 1 } else { 0 };
        self.exit_with(exit_code, codes::HELP, "(outputHelp)")
    }

    pub(crate) fn output_help_if_requested(&self, tokens: &[String]) -> Result<(), CliError> {
        let Some(help_opt) = self.help_option_lazy() else {
            return Ok(());
        };
        if tokens.iter().any(|t| help_opt.matches(t)) {
            self.output_help_to(false);
            return Err(self.exit_with(0, codes::HELP_DISPLAYED, "(outputHelp)"));
        }
        Ok(())
    }

    // ---- errors ---------------------------------------------------------

    /// Raise a user error through the standard display pipeline, with code
    /// `commander.error` and exit code 1.
    pub fn error(&self, message: &str) -> CliError {
        self.error_out(message, codes::ERROR, 1)
    }

    pub fn error_with(&self, message: &str, code: &str, exit_code: i32) -> CliError {
        self.error_out(message, code, exit_code)
    }

    pub(crate) fn error_out(&self, message: &str, code: &str, exit_code: i32) -> CliError {
        let cfg = self.config();
        (cfg.output_error)(&format!("{}\n", message), &cfg.write_err);
        match &cfg.show_help_after_error {
            HelpAfterError::Text(text) => (cfg.write_err)(&format!("{}\n", text)),
            HelpAfterError::Full => {
                (cfg.write_err)("\n");
                self.output_help_to(true);
            }
            HelpAfterError::Off => {}
        }
        self.exit_with(exit_code, code, message)
    }

    /// Terminal outcome: exit the process, or surface a structured error
    /// under an exit override.
    pub(crate) fn exit_with(&self, exit_code: i32, code: &str, message: &str) -> CliError {
        if self.config().exit_override {
            return CliError::new(exit_code, code, message);
        }
        std::process::exit(exit_code)
    }

    pub(crate) fn unknown_option_error(&self, flag: &str) -> CliError {
        let cfg = self.config();
        let mut suggestion = String::new();
        if cfg.show_suggestion_after_error && flag.starts_with("--") {
            let helper = Help::default();
            let mut candidates: Vec<String> = Vec::new();
            let mut command = Some(self.clone());
            while let Some(cmd) = command {
                candidates.extend(
                    helper
                        .visible_options(&cmd)
                        .iter()
                        .filter_map(|o| o.long())
                        .map(str::to_string),
                );
                command = cmd
                    .parent()
                    .filter(|p| !p.inner.borrow().enable_positional_options);
            }
            suggestion = (cfg.suggest)(flag, &candidates);
        }
        self.error_out(
            &format!("error: unknown option '{}'{}", flag, suggestion),
            codes::UNKNOWN_OPTION,
            1,
        )
    }

    pub(crate) fn unknown_command_error(&self) -> CliError {
        let unknown_name = self.args().first().cloned().unwrap_or_default();
        let cfg = self.config();
        let mut suggestion = String::new();
        if cfg.show_suggestion_after_error {
            let helper = Help::default();
            let mut candidates: Vec<String> = Vec::new();
            for sub in helper.visible_commands(self) {
                candidates.push(sub.name());
                if let Some(alias) = sub.inner.borrow().aliases.first() {
                    candidates.push(alias.clone());
                }
            }
            suggestion = (cfg.suggest)(&unknown_name, &candidates);
        }
        self.error_out(
            &format!("error: unknown command '{}'{}", unknown_name, suggestion),
            codes::UNKNOWN_COMMAND,
            1,
        )
    }
}

async fn await_callback(ret: CallbackReturn) -> Result<(), CliError> {
    match ret {
        CallbackReturn::Done(result) => result,
        CallbackReturn::Deferred(completion) => completion.await,
    }
}

/// Run the walk to completion without blocking: with synchronous callbacks
/// the future is ready on the first poll.
fn drive_sync(fut: BoxFuture) -> Result<(), CliError> {
    let mut fut = fut;
    let waker = Waker::noop();
    let mut cx = Context::from_waker(waker);
    match fut.as_mut().poll(&mut cx) {
        Poll::Ready(result) => result,
        Poll::Pending => panic!(
            "an asynchronous callback suspended during parse(); use parse_async() instead"
        ),
    }
}

/// Spawned-subcommand outcomes are reported through the spawn path itself;
/// swallow them here so the caller does not double-report.
fn finish_parse(result: Result<(), CliError>) -> Result<(), CliError> {
    match result {
        Err(err) if err.code == codes::EXECUTE_SUBCOMMAND_ASYNC => Ok(()),
        other => other,
    }
}
