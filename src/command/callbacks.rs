//! Callback types for actions, life-cycle hooks, and the command fallback.

use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;

use crate::command::Command;
use crate::error::CliError;

/// Boxed completion handle returned by asynchronous callbacks.
pub type BoxFuture = Pin<Box<dyn Future<Output = Result<(), CliError>>>>;

/// What a callback produced: an immediate result, or a completion the
/// dispatcher must await before continuing the chain.
pub enum CallbackReturn {
    Done(Result<(), CliError>),
    Deferred(BoxFuture),
}

pub(crate) type HookFn = Rc<dyn Fn(Command, Command) -> CallbackReturn>;
pub(crate) type ActionFn = Rc<dyn Fn(Command) -> CallbackReturn>;

/// Extension point replacing legacy per-command listeners: receives the
/// subcommand name (or `"*"`), operands, and unknown tokens, and reports
/// whether it handled the invocation.
pub(crate) type FallbackFn = Rc<dyn Fn(&str, &[String], &[String]) -> bool>;

/// Life-cycle events observable around dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookEvent {
    /// Before descending into a subcommand; receives `(this, subcommand)`.
    PreSubcommand,
    /// Before an action runs; receives `(hooked_command, action_command)`.
    PreAction,
    /// After an action ran; receives `(hooked_command, action_command)`.
    PostAction,
}
