//! Shared output and behavior configuration.
//!
//! Each command carries this record by reference; children share the parent's
//! copy at creation time and get a private copy the moment they override a
//! field (set once, read many).

use std::io::Write;
use std::rc::Rc;

use crate::exec::{default_spawner, ExecPlan};
use crate::suggest::suggest_similar;

pub(crate) type WriteSink = Rc<dyn Fn(&str)>;

/// What to print after an error message.
#[derive(Clone, Debug, PartialEq, Default)]
pub enum HelpAfterError {
    #[default]
    Off,
    /// Full help, on the error sink.
    Full,
    /// A fixed hint line.
    Text(String),
}

/// Boundary configuration: write sinks, width providers, error formatter,
/// environment accessor, suggestion hook, subcommand spawner, and the
/// error-handling policy toggles.
#[derive(Clone)]
pub struct OutputConfig {
    pub(crate) write_out: WriteSink,
    pub(crate) write_err: WriteSink,
    pub(crate) out_width: Rc<dyn Fn() -> Option<usize>>,
    pub(crate) err_width: Rc<dyn Fn() -> Option<usize>>,
    pub(crate) output_error: Rc<dyn Fn(&str, &WriteSink)>,
    pub(crate) env_lookup: Rc<dyn Fn(&str) -> Option<String>>,
    pub(crate) suggest: Rc<dyn Fn(&str, &[String]) -> String>,
    pub(crate) spawner: Rc<dyn Fn(&ExecPlan) -> std::io::Result<i32>>,
    /// Interpreter arguments of the host process, rewritten into each
    /// [`ExecPlan`] for spawners that relaunch through an interpreter.
    pub(crate) exec_argv: Vec<String>,
    pub(crate) exit_override: bool,
    pub(crate) show_help_after_error: HelpAfterError,
    pub(crate) show_suggestion_after_error: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            write_out: Rc::new(|s: &str| {
                let _ = std::io::stdout().write_all(s.as_bytes());
            }),
            write_err: Rc::new(|s: &str| {
                let _ = std::io::stderr().write_all(s.as_bytes());
            }),
            out_width: Rc::new(|| None),
            err_width: Rc::new(|| None),
            output_error: Rc::new(|message: &str, write: &WriteSink| write(message)),
            env_lookup: Rc::new(|name: &str| std::env::var(name).ok()),
            suggest: Rc::new(|word: &str, candidates: &[String]| {
                suggest_similar(word, candidates)
            }),
            spawner: Rc::new(default_spawner),
            exec_argv: Vec::new(),
            exit_override: false,
            show_help_after_error: HelpAfterError::Off,
            show_suggestion_after_error: true,
        }
    }
}

impl OutputConfig {
    pub fn set_write_out(&mut self, f: impl Fn(&str) + 'static) {
        self.write_out = Rc::new(f);
    }

    pub fn set_write_err(&mut self, f: impl Fn(&str) + 'static) {
        self.write_err = Rc::new(f);
    }

    pub fn set_out_width(&mut self, f: impl Fn() -> Option<usize> + 'static) {
        self.out_width = Rc::new(f);
    }

    pub fn set_err_width(&mut self, f: impl Fn() -> Option<usize> + 'static) {
        self.err_width = Rc::new(f);
    }

    /// Formatter every error message passes through before reaching the error
    /// sink; the default writes the message unchanged.
    pub fn set_output_error(&mut self, f: impl Fn(&str, &dyn Fn(&str)) + 'static) {
        self.output_error = Rc::new(move |message: &str, write: &WriteSink| {
            let sink = write.clone();
            f(message, &move |s: &str| sink(s))
        });
    }

    /// Replace the environment accessor (tests use this instead of mutating
    /// the process environment).
    pub fn set_env_lookup(&mut self, f: impl Fn(&str) -> Option<String> + 'static) {
        self.env_lookup = Rc::new(f);
    }

    /// Replace the similarity-suggestion function.
    pub fn set_suggest(&mut self, f: impl Fn(&str, &[String]) -> String + 'static) {
        self.suggest = Rc::new(f);
    }

    /// Replace the executable-subcommand spawner.
    pub fn set_spawner(&mut self, f: impl Fn(&ExecPlan) -> std::io::Result<i32> + 'static) {
        self.spawner = Rc::new(f);
    }

    /// Record the host interpreter arguments used for debugger-port rewrite.
    pub fn set_exec_argv<I, S>(&mut self, args: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exec_argv = args.into_iter().map(Into::into).collect();
    }
}
