//! Argv preparation: source-style selection, script-path capture, and the
//! debugger-port rewrite applied when spawning executable subcommands.

use std::path::PathBuf;

use once_cell::sync::Lazy;
use regex::Regex;

/// How the raw argv relates to user arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Source {
    /// `argv[0]` is the interpreter, `argv[1]` the script; user args follow.
    #[default]
    Node,
    /// Every token is a user argument.
    User,
    /// User args start at `argv[1]`, or `argv[2]` when the host reports a
    /// default app (see [`ParseOptions::electron_default_app`]).
    Electron,
    /// The script came from an eval-style flag; user args start at `argv[1]`.
    Eval,
}

impl Source {
    /// Pick `Eval` when the interpreter arguments show an eval/print-style
    /// launch, `Node` otherwise.
    pub fn detect<S: AsRef<str>>(exec_argv: &[S]) -> Source {
        let eval_flags = ["-e", "--eval", "-p", "--print"];
        if exec_argv
            .iter()
            .any(|a| eval_flags.contains(&a.as_ref()))
        {
            Source::Eval
        } else {
            Source::Node
        }
    }
}

/// Options accepted at parse entry.
#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
    pub from: Source,
    /// Opaque host flag consulted only for [`Source::Electron`].
    pub electron_default_app: bool,
}

impl ParseOptions {
    pub fn from(source: Source) -> Self {
        Self {
            from: source,
            ..Self::default()
        }
    }
}

pub(crate) struct PreparedArgs {
    pub(crate) user_args: Vec<String>,
    pub(crate) script_path: Option<PathBuf>,
}

/// Slice raw argv into user arguments per the configured source style.
pub(crate) fn prepare_user_args(argv: &[String], options: &ParseOptions) -> PreparedArgs {
    let (skip, script) = match options.from {
        Source::Node => (2, argv.get(1)),
        Source::Electron if options.electron_default_app => (2, argv.get(1)),
        Source::Electron => (1, None),
        Source::User => (0, None),
        Source::Eval => (1, None),
    };
    PreparedArgs {
        user_args: argv.iter().skip(skip).cloned().collect(),
        script_path: script.map(PathBuf::from),
    }
}

static INSPECT_BARE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(--inspect(-brk)?)$").expect("inspect pattern"));
static INSPECT_ONE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(--inspect(-brk|-port)?)=([^:]+)$").expect("inspect pattern"));
static INSPECT_HOST_PORT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(--inspect(-brk|-port)?)=([^:]+):(\d+)$").expect("inspect pattern")
});

/// Rewrite debugger flags so a spawned child does not collide with the parent
/// debugger port. The port is incremented by one, the host preserved, and a
/// literal port `0` (auto-assign) left untouched.
pub fn increment_inspector_port(args: &[String]) -> Vec<String> {
    args.iter()
        .map(|arg| {
            if !arg.starts_with("--inspect") {
                return arg.clone();
            }
            let mut debug_option = None;
            let mut debug_host = "127.0.0.1".to_string();
            let mut debug_port = "9229".to_string();

            if let Some(caps) = INSPECT_BARE.captures(arg) {
                debug_option = Some(caps[1].to_string());
            } else if let Some(caps) = INSPECT_ONE.captures(arg) {
                debug_option = Some(caps[1].to_string());
                if caps[3].bytes().all(|b| b.is_ascii_digit()) {
                    debug_port = caps[3].to_string();
                } else {
                    debug_host = caps[3].to_string();
                }
            } else if let Some(caps) = INSPECT_HOST_PORT.captures(arg) {
                debug_option = Some(caps[1].to_string());
                debug_host = caps[3].to_string();
                debug_port = caps[4].to_string();
            }

            match (debug_option, debug_port.as_str()) {
                (Some(option), port) if port != "0" => {
                    let port: u32 = port.parse().unwrap_or(9229);
                    format!("{}={}:{}", option, debug_host, port + 1)
                }
                _ => arg.clone(),
            }
        })
        .collect()
}
