//! Declarative command-line parsing with a command tree.
//!
//! Commands, options, and positional arguments are declared up front; parsing
//! walks the tree applying well-defined option-recognition rules, resolves
//! values from CLI, environment, implied options, and declared defaults under
//! a fixed precedence, and dispatches the target command's action between
//! `preAction`/`postAction` hooks. Hooks and actions may be synchronous or
//! return completion handles; `parse_async*` awaits them in sequence.
//!
//! ```
//! use cmdtree::{Command, Value};
//!
//! let program = Command::new("serve");
//! program
//!     .exit_override()
//!     .option_parser("-p, --port <number>", "port to listen on", |raw, _| {
//!         raw.parse::<i64>().map(Value::Int).map_err(|e| e.to_string())
//!     });
//! program.parse_from(["node", "serve", "--port", "8080"]).unwrap();
//! assert_eq!(program.get_option_value("port"), Some(Value::Int(8080)));
//! ```

pub mod argument;
pub mod argv;
pub mod command;
pub mod config;
pub mod error;
pub mod exec;
pub mod help;
pub mod opt;
pub mod suggest;
pub mod value;

mod token;

pub use argument::Arg;
pub use argv::{increment_inspector_port, ParseOptions, Source};
pub use command::callbacks::{BoxFuture, CallbackReturn, HookEvent};
pub use command::{Command, CommandOptions, HelpTextPosition};
pub use config::{HelpAfterError, OutputConfig};
pub use error::{codes, CliError};
pub use exec::ExecPlan;
pub use help::Help;
pub use opt::{Opt, ValueParser};
pub use value::{Value, ValueSource};
