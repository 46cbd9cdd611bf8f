//! Command tests: builder authoring checks, value resolution, dispatch, and
//! life-cycle hooks.

mod hook_tests;

use std::cell::RefCell;
use std::rc::Rc;

use crate::command::Command;

/// Build a command with an exit override and captured output sinks.
pub(crate) fn program(name: &str) -> (Command, Rc<RefCell<String>>, Rc<RefCell<String>>) {
    let cmd = Command::new(name);
    let out = Rc::new(RefCell::new(String::new()));
    let err = Rc::new(RefCell::new(String::new()));
    cmd.exit_override();
    let (out_sink, err_sink) = (out.clone(), err.clone());
    cmd.configure_output(move |cfg| {
        let o = out_sink.clone();
        let e = err_sink.clone();
        cfg.set_write_out(move |s| o.borrow_mut().push_str(s));
        cfg.set_write_err(move |s| e.borrow_mut().push_str(s));
    });
    (cmd, out, err)
}

/// Argv in node convention: interpreter and script, then the given tokens.
pub(crate) fn argv(tokens: &[&str]) -> Vec<String> {
    let mut full = vec!["node".to_string(), "test".to_string()];
    full.extend(tokens.iter().map(|t| t.to_string()));
    full
}
