//! Life-cycle hook ordering and error propagation.

use std::cell::RefCell;
use std::rc::Rc;

use super::{argv, program};
use crate::command::callbacks::HookEvent;
use crate::error::{codes, CliError};

type Log = Rc<RefCell<Vec<String>>>;

fn record(log: &Log, entry: &str) {
    log.borrow_mut().push(entry.to_string());
}

#[test]
fn test_pre_and_post_action_wrap_the_action() {
    let (cmd, _, _) = program("prog");
    let log: Log = Rc::new(RefCell::new(Vec::new()));

    let l = log.clone();
    cmd.hook(HookEvent::PreAction, move |_, _| {
        record(&l, "pre");
        Ok(())
    });
    let l = log.clone();
    cmd.hook(HookEvent::PostAction, move |_, _| {
        record(&l, "post");
        Ok(())
    });
    let l = log.clone();
    cmd.action(move |_| {
        record(&l, "action");
        Ok(())
    });

    cmd.parse_from(argv(&[])).unwrap();
    assert_eq!(*log.borrow(), vec!["pre", "action", "post"]);
}

#[test]
fn test_hooks_walk_ancestors_in_documented_order() {
    let (cmd, _, _) = program("prog");
    let log: Log = Rc::new(RefCell::new(Vec::new()));

    for label in ["root-pre-1", "root-pre-2"] {
        let l = log.clone();
        let label = label.to_string();
        cmd.hook(HookEvent::PreAction, move |_, _| {
            record(&l, &label);
            Ok(())
        });
    }
    for label in ["root-post-1", "root-post-2"] {
        let l = log.clone();
        let label = label.to_string();
        cmd.hook(HookEvent::PostAction, move |_, _| {
            record(&l, &label);
            Ok(())
        });
    }

    let sub = cmd.command("sub");
    let l = log.clone();
    sub.hook(HookEvent::PreAction, move |_, _| {
        record(&l, "sub-pre");
        Ok(())
    });
    let l = log.clone();
    sub.hook(HookEvent::PostAction, move |_, _| {
        record(&l, "sub-post");
        Ok(())
    });
    let l = log.clone();
    sub.action(move |_| {
        record(&l, "action");
        Ok(())
    });

    cmd.parse_from(argv(&["sub"])).unwrap();
    // preAction root to leaf in declaration order; postAction is the whole
    // collected list reversed
    assert_eq!(
        *log.borrow(),
        vec![
            "root-pre-1",
            "root-pre-2",
            "sub-pre",
            "action",
            "sub-post",
            "root-post-2",
            "root-post-1",
        ]
    );
}

#[test]
fn test_pre_subcommand_runs_before_child_dispatch() {
    let (cmd, _, _) = program("prog");
    let log: Log = Rc::new(RefCell::new(Vec::new()));

    let l = log.clone();
    cmd.hook(HookEvent::PreSubcommand, move |this, sub| {
        record(&l, &format!("preSubcommand:{}:{}", this.name(), sub.name()));
        Ok(())
    });
    let sub = cmd.command("sub");
    sub.option("-v", "");
    let l = log.clone();
    sub.action(move |cmd| {
        record(&l, &format!("action:{}", cmd.name()));
        Ok(())
    });

    cmd.parse_from(argv(&["sub", "-v"])).unwrap();
    assert_eq!(
        *log.borrow(),
        vec!["preSubcommand:prog:sub", "action:sub"]
    );
}

#[test]
fn test_hook_receives_hooked_and_actioned_commands() {
    let (cmd, _, _) = program("prog");
    let seen: Log = Rc::new(RefCell::new(Vec::new()));
    let l = seen.clone();
    cmd.hook(HookEvent::PreAction, move |hooked, actioned| {
        record(&l, &format!("{}->{}", hooked.name(), actioned.name()));
        Ok(())
    });
    let sub = cmd.command("sub");
    sub.action(|_| Ok(()));

    cmd.parse_from(argv(&["sub"])).unwrap();
    assert_eq!(*seen.borrow(), vec!["prog->sub"]);
}

#[test]
fn test_pre_action_error_skips_action() {
    let (cmd, _, _) = program("prog");
    let ran = Rc::new(RefCell::new(false));

    cmd.hook(HookEvent::PreAction, |_, _| {
        Err(CliError::new(1, codes::ERROR, "hook refused"))
    });
    let sink = ran.clone();
    cmd.action(move |_| {
        *sink.borrow_mut() = true;
        Ok(())
    });

    let failure = cmd.parse_from(argv(&[])).unwrap_err();
    assert_eq!(failure.message, "hook refused");
    assert!(!*ran.borrow());
}

#[test]
fn test_pre_subcommand_error_stops_descent() {
    let (cmd, _, _) = program("prog");
    let ran = Rc::new(RefCell::new(false));

    cmd.hook(HookEvent::PreSubcommand, |_, _| {
        Err(CliError::new(1, codes::ERROR, "blocked"))
    });
    let sink = ran.clone();
    cmd.command("sub").action(move |_| {
        *sink.borrow_mut() = true;
        Ok(())
    });

    let failure = cmd.parse_from(argv(&["sub"])).unwrap_err();
    assert_eq!(failure.message, "blocked");
    assert!(!*ran.borrow());
}

#[test]
fn test_action_error_propagates_and_skips_post_action() {
    let (cmd, _, _) = program("prog");
    let log: Log = Rc::new(RefCell::new(Vec::new()));

    let l = log.clone();
    cmd.hook(HookEvent::PostAction, move |_, _| {
        record(&l, "post");
        Ok(())
    });
    cmd.action(|cmd| Err(cmd.error("error: action failed")));

    let failure = cmd.parse_from(argv(&[])).unwrap_err();
    assert_eq!(failure.code, codes::ERROR);
    assert!(log.borrow().is_empty());
}
