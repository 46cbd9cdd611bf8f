//! Environment-bound options read through the default process-env accessor.
//!
//! These tests mutate the process environment and must not interleave.

use serial_test::serial;

use cmdtree::{Command, Opt, Value, ValueSource};

fn quiet_program(name: &str) -> Command {
    let cmd = Command::new(name);
    cmd.exit_override();
    cmd.configure_output(|cfg| {
        cfg.set_write_out(|_| {});
        cfg.set_write_err(|_| {});
    });
    cmd
}

#[test]
#[serial]
fn test_env_var_applies_when_present() {
    std::env::set_var("CMDTREE_TEST_PORT", "9000");
    let cmd = quiet_program("prog");
    cmd.add_option(Opt::new("-p, --port <n>", "").env("CMDTREE_TEST_PORT"));
    cmd.parse_from(["node", "prog"]).unwrap();
    std::env::remove_var("CMDTREE_TEST_PORT");

    assert_eq!(cmd.get_option_value("port"), Some(Value::from("9000")));
    assert_eq!(cmd.get_option_value_source("port"), Some(ValueSource::Env));
}

#[test]
#[serial]
fn test_absent_env_var_leaves_default() {
    std::env::remove_var("CMDTREE_TEST_PORT");
    let cmd = quiet_program("prog");
    cmd.add_option(
        Opt::new("-p, --port <n>", "")
            .default(Value::from("80"))
            .env("CMDTREE_TEST_PORT"),
    );
    cmd.parse_from(["node", "prog"]).unwrap();

    assert_eq!(cmd.get_option_value("port"), Some(Value::from("80")));
    assert_eq!(
        cmd.get_option_value_source("port"),
        Some(ValueSource::Default)
    );
}

#[test]
#[serial]
fn test_cli_beats_env_var() {
    std::env::set_var("CMDTREE_TEST_PORT", "9000");
    let cmd = quiet_program("prog");
    cmd.add_option(Opt::new("-p, --port <n>", "").env("CMDTREE_TEST_PORT"));
    cmd.parse_from(["node", "prog", "--port", "1234"]).unwrap();
    std::env::remove_var("CMDTREE_TEST_PORT");

    assert_eq!(cmd.get_option_value("port"), Some(Value::from("1234")));
    assert_eq!(cmd.get_option_value_source("port"), Some(ValueSource::Cli));
}
