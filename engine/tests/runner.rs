#![cfg(unix)]

use serde_yml::Mapping;

use engine::runner::compiler_arguments;
use engine::{ProcessRunner, RunnerError, SnippetRunner};

fn config(yaml: &str) -> Mapping {
    serde_yml::from_str(yaml).unwrap()
}

#[test]
fn snippet_is_fed_on_stdin() {
    let output = ProcessRunner::new("cat")
        .run("int main() {}\n", &Mapping::new())
        .unwrap();
    assert_eq!(output.text, "int main() {}\n");
    assert!(output.success());
}

#[test]
fn options_then_flags_become_arguments() {
    let config = config(
        "snippet-compiler:\n  options:\n    compiler-command: g++\n    exec-name: ./a.out\n  flags: [run]\n",
    );
    let output = ProcessRunner::new("echo").run("", &config).unwrap();
    assert_eq!(output.text, "--compiler-command g++ --exec-name ./a.out --run\n");
}

#[test]
fn non_zero_exit_is_not_an_error() {
    let output = ProcessRunner::new("false").run("ignored", &Mapping::new()).unwrap();
    assert_eq!(output.status, Some(1));
    assert!(!output.success());
}

#[test]
fn stderr_is_captured_with_stdout() {
    let output = ProcessRunner::new("sh").run("echo out; echo err >&2\n", &Mapping::new()).unwrap();
    assert_eq!(output.text, "out\nerr\n");
}

#[test]
fn missing_program_is_a_spawn_error() {
    let error = ProcessRunner::new("no-such-snippet-compiler-xyz")
        .run("", &Mapping::new())
        .unwrap_err();
    assert!(matches!(error, RunnerError::Spawn { .. }));
}

#[test]
fn arguments_without_compiler_section() {
    assert!(compiler_arguments(&config("tag: a\n")).is_empty());
}

#[test]
fn scalar_option_values_are_stringified() {
    let args = compiler_arguments(&config(
        "snippet-compiler:\n  options:\n    jobs: 4\n    run: true\n",
    ));
    assert_eq!(args, vec!["--jobs", "4", "--run", "true"]);
}
