//! End-to-end scenarios: each source runs through the compiled binary in
//! file mode; assertions cover exact stdout and the exit code.

use std::{fs, path::PathBuf, process::Command, sync::atomic::{AtomicUsize, Ordering}};

static COUNTER: AtomicUsize = AtomicUsize::new(0);

struct Run {
	stdout: String,
	stderr: String,
	code:   i32,
}

fn run_source(source: &str) -> Run {
	let mut path = std::env::temp_dir();
	path.push(format!(
		"stilt-e2e-{}-{}.stilt",
		std::process::id(),
		COUNTER.fetch_add(1, Ordering::Relaxed)
	));
	fs::write(&path, source).unwrap();
	let output = Command::new(env!("CARGO_BIN_EXE_stilt")).arg(&path).output().unwrap();
	fs::remove_file(&path).ok();
	Run {
		stdout: String::from_utf8(output.stdout).unwrap(),
		stderr: String::from_utf8(output.stderr).unwrap(),
		code:   output.status.code().unwrap_or(-1),
	}
}

fn expect_output(source: &str, stdout: &str) {
	let run = run_source(source);
	assert_eq!(run.code, 0, "stderr: {}", run.stderr);
	assert_eq!(run.stdout, stdout);
}

fn expect_failure(source: &str, code: i32, stderr_needle: &str) {
	let run = run_source(source);
	assert_eq!(run.code, code, "stdout: {} stderr: {}", run.stdout, run.stderr);
	assert!(run.stderr.contains(stderr_needle), "stderr was: {}", run.stderr);
}

#[test]
fn arithmetic_precedence() {
	expect_output("int x = 1 + 2 * 3; print(x);", "7\n");
}

#[test]
fn for_loop_with_doubles() {
	expect_output("double f = 2.0; for (int i = 0; i < 3; i = i + 1) { f = f * 2.0; } print(f);", "16.0\n");
}

#[test]
fn while_loop_sum() {
	expect_output("int n = 10; int s = 0; while (n > 0) { s = s + n; n = n - 1; } print(s);", "55\n");
}

#[test]
fn function_call() {
	expect_output("int add(int a, int b) { return a + b; } print(add(2, 3));", "5\n");
}

#[test]
fn block_shadowing() {
	expect_output("int x = 1; { int x = 2; print(x); } print(x);", "2\n1\n");
}

#[test]
fn string_concatenation() {
	expect_output("print(\"hi\" + \" \" + \"there\");", "hi there\n");
}

#[test]
fn uninitialized_read_is_a_logic_error() {
	expect_failure("int y;\nprint(y);", 65, "[line 2] Logic Error: Uninitialized variable 'y'.");
}

#[test]
fn type_mismatch_in_initializer() {
	expect_failure("int x = \"oops\";", 65, "Type Error");
}

#[test]
fn break_at_top_level_is_a_logic_error() {
	expect_failure("break;", 65, "Logic Error: 'break' can only be used inside a loop.");
}

#[test]
fn duplicate_parameter_names_are_rejected() {
	let run = run_source("int f(int a, int a) { return a; }\nprint(f(1, 2));");
	assert_eq!(run.code, 65, "stdout: {} stderr: {}", run.stdout, run.stderr);
	assert_eq!(run.stdout, "");
	assert!(run.stderr.contains("[line 1] Logic Error: Duplicate parameter name 'a'."), "stderr was: {}", run.stderr);
}

#[test]
fn integer_division_by_zero() {
	expect_failure("int x = 10 / 0;", 70, "[line 1] Runtime Error: Integer division by zero.");
}

#[test]
fn continue_skips_to_the_next_iteration() {
	expect_output(
		"for (int i = 0; i < 5; i = i + 1) { if (i % 2 == 0) continue; print(i); }",
		"1\n3\n",
	);
}

#[test]
fn print_is_variadic_and_space_separated() {
	expect_output("print(1, 2.5, \"three\", 'f', true, null);", "1 2.5 three f true null\n");
	expect_output("print();", "\n");
}

#[test]
fn double_rendering_keeps_one_trailing_zero() {
	expect_output("print(2.0, 3.1415, 100.0);", "2.0 3.1415 100.0\n");
}

#[test]
fn closures_capture_their_environment() {
	expect_output(
		"int x = 10; int f() { return x; } x = 99; print(f());",
		"10\n",
	);
}

#[test]
fn recursion() {
	expect_output("int fib(int n) { if (n < 2) { return n; } return fib(n - 1) + fib(n - 2); } print(fib(15));", "610\n");
}

#[test]
fn ternary_flows_into_print() {
	expect_output("print(1 < 3 ? 4 : 2);", "4\n");
}

#[test]
fn clock_and_sleep_are_usable() {
	expect_output("double before = clock(); sleep(0.01); double after = clock(); print(after >= before);", "true\n");
}

#[test]
fn multiple_parse_errors_in_one_run() {
	let run = run_source("int = 5;\n1 +;\nprint(1);");
	assert_eq!(run.code, 65);
	assert!(run.stderr.matches("Error").count() >= 2, "stderr was: {}", run.stderr);
}

#[test]
fn runtime_error_stops_later_statements() {
	let run = run_source("print(1);\nint x = 10 / 0;\nprint(2);");
	assert_eq!(run.code, 70);
	assert_eq!(run.stdout, "1\n");
}

#[test]
fn usage_with_too_many_arguments() {
	let output =
		Command::new(env!("CARGO_BIN_EXE_stilt")).args(["one.stilt", "two.stilt"]).output().unwrap();
	assert_eq!(output.status.code(), Some(64));
	assert!(String::from_utf8(output.stderr).unwrap().contains("Usage: stilt [file_path]"));
}

#[test]
fn unopenable_file() {
	let output =
		Command::new(env!("CARGO_BIN_EXE_stilt")).arg("definitely-missing.stilt").output().unwrap();
	assert_ne!(output.status.code(), Some(0));
	assert!(String::from_utf8(output.stderr).unwrap().contains("Unable to open file"));
}

#[test]
fn fixture_program_runs_through_the_binary() {
	let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests").join("fib.stilt");
	let output = Command::new(env!("CARGO_BIN_EXE_stilt")).arg(&path).output().unwrap();
	assert_eq!(output.status.code(), Some(0));
	assert_eq!(String::from_utf8(output.stdout).unwrap(), "0\n1\n1\n2\n3\n5\n8\n13\n21\n34\n");
}

#[test]
fn repl_keeps_state_and_survives_errors() {
	use std::{io::Write, process::Stdio};

	let mut child = Command::new(env!("CARGO_BIN_EXE_stilt"))
		.stdin(Stdio::piped())
		.stdout(Stdio::piped())
		.stderr(Stdio::piped())
		.spawn()
		.unwrap();
	child
		.stdin
		.take()
		.unwrap()
		.write_all(b"int x = 40;\nbreak;\nx = x + 2;\nprint(x);\n")
		.unwrap();
	let output = child.wait_with_output().unwrap();
	assert_eq!(output.status.code(), Some(0));
	let stdout = String::from_utf8(output.stdout).unwrap();
	assert!(stdout.contains("42"), "stdout was: {stdout}");
	assert!(String::from_utf8(output.stderr).unwrap().contains("Logic Error"));
}
