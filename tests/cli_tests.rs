use std::io::Write;

use rstest::rstest;
use symcalc::cli::{run_from, CliError};

fn run(args: &[&str]) -> Result<String, CliError> {
  run_with_stdin(args, "")
}

fn run_with_stdin(args: &[&str], stdin: &str) -> Result<String, CliError> {
  let mut argv = vec!["symcalc"];
  argv.extend_from_slice(args);
  run_from(argv, &mut stdin.as_bytes())
}

mod cli_tests {
  use super::*;

  mod subcommands {
    use super::*;

    #[rstest]
    #[case(&["simplify", "2*x+3*x-5"], "5*x - 5")]
    #[case(&["expand", "(x+2)*(x-2)"], "x**2 - 4")]
    #[case(&["diff", "sin(x)", "x"], "cos(x)")]
    #[case(&["integrate", "x**2", "x"], "x**3/3")]
    #[case(&["eval", "x**2+y**2", "--subs", "x=3", "--subs", "y=4", "--numeric"], "25")]
    #[case(&["simplify", "sin(x)^2 + cos(x)^2"], "1")]
    #[case(&["diff", "x^3", "-v", "x", "-o", "2"], "6*x")]
    #[case(&["integrate", "x", "-v", "x", "--a", "0", "--b", "1"], "1/2")]
    #[case(&["solve", "x^2 = 9", "-v", "x"], "{-3, 3}")]
    #[case(&["factor", "x^2 + 2*x + 1"], "(x + 1)**2")]
    #[case(&["expand", "(x+1)^3"], "x**3 + 3*x**2 + 3*x + 1")]
    #[case(&["simplify", "-x + x + 2"], "2")]
    #[case(&["diff", "-x**2", "x"], "-2*x")]
    #[case(&["diff", "1/x"], "-1/x**2")]
    #[case(&["simplify", "log(8, 2)"], "3")]
    #[case(&["integrate", "1/x**2", "--a", "-1", "--b", "1"], "oo")]
    fn prints(#[case] args: &[&str], #[case] expected: &str) {
      assert_eq!(run(args).unwrap(), expected);
    }

    #[test]
    fn latex_mentions_both_functions() {
      let output = run(&["latex", "sin(x)^2 + cos(x)^2"]).unwrap();
      assert!(output.contains("\\sin"));
      assert!(output.contains("\\cos"));
    }

    #[test]
    fn completion_script() {
      let output = run(&["completion", "bash"]).unwrap();
      assert!(output.contains("symcalc"));
    }
  }

  mod notation {
    use super::*;

    #[test]
    fn unicode_flag() {
      assert_eq!(run(&["--unicode", "expand", "x*(x + 2)"]).unwrap(), "x² + 2⋅x");
    }

    #[test]
    fn format_option_after_subcommand() {
      let output = run(&["integrate", "x**2", "x", "--format", "latex"]).unwrap();
      assert_eq!(output, "\\frac{x^{3}}{3}");
    }

    #[test]
    fn digits_flag() {
      let output =
        run(&["eval", "pi", "--numeric", "--digits", "5"]).unwrap();
      assert_eq!(output, "3.1416");
    }

    #[test]
    fn config_file_sets_default_notation() {
      let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
      writeln!(file, "format = \"unicode\"").unwrap();
      let path = file.path().to_string_lossy().to_string();
      let output = run(&["--config", &path, "expand", "x*(x + 2)"]).unwrap();
      assert_eq!(output, "x² + 2⋅x");
      let output =
        run(&["--config", &path, "--ascii", "expand", "x*(x + 2)"]).unwrap();
      assert_eq!(output, "x**2 + 2*x");
    }
  }

  mod input {
    use super::*;

    #[test]
    fn expression_from_stdin() {
      let output = run_with_stdin(&["factor"], "x**2 - 1\n").unwrap();
      assert_eq!(output, "(x - 1)*(x + 1)");
    }

    #[test]
    fn empty_stdin_is_a_usage_error() {
      let err = run_with_stdin(&["simplify"], "   ").unwrap_err();
      assert_eq!(err.to_string(), "No expression provided");
      assert_eq!(err.exit_code(), 64);
    }
  }

  mod failures {
    use super::*;

    #[test]
    fn parse_error_exit_code() {
      let err = run(&["simplify", "2 +* x"]).unwrap_err();
      assert!(err.to_string().starts_with("Error parsing expression '2 +* x'"));
      assert_eq!(err.exit_code(), 65);
    }

    #[test]
    fn bad_substitution() {
      let err = run(&["eval", "x", "--subs", "x"]).unwrap_err();
      assert_eq!(err.exit_code(), 64);
    }

    #[test]
    fn unknown_flag() {
      let err = run(&["simplify", "x", "--bogus"]).unwrap_err();
      assert_eq!(err.exit_code(), 64);
    }

    #[test]
    fn missing_config_file() {
      let err = run(&["--config", "/nonexistent/symcalc.toml", "simplify", "x"])
        .unwrap_err();
      assert_eq!(err.exit_code(), 78);
    }

    #[test]
    fn negative_order() {
      let err = run(&["diff", "x", "-o", "-1"]).unwrap_err();
      assert_eq!(err.exit_code(), 64);
    }
  }
}
