use clap::{App, AppSettings, Arg, ArgMatches};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use console_testrunner::driver::run_suite;
use console_testrunner::dynlib::NativeLoader;
use console_testrunner::framework::UnitTestFramework;
use console_testrunner::redirect::StderrToStdout;


fn cli() -> App<'static, 'static> {
    App::new("console_test_runner")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Loads a test library, runs the tests it registers and reports the results")
        .setting(AppSettings::TrailingVarArg)
        .arg(
            Arg::with_name("merge-stderr")
                .long("merge-stderr")
                .help("redirects stderr to stdout while the tests run"),
        )
        .arg(
            Arg::with_name("SUITE")
                .index(1)
                .multiple(true)
                .allow_hyphen_values(true)
                .help("dynamic library exporting `init_unit_test`, followed by arguments \
                       passed on verbatim to the test framework (`console_test_runner <LIBRARY> --help` lists them)"),
        )
}

/// Splits the trailing values into the library path and the framework's own
/// arguments. Host flags are only recognised before the library path.
fn suite_args(cli_args: &ArgMatches) -> Option<(String, Vec<String>)> {
    let mut values = cli_args.values_of_lossy("SUITE")?.into_iter();
    let lib_path = values.next()?;
    Some((lib_path, values.collect()))
}

fn run(cli_args: &ArgMatches) -> i32 {
    let (lib_path, framework_args) = match suite_args(cli_args) {
        Some(suite) => suite,
        None => {
            println!("need a dynamic library to load tests from");
            println!("{}", cli_args.usage());
            return 0;
        }
    };

    let merged = if cli_args.is_present("merge-stderr") {
        match StderrToStdout::engage() {
            Ok(merged) => Some(merged),
            Err(err) => {
                warn!(error = %err, "cannot merge stderr into stdout, leaving streams alone");
                None
            }
        }
    }
    else {
        None
    };

    let outcome = run_suite(&mut NativeLoader::new(), &mut UnitTestFramework::default(), &lib_path, &framework_args);
    drop(merged);

    match outcome {
        Ok(code) => code,
        Err(err) => {
            debug!(error = %err, "bootstrap failed");
            eprintln!("error: {}", err);
            err.exit_code()
        }
    }
}

fn main() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .try_init();

    let code = run(&cli().get_matches());
    std::process::exit(code);
}
