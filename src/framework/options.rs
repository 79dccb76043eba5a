use std::fmt;
use std::fs::read_to_string;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use clap::{App, AppSettings, Arg, ErrorKind};
use regex::Regex;
use serde_derive::Deserialize;

use super::FrameworkError;


#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
pub enum ReportFormat {
    #[serde(alias = "HRF", alias = "hrf")]
    Human,
    #[serde(alias = "JSON", alias = "json")]
    Json,
}

impl Default for ReportFormat {
    fn default() -> ReportFormat {
        ReportFormat::Human
    }
}

impl FromStr for ReportFormat {
    type Err = FrameworkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "HRF" | "HUMAN" => Ok(ReportFormat::Human),
            "JSON" => Ok(ReportFormat::Json),
            _ => Err(FrameworkError::InvalidOptions(format!("unknown report format `{}`", s))),
        }
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ReportFormat::Human => write!(f, "HRF"),
            ReportFormat::Json => write!(f, "JSON"),
        }
    }
}

/// Defaults read from a `--config` TOML file.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FrameworkConfig {
    pub run_test: Option<String>,
    pub report_format: Option<ReportFormat>,
    pub report_sink: Option<PathBuf>,
}

impl FrameworkConfig {
    pub fn from_file(path: &Path) -> Result<Self, FrameworkError> {
        let config = read_to_string(path).map_err(|_| FrameworkError::ConfigNotFound(path.display().to_string()))?;
        toml::from_str(&config).map_err(|err| FrameworkError::ConfigParseError(err.to_string()))
    }
}

#[derive(Debug, Default)]
pub struct FrameworkOptions {
    pub filter: Option<Regex>,
    pub report_format: ReportFormat,
    pub report_sink: Option<PathBuf>,
    pub list_content: bool,
}

impl FrameworkOptions {
    fn app() -> App<'static, 'static> {
        App::new("unit_test")
            .setting(AppSettings::NoBinaryName)
            .setting(AppSettings::DisableVersion)
            .about("Runs the test cases registered by the loaded library")
            .arg(
                Arg::with_name("run_test")
                    .long("run_test")
                    .takes_value(true)
                    .value_name("REGEX")
                    .help("runs only test cases whose name matches the expression"),
            )
            .arg(
                Arg::with_name("report_format")
                    .long("report_format")
                    .takes_value(true)
                    .value_name("FORMAT")
                    .possible_values(&["HRF", "JSON", "hrf", "json"])
                    .help("HRF : human readable report\nJSON : machine readable report"),
            )
            .arg(
                Arg::with_name("report_sink")
                    .long("report_sink")
                    .takes_value(true)
                    .value_name("FILE")
                    .help("writes the report to a file instead of stdout"),
            )
            .arg(
                Arg::with_name("list_content")
                    .long("list_content")
                    .help("lists the registered test cases without running them"),
            )
            .arg(
                Arg::with_name("config")
                    .long("config")
                    .takes_value(true)
                    .value_name("CONFIG_FILE")
                    .help("Toml formated file with defaults for the options above"),
            )
    }

    /// Parses the arguments forwarded by the driver. Flags win over values
    /// taken from `--config`.
    pub fn from_args(args: &[String]) -> Result<Self, FrameworkError> {
        let matches = match Self::app().get_matches_from_safe(args) {
            Ok(matches) => matches,
            Err(err) if err.kind == ErrorKind::HelpDisplayed => return Err(FrameworkError::HelpDisplayed(err.message)),
            Err(err) => return Err(FrameworkError::InvalidOptions(err.message)),
        };

        let config = match matches.value_of("config") {
            Some(path) => FrameworkConfig::from_file(Path::new(path))?,
            None => FrameworkConfig::default(),
        };

        let filter = match matches.value_of("run_test").map(String::from).or(config.run_test) {
            Some(expr) => Some(Regex::new(&expr).map_err(|err| FrameworkError::InvalidFilter(err.to_string()))?),
            None => None,
        };
        let report_format = match matches.value_of("report_format") {
            Some(format) => format.parse()?,
            None => config.report_format.unwrap_or_default(),
        };

        Ok(FrameworkOptions {
            filter,
            report_format,
            report_sink: matches.value_of("report_sink").map(PathBuf::from).or(config.report_sink),
            list_content: matches.is_present("list_content"),
        })
    }

    pub fn selects(&self, name: &str) -> bool {
        self.filter.as_ref().map_or(true, |re| re.is_match(name))
    }
}


#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn no_arguments_select_everything() {
        let options = FrameworkOptions::from_args(&[]).unwrap();
        assert!(options.selects("anything"));
        assert_eq!(options.report_format, ReportFormat::Human);
        assert!(options.report_sink.is_none());
        assert!(!options.list_content);
    }

    #[test]
    fn filter_and_format_flags() {
        let options = FrameworkOptions::from_args(&args(&["--run_test", "^math_", "--report_format", "json"])).unwrap();
        assert!(options.selects("math_add"));
        assert!(!options.selects("string_split"));
        assert_eq!(options.report_format, ReportFormat::Json);
    }

    #[test]
    fn bad_regex_is_reported() {
        match FrameworkOptions::from_args(&args(&["--run_test", "("])) {
            Err(FrameworkError::InvalidFilter(_)) => (),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn unknown_option_is_reported() {
        match FrameworkOptions::from_args(&args(&["--colour"])) {
            Err(FrameworkError::InvalidOptions(_)) => (),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn help_is_not_an_error_kind() {
        match FrameworkOptions::from_args(&args(&["--help"])) {
            Err(FrameworkError::HelpDisplayed(text)) => assert!(text.contains("--run_test")),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn config_file_supplies_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "run_test = \"^io_\"\nreport_format = \"JSON\"\nreport_sink = \"out.json\"").unwrap();
        let path = file.path().to_str().unwrap().to_owned();

        let options = FrameworkOptions::from_args(&args(&["--config", &path])).unwrap();
        assert!(options.selects("io_read"));
        assert_eq!(options.report_format, ReportFormat::Json);
        assert_eq!(options.report_sink, Some(PathBuf::from("out.json")));

        let options = FrameworkOptions::from_args(&args(&["--config", &path, "--report_format", "HRF", "--run_test", "net"])).unwrap();
        assert!(options.selects("net_send"));
        assert!(!options.selects("io_read"));
        assert_eq!(options.report_format, ReportFormat::Human);
    }

    #[test]
    fn unknown_config_keys_are_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "log_level = \"all\"").unwrap();
        let path = file.path().to_str().unwrap().to_owned();
        match FrameworkOptions::from_args(&args(&["--config", &path])) {
            Err(FrameworkError::ConfigParseError(_)) => (),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn missing_config_file() {
        match FrameworkOptions::from_args(&args(&["--config", "/nonexistent/runner.toml"])) {
            Err(FrameworkError::ConfigNotFound(path)) => assert!(path.contains("runner.toml")),
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
