use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{ArgMatches, CommandFactory, FromArgMatches, parser::ValueSource};
use gget_core::{DownloadRequest, SessionConfig};
use tracing::debug;

use crate::app_config::{FileConfig, VerbositySetting};
use crate::cli::Args;

/// Which settings were given explicitly on the command line.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct CliValueSources {
    pub(crate) output: bool,
    pub(crate) quiet: bool,
    pub(crate) verbose: bool,
    pub(crate) no_check_certificate: bool,
    pub(crate) user_agent: bool,
    pub(crate) timeout: bool,
    pub(crate) connect_timeout: bool,
}

pub(crate) fn parse_cli_with_sources() -> (Args, CliValueSources) {
    let matches = Args::command()
        .try_get_matches()
        .unwrap_or_else(|err| exit_on_cli_error(&err));
    let args = Args::from_arg_matches(&matches).unwrap_or_else(|err| exit_on_cli_error(&err));
    let sources = sources_from_matches(&matches);
    (args, sources)
}

/// Help and version exit 0; usage errors exit 1 like every other failure.
fn exit_on_cli_error(err: &clap::Error) -> ! {
    if err.use_stderr() {
        let _ = err.print();
        std::process::exit(1);
    }
    err.exit()
}

fn sources_from_matches(matches: &ArgMatches) -> CliValueSources {
    CliValueSources {
        output: is_commandline_value(matches, "output"),
        quiet: is_commandline_value(matches, "quiet"),
        verbose: is_commandline_value(matches, "verbose"),
        no_check_certificate: is_commandline_value(matches, "no_check_certificate"),
        user_agent: is_commandline_value(matches, "user_agent"),
        timeout: is_commandline_value(matches, "timeout"),
        connect_timeout: is_commandline_value(matches, "connect_timeout"),
    }
}

fn is_commandline_value(matches: &ArgMatches, id: &str) -> bool {
    matches.value_source(id) == Some(ValueSource::CommandLine)
}

/// Fills settings the command line left unset from the config file.
pub(crate) fn apply_config_defaults(
    mut args: Args,
    cli_sources: &CliValueSources,
    file_config: Option<&FileConfig>,
) -> Args {
    let Some(file_config) = file_config else {
        return args;
    };

    if !cli_sources.output
        && args.output.is_none()
        && let Some(output_dir) = &file_config.output_dir
    {
        args.output = Some(output_dir.clone());
    }

    if !cli_sources.no_check_certificate
        && let Some(no_check_certificate) = file_config.no_check_certificate
    {
        args.no_check_certificate = no_check_certificate;
    }

    if !cli_sources.user_agent
        && args.user_agent.is_none()
        && let Some(user_agent) = &file_config.user_agent
    {
        args.user_agent = Some(user_agent.clone());
    }

    if !cli_sources.timeout
        && let Some(timeout) = file_config.timeout_secs
    {
        args.timeout = Some(timeout);
    }

    if !cli_sources.connect_timeout
        && let Some(connect_timeout) = file_config.connect_timeout_secs
    {
        args.connect_timeout = Some(connect_timeout);
    }

    if !cli_sources.verbose && !cli_sources.quiet {
        if let Some(verbosity) = file_config.verbosity {
            debug!(verbosity = verbosity.as_str(), "applying config verbosity");
            apply_config_verbosity(&mut args, verbosity);
        } else if let Some(quiet) = file_config.quiet {
            args.quiet = quiet;
        }
    }

    args
}

fn apply_config_verbosity(args: &mut Args, verbosity: VerbositySetting) {
    match verbosity {
        VerbositySetting::Default => {
            args.quiet = false;
            args.verbose = 0;
        }
        VerbositySetting::Verbose => {
            args.quiet = false;
            args.verbose = 1;
        }
        VerbositySetting::Quiet => {
            args.quiet = true;
            args.verbose = 0;
        }
        VerbositySetting::Trace => {
            args.quiet = false;
            args.verbose = 2;
        }
    }
}

/// Builds the HTTP session settings from the merged arguments.
pub(crate) fn session_config(args: &Args) -> SessionConfig {
    let mut config = SessionConfig {
        user_agent: args.user_agent.clone(),
        accept_invalid_certs: args.no_check_certificate,
        ..SessionConfig::default()
    };
    if let Some(secs) = args.timeout {
        config.timeout = Duration::from_secs(secs);
    }
    if let Some(secs) = args.connect_timeout {
        config.connect_timeout = Duration::from_secs(secs);
    }
    for (name, value) in &args.cookies {
        config = config.with_cookie(name.clone(), value.clone());
    }
    config
}

/// Builds the download request from the merged arguments.
pub(crate) fn download_request(args: &Args) -> Result<DownloadRequest> {
    let Some(source) = args.effective_source() else {
        bail!("no URL or file ID given");
    };
    let mut request = DownloadRequest::new(source).quiet(args.quiet);
    if let Some(output) = &args.output {
        request = request.with_output(output.clone());
    }
    Ok(request)
}

/// Creates the configured output directory so downloads land inside it.
pub(crate) fn ensure_output_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory '{}'", dir.display()))
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn parse(argv: &[&str]) -> (Args, CliValueSources) {
        let matches = Args::command()
            .try_get_matches_from(argv)
            .expect("args should parse");
        let args = Args::from_arg_matches(&matches).expect("args should convert");
        (args, sources_from_matches(&matches))
    }

    fn file_config() -> FileConfig {
        FileConfig {
            output_dir: Some(PathBuf::from("/srv/downloads")),
            quiet: None,
            no_check_certificate: Some(true),
            user_agent: Some("config-agent".to_string()),
            timeout_secs: Some(600),
            connect_timeout_secs: Some(5),
            verbosity: Some(VerbositySetting::Verbose),
        }
    }

    #[test]
    fn test_sources_track_commandline_values() {
        let (_, sources) = parse(&["gget", "--timeout", "10", "-q", "ABC"]);
        assert!(sources.timeout);
        assert!(sources.quiet);
        assert!(!sources.output);
        assert!(!sources.user_agent);
    }

    #[test]
    fn test_config_fills_unset_values() {
        let (args, sources) = parse(&["gget", "ABC"]);
        let merged = apply_config_defaults(args, &sources, Some(&file_config()));
        assert_eq!(merged.output, Some(PathBuf::from("/srv/downloads")));
        assert!(merged.no_check_certificate);
        assert_eq!(merged.user_agent.as_deref(), Some("config-agent"));
        assert_eq!(merged.timeout, Some(600));
        assert_eq!(merged.connect_timeout, Some(5));
        assert_eq!(merged.verbose, 1);
    }

    #[test]
    fn test_cli_values_win_over_config() {
        let (args, sources) = parse(&[
            "gget",
            "-o",
            "here.bin",
            "--user-agent",
            "cli-agent",
            "--timeout",
            "42",
            "-q",
            "ABC",
        ]);
        let merged = apply_config_defaults(args, &sources, Some(&file_config()));
        assert_eq!(merged.output, Some(PathBuf::from("here.bin")));
        assert_eq!(merged.user_agent.as_deref(), Some("cli-agent"));
        assert_eq!(merged.timeout, Some(42));
        assert!(merged.quiet);
        assert_eq!(merged.verbose, 0);
    }

    #[test]
    fn test_config_quiet_used_without_verbosity() {
        let (args, sources) = parse(&["gget", "ABC"]);
        let config = FileConfig {
            quiet: Some(true),
            ..FileConfig::default()
        };
        let merged = apply_config_defaults(args, &sources, Some(&config));
        assert!(merged.quiet);
    }

    #[test]
    fn test_no_config_leaves_args_untouched() {
        let (args, sources) = parse(&["gget", "ABC"]);
        let merged = apply_config_defaults(args, &sources, None);
        assert!(merged.output.is_none());
        assert!(merged.timeout.is_none());
    }

    #[test]
    fn test_session_config_from_args() {
        let (args, _) = parse(&[
            "gget",
            "--no-check-certificate",
            "--cookie",
            "a=1",
            "--timeout",
            "90",
            "--connect-timeout",
            "3",
            "ABC",
        ]);
        let config = session_config(&args);
        assert!(config.accept_invalid_certs);
        assert_eq!(config.cookies, vec![("a".to_string(), "1".to_string())]);
        assert_eq!(config.timeout, Duration::from_secs(90));
        assert_eq!(config.connect_timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_session_config_defaults_when_unset() {
        let (args, _) = parse(&["gget", "ABC"]);
        let config = session_config(&args);
        let defaults = SessionConfig::default();
        assert_eq!(config.timeout, defaults.timeout);
        assert_eq!(config.connect_timeout, defaults.connect_timeout);
        assert!(!config.accept_invalid_certs);
    }

    #[test]
    fn test_download_request_prefers_id_flag() {
        let (args, _) = parse(&["gget", "--id", "FLAG", "-o", "out", "-q", "POS"]);
        let request = download_request(&args).expect("request should build");
        assert_eq!(request.source, "FLAG");
        assert_eq!(request.output, Some(PathBuf::from("out")));
        assert!(request.quiet);
    }

    #[test]
    fn test_ensure_output_dir_creates_nested_directories() {
        let temp = tempfile::TempDir::new().expect("temp dir");
        let dir = temp.path().join("a/b");
        ensure_output_dir(&dir).expect("directory should be created");
        assert!(dir.is_dir());
    }
}
