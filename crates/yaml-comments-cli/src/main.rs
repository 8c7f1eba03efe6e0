use std::io::Write;
use std::process::ExitCode;

use bpaf::Bpaf;
use tracing_subscriber::prelude::*;

mod commands;
mod diff;
mod options;

use commands::check::{CheckArgs, check_args};
use commands::comments::{CommentsArgs, comments_args};
use commands::render::{RenderArgs, render_args};
use options::{CliGlobalOptions, cli_global_options};

#[derive(Debug, Clone, Bpaf)]
#[bpaf(options, version, fallback_to_usage)]
/// Round-trip YAML files with their comments in place
struct Cli {
    #[bpaf(external(cli_global_options), hide_usage)]
    global: CliGlobalOptions,
    #[bpaf(external(commands))]
    command: Commands,
}

#[derive(Debug, Clone, Bpaf)]
enum Commands {
    #[bpaf(command("render"))]
    /// Print each file as re-emitted YAML
    Render(#[bpaf(external(render_args))] RenderArgs),

    #[bpaf(command("check"))]
    /// Show a diff for each file that would change on a round trip
    Check(#[bpaf(external(check_args))] CheckArgs),

    #[bpaf(command("comments"))]
    /// List every comment with the node it is attached to
    Comments(#[bpaf(external(comments_args))] CommentsArgs),

    #[bpaf(command("version"))]
    /// Print version information
    Version,
}

/// Logs go to stderr. `--log-level` wins over `YAML_COMMENTS_LOG`; without
/// either nothing is logged.
fn init_tracing(global: &CliGlobalOptions) {
    let filter = match global.log_level.directive() {
        Some(level) => tracing_subscriber::EnvFilter::new(level),
        None => match tracing_subscriber::EnvFilter::try_from_env("YAML_COMMENTS_LOG") {
            Ok(filter) => filter,
            Err(_) => return,
        },
    };
    tracing_subscriber::registry()
        .with(
            tracing_tree::HierarchicalLayer::new(2)
                .with_targets(true)
                .with_bracketed_fields(true)
                .with_indent_lines(true)
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

/// Returns whether `check` found differences.
fn run(command: &Commands, verbose: bool) -> anyhow::Result<bool> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let differs = match command {
        Commands::Render(args) => commands::render::run(args, verbose, &mut out).map(|()| false)?,
        Commands::Check(args) => commands::check::run(args, verbose, &mut out)?,
        Commands::Comments(args) => {
            commands::comments::run(args, verbose, &mut out).map(|()| false)?
        }
        Commands::Version => {
            writeln!(out, "yaml-comments {}", env!("CARGO_PKG_VERSION"))?;
            false
        }
    };
    out.flush()?;
    Ok(differs)
}

fn main() -> ExitCode {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .context_lines(2)
                .build(),
        )
    }))
    .ok();

    let cli = cli().run();
    init_tracing(&cli.global);

    match run(&cli.command, cli.global.verbose) {
        Ok(false) => ExitCode::SUCCESS,
        Ok(true) => ExitCode::from(1),
        Err(e) => {
            match e.downcast::<yaml_comments::Error>() {
                Ok(diagnostic) => eprintln!("{:?}", miette::Report::new(diagnostic)),
                Err(e) => eprintln!("Error: {e:#}"),
            }
            ExitCode::from(2)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use options::LogLevel;

    fn parse(args: &[&str]) -> anyhow::Result<Cli> {
        cli().run_inner(args).map_err(|e| anyhow::anyhow!("{e:?}"))
    }

    #[test]
    fn cli_parses_render_defaults() -> anyhow::Result<()> {
        let parsed = parse(&["render", "a.yml"])?;
        match parsed.command {
            Commands::Render(args) => {
                assert!(!args.strip_comments);
                assert_eq!(args.indent, 2);
                assert_eq!(args.paths, vec![PathBuf::from("a.yml")]);
            }
            _ => panic!("expected Render"),
        }
        assert!(!parsed.global.verbose);
        assert_eq!(parsed.global.log_level, LogLevel::None);
        Ok(())
    }

    #[test]
    fn cli_parses_render_options() -> anyhow::Result<()> {
        let parsed = parse(&[
            "render",
            "--strip-comments",
            "--indent",
            "4",
            "a.yml",
            "b.yml",
        ])?;
        match parsed.command {
            Commands::Render(args) => {
                assert!(args.strip_comments);
                assert_eq!(args.indent, 4);
                assert_eq!(args.paths.len(), 2);
            }
            _ => panic!("expected Render"),
        }
        Ok(())
    }

    #[test]
    fn cli_parses_global_options_before_the_command() -> anyhow::Result<()> {
        let parsed = parse(&["-v", "--log-level", "debug", "check", "a.yml"])?;
        assert!(parsed.global.verbose);
        assert_eq!(parsed.global.log_level, LogLevel::Debug);
        match parsed.command {
            Commands::Check(args) => assert_eq!(args.paths, vec![PathBuf::from("a.yml")]),
            _ => panic!("expected Check"),
        }
        Ok(())
    }

    #[test]
    fn cli_parses_comments_and_version() -> anyhow::Result<()> {
        assert!(matches!(
            parse(&["comments", "a.yml"])?.command,
            Commands::Comments(_)
        ));
        assert!(matches!(parse(&["version"])?.command, Commands::Version));
        Ok(())
    }

    #[test]
    fn cli_rejects_non_numeric_indent() {
        assert!(parse(&["render", "--indent", "wide", "a.yml"]).is_err());
    }

    #[test]
    fn cli_rejects_unknown_commands() {
        assert!(parse(&["format", "a.yml"]).is_err());
    }
}
