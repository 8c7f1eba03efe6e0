use bpaf::Bpaf;

/// Options accepted before any command
#[derive(Debug, Clone, Bpaf)]
#[bpaf(generate(cli_global_options))]
pub struct CliGlobalOptions {
    /// Print each file name to stderr as it is processed
    #[bpaf(short('v'), long("verbose"), switch, fallback(false))]
    pub verbose: bool,

    /// The level of logging. In order, from the most verbose to the least verbose:
    /// trace, debug, info, warn, error. Overrides YAML_COMMENTS_LOG.
    #[bpaf(
        long("log-level"),
        argument("none|trace|debug|info|warn|error"),
        fallback(LogLevel::None),
        display_fallback
    )]
    pub log_level: LogLevel,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogLevel {
    #[default]
    None,
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// The `EnvFilter` directive for this level, or `None` to defer to the
    /// environment.
    pub const fn directive(self) -> Option<&'static str> {
        match self {
            Self::None => None,
            Self::Trace => Some("trace"),
            Self::Debug => Some("debug"),
            Self::Info => Some("info"),
            Self::Warn => Some("warn"),
            Self::Error => Some("error"),
        }
    }
}

impl core::str::FromStr for LogLevel {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(Self::None),
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            _ => Err(format!(
                "expected 'none', 'trace', 'debug', 'info', 'warn', or 'error', got '{s}'"
            )),
        }
    }
}

impl core::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.directive().unwrap_or("none"))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use bpaf::Parser;

    fn opts() -> bpaf::OptionParser<CliGlobalOptions> {
        cli_global_options().to_options()
    }

    #[test]
    fn defaults() {
        let parsed = opts().run_inner(&[]).unwrap();
        assert!(!parsed.verbose);
        assert_eq!(parsed.log_level, LogLevel::None);
    }

    #[test]
    fn verbose_short() {
        let parsed = opts().run_inner(&["-v"]).unwrap();
        assert!(parsed.verbose);
    }

    #[test]
    fn log_levels() {
        for (arg, level) in [
            ("trace", LogLevel::Trace),
            ("debug", LogLevel::Debug),
            ("info", LogLevel::Info),
            ("warn", LogLevel::Warn),
            ("error", LogLevel::Error),
        ] {
            let args = ["--log-level", arg];
            let parsed = opts().run_inner(&args[..]).unwrap();
            assert_eq!(parsed.log_level, level);
            assert_eq!(level.to_string(), arg);
        }
    }

    #[test]
    fn log_level_invalid() {
        assert!(opts().run_inner(&["--log-level", "loud"]).is_err());
    }

    #[test]
    fn none_defers_to_the_environment() {
        assert_eq!(LogLevel::None.directive(), None);
        assert_eq!(LogLevel::None.to_string(), "none");
    }
}
