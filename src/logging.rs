use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Once;

use anyhow::{Context, Result};
use env_logger::{Env, Target};

static LOGGER: Once = Once::new();

/// Map repeated `-v` flags onto a filter, starting from the configured level.
pub fn level_for_verbosity(base: &str, verbose: u8) -> String {
    match verbose {
        0 => base.to_string(),
        1 => "debug".to_string(),
        _ => "trace".to_string(),
    }
}

/// Installs the global logger once. `RUST_LOG` still overrides `level`.
pub fn init(level: &str, log_file: Option<&Path>) -> Result<()> {
    let target = match log_file {
        Some(path) => {
            if let Some(parent) = path.parent()
                && !parent.as_os_str().is_empty()
            {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("create log directory {}", parent.display()))?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("open log file {}", path.display()))?;
            Some(Target::Pipe(Box::new(file)))
        }
        None => None,
    };

    LOGGER.call_once(|| {
        let mut builder = env_logger::Builder::from_env(Env::default().default_filter_or(level));
        builder.format_timestamp_secs();
        if let Some(target) = target {
            builder.target(target);
        }
        // A logger installed by a test harness is fine to keep.
        let _ = builder.try_init();
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_raises_level() {
        assert_eq!(level_for_verbosity("warn", 0), "warn");
        assert_eq!(level_for_verbosity("warn", 1), "debug");
        assert_eq!(level_for_verbosity("info", 3), "trace");
    }
}
