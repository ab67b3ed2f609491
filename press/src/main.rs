use std::path::{Path, PathBuf};
use std::process::ExitCode;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pressroom::error::Result;
use pressroom::template::Policy;
use pressroom::{Config, Report, Site};

mod flags {
    use std::path::PathBuf;

    xflags::xflags! {
        /// Builds the static site rooted at ROOT (default: the current directory).
        cmd press {
            /// Site root directory.
            optional root: PathBuf
            /// Configuration file to use instead of ROOT/config.{json,toml}.
            optional -c, --config file: PathBuf
            /// Output directory, relative to ROOT.
            optional -o, --output dir: PathBuf
            /// Fail pages with unresolved placeholders.
            optional --strict
            /// Log per-file progress.
            optional -v, --verbose
        }
    }
}

fn build(flags: &flags::Press) -> Result<Report> {
    let root = flags.root.as_deref().unwrap_or(Path::new("."));
    let mut site = match &flags.config {
        Some(path) => Site::with_config(root, Config::read(path)?),
        None => Site::new(root)?,
    };

    if let Some(output) = &flags.output {
        site = site.output(output);
    }

    if flags.strict {
        site = site.policy(Policy::Strict);
    }

    site.build()
}

fn main() -> ExitCode {
    let flags = flags::Press::from_env_or_exit();

    let default_filter = match flags.verbose {
        true => "press=debug,pressroom=debug",
        false => "press=info,pressroom=info",
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let start = std::time::Instant::now();
    match build(&flags) {
        Ok(report) => {
            println!("{report} in {}ms", start.elapsed().as_millis());
            ExitCode::SUCCESS
        }
        Err(e) => {
            let root = flags.root.unwrap_or_else(|| PathBuf::from("."));
            eprintln!("error: failed to build site at {}", root.display());
            eprint!("{e}");
            ExitCode::FAILURE
        }
    }
}
