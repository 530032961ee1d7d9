//! pkgsnap: snapshot the latest installer downloads of a fixed set of vendor
//! sites into `<product>.version.json` files.

use clap::{ArgAction, Parser, Subcommand};
use derive_more::{Display, Error};
use exn::ResultExt;
use pkgsnap_config::Config;
use pkgsnap_publish::Publisher;
use pkgsnap_scrape::fetch::{FetchOptions, HttpFetcher};
use pkgsnap_scrape::{Collector, Site, site};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "pkgsnap", about, version)]
struct Cli {
    /// Configuration file (TOML, JSON or YAML, by extension).
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Only collect this product. May be repeated.
    #[arg(long, global = true, value_name = "PRODUCT")]
    only: Vec<String>,

    /// Log uploads instead of performing them.
    #[arg(long, global = true)]
    dry_run: bool,

    /// More logging (-v debug, -vv trace). `RUST_LOG` takes precedence.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
enum Command {
    /// Collect every site and publish the snapshots (default).
    Run,
    /// Print the registered products and where they are collected from.
    List,
}

#[derive(Debug, Display, Error)]
enum Failure {
    #[display("invalid configuration")]
    Config,
    #[display("upload target unavailable")]
    Upload,
    #[display("collection aborted")]
    Collect,
}

impl Cli {
    fn level(&self) -> &'static str {
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }

    fn sites(&self) -> Vec<Site> {
        let sites = site::select(site::registry(), &self.only);
        for product in &self.only {
            if !sites.iter().any(|site| site.product() == product) {
                tracing::warn!(product, "No such product, ignoring");
            }
        }
        sites
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.level()));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    match cli.command.unwrap_or(Command::Run) {
        Command::List => {
            for site in cli.sites() {
                println!("{}\t{}", site.product(), site.source());
            }
            ExitCode::SUCCESS
        },
        Command::Run => match run(&cli).await {
            Ok(()) => ExitCode::SUCCESS,
            Err(err) => {
                tracing::error!(error = ?err, "{err}");
                ExitCode::FAILURE
            },
        },
    }
}

async fn run(cli: &Cli) -> Result<(), exn::Exn<Failure>> {
    let config = Config::load(cli.config.as_deref()).or_raise(|| Failure::Config)?;
    let upload = config.upload.backend(config.dry_run || cli.dry_run).or_raise(|| Failure::Upload)?;
    let options = FetchOptions {
        proxy: config.effective_proxy().map(str::to_string),
        timeout: config.timeout(),
        user_agent: config.user_agent.clone(),
    };

    let mut collector = Collector::new(cli.sites(), Arc::new(HttpFetcher::new()), options);
    collector.fetch_all().await.or_raise(|| Failure::Collect)?;

    let report = Publisher::new(&config.work_dir, upload).publish(collector.catalog()).await;
    for (product, err) in &report.failed {
        tracing::warn!(product, error = %err, "Not published");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_defaults_to_run() {
        let cli = Cli::try_parse_from(["pkgsnap"]).unwrap();
        assert_eq!(cli.command, None);
        assert!(cli.only.is_empty());
        assert!(!cli.dry_run);
        assert_eq!(cli.level(), "info");
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli =
            Cli::try_parse_from(["pkgsnap", "run", "--only", "vscode", "--only", "rustup", "--dry-run", "-c", "/etc/pkgsnap.toml"])
                .unwrap();
        assert_eq!(cli.command, Some(Command::Run));
        assert_eq!(cli.only, ["vscode", "rustup"]);
        assert!(cli.dry_run);
        assert_eq!(cli.config, Some(PathBuf::from("/etc/pkgsnap.toml")));
    }

    #[rstest]
    #[case(&["pkgsnap"], "info")]
    #[case(&["pkgsnap", "-v"], "debug")]
    #[case(&["pkgsnap", "-vv"], "trace")]
    #[case(&["pkgsnap", "list", "-vvv"], "trace")]
    fn test_verbosity(#[case] args: &[&str], #[case] level: &str) {
        assert_eq!(Cli::try_parse_from(args).unwrap().level(), level);
    }

    #[test]
    fn test_only_selects_sites() {
        let cli = Cli::try_parse_from(["pkgsnap", "list", "--only", "miniconda", "--only", "nonexistent"]).unwrap();
        let products: Vec<_> = cli.sites().iter().map(Site::product).collect();
        assert_eq!(products, ["miniconda"]);
    }

    #[test]
    fn test_unknown_subcommand() {
        assert!(Cli::try_parse_from(["pkgsnap", "publish"]).is_err());
    }
}
