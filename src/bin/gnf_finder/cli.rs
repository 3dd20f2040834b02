//! CLI argument definitions for gnf-finder

use clap::Parser;
use gnf::config::ConfigOverrides;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "gnf-finder")]
#[command(about = "Find and rank reference-catalog neighbors of target galaxies")]
#[command(version)]
pub struct Cli {
    /// Target catalog CSV (e.g. RQE galaxies)
    pub target: PathBuf,

    /// Reference catalog CSV (e.g. SDSS galaxies)
    pub reference: PathBuf,

    /// Output CSV file
    pub output: PathBuf,

    /// TOML configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Maximum number of neighbors per target
    #[arg(long)]
    pub max_neighbors: Option<usize>,

    /// Maximum projected separation in kpc
    #[arg(long)]
    pub r_proj_max: Option<f64>,

    /// Maximum velocity difference in km/s
    #[arg(long)]
    pub vel_diff_max: Option<f64>,

    /// Logging level: DEBUG, INFO, WARNING or ERROR
    #[arg(long)]
    pub log_level: Option<String>,

    /// Also write the log to this file
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    /// Command-line values that replace the configured ones.
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            max_neighbors: self.max_neighbors,
            r_proj_max_kpc: self.r_proj_max,
            vel_diff_max_kms: self.vel_diff_max,
            log_level: self.log_level.clone(),
            log_file: self.log_file.clone(),
        }
    }
}

#[cfg(test)]
mod cli_test {
    use super::*;

    #[test]
    fn test_parse_full_command_line() {
        let cli = Cli::try_parse_from([
            "gnf-finder",
            "rqe.csv",
            "sdss.csv",
            "out/neighbors.csv",
            "--max-neighbors",
            "10",
            "--r-proj-max",
            "1000",
            "--vel-diff-max",
            "500.5",
            "--log-level",
            "debug",
        ])
        .unwrap();

        assert_eq!(cli.target, PathBuf::from("rqe.csv"));
        assert_eq!(cli.output, PathBuf::from("out/neighbors.csv"));
        let o = cli.overrides();
        assert_eq!(o.max_neighbors, Some(10));
        assert_eq!(o.r_proj_max_kpc, Some(1000.0));
        assert_eq!(o.vel_diff_max_kms, Some(500.5));
        assert_eq!(o.log_level.as_deref(), Some("debug"));
        assert!(o.log_file.is_none());
    }

    #[test]
    fn test_positional_arguments_required() {
        assert!(Cli::try_parse_from(["gnf-finder", "rqe.csv", "sdss.csv"]).is_err());
    }
}
