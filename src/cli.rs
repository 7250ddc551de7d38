//! Command-line surface.

use std::path::PathBuf;

use clap::Parser;

use crate::config::{default_artifact_dir, AuditConfig};

#[derive(Parser, Debug)]
#[command(name = "wolfsight")]
#[command(about = "Audit scanned pension case files for required sub-reports, CUIL consistency and ID photos")]
#[command(version)]
pub struct Cli {
    /// Folder searched recursively for case files (`X-NNNNNN-YYYY.pdf`)
    pub root: PathBuf,

    /// Where the CSV, log and JSON reports are written
    #[arg(long, short = 'o')]
    pub output_dir: Option<PathBuf>,

    /// Where oriented and cropped ID photos are saved
    #[arg(long, conflicts_with = "no_artifacts")]
    pub artifact_dir: Option<PathBuf>,

    /// Do not save ID photo artifacts
    #[arg(long)]
    pub no_artifacts: bool,

    /// Also export every record as JSON
    #[arg(long)]
    pub json: bool,

    /// Worker threads (defaults to one per core)
    #[arg(long, short = 'j')]
    pub jobs: Option<usize>,

    /// Skip the tesseract orientation check (EXIF only)
    #[arg(long)]
    pub no_osd: bool,
}

impl Cli {
    pub fn into_config(self) -> AuditConfig {
        let mut config = AuditConfig::new(&self.root);
        if let Some(dir) = self.output_dir {
            config.output_dir = dir;
        }
        config.artifact_dir = if self.no_artifacts {
            None
        } else {
            Some(self.artifact_dir.unwrap_or_else(default_artifact_dir))
        };
        config.json = self.json;
        config.jobs = self.jobs;
        config.osd = !self.no_osd;
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("wolfsight").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn root_is_required() {
        assert!(Cli::try_parse_from(["wolfsight"]).is_err());
    }

    #[test]
    fn flags_flow_into_config() {
        let config = parse(&["/cases", "-o", "/tmp/out", "--json", "-j", "4", "--no-osd"]).into_config();
        assert_eq!(config.root, PathBuf::from("/cases"));
        assert_eq!(config.output_dir, PathBuf::from("/tmp/out"));
        assert!(config.json && !config.osd);
        assert_eq!(config.jobs, Some(4));
        assert!(config.artifact_dir.is_some());
    }

    #[test]
    fn artifacts_can_be_disabled_or_redirected() {
        assert_eq!(parse(&["/cases", "--no-artifacts"]).into_config().artifact_dir, None);
        assert_eq!(
            parse(&["/cases", "--artifact-dir", "/tmp/photos"]).into_config().artifact_dir,
            Some(PathBuf::from("/tmp/photos"))
        );
        assert!(Cli::try_parse_from(["wolfsight", "/cases", "--no-artifacts", "--artifact-dir", "x"]).is_err());
    }
}
