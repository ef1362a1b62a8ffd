use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "loadstage")]
#[command(version)]
#[command(about = "Stage hourly load archives for downstream analysis", long_about = None)]
#[command(after_help = "Examples:\n  \
  loadstage https://example.org/dl/archive.zip        fetch and stage into /app/data\n  \
  loadstage ./archive.zip -d ./data                   stage a local archive into ./data\n  \
  loadstage https://example.org/dl/archive.zip -s load_data.py\n  \
  loadstage https://example.org/dl/archive.zip --payload 'hrl_load_metered_*.tar.gz'")]
pub struct Cli {
    /// Archive URL or local file path
    #[arg(value_name = "ARCHIVE")]
    pub archive: String,

    /// Directory receiving the unpacked data
    #[arg(short = 'd', long = "data-dir", value_name = "DIR", default_value = "/app/data")]
    pub data_dir: PathBuf,

    /// Where the fetched archive is written before extraction
    /// (default: the data directory path with a .zip suffix)
    #[arg(long = "archive-path", value_name = "FILE")]
    pub archive_path: Option<PathBuf>,

    /// File name of the tarball nested inside the outer archive
    /// (may contain * and ? wildcards)
    #[arg(
        long = "payload",
        value_name = "NAME",
        default_value = "hrl_load_metered_2016-2025.tar.gz"
    )]
    pub payload: String,

    /// HTTP request timeout in seconds
    #[arg(long = "timeout", value_name = "SECS", default_value_t = 30)]
    pub timeout: u64,

    /// Download attempts before giving up
    #[arg(long = "retries", value_name = "N", default_value_t = 3)]
    pub retries: u32,

    /// Expected SHA-256 of the fetched archive, as hex
    #[arg(long = "sha256", value_name = "HEX")]
    pub sha256: Option<String>,

    /// Keep the intermediate archives after extraction
    #[arg(short = 'k', long = "keep-archives")]
    pub keep_archives: bool,

    /// Analysis script to run once staging succeeds
    #[arg(short = 's', long = "script", value_name = "PATH")]
    pub script: Option<PathBuf>,

    /// Interpreter used to run the analysis script
    #[arg(long = "interpreter", value_name = "BIN", default_value = "python3")]
    pub interpreter: String,

    /// Quiet mode (-qq => quieter)
    #[arg(short = 'q', action = clap::ArgAction::Count)]
    pub quiet: u8,
}

impl Cli {
    pub fn is_http_url(&self) -> bool {
        self.archive.starts_with("http://") || self.archive.starts_with("https://")
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet > 0
    }

    pub fn is_very_quiet(&self) -> bool {
        self.quiet > 1
    }

    /// Resolved location for the fetched archive.
    ///
    /// Defaults to the data directory path with `.zip` appended, so the
    /// conventional `/app/data` layout puts the archive at `/app/data.zip`.
    pub fn archive_path(&self) -> PathBuf {
        self.archive_path.clone().unwrap_or_else(|| {
            let mut os = self.data_dir.clone().into_os_string();
            os.push(".zip");
            PathBuf::from(os)
        })
    }
}
