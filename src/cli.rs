//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;
use url::Url;

/// Fallback file name when the URL path has no usable last segment.
const FALLBACK_FILE_NAME: &str = "download.bin";

/// Stream a remote file to disk with bounded redirects and read-timeout retries.
#[derive(Parser, Debug)]
#[command(name = "stream-saver")]
#[command(author, version, about)]
pub struct Args {
    /// URL to download (http or https)
    pub url: String,

    /// Destination file (defaults to the last segment of the URL path)
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Maximum redirects to follow (0-20) [default: 3]
    #[arg(long, value_parser = clap::value_parser!(u32).range(0..=20))]
    pub max_redirects: Option<u32>,

    /// Maximum attempts per hop when reads time out (1-10) [default: 5]
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=10))]
    pub max_attempts: Option<u32>,

    /// Connect timeout in seconds (1-3600) [default: 30]
    #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub connect_timeout: Option<u64>,

    /// Read timeout in seconds, per read (1-3600) [default: 300]
    #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub read_timeout: Option<u64>,

    /// Report success even when the bytes written differ from content-length
    #[arg(long)]
    pub warn_on_size_mismatch: bool,

    /// Skip the SHA-256 printed after a successful download
    #[arg(long)]
    pub no_checksum: bool,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    /// Destination path: `--output` when given, otherwise derived from the URL.
    #[must_use]
    pub fn destination(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| default_output_path(&self.url))
    }
}

/// Derives a file name in the current directory from the URL's last path segment.
fn default_output_path(url: &str) -> PathBuf {
    let name = Url::parse(url)
        .ok()
        .and_then(|parsed| {
            parsed
                .path_segments()
                .and_then(|mut segments| segments.next_back().map(str::to_owned))
        })
        .map(|segment| {
            urlencoding::decode(&segment)
                .map(std::borrow::Cow::into_owned)
                .unwrap_or(segment)
        })
        .map(|decoded| sanitize_file_name(&decoded))
        .filter(|name| !name.is_empty() && name != "." && name != "..")
        .unwrap_or_else(|| FALLBACK_FILE_NAME.to_string());
    PathBuf::from(name)
}

/// Replaces path separators and control characters so the name stays in the current directory.
fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect::<String>()
        .trim()
        .to_string()
}
