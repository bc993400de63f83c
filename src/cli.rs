use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "ytgrab")]
#[command(author, version, about = "Fetch media renditions and download one of them", long_about = None)]
pub struct Cli {
    /// Number of parallel worker slots (overrides MAX_WORKERS)
    #[arg(short, long, global = true)]
    pub workers: Option<usize>,

    /// Directory for finished downloads (overrides DOWNLOAD_FOLDER)
    #[arg(short, long, global = true)]
    pub output: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show title, duration and the selectable renditions of a URL
    Info {
        /// Media page URL
        url: String,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Download one rendition of a URL
    Download {
        /// Media page URL
        url: String,

        /// Format id as listed by `info`
        format_id: String,

        /// Requester identity used for the single-flight guard
        #[arg(short, long, default_value = "cli")]
        requester: String,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_info() {
        let cli = Cli::parse_from(["ytgrab", "info", "https://youtu.be/abc", "--json"]);
        match cli.command {
            Commands::Info { url, json } => {
                assert_eq!(url, "https://youtu.be/abc");
                assert!(json);
            }
            Commands::Download { .. } => panic!("expected info"),
        }
    }

    #[test]
    fn test_parse_download_with_globals() {
        let cli = Cli::parse_from([
            "ytgrab",
            "download",
            "https://youtu.be/abc",
            "136",
            "--requester",
            "42",
            "--workers",
            "2",
        ]);
        assert_eq!(cli.workers, Some(2));
        match cli.command {
            Commands::Download {
                url,
                format_id,
                requester,
            } => {
                assert_eq!(url, "https://youtu.be/abc");
                assert_eq!(format_id, "136");
                assert_eq!(requester, "42");
            }
            Commands::Info { .. } => panic!("expected download"),
        }
    }

    #[test]
    fn test_default_requester() {
        let cli = Cli::parse_from(["ytgrab", "download", "https://youtu.be/abc", "22"]);
        assert!(matches!(cli.command, Commands::Download { ref requester, .. } if requester == "cli"));
    }
}
