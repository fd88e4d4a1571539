use clap::{Parser, Subcommand};
use imagedrawer::descriptor::AssetType;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "imagedrawer")]
#[command(author, version, about = "Inspect generation metadata of image drawer media")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Extract metadata from a local PNG or WEBP file
    Inspect {
        /// File to inspect
        #[arg(required = true)]
        file: PathBuf,

        /// Output the raw metadata as JSON
        #[arg(long)]
        json: bool,

        /// Comma-separated key list (overrides the config)
        #[arg(long)]
        keys: Option<String>,

        /// Treat the key list as an allow-list
        #[arg(long)]
        allow: bool,
    },

    /// Fetch an item from the backend and show its metadata
    Fetch {
        /// File name as listed by the backend
        #[arg(required = true)]
        filename: String,

        /// Asset type (output, input, temp)
        #[arg(long = "type", default_value = "output")]
        asset_type: AssetType,

        /// Subfolder inside the asset directory
        #[arg(long, default_value = "")]
        subfolder: String,

        /// Output the raw metadata as JSON
        #[arg(long)]
        json: bool,
    },

    /// Ask the backend to delete items
    Delete {
        /// File names to delete
        #[arg(required = true)]
        filenames: Vec<String>,

        /// Asset type (output, input, temp)
        #[arg(long = "type", default_value = "output")]
        asset_type: AssetType,

        /// Subfolder inside the asset directory
        #[arg(long, default_value = "")]
        subfolder: String,
    },

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_inspect() {
        let cli = Cli::try_parse_from(["imagedrawer", "-v", "inspect", "a.png", "--keys", "seed", "--allow"])
            .unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::Inspect {
                file,
                json,
                keys,
                allow,
            } => {
                assert_eq!(file, PathBuf::from("a.png"));
                assert!(!json);
                assert_eq!(keys.as_deref(), Some("seed"));
                assert!(allow);
            }
            _ => panic!("expected inspect"),
        }
    }

    #[test]
    fn parses_asset_type() {
        let cli = Cli::try_parse_from(["imagedrawer", "delete", "a.png", "b.png", "--type", "temp"]).unwrap();
        match cli.command {
            Commands::Delete {
                filenames,
                asset_type,
                ..
            } => {
                assert_eq!(filenames, vec!["a.png", "b.png"]);
                assert_eq!(asset_type, AssetType::Temp);
            }
            _ => panic!("expected delete"),
        }
        assert!(Cli::try_parse_from(["imagedrawer", "fetch", "a.png", "--type", "models"]).is_err());
    }
}
