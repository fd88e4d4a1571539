mod cli;

use imagedrawer::{
    client::{DrawerClient, MediaSource},
    config,
    descriptor::{AssetType, MediaDescriptor},
    display::{self, TooltipRow},
    filter::KeyFilter,
};
use imagedrawer_metadata::{MediaFormat, MetadataMap};

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use std::path::Path;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "imagedrawer=trace,imagedrawer_metadata=trace,reqwest=debug".to_string()
        } else {
            "imagedrawer=info,imagedrawer_metadata=warn".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Inspect {
            file,
            json,
            keys,
            allow,
        } => {
            let config = config::load_config_or_default(cli.config.as_deref())?;
            let filter = match keys {
                Some(list) => KeyFilter::parse(&list, allow),
                None => config.drawer.key_filter(),
            };
            inspect_file(&file, &filter, json)
        }
        Commands::Fetch {
            filename,
            asset_type,
            subfolder,
            json,
        } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(fetch_item(
                cli.config.as_deref(),
                filename,
                asset_type,
                subfolder,
                json,
            ))
        }
        Commands::Delete {
            filenames,
            asset_type,
            subfolder,
        } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(delete_items(
                cli.config.as_deref(),
                filenames,
                asset_type,
                subfolder,
            ))
        }
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("imagedrawer {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn inspect_file(file: &Path, filter: &KeyFilter, json: bool) -> Result<()> {
    if !file.exists() {
        anyhow::bail!("File does not exist: {:?}", file);
    }

    let metadata = imagedrawer_metadata::extract_file(file)
        .with_context(|| format!("Failed to read {:?}", file))?;

    print_metadata(metadata.as_ref(), filter, json)
}

async fn fetch_item(
    config_path: Option<&Path>,
    filename: String,
    asset_type: AssetType,
    subfolder: String,
    json: bool,
) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let client = DrawerClient::new(&config.backend);
    let descriptor = MediaDescriptor::new(filename, asset_type).with_subfolder(subfolder);

    tracing::info!("Fetching {} from {}", descriptor.filename, client.base_url());
    let blob = client
        .fetch_media(&descriptor)
        .await
        .with_context(|| format!("Failed to fetch {}", descriptor.filename))?;

    let format = MediaFormat::detect(&descriptor.filename, &blob);
    let metadata = imagedrawer_metadata::extract(&blob, format);

    print_metadata(metadata.as_ref(), &config.drawer.key_filter(), json)
}

async fn delete_items(
    config_path: Option<&Path>,
    filenames: Vec<String>,
    asset_type: AssetType,
    subfolder: String,
) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let client = DrawerClient::new(&config.backend);

    let items: Vec<MediaDescriptor> = filenames
        .into_iter()
        .map(|name| MediaDescriptor::new(name, asset_type).with_subfolder(subfolder.clone()))
        .collect();

    let success = client
        .delete_items(&items)
        .await
        .context("Failed to send delete request")?;

    if success {
        println!("Deleted {} item(s)", items.len());
        Ok(())
    } else {
        anyhow::bail!("Backend refused to delete {} item(s)", items.len())
    }
}

fn print_metadata(metadata: Option<&MetadataMap>, filter: &KeyFilter, json: bool) -> Result<()> {
    if json {
        let json_str = serde_json::to_string_pretty(&metadata)?;
        println!("{}", json_str);
        return Ok(());
    }

    let Some(metadata) = metadata else {
        println!("No metadata found");
        return Ok(());
    };

    let bundle = display::compose(metadata, filter);

    println!("Tooltip:");
    for row in &bundle.tooltip {
        match row {
            TooltipRow::Text(text) => println!("  {}", text),
            TooltipRow::Label(label) => println!("  [{}]", label),
            TooltipRow::Field { key, value } => println!("  {}: {}", key, value),
        }
    }

    println!("\nSearch text:");
    println!("{}", bundle.search_text);

    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            println!("  Backend: {}", config.backend.base_url);
            println!("  Timeout: {}s", config.backend.timeout_secs);
            let filter = config.drawer.key_filter();
            println!(
                "  Key list: {} key(s), {:?} mode",
                filter.keys().count(),
                filter.mode()
            );
            println!(
                "  Video extensions: {}",
                config.drawer.video_extensions.join(", ")
            );
        }
        None => {
            println!("No config file specified, using defaults");
            let config = config::Config::default();
            println!("Default config:");
            println!("  Backend: {}", config.backend.base_url);
        }
    }

    Ok(())
}
