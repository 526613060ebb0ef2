use std::sync::Arc;

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use nimbus_core::{
    Config, Coordinates, FileStore, KeyValueStore, Loaded, NamedLocation, Refresher,
    store::{StoredLocation, clear_custom_location, load_custom_location, save_custom_location},
};

use crate::render;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "nimbus", version, about = "Weather for where you are")]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the OpenWeather API key.
    Configure,

    /// Show current conditions.
    Now(OutputArgs),

    /// Show the full breakdown: temperature range, wind, clouds.
    Details(OutputArgs),

    /// Manage the saved custom location.
    #[command(subcommand)]
    Location(LocationCommand),
}

#[derive(Debug, Args)]
pub struct OutputArgs {
    /// Print the location and raw snapshot as JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Subcommand)]
pub enum LocationCommand {
    /// Print the saved location, if any.
    Show,

    /// Save a location to use instead of the device position.
    Set {
        #[arg(allow_negative_numbers = true)]
        latitude: f64,
        #[arg(allow_negative_numbers = true)]
        longitude: f64,
        /// Display name, e.g. "London, GB".
        name: String,
    },

    /// Forget the saved location and go back to the device position.
    Clear,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Now(args) => {
                let loaded = refresh().await?;
                print_loaded(&loaded, args.json, render::summary)
            }
            Command::Details(args) => {
                let loaded = refresh().await?;
                print_loaded(&loaded, args.json, render::details)
            }
            Command::Location(cmd) => location(cmd),
        }
    }
}

fn open_store() -> anyhow::Result<FileStore> {
    let path = Config::storage_file_path()?;
    tracing::debug!(path = %path.display(), "opening key-value store");
    Ok(FileStore::new(path))
}

fn configure() -> anyhow::Result<()> {
    let mut cfg = Config::load()?;

    let api_key = inquire::Password::new("OpenWeather API key:")
        .without_confirmation()
        .with_display_mode(inquire::PasswordDisplayMode::Masked)
        .prompt()
        .context("Failed to read API key")?;

    let api_key = api_key.trim().to_string();
    if api_key.is_empty() {
        bail!("API key must not be empty");
    }

    cfg.set_api_key(api_key);
    cfg.geolocation.enabled =
        inquire::Confirm::new("Allow looking up your position from your IP address?")
            .with_default(cfg.geolocation.enabled)
            .prompt()
            .context("Failed to read geolocation preference")?;

    cfg.save()?;
    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}

async fn refresh() -> anyhow::Result<Loaded> {
    let cfg = Config::load()?;
    let store: Arc<dyn KeyValueStore> = Arc::new(open_store()?);
    let refresher = Refresher::from_config(&cfg, store)?;

    match refresher.refresh().await {
        Ok(loaded) => Ok(loaded),
        Err(e) => {
            let state = refresher.state().current();
            let message = state.error.unwrap_or_else(|| e.user_message().to_string());
            Err(anyhow::Error::new(e).context(message))
        }
    }
}

fn print_loaded(
    loaded: &Loaded,
    json: bool,
    format: fn(&Loaded) -> String,
) -> anyhow::Result<()> {
    if json {
        let out = serde_json::json!({
            "location": loaded.location,
            "weather": loaded.snapshot.as_ref(),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        print!("{}", format(loaded));
    }
    Ok(())
}

fn location(cmd: LocationCommand) -> anyhow::Result<()> {
    let store = open_store()?;

    match cmd {
        LocationCommand::Show => match load_custom_location(&store)? {
            StoredLocation::Found(loc) => println!("{} ({})", loc.name, loc.coordinates),
            StoredLocation::Missing => println!("No saved location; using device position."),
            StoredLocation::Malformed(e) => {
                println!("Saved location is unreadable ({e}); using device position.")
            }
        },
        LocationCommand::Set { latitude, longitude, name } => {
            let coordinates = Coordinates::new(latitude, longitude)?;
            let loc = NamedLocation::new(coordinates, name);
            save_custom_location(&store, &loc)?;
            println!("Saved {} ({})", loc.name, loc.coordinates);
        }
        LocationCommand::Clear => {
            clear_custom_location(&store)?;
            println!("Cleared saved location.");
        }
    }

    Ok(())
}
