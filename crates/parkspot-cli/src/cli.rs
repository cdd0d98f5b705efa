//! Command-line arguments.

use clap::{Args, Parser, Subcommand, ValueEnum};
use parkspot_core::config::API_BASE_ENV;
use parkspot_core::ClientConfig;

#[derive(Debug, Parser)]
#[command(name = "parkspot", version, about = "Parking spot reservations from the terminal")]
pub struct Cli {
    /// Base URL of the reservation API
    #[arg(long, global = true, env = API_BASE_ENV)]
    pub api_base: Option<String>,

    /// Where the session credential is kept
    #[arg(long, global = true, env = "PARKSPOT_STORE", value_enum, default_value = "file")]
    pub store: StoreKind,

    /// Print JSON instead of tables
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Client configuration from `--api-base` / `PARKSPOT_API_BASE`
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::resolve(self.api_base.as_deref())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StoreKind {
    /// JSON file in the user data directory
    File,
    /// OS keychain
    Keyring,
    /// Forgotten when the process exits
    Memory,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Save a bearer token for later requests
    Login {
        /// Token to store; prompted for when omitted
        #[arg(long)]
        token: Option<String>,
    },
    /// Forget the stored token
    Logout,
    /// Show configuration and login state
    Status,
    /// Check that the API is reachable
    Health,
    /// Manage parking spots
    #[command(subcommand)]
    Spots(SpotsCommand),
    /// Manage reservations
    #[command(subcommand)]
    Reservations(ReservationsCommand),
}

#[derive(Debug, Subcommand)]
pub enum SpotsCommand {
    /// List all spots
    List,
    /// Create a spot
    Add {
        spot_number: String,
        /// Ask for the spot to be created inactive; a warning is printed if the server ignores it
        #[arg(long)]
        inactive: bool,
    },
}

#[derive(Debug, Subcommand)]
pub enum ReservationsCommand {
    /// List reservations
    List {
        /// Only show reservations for this spot id
        #[arg(long)]
        spot: Option<i64>,
    },
    /// Reserve a spot
    Add(NewReservationArgs),
    /// Cancel a reservation by id
    Cancel { id: i64 },
}

#[derive(Debug, Args)]
pub struct NewReservationArgs {
    #[arg(long)]
    pub spot: i64,
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub household: String,
    #[arg(long)]
    pub phone: String,
    /// Start time, e.g. 2024-05-01T09:00
    #[arg(long)]
    pub start: String,
    /// End time, e.g. 2024-05-01T11:00
    #[arg(long)]
    pub end: String,
}
