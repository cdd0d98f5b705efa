//! Subcommand handlers. Each one works against the shared `ApiClient`.

use anyhow::{bail, Context, Result};
use chrono::NaiveDateTime;
use parkspot_core::models::{NewParkingSpot, NewReservation, ParkingSpot, Reservation};
use parkspot_core::{ApiClient, CredentialStore};
use serde::Serialize;
use tracing::warn;

use crate::cli::{Command, NewReservationArgs, ReservationsCommand, SpotsCommand};

/// Accepted input formats for reservation times
const TIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

pub struct CommandContext<'a> {
    pub client: &'a ApiClient,
    pub credentials: &'a CredentialStore,
    pub store_location: String,
    pub json: bool,
}

pub async fn run(ctx: &CommandContext<'_>, command: Command) -> Result<()> {
    match command {
        Command::Login { token } => login(ctx, token),
        Command::Logout => {
            ctx.credentials.clear().context("Failed to clear stored token")?;
            println!("Logged out");
            Ok(())
        }
        Command::Status => {
            status(ctx);
            Ok(())
        }
        Command::Health => {
            let health = ctx.client.health().await?;
            if ctx.json {
                return print_json(&health);
            }
            println!("{} ({})", health.status, ctx.client.base_url());
            Ok(())
        }
        Command::Spots(SpotsCommand::List) => {
            let spots = ctx.client.list_spots().await?;
            if ctx.json {
                return print_json(&spots);
            }
            print_spots(&spots);
            Ok(())
        }
        Command::Spots(SpotsCommand::Add { spot_number, inactive }) => {
            let spot = NewParkingSpot {
                spot_number,
                active: !inactive,
            };
            let created = ctx.client.create_spot(&spot).await?;
            if status_ignored(&spot, &created) {
                warn!(spot = %created.spot_number, "Server ignored requested status");
                eprintln!(
                    "Note: the server created spot {} as {}",
                    created.spot_number,
                    created.status_display()
                );
            }
            if ctx.json {
                return print_json(&created);
            }
            println!("Created spot {} (id {})", created.spot_number, created.id);
            Ok(())
        }
        Command::Reservations(ReservationsCommand::List { spot }) => {
            let reservations = ctx.client.list_reservations(spot).await?;
            if ctx.json {
                return print_json(&reservations);
            }
            print_reservations(&reservations);
            Ok(())
        }
        Command::Reservations(ReservationsCommand::Add(args)) => {
            let reservation = new_reservation(args)?;
            let created = ctx.client.create_reservation(&reservation).await?;
            if ctx.json {
                return print_json(&created);
            }
            println!(
                "Reserved spot {} for {} (id {})",
                created.spot_id,
                created.window_display(),
                created.id
            );
            Ok(())
        }
        Command::Reservations(ReservationsCommand::Cancel { id }) => {
            ctx.client.delete_reservation(id).await?;
            println!("Cancelled reservation {}", id);
            Ok(())
        }
    }
}

fn login(ctx: &CommandContext<'_>, token: Option<String>) -> Result<()> {
    let token = match token {
        Some(token) => token,
        None => rpassword::prompt_password("Token: ").context("Failed to read token")?,
    };
    let token = token.trim();
    if token.is_empty() {
        bail!("No token given");
    }
    ctx.credentials
        .set(token)
        .context("Failed to store token")?;
    println!("Token saved to {}", ctx.store_location);
    Ok(())
}

fn status(ctx: &CommandContext<'_>) {
    println!("API:       {}", ctx.client.base_url());
    println!("Store:     {}", ctx.store_location);
    let state = if ctx.credentials.is_logged_in() {
        "logged in"
    } else {
        "logged out"
    };
    println!("Session:   {}", state);
}

/// The service may not honour `active` on create
fn status_ignored(requested: &NewParkingSpot, created: &ParkingSpot) -> bool {
    requested.active != created.active
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_spots(spots: &[ParkingSpot]) {
    if spots.is_empty() {
        println!("No spots");
        return;
    }
    println!("{:>5}  {:<12}  {}", "ID", "SPOT", "STATUS");
    for spot in spots {
        println!("{:>5}  {:<12}  {}", spot.id, spot.spot_number, spot.status_display());
    }
}

fn print_reservations(reservations: &[Reservation]) {
    if reservations.is_empty() {
        println!("No reservations");
        return;
    }
    println!(
        "{:>5}  {:>5}  {:<35}  {:<16}  {:<10}  {}",
        "ID", "SPOT", "WINDOW", "NAME", "HOUSEHOLD", "PHONE"
    );
    for r in reservations {
        println!(
            "{:>5}  {:>5}  {:<35}  {:<16}  {:<10}  {}",
            r.id,
            r.spot_id,
            r.window_display(),
            r.name,
            r.household,
            r.phone
        );
    }
}

fn parse_time(input: &str) -> Result<NaiveDateTime> {
    let input = input.trim();
    TIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(input, format).ok())
        .with_context(|| format!("Invalid time '{}', expected e.g. 2024-05-01T09:00", input))
}

fn new_reservation(args: NewReservationArgs) -> Result<NewReservation> {
    Ok(NewReservation {
        name: args.name,
        household: args.household,
        phone: args.phone,
        spot_id: args.spot,
        start_time: parse_time(&args.start)?,
        end_time: parse_time(&args.end)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_time_formats() {
        let expected =
            NaiveDateTime::parse_from_str("2024-05-01 09:00:00", "%Y-%m-%d %H:%M:%S").unwrap();
        assert_eq!(parse_time("2024-05-01T09:00").unwrap(), expected);
        assert_eq!(parse_time("2024-05-01T09:00:00").unwrap(), expected);
        assert_eq!(parse_time(" 2024-05-01 09:00 ").unwrap(), expected);
    }

    #[test]
    fn test_parse_time_rejects_garbage() {
        assert!(parse_time("tomorrow").is_err());
        assert!(parse_time("2024-05-01").is_err());
    }

    #[test]
    fn test_status_ignored_detects_active_override() {
        let requested = NewParkingSpot {
            spot_number: "C-3".to_string(),
            active: false,
        };
        let mut created = ParkingSpot {
            id: 11,
            spot_number: "C-3".to_string(),
            active: true,
        };
        assert!(status_ignored(&requested, &created));

        created.active = false;
        assert!(!status_ignored(&requested, &created));
        assert!(!status_ignored(&NewParkingSpot::new("C-4"), &ParkingSpot {
            id: 12,
            spot_number: "C-4".to_string(),
            active: true,
        }));
    }

    #[test]
    fn test_new_reservation_from_args() {
        let args = NewReservationArgs {
            spot: 3,
            name: "Lin".to_string(),
            household: "5F-2".to_string(),
            phone: "0912".to_string(),
            start: "2024-05-01T09:00".to_string(),
            end: "2024-05-01T11:00".to_string(),
        };
        let reservation = new_reservation(args).unwrap();
        assert_eq!(reservation.spot_id, 3);
        assert!(reservation.end_time > reservation.start_time);
    }
}
