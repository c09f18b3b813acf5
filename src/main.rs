use std::path::PathBuf;

use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use fast_scheduler::display::{print_calendar, print_rooms, write_json_to_file};
use fast_scheduler::parser::{load_calendar, load_events, load_time_slots};
use fast_scheduler::{AssignmentStrategy, Calendar, ClusterConfig, ClusterOutcome, ClusterRequest, AUTO_CENTERS};

#[derive(Parser)]
#[command(name = "fast-scheduler")]
#[command(about = "Assign events to time slots and pack them into rooms")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Seed for random and clustering strategies
    #[arg(long, env = "FAST_SCHEDULER_SEED")]
    seed: Option<u64>,

    /// Enable verbose output
    #[arg(long, short)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a calendar from an event file and a time slot file.
    Assign {
        /// Events as a JSON array or CSV (by extension)
        #[arg(short, long)]
        events: PathBuf,
        /// Newline-separated time slots
        #[arg(short, long)]
        slots: PathBuf,
        /// Calendar name
        #[arg(short, long, default_value = "calendar")]
        name: String,
        /// random, start-time, cluster or anti-cluster
        #[arg(long, default_value = "start-time")]
        strategy: AssignmentStrategy,
        /// Note attribute to cluster on
        #[arg(short, long)]
        attribute: Option<String>,
        /// Slots to advance between events of one group
        #[arg(long, default_value_t = 1)]
        shift: usize,
        /// first, earliest or emptiest
        #[arg(long, default_value = "earliest")]
        start: String,
        /// Number of groups, -1 derives it from the event count
        #[arg(long, default_value_t = AUTO_CENTERS, allow_negative_numbers = true)]
        centers: i64,
        /// Clustering restarts
        #[arg(long, default_value_t = ClusterConfig::default().restarts)]
        restarts: usize,
        /// Require slots in MM:DD:YYYY:HH:MM:SS form
        #[arg(long)]
        strict_slots: bool,
        /// Also pack the result into rooms
        #[arg(long)]
        rooms: bool,
        /// Output file for the calendar (JSON)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Output file for the rooms (JSON)
        #[arg(long)]
        rooms_output: Option<PathBuf>,
    },

    /// Pack an exported calendar into rooms.
    Rooms {
        /// Calendar export (JSON)
        #[arg(short, long)]
        calendar: PathBuf,
        /// Output file for the rooms (JSON)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    match cli.command {
        Commands::Assign {
            events,
            slots,
            name,
            strategy,
            attribute,
            shift,
            start,
            centers,
            restarts,
            strict_slots,
            rooms,
            output,
            rooms_output,
        } => {
            let mut events = load_events(&events)?;
            let slots = load_time_slots(&slots, strict_slots)?;
            info!(events = events.len(), slots = slots.len(), "Loaded input");

            let mut calendar = Calendar::new(name, slots);
            let total = events.len();

            // Clustering works on loaded events, so seed the buckets by requested time first
            match strategy {
                AssignmentStrategy::Random => calendar.random_assign(&mut events, &mut rng)?,
                _ => calendar.start_time_assign(&mut events)?,
            }
            let loaded = calendar.load(events);
            if loaded != total {
                warn!(loaded, total, "Some events could not be loaded");
            }

            if let Some(objective) = strategy.objective() {
                let attribute = attribute.ok_or("--attribute is required for cluster strategies")?;
                let request = ClusterRequest::new(attribute)
                    .with_shift(shift)
                    .with_start(start)
                    .with_centers(centers)
                    .with_config(ClusterConfig {
                        restarts,
                        ..ClusterConfig::default()
                    });

                match calendar.assign_by_similarity(objective, &request, &mut rng)? {
                    ClusterOutcome::Rejected { start } => {
                        return Err(format!("unknown start policy {:?}", start).into());
                    }
                    ClusterOutcome::Assigned(summary) => {
                        println!(
                            "Grouped {} events into {} groups ({} reloaded)",
                            summary.relevant, summary.groups, summary.reloaded
                        );
                    }
                }
            }

            print_calendar(&calendar);
            if let Some(path) = output {
                write_json_to_file(&calendar.to_json(), &path)?;
                println!("Calendar saved to {}", path.display());
            }

            if rooms {
                calendar.derive_end_times();
                let schedule = calendar.heuristics()?;
                print_rooms(&schedule);
                if let Some(path) = rooms_output {
                    write_json_to_file(&schedule.to_json(), &path)?;
                    println!("Rooms saved to {}", path.display());
                }
            }
        }

        Commands::Rooms { calendar, output } => {
            let mut calendar = load_calendar(&calendar)?;
            calendar.derive_end_times();
            let schedule = calendar.heuristics()?;

            print_rooms(&schedule);
            if let Some(path) = output {
                write_json_to_file(&schedule.to_json(), &path)?;
                println!("Rooms saved to {}", path.display());
            }
        }
    }

    Ok(())
}
