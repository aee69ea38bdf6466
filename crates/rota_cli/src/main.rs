//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `rota_core` linkage.
//! - Keep output deterministic for quick local sanity checks.

use rota_core::db::open_db_in_memory;
use rota_core::{
    default_log_level, init_logging, ChoreOutcome, RosterService, RotationService,
    SqliteRosterRepository, SqliteRotationStateRepository,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    match args.next().as_deref() {
        Some("demo") => run_demo(),
        _ => {
            println!("rota_core version={}", rota_core::core_version());
            Ok(())
        }
    }
}

/// Seeds an in-memory database, runs one cycle, and signals two outcomes.
///
/// Output is plain key=value lines so the probe stays scriptable.
fn run_demo() -> Result<(), Box<dyn std::error::Error>> {
    let log_dir = std::env::temp_dir().join("rota-demo-logs");
    let log_dir = log_dir.to_str().ok_or("log directory is not valid UTF-8")?;
    init_logging(default_log_level(), log_dir)?;

    let conn = open_db_in_memory()?;

    let roster_repo = SqliteRosterRepository::try_new(&conn)?;
    let mut roster = RosterService::new(roster_repo);
    roster.add_participant("alex")?;
    roster.add_participant("blake")?;
    roster.add_participant("casey")?;
    let dishes = roster.add_chore("dishes", 5)?;
    let vacuum = roster.add_chore("vacuum", 3)?;

    let state_repo = SqliteRotationStateRepository::try_new(&conn)?;
    let mut rotation = RotationService::new(state_repo);

    let rota = rotation.run_cycle(0)?;
    println!("cycle={}", rota.cycle);
    for assignment in &rota.assignments {
        println!(
            "chore={} assignee={} difficulty={}",
            assignment.chore_uuid, assignment.participant_uuid, assignment.difficulty
        );
    }

    let dishes_assignee = rota
        .assignment(dishes.uuid)
        .ok_or("dishes missing from rota")?
        .participant_uuid;
    let vacuum_assignee = rota
        .assignment(vacuum.uuid)
        .ok_or("vacuum missing from rota")?
        .participant_uuid;

    let done = rotation.signal(dishes.uuid, dishes_assignee, ChoreOutcome::Completed)?;
    println!("signal=completed effect={done:?}");
    let skipped = rotation.signal(vacuum.uuid, vacuum_assignee, ChoreOutcome::Skipped)?;
    println!("signal=skipped effect={skipped:?}");

    for record in rotation.load_snapshot()? {
        println!(
            "participant={} cumulative={} completions={} skips={}",
            record.participant_uuid,
            record.cumulative_difficulty,
            record.completions,
            record.skips
        );
    }

    Ok(())
}
