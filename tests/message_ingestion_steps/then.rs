//! Then steps for message ingestion BDD scenarios.

use super::world::IngestionWorld;
use eyre::{ensure, eyre};
use parley::message::services::SaveMessageError;
use rstest_bdd_macros::then;

#[then("the save succeeds with sequence {expected:u64}")]
fn save_succeeds_with_sequence(
    world: &mut IngestionWorld,
    expected: u64,
) -> Result<(), eyre::Report> {
    let meta = world.last_meta()?;
    ensure!(
        meta.sequence.value() == expected,
        "expected sequence {expected}, got {}",
        meta.sequence
    );
    Ok(())
}

#[then("the save succeeds with a sequence above the first save")]
fn save_succeeds_above_first(world: &mut IngestionWorld) -> Result<(), eyre::Report> {
    let first = world.first_save()?;
    let meta = world.last_meta()?;
    ensure!(
        meta.sequence > first.sequence,
        "sequence {} does not follow {}",
        meta.sequence,
        first.sequence
    );
    Ok(())
}

#[then("the server id matches the first save")]
fn server_id_matches(world: &mut IngestionWorld) -> Result<(), eyre::Report> {
    let first = world.first_save()?;
    let meta = world.last_meta()?;
    ensure!(meta.server_id == first.server_id, "server id changed on replay");
    Ok(())
}

#[then("the server id differs from the first save")]
fn server_id_differs(world: &mut IngestionWorld) -> Result<(), eyre::Report> {
    let first = world.first_save()?;
    let meta = world.last_meta()?;
    ensure!(meta.server_id != first.server_id, "server id was reused");
    Ok(())
}

#[then("the save is rejected as an idempotency conflict")]
fn save_is_conflict(world: &mut IngestionWorld) -> Result<(), eyre::Report> {
    match &world.last_result {
        Some(Err(SaveMessageError::IdempotencyConflict { .. })) => Ok(()),
        Some(other) => Err(eyre!("expected an idempotency conflict, got {other:?}")),
        None => Err(eyre!("no save has run")),
    }
}

#[then("the conversation holds {count:usize} message")]
fn conversation_holds(world: &mut IngestionWorld, count: usize) -> Result<(), eyre::Report> {
    ensure!(
        world.store.len() == count,
        "expected {count} stored messages, found {}",
        world.store.len()
    );
    Ok(())
}
