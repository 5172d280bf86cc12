//! When steps for message ingestion BDD scenarios.

use super::world::{IngestionWorld, run_async};
use rstest_bdd_macros::when;

#[when(r#"sender "{sender}" sends "{body}" as client message "{client_id}""#)]
fn sender_sends(
    world: &mut IngestionWorld,
    sender: String,
    body: String,
    client_id: String,
) -> Result<(), eyre::Report> {
    let request = world.request(&sender, &body, &client_id)?;
    let result = run_async(world.orchestrator.save_message(request));
    if let (Ok(meta), None) = (&result, world.first_save) {
        world.first_save = Some(*meta);
    }
    world.last_result = Some(result);
    Ok(())
}
