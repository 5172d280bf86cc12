//! Given steps for message ingestion BDD scenarios.

use super::world::{IngestionWorld, run_async};
use eyre::WrapErr;
use parley::message::domain::{ConversationId, TenantId};
use rstest_bdd_macros::given;

#[given(r#"an empty conversation "{conversation}" in tenant "{tenant}""#)]
fn empty_conversation(
    world: &mut IngestionWorld,
    conversation: String,
    tenant: String,
) -> Result<(), eyre::Report> {
    world.tenant = Some(TenantId::new(tenant)?);
    world.conversation = Some(ConversationId::new(conversation)?);
    Ok(())
}

#[given(r#"sender "{sender}" has sent "{body}" as client message "{client_id}""#)]
fn message_already_sent(
    world: &mut IngestionWorld,
    sender: String,
    body: String,
    client_id: String,
) -> Result<(), eyre::Report> {
    let request = world.request(&sender, &body, &client_id)?;
    let meta = run_async(world.orchestrator.save_message(request))
        .wrap_err("store message for scenario setup")?;
    world.first_save = Some(meta);
    Ok(())
}

#[given("the segment cache has been lost")]
fn segment_cache_lost(world: &mut IngestionWorld) {
    world.cache.clear();
}
