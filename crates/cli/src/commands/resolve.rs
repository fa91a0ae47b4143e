use binet_model::ParticipantStoreExt;

use crate::config::output::DisplayOptions;

use super::{
    utils::{parse_reference, validation_error},
    Command, Context,
};

/// Resolve a reference.
#[derive(Debug, clap::Args)]
pub struct Resolve {
    /// Code, handle, identity or `#id`.
    reference: String,
}

impl Command for Resolve {
    async fn execute(&self, ctx: Context<'_>) -> eyre::Result<()> {
        let store = ctx.load_store().await?;
        let participant = ctx
            .network_config()
            .identity_resolver()
            .resolve_reference(&store, &parse_reference(&self.reference))
            .and_then(|id| store.get(id))
            .map_err(validation_error)?;
        println!(
            "{}",
            ctx.output()
                .display_one(participant, DisplayOptions::default())?
        );
        Ok(())
    }
}
