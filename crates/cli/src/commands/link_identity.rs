use binet_model::ParticipantStoreMut;

use super::{
    utils::{parse_reference, validation_error},
    Command, Context,
};

/// Link an authentication identity.
#[derive(Debug, clap::Args)]
pub struct LinkIdentity {
    /// The identity to link.
    identity: String,
    /// Code, handle or `#id` of the participant.
    reference: String,
}

impl Command for LinkIdentity {
    async fn execute(&self, ctx: Context<'_>) -> eyre::Result<()> {
        let mut store = ctx.load_store().await?;
        let id = ctx
            .network_config()
            .identity_resolver()
            .resolve_reference(&store, &parse_reference(&self.reference))
            .map_err(validation_error)?;
        store
            .link_identity(&self.identity, id)
            .map_err(validation_error)?;
        ctx.save_store(&store).await?;
        println!("{} -> {id}", self.identity);
        Ok(())
    }
}
