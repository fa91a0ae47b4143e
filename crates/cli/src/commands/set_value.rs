use binet_model::{ParticipantStoreExt, ParticipantStoreMut};
use rust_decimal::Decimal;

use crate::config::output::DisplayOptions;

use super::{
    utils::{parse_reference, validation_error},
    Command, Context,
};

/// Set the value of a participant.
#[derive(Debug, clap::Args)]
pub struct SetValue {
    /// Code, handle, identity or `#id`.
    reference: String,
    /// New value. Omit to clear.
    value: Option<Decimal>,
}

impl Command for SetValue {
    async fn execute(&self, ctx: Context<'_>) -> eyre::Result<()> {
        let mut store = ctx.load_store().await?;
        let id = ctx
            .network_config()
            .identity_resolver()
            .resolve_reference(&store, &parse_reference(&self.reference))
            .map_err(validation_error)?;
        store.set_value(id, self.value).map_err(validation_error)?;
        ctx.save_store(&store).await?;

        let participant = store.get(id)?;
        println!(
            "{}",
            ctx.output()
                .display_one(participant, DisplayOptions::default())?
        );
        Ok(())
    }
}
