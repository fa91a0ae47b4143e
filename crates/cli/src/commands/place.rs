use binet_model::{PlacementResolver, Position};

use crate::config::output::DisplayOptions;

use super::{
    utils::{parse_reference, validation_error},
    Command, Context,
};

/// Find the slot a registration would take, without registering.
#[derive(Debug, clap::Args)]
pub struct Place {
    /// Code, handle, identity or `#id` of the requested parent.
    parent: String,
    /// Side to place on: `left` or `right`.
    #[arg(long, short)]
    position: Option<String>,
}

impl Command for Place {
    async fn execute(&self, ctx: Context<'_>) -> eyre::Result<()> {
        let position = Position::require(self.position.as_deref()).map_err(validation_error)?;
        let store = ctx.load_store().await?;
        let config = ctx.network_config();
        let placement = PlacementResolver::with_config(&store, &config)
            .resolve_placement(&parse_reference(&self.parent), position)
            .map_err(validation_error)?;
        println!(
            "{}",
            ctx.output()
                .display_one(placement, DisplayOptions::default())?
        );
        Ok(())
    }
}
