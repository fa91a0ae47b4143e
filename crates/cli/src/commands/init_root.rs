use binet_model::{NetworkAction, ParticipantStoreMutExt, Registration};

use super::{
    register::{display_report, ProfileArgs},
    utils::validation_error,
    Command, Context,
};

/// Create a tree root.
#[derive(Debug, clap::Args)]
pub struct InitRoot {
    /// External code of the root.
    code: String,
    #[command(flatten)]
    profile: ProfileArgs,
}

impl Command for InitRoot {
    async fn execute(&self, ctx: Context<'_>) -> eyre::Result<()> {
        let mut registration = Registration::builder()
            .external_code(self.code.as_str())
            .build();
        self.profile.apply(&mut registration);

        let mut store = ctx.load_store().await?;
        let report = store
            .register_with_config(registration, ctx.network_config())
            .and_then(|action| action.execute())
            .map_err(validation_error)?;
        ctx.save_store(&store).await?;

        tracing::info!(id = %report.participant().id(), "created root");
        println!("{}", display_report(&ctx, &report)?);
        Ok(())
    }
}
