use binet_model::{
    NetworkAction, Participant, ParticipantStoreMutExt, Position, Registration, RegistrationReport,
};
use rust_decimal::Decimal;

use crate::config::output::DisplayOptions;

use super::{
    utils::{parse_reference, validation_error},
    Command, Context,
};

/// Optional attributes of a new participant.
#[derive(Debug, clap::Args)]
pub(crate) struct ProfileArgs {
    /// Unique handle.
    #[arg(long)]
    handle: Option<String>,
    /// Initial value.
    #[arg(long)]
    value: Option<Decimal>,
    /// Authentication identity to link.
    #[arg(long)]
    identity: Option<String>,
}

impl ProfileArgs {
    pub(crate) fn apply(&self, registration: &mut Registration) {
        registration.handle = self.handle.clone();
        registration.value = self.value;
        registration.identity = self.identity.clone();
    }
}

/// Register a participant.
#[derive(Debug, clap::Args)]
pub struct Register {
    /// External code of the new participant.
    code: String,
    /// Code, handle, identity or `#id` of the sponsor.
    #[arg(long)]
    sponsor: String,
    /// Requested placement parent. Defaults to the sponsor.
    #[arg(long)]
    parent: Option<String>,
    /// Side to place on: `left` or `right`.
    #[arg(long, short)]
    position: Option<String>,
    #[command(flatten)]
    profile: ProfileArgs,
}

impl Command for Register {
    async fn execute(&self, ctx: Context<'_>) -> eyre::Result<()> {
        let position = Position::require(self.position.as_deref()).map_err(validation_error)?;
        let mut registration = Registration::builder()
            .external_code(self.code.as_str())
            .sponsor(parse_reference(&self.sponsor))
            .position(position)
            .build();
        registration.parent = self.parent.as_deref().map(parse_reference);
        self.profile.apply(&mut registration);

        let mut store = ctx.load_store().await?;
        let report = store
            .register_with_config(registration, ctx.network_config())
            .and_then(|action| action.execute())
            .map_err(validation_error)?;
        ctx.save_store(&store).await?;

        println!("{}", display_report(&ctx, &report)?);
        Ok(())
    }
}

#[derive(serde::Serialize)]
struct ReportOutput<'a> {
    #[serde(flatten)]
    participant: &'a Participant,
    attempts: usize,
    spillover_steps: Option<usize>,
}

pub(crate) fn display_report(
    ctx: &Context<'_>,
    report: &RegistrationReport,
) -> eyre::Result<String> {
    ctx.output().display_one(
        ReportOutput {
            participant: report.participant(),
            attempts: report.attempts(),
            spillover_steps: report.placement().map(|placement| placement.steps()),
        },
        DisplayOptions::default(),
    )
}
