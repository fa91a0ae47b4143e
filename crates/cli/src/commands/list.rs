use crate::config::output::DisplayOptions;

use super::{Command, Context};

/// List participants.
#[derive(Debug, clap::Args)]
pub struct List {
    /// Only list tree roots.
    #[arg(long)]
    roots: bool,
    /// Print linked identities instead of participants.
    #[arg(long, conflicts_with = "roots")]
    identities: bool,
}

#[derive(serde::Serialize)]
struct IdentityLink<'a> {
    identity: &'a str,
    participant: binet_model::ParticipantId,
}

impl Command for List {
    async fn execute(&self, ctx: Context<'_>) -> eyre::Result<()> {
        let store = ctx.load_store().await?;
        let output = ctx.output();
        let out = if self.identities {
            output.display_many(
                store
                    .identities()
                    .map(|(identity, participant)| IdentityLink {
                        identity,
                        participant,
                    }),
                DisplayOptions::default(),
            )?
        } else if self.roots {
            output.display_many(store.roots(), DisplayOptions::participant_table())?
        } else {
            output.display_many(store.participants(), DisplayOptions::participant_table())?
        };
        println!("{out}");
        Ok(())
    }
}
