use std::fmt::Write;

use binet_model::{Aggregator, ParticipantId, Position, Stats, SubtreeReport};
use rust_decimal::Decimal;

use crate::config::output::{DisplayOptions, OutputFormat};

use super::{
    utils::{parse_reference, validation_error},
    Command, Context,
};

/// Show a subtree.
#[derive(Debug, clap::Args)]
pub struct Tree {
    /// Code, handle, identity or `#id` of the subtree root.
    root: String,
    /// Print one row per participant instead of drawing the tree.
    #[arg(long)]
    flat: bool,
}

#[derive(serde::Serialize)]
struct Summary<'a> {
    root: &'a str,
    node_count: u64,
    value_sum: Decimal,
    height: u32,
    left: Stats,
    right: Stats,
}

#[derive(serde::Serialize)]
struct Row<'a> {
    depth: usize,
    side: Option<Position>,
    id: ParticipantId,
    code: &'a str,
    value: Decimal,
    node_count: u64,
    value_sum: Decimal,
}

impl Command for Tree {
    async fn execute(&self, ctx: Context<'_>) -> eyre::Result<()> {
        let store = ctx.load_store().await?;
        let root = ctx
            .network_config()
            .identity_resolver()
            .resolve_reference(&store, &parse_reference(&self.root))
            .map_err(validation_error)?;
        let report = Aggregator::new(&store)
            .build_subtree(root)
            .map_err(validation_error)?;

        let output = ctx.output();
        if output == OutputFormat::Json && !self.flat {
            println!("{}", serde_json::to_string_pretty(&report)?);
            return Ok(());
        }

        println!("{}", output.display_one(summary(&report), summary_options())?);
        if self.flat {
            let rows = report.tree().iter().map(|(depth, node)| Row {
                depth,
                side: node.participant().position(),
                id: node.participant().id(),
                code: node.participant().external_code(),
                value: node.participant().value_or_zero(),
                node_count: node.stats().node_count(),
                value_sum: *node.stats().value_sum(),
            });
            println!("{}", output.display_many(rows, DisplayOptions::default())?);
        } else {
            print!("{}", draw(&report)?);
        }
        Ok(())
    }
}

fn summary(report: &SubtreeReport) -> Summary<'_> {
    let stats = report.stats();
    Summary {
        root: report.tree().participant().external_code(),
        node_count: stats.node_count(),
        value_sum: *stats.value_sum(),
        height: stats.height(),
        left: report.leg(Position::Left),
        right: report.leg(Position::Right),
    }
}

fn summary_options() -> DisplayOptions {
    DisplayOptions::table_projection([
        ("root", "Root"),
        ("node_count", "Participants"),
        ("value_sum", "Total Value"),
        ("height", "Height"),
        ("left.node_count", "Left Participants"),
        ("left.value_sum", "Left Value"),
        ("right.node_count", "Right Participants"),
        ("right.value_sum", "Right Value"),
    ])
}

fn draw(report: &SubtreeReport) -> eyre::Result<String> {
    let mut out = String::new();
    for (depth, node) in report.tree().iter() {
        let participant = node.participant();
        let side = match (depth, participant.position()) {
            (0, _) | (_, None) => String::new(),
            (_, Some(position)) => format!("[{position}] "),
        };
        writeln!(
            out,
            "{:indent$}{side}{} ({}) value={} subtree={}/{}",
            "",
            participant.external_code(),
            participant.id(),
            participant.value_or_zero(),
            node.stats().node_count(),
            node.stats().value_sum(),
            indent = depth * 2,
        )?;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use binet_model::{build_subtree, test::TestNetwork};
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn draw_indents_by_depth() -> eyre::Result<()> {
        let mut net = TestNetwork::default();
        let r = net.root_with_value("R", dec!(100))?;
        net.child_with_value("L", r, Position::Left, dec!(50))?;
        let m = net.child_with_value("M", r, Position::Right, dec!(30))?;
        net.child_with_value("N", m, Position::Left, dec!(20))?;

        let report = build_subtree(net.store(), r)?;
        let drawn = draw(&report)?;
        let lines = drawn.lines().collect::<Vec<_>>();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "R (#1) value=100 subtree=4/200");
        assert_eq!(lines[1], "  [left] L (#2) value=50 subtree=1/50");
        assert_eq!(lines[3], "    [left] N (#4) value=20 subtree=1/20");

        let summary = summary(&report);
        assert_eq!(summary.left.node_count(), 1);
        assert_eq!(summary.right.node_count(), 2);
        Ok(())
    }
}
