use binet_model::{ParticipantId, Reference};

/// Parse a participant reference. `#<n>` refers to an internal id, anything
/// else is looked up by code, handle or identity.
pub(crate) fn parse_reference(s: &str) -> Reference {
    match s.strip_prefix('#').map(str::parse::<u64>) {
        Some(Ok(id)) => Reference::Id(ParticipantId::new(id)),
        _ => Reference::Text(s.to_string()),
    }
}

/// Turn a model error into a report led by its user-facing message.
pub(crate) fn validation_error(err: binet_model::Error) -> eyre::Report {
    eyre::eyre!("{}: {err}", err.validation_message())
}
