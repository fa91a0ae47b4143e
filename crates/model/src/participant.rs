use std::{fmt, str::FromStr};

use rust_decimal::Decimal;
use typed_builder::TypedBuilder;

use crate::Error;

/// Stable numeric identity of a participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct ParticipantId(u64);

impl ParticipantId {
    /// Create from raw id.
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw id.
    pub const fn get(&self) -> u64 {
        self.0
    }
}

impl From<u64> for ParticipantId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Side of a slot under a placement parent.
#[derive(
    Debug,
    Clone,
    Copy,
    num_enum::TryFromPrimitive,
    num_enum::IntoPrimitive,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[repr(u8)]
pub enum Position {
    /// Left.
    Left,
    /// Right.
    Right,
}

impl Position {
    /// Both sides, left first.
    pub const ALL: [Self; 2] = [Self::Left, Self::Right];

    /// Get the other side.
    pub fn opposite(&self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }

    /// Parse an optional raw side.
    ///
    /// Absent input is an [`Error::InvalidPosition`]; no side is ever inferred.
    pub fn require(raw: Option<&str>) -> crate::Result<Self> {
        raw.ok_or_else(|| Error::InvalidPosition(String::new()))?
            .parse()
    }

    #[inline]
    pub(crate) fn index(&self) -> usize {
        u8::from(*self) as usize
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Left => f.write_str("left"),
            Self::Right => f.write_str("right"),
        }
    }
}

impl FromStr for Position {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" | "l" => Ok(Self::Left),
            "right" | "r" => Ok(Self::Right),
            other => other
                .parse::<u8>()
                .ok()
                .and_then(|raw| Self::try_from(raw).ok())
                .ok_or_else(|| Error::InvalidPosition(s.to_string())),
        }
    }
}

/// A node of the placement tree.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Participant {
    pub(crate) id: ParticipantId,
    pub(crate) external_code: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub(crate) handle: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub(crate) sponsor_id: Option<ParticipantId>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub(crate) parent_id: Option<ParticipantId>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub(crate) position: Option<Position>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub(crate) level: u32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub(crate) value: Option<Decimal>,
}

impl Participant {
    /// Get the id.
    pub fn id(&self) -> ParticipantId {
        self.id
    }

    /// Get the external code.
    pub fn external_code(&self) -> &str {
        &self.external_code
    }

    /// Get the handle.
    pub fn handle(&self) -> Option<&str> {
        self.handle.as_deref()
    }

    /// Get the sponsor.
    pub fn sponsor_id(&self) -> Option<ParticipantId> {
        self.sponsor_id
    }

    /// Get the placement parent.
    pub fn parent_id(&self) -> Option<ParticipantId> {
        self.parent_id
    }

    /// Get the side under the placement parent.
    pub fn position(&self) -> Option<Position> {
        self.position
    }

    /// Get the level. Roots are at level `0`.
    pub fn level(&self) -> u32 {
        self.level
    }

    /// Get the raw value.
    pub fn value(&self) -> Option<&Decimal> {
        self.value.as_ref()
    }

    /// Get the value used for aggregation, absent values count as zero.
    pub fn value_or_zero(&self) -> Decimal {
        self.value.unwrap_or(Decimal::ZERO)
    }

    /// Returns whether this participant is a tree root.
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Get the `(parent, position)` slot this participant occupies.
    pub fn slot(&self) -> Option<(ParticipantId, Position)> {
        Some((self.parent_id?, self.position?))
    }
}

/// A participant to be inserted into a store.
#[derive(Debug, Clone, TypedBuilder)]
pub struct NewParticipant {
    #[builder(setter(into))]
    pub(crate) external_code: String,
    #[builder(default = None, setter(into, strip_option))]
    pub(crate) handle: Option<String>,
    #[builder(default = None, setter(strip_option))]
    pub(crate) sponsor_id: Option<ParticipantId>,
    /// The `(parent, position)` slot to claim, `None` for a root.
    #[builder(default = None, setter(strip_option))]
    pub(crate) slot: Option<(ParticipantId, Position)>,
    #[builder(default = None, setter(strip_option))]
    pub(crate) value: Option<Decimal>,
    /// Authentication identity linked together with the insert.
    #[builder(default = None, setter(into, strip_option))]
    pub(crate) identity: Option<String>,
}

impl NewParticipant {
    /// Get the external code.
    pub fn external_code(&self) -> &str {
        &self.external_code
    }

    /// Get the slot to claim.
    pub fn slot(&self) -> Option<(ParticipantId, Position)> {
        self.slot
    }

    /// Get the handle.
    pub fn handle(&self) -> Option<&str> {
        self.handle.as_deref()
    }

    /// Get the identity to link.
    pub fn identity(&self) -> Option<&str> {
        self.identity.as_deref()
    }

    pub(crate) fn into_participant(self, id: ParticipantId, level: u32) -> Participant {
        let (parent_id, position) = self.slot.unzip();
        Participant {
            id,
            external_code: self.external_code,
            handle: self.handle,
            sponsor_id: self.sponsor_id,
            parent_id,
            position,
            level,
            value: self.value,
        }
    }
}
