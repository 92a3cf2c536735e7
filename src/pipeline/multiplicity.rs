//! Output multiplicity: how many items a pipe produces

use serde::{Deserialize, Serialize};

/// `true`/`false` toggles list output, an integer asks for that many items
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Multiplicity {
    Flag(bool),
    Count(u32),
}

impl Multiplicity {
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Flag(flag) => *flag,
            Self::Count(count) => *count > 0,
        }
    }

    pub fn count(&self) -> Option<u32> {
        match self {
            Self::Count(count) => Some(*count),
            Self::Flag(_) => None,
        }
    }

    /// Build from the `nb_output` / `multiple_output` blueprint pair
    pub fn from_fields(
        nb_output: Option<u32>,
        multiple_output: Option<bool>,
    ) -> Result<Option<Self>, String> {
        match (nb_output, multiple_output) {
            (Some(_), Some(_)) => {
                Err("nb_output and multiple_output are mutually exclusive".into())
            }
            (Some(count), None) => Ok(Some(Self::Count(count))),
            (None, Some(flag)) => Ok(Some(Self::Flag(flag))),
            (None, None) => Ok(None),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MultiplicityResolution {
    pub resolved: Option<Multiplicity>,
    pub is_multiple_outputs_enabled: bool,
    pub specific_output_count: Option<u32>,
}

/// Combine a pipe's own multiplicity with a caller override.
///
/// The override wins unless absent, but `true` keeps a more specific
/// integer base.
pub fn resolve_multiplicity(
    base: Option<Multiplicity>,
    override_multiplicity: Option<Multiplicity>,
) -> MultiplicityResolution {
    match override_multiplicity {
        None => MultiplicityResolution {
            resolved: base,
            is_multiple_outputs_enabled: base.is_some_and(|b| b.is_truthy()),
            specific_output_count: base.and_then(|b| b.count()),
        },
        Some(Multiplicity::Flag(false)) => MultiplicityResolution {
            resolved: Some(Multiplicity::Flag(false)),
            is_multiple_outputs_enabled: false,
            specific_output_count: None,
        },
        Some(Multiplicity::Flag(true)) => match base {
            Some(Multiplicity::Count(count)) => MultiplicityResolution {
                resolved: Some(Multiplicity::Count(count)),
                is_multiple_outputs_enabled: true,
                specific_output_count: Some(count),
            },
            _ => MultiplicityResolution {
                resolved: Some(Multiplicity::Flag(true)),
                is_multiple_outputs_enabled: true,
                specific_output_count: None,
            },
        },
        Some(Multiplicity::Count(count)) => MultiplicityResolution {
            resolved: Some(Multiplicity::Count(count)),
            is_multiple_outputs_enabled: true,
            specific_output_count: Some(count),
        },
    }
}
