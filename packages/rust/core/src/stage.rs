//! Canonical pipeline stages and the free-text stage normalizer.
//!
//! A contact's `stage` is whatever text was typed or imported. Every reader
//! maps it onto [`PipelineStage`] with [`normalize_stage`]; unknown or blank
//! labels land in [`PipelineStage::Interested`] so no contact ever falls out
//! of the pipeline.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::rules::{Rule, first_match};

/// The four pipeline states, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PipelineStage {
    Interested,
    HadMeeting,
    ContractNegotiations,
    ContractSigned,
}

impl PipelineStage {
    /// All stages in pipeline order.
    pub const ALL: [PipelineStage; 4] = [
        Self::Interested,
        Self::HadMeeting,
        Self::ContractNegotiations,
        Self::ContractSigned,
    ];

    /// Stable slug (`had-meeting`).
    pub fn id(&self) -> &'static str {
        match self {
            Self::Interested => "interested",
            Self::HadMeeting => "had-meeting",
            Self::ContractNegotiations => "contract-negotiations",
            Self::ContractSigned => "contract-signed",
        }
    }

    /// Human-readable label written back onto contacts (`Had Meeting`).
    pub fn label(&self) -> &'static str {
        match self {
            Self::Interested => "Interested",
            Self::HadMeeting => "Had Meeting",
            Self::ContractNegotiations => "Contract Negotiations",
            Self::ContractSigned => "Contract Signed",
        }
    }

    /// Position in [`PipelineStage::ALL`].
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// The following stage, or `None` for the terminal stage.
    pub fn next(&self) -> Option<PipelineStage> {
        Self::ALL.get(self.index() + 1).copied()
    }

    pub fn is_terminal(&self) -> bool {
        self.next().is_none()
    }

    /// Exact match on a canonical slug.
    pub fn from_id(id: &str) -> Option<PipelineStage> {
        Self::ALL.into_iter().find(|stage| stage.id() == id)
    }
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.label())
    }
}

/// Strict parse: a canonical slug or label, case-insensitive. Fuzzy input
/// belongs to [`normalize_stage`].
impl std::str::FromStr for PipelineStage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PipelineStage::from_id(&stage_slug(s))
            .ok_or_else(|| format!("unknown pipeline stage '{s}'"))
    }
}

// ---------------------------------------------------------------------------
// Normalizer
// ---------------------------------------------------------------------------

/// Substring rules applied after the exact-slug check, in precedence order.
pub const STAGE_RULES: &[Rule<PipelineStage>] = &[
    Rule {
        triggers: &["prospect", "prospecting", "warm", "interested"],
        result: PipelineStage::Interested,
    },
    Rule {
        triggers: &["meeting"],
        result: PipelineStage::HadMeeting,
    },
    Rule {
        triggers: &["negotiation", "negotiations", "proposal"],
        result: PipelineStage::ContractNegotiations,
    },
    Rule {
        triggers: &["client", "closed-won", "signed"],
        result: PipelineStage::ContractSigned,
    },
];

/// How a label was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageMatch {
    /// The slug was already a canonical id.
    Canonical,
    /// A rule fired on this trigger substring.
    Rule(&'static str),
    /// Nothing matched; the safe default applied.
    Default,
}

/// Full trace of a normalization, used for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageResolution {
    pub slug: String,
    pub stage: PipelineStage,
    pub matched: StageMatch,
}

static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Lower-case, trim, and collapse whitespace runs into single hyphens.
pub fn stage_slug(label: &str) -> String {
    WHITESPACE_RE
        .replace_all(label.trim(), "-")
        .to_lowercase()
}

/// Resolve a label and report which step decided it.
pub fn resolve_stage(label: Option<&str>) -> StageResolution {
    let slug = label.map(stage_slug).unwrap_or_default();

    if let Some(stage) = PipelineStage::from_id(&slug) {
        return StageResolution {
            slug,
            stage,
            matched: StageMatch::Canonical,
        };
    }

    match first_match(STAGE_RULES, &slug) {
        Some((stage, trigger)) => StageResolution {
            slug,
            stage,
            matched: StageMatch::Rule(trigger),
        },
        None => StageResolution {
            slug,
            stage: PipelineStage::Interested,
            matched: StageMatch::Default,
        },
    }
}

/// Map any stage label onto a canonical stage.
pub fn normalize_stage(label: Option<&str>) -> PipelineStage {
    resolve_stage(label).stage
}
