//! Persona classifier over contact job titles.

use serde::{Deserialize, Serialize};

use crate::rules::{Rule, first_match};

/// Engagement persona a contact is worked as.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Persona {
    #[default]
    CapitalPartner,
    PortfolioManager,
    InvestmentDirector,
}

impl Persona {
    pub const ALL: [Persona; 3] = [
        Self::CapitalPartner,
        Self::PortfolioManager,
        Self::InvestmentDirector,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            Self::CapitalPartner => "capital-partner",
            Self::PortfolioManager => "portfolio-manager",
            Self::InvestmentDirector => "investment-director",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::CapitalPartner => "Capital Partner",
            Self::PortfolioManager => "Portfolio Manager",
            Self::InvestmentDirector => "Investment Director",
        }
    }
}

impl std::fmt::Display for Persona {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.label())
    }
}

impl std::str::FromStr for Persona {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace([' ', '_'], "-");
        Persona::ALL
            .into_iter()
            .find(|p| p.id() == wanted)
            .ok_or_else(|| format!("unknown persona '{s}'"))
    }
}

/// Title rules in precedence order.
pub const PERSONA_RULES: &[Rule<Persona>] = &[
    Rule {
        triggers: &["partner"],
        result: Persona::CapitalPartner,
    },
    Rule {
        triggers: &["portfolio", "manager"],
        result: Persona::PortfolioManager,
    },
    Rule {
        triggers: &["director", "investment"],
        result: Persona::InvestmentDirector,
    },
];

/// Classify a job title. Titles matching no rule are capital partners.
pub fn classify_persona(title: Option<&str>) -> Persona {
    let title = title.unwrap_or_default().to_lowercase();
    first_match(PERSONA_RULES, &title)
        .map(|(persona, _)| persona)
        .unwrap_or_default()
}
