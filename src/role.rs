use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Belbin team role.
///
/// Declaration order is the catalog order. `Ord` follows it, so it is also the
/// tie-break order wherever roles with equal scores are ranked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[serde(alias = "PL")]
    Plant,
    #[serde(alias = "RI")]
    ResourceInvestigator,
    #[serde(alias = "CO")]
    Coordinator,
    #[serde(alias = "SH")]
    Shaper,
    #[serde(alias = "ME")]
    MonitorEvaluator,
    #[serde(alias = "TW")]
    Teamworker,
    #[serde(alias = "IMP")]
    Implementer,
    #[serde(alias = "CF")]
    CompleterFinisher,
    #[serde(alias = "SP")]
    Specialist,
}

/// Belbin groups the nine roles into three orientations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RoleCategory {
    Action,
    People,
    Thinking,
}

impl Role {
    pub const ALL: [Role; 9] = [
        Role::Plant,
        Role::ResourceInvestigator,
        Role::Coordinator,
        Role::Shaper,
        Role::MonitorEvaluator,
        Role::Teamworker,
        Role::Implementer,
        Role::CompleterFinisher,
        Role::Specialist,
    ];

    /// Snake case identifier, as used in the question banks and the database.
    pub fn id(&self) -> &'static str {
        match self {
            Role::Plant => "plant",
            Role::ResourceInvestigator => "resource_investigator",
            Role::Coordinator => "coordinator",
            Role::Shaper => "shaper",
            Role::MonitorEvaluator => "monitor_evaluator",
            Role::Teamworker => "teamworker",
            Role::Implementer => "implementer",
            Role::CompleterFinisher => "completer_finisher",
            Role::Specialist => "specialist",
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Role::Plant => "PL",
            Role::ResourceInvestigator => "RI",
            Role::Coordinator => "CO",
            Role::Shaper => "SH",
            Role::MonitorEvaluator => "ME",
            Role::Teamworker => "TW",
            Role::Implementer => "IMP",
            Role::CompleterFinisher => "CF",
            Role::Specialist => "SP",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Role::Plant => "Plant",
            Role::ResourceInvestigator => "Resource Investigator",
            Role::Coordinator => "Coordinator",
            Role::Shaper => "Shaper",
            Role::MonitorEvaluator => "Monitor Evaluator",
            Role::Teamworker => "Teamworker",
            Role::Implementer => "Implementer",
            Role::CompleterFinisher => "Completer Finisher",
            Role::Specialist => "Specialist",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Role::Plant => {
                "Creative, imaginative and unorthodox. Generates ideas and solves difficult problems, \
                 but may ignore incidentals and be too preoccupied to communicate effectively."
            }
            Role::ResourceInvestigator => {
                "Outgoing, enthusiastic and communicative. Explores opportunities and develops \
                 contacts, but can be over-optimistic and lose interest once the initial \
                 enthusiasm has passed."
            }
            Role::Coordinator => {
                "Mature, confident and a good chairperson. Clarifies goals, promotes decision \
                 making and delegates well, but can be seen as manipulative or as offloading \
                 personal work."
            }
            Role::Shaper => {
                "Challenging, dynamic and thrives on pressure. Has the drive and courage to \
                 overcome obstacles, but is prone to provocation and may offend people's feelings."
            }
            Role::MonitorEvaluator => {
                "Sober, strategic and discerning. Sees all options and judges accurately, but may \
                 lack drive and the ability to inspire others."
            }
            Role::Teamworker => {
                "Co-operative, mild, perceptive and diplomatic. Listens, builds and averts \
                 friction, but can be indecisive in crunch situations."
            }
            Role::Implementer => {
                "Disciplined, reliable, conservative and efficient. Turns ideas into practical \
                 actions, but can be somewhat inflexible and slow to respond to new possibilities."
            }
            Role::CompleterFinisher => {
                "Painstaking, conscientious and anxious. Searches out errors and omissions and \
                 delivers on time, but is inclined to worry unduly and reluctant to delegate."
            }
            Role::Specialist => {
                "Single-minded, self-starting and dedicated. Provides knowledge and skills in rare \
                 supply, but contributes only on a narrow front and dwells on technicalities."
            }
        }
    }

    pub fn category(&self) -> RoleCategory {
        match self {
            Role::Shaper | Role::Implementer | Role::CompleterFinisher => RoleCategory::Action,
            Role::Coordinator | Role::Teamworker | Role::ResourceInvestigator => {
                RoleCategory::People
            }
            Role::Plant | Role::MonitorEvaluator | Role::Specialist => RoleCategory::Thinking,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Role {
    type Err = ValidationError;

    /// Accepts the snake case id or the short code, ignoring ASCII case.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();
        Role::ALL
            .into_iter()
            .find(|role| {
                role.id().eq_ignore_ascii_case(value) || role.code().eq_ignore_ascii_case(value)
            })
            .ok_or_else(|| ValidationError::UnknownRole(value.to_string()))
    }
}

impl RoleCategory {
    pub fn label(&self) -> &'static str {
        match self {
            RoleCategory::Action => "action-oriented",
            RoleCategory::People => "people-oriented",
            RoleCategory::Thinking => "thinking-oriented",
        }
    }

    /// Generic advice for someone whose dominant roles fall in this category.
    pub fn recommendation(&self) -> &'static str {
        match self {
            RoleCategory::Action => {
                "You are at your best turning plans into results. Seek out ownership of \
                 delivery, and pair with thinking-oriented colleagues before committing to a \
                 direction."
            }
            RoleCategory::People => {
                "You hold teams together and connect them to the outside world. Take on \
                 facilitation and stakeholder work, and lean on action-oriented colleagues to \
                 keep momentum."
            }
            RoleCategory::Thinking => {
                "You bring ideas, judgement and expertise. Look for problems that need depth, and \
                 involve people-oriented colleagues early so your conclusions are heard."
            }
        }
    }
}
