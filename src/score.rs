use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::answer::{Answer, AnswerSet};
use crate::question::{QuestionBank, QuestionKind};
use crate::role::{Role, RoleCategory};

/// How many roles `primary_roles` returns when the caller has no preference.
pub const DEFAULT_TOP_N: usize = 3;

/// Score per role for one completed session.
///
/// Always holds exactly one entry per role; roles that were never credited are zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<Role, u32>", into = "BTreeMap<Role, u32>")]
pub struct ScoreMap {
    scores: BTreeMap<Role, u32>,
}

impl Default for ScoreMap {
    fn default() -> Self {
        Self {
            scores: Role::ALL.into_iter().map(|role| (role, 0)).collect(),
        }
    }
}

impl ScoreMap {
    pub fn get(&self, role: Role) -> u32 {
        self.scores.get(&role).copied().unwrap_or(0)
    }

    /// Entries in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = (Role, u32)> + '_ {
        self.scores.iter().map(|(&role, &score)| (role, score))
    }

    pub fn total(&self) -> u32 {
        self.scores.values().sum()
    }

    pub fn is_all_zero(&self) -> bool {
        self.scores.values().all(|&score| score == 0)
    }

    /// Entries with a score above zero, in catalog order.
    pub fn non_zero(&self) -> Vec<(Role, u32)> {
        self.iter().filter(|&(_, score)| score > 0).collect()
    }

    /// Every role, highest score first. Equal scores keep catalog order.
    pub fn ranked(&self) -> Vec<(Role, u32)> {
        let mut ranked = self.iter().collect::<Vec<_>>();
        // sort_by is stable, so ties stay in catalog order
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked
    }

    /// Highest and second highest roles, each `None` when its score is zero.
    pub fn primary_and_secondary(&self) -> (Option<Role>, Option<Role>) {
        let ranked = self.ranked();
        let pick = |position: usize| {
            ranked
                .get(position)
                .filter(|(_, score)| *score > 0)
                .map(|(role, _)| *role)
        };
        (pick(0), pick(1))
    }

    fn add(&mut self, role: Role, points: u32) {
        let entry = self.scores.entry(role).or_insert(0);
        *entry = entry.saturating_add(points);
    }
}

impl FromIterator<(Role, u32)> for ScoreMap {
    fn from_iter<T: IntoIterator<Item = (Role, u32)>>(iter: T) -> Self {
        let mut map = ScoreMap::default();
        for (role, score) in iter {
            map.scores.insert(role, score);
        }
        map
    }
}

impl From<BTreeMap<Role, u32>> for ScoreMap {
    fn from(scores: BTreeMap<Role, u32>) -> Self {
        scores.into_iter().collect()
    }
}

impl From<ScoreMap> for BTreeMap<Role, u32> {
    fn from(map: ScoreMap) -> Self {
        map.scores
    }
}

/// Turns answers into role scores, rankings and a narrative.
///
/// The engine trusts its input: point budgets are not re-checked here. Use
/// `Session` or `QuestionBank::validate_allocation` to reject malformed answers
/// before they reach `calculate_results`.
#[derive(Debug, Clone, Copy)]
pub struct ScoringEngine<'a> {
    bank: &'a QuestionBank,
}

impl<'a> ScoringEngine<'a> {
    pub fn new(bank: &'a QuestionBank) -> Self {
        Self { bank }
    }

    pub fn bank(&self) -> &'a QuestionBank {
        self.bank
    }

    /// Adds up the roles credited by each answer.
    ///
    /// Unknown question indices, unknown option keys and answers whose shape does not
    /// match the question are skipped, so partial sessions still score.
    pub fn calculate_results(&self, answers: &AnswerSet) -> ScoreMap {
        let mut scores = ScoreMap::default();
        for (&index, answer) in answers {
            let Some(question) = self.bank.get(index) else {
                debug!(index, "ignoring answer to unknown question");
                continue;
            };
            match (question.kind, answer) {
                (QuestionKind::SingleChoice, Answer::SingleChoice(key)) => {
                    match question.role_for(key) {
                        Some(role) => scores.add(role, 1),
                        None => debug!(index, key = %key, "ignoring unknown option"),
                    }
                }
                (QuestionKind::PointAllocation, Answer::PointAllocation(points)) => {
                    for (key, &value) in points {
                        match question.role_for(key) {
                            Some(role) => scores.add(role, value),
                            None => debug!(index, key = %key, "ignoring unknown option"),
                        }
                    }
                }
                (kind, _) => debug!(index, ?kind, "ignoring answer of the wrong kind"),
            }
        }
        scores
    }

    /// First `n` entries of the ranking. Zero scores are kept.
    pub fn primary_roles(&self, scores: &ScoreMap, n: usize) -> Vec<(Role, u32)> {
        scores.ranked().into_iter().take(n).collect()
    }

    /// Plain text summary of the dominant roles with advice keyed off their categories.
    pub fn interpretation(&self, scores: &ScoreMap) -> String {
        let ranked = scores.ranked();
        let top = ranked.first().map(|(_, score)| *score).unwrap_or(0);
        if top == 0 {
            return "No answers were scored, so no team role preference can be identified."
                .to_string();
        }

        let primary = ranked
            .iter()
            .filter(|(_, score)| *score == top)
            .map(|(role, _)| *role)
            .collect::<Vec<_>>();

        let mut lines = Vec::new();
        match primary.as_slice() {
            [role] => lines.push(format!(
                "Your primary team role is {} ({} points).",
                role.name(),
                top
            )),
            roles => lines.push(format!(
                "You share first place between {} ({} points each).",
                join_names(roles),
                top
            )),
        }
        for role in &primary {
            lines.push(format!("{}: {}", role.name(), role.description()));
        }

        if let Some((role, score)) = ranked
            .iter()
            .find(|(_, score)| *score > 0 && *score < top)
        {
            lines.push(format!(
                "Your supporting role is {} ({} points).",
                role.name(),
                score
            ));
        }

        let mut categories = primary
            .iter()
            .map(|role| role.category())
            .collect::<Vec<RoleCategory>>();
        categories.sort();
        categories.dedup();
        if categories.len() > 1 {
            lines.push(
                "Your strongest preferences span several orientations, which makes you \
                 adaptable across different team situations."
                    .to_string(),
            );
        }
        for category in categories {
            lines.push(format!(
                "As a mainly {} contributor: {}",
                category.label(),
                category.recommendation()
            ));
        }

        lines.join("\n")
    }
}

fn join_names(roles: &[Role]) -> String {
    match roles {
        [] => String::new(),
        [only] => only.name().to_string(),
        [init @ .., last] => format!(
            "{} and {}",
            init.iter().map(Role::name).collect::<Vec<_>>().join(", "),
            last.name()
        ),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{POINT_ALLOCATION, SINGLE_CHOICE};

    fn scores(pairs: &[(Role, u32)]) -> ScoreMap {
        pairs.iter().copied().collect()
    }

    #[test]
    fn test_empty_answers() {
        let engine = ScoringEngine::new(&POINT_ALLOCATION);
        let result = engine.calculate_results(&AnswerSet::new());
        assert_eq!(result.iter().count(), Role::ALL.len());
        assert!(result.is_all_zero());
    }

    #[test]
    fn test_single_choice() {
        let engine = ScoringEngine::new(&SINGLE_CHOICE);
        let answers: AnswerSet = [
            (0, Answer::choice("plant")),
            (1, Answer::choice("coordinator")),
            (2, Answer::choice("shaper")),
            (3, Answer::choice("plant")),
        ]
        .into_iter()
        .collect();
        let result = engine.calculate_results(&answers);
        assert_eq!(result.get(Role::Plant), 2);
        assert_eq!(result.get(Role::Coordinator), 1);
        assert_eq!(result.get(Role::Shaper), 1);
        assert_eq!(result.total(), 4);
        for role in [
            Role::ResourceInvestigator,
            Role::MonitorEvaluator,
            Role::Teamworker,
            Role::Implementer,
            Role::CompleterFinisher,
            Role::Specialist,
        ] {
            assert_eq!(result.get(role), 0);
        }
    }

    #[test]
    fn test_point_allocation() {
        let engine = ScoringEngine::new(&POINT_ALLOCATION);
        let answers: AnswerSet = [(
            0,
            Answer::allocation([
                ("a", 2),
                ("b", 1),
                ("c", 5),
                ("d", 1),
                ("e", 0),
                ("f", 0),
                ("g", 1),
                ("h", 0),
            ]),
        )]
        .into_iter()
        .collect();
        let result = engine.calculate_results(&answers);
        assert_eq!(result.get(Role::ResourceInvestigator), 2);
        assert_eq!(result.get(Role::Teamworker), 1);
        assert_eq!(result.get(Role::Plant), 5);
        assert_eq!(result.get(Role::Coordinator), 1);
        assert_eq!(result.get(Role::Implementer), 0);
        assert_eq!(result.get(Role::Shaper), 0);
        assert_eq!(result.get(Role::MonitorEvaluator), 1);
        assert_eq!(result.total(), 10);
    }

    #[test]
    fn test_full_allocation_totals_ten_per_question() {
        let engine = ScoringEngine::new(&POINT_ALLOCATION);
        let answers: AnswerSet = [
            (0, Answer::allocation([("a", 2), ("b", 1), ("c", 5), ("d", 1), ("g", 1)])),
            (1, Answer::allocation([("a", 1), ("b", 3), ("c", 2), ("d", 1), ("f", 2), ("g", 1)])),
            (2, Answer::allocation([("a", 2), ("b", 1), ("c", 1), ("d", 4), ("e", 1), ("f", 1)])),
        ]
        .into_iter()
        .collect();
        for (&index, answer) in &answers {
            if let Answer::PointAllocation(points) = answer {
                assert!(POINT_ALLOCATION.validate_allocation(index, points).is_ok());
            }
        }
        let result = engine.calculate_results(&answers);
        assert_eq!(result.total(), 30);
        assert_eq!(result.get(Role::Plant), 5 + 2 + 1 + 4);
    }

    #[test]
    fn test_permissive_input() {
        let engine = ScoringEngine::new(&POINT_ALLOCATION);
        let answers: AnswerSet = [
            (0, Answer::allocation([("a", 7), ("zz", 3)])),
            (1, Answer::choice("a")),
            (2, Answer::allocation([("h", 15)])),
            (42, Answer::allocation([("a", 10)])),
        ]
        .into_iter()
        .collect();
        let result = engine.calculate_results(&answers);
        assert_eq!(result.get(Role::ResourceInvestigator), 7);
        // over budget answers are not re-checked
        assert_eq!(result.get(Role::Implementer), 15);
        assert_eq!(result.total(), 22);
    }

    #[test]
    fn test_primary_roles() {
        let engine = ScoringEngine::new(&POINT_ALLOCATION);
        let map = scores(&[
            (Role::Plant, 15),
            (Role::ResourceInvestigator, 12),
            (Role::Coordinator, 8),
            (Role::Shaper, 5),
            (Role::MonitorEvaluator, 3),
            (Role::Teamworker, 2),
            (Role::Implementer, 1),
            (Role::CompleterFinisher, 1),
        ]);
        let top = engine.primary_roles(&map, DEFAULT_TOP_N);
        assert_eq!(
            top,
            vec![
                (Role::Plant, 15),
                (Role::ResourceInvestigator, 12),
                (Role::Coordinator, 8)
            ]
        );
        let all = engine.primary_roles(&map, 20);
        assert_eq!(all.len(), 9);
        assert!(all.windows(2).all(|pair| pair[0].1 >= pair[1].1));
        assert_eq!(all[6], (Role::Implementer, 1));
        assert_eq!(all[7], (Role::CompleterFinisher, 1));
        assert_eq!(all[8], (Role::Specialist, 0));
    }

    #[test]
    fn test_ties_follow_catalog_order() {
        let map = scores(&[(Role::Specialist, 4), (Role::Shaper, 4), (Role::Plant, 1)]);
        assert_eq!(
            map.ranked()[..3],
            [(Role::Shaper, 4), (Role::Specialist, 4), (Role::Plant, 1)]
        );
        assert_eq!(
            map.primary_and_secondary(),
            (Some(Role::Shaper), Some(Role::Specialist))
        );
    }

    #[test]
    fn test_primary_and_secondary_zero() {
        assert_eq!(ScoreMap::default().primary_and_secondary(), (None, None));
        let map = scores(&[(Role::Teamworker, 3)]);
        assert_eq!(map.primary_and_secondary(), (Some(Role::Teamworker), None));
    }

    #[test]
    fn test_interpretation_single_primary() {
        let engine = ScoringEngine::new(&SINGLE_CHOICE);
        let map = scores(&[(Role::Plant, 5), (Role::Shaper, 2)]);
        let text = engine.interpretation(&map);
        assert!(text.starts_with("Your primary team role is Plant (5 points)."));
        assert!(text.contains(Role::Plant.description()));
        assert!(text.contains("Your supporting role is Shaper (2 points)."));
        assert!(text.contains(RoleCategory::Thinking.recommendation()));
        assert!(!text.contains(RoleCategory::Action.recommendation()));
        assert_eq!(text, engine.interpretation(&map));
    }

    #[test]
    fn test_interpretation_tie() {
        let engine = ScoringEngine::new(&SINGLE_CHOICE);
        let map = scores(&[(Role::Plant, 3), (Role::Shaper, 3), (Role::Teamworker, 3)]);
        let text = engine.interpretation(&map);
        assert!(text.contains("You share first place between Plant, Shaper and Teamworker"));
        assert!(text.contains(RoleCategory::Action.recommendation()));
        assert!(text.contains(RoleCategory::People.recommendation()));
        assert!(text.contains(RoleCategory::Thinking.recommendation()));
        assert!(!text.contains("supporting role"));
    }

    #[test]
    fn test_interpretation_all_zero() {
        let engine = ScoringEngine::new(&SINGLE_CHOICE);
        let text = engine.interpretation(&ScoreMap::default());
        assert!(text.contains("No answers were scored"));
    }

    #[test]
    fn test_score_map_serde() {
        let map = scores(&[(Role::Plant, 2)]);
        let json = serde_json::to_string(&map).unwrap();
        assert!(json.starts_with(r#"{"plant":2,"resource_investigator":0"#));
        let partial: ScoreMap = serde_json::from_str(r#"{"SH": 4}"#).unwrap();
        assert_eq!(partial.get(Role::Shaper), 4);
        assert_eq!(partial.iter().count(), 9);
    }
}
