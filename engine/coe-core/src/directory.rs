use crate::error::{CoeError, Result};
use crate::ids::TeamId;
use crate::model::{Team, TeamRef};
use std::collections::{BTreeMap, HashMap};

/// Team Directory - canonical team identities and alias resolution
///
/// Display names and aliases resolve many-to-one onto a canonical id.
/// Lookups ignore case and surrounding/duplicated whitespace.
#[derive(Debug, Clone, Default)]
pub struct TeamDirectory {
    /// Map from team ID to Team
    teams: BTreeMap<TeamId, Team>,

    /// Map from normalized name or alias to team ID
    by_name: HashMap<String, TeamId>,
}

fn normalize(name: &str) -> String {
    name.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

impl TeamDirectory {
    /// Build a directory, rejecting duplicate ids and ambiguous names
    pub fn from_teams(teams: Vec<Team>) -> Result<Self> {
        let mut directory = Self::default();
        for team in teams {
            if directory.teams.contains_key(&team.id) {
                return Err(CoeError::invariant(format!("duplicate team id {}", team.id)));
            }
            for name in std::iter::once(&team.name).chain(team.aliases.iter()) {
                let key = normalize(name);
                if key.is_empty() {
                    return Err(CoeError::invariant(format!("{} has an empty name or alias", team.id)));
                }
                match directory.by_name.get(&key) {
                    Some(existing) if *existing != team.id => {
                        return Err(CoeError::invariant(format!(
                            "name '{name}' maps to both {existing} and {}",
                            team.id
                        )));
                    }
                    _ => {
                        directory.by_name.insert(key, team.id);
                    }
                }
            }
            directory.teams.insert(team.id, team);
        }
        Ok(directory)
    }

    /// Resolve a display name or alias to its canonical id
    pub fn resolve_name(&self, name: &str) -> Result<TeamId> {
        self.by_name
            .get(&normalize(name))
            .copied()
            .ok_or_else(|| CoeError::reference(format!("unknown team name '{name}'")))
    }

    pub fn resolve(&self, team: &TeamRef) -> Result<TeamId> {
        match team {
            TeamRef::Id(id) if self.teams.contains_key(id) => Ok(*id),
            TeamRef::Id(id) => Err(CoeError::reference(format!("unknown team id {}", id.0))),
            TeamRef::Name(name) => self.resolve_name(name),
        }
    }

    pub fn get(&self, id: TeamId) -> Option<&Team> {
        self.teams.get(&id)
    }

    pub fn contains(&self, id: TeamId) -> bool {
        self.teams.contains_key(&id)
    }

    /// Display name, falling back to the id for unknown teams
    pub fn display_name(&self, id: TeamId) -> String {
        self.teams.get(&id).map(|team| team.name.clone()).unwrap_or_else(|| id.to_string())
    }

    pub fn len(&self) -> usize {
        self.teams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.teams.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Team> {
        self.teams.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn team(id: u32, name: &str, aliases: &[&str]) -> Team {
        Team {
            id: TeamId(id),
            name: name.to_string(),
            aliases: aliases.iter().map(|a| a.to_string()).collect(),
        }
    }

    #[test]
    fn test_alias_resolution_is_many_to_one() {
        let directory = TeamDirectory::from_teams(vec![
            team(1, "Ohio State", &["OSU", "Ohio St."]),
            team(2, "Michigan", &[]),
        ])
        .unwrap();

        assert_eq!(directory.resolve_name("ohio  state").unwrap(), TeamId(1));
        assert_eq!(directory.resolve_name(" osu ").unwrap(), TeamId(1));
        assert_eq!(directory.resolve_name("Ohio St.").unwrap(), TeamId(1));
        assert_eq!(directory.resolve(&TeamRef::Id(TeamId(2))).unwrap(), TeamId(2));
    }

    #[test]
    fn test_unknown_reference_is_reference_error() {
        let directory = TeamDirectory::from_teams(vec![team(1, "Ohio State", &[])]).unwrap();

        assert!(matches!(directory.resolve_name("Akron"), Err(CoeError::Reference(_))));
        assert!(matches!(directory.resolve(&TeamRef::Id(TeamId(9))), Err(CoeError::Reference(_))));
    }

    #[test]
    fn test_ambiguous_alias_is_rejected() {
        let result = TeamDirectory::from_teams(vec![
            team(1, "Miami (FL)", &["Miami"]),
            team(2, "Miami (OH)", &["Miami"]),
        ]);

        assert!(matches!(result, Err(CoeError::InvariantViolation(_))));
    }

    #[test]
    fn test_duplicate_team_id_is_rejected() {
        let result = TeamDirectory::from_teams(vec![team(1, "A", &[]), team(1, "B", &[])]);

        assert!(matches!(result, Err(CoeError::InvariantViolation(_))));
    }
}
