//! Game Ledger View
//!
//! A validated, indexed, read-only view over one closed [`Dataset`]. All team
//! references are resolved to canonical ids when the ledger is built, so
//! downstream stages never see names or aliases.

use crate::directory::TeamDirectory;
use crate::error::{CoeError, Result};
use crate::ids::{ConferenceId, SeasonYear, TeamId};
use crate::model::{Conference, Dataset, Game, Membership, Season, StandingsEntry};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct GameLedger {
    directory: TeamDirectory,
    conferences: BTreeMap<ConferenceId, Conference>,
    seasons: BTreeMap<SeasonYear, Season>,
    memberships: HashMap<(TeamId, SeasonYear), Membership>,
    games: BTreeMap<SeasonYear, Vec<Game>>,
    /// Entries per (season, conference), sorted by rank
    standings: BTreeMap<(SeasonYear, ConferenceId), Vec<StandingsEntry>>,
    final_rankings: HashMap<(SeasonYear, TeamId), u32>,
}

impl GameLedger {
    /// Resolve and validate a dataset into a ledger
    pub fn from_dataset(dataset: Dataset) -> Result<Self> {
        let Dataset { teams, conferences, seasons, memberships, games, standings, final_rankings } =
            dataset;

        let directory = TeamDirectory::from_teams(teams)?;

        let mut conference_map = BTreeMap::new();
        for conference in conferences {
            let id = conference.id;
            if conference_map.insert(id, conference).is_some() {
                return Err(CoeError::invariant(format!("duplicate conference {id}")));
            }
        }

        let mut season_map = BTreeMap::new();
        for season in seasons {
            let year = season.year;
            if season_map.insert(year, season).is_some() {
                return Err(CoeError::invariant(format!("duplicate season {year}")));
            }
        }

        let mut membership_map = HashMap::new();
        for record in memberships {
            let team = directory.resolve(&record.team)?;
            if !conference_map.contains_key(&record.conference) {
                return Err(CoeError::reference(format!(
                    "membership of {team} in {} references unknown {}",
                    record.season, record.conference
                )));
            }
            let membership =
                Membership { team, season: record.season, conference: record.conference, fbs: record.fbs };
            if membership_map.insert((team, record.season), membership).is_some() {
                return Err(CoeError::invariant(format!(
                    "{team} has more than one membership in season {}",
                    record.season
                )));
            }
        }

        let mut game_map: BTreeMap<SeasonYear, Vec<Game>> = BTreeMap::new();
        let mut game_ids = HashSet::new();
        for record in games {
            if !season_map.contains_key(&record.season) {
                return Err(CoeError::reference(format!(
                    "game {} references unknown season {}",
                    record.id, record.season
                )));
            }
            if !game_ids.insert(record.id) {
                return Err(CoeError::invariant(format!("duplicate game id {}", record.id)));
            }
            let home = directory.resolve(&record.home)?;
            let away = directory.resolve(&record.away)?;
            if home == away {
                return Err(CoeError::invariant(format!("game {} pits {home} against itself", record.id)));
            }
            game_map.entry(record.season).or_default().push(Game {
                id: record.id,
                season: record.season,
                home,
                away,
                home_score: record.home_score,
                away_score: record.away_score,
                overtime: record.overtime,
                phase: record.phase,
                neutral_site: record.neutral_site,
            });
        }
        for season_games in game_map.values_mut() {
            season_games.sort_by_key(|game| game.id);
        }

        let mut standings_map: BTreeMap<(SeasonYear, ConferenceId), Vec<StandingsEntry>> =
            BTreeMap::new();
        for record in standings {
            if !conference_map.contains_key(&record.conference) {
                return Err(CoeError::reference(format!(
                    "standings for {} reference unknown {}",
                    record.season, record.conference
                )));
            }
            let team = directory.resolve(&record.team)?;
            standings_map.entry((record.season, record.conference)).or_default().push(
                StandingsEntry { season: record.season, conference: record.conference, team, rank: record.rank },
            );
        }
        for ((season, conference), entries) in standings_map.iter_mut() {
            entries.sort_by_key(|entry| (entry.rank, entry.team));
            let mut ranks = HashSet::new();
            let mut teams = HashSet::new();
            for entry in entries.iter() {
                if entry.rank == 0 || !ranks.insert(entry.rank) {
                    return Err(CoeError::invariant(format!(
                        "standings of {conference} in {season} hold rank {} more than once or as zero",
                        entry.rank
                    )));
                }
                if !teams.insert(entry.team) {
                    return Err(CoeError::invariant(format!(
                        "{} appears twice in the standings of {conference} in {season}",
                        entry.team
                    )));
                }
            }
        }

        let mut ranking_map = HashMap::new();
        for record in final_rankings {
            let team = directory.resolve(&record.team)?;
            ranking_map.insert((record.season, team), record.rank);
        }

        info!(
            "Game ledger loaded: {} teams, {} conferences, {} seasons, {} games",
            directory.len(),
            conference_map.len(),
            season_map.len(),
            game_ids.len()
        );

        Ok(Self {
            directory,
            conferences: conference_map,
            seasons: season_map,
            memberships: membership_map,
            games: game_map,
            standings: standings_map,
            final_rankings: ranking_map,
        })
    }

    pub fn directory(&self) -> &TeamDirectory {
        &self.directory
    }

    pub fn conference(&self, id: ConferenceId) -> Result<&Conference> {
        self.conferences.get(&id).ok_or_else(|| CoeError::reference(format!("unknown {id}")))
    }

    pub fn conferences(&self) -> impl Iterator<Item = &Conference> {
        self.conferences.values()
    }

    pub fn season(&self, year: SeasonYear) -> Option<&Season> {
        self.seasons.get(&year)
    }

    /// Present in the ledger and not excluded as irregular
    pub fn is_scorable(&self, year: SeasonYear) -> bool {
        self.seasons.get(&year).is_some_and(|season| !season.excluded)
    }

    /// Scorable seasons in the trailing window of `span` years ending at `end`
    pub fn window_seasons(&self, end: SeasonYear, span: u32) -> Vec<SeasonYear> {
        let start = end - span.saturating_sub(1) as SeasonYear;
        let seasons: Vec<SeasonYear> = self
            .seasons
            .range(start..=end)
            .filter(|(_, season)| !season.excluded)
            .map(|(year, _)| *year)
            .collect();
        debug!("Window [{start}, {end}] covers seasons {:?}", seasons);
        seasons
    }

    /// Membership at time of play; a missing record is never guessed
    pub fn membership(&self, team: TeamId, season: SeasonYear) -> Result<&Membership> {
        self.memberships
            .get(&(team, season))
            .ok_or(CoeError::MembershipGap { team, season })
    }

    pub fn games(&self, season: SeasonYear) -> &[Game] {
        self.games.get(&season).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Standings of one conference, ordered by rank
    pub fn standings(&self, season: SeasonYear, conference: ConferenceId) -> &[StandingsEntry] {
        self.standings.get(&(season, conference)).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn final_rank(&self, season: SeasonYear, team: TeamId) -> Option<u32> {
        self.final_rankings.get(&(season, team)).copied()
    }
}
