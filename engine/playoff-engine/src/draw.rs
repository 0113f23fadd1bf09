//! Bracket Drawer
//!
//! Byes fill slots 1..=n in seeding order and take no part in the random
//! draw. Region i then receives one pot-1 team (slot n + i) and one pot-2
//! team (slot 2n + i), drawn without replacement from id-sorted pools with a
//! `ChaCha8Rng` seeded from the run's draw seed. A pick sharing a conference
//! with its region, or leaving the rest of the draw without a conflict-free
//! completion, is rejected and only that pick is redrawn.

use crate::strength::{host, seeding_order, StrengthTable};
use coe_core::{
    Bracket, BracketSlot, CoeError, ConferenceId, Pot, PotAssignment, Qualifier, Region, Result,
    RunKey, TeamId,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Largest pot the bitmask search supports
const MAX_POT_SIZE: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrawSettings {
    /// Rejected picks tolerated per slot before the draw gives up
    pub max_redraws: u32,
}

impl Default for DrawSettings {
    fn default() -> Self {
        Self { max_redraws: 16 }
    }
}

#[derive(Debug, Clone, Copy)]
struct Entrant {
    team: TeamId,
    conference: ConferenceId,
    conf_rank: u32,
}

/// Memoized search for a conflict-free completion of the remaining regions
struct Completion<'a> {
    byes: &'a [Entrant],
    pot1: &'a [Entrant],
    pot2: &'a [Entrant],
    memo: HashMap<(u32, u32), bool>,
}

impl<'a> Completion<'a> {
    fn new(byes: &'a [Entrant], pot1: &'a [Entrant], pot2: &'a [Entrant]) -> Self {
        Self { byes, pot1, pot2, memo: HashMap::new() }
    }

    /// Regions before `used1.count_ones()` are filled; can the rest be?
    fn possible(&mut self, used1: u32, used2: u32) -> bool {
        let (byes, pot1, pot2) = (self.byes, self.pot1, self.pot2);
        let region = used1.count_ones() as usize;
        if region == byes.len() {
            return true;
        }
        if let Some(known) = self.memo.get(&(used1, used2)) {
            return *known;
        }
        let bye = byes[region].conference;
        let mut found = false;
        'search: for (i, first) in pot1.iter().enumerate() {
            if used1 & (1 << i) != 0 || first.conference == bye {
                continue;
            }
            for (j, second) in pot2.iter().enumerate() {
                if used2 & (1 << j) != 0 || second.conference == bye || second.conference == first.conference {
                    continue;
                }
                if self.possible(used1 | (1 << i), used2 | (1 << j)) {
                    found = true;
                    break 'search;
                }
            }
        }
        self.memo.insert((used1, used2), found);
        found
    }

    /// Can region `region` take pot-1 entrant `i` and still complete?
    fn admits_first(&mut self, region: usize, used1: u32, used2: u32, i: usize) -> bool {
        let (byes, pot1, pot2) = (self.byes, self.pot1, self.pot2);
        let bye = byes[region].conference;
        let first = pot1[i].conference;
        if first == bye {
            return false;
        }
        pot2.iter().enumerate().any(|(j, second)| {
            used2 & (1 << j) == 0
                && second.conference != bye
                && second.conference != first
                && self.possible(used1 | (1 << i), used2 | (1 << j))
        })
    }

    /// Can region `region`, holding pot-1 entrant `i`, take pot-2 entrant `j`?
    fn admits_second(&mut self, region: usize, used1: u32, used2: u32, i: usize, j: usize) -> bool {
        let second = self.pot2[j].conference;
        second != self.byes[region].conference
            && second != self.pot1[i].conference
            && self.possible(used1 | (1 << i), used2 | (1 << j))
    }
}

pub struct BracketDrawer {
    settings: DrawSettings,
}

impl BracketDrawer {
    pub fn new(settings: DrawSettings) -> Self {
        Self { settings }
    }

    /// Draw the bracket for a playoff key.
    ///
    /// A pure function of (qualifiers, pots, strengths, seed).
    pub fn draw(
        &self,
        key: &RunKey,
        qualifiers: &[Qualifier],
        pots: &[PotAssignment],
        strengths: &StrengthTable,
        seed: u64,
    ) -> Result<Bracket> {
        let ruleset = key
            .ruleset
            .clone()
            .ok_or_else(|| CoeError::config(format!("bracket draw for {key} needs a ruleset")))?;
        let by_team: HashMap<TeamId, &Qualifier> = qualifiers.iter().map(|q| (q.team, q)).collect();

        let mut byes = Vec::new();
        let mut pot1 = Vec::new();
        let mut pot2 = Vec::new();
        for assignment in pots {
            let qualifier = by_team.get(&assignment.team).ok_or_else(|| {
                CoeError::reference(format!("{} holds a pot but is not a qualifier", assignment.team))
            })?;
            let entrant =
                Entrant { team: qualifier.team, conference: qualifier.conference, conf_rank: qualifier.conf_rank };
            match assignment.pot {
                Pot::Bye => byes.push(entrant),
                Pot::One => pot1.push(entrant),
                Pot::Two => pot2.push(entrant),
            }
        }

        let regions = byes.len();
        if regions == 0 || pot1.len() != regions || pot2.len() != regions {
            return Err(CoeError::config(format!(
                "draw needs equal byes and pots, got {} byes, {} in pot 1, {} in pot 2",
                regions,
                pot1.len(),
                pot2.len()
            )));
        }
        if regions > MAX_POT_SIZE {
            return Err(CoeError::config(format!("pots of {regions} exceed the supported {MAX_POT_SIZE}")));
        }

        let mut seeding_error = None;
        byes.sort_by(|a, b| match (strengths.get(a.team), strengths.get(b.team)) {
            (Ok(sa), Ok(sb)) => seeding_order((sa, a.conf_rank), (sb, b.conf_rank)),
            (Err(err), _) | (_, Err(err)) => {
                seeding_error.get_or_insert(err);
                a.team.cmp(&b.team)
            }
        });
        if let Some(err) = seeding_error {
            return Err(err);
        }
        pot1.sort_by_key(|entrant| entrant.team);
        pot2.sort_by_key(|entrant| entrant.team);

        let mut completion = Completion::new(&byes, &pot1, &pot2);
        if !completion.possible(0, 0) {
            return Err(CoeError::draw_exhausted(format!(
                "no conflict-free bracket exists for {key}"
            )));
        }

        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let (mut used1, mut used2) = (0u32, 0u32);
        let mut drawn = Vec::with_capacity(regions);
        for region in 0..regions {
            let first = self.pick(&mut rng, used1, pot1.len(), key, region, "pot 1", |i| {
                completion.admits_first(region, used1, used2, i)
            })?;
            let second = self.pick(&mut rng, used2, pot2.len(), key, region, "pot 2", |j| {
                completion.admits_second(region, used1, used2, first, j)
            })?;
            used1 |= 1 << first;
            used2 |= 1 << second;
            drawn.push((first, second));
        }

        let mut slots = Vec::with_capacity(regions * 3);
        let mut bracket_regions = Vec::with_capacity(regions);
        for (index, (bye, (first, second))) in byes.iter().zip(drawn).enumerate() {
            let (first, second) = (&pot1[first], &pot2[second]);
            let region = index as u32 + 1;
            for (offset, entrant, pot) in [(0, bye, Pot::Bye), (1, first, Pot::One), (2, second, Pot::Two)] {
                slots.push(BracketSlot {
                    season: key.season,
                    slot: (offset * regions + index) as u32 + 1,
                    region,
                    team: entrant.team,
                    pot,
                    draw_seed: seed,
                    formula_version: key.formula_version.clone(),
                    ruleset: ruleset.clone(),
                });
            }

            let strength = |entrant: &Entrant| strengths.get(entrant.team).map(|s| (s, entrant.conf_rank));
            let (b, f, s) = (strength(bye)?, strength(first)?, strength(second)?);
            if bye.conference == first.conference
                || bye.conference == second.conference
                || first.conference == second.conference
            {
                return Err(CoeError::invariant(format!("region {region} of {key} pairs conference rivals")));
            }
            bracket_regions.push(Region {
                index: region,
                bye: bye.team,
                pot1: first.team,
                pot2: second.team,
                opening: host(f, s),
                bye_vs_pot1: host(b, f),
                bye_vs_pot2: host(b, s),
            });
        }
        slots.sort_by_key(|slot| slot.slot);

        info!("Drew bracket for {key} with seed {seed}: {} slots in {regions} regions", slots.len());
        Ok(Bracket { draw_seed: seed, slots, regions: bracket_regions })
    }

    /// Draw one index from the unused part of a pool, redrawing rejected picks
    #[allow(clippy::too_many_arguments)]
    fn pick<F>(
        &self,
        rng: &mut ChaCha8Rng,
        used: u32,
        pool: usize,
        key: &RunKey,
        region: usize,
        pot: &str,
        mut admits: F,
    ) -> Result<usize>
    where
        F: FnMut(usize) -> bool,
    {
        let mut candidates: Vec<usize> = (0..pool).filter(|i| used & (1u32 << *i) == 0).collect();
        let mut redraws = 0;
        loop {
            if candidates.is_empty() {
                return Err(CoeError::draw_exhausted(format!(
                    "{key}: no admissible {pot} team left for region {}",
                    region + 1
                )));
            }
            let candidate = candidates.remove(rng.gen_range(0..candidates.len()));
            if admits(candidate) {
                debug!("Region {}: {pot} pick {candidate} accepted after {redraws} redraws", region + 1);
                return Ok(candidate);
            }
            redraws += 1;
            warn!("Region {}: {pot} pick {candidate} rejected (redraw {redraws})", region + 1);
            if redraws > self.settings.max_redraws {
                return Err(CoeError::draw_exhausted(format!(
                    "{key}: region {} exceeded {} redraws in {pot}",
                    region + 1,
                    self.settings.max_redraws
                )));
            }
        }
    }
}
