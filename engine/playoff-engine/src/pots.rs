//! Pot Assigner
//!
//! Placement runs as three isolated steps over the qualifier list:
//!
//! 1. table lookup by (tier, seat) from the ruleset;
//! 2. the auxiliary bid adjustment, for rulesets that define one;
//! 3. pot balancing, for rulesets that request it.
//!
//! Byes come only from the table and must number exactly the ruleset's bye count.

use crate::ruleset::{AuxiliaryBidRule, Ruleset};
use crate::strength::StrengthTable;
use coe_core::{
    BidType, CoeError, ConferenceId, Placement, Pot, PotAssignment, Qualifier, Result, TeamId,
};
use std::collections::HashMap;
use tracing::{debug, info, warn};

pub struct PotAssigner<'a> {
    ruleset: &'a Ruleset,
}

impl<'a> PotAssigner<'a> {
    pub fn new(ruleset: &'a Ruleset) -> Self {
        Self { ruleset }
    }

    pub fn assign(
        &self,
        qualifiers: &[Qualifier],
        auxiliary_winner: Option<TeamId>,
        strengths: &StrengthTable,
    ) -> Result<Vec<PotAssignment>> {
        let mut assignments = self.table_assignment(qualifiers);
        self.check_byes(&assignments)?;

        match (self.ruleset.auxiliary_bid, auxiliary_winner) {
            (Some(rule), Some(winner)) => apply_auxiliary_bid(&mut assignments, qualifiers, winner, rule)?,
            (None, Some(winner)) => {
                warn!("Ruleset {} has no auxiliary bid rule; ignoring winner {winner}", self.ruleset.id)
            }
            _ => {}
        }

        if self.ruleset.balance_pots {
            balance_pots(&mut assignments, qualifiers, strengths)?;
        }
        self.check_byes(&assignments)?;

        let count = |pot: Pot| assignments.iter().filter(|row| row.pot == pot).count();
        info!(
            "Pots under {}: {} byes, {} in pot 1, {} in pot 2",
            self.ruleset.id,
            count(Pot::Bye),
            count(Pot::One),
            count(Pot::Two)
        );
        Ok(assignments)
    }

    /// Base placement straight from the ruleset table
    pub fn table_assignment(&self, qualifiers: &[Qualifier]) -> Vec<PotAssignment> {
        let mut seats: HashMap<ConferenceId, u32> = HashMap::new();
        qualifiers
            .iter()
            .map(|qualifier| {
                let seat = seats.entry(qualifier.conference).or_default();
                *seat += 1;
                PotAssignment {
                    season: qualifier.season,
                    team: qualifier.team,
                    conference: qualifier.conference,
                    pot: self.ruleset.pot_for(qualifier.tier, *seat),
                    placement: Placement::Table,
                    formula_version: qualifier.formula_version.clone(),
                    ruleset: qualifier.ruleset.clone(),
                }
            })
            .collect()
    }

    fn check_byes(&self, assignments: &[PotAssignment]) -> Result<()> {
        let byes = assignments.iter().filter(|row| row.pot == Pot::Bye).count();
        if byes != self.ruleset.bye_count {
            return Err(CoeError::config(format!(
                "ruleset {} places {byes} byes, exactly {} are required",
                self.ruleset.id, self.ruleset.bye_count
            )));
        }
        Ok(())
    }
}

/// Reroute pots for the winner of a secondary bid-granting tournament.
///
/// The winner is placed by its own conference tier (a bye is kept). When the
/// winner comes from one of the lower tiers, the champion of the conference
/// ranked at `promote_tier` moves from pot 2 to pot 1, even if that champion
/// is the winner itself.
pub fn apply_auxiliary_bid(
    assignments: &mut [PotAssignment],
    qualifiers: &[Qualifier],
    winner: TeamId,
    rule: AuxiliaryBidRule,
) -> Result<()> {
    let qualifier = qualifiers
        .iter()
        .find(|qualifier| qualifier.team == winner)
        .ok_or_else(|| CoeError::reference(format!("auxiliary bid winner {winner} is not in the field")))?;

    let winner_pot = if qualifier.tier <= rule.upper_tier_max { Pot::One } else { Pot::Two };
    if let Some(row) = assignments.iter_mut().find(|row| row.team == winner) {
        if row.pot != Pot::Bye && row.pot != winner_pot {
            debug!("Auxiliary winner {winner} moves from {} to {winner_pot}", row.pot);
            row.pot = winner_pot;
            row.placement = Placement::AuxiliaryWinner;
        }
    }

    if !(rule.lower_tier_min..=rule.lower_tier_max).contains(&qualifier.tier) {
        return Ok(());
    }
    let Some(champion) = qualifiers
        .iter()
        .find(|q| q.tier == rule.promote_tier && q.bid_type == BidType::Champion)
        .map(|q| q.team)
    else {
        warn!("No tier {} champion in the field; auxiliary promotion skipped", rule.promote_tier);
        return Ok(());
    };
    if let Some(row) = assignments.iter_mut().find(|row| row.team == champion && row.pot == Pot::Two) {
        info!("Promoting {champion}, champion of tier {}, to pot 1", rule.promote_tier);
        row.pot = Pot::One;
        row.placement = Placement::AuxiliaryPromotion;
    }
    Ok(())
}

/// Even out pot 1 and pot 2 by moving the strongest pot-2 team up or the
/// weakest pot-1 team down. Auxiliary placements are never moved.
pub fn balance_pots(
    assignments: &mut [PotAssignment],
    qualifiers: &[Qualifier],
    strengths: &StrengthTable,
) -> Result<()> {
    let order: HashMap<TeamId, (u32, u32)> =
        qualifiers.iter().map(|q| (q.team, (q.tier, q.conf_rank))).collect();
    let key = |row: &PotAssignment| -> Result<(f64, f64, u32, u32, TeamId)> {
        let strength = strengths.get(row.team)?;
        let (tier, rank) = order.get(&row.team).copied().unwrap_or((u32::MAX, u32::MAX));
        Ok((strength.total_points, strength.points_per_game, tier, rank, row.team))
    };
    // Stronger first: totals and PPG descending, tier/rank/id ascending
    let stronger = |a: &(f64, f64, u32, u32, TeamId), b: &(f64, f64, u32, u32, TeamId)| {
        b.0.total_cmp(&a.0)
            .then_with(|| b.1.total_cmp(&a.1))
            .then_with(|| (a.2, a.3, a.4).cmp(&(b.2, b.3, b.4)))
    };

    loop {
        let ones = assignments.iter().filter(|row| row.pot == Pot::One).count();
        let twos = assignments.iter().filter(|row| row.pot == Pot::Two).count();
        if ones == twos {
            return Ok(());
        }
        let (from, to) = if ones < twos { (Pot::Two, Pot::One) } else { (Pot::One, Pot::Two) };

        let mut candidates = Vec::new();
        for (index, row) in assignments.iter().enumerate() {
            let movable = matches!(row.placement, Placement::Table | Placement::Balanced);
            if row.pot == from && movable {
                candidates.push((key(row)?, index));
            }
        }
        candidates.sort_by(|a, b| stronger(&a.0, &b.0));
        let pick = if to == Pot::One { candidates.first() } else { candidates.last() };
        let Some((_, index)) = pick else {
            return Err(CoeError::config(format!("cannot balance pots: {ones} in pot 1, {twos} in pot 2")));
        };

        let row = &mut assignments[*index];
        debug!("Balancing: {} moves from {} to {to}", row.team, row.pot);
        row.pot = to;
        row.placement = Placement::Balanced;
    }
}
