//! Qualifier Selector
//!
//! Qualification is standings-based: a conference granted k seats sends its
//! top-k ranked teams. Coefficients only decide how many seats each
//! conference gets and, later, the seeding.

use crate::bids::BidAllocation;
use crate::ruleset::Ruleset;
use coe_core::{
    BidType, CoeError, FormulaVersion, GameLedger, Qualifier, Result, SeasonYear, TeamId,
};
use std::collections::HashSet;
use tracing::{debug, info};

pub fn select_qualifiers(
    ledger: &GameLedger,
    season: SeasonYear,
    allocations: &[BidAllocation],
    ruleset: &Ruleset,
    formula_version: &FormulaVersion,
) -> Result<Vec<Qualifier>> {
    let seats: usize = allocations.iter().map(|allocation| allocation.seats() as usize).sum();
    if seats != ruleset.field_size {
        return Err(CoeError::config(format!(
            "ruleset {} grants {seats} seats to {} conferences, field size is {}",
            ruleset.id,
            allocations.len(),
            ruleset.field_size
        )));
    }

    let mut qualifiers = Vec::with_capacity(seats);
    let mut seen: HashSet<TeamId> = HashSet::new();
    for allocation in allocations {
        let standings = ledger.standings(season, allocation.conference);
        match standings.first() {
            Some(entry) if entry.rank == 1 => {}
            _ => {
                return Err(CoeError::invariant(format!(
                    "standings of {} in {season} have no rank-1 champion",
                    allocation.conference
                )))
            }
        }
        let wanted = allocation.seats() as usize;
        if standings.len() < wanted {
            return Err(CoeError::invariant(format!(
                "{} holds {wanted} seats but ranks only {} teams in {season}",
                allocation.conference,
                standings.len()
            )));
        }

        for entry in &standings[..wanted] {
            if !seen.insert(entry.team) {
                return Err(CoeError::invariant(format!(
                    "{} qualifies more than once in {season}",
                    entry.team
                )));
            }
            qualifiers.push(Qualifier {
                season,
                conference: allocation.conference,
                team: entry.team,
                conf_rank: entry.rank,
                tier: allocation.tier,
                bid_type: if entry.rank == 1 { BidType::Champion } else { BidType::AtLarge },
                formula_version: formula_version.clone(),
                ruleset: ruleset.id.clone(),
            });
        }
        debug!("{} (tier {}) sends {wanted} teams", allocation.conference, allocation.tier);
    }

    qualifiers.sort_by_key(|qualifier| (qualifier.tier, qualifier.conf_rank));
    info!("Selected {} qualifiers for {season} under {}", qualifiers.len(), ruleset.id);
    Ok(qualifiers)
}
