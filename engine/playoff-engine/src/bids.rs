//! Bid Allocator

use crate::ruleset::Ruleset;
use coe_core::{ConferenceId, RollingCoefficient};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A conference's position in the coefficient ranking
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConferenceRank {
    pub conference: ConferenceId,
    /// 1-based rank
    pub tier: u32,
    pub total_points: f64,
    pub points_per_game: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BidAllocation {
    pub conference: ConferenceId,
    pub tier: u32,
    /// Bids granted by the tier table
    pub bids: u32,
}

impl BidAllocation {
    /// Qualifying seats: the champion's bid is unconditional
    pub fn seats(&self) -> u32 {
        self.bids.max(1)
    }
}

/// Rank conferences by rolling total, then PPG, then conference id.
///
/// The result does not depend on the order of the input rows.
pub fn rank_conferences<'a>(
    rows: impl IntoIterator<Item = (ConferenceId, &'a RollingCoefficient)>,
) -> Vec<ConferenceRank> {
    let mut ranked: Vec<ConferenceRank> = rows
        .into_iter()
        .map(|(conference, row)| ConferenceRank {
            conference,
            tier: 0,
            total_points: row.total_points,
            points_per_game: row.points_per_game,
        })
        .collect();
    ranked.sort_by(|a, b| {
        b.total_points
            .total_cmp(&a.total_points)
            .then_with(|| b.points_per_game.total_cmp(&a.points_per_game))
            .then_with(|| a.conference.cmp(&b.conference))
    });
    for (index, rank) in ranked.iter_mut().enumerate() {
        rank.tier = index as u32 + 1;
    }
    ranked
}

/// Bid count per ranked conference under a ruleset
pub fn allocate_bids(ranked: &[ConferenceRank], ruleset: &Ruleset) -> Vec<BidAllocation> {
    ranked
        .iter()
        .map(|rank| {
            let bids = ruleset.bids_for_tier(rank.tier);
            debug!("{} tier {} receives {} bids under {}", rank.conference, rank.tier, bids, ruleset.id);
            BidAllocation { conference: rank.conference, tier: rank.tier, bids }
        })
        .collect()
}
