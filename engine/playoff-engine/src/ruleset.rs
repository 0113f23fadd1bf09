//! Ruleset tables
//!
//! A ruleset is data: tier → bid count and tier × seat → pot. New rulesets
//! are added to a [`RulesetBook`]; no stage branches on a ruleset name.

use coe_core::{CoeError, Pot, Result, RulesetId, DEFAULT_BYE_COUNT, DEFAULT_FIELD_SIZE};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Bids and seat pots for an inclusive range of conference tiers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierRule {
    pub from: u32,
    pub to: u32,
    pub bids: u32,
    /// Pot of each seat, seat 1 being the conference champion
    pub seats: Vec<Pot>,
}

impl TierRule {
    pub fn new(from: u32, to: u32, seats: &[Pot]) -> Self {
        Self { from, to, bids: seats.len() as u32, seats: seats.to_vec() }
    }

    fn covers(&self, tier: u32) -> bool {
        (self.from..=self.to).contains(&tier)
    }

    fn span(&self) -> u32 {
        self.to - self.from + 1
    }
}

/// Placement rule for the winner of a secondary bid-granting tournament
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuxiliaryBidRule {
    /// Winners from tiers up to this one are placed in pot 1, others in pot 2
    pub upper_tier_max: u32,
    /// Winners from tiers in `lower_tier_min..=lower_tier_max` trigger the promotion
    pub lower_tier_min: u32,
    pub lower_tier_max: u32,
    /// Tier whose conference champion moves from pot 2 to pot 1
    pub promote_tier: u32,
}

fn default_field_size() -> usize {
    DEFAULT_FIELD_SIZE
}

fn default_bye_count() -> usize {
    DEFAULT_BYE_COUNT
}

fn default_untiered_bids() -> u32 {
    1
}

fn default_overflow_pot() -> Pot {
    Pot::Two
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ruleset {
    pub id: RulesetId,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_field_size")]
    pub field_size: usize,
    #[serde(default = "default_bye_count")]
    pub bye_count: usize,
    pub tiers: Vec<TierRule>,
    /// Bids of conferences ranked below every tier rule
    #[serde(default = "default_untiered_bids")]
    pub untiered_bids: u32,
    /// Pot of seats not covered by a tier's seat table
    #[serde(default = "default_overflow_pot")]
    pub overflow_pot: Pot,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auxiliary_bid: Option<AuxiliaryBidRule>,
    /// Even out pot 1 and pot 2 after the table placement
    #[serde(default)]
    pub balance_pots: bool,
}

impl Ruleset {
    pub fn year1() -> Self {
        use Pot::{Bye, One, Two};
        Self {
            id: RulesetId::new("year1"),
            description: "first-year structure".to_string(),
            field_size: DEFAULT_FIELD_SIZE,
            bye_count: DEFAULT_BYE_COUNT,
            tiers: vec![
                TierRule::new(1, 2, &[Bye, Bye, One, Two]),
                TierRule::new(3, 4, &[Bye, One, One, Two]),
                TierRule::new(5, 5, &[Bye, One]),
                TierRule::new(6, 6, &[Bye, One]),
                TierRule::new(7, 10, &[Two]),
            ],
            untiered_bids: 1,
            overflow_pot: Two,
            auxiliary_bid: None,
            balance_pots: true,
        }
    }

    /// year1 with tiers 5-6 reallocated and the auxiliary bid placement
    pub fn year2() -> Self {
        use Pot::{Bye, One, Two};
        Self {
            id: RulesetId::new("year2"),
            description: "second-year structure with auxiliary bid placement".to_string(),
            tiers: vec![
                TierRule::new(1, 2, &[Bye, Bye, One, Two]),
                TierRule::new(3, 4, &[Bye, One, One, Two]),
                TierRule::new(5, 5, &[Bye, One, Two]),
                TierRule::new(6, 6, &[Bye]),
                TierRule::new(7, 10, &[Two]),
            ],
            auxiliary_bid: Some(AuxiliaryBidRule {
                upper_tier_max: 6,
                lower_tier_min: 7,
                lower_tier_max: 10,
                promote_tier: 7,
            }),
            ..Self::year1()
        }
    }

    fn rule(&self, tier: u32) -> Option<&TierRule> {
        self.tiers.iter().find(|rule| rule.covers(tier))
    }

    /// Bid count of a conference tier; may be zero for a defective table
    pub fn bids_for_tier(&self, tier: u32) -> u32 {
        self.rule(tier).map(|rule| rule.bids).unwrap_or(self.untiered_bids)
    }

    /// Table pot for the qualifier holding `seat` in a conference of `tier`
    pub fn pot_for(&self, tier: u32, seat: u32) -> Pot {
        self.rule(tier)
            .and_then(|rule| rule.seats.get(seat.saturating_sub(1) as usize))
            .copied()
            .unwrap_or(self.overflow_pot)
    }

    /// Number of tiers the table defines explicitly
    pub fn tier_count(&self) -> u32 {
        self.tiers.iter().map(|rule| rule.to).max().unwrap_or(0)
    }

    /// Check the table against the fixed field size and bye count
    pub fn validate(&self) -> Result<()> {
        let id = &self.id;
        if self.field_size == 0 || self.bye_count == 0 || self.bye_count >= self.field_size {
            return Err(CoeError::config(format!(
                "ruleset {id}: bye count {} must be positive and below field size {}",
                self.bye_count, self.field_size
            )));
        }

        let mut rules: Vec<&TierRule> = self.tiers.iter().collect();
        rules.sort_by_key(|rule| rule.from);
        let mut expected = 1;
        for rule in &rules {
            if rule.from != expected || rule.to < rule.from {
                return Err(CoeError::config(format!(
                    "ruleset {id}: tier rules must cover 1..={} contiguously, found {}..={}",
                    self.tier_count(),
                    rule.from,
                    rule.to
                )));
            }
            if rule.seats.len() != rule.bids as usize {
                return Err(CoeError::config(format!(
                    "ruleset {id}: tiers {}..={} grant {} bids but define {} seats",
                    rule.from,
                    rule.to,
                    rule.bids,
                    rule.seats.len()
                )));
            }
            expected = rule.to + 1;
        }

        let bids: u32 = rules.iter().map(|rule| rule.bids * rule.span()).sum();
        if bids as usize != self.field_size {
            return Err(CoeError::config(format!(
                "ruleset {id}: tiers grant {bids} bids for a field of {}",
                self.field_size
            )));
        }
        let byes: usize = rules
            .iter()
            .map(|rule| rule.seats.iter().filter(|pot| **pot == Pot::Bye).count() * rule.span() as usize)
            .sum();
        if byes != self.bye_count {
            return Err(CoeError::config(format!(
                "ruleset {id}: tiers place {byes} byes, expected {}",
                self.bye_count
            )));
        }
        if self.overflow_pot == Pot::Bye {
            return Err(CoeError::config(format!("ruleset {id}: overflow seats cannot hold a bye")));
        }
        if let Some(rule) = &self.auxiliary_bid {
            if rule.upper_tier_max >= rule.lower_tier_min {
                return Err(CoeError::config(format!(
                    "ruleset {id}: auxiliary upper tier {} must be below lower tier {}",
                    rule.upper_tier_max, rule.lower_tier_min
                )));
            }
            if rule.lower_tier_max < rule.lower_tier_min {
                return Err(CoeError::config(format!(
                    "ruleset {id}: auxiliary lower tiers {}..={} are empty",
                    rule.lower_tier_min, rule.lower_tier_max
                )));
            }
            if rule.promote_tier <= rule.upper_tier_max {
                return Err(CoeError::config(format!(
                    "ruleset {id}: promoted tier {} must be below upper tier {}",
                    rule.promote_tier, rule.upper_tier_max
                )));
            }
        }
        if self.balance_pots && (self.field_size - self.bye_count) % 2 != 0 {
            return Err(CoeError::config(format!(
                "ruleset {id}: {} drawn teams cannot be balanced into two pots",
                self.field_size - self.bye_count
            )));
        }
        Ok(())
    }
}

/// Registry of known rulesets
#[derive(Debug, Clone)]
pub struct RulesetBook {
    rulesets: BTreeMap<RulesetId, Ruleset>,
}

impl RulesetBook {
    /// The built-in `year1` and `year2` rulesets
    pub fn builtin() -> Self {
        let rulesets =
            [Ruleset::year1(), Ruleset::year2()].into_iter().map(|r| (r.id.clone(), r)).collect();
        Self { rulesets }
    }

    pub fn from_rulesets(rulesets: Vec<Ruleset>) -> Result<Self> {
        let mut book = Self { rulesets: BTreeMap::new() };
        for ruleset in rulesets {
            book.insert(ruleset)?;
        }
        Ok(book)
    }

    pub fn insert(&mut self, ruleset: Ruleset) -> Result<()> {
        ruleset.validate()?;
        if self.rulesets.contains_key(&ruleset.id) {
            return Err(CoeError::config(format!("ruleset {} is defined twice", ruleset.id)));
        }
        self.rulesets.insert(ruleset.id.clone(), ruleset);
        Ok(())
    }

    pub fn get(&self, id: &RulesetId) -> Result<&Ruleset> {
        self.rulesets.get(id).ok_or_else(|| CoeError::config(format!("unknown ruleset '{id}'")))
    }

    pub fn ids(&self) -> impl Iterator<Item = &RulesetId> {
        self.rulesets.keys()
    }
}

impl Default for RulesetBook {
    fn default() -> Self {
        Self::builtin()
    }
}
