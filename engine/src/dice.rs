use std::fmt;
use std::str::FromStr;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{RulesError, RulesResult};

pub const MAX_DICE_COUNT: u32 = 100;
pub const MIN_SIDES: u32 = 2;
pub const MAX_SIDES: u32 = 1000;
pub const MAX_MODIFIER: i32 = 1000;

/// Anything that can produce uniform die faces.
pub trait RandomSource {
    /// A uniform value in `1..=sides`.
    fn roll_die(&mut self, sides: u32) -> u32;
}

impl<T: RandomSource + ?Sized> RandomSource for &mut T {
    fn roll_die(&mut self, sides: u32) -> u32 {
        (**self).roll_die(sides)
    }
}

#[derive(Debug, Clone)]
enum Backend {
    Seeded(ChaCha8Rng),
    Scripted { faces: Vec<u32>, cursor: usize },
}

/// The default random source: a seeded ChaCha8 stream, or a fixed script of
/// faces for exact-outcome tests.
#[derive(Debug, Clone)]
pub struct Dice {
    backend: Backend,
}

impl Dice {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            backend: Backend::Seeded(ChaCha8Rng::seed_from_u64(seed)),
        }
    }

    /// Replays `faces` in order, cycling when exhausted. Each face is clamped
    /// into the range of the die being rolled.
    pub fn from_scripted(faces: Vec<u32>) -> Self {
        Self {
            backend: Backend::Scripted { faces, cursor: 0 },
        }
    }
}

impl RandomSource for Dice {
    fn roll_die(&mut self, sides: u32) -> u32 {
        let sides = sides.max(1);
        match &mut self.backend {
            Backend::Seeded(rng) => rng.gen_range(1..=sides),
            Backend::Scripted { faces, cursor } => {
                if faces.is_empty() {
                    return 1;
                }
                let face = faces[*cursor % faces.len()];
                *cursor += 1;
                face.clamp(1, sides)
            }
        }
    }
}

/// `count`d`sides` + `modifier`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DiceSpec {
    pub count: u32,
    pub sides: u32,
    #[serde(default)]
    pub modifier: i32,
}

impl DiceSpec {
    pub fn new(count: u32, sides: u32, modifier: i32) -> RulesResult<Self> {
        let spec = Self {
            count,
            sides,
            modifier,
        };
        spec.validate()?;
        Ok(spec)
    }

    pub fn d20(modifier: i32) -> Self {
        Self {
            count: 1,
            sides: 20,
            modifier,
        }
    }

    pub fn validate(&self) -> RulesResult<()> {
        let reason = if !(1..=MAX_DICE_COUNT).contains(&self.count) {
            Some("count must be within 1..=100")
        } else if !(MIN_SIDES..=MAX_SIDES).contains(&self.sides) {
            Some("sides must be within 2..=1000")
        } else if !(-MAX_MODIFIER..=MAX_MODIFIER).contains(&self.modifier) {
            Some("modifier must be within -1000..=1000")
        } else {
            None
        };
        match reason {
            Some(reason) => Err(self.invalid(reason)),
            None => Ok(()),
        }
    }

    fn invalid(&self, reason: &'static str) -> RulesError {
        RulesError::InvalidDiceSpec {
            count: self.count,
            sides: self.sides,
            modifier: self.modifier,
            reason,
        }
    }

    /// Parses `XdY`, `dY`, `XdY+Z` and `XdY-Z` (case-insensitive, spaces ignored).
    pub fn parse(text: &str) -> RulesResult<Self> {
        let cleaned: String = text
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_lowercase();
        let bad = || RulesError::DiceNotation(text.to_string());

        let (count, rest) = cleaned.split_once('d').ok_or_else(bad)?;
        let count = if count.is_empty() {
            1
        } else {
            count.parse::<u32>().map_err(|_| bad())?
        };

        let (sides, modifier) = match rest.find(['+', '-']) {
            Some(idx) => {
                let (sides, modifier) = rest.split_at(idx);
                let modifier = modifier.parse::<i32>().map_err(|_| bad())?;
                (sides, modifier)
            }
            None => (rest, 0),
        };
        let sides = sides.parse::<u32>().map_err(|_| bad())?;

        Self::new(count, sides, modifier)
    }
}

impl fmt::Display for DiceSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}d{}", self.count, self.sides)?;
        if self.modifier != 0 {
            write!(f, "{:+}", self.modifier)?;
        }
        Ok(())
    }
}

impl FromStr for DiceSpec {
    type Err = RulesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// How many times to roll and which result to keep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case", tag = "kind", content = "n")]
pub enum RollStrategy {
    #[default]
    Normal,
    BestOfN(u8),
    WorstOfN(u8),
}

impl RollStrategy {
    pub const ADVANTAGE: RollStrategy = RollStrategy::BestOfN(2);
    pub const DISADVANTAGE: RollStrategy = RollStrategy::WorstOfN(2);

    pub fn roll_count(self) -> u32 {
        match self {
            RollStrategy::Normal => 1,
            RollStrategy::BestOfN(n) | RollStrategy::WorstOfN(n) => u32::from(n.max(1)),
        }
    }

    pub fn is_advantage(self) -> bool {
        matches!(self, RollStrategy::BestOfN(n) if n > 1)
    }

    pub fn is_disadvantage(self) -> bool {
        matches!(self, RollStrategy::WorstOfN(n) if n > 1)
    }

    /// Fold two vantage sources. Any advantage against any disadvantage
    /// cancels to `Normal`; like sources keep the larger pool.
    pub fn combine(self, other: RollStrategy) -> RollStrategy {
        use RollStrategy::*;
        match (self, other) {
            (BestOfN(_), WorstOfN(_)) | (WorstOfN(_), BestOfN(_)) => Normal,
            (Normal, x) | (x, Normal) => x,
            (BestOfN(a), BestOfN(b)) => BestOfN(a.max(b)),
            (WorstOfN(a), WorstOfN(b)) => WorstOfN(a.max(b)),
        }
    }

    fn select(self, draws: &[u32]) -> Option<u32> {
        match self {
            RollStrategy::Normal => draws.first().copied(),
            RollStrategy::BestOfN(_) => draws.iter().copied().max(),
            RollStrategy::WorstOfN(_) => draws.iter().copied().min(),
        }
    }
}

impl fmt::Display for RollStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RollStrategy::Normal => f.write_str("normal"),
            RollStrategy::BestOfN(2) => f.write_str("advantage"),
            RollStrategy::WorstOfN(2) => f.write_str("disadvantage"),
            RollStrategy::BestOfN(n) => write!(f, "best-of-{n}"),
            RollStrategy::WorstOfN(n) => write!(f, "worst-of-{n}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiceResult {
    /// Every draw in roll order, one per `RollStrategy::roll_count`.
    pub rolls: Vec<u32>,
    pub chosen_value: u32,
    pub modifier: i32,
    pub total: i32,
    pub is_natural_max: bool,
    pub is_natural_min: bool,
}

/// Roll under `strategy`. Each draw is the sum of `spec.count` dice (one for a
/// plain d20); the draw kept by the strategy decides the natural flags.
pub fn roll(
    spec: DiceSpec,
    strategy: RollStrategy,
    source: &mut impl RandomSource,
) -> RulesResult<DiceResult> {
    spec.validate()?;
    if let RollStrategy::BestOfN(0) | RollStrategy::WorstOfN(0) = strategy {
        return Err(spec.invalid("roll strategy needs at least one draw"));
    }

    let rolls: Vec<u32> = (0..strategy.roll_count())
        .map(|_| (0..spec.count).map(|_| source.roll_die(spec.sides)).sum())
        .collect();
    let chosen_value = strategy
        .select(&rolls)
        .ok_or_else(|| spec.invalid("no dice were drawn"))?;
    let total = chosen_value as i32 + spec.modifier;

    debug!(%spec, %strategy, ?rolls, chosen_value, total, "roll");
    Ok(DiceResult {
        is_natural_max: chosen_value == spec.count * spec.sides,
        is_natural_min: chosen_value == spec.count,
        rolls,
        chosen_value,
        modifier: spec.modifier,
        total,
    })
}

/// A plain sum of independent dice, e.g. damage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SumResult {
    pub rolls: Vec<u32>,
    pub modifier: i32,
    pub total: i32,
}

/// `count` dice of `spec.sides`, plus `spec.modifier` once. `count` may go up
/// to twice the usual dice limit so that critical hits can double any valid
/// damage expression.
pub fn roll_sum(
    spec: DiceSpec,
    count: u32,
    source: &mut impl RandomSource,
) -> RulesResult<SumResult> {
    spec.validate()?;
    if !(1..=MAX_DICE_COUNT * 2).contains(&count) {
        return Err(spec.invalid("summed dice count must be within 1..=200"));
    }
    let rolls: Vec<u32> = (0..count).map(|_| source.roll_die(spec.sides)).collect();
    let total = rolls.iter().sum::<u32>() as i32 + spec.modifier;
    debug!(%spec, count, ?rolls, total, "roll_sum");
    Ok(SumResult {
        rolls,
        modifier: spec.modifier,
        total,
    })
}

#[derive(Debug, Clone, Copy)]
pub struct CheckInput {
    pub dc: i32,
    pub modifier: i32,
    pub strategy: RollStrategy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckResult {
    pub roll: DiceResult,
    pub total: i32,
    pub dc: i32,
    pub passed: bool,
}

/// Roll a d20 under the strategy, add modifier, compare vs DC.
pub fn check(source: &mut impl RandomSource, input: CheckInput) -> RulesResult<CheckResult> {
    let roll = roll(DiceSpec::d20(input.modifier), input.strategy, source)?;
    let total = roll.total;
    Ok(CheckResult {
        roll,
        total,
        dc: input.dc,
        passed: total >= input.dc,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combine_cancels_opposites() {
        assert_eq!(
            RollStrategy::ADVANTAGE.combine(RollStrategy::DISADVANTAGE),
            RollStrategy::Normal
        );
        assert_eq!(
            RollStrategy::BestOfN(3).combine(RollStrategy::ADVANTAGE),
            RollStrategy::BestOfN(3)
        );
        assert_eq!(
            RollStrategy::Normal.combine(RollStrategy::DISADVANTAGE),
            RollStrategy::DISADVANTAGE
        );
    }

    #[test]
    fn scripted_faces_cycle_and_clamp() {
        let mut dice = Dice::from_scripted(vec![25, 3]);
        assert_eq!(dice.roll_die(20), 20);
        assert_eq!(dice.roll_die(20), 3);
        assert_eq!(dice.roll_die(6), 6);
    }
}
