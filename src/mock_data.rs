//! Placeholder enrichment attached to freshly searched candidates.
//!
//! The people-data vendor has no company metrics, investors or leadership, so
//! search results carry randomized stand-ins until the LLM enrichment runs.
//! Randomness comes from an [`Entropy`] source so tests can pin it.

use crate::models::{CompanyMetrics, InvestorRound, LeadershipProfile};
use uuid::Uuid;

/// Source of uniform floats in `[0, 1)`.
pub trait Entropy {
    fn next_f64(&mut self) -> f64;
}

/// Entropy drawn from random v4 UUIDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidEntropy;

impl Entropy for UuidEntropy {
    fn next_f64(&mut self) -> f64 {
        // Low 53 bits of a v4 UUID are random; version and variant bits sit above
        const MANTISSA: u32 = 53;
        let bits = Uuid::new_v4().as_u128() & ((1u128 << MANTISSA) - 1);
        bits as f64 / (1u64 << MANTISSA) as f64
    }
}

/// Replays a fixed sequence of floats, cycling when exhausted.
#[derive(Debug, Clone)]
pub struct SequenceEntropy {
    values: Vec<f64>,
    position: usize,
}

impl SequenceEntropy {
    pub fn new(values: Vec<f64>) -> Self {
        Self {
            values,
            position: 0,
        }
    }
}

impl Entropy for SequenceEntropy {
    fn next_f64(&mut self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        let value = self.values[self.position % self.values.len()];
        self.position += 1;
        value.clamp(0.0, 1.0 - f64::EPSILON)
    }
}

const STAGE_LADDER: &[&str] = &[
    "Seed", "Series A", "Series B", "Series C", "Series D", "Public",
];

/// Stages a company can have had when a candidate joined; biased early.
const JOINING_STAGES: usize = 3;

const ROUNDS: &[&str] = &["Seed", "Series A", "Series B", "Series C"];

const INVESTORS: &[&str] = &[
    "Y Combinator",
    "Sequoia Capital",
    "Andreessen Horowitz",
    "Accel",
    "Benchmark",
    "Greylock Partners",
    "Kleiner Perkins",
    "Tiger Global",
    "Lightspeed Venture",
    "NEA",
    "FirstMark Capital",
];

const LEADERSHIP_ROLES: &[(&str, &str)] = &[
    ("CEO & Co-founder", "Previously VP at Google"),
    ("CTO & Co-founder", "Previously Tech Lead at Meta"),
    ("VP of Engineering", "Previously Engineering Director at Amazon"),
    ("Chief Product Officer", "Previously Product Lead at Apple"),
    ("VP of Marketing", "Previously Marketing Director at Salesforce"),
];

const FIRST_NAMES: &[&str] = &[
    "Sarah", "Michael", "David", "Jennifer", "Robert", "Lisa", "Kevin", "Jessica",
];
const LAST_NAMES: &[&str] = &[
    "Chen", "Smith", "Johnson", "Brown", "Davis", "Wilson", "Taylor", "Lee",
];

/// Metrics at joining time: 20-119 employees, Seed to Series B, 5-34M funding.
pub fn company_metrics_when_joined(entropy: &mut impl Entropy) -> CompanyMetrics {
    let size = (entropy.next_f64() * 100.0).floor() as i64 + 20;
    let stage = STAGE_LADDER[random_index(entropy, JOINING_STAGES)].to_string();
    let funding = (entropy.next_f64() * 30.0).floor() + 5.0;
    CompanyMetrics {
        size,
        stage,
        funding,
    }
}

/// Metrics today: a joining-time sample scaled by `[1, 2)`, stage maybe advanced.
pub fn company_metrics_today(entropy: &mut impl Entropy) -> CompanyMetrics {
    let joined = company_metrics_when_joined(entropy);
    let size = (joined.size as f64 * (entropy.next_f64() + 1.0)).floor() as i64;
    let stage = next_stage(&joined.stage, entropy);
    let funding = (joined.funding * (entropy.next_f64() + 1.0)).floor();
    CompanyMetrics {
        size,
        stage,
        funding,
    }
}

/// Advances one rung up the stage ladder with 70 % probability.
///
/// Stages off the ladder, and "Public", stay as they are.
pub fn next_stage(stage: &str, entropy: &mut impl Entropy) -> String {
    match STAGE_LADDER.iter().position(|s| *s == stage) {
        Some(i) if i + 1 < STAGE_LADDER.len() => {
            if entropy.next_f64() < 0.7 {
                STAGE_LADDER[i + 1].to_string()
            } else {
                stage.to_string()
            }
        }
        _ => stage.to_string(),
    }
}

/// One to three rounds in ladder order, each with one to three distinct investors.
pub fn notable_investors(entropy: &mut impl Entropy) -> Vec<InvestorRound> {
    let rounds = random_index(entropy, 3) + 1;
    ROUNDS
        .iter()
        .take(rounds)
        .map(|round| {
            let count = random_index(entropy, 3) + 1;
            let mut investors = INVESTORS.to_vec();
            shuffle(&mut investors, entropy);
            InvestorRound {
                round: round.to_string(),
                investors: investors.into_iter().take(count).map(str::to_string).collect(),
            }
        })
        .collect()
}

/// Two or three leaders with distinct roles.
pub fn senior_leadership(entropy: &mut impl Entropy) -> Vec<LeadershipProfile> {
    let count = random_index(entropy, 2) + 2;
    let mut roles = LEADERSHIP_ROLES.to_vec();
    shuffle(&mut roles, entropy);

    roles
        .into_iter()
        .take(count)
        .map(|(role, background)| {
            let first = FIRST_NAMES[random_index(entropy, FIRST_NAMES.len())];
            let last = LAST_NAMES[random_index(entropy, LAST_NAMES.len())];
            LeadershipProfile {
                name: format!("{} {}", first, last),
                role: role.to_string(),
                background: background.to_string(),
            }
        })
        .collect()
}

/// Short random identifier for profiles the vendor returned without one.
pub fn random_id() -> String {
    Uuid::new_v4().simple().to_string()[..7].to_string()
}

fn random_index(entropy: &mut impl Entropy, len: usize) -> usize {
    ((entropy.next_f64() * len as f64).floor() as usize).min(len.saturating_sub(1))
}

/// Fisher-Yates.
fn shuffle<T>(items: &mut [T], entropy: &mut impl Entropy) {
    for i in (1..items.len()).rev() {
        let j = random_index(entropy, i + 1);
        items.swap(i, j);
    }
}
