use crate::pattern::PatternSet;
use num_bigint::BigUint;
use num_traits::{ToPrimitive, Zero};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::fmt;

/// A probability in hundredths of a percent (10000 == 100.00%)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Rate(u64);

impl Rate {
    pub const ZERO: Rate = Rate(0);
    pub const CERTAIN: Rate = Rate(10_000);

    pub fn from_basis_points(basis_points: u64) -> Self {
        Rate(basis_points)
    }

    pub fn basis_points(&self) -> u64 {
        self.0
    }

    /// `count / total`, truncated to two decimals of a percent
    pub fn floor_ratio(count: &BigUint, total: &BigUint) -> Self {
        if total.is_zero() {
            return Rate::ZERO;
        }
        let scaled = count * 10_000u32 / total;
        Rate(scaled.to_u64().unwrap_or(u64::MAX))
    }

    /// `hits / trials`, rounded half-up to two decimals of a percent
    pub fn rounded_ratio(hits: u64, trials: u64) -> Self {
        if trials == 0 {
            return Rate::ZERO;
        }
        let scaled = (hits as u128 * 20_000 + trials as u128) / (2 * trials as u128);
        Rate(scaled as u64)
    }

    pub fn as_percent(&self) -> f64 {
        self.0 as f64 / 100.0
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // pad() so width and alignment flags apply to the whole number
        f.pad(&format!("{}.{:02}", self.0 / 100, self.0 % 100))
    }
}

impl Serialize for Rate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateEntry {
    pub id: String,
    pub rate: Rate,
}

/// Rates keyed by id, kept in descending-rate order (ties keep input order)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RateTable(Vec<RateEntry>);

impl RateTable {
    pub fn from_unsorted(entries: Vec<RateEntry>) -> Self {
        let mut entries = entries;
        entries.sort_by(|a, b| b.rate.cmp(&a.rate));
        RateTable(entries)
    }

    pub fn get(&self, id: &str) -> Option<Rate> {
        self.0.iter().find(|e| e.id == id).map(|e| e.rate)
    }

    pub fn entries(&self) -> &[RateEntry] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for RateTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for entry in &self.0 {
            map.serialize_entry(&entry.id, &entry.rate)?;
        }
        map.end()
    }
}

/// Which engine produced a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineMode {
    Exact,
    Simulation,
}

impl fmt::Display for EngineMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact => write!(f, "exact"),
            Self::Simulation => write!(f, "simulation"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationResult {
    pub overall_probability: Rate,
    pub pattern_success_rates: RateTable,
    pub label_success_rates: RateTable,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<EngineMode>,
}

impl CalculationResult {
    /// Assemble a result from per-pattern and per-label rates given in the
    /// set's own order
    pub fn from_rates(
        set: &PatternSet,
        overall: Rate,
        pattern_rates: &[Rate],
        label_rates: &[Rate],
        mode: EngineMode,
    ) -> Self {
        let patterns = set
            .patterns()
            .iter()
            .zip(pattern_rates)
            .map(|(p, &rate)| RateEntry { id: p.id.clone(), rate })
            .collect();
        let labels = set
            .labels()
            .iter()
            .zip(label_rates)
            .map(|(l, &rate)| RateEntry { id: l.id.clone(), rate })
            .collect();

        CalculationResult {
            overall_probability: overall,
            pattern_success_rates: RateTable::from_unsorted(patterns),
            label_success_rates: RateTable::from_unsorted(labels),
            mode: Some(mode),
        }
    }

    /// Every pattern and label at 0.00
    pub fn zero(set: &PatternSet, mode: EngineMode) -> Self {
        let patterns = vec![Rate::ZERO; set.patterns().len()];
        let labels = vec![Rate::ZERO; set.labels().len()];
        Self::from_rates(set, Rate::ZERO, &patterns, &labels, mode)
    }
}
