use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

use crate::schedule::{Layer, parameters::ParameterTable};

// ================================================================================================
// Layer Values
// ================================================================================================

/// One value per contact layer, serialized under the layer codes `h`, `s`, `w`, `c`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LayerValues {
    #[serde(rename = "h")]
    pub household: f64,
    #[serde(rename = "s")]
    pub school: f64,
    #[serde(rename = "w")]
    pub work: f64,
    #[serde(rename = "c")]
    pub casual: f64,
}

impl LayerValues {
    pub fn get(&self, layer: Layer) -> f64 {
        match layer {
            Layer::Household => self.household,
            Layer::School => self.school,
            Layer::Work => self.work,
            Layer::Casual => self.casual,
        }
    }

    fn from_fn(mut f: impl FnMut(Layer) -> f64) -> Self {
        Self {
            household: f(Layer::Household),
            school: f(Layer::School),
            work: f(Layer::Work),
            casual: f(Layer::Casual),
        }
    }
}

// ================================================================================================
// Contact Tracing
// ================================================================================================

/// Static contact-tracing configuration: per-layer tracing probability and
/// mean delay in days.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContactTracing {
    pub trace_probs: LayerValues,
    pub trace_time: LayerValues,
}

impl Default for ContactTracing {
    fn default() -> Self {
        Self::resolve(&ParameterTable::default())
    }
}

impl ContactTracing {
    /// Resolves every layer from `table`.
    ///
    /// Households are always traced immediately. School and work fall back to
    /// the generic `trace_prob` / `trace_time` keys, casual contacts are not
    /// traced unless set explicitly.
    pub fn resolve(table: &ParameterTable) -> Self {
        let lookup = |layer: Layer, kind: &str| -> f64 {
            let key = format!("{}_{kind}", layer.key_prefix());
            table.get(&key).unwrap_or_else(|| match layer {
                Layer::Household => match kind {
                    "trace_prob" => 1.0,
                    _ => 0.0,
                },
                Layer::School | Layer::Work => table.get(kind).unwrap_or(0.0),
                Layer::Casual => 0.0,
            })
        };

        Self {
            trace_probs: LayerValues::from_fn(|layer| lookup(layer, "trace_prob")),
            trace_time: LayerValues::from_fn(|layer| lookup(layer, "trace_time")),
        }
    }
}

// ================================================================================================
// Testing
// ================================================================================================

/// Source of the number of tests performed each day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DailyTests {
    /// A daily-tests column of the input data, e.g. `new_tests`.
    Column(String),
    /// The same number of tests every day.
    Fixed(f64),
}

impl Default for DailyTests {
    fn default() -> Self {
        Self::Column("new_tests".to_string())
    }
}

/// When diagnosed agents are quarantined relative to their test.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    IntoStaticStr,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum QuarantinePolicy {
    Start,
    End,
    #[default]
    Both,
    Daily,
}

/// Static testing intervention emitted alongside the schedules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestingPolicy {
    pub daily_tests: DailyTests,
    pub sensitivity: f64,
    pub quarantine: QuarantinePolicy,
}

impl Default for TestingPolicy {
    fn default() -> Self {
        Self {
            daily_tests: DailyTests::default(),
            sensitivity: 0.8,
            quarantine: QuarantinePolicy::default(),
        }
    }
}

impl TestingPolicy {
    pub fn with_daily_tests(self, daily_tests: DailyTests) -> Self {
        Self {
            daily_tests,
            ..self
        }
    }

    pub fn with_sensitivity(self, sensitivity: f64) -> Self {
        Self {
            sensitivity,
            ..self
        }
    }

    pub fn with_quarantine(self, quarantine: QuarantinePolicy) -> Self {
        Self { quarantine, ..self }
    }
}
