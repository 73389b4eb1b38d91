use std::collections::{BTreeMap, HashSet};

use log::{info, warn};

use crate::config::*;

/// The general direction of a scenario.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum ScenarioOutlook {
    Optimistic,
    Neutral,
    /// No city may grow in a pessimistic scenario.
    Pessimistic,
}

impl ScenarioOutlook {
    pub fn parse(s: &str) -> Option<ScenarioOutlook> {
        match s.trim().to_lowercase().as_str() {
            "optimistic" => Some(ScenarioOutlook::Optimistic),
            "neutral" => Some(ScenarioOutlook::Neutral),
            "pessimistic" => Some(ScenarioOutlook::Pessimistic),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ScenarioOutlook::Optimistic => "optimistic",
            ScenarioOutlook::Neutral => "neutral",
            ScenarioOutlook::Pessimistic => "pessimistic",
        }
    }
}

/// A named set of per-city vote multipliers.
#[derive(PartialEq, Debug, Clone)]
pub struct Scenario {
    pub id: String,
    pub name: String,
    pub description: String,
    pub outlook: ScenarioOutlook,
    pub adjustments: BTreeMap<String, f64>,
}

impl Scenario {
    /// The multiplier for a city. Cities not listed keep their votes.
    pub fn multiplier(&self, city: &str) -> f64 {
        self.adjustments.get(city).cloned().unwrap_or(1.0)
    }
}

/// Brings a multiplier back within the configured bounds.
///
/// Inverted bounds are swapped rather than trusted, see [`EngineSettings::validate`].
pub fn clamp_multiplier(value: f64, settings: &EngineSettings) -> f64 {
    if value.is_nan() {
        warn!("clamp_multiplier: NaN multiplier replaced by 1.0");
        return 1.0;
    }
    let (lo, hi) = if settings.min_multiplier <= settings.max_multiplier {
        (settings.min_multiplier, settings.max_multiplier)
    } else {
        (settings.max_multiplier, settings.min_multiplier)
    };
    let clamped = value.max(lo).min(hi);
    if clamped != value {
        warn!(
            "clamp_multiplier: {} clamped to {} (bounds {} - {})",
            value, clamped, settings.min_multiplier, settings.max_multiplier
        );
    }
    clamped
}

/// The read-only templates a simulation can start from.
#[derive(PartialEq, Debug, Clone, Default)]
pub struct ScenarioCatalog {
    scenarios: Vec<Scenario>,
}

impl ScenarioCatalog {
    /// Validates and normalizes a list of scenarios.
    ///
    /// Scenario ids must be unique, and a pessimistic scenario may not raise any
    /// city above 1.0. Multipliers outside the bounds are clamped.
    pub fn new(
        scenarios: Vec<Scenario>,
        settings: &EngineSettings,
    ) -> Result<ScenarioCatalog, EngineErrors> {
        settings.validate()?;
        let mut seen: HashSet<String> = HashSet::new();
        let mut checked: Vec<Scenario> = Vec::new();
        for mut s in scenarios {
            if !seen.insert(s.id.clone()) {
                return Err(EngineErrors::InvalidScenarioCatalog {
                    scenario: s.id,
                    reason: "duplicate scenario id".to_string(),
                });
            }
            if s.outlook == ScenarioOutlook::Pessimistic {
                if let Some((city, m)) = s.adjustments.iter().find(|(_, m)| **m > 1.0) {
                    return Err(EngineErrors::InvalidScenarioCatalog {
                        scenario: s.id.clone(),
                        reason: format!("pessimistic scenario raises {} to {}", city, m),
                    });
                }
            }
            for m in s.adjustments.values_mut() {
                *m = clamp_multiplier(*m, settings);
            }
            checked.push(s);
        }
        info!("ScenarioCatalog: {:?} scenarios", checked.len());
        Ok(ScenarioCatalog { scenarios: checked })
    }

    /// The built-in presets, each listing every given city.
    pub fn presets(cities: &[String], settings: &EngineSettings) -> ScenarioCatalog {
        let uniform = |id: &str, name: &str, description: &str, outlook: ScenarioOutlook, m: f64| Scenario {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            outlook,
            adjustments: cities
                .iter()
                .map(|c| (c.clone(), clamp_multiplier(m, settings)))
                .collect(),
        };
        ScenarioCatalog {
            scenarios: vec![
                uniform(
                    "baseline",
                    "Baseline",
                    "Every city repeats its recorded votes.",
                    ScenarioOutlook::Neutral,
                    1.0,
                ),
                uniform(
                    "optimistic",
                    "Optimistic",
                    "Every city brings 10% more votes.",
                    ScenarioOutlook::Optimistic,
                    1.1,
                ),
                uniform(
                    "pessimistic",
                    "Pessimistic",
                    "Every city brings 10% fewer votes.",
                    ScenarioOutlook::Pessimistic,
                    0.9,
                ),
                uniform(
                    "mobilization",
                    "Mobilization",
                    "A strong turnout campaign lifts every city by 25%.",
                    ScenarioOutlook::Optimistic,
                    1.25,
                ),
            ],
        }
    }

    pub fn scenarios(&self) -> &[Scenario] {
        &self.scenarios
    }

    pub fn get(&self, id: &str) -> Option<&Scenario> {
        self.scenarios.iter().find(|s| s.id == id)
    }
}
