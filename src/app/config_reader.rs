use std::collections::BTreeMap;
use std::fs;

use crate::app::*;

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(rename = "electionName")]
    pub election_name: String,
    #[serde(rename = "outputDirectory")]
    pub output_directory: Option<String>,
    #[serde(rename = "electionDate")]
    pub election_date: Option<String>,
    #[serde(rename = "jurisdiction")]
    pub jurisdiction: Option<String>,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct DatasetSource {
    pub provider: String,
    #[serde(rename = "filePath")]
    pub file_path: String,
    #[serde(rename = "excelWorksheetName")]
    pub excel_worksheet_name: Option<String>,
    /// The position of the records that do not state one.
    pub position: Option<String>,
}

/// Overrides of the engine settings. Missing entries keep their default.
#[derive(PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettingsConfig {
    #[serde(rename = "strongholdThresholdPct")]
    pub stronghold_threshold_pct: Option<f64>,
    #[serde(rename = "adjustmentStep")]
    pub adjustment_step: Option<f64>,
    #[serde(rename = "minMultiplier")]
    pub min_multiplier: Option<f64>,
    #[serde(rename = "maxMultiplier")]
    pub max_multiplier: Option<f64>,
    #[serde(rename = "goalRank")]
    pub goal_rank: Option<u32>,
    #[serde(rename = "nearRankMarginPct")]
    pub near_rank_margin_pct: Option<f64>,
    #[serde(rename = "highConcentrationPct")]
    pub high_concentration_pct: Option<f64>,
}

impl SettingsConfig {
    pub fn engine_settings(&self) -> AppResult<EngineSettings> {
        let d = EngineSettings::DEFAULT_SETTINGS;
        let res = EngineSettings {
            stronghold_threshold_pct: self
                .stronghold_threshold_pct
                .unwrap_or(d.stronghold_threshold_pct),
            adjustment_step: self.adjustment_step.unwrap_or(d.adjustment_step),
            min_multiplier: self.min_multiplier.unwrap_or(d.min_multiplier),
            max_multiplier: self.max_multiplier.unwrap_or(d.max_multiplier),
            goal_rank: self.goal_rank.unwrap_or(d.goal_rank),
            near_rank_margin_pct: self.near_rank_margin_pct.unwrap_or(d.near_rank_margin_pct),
            high_concentration_pct: self
                .high_concentration_pct
                .unwrap_or(d.high_concentration_pct),
        };
        if let Err(e) = res.validate() {
            whatever!("{}", e)
        }
        Ok(res)
    }
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioConfig {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub outlook: String,
    #[serde(default)]
    pub adjustments: BTreeMap<String, f64>,
}

impl ScenarioConfig {
    pub fn scenario(&self) -> AppResult<Scenario> {
        let outlook = match ScenarioOutlook::parse(self.outlook.as_str()) {
            Some(o) => o,
            None => whatever!(
                "Unknown outlook {:?} for scenario {:?}",
                self.outlook,
                self.id
            ),
        };
        Ok(Scenario {
            id: self.id.clone(),
            name: self.name.clone(),
            description: self.description.clone().unwrap_or_default(),
            outlook,
            adjustments: self.adjustments.clone(),
        })
    }
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ElectionConfig {
    #[serde(rename = "outputSettings")]
    pub output_settings: OutputSettings,
    #[serde(rename = "datasetSources", default)]
    pub dataset_sources: Vec<DatasetSource>,
    pub parties: Option<BTreeMap<String, String>>,
    pub settings: Option<SettingsConfig>,
    pub scenarios: Option<Vec<ScenarioConfig>>,
}

impl ElectionConfig {
    pub fn engine_settings(&self) -> AppResult<EngineSettings> {
        self.settings.clone().unwrap_or_default().engine_settings()
    }

    pub fn party_names(&self) -> Vec<(String, String)> {
        self.parties
            .clone()
            .unwrap_or_default()
            .into_iter()
            .collect()
    }

    /// The configured scenarios, or the presets over the cities of the dataset.
    pub fn scenario_catalog(
        &self,
        cities: &[String],
        settings: &EngineSettings,
    ) -> BAppResult<ScenarioCatalog> {
        match &self.scenarios {
            Some(scs) => {
                let mut scenarios: Vec<Scenario> = Vec::new();
                for sc in scs.iter() {
                    scenarios.push(sc.scenario()?);
                }
                let catalog =
                    ScenarioCatalog::new(scenarios, settings).context(InvalidCatalogSnafu {})?;
                Ok(catalog)
            }
            None => Ok(ScenarioCatalog::presets(cities, settings)),
        }
    }
}

pub fn read_config(path: &str) -> BAppResult<ElectionConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let config: ElectionConfig =
        serde_json::from_str(&contents).context(ParsingJsonSnafu { path })?;
    debug!("read_config: {:?}", config);
    Ok(config)
}

pub fn read_reference(path: &str) -> BAppResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })?;
    Ok(js)
}

/// Reads the text of a JSON cell that may hold either a string or a number.
pub fn read_js_text(x: &JSValue) -> Option<String> {
    match x {
        JSValue::String(s) => Some(s.trim().to_string()),
        JSValue::Number(n) => n.as_u64().map(|n| n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_settings_keep_defaults() {
        let sc: SettingsConfig =
            serde_json::from_str(r#"{"goalRank": 3, "maxMultiplier": 2.0}"#).unwrap();
        let s = sc.engine_settings().unwrap();
        assert_eq!(s.goal_rank, 3);
        assert_eq!(s.max_multiplier, 2.0);
        assert_eq!(s.adjustment_step, 0.05);

        let bad: SettingsConfig = serde_json::from_str(r#"{"minMultiplier": 1.2}"#).unwrap();
        assert!(bad.engine_settings().is_err());
    }

    #[test]
    fn scenario_outlook_must_be_known() {
        let sc: ScenarioConfig = serde_json::from_str(
            r#"{"id": "x", "name": "X", "outlook": "gloomy", "adjustments": {"A": 0.9}}"#,
        )
        .unwrap();
        assert!(sc.scenario().is_err());
    }

    #[test]
    fn js_text_accepts_numbers() {
        assert_eq!(read_js_text(&json!("050")), Some("050".to_string()));
        assert_eq!(read_js_text(&json!(12)), Some("12".to_string()));
        assert_eq!(read_js_text(&json!(1.5)), None);
        assert_eq!(read_js_text(&json!(null)), None);
    }
}
