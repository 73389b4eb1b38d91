use electoral_engine::builder::DatasetBuilder;

use crate::app::*;

/// Loads the vote records from the files listed in the configuration.
pub struct FileProvider {
    root: PathBuf,
    sources: Vec<DatasetSource>,
    parties: Vec<(String, String)>,
}

impl FileProvider {
    pub fn new(
        root: PathBuf,
        sources: Vec<DatasetSource>,
        parties: Vec<(String, String)>,
    ) -> FileProvider {
        FileProvider {
            root,
            sources,
            parties,
        }
    }

    fn read_source(&self, source: &DatasetSource) -> BAppResult<Vec<VoteRecord>> {
        let p: PathBuf = self.root.join(&source.file_path);
        let path = p.as_path().display().to_string();
        info!("Attempting to read {} file {:?}", source.provider, path);
        match source.provider.as_str() {
            "json" => io_json::read_json_records(&path, source),
            "csv" => io_csv::read_csv_records(&path, source),
            "excel" | "xlsx" => io_excel::read_excel_records(&path, source),
            x => UnknownProviderSnafu { provider: x }.fail().map_err(Box::new),
        }
    }

    fn load(&self, position: Option<&str>) -> BAppResult<Dataset> {
        let mut builder = DatasetBuilder::new().parties(&self.parties);
        for source in self.sources.iter() {
            let records: Vec<VoteRecord> = self
                .read_source(source)?
                .into_iter()
                .filter(|r| position.map_or(true, |p| r.position == p))
                .collect();
            builder
                .add_records(records)
                .context(InvalidDatasetSnafu {
                    path: source.file_path.clone(),
                })?;
        }
        let ds = builder.build().context(InvalidDatasetSnafu { path: "" })?;
        Ok(ds)
    }
}

impl DatasetProvider for FileProvider {
    fn fetch(&self, position: Option<&str>) -> Result<Dataset, CollaboratorFailure> {
        self.load(position).map_err(|e| {
            warn!("FileProvider::fetch: {}", e);
            CollaboratorFailure::new("file provider", e.to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(files: &[&str]) -> FileProvider {
        let root: PathBuf = [env!("CARGO_MANIFEST_DIR"), "testdata"].iter().collect();
        let sources = files
            .iter()
            .map(|f| DatasetSource {
                provider: guess_provider(f),
                file_path: f.to_string(),
                excel_worksheet_name: None,
                position: None,
            })
            .collect();
        FileProvider::new(root, sources, vec![("PA".to_string(), "Party of the Avenues".to_string())])
    }

    #[test]
    fn fetch_filters_by_position() {
        let ds = provider(&["municipal_votes.csv"]).fetch(Some("Mayor")).unwrap();
        assert_eq!(ds.records().len(), 4);
        assert_eq!(ds.positions(), vec!["Mayor"]);
        assert_eq!(ds.party_name("PA"), "Party of the Avenues");
    }

    #[test]
    fn duplicate_records_across_sources_fail() {
        let err = provider(&["municipal_votes.csv", "municipal_votes.json"])
            .fetch(None)
            .unwrap_err();
        assert_eq!(err.collaborator, "file provider");
        assert!(err.message.contains("Duplicate vote record"));
    }

    #[test]
    fn unknown_provider() {
        let mut p = provider(&["municipal_votes.csv"]);
        p.sources[0].provider = "dbase".to_string();
        let err = p.fetch(None).unwrap_err();
        assert_eq!(err.message, "Provider not implemented: dbase");
    }
}
