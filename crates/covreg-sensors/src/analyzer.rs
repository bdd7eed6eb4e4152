//! Analyzer output configuration (protobuf directories and Roslyn reports).

use std::path::Path;

use covreg_core::{emit_path_rejected, normalize, normalize_all, CanonicalPath, LanguageInfo};
use tracing::debug;

use crate::settings::Settings;

/// Reads a module's analyzer output locations from its settings.
pub struct AnalyzerConfiguration<'a> {
    language: &'a LanguageInfo,
    settings: &'a Settings,
    base_dir: &'a Path,
}

impl<'a> AnalyzerConfiguration<'a> {
    pub fn new(language: &'a LanguageInfo, settings: &'a Settings, base_dir: &'a Path) -> Self {
        Self {
            language,
            settings,
            base_dir,
        }
    }

    /// Protobuf output directories, one per configured project output path.
    ///
    /// Each entry resolves to `<projectOutPath>/output-<language>`; entries
    /// whose directory does not exist are dropped.
    pub fn protobuf_report_paths(&self) -> Vec<CanonicalPath> {
        let key = self.language.project_out_paths_key();
        let output_dir = self.language.analyzer_output_dir();
        let mut dirs = Vec::new();
        for raw in self.settings.get_string_array(&key) {
            let dir = match normalize(&format!("{raw}/{output_dir}"), self.base_dir) {
                Ok(dir) => dir,
                Err(err) => {
                    emit_path_rejected(&key, &err);
                    continue;
                }
            };
            if !dir.as_path().is_dir() {
                debug!(
                    property = %key,
                    dir = %dir,
                    "analyzer output directory not found, skipping"
                );
                continue;
            }
            dirs.push(dir);
        }
        dirs
    }

    /// Roslyn report files resolved against the module base.
    pub fn roslyn_report_paths(&self) -> Vec<CanonicalPath> {
        let key = self.language.roslyn_report_paths_key();
        let (paths, rejected) = normalize_all(self.settings.get_string_array(&key), self.base_dir);
        for err in &rejected {
            emit_path_rejected(&key, err);
        }
        paths
    }
}
