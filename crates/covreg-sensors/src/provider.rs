//! Sensor sets per language.

use std::sync::Arc;

use covreg_core::{ConfigurationTable, Result, TestScope};

use crate::coverage::CoverageReportImportSensor;
use crate::properties::PropertiesSensor;
use crate::sensor::Sensor;

/// The sensors a plugin registers for `language`: the properties sensor
/// followed by one coverage import sensor per test scope.
pub fn sensors_for(table: &ConfigurationTable, language: &str) -> Result<Vec<Arc<dyn Sensor>>> {
    let info = table.language(language)?.clone();
    let mut sensors: Vec<Arc<dyn Sensor>> = vec![Arc::new(PropertiesSensor::new(info))];
    for scope in TestScope::ALL {
        sensors.push(Arc::new(CoverageReportImportSensor::new(
            table, language, scope,
        )?));
    }
    Ok(sensors)
}
