//! Polynomial coefficients converting multi-band AVW to hyperspectral AVW
//!
//! The table is a small CSV file with one row per sensor:
//!
//! ```text
//! variable,0,1,2,3,4,5
//! OLCI_S3A,c0,c1,c2,c3,c4,c5
//! ```
//!
//! and `AVW_hyper = sum_k c_k * AVW_multi^k`.

use crate::error::{OwtError, Result};
use crate::optics::constants::AVW_POLY_TERMS;
use csv::{ReaderBuilder, Trim};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

pub type AvwCoefficients = [f64; AVW_POLY_TERMS];

// One table row, columns matched by header name.
#[derive(Deserialize)]
struct CoefficientRow {
    variable: String,
    #[serde(rename = "0")]
    c0: f64,
    #[serde(rename = "1")]
    c1: f64,
    #[serde(rename = "2")]
    c2: f64,
    #[serde(rename = "3")]
    c3: f64,
    #[serde(rename = "4")]
    c4: f64,
    #[serde(rename = "5")]
    c5: f64,
}

impl CoefficientRow {
    fn coefficients(&self) -> AvwCoefficients {
        [self.c0, self.c1, self.c2, self.c3, self.c4, self.c5]
    }
}

#[derive(Debug, Clone, Default)]
pub struct RegressionTable {
    coefficients: BTreeMap<String, AvwCoefficients>,
}

impl RegressionTable {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(&path)?;
        let table = Self::parse(&text)?;
        log::info!(
            "Loaded AVW regression coefficients for {} sensors from {}",
            table.coefficients.len(),
            path.as_ref().display()
        );
        Ok(table)
    }

    pub fn parse(text: &str) -> Result<Self> {
        let mut reader = ReaderBuilder::new()
            .flexible(false)
            .trim(Trim::All)
            .from_reader(text.as_bytes());

        let mut coefficients = BTreeMap::new();
        for row in reader.deserialize::<CoefficientRow>() {
            let row = row.map_err(|e| OwtError::InvalidRegressionTable(e.to_string()))?;
            let coefs = row.coefficients();
            coefficients.insert(row.variable, coefs);
        }

        Ok(Self { coefficients })
    }

    pub fn insert(&mut self, sensor: &str, coefficients: AvwCoefficients) {
        self.coefficients.insert(sensor.to_string(), coefficients);
    }

    pub fn coefficients(&self, sensor: &str) -> Result<AvwCoefficients> {
        self.coefficients
            .get(sensor)
            .copied()
            .ok_or_else(|| OwtError::MissingRegressionCoefficients {
                sensor: sensor.to_string(),
            })
    }

    pub fn len(&self) -> usize {
        self.coefficients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coefficients.is_empty()
    }
}

/// Evaluate the correction polynomial, lowest order first.
pub fn convert_avw_multi_to_hyper(avw_multi: f64, coefficients: &AvwCoefficients) -> f64 {
    let mut avw_hyper = 0.0;
    for (k, c) in coefficients.iter().enumerate() {
        avw_hyper += c * avw_multi.powi(k as i32);
    }
    avw_hyper
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const TABLE: &str = "\"variable\",\"0\",\"1\",\"2\",\"3\",\"4\",\"5\"
\"OLCI_S3A\",10.0,0.98,0,0,0,0
MSI_S2A,-5.5,1.01,0.0,0.0,0.0,0.0
";

    #[test]
    fn test_parse_quoted_table() {
        let table = RegressionTable::parse(TABLE).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(
            table.coefficients("OLCI_S3A").unwrap(),
            [10.0, 0.98, 0.0, 0.0, 0.0, 0.0]
        );
    }

    #[test]
    fn test_missing_sensor() {
        let table = RegressionTable::parse(TABLE).unwrap();
        let err = table.coefficients("SeaWiFS").unwrap_err();
        assert!(matches!(
            err,
            OwtError::MissingRegressionCoefficients { sensor } if sensor == "SeaWiFS"
        ));
    }

    #[test]
    fn test_columns_located_by_name() {
        let text = "5,4,3,2,1,0,variable\n0,0,0,0,2,1,TOY\n";
        let table = RegressionTable::parse(text).unwrap();
        assert_eq!(
            table.coefficients("TOY").unwrap(),
            [1.0, 2.0, 0.0, 0.0, 0.0, 0.0]
        );
    }

    #[test]
    fn test_empty_table_has_no_sensors() {
        let table = RegressionTable::parse("variable,0,1,2,3,4,5\n").unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn test_missing_column() {
        let err = RegressionTable::parse("variable,0,1,2\nTOY,1,2,3\n").unwrap_err();
        assert!(matches!(err, OwtError::InvalidRegressionTable(_)));
    }

    #[test]
    fn test_bad_number() {
        let err = RegressionTable::parse("variable,0,1,2,3,4,5\nTOY,a,1,0,0,0,0\n").unwrap_err();
        assert!(matches!(err, OwtError::InvalidRegressionTable(_)));
    }

    #[test]
    fn test_polynomial() {
        let coefs = [1.0, 2.0, 0.5, 0.0, 0.0, 0.001];
        // 1 + 2*10 + 0.5*100 + 0.001*100000
        assert_relative_eq!(
            convert_avw_multi_to_hyper(10.0, &coefs),
            171.0,
            epsilon = 1e-9
        );
        let identity = [0.0, 1.0, 0.0, 0.0, 0.0, 0.0];
        assert_eq!(convert_avw_multi_to_hyper(563.25, &identity), 563.25);
    }
}
