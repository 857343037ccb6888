//! CSV export of classification results
//!
//! One line per pixel in row-major order. The standard table holds
//! `OWT,AVW,Area,NDI,Utot` with the features and the total membership
//! rounded to 3 decimals; the extensive table appends one `U_OWT<name>`
//! column per type, rounded to 5 decimals. Fields are quoted where needed, so
//! sample identifiers may hold commas.

use crate::config::OutputOption;
use crate::error::{OwtError, Result};
use crate::optics::OpticalFeatures;
use crate::owt::ClassificationResult;
use crate::owt::stats::round_to;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

const FEATURE_DECIMALS: i32 = 3;
const MEMBERSHIP_DECIMALS: i32 = 5;

pub struct CsvWriter {
    option: OutputOption,
}

impl CsvWriter {
    pub fn new(option: OutputOption) -> Self {
        Self { option }
    }

    pub fn header(&self, result: &ClassificationResult, with_ids: bool) -> Vec<String> {
        let mut columns = Vec::new();
        if with_ids {
            columns.push("ID".to_string());
        }
        columns.extend(["OWT", "AVW", "Area", "NDI", "Utot"].map(String::from));
        if self.option == OutputOption::Extensive {
            columns.extend(
                result
                    .type_names_table()
                    .iter()
                    .map(|name| format!("U_OWT{}", name)),
            );
        }
        columns
    }

    /// Write the table to `path`, creating missing parent directories.
    /// Returns the number of data lines.
    pub fn write<P: AsRef<Path>>(
        &self,
        path: P,
        features: &OpticalFeatures,
        result: &ClassificationResult,
        sample_ids: Option<&[String]>,
    ) -> Result<usize> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = File::create(&path)?;
        let lines = self.write_to(file, features, result, sample_ids)?;

        log::info!("Wrote {} rows to {}", lines, path.as_ref().display());
        Ok(lines)
    }

    pub fn write_to<W: Write>(
        &self,
        writer: W,
        features: &OpticalFeatures,
        result: &ClassificationResult,
        sample_ids: Option<&[String]>,
    ) -> Result<usize> {
        if features.shape() != result.shape() {
            return Err(OwtError::Write(format!(
                "features cover {:?} pixels but the classification covers {:?}",
                features.shape(),
                result.shape()
            )));
        }

        let (rows, cols) = result.shape();
        if let Some(ids) = sample_ids {
            if ids.len() != rows * cols {
                return Err(OwtError::Write(format!(
                    "{} sample ids for {} pixels",
                    ids.len(),
                    rows * cols
                )));
            }
        }

        let mut writer = csv::Writer::from_writer(writer);
        writer.write_record(self.header(result, sample_ids.is_some()))?;

        let labels = result.labels();
        let mut lines = 0;
        for row in 0..rows {
            for col in 0..cols {
                let mut cells = Vec::new();
                if let Some(ids) = sample_ids {
                    cells.push(ids[row * cols + col].clone());
                }
                cells.push(result.name_of(labels[[row, col]]).to_string());
                for value in [
                    features.avw()[[row, col]],
                    features.area()[[row, col]],
                    features.ndi()[[row, col]],
                    result.total()[[row, col]],
                ] {
                    cells.push(round_to(value, FEATURE_DECIMALS).to_string());
                }
                if self.option == OutputOption::Extensive {
                    cells.extend(
                        result
                            .pixel_memberships(row, col)
                            .iter()
                            .map(|u| round_to(*u, MEMBERSHIP_DECIMALS).to_string()),
                    );
                }
                writer.write_record(&cells)?;
                lines += 1;
            }
        }
        writer.flush()?;
        Ok(lines)
    }
}
