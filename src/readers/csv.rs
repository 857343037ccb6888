use super::{Data, DataReader, ReadError};
use crate::optics::{ReflectanceField, WavelengthGrid};
use csv::{ReaderBuilder, Trim};
use ndarray::Array2;
use std::fs;

/// Wide spectra table: the header holds the wavelengths (nm) and each row is
/// one spectrum. A leading column whose header is not a number is read as
/// sample identifiers. Fields are comma or tab separated and may be quoted.
pub struct CsvReader {
    pub file_name: String,
}

impl DataReader for CsvReader {
    fn read_data(&self) -> Result<Data, ReadError> {
        let text = fs::read_to_string(&self.file_name)
            .map_err(|e| ReadError::Csv(format!("Failed to open {}: {}", self.file_name, e)))?;
        parse_table(&text)
    }
}

// Tab when the header has tabs and no commas, comma otherwise.
fn detect_delimiter(text: &str) -> u8 {
    let header = text.lines().find(|line| !line.trim().is_empty()).unwrap_or("");
    if header.contains('\t') && !header.contains(',') {
        b'\t'
    } else {
        b','
    }
}

pub(crate) fn parse_table(text: &str) -> Result<Data, ReadError> {
    let mut reader = ReaderBuilder::new()
        .delimiter(detect_delimiter(text))
        .flexible(false)
        .trim(Trim::All)
        .from_reader(text.as_bytes());

    let header = reader
        .headers()
        .map_err(|e| ReadError::Csv(e.to_string()))?
        .clone();
    if header.is_empty() {
        return Err(ReadError::Csv("the table is empty".to_string()));
    }

    let has_ids = header
        .get(0)
        .is_some_and(|cell| cell.parse::<f64>().is_err());
    let first_band = usize::from(has_ids);

    let wavelengths = header
        .iter()
        .skip(first_band)
        .map(|cell| {
            cell.parse::<f64>()
                .map_err(|_| ReadError::Csv(format!("`{}` is not a wavelength", cell)))
        })
        .collect::<Result<Vec<f64>, ReadError>>()?;
    let n_bands = wavelengths.len();
    let grid = WavelengthGrid::new(wavelengths).map_err(|e| ReadError::Csv(e.to_string()))?;

    let mut values = Vec::new();
    let mut ids = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| ReadError::Csv(e.to_string()))?;
        let line = record.position().map_or(0, |p| p.line());

        if has_ids {
            ids.push(record[0].to_string());
        }
        for cell in record.iter().skip(first_band) {
            values.push(parse_value(cell).ok_or_else(|| {
                ReadError::Csv(format!("line {}: cannot parse `{}`", line, cell))
            })?);
        }
    }

    let samples = values.len() / n_bands.max(1);
    let rrs = Array2::from_shape_vec((samples, n_bands), values)
        .map_err(|e| ReadError::Csv(e.to_string()))?;
    let field = ReflectanceField::new(rrs, grid).map_err(|e| ReadError::Csv(e.to_string()))?;

    log::info!(
        "Read {} spectra at {} from the input table",
        samples,
        field.grid()
    );

    Ok(Data {
        field,
        sample_ids: has_ids.then_some(ids),
    })
}

// Empty cells and the usual missing-value markers read as NaN.
fn parse_value(cell: &str) -> Option<f64> {
    match cell {
        "" | "NA" | "NaN" | "nan" => Some(f64::NAN),
        _ => cell.parse::<f64>().ok(),
    }
}
