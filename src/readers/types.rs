use crate::optics::ReflectanceField;
use std::fmt;

pub trait DataReader {
    fn read_data(&self) -> Result<Data, ReadError>;
}

#[derive(Debug)]
pub enum ReadError {
    Csv(String),
    GeoTiff(String),
    UnknownFileType(String),
}

impl fmt::Display for ReadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadError::Csv(e) => write!(f, "Failed to read CSV input: {}", e),
            ReadError::GeoTiff(e) => write!(f, "Failed to read GeoTIFF input: {}", e),
            ReadError::UnknownFileType(name) => {
                write!(f, "No reader for `{}` (expected .csv, .txt or .tif)", name)
            }
        }
    }
}

impl std::error::Error for ReadError {}

/// Reflectance read from one input, with the sample identifiers of tabular
/// inputs when the table has an ID column.
#[derive(Debug)]
pub struct Data {
    pub field: ReflectanceField,
    pub sample_ids: Option<Vec<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    Csv,
    GeoTiff,
}

impl fmt::Display for Data {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let values = self.field.values();
        let finite = || values.iter().copied().filter(|x| x.is_finite());
        let min_value = finite().fold(f64::NAN, f64::min);
        let max_value = finite().fold(f64::NAN, f64::max);
        let (rows, cols) = self.field.pixel_shape();

        write!(
            f,
            "Rows: {}\nColumns: {}\nWavelengths: {}\nMin value: {}\nMax value: {}",
            rows,
            cols,
            self.field.grid(),
            min_value,
            max_value,
        )
    }
}
