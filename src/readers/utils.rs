use super::types::{FileType, ReadError};
use std::path::Path;

pub fn reader_from_filetype(path: &Path) -> Result<FileType, ReadError> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());

    match extension.as_deref() {
        Some("csv") | Some("txt") => Ok(FileType::Csv),
        Some("tif") | Some("tiff") => Ok(FileType::GeoTiff),
        _ => Err(ReadError::UnknownFileType(path.display().to_string())),
    }
}

/// Wavelength encoded as the last `_`-separated token of a file stem, e.g.
/// `S2A_scene_665.tif` or `Rrs_442.5.tif`.
pub fn wavelength_from_file_name(path: &Path) -> Option<f64> {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .and_then(|stem| stem.rsplit('_').next())
        .and_then(|token| token.trim_start_matches("Rrs").parse::<f64>().ok())
        .filter(|w| w.is_finite() && *w > 0.0)
}
