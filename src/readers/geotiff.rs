use super::utils::wavelength_from_file_name;
use super::{Data, DataReader, ReadError};
use crate::optics::{ReflectanceField, WavelengthGrid};
use ndarray::{Array3, Axis};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tiff::decoder::{Decoder, DecodingResult};

/// Stack of single-band GeoTIFFs, one file per wavelength.
///
/// `file_name` is a path or a glob pattern such as `scene/Rrs_*.tif`. The
/// wavelength of each file is read from its name (`<anything>_<nm>.tif`)
/// unless `wavelengths` gives them in the sorted order of the matched files.
pub struct GeoTiffReader {
    pub file_name: String,
    pub wavelengths: Option<Vec<f64>>,
}

struct Band {
    width: u32,
    height: u32,
    buffer: Vec<f64>,
}

impl GeoTiffReader {
    fn band_files(&self) -> Result<Vec<PathBuf>, ReadError> {
        let mut files: Vec<PathBuf> = glob::glob(&self.file_name)
            .map_err(|e| ReadError::GeoTiff(format!("Invalid pattern {}: {}", self.file_name, e)))?
            .filter_map(|entry| entry.ok())
            .collect();
        files.sort();

        if files.is_empty() {
            return Err(ReadError::GeoTiff(format!(
                "No file matches {}",
                self.file_name
            )));
        }
        Ok(files)
    }

    fn band_wavelengths(&self, files: &[PathBuf]) -> Result<Vec<f64>, ReadError> {
        if let Some(wavelengths) = &self.wavelengths {
            if wavelengths.len() != files.len() {
                return Err(ReadError::GeoTiff(format!(
                    "{} wavelengths given for {} files",
                    wavelengths.len(),
                    files.len()
                )));
            }
            return Ok(wavelengths.clone());
        }

        files
            .iter()
            .map(|path| {
                wavelength_from_file_name(path).ok_or_else(|| {
                    ReadError::GeoTiff(format!(
                        "Cannot find a wavelength in the name of {}",
                        path.display()
                    ))
                })
            })
            .collect()
    }
}

impl DataReader for GeoTiffReader {
    fn read_data(&self) -> Result<Data, ReadError> {
        let files = self.band_files()?;
        let wavelengths = self.band_wavelengths(&files)?;

        let mut bands: Vec<(f64, Band)> = files
            .iter()
            .zip(wavelengths)
            .map(|(path, w)| read_band(path).map(|band| (w, band)))
            .collect::<Result<_, _>>()?;
        bands.sort_by(|a, b| a.0.total_cmp(&b.0));

        let (width, height) = (bands[0].1.width, bands[0].1.height);
        if let Some((w, _)) = bands
            .iter()
            .find(|(_, b)| b.width != width || b.height != height)
        {
            return Err(ReadError::GeoTiff(format!(
                "Band at {} nm does not have the {}x{} size of the other bands",
                w, width, height
            )));
        }

        let (rows, cols, n_bands) = (height as usize, width as usize, bands.len());
        let mut rrs = Array3::<f64>::zeros((rows, cols, n_bands));
        for (mut lane, (_, band)) in rrs.axis_iter_mut(Axis(2)).zip(&bands) {
            for (value, v) in lane.iter_mut().zip(&band.buffer) {
                *value = *v;
            }
        }

        let grid = WavelengthGrid::new(bands.iter().map(|(w, _)| *w).collect())
            .map_err(|e| ReadError::GeoTiff(e.to_string()))?;
        log::info!(
            "Read a {}x{} band stack at {} from {}",
            rows,
            cols,
            grid,
            self.file_name
        );
        let field =
            ReflectanceField::new(rrs, grid).map_err(|e| ReadError::GeoTiff(e.to_string()))?;

        Ok(Data {
            field,
            sample_ids: None,
        })
    }
}

fn read_band(path: &Path) -> Result<Band, ReadError> {
    let file = File::open(path)
        .map_err(|e| ReadError::GeoTiff(format!("Failed to open file: {}", e)))?;

    let reader = BufReader::new(file);

    let mut decoder = Decoder::new(reader)
        .map_err(|e| ReadError::GeoTiff(format!("Failed to decode TIFF: {}", e)))?;

    let (width, height) = decoder
        .dimensions()
        .map_err(|e| ReadError::GeoTiff(format!("Failed to get dimensions: {}", e)))?;

    let buffer: Vec<f64> = match decoder
        .read_image()
        .map_err(|e| ReadError::GeoTiff(format!("Failed to read image: {}", e)))?
    {
        DecodingResult::U8(data) => data.iter().map(|&x| f64::from(x)).collect(),
        DecodingResult::U16(data) => data.iter().map(|&x| f64::from(x)).collect(),
        DecodingResult::U32(data) => data.iter().map(|&x| f64::from(x)).collect(),
        DecodingResult::F32(data) => data.iter().map(|&x| f64::from(x)).collect(),
        DecodingResult::F64(data) => data,
        _ => return Err(ReadError::GeoTiff("Unsupported pixel format".to_string())),
    };

    if buffer.len() != width as usize * height as usize {
        return Err(ReadError::GeoTiff(format!(
            "{} holds more than one sample per pixel",
            path.display()
        )));
    }

    Ok(Band {
        width,
        height,
        buffer,
    })
}
