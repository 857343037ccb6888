pub mod csv;
pub mod geotiff;
pub mod types;
pub mod utils;

pub use csv::CsvReader;
pub use geotiff::GeoTiffReader;
pub use types::{Data, DataReader, FileType, ReadError};
pub use utils::reader_from_filetype;

pub fn create_reader(file_name: String) -> Result<Box<dyn DataReader>, ReadError> {
    match reader_from_filetype(file_name.as_ref()) {
        Ok(FileType::Csv) => Ok(Box::new(CsvReader { file_name })),
        Ok(FileType::GeoTiff) => Ok(Box::new(GeoTiffReader {
            file_name,
            wavelengths: None,
        })),
        Err(e) => Err(e),
    }
}
