use crate::error::{OwtError, Result};
use crate::optics::constants::AVW_REGRESSION_FILE;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Display;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::LazyLock;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandRange {
    pub min: f64,
    pub max: f64,
}

/// Band layout of a discrete-band sensor.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorProfile {
    name: String,
    avw_bands: Vec<f64>,
    rgb_bands: [f64; 3],
    avw_range: BandRange,
}

impl SensorProfile {
    pub fn new(
        name: &str,
        avw_bands: Vec<f64>,
        rgb_bands: [f64; 3],
        avw_range: BandRange,
    ) -> Result<Self> {
        if avw_bands.is_empty() {
            return Err(OwtError::InvalidSensorLibrary(format!(
                "{} has no AVW bands",
                name
            )));
        }
        if !(rgb_bands[0] < rgb_bands[1] && rgb_bands[1] < rgb_bands[2]) {
            return Err(OwtError::InvalidSensorLibrary(format!(
                "{} RGB bands must be ordered blue < green < red, got {:?}",
                name, rgb_bands
            )));
        }
        if avw_range.min > avw_range.max {
            return Err(OwtError::InvalidSensorLibrary(format!(
                "{} AVW range min {} is above max {}",
                name, avw_range.min, avw_range.max
            )));
        }

        Ok(Self {
            name: name.to_string(),
            avw_bands,
            rgb_bands,
            avw_range,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn avw_bands(&self) -> &[f64] {
        &self.avw_bands
    }

    pub fn rgb_bands(&self) -> [f64; 3] {
        self.rgb_bands
    }

    pub fn avw_range(&self) -> BandRange {
        self.avw_range
    }
}

impl Display for SensorProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Sensor: {}, AVW bands: {:?}, RGB bands: {:?}, range: [{}, {}]",
            self.name, self.avw_bands, self.rgb_bands, self.avw_range.min, self.avw_range.max
        )
    }
}

/// Collection of supported sensors, keyed by name.
#[derive(Debug, Clone)]
pub struct SensorLibrary {
    sensors: BTreeMap<String, SensorProfile>,
    regression_file: String,
}

// On-disk layout of a sensor library (same keys as the reference band library).
#[derive(Debug, Deserialize)]
struct LibraryHelper {
    #[serde(rename = "sensor_AVW_bands_library")]
    avw_bands: BTreeMap<String, Vec<f64>>,
    #[serde(rename = "sensor_RGB_bands_library")]
    rgb_bands: BTreeMap<String, [f64; 3]>,
    #[serde(rename = "sensor_RGB_min_max")]
    min_max: BTreeMap<String, BandRange>,
    #[serde(rename = "AVW_regression_coef", default)]
    regression_file: Option<String>,
}

impl SensorLibrary {
    pub fn builtin() -> &'static SensorLibrary {
        &BUILTIN_LIBRARY
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(&path)?;
        let reader = BufReader::new(file);
        let helper: LibraryHelper = serde_json::from_reader(reader)?;

        let mut sensors = BTreeMap::new();
        for (name, avw_bands) in helper.avw_bands {
            let rgb = helper.rgb_bands.get(&name).ok_or_else(|| {
                OwtError::InvalidSensorLibrary(format!("{} has no RGB bands", name))
            })?;
            let range = helper.min_max.get(&name).ok_or_else(|| {
                OwtError::InvalidSensorLibrary(format!("{} has no AVW min/max", name))
            })?;
            let profile = SensorProfile::new(&name, avw_bands, *rgb, *range)?;
            sensors.insert(name, profile);
        }

        log::info!(
            "Loaded sensor band library with {} sensors from {}",
            sensors.len(),
            path.as_ref().display()
        );

        Ok(Self {
            sensors,
            regression_file: helper
                .regression_file
                .unwrap_or_else(|| AVW_REGRESSION_FILE.to_string()),
        })
    }

    pub fn get(&self, name: &str) -> Result<&SensorProfile> {
        self.sensors
            .get(name)
            .ok_or_else(|| OwtError::UnknownSensor {
                name: name.to_string(),
                available: self.available(),
            })
    }

    /// Comma separated list of the sensor names, sorted.
    pub fn available(&self) -> String {
        self.sensors
            .keys()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.sensors.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.sensors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sensors.is_empty()
    }

    /// File name of the AVW regression table that goes with this library.
    pub fn regression_file(&self) -> &str {
        &self.regression_file
    }
}

// name, AVW probe bands, RGB bands, AVW range
type SensorRow = (&'static str, &'static [u32], [u32; 3], (u32, u32));

const BAND_TABLE: &[SensorRow] = &[
    (
        "MODIS_Aqua",
        &[412, 443, 469, 488, 531, 547, 555, 645, 667, 678, 748, 859],
        [443, 555, 667],
        (412, 667),
    ),
    (
        "MODIS_Terra",
        &[412, 443, 469, 488, 531, 547, 555, 645, 667, 678, 748, 859],
        [443, 555, 667],
        (412, 667),
    ),
    (
        "OLCI_S3A",
        &[400, 412, 443, 490, 510, 560, 620, 665, 674, 682, 709, 754, 779, 866],
        [443, 560, 665],
        (400, 866),
    ),
    (
        "OLCI_S3B",
        &[400, 412, 443, 490, 510, 560, 620, 665, 674, 681, 709, 754, 779, 866],
        [443, 560, 665],
        (400, 866),
    ),
    (
        "MERIS",
        &[413, 443, 490, 510, 560, 620, 665, 681, 709, 754, 779, 865],
        [443, 560, 665],
        (413, 865),
    ),
    (
        "SeaWiFS",
        &[412, 443, 490, 510, 555, 670, 865],
        [443, 555, 670],
        (412, 865),
    ),
    (
        "HawkEye",
        &[412, 447, 488, 510, 556, 670, 752, 867],
        [447, 556, 670],
        (412, 867),
    ),
    (
        "OCTS",
        &[412, 443, 490, 516, 565, 667, 862],
        [443, 565, 667],
        (412, 862),
    ),
    (
        "GOCI",
        &[412, 443, 490, 555, 660, 680, 745, 865],
        [443, 555, 660],
        (412, 865),
    ),
    (
        "VIIRS_SNPP",
        &[410, 443, 486, 551, 671, 745, 862],
        [443, 551, 671],
        (410, 862),
    ),
    (
        "VIIRS_JPSS1",
        &[411, 445, 489, 556, 667, 746, 868],
        [445, 556, 667],
        (411, 868),
    ),
    (
        "VIIRS_JPSS2",
        &[411, 445, 488, 555, 671, 747, 868],
        [445, 555, 671],
        (411, 868),
    ),
    ("CZCS", &[443, 520, 550, 670], [443, 550, 670], (443, 670)),
    (
        "MSI_S2A",
        &[443, 492, 560, 665, 704, 740, 783, 835],
        [443, 560, 665],
        (443, 835),
    ),
    (
        "MSI_S2B",
        &[442, 492, 559, 665, 704, 739, 780, 835],
        [442, 559, 665],
        (442, 835),
    ),
    (
        "OLI",
        &[443, 482, 561, 655, 865],
        [443, 561, 655],
        (443, 865),
    ),
    (
        "CMEMS_HROC_L3_optics",
        &[443, 492, 560, 665, 704, 783, 865],
        [443, 560, 665],
        (443, 865),
    ),
    (
        "cmems_P1D400",
        &[443, 490, 510, 560, 620, 665, 674, 682, 709, 779, 866],
        [443, 560, 665],
        (443, 866),
    ),
    (
        "AERONET_OC_1",
        &[400, 412, 443, 490, 510, 560, 620, 665, 779, 866],
        [443, 560, 665],
        (400, 866),
    ),
    (
        "AERONET_OC_2",
        &[412, 443, 490, 532, 551, 667, 870],
        [443, 551, 667],
        (412, 870),
    ),
];

static BUILTIN_LIBRARY: LazyLock<SensorLibrary> = LazyLock::new(|| {
    let sensors = BAND_TABLE
        .iter()
        .map(|(name, avw, rgb, (min, max))| {
            let profile = SensorProfile {
                name: name.to_string(),
                avw_bands: avw.iter().copied().map(f64::from).collect(),
                rgb_bands: (*rgb).map(f64::from),
                avw_range: BandRange {
                    min: f64::from(*min),
                    max: f64::from(*max),
                },
            };
            (name.to_string(), profile)
        })
        .collect();

    SensorLibrary {
        sensors,
        regression_file: AVW_REGRESSION_FILE.to_string(),
    }
});
