use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::errors::StationTableError;
use crate::model::Orientation;

/// Source of decode profiles keyed by GOES platform id.
pub trait StationLookup: Send + Sync {
    fn lookup(&self, platform_id: &str) -> Option<&StationProfile>;
}

/// Per-station layout of the IMFV283 sub-block and its unit conversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationProfile {
    pub code: String,
    pub platform_id: String,
    /// Layout the observatory is configured to report.
    pub orientation: Orientation,
    #[serde(default)]
    pub swap_header: bool,
    #[serde(default)]
    pub swap_data: bool,
    /// Bytes between the end of the flag byte and this station's sub-block.
    #[serde(default)]
    pub block_offset: usize,
    /// Length of the packed sub-block, three characters per 16-bit word.
    #[serde(default = "default_block_length")]
    pub block_length: usize,
    #[serde(default = "default_samples_per_channel")]
    pub samples_per_channel: usize,
    #[serde(default = "default_dead_value")]
    pub dead_value: u16,
    #[serde(default)]
    pub conversion: Conversion,
}

fn default_block_length() -> usize {
    189
}

fn default_samples_per_channel() -> usize {
    12
}

fn default_dead_value() -> u16 {
    65535
}

/// `(raw * scale + offset * bias - shift) * resolution`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Conversion {
    #[serde(default = "default_bias")]
    pub bias: f64,
    #[serde(default = "default_shift")]
    pub shift: f64,
    #[serde(default = "default_resolution")]
    pub resolution: f64,
}

fn default_bias() -> f64 {
    8192.0
}

fn default_shift() -> f64 {
    1_048_576.0
}

fn default_resolution() -> f64 {
    0.1
}

impl Default for Conversion {
    fn default() -> Self {
        Self {
            bias: default_bias(),
            shift: default_shift(),
            resolution: default_resolution(),
        }
    }
}

impl Conversion {
    /// Leaves counts untouched apart from the channel scale and offset bias.
    pub fn counts() -> Self {
        Self {
            bias: default_bias(),
            shift: 0.0,
            resolution: 1.0,
        }
    }

    pub fn apply(&self, raw: u16, scale: u8, offset: u8) -> f64 {
        let counts = f64::from(raw) * f64::from(scale) + f64::from(offset) * self.bias;
        (counts - self.shift) * self.resolution
    }
}

impl StationProfile {
    pub fn new(
        code: impl Into<String>,
        platform_id: impl Into<String>,
        orientation: Orientation,
    ) -> Self {
        Self {
            code: code.into(),
            platform_id: platform_id.into(),
            orientation,
            swap_header: false,
            swap_data: false,
            block_offset: 0,
            block_length: default_block_length(),
            samples_per_channel: default_samples_per_channel(),
            dead_value: default_dead_value(),
            conversion: Conversion::default(),
        }
    }

    fn validate(&self) -> Result<(), StationTableError> {
        let invalid = |message: String| StationTableError::InvalidProfile {
            station: self.code.clone(),
            message,
        };

        if self.platform_id.len() != 8
            || !self.platform_id.chars().all(|c| c.is_ascii_alphanumeric())
        {
            return Err(invalid(format!(
                "platform id '{}' must be 8 alphanumeric characters",
                self.platform_id
            )));
        }
        if self.block_length == 0 || self.block_length % 3 != 0 {
            return Err(invalid(format!(
                "block length {} is not a positive multiple of 3",
                self.block_length
            )));
        }
        if self.samples_per_channel == 0 {
            return Err(invalid("samples_per_channel must be at least 1".into()));
        }
        if !self.conversion.resolution.is_finite() || self.conversion.resolution == 0.0 {
            return Err(invalid(format!(
                "conversion resolution {} must be finite and non-zero",
                self.conversion.resolution
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct StationsFile {
    #[serde(rename = "station", default)]
    stations: Vec<StationProfile>,
}

/// Immutable platform id → profile mapping, loaded once and shared by every decode.
#[derive(Debug, Clone, Default)]
pub struct StationTable {
    profiles: Vec<StationProfile>,
    by_platform: HashMap<String, usize>,
}

impl StationTable {
    pub fn from_profiles(profiles: Vec<StationProfile>) -> Result<Self, StationTableError> {
        let mut by_platform = HashMap::with_capacity(profiles.len());
        {
            let mut codes = HashSet::with_capacity(profiles.len());
            for (idx, profile) in profiles.iter().enumerate() {
                profile.validate()?;
                if !codes.insert(profile.code.as_str()) {
                    return Err(StationTableError::DuplicateStation(profile.code.clone()));
                }
                if let Some(existing) = by_platform.insert(profile.platform_id.clone(), idx) {
                    return Err(StationTableError::DuplicatePlatform {
                        platform_id: profile.platform_id.clone(),
                        first: profiles[existing].code.clone(),
                        second: profile.code.clone(),
                    });
                }
            }
        }

        Ok(Self {
            profiles,
            by_platform,
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self, StationTableError> {
        let file: StationsFile = toml::from_str(content)?;
        Self::from_profiles(file.stations)
    }

    /// Table compiled into the crate, covering the platforms with reference fixtures.
    pub fn builtin() -> &'static StationTable {
        &BUILTIN
    }

    pub fn by_code(&self, code: &str) -> Option<&StationProfile> {
        self.profiles.iter().find(|profile| profile.code == code)
    }

    pub fn profiles(&self) -> &[StationProfile] {
        &self.profiles
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

impl StationLookup for StationTable {
    fn lookup(&self, platform_id: &str) -> Option<&StationProfile> {
        self.by_platform
            .get(platform_id)
            .map(|&idx| &self.profiles[idx])
    }
}

static BUILTIN: Lazy<StationTable> = Lazy::new(|| {
    StationTable::from_toml_str(include_str!("../stations.toml"))
        .expect("embedded station table is valid")
});
