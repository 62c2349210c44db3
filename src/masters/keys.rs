// src/masters/keys.rs - Fixed set of reference dataset identifiers
use std::fmt;
use std::str::FromStr;

use super::error::MasterDataError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatasetKey {
    Height,
    Occupation,
    Qualification,
    Caste,
    CountryState,
    BiodataOutput,
    MaritalStatus,
    Manglik,
}

impl DatasetKey {
    pub const COUNT: usize = 8;

    pub const ALL: [DatasetKey; Self::COUNT] = [
        DatasetKey::Height,
        DatasetKey::Occupation,
        DatasetKey::Qualification,
        DatasetKey::Caste,
        DatasetKey::CountryState,
        DatasetKey::BiodataOutput,
        DatasetKey::MaritalStatus,
        DatasetKey::Manglik,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DatasetKey::Height => "height",
            DatasetKey::Occupation => "occupation",
            DatasetKey::Qualification => "qualification",
            DatasetKey::Caste => "caste",
            DatasetKey::CountryState => "country_state",
            DatasetKey::BiodataOutput => "biodata_output",
            DatasetKey::MaritalStatus => "marital_status",
            DatasetKey::Manglik => "manglik",
        }
    }

    /// Table name without extension, as the files are named on disk.
    pub fn file_stem(&self) -> &'static str {
        match self {
            DatasetKey::Height => "HeightMst",
            DatasetKey::Occupation => "OccupationMst",
            DatasetKey::Qualification => "QualificationMst",
            DatasetKey::Caste => "CasteMst",
            DatasetKey::CountryState => "CountryStateMst",
            DatasetKey::BiodataOutput => "Biodata_Output",
            DatasetKey::MaritalStatus => "MaritalStatusMst",
            DatasetKey::Manglik => "ManglikMst",
        }
    }

    pub(crate) fn index(&self) -> usize {
        match self {
            DatasetKey::Height => 0,
            DatasetKey::Occupation => 1,
            DatasetKey::Qualification => 2,
            DatasetKey::Caste => 3,
            DatasetKey::CountryState => 4,
            DatasetKey::BiodataOutput => 5,
            DatasetKey::MaritalStatus => 6,
            DatasetKey::Manglik => 7,
        }
    }
}

impl fmt::Display for DatasetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DatasetKey {
    type Err = MasterDataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace(['-', ' '], "_");
        DatasetKey::ALL
            .iter()
            .copied()
            .find(|key| key.as_str() == wanted || key.file_stem().to_lowercase() == wanted)
            .ok_or_else(|| MasterDataError::UnknownKey(s.to_string()))
    }
}
