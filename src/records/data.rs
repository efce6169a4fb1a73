//! Typed records and the closed geographic enumeration

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::aggregate::YearMonth;

/// Region code of Brussels, the only region without provinces
pub const BRUSSELS_REGION_CODE: &str = "04000";

/// Number of survival horizons carried by a cohort (years 1 through 5)
pub const SURVIVAL_HORIZONS: usize = 5;

/// Geographic grouping level of every output
///
/// The ten provinces and Brussels are the entities the dashboard reports on.
/// Vlaanderen and Wallonië only appear when region rollups are enabled.
/// Declaration order is the stable entity ordering used in combined tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum GeographicEntity {
    Antwerpen,
    VlaamsBrabant,
    WaalsBrabant,
    WestVlaanderen,
    OostVlaanderen,
    Henegouwen,
    Luik,
    Limburg,
    Luxemburg,
    Namen,
    Brussels,
    Vlaanderen,
    Wallonie,
}

impl GeographicEntity {
    /// The ten provinces plus Brussels, in reporting order
    pub const REPORTED: [GeographicEntity; 11] = [
        GeographicEntity::Antwerpen,
        GeographicEntity::VlaamsBrabant,
        GeographicEntity::WaalsBrabant,
        GeographicEntity::WestVlaanderen,
        GeographicEntity::OostVlaanderen,
        GeographicEntity::Henegouwen,
        GeographicEntity::Luik,
        GeographicEntity::Limburg,
        GeographicEntity::Luxemburg,
        GeographicEntity::Namen,
        GeographicEntity::Brussels,
    ];

    /// Regions that only exist as rollups of their provinces
    pub const ROLLUP_REGIONS: [GeographicEntity; 2] =
        [GeographicEntity::Vlaanderen, GeographicEntity::Wallonie];

    /// Look up a province by its REFNIS code
    pub fn from_province_code(code: &str) -> Option<Self> {
        let entity = match code {
            "10000" => GeographicEntity::Antwerpen,
            "20001" => GeographicEntity::VlaamsBrabant,
            "20002" => GeographicEntity::WaalsBrabant,
            "30000" => GeographicEntity::WestVlaanderen,
            "40000" => GeographicEntity::OostVlaanderen,
            "50000" => GeographicEntity::Henegouwen,
            "60000" => GeographicEntity::Luik,
            "70000" => GeographicEntity::Limburg,
            "80000" => GeographicEntity::Luxemburg,
            "90000" => GeographicEntity::Namen,
            _ => return None,
        };
        Some(entity)
    }

    /// Look up a region by its REFNIS code
    pub fn from_region_code(code: &str) -> Option<Self> {
        match code {
            "02000" => Some(GeographicEntity::Vlaanderen),
            "03000" => Some(GeographicEntity::Wallonie),
            BRUSSELS_REGION_CODE => Some(GeographicEntity::Brussels),
            _ => None,
        }
    }

    /// REFNIS code of the entity (province code, or region code for regions)
    pub fn code(&self) -> &'static str {
        match self {
            GeographicEntity::Antwerpen => "10000",
            GeographicEntity::VlaamsBrabant => "20001",
            GeographicEntity::WaalsBrabant => "20002",
            GeographicEntity::WestVlaanderen => "30000",
            GeographicEntity::OostVlaanderen => "40000",
            GeographicEntity::Henegouwen => "50000",
            GeographicEntity::Luik => "60000",
            GeographicEntity::Limburg => "70000",
            GeographicEntity::Luxemburg => "80000",
            GeographicEntity::Namen => "90000",
            GeographicEntity::Brussels => BRUSSELS_REGION_CODE,
            GeographicEntity::Vlaanderen => "02000",
            GeographicEntity::Wallonie => "03000",
        }
    }

    /// Dutch display name, also used as the output folder name
    pub fn name(&self) -> &'static str {
        match self {
            GeographicEntity::Antwerpen => "Antwerpen",
            GeographicEntity::VlaamsBrabant => "Vlaams-Brabant",
            GeographicEntity::WaalsBrabant => "Waals-Brabant",
            GeographicEntity::WestVlaanderen => "West-Vlaanderen",
            GeographicEntity::OostVlaanderen => "Oost-Vlaanderen",
            GeographicEntity::Henegouwen => "Henegouwen",
            GeographicEntity::Luik => "Luik",
            GeographicEntity::Limburg => "Limburg",
            GeographicEntity::Luxemburg => "Luxemburg",
            GeographicEntity::Namen => "Namen",
            GeographicEntity::Brussels => "Brussels",
            GeographicEntity::Vlaanderen => "Vlaanderen",
            GeographicEntity::Wallonie => "Wallonië",
        }
    }

    /// Whether the entity is subdivided into provinces
    ///
    /// Region-only records are accepted solely for entities without provinces.
    pub fn has_provinces(&self) -> bool {
        matches!(self, GeographicEntity::Vlaanderen | GeographicEntity::Wallonie)
    }

    /// Region a province rolls up into; None for region-level entities
    pub fn region(&self) -> Option<GeographicEntity> {
        match self {
            GeographicEntity::Antwerpen
            | GeographicEntity::VlaamsBrabant
            | GeographicEntity::WestVlaanderen
            | GeographicEntity::OostVlaanderen
            | GeographicEntity::Limburg => Some(GeographicEntity::Vlaanderen),
            GeographicEntity::WaalsBrabant
            | GeographicEntity::Henegouwen
            | GeographicEntity::Luik
            | GeographicEntity::Luxemburg
            | GeographicEntity::Namen => Some(GeographicEntity::Wallonie),
            GeographicEntity::Brussels
            | GeographicEntity::Vlaanderen
            | GeographicEntity::Wallonie => None,
        }
    }
}

impl fmt::Display for GeographicEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Construction versus every other sector
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Sector {
    Construction,
    NonConstruction,
}

impl Sector {
    /// Classify a NACE section code by exact match on the construction code
    pub fn classify(code: &str, construction_code: &str) -> Self {
        if code == construction_code {
            Sector::Construction
        } else {
            Sector::NonConstruction
        }
    }

    pub fn is_construction(&self) -> bool {
        matches!(self, Sector::Construction)
    }
}

/// One value per sector
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BySector<T> {
    pub construction: T,
    pub non_construction: T,
}

impl<T> BySector<T> {
    pub fn new(construction: T, non_construction: T) -> Self {
        Self { construction, non_construction }
    }

    pub fn get(&self, sector: Sector) -> &T {
        match sector {
            Sector::Construction => &self.construction,
            Sector::NonConstruction => &self.non_construction,
        }
    }

    pub fn get_mut(&mut self, sector: Sector) -> &mut T {
        match sector {
            Sector::Construction => &mut self.construction,
            Sector::NonConstruction => &mut self.non_construction,
        }
    }

    /// Apply `f` to both sectors
    pub fn map<U, F: FnMut(Sector, &T) -> U>(&self, mut f: F) -> BySector<U> {
        BySector {
            construction: f(Sector::Construction, &self.construction),
            non_construction: f(Sector::NonConstruction, &self.non_construction),
        }
    }
}

/// A normalized row of the VAT survivals file
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurvivalRecord {
    pub cohort_year: i32,
    pub entity: GeographicEntity,
    pub sector: Sector,
    /// First VAT registrations in the cohort year (never zero after normalization)
    pub first_registrations: u64,
    /// Businesses still active after 1..=5 years
    pub survivors: [u64; SURVIVAL_HORIZONS],
}

impl SurvivalRecord {
    /// Same record attributed to another entity (used for region rollups)
    pub fn with_entity(&self, entity: GeographicEntity) -> Self {
        Self { entity, ..*self }
    }
}

/// A normalized row of the bankruptcies file
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BankruptcyRecord {
    pub period: YearMonth,
    pub entity: GeographicEntity,
    pub sector: Sector,
    pub bankruptcies: f64,
}

impl BankruptcyRecord {
    /// Same record attributed to another entity (used for region rollups)
    pub fn with_entity(&self, entity: GeographicEntity) -> Self {
        Self { entity, ..*self }
    }
}
