//! Catalogue of public-health measures the lookup accepts.

use std::collections::BTreeSet;

use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

/// Measures published in the county health rankings that the service serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
pub enum Measure {
    #[strum(serialize = "Violent crime rate")]
    ViolentCrimeRate,
    #[strum(serialize = "Unemployment")]
    Unemployment,
    #[strum(serialize = "Children in poverty")]
    ChildrenInPoverty,
    #[strum(serialize = "Diabetic screening")]
    DiabeticScreening,
    #[strum(serialize = "Mammography screening")]
    MammographyScreening,
    #[strum(serialize = "Preventable hospital stays")]
    PreventableHospitalStays,
    #[strum(serialize = "Uninsured")]
    Uninsured,
    #[strum(serialize = "Sexually transmitted infections")]
    SexuallyTransmittedInfections,
    #[strum(serialize = "Physical inactivity")]
    PhysicalInactivity,
    #[strum(serialize = "Adult obesity")]
    AdultObesity,
    #[strum(serialize = "Premature Death")]
    PrematureDeath,
    #[strum(serialize = "Daily fine particulate matter")]
    DailyFineParticulateMatter,
}

/// Immutable set of measure names accepted by `POST /county_data`.
///
/// Membership is exact and case-sensitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowList {
    names: BTreeSet<String>,
}

impl AllowList {
    /// Build an allow-list from arbitrary names.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Check whether a measure name is accepted.
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Number of accepted measures.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether nothing is accepted.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Accepted names in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

impl Default for AllowList {
    fn default() -> Self {
        Self::new(Measure::iter().map(|m| m.to_string()))
    }
}
