use serde::{Deserialize, Serialize};

/// Row of `n_countries`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Country {
    /// Country id
    pub country_id: i64,
    /// Display name
    pub country_name: String,
    /// ISO code
    pub country_code: Option<String>,
}

/// Row of `new_universities`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct University {
    /// Row id
    pub id: i64,
    /// Display name
    pub university_name: String,
    /// City
    pub city: Option<String>,
    /// State or province
    pub state_province: Option<String>,
    /// Country id
    pub country_id: i64,
    /// Public, private, ...
    pub university_type: Option<String>,
}

/// Row of `new_courses`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    /// Row id
    pub id: i64,
    /// Programme title
    pub program_name: String,
    /// Offering university
    pub university_id: i64,
    /// Bachelor, Master, ...
    pub degree_level: Option<String>,
}

/// Row of `pathways`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pathway {
    /// Row id
    pub id: i64,
    /// Display name
    pub name: String,
    /// Longer description
    pub description: Option<String>,
}
