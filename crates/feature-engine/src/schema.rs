//! Canonical Feature Schema
//!
//! Column order is the order the scaler and the model were fitted on. Any
//! reordering here silently corrupts predictions, so the list is a compile-time
//! constant and nothing else in the workspace builds column names by hand.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of columns in an encoded row
pub const FEATURE_COUNT: usize = 55;

/// Numeric input columns, in schema order
pub const NUMERIC_FEATURES: [&str; 10] = [
    "LotFrontage",
    "LotArea",
    "MasVnrArea",
    "BsmtFinSF1",
    "1stFlrSF",
    "2ndFlrSF",
    "GarageCars",
    "GarageArea",
    "WoodDeckSF",
    "OpenPorchSF",
];

/// All columns in fitted order: numeric columns, then one-hot indicators
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "LotFrontage",
    "LotArea",
    "MasVnrArea",
    "BsmtFinSF1",
    "1stFlrSF",
    "2ndFlrSF",
    "GarageCars",
    "GarageArea",
    "WoodDeckSF",
    "OpenPorchSF",
    "MasVnrType_BrkCmn",
    "MasVnrType_BrkFace",
    "MasVnrType_None",
    "MasVnrType_Stone",
    "HouseStyle_1.5Fin",
    "HouseStyle_1.5Unf",
    "HouseStyle_1Story",
    "HouseStyle_2.5Fin",
    "HouseStyle_2.5Unf",
    "HouseStyle_2Story",
    "HouseStyle_SFoyer",
    "HouseStyle_SLvl",
    "BsmtQual_Ex",
    "BsmtQual_Fa",
    "BsmtQual_Gd",
    "BsmtQual_TA",
    "BsmtExposure_Av",
    "BsmtExposure_Gd",
    "BsmtExposure_Mn",
    "BsmtExposure_No",
    "BsmtFinType1_ALQ",
    "BsmtFinType1_BLQ",
    "BsmtFinType1_GLQ",
    "BsmtFinType1_LwQ",
    "BsmtFinType1_Rec",
    "BsmtFinType1_Unf",
    "Fireplaces_0",
    "Fireplaces_1",
    "Fireplaces_2",
    "Fireplaces_3",
    "GarageType_Attchd",
    "GarageType_Detchd",
    "GarageType_BuiltIn",
    "GarageType_CarPort",
    "GarageType_None",
    "GarageFinish_Fin",
    "GarageFinish_RFn",
    "GarageFinish_Unf",
    "SaleType_WD",
    "SaleType_New",
    "SaleType_COD",
    "SaleType_CWD",
    "SaleCondition_Normal",
    "SaleCondition_Partial",
    "SaleCondition_Abnorml",
];

/// Canonical column list
pub fn feature_names() -> &'static [&'static str] {
    &FEATURE_NAMES
}

/// Position of a column in the schema
pub fn index_of(name: &str) -> Option<usize> {
    FEATURE_NAMES.iter().position(|&n| n == name)
}

/// Categorical input families, each expanded into one-hot indicator columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CategoricalFamily {
    /// Masonry veneer type
    MasVnrType,
    /// Dwelling style
    HouseStyle,
    /// Basement height rating
    BsmtQual,
    /// Walkout or garden level basement walls
    BsmtExposure,
    /// Rating of basement finished area
    BsmtFinType1,
    /// Number of fireplaces
    Fireplaces,
    /// Garage location
    GarageType,
    /// Interior finish of the garage
    GarageFinish,
    /// Type of sale
    SaleType,
    /// Condition of sale
    SaleCondition,
}

impl CategoricalFamily {
    /// All families in schema order
    pub const ALL: [CategoricalFamily; 10] = [
        CategoricalFamily::MasVnrType,
        CategoricalFamily::HouseStyle,
        CategoricalFamily::BsmtQual,
        CategoricalFamily::BsmtExposure,
        CategoricalFamily::BsmtFinType1,
        CategoricalFamily::Fireplaces,
        CategoricalFamily::GarageType,
        CategoricalFamily::GarageFinish,
        CategoricalFamily::SaleType,
        CategoricalFamily::SaleCondition,
    ];

    /// Column prefix shared by the family's indicators
    pub fn prefix(&self) -> &'static str {
        match self {
            CategoricalFamily::MasVnrType => "MasVnrType",
            CategoricalFamily::HouseStyle => "HouseStyle",
            CategoricalFamily::BsmtQual => "BsmtQual",
            CategoricalFamily::BsmtExposure => "BsmtExposure",
            CategoricalFamily::BsmtFinType1 => "BsmtFinType1",
            CategoricalFamily::Fireplaces => "Fireplaces",
            CategoricalFamily::GarageType => "GarageType",
            CategoricalFamily::GarageFinish => "GarageFinish",
            CategoricalFamily::SaleType => "SaleType",
            CategoricalFamily::SaleCondition => "SaleCondition",
        }
    }

    /// Choices offered by the input form, in display order
    pub fn options(&self) -> &'static [&'static str] {
        match self {
            CategoricalFamily::MasVnrType => &["BrkFace", "Stone", "BrkCmn", "None"],
            CategoricalFamily::HouseStyle => &[
                "1Story", "2Story", "1.5Fin", "1.5Unf", "2.5Fin", "2.5Unf", "SFoyer", "SLvl",
            ],
            CategoricalFamily::BsmtQual => &["Ex", "Gd", "TA", "Fa"],
            CategoricalFamily::BsmtExposure => &["Av", "Gd", "Mn", "No"],
            CategoricalFamily::BsmtFinType1 => &["GLQ", "ALQ", "BLQ", "Rec", "LwQ", "Unf"],
            CategoricalFamily::Fireplaces => &["0", "1", "2", "3"],
            CategoricalFamily::GarageType => &["Attchd", "Detchd", "BuiltIn", "CarPort", "None"],
            CategoricalFamily::GarageFinish => &["Fin", "RFn", "Unf"],
            CategoricalFamily::SaleType => &["WD", "New", "COD", "CWD"],
            CategoricalFamily::SaleCondition => &["Normal", "Partial", "Abnorml"],
        }
    }

    /// Human-readable label for the form
    pub fn label(&self) -> &'static str {
        match self {
            CategoricalFamily::MasVnrType => "Masonry veneer type",
            CategoricalFamily::HouseStyle => "House style",
            CategoricalFamily::BsmtQual => "Basement quality",
            CategoricalFamily::BsmtExposure => "Basement exposure",
            CategoricalFamily::BsmtFinType1 => "Basement finish type",
            CategoricalFamily::Fireplaces => "Fireplaces",
            CategoricalFamily::GarageType => "Garage type",
            CategoricalFamily::GarageFinish => "Garage finish",
            CategoricalFamily::SaleType => "Sale type",
            CategoricalFamily::SaleCondition => "Sale condition",
        }
    }

    /// Indicator column name for a selected value: `{prefix}_{value}`
    pub fn indicator_key(&self, value: &str) -> String {
        format!("{}_{}", self.prefix(), value)
    }

    /// Schema positions of every indicator column in this family
    pub fn indicator_indices(&self) -> Vec<usize> {
        let prefix = self.prefix();
        FEATURE_NAMES
            .iter()
            .enumerate()
            .filter(|(_, name)| {
                name.strip_prefix(prefix)
                    .is_some_and(|rest| rest.starts_with('_'))
            })
            .map(|(i, _)| i)
            .collect()
    }
}

impl fmt::Display for CategoricalFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}
