//! Raw Property Input

use crate::schema::CategoricalFamily;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A categorical selection as submitted: form values arrive as text, JSON
/// clients may send integer choices such as `"Fireplaces": 2`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CategoryValue {
    /// Text choice
    Text(String),
    /// Integer choice
    Integer(i64),
}

impl fmt::Display for CategoryValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryValue::Text(s) => f.write_str(s),
            CategoryValue::Integer(n) => write!(f, "{}", n),
        }
    }
}

impl From<&str> for CategoryValue {
    fn from(value: &str) -> Self {
        CategoryValue::Text(value.to_string())
    }
}

impl From<String> for CategoryValue {
    fn from(value: String) -> Self {
        CategoryValue::Text(value)
    }
}

impl From<i64> for CategoryValue {
    fn from(value: i64) -> Self {
        CategoryValue::Integer(value)
    }
}

/// Property attributes collected from the user
///
/// Field names on the wire are the schema column names for numeric fields and
/// the family prefixes for categorical ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyInput {
    /// Linear feet of street connected to the property
    #[serde(rename = "LotFrontage")]
    pub lot_frontage: f64,
    /// Lot size (sqft)
    #[serde(rename = "LotArea")]
    pub lot_area: f64,
    /// Masonry veneer area (sqft)
    #[serde(rename = "MasVnrArea")]
    pub mas_vnr_area: f64,
    /// Finished basement area (sqft)
    #[serde(rename = "BsmtFinSF1")]
    pub bsmt_fin_sf1: f64,
    /// First floor area (sqft)
    #[serde(rename = "1stFlrSF")]
    pub first_flr_sf: f64,
    /// Second floor area (sqft)
    #[serde(rename = "2ndFlrSF")]
    pub second_flr_sf: f64,
    /// Garage capacity in cars
    #[serde(rename = "GarageCars")]
    pub garage_cars: f64,
    /// Garage area (sqft)
    #[serde(rename = "GarageArea")]
    pub garage_area: f64,
    /// Wood deck area (sqft)
    #[serde(rename = "WoodDeckSF")]
    pub wood_deck_sf: f64,
    /// Open porch area (sqft)
    #[serde(rename = "OpenPorchSF")]
    pub open_porch_sf: f64,

    #[serde(rename = "MasVnrType")]
    pub mas_vnr_type: CategoryValue,
    #[serde(rename = "HouseStyle")]
    pub house_style: CategoryValue,
    #[serde(rename = "BsmtQual")]
    pub bsmt_qual: CategoryValue,
    #[serde(rename = "BsmtExposure")]
    pub bsmt_exposure: CategoryValue,
    #[serde(rename = "BsmtFinType1")]
    pub bsmt_fin_type1: CategoryValue,
    #[serde(rename = "Fireplaces")]
    pub fireplaces: CategoryValue,
    #[serde(rename = "GarageType")]
    pub garage_type: CategoryValue,
    #[serde(rename = "GarageFinish")]
    pub garage_finish: CategoryValue,
    #[serde(rename = "SaleType")]
    pub sale_type: CategoryValue,
    #[serde(rename = "SaleCondition")]
    pub sale_condition: CategoryValue,
}

impl Default for PropertyInput {
    /// Form defaults: the prefilled numbers and the first option of every selector
    fn default() -> Self {
        let first = |family: CategoricalFamily| CategoryValue::from(family.options()[0]);
        Self {
            lot_frontage: 70.0,
            lot_area: 9600.0,
            mas_vnr_area: 0.0,
            bsmt_fin_sf1: 0.0,
            first_flr_sf: 1464.0,
            second_flr_sf: 0.0,
            garage_cars: 2.0,
            garage_area: 480.0,
            wood_deck_sf: 0.0,
            open_porch_sf: 0.0,
            mas_vnr_type: first(CategoricalFamily::MasVnrType),
            house_style: first(CategoricalFamily::HouseStyle),
            bsmt_qual: first(CategoricalFamily::BsmtQual),
            bsmt_exposure: first(CategoricalFamily::BsmtExposure),
            bsmt_fin_type1: first(CategoricalFamily::BsmtFinType1),
            fireplaces: first(CategoricalFamily::Fireplaces),
            garage_type: first(CategoricalFamily::GarageType),
            garage_finish: first(CategoricalFamily::GarageFinish),
            sale_type: first(CategoricalFamily::SaleType),
            sale_condition: first(CategoricalFamily::SaleCondition),
        }
    }
}

impl PropertyInput {
    /// Numeric fields paired with their schema column names, in schema order
    pub fn numeric_values(&self) -> [(&'static str, f64); 10] {
        [
            ("LotFrontage", self.lot_frontage),
            ("LotArea", self.lot_area),
            ("MasVnrArea", self.mas_vnr_area),
            ("BsmtFinSF1", self.bsmt_fin_sf1),
            ("1stFlrSF", self.first_flr_sf),
            ("2ndFlrSF", self.second_flr_sf),
            ("GarageCars", self.garage_cars),
            ("GarageArea", self.garage_area),
            ("WoodDeckSF", self.wood_deck_sf),
            ("OpenPorchSF", self.open_porch_sf),
        ]
    }

    /// Selected value for a family
    pub fn selection(&self, family: CategoricalFamily) -> &CategoryValue {
        match family {
            CategoricalFamily::MasVnrType => &self.mas_vnr_type,
            CategoricalFamily::HouseStyle => &self.house_style,
            CategoricalFamily::BsmtQual => &self.bsmt_qual,
            CategoricalFamily::BsmtExposure => &self.bsmt_exposure,
            CategoricalFamily::BsmtFinType1 => &self.bsmt_fin_type1,
            CategoricalFamily::Fireplaces => &self.fireplaces,
            CategoricalFamily::GarageType => &self.garage_type,
            CategoricalFamily::GarageFinish => &self.garage_finish,
            CategoricalFamily::SaleType => &self.sale_type,
            CategoricalFamily::SaleCondition => &self.sale_condition,
        }
    }

    /// Replace the selected value for a family
    pub fn set_selection(&mut self, family: CategoricalFamily, value: impl Into<CategoryValue>) {
        let slot = match family {
            CategoricalFamily::MasVnrType => &mut self.mas_vnr_type,
            CategoricalFamily::HouseStyle => &mut self.house_style,
            CategoricalFamily::BsmtQual => &mut self.bsmt_qual,
            CategoricalFamily::BsmtExposure => &mut self.bsmt_exposure,
            CategoricalFamily::BsmtFinType1 => &mut self.bsmt_fin_type1,
            CategoricalFamily::Fireplaces => &mut self.fireplaces,
            CategoricalFamily::GarageType => &mut self.garage_type,
            CategoricalFamily::GarageFinish => &mut self.garage_finish,
            CategoricalFamily::SaleType => &mut self.sale_type,
            CategoricalFamily::SaleCondition => &mut self.sale_condition,
        };
        *slot = value.into();
    }

    /// Builder-style variant of [`PropertyInput::set_selection`]
    pub fn with_selection(mut self, family: CategoricalFamily, value: impl Into<CategoryValue>) -> Self {
        self.set_selection(family, value);
        self
    }

    /// Every family with its selected value, in schema order
    pub fn selections(&self) -> impl Iterator<Item = (CategoricalFamily, &CategoryValue)> + '_ {
        CategoricalFamily::ALL
            .into_iter()
            .map(move |family| (family, self.selection(family)))
    }

    /// `{family}_{value}` keys for every selection, whether or not the schema
    /// knows them
    pub fn indicator_keys(&self) -> Vec<String> {
        self.selections()
            .map(|(family, value)| family.indicator_key(&value.to_string()))
            .collect()
    }
}
