//! One-Hot Feature Row Assembly

use crate::input::PropertyInput;
use crate::schema::{index_of, CategoricalFamily, FEATURE_COUNT, FEATURE_NAMES, NUMERIC_FEATURES};
use crate::FeatureError;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use tracing::{debug, warn};

/// What to do with a selection whose `{family}_{value}` column is not in the
/// schema
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnmatchedCategoryPolicy {
    /// Drop the selection, leaving every indicator of the family at 0
    #[default]
    Ignore,
    /// Drop the selection and log a warning
    Warn,
    /// Fail the encoding
    Reject,
}

/// A single encoded row keyed by the canonical schema
///
/// Cells are only written by [`Encoder::encode`]; consumers get read access.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EncodedRow {
    values: [f64; FEATURE_COUNT],
}

impl EncodedRow {
    fn zeros() -> Self {
        Self {
            values: [0.0; FEATURE_COUNT],
        }
    }

    /// Value of a named column
    pub fn get(&self, name: &str) -> Option<f64> {
        index_of(name).map(|i| self.values[i])
    }

    /// Cells in schema order
    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    /// Number of columns (always [`FEATURE_COUNT`])
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the row has no columns
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Column names paired with values, in schema order
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        FEATURE_NAMES.iter().copied().zip(self.values.iter().copied())
    }

    /// Indicator columns set to 1
    pub fn active_indicators(&self) -> Vec<&'static str> {
        self.iter()
            .skip(NUMERIC_FEATURES.len())
            .filter(|(_, v)| *v == 1.0)
            .map(|(name, _)| name)
            .collect()
    }

    /// Copy of the cells for handoff to the scaler
    pub fn to_vec(&self) -> Vec<f64> {
        self.values.to_vec()
    }
}

impl Serialize for EncodedRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(FEATURE_COUNT))?;
        for (name, value) in self.iter() {
            map.serialize_entry(name, &value)?;
        }
        map.end()
    }
}

/// Builds [`EncodedRow`]s from raw property input
#[derive(Debug, Clone, Copy, Default)]
pub struct Encoder {
    policy: UnmatchedCategoryPolicy,
}

impl Encoder {
    /// Create an encoder with the given unmatched-category policy
    pub fn new(policy: UnmatchedCategoryPolicy) -> Self {
        Self { policy }
    }

    /// Encode one input into a fresh row
    ///
    /// Numeric values are copied verbatim; range checks belong to the caller.
    pub fn encode(&self, input: &PropertyInput) -> Result<EncodedRow, FeatureError> {
        let mut row = EncodedRow::zeros();

        for (name, value) in input.numeric_values() {
            let idx = index_of(name).ok_or_else(|| FeatureError::UnknownColumn(name.to_string()))?;
            row.values[idx] = value;
        }

        for (family, value) in input.selections() {
            let key = family.indicator_key(&value.to_string());
            match index_of(&key) {
                Some(idx) => row.values[idx] = 1.0,
                None => self.handle_unmatched(family, &value.to_string(), &key)?,
            }
        }

        debug!("Encoded row with {} active indicators", row.active_indicators().len());
        Ok(row)
    }

    fn handle_unmatched(
        &self,
        family: CategoricalFamily,
        value: &str,
        key: &str,
    ) -> Result<(), FeatureError> {
        match self.policy {
            UnmatchedCategoryPolicy::Ignore => Ok(()),
            UnmatchedCategoryPolicy::Warn => {
                warn!("Dropping selection {}: column not in schema", key);
                Ok(())
            }
            UnmatchedCategoryPolicy::Reject => Err(FeatureError::UnknownCategory {
                family,
                value: value.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::CategoryValue;
    use proptest::prelude::*;
    use std::sync::{Arc, Mutex};

    fn reference_input() -> PropertyInput {
        PropertyInput {
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
            mas_vnr_type: "None".into(),
            house_style: "1Story".into(),
            bsmt_qual: "TA".into(),
            bsmt_exposure: "No".into(),
            bsmt_fin_type1: "Unf".into(),
            fireplaces: CategoryValue::Integer(0),
            garage_type: "Attchd".into(),
            garage_finish: "Unf".into(),
            sale_type: "WD".into(),
            sale_condition: "Normal".into(),
        }
    }

    fn family_cells(row: &EncodedRow, family: CategoricalFamily) -> Vec<f64> {
        family
            .indicator_indices()
            .into_iter()
            .map(|i| row.as_slice()[i])
            .collect()
    }

    #[test]
    fn test_reference_row() {
        let row = Encoder::default().encode(&reference_input()).unwrap();

        assert_eq!(row.len(), FEATURE_COUNT);
        assert!(!row.is_empty());
        assert_eq!(row.get("LotFrontage"), Some(70.0));
        assert_eq!(row.get("LotArea"), Some(9600.0));
        assert_eq!(row.get("1stFlrSF"), Some(1464.0));
        assert_eq!(row.get("GarageCars"), Some(2.0));
        assert_eq!(row.get("GarageArea"), Some(480.0));

        let expected = [
            "MasVnrType_None",
            "HouseStyle_1Story",
            "BsmtQual_TA",
            "BsmtExposure_No",
            "BsmtFinType1_Unf",
            "Fireplaces_0",
            "GarageType_Attchd",
            "GarageFinish_Unf",
            "SaleType_WD",
            "SaleCondition_Normal",
        ];
        assert_eq!(row.active_indicators(), expected.to_vec());

        let ones = row.as_slice()[NUMERIC_FEATURES.len()..]
            .iter()
            .filter(|&&v| v == 1.0)
            .count();
        assert_eq!(ones, expected.len());
    }

    #[test]
    fn test_unmatched_category_is_dropped_by_default() {
        let input = reference_input().with_selection(CategoricalFamily::Fireplaces, 4i64);
        let row = Encoder::default().encode(&input).unwrap();

        assert!(family_cells(&row, CategoricalFamily::Fireplaces)
            .iter()
            .all(|&v| v == 0.0));
        assert_eq!(row.active_indicators().len(), 9);
    }

    /// Collects formatted log output for assertions
    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl CapturedLogs {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    #[test]
    fn test_unmatched_category_warn_still_encodes() {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        let input = reference_input().with_selection(CategoricalFamily::SaleType, "ConLD");
        let row = tracing::subscriber::with_default(subscriber, || {
            Encoder::new(UnmatchedCategoryPolicy::Warn).encode(&input).unwrap()
        });

        assert!(family_cells(&row, CategoricalFamily::SaleType)
            .iter()
            .all(|&v| v == 0.0));
        let output = logs.text();
        assert!(output.contains("WARN"));
        assert!(output.contains("SaleType_ConLD"));
    }

    #[test]
    fn test_unmatched_category_ignore_is_silent() {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        let input = reference_input().with_selection(CategoricalFamily::SaleType, "ConLD");
        tracing::subscriber::with_default(subscriber, || {
            Encoder::default().encode(&input).unwrap();
        });
        assert!(logs.text().is_empty());
    }

    #[test]
    fn test_unmatched_category_rejected() {
        let input = reference_input().with_selection(CategoricalFamily::SaleType, "ConLD");
        let err = Encoder::new(UnmatchedCategoryPolicy::Reject)
            .encode(&input)
            .unwrap_err();
        assert!(matches!(
            err,
            FeatureError::UnknownCategory { family: CategoricalFamily::SaleType, ref value } if value == "ConLD"
        ));
    }

    #[test]
    fn test_text_and_integer_choices_encode_alike() {
        let encoder = Encoder::default();
        let text = encoder
            .encode(&reference_input().with_selection(CategoricalFamily::Fireplaces, "2"))
            .unwrap();
        let int = encoder
            .encode(&reference_input().with_selection(CategoricalFamily::Fireplaces, 2i64))
            .unwrap();
        assert_eq!(text, int);
        assert_eq!(text.get("Fireplaces_2"), Some(1.0));
    }

    #[test]
    fn test_serializes_as_ordered_map() {
        let row = Encoder::default().encode(&reference_input()).unwrap();
        let json = serde_json::to_string(&row).unwrap();
        assert!(json.starts_with("{\"LotFrontage\":70.0,\"LotArea\":9600.0"));
        assert!(json.ends_with("\"SaleCondition_Abnorml\":0.0}"));
    }

    fn arb_input() -> impl Strategy<Value = PropertyInput> {
        (
            proptest::collection::vec(0.0f64..1.0e6, 10),
            proptest::collection::vec(any::<prop::sample::Index>(), 10),
        )
            .prop_map(|(numbers, picks)| {
                let mut input = PropertyInput {
                    lot_frontage: numbers[0],
                    lot_area: numbers[1],
                    mas_vnr_area: numbers[2],
                    bsmt_fin_sf1: numbers[3],
                    first_flr_sf: numbers[4],
                    second_flr_sf: numbers[5],
                    garage_cars: numbers[6],
                    garage_area: numbers[7],
                    wood_deck_sf: numbers[8],
                    open_porch_sf: numbers[9],
                    ..PropertyInput::default()
                };
                for (family, pick) in CategoricalFamily::ALL.into_iter().zip(picks) {
                    let options = family.options();
                    input.set_selection(family, options[pick.index(options.len())]);
                }
                input
            })
    }

    proptest! {
        #[test]
        fn prop_numeric_cells_copy_input(input in arb_input()) {
            let row = Encoder::default().encode(&input).unwrap();
            prop_assert_eq!(row.len(), FEATURE_COUNT);
            for (name, value) in input.numeric_values() {
                prop_assert_eq!(row.get(name), Some(value));
            }
        }

        #[test]
        fn prop_one_indicator_per_family(input in arb_input()) {
            let row = Encoder::default().encode(&input).unwrap();
            for family in CategoricalFamily::ALL {
                let cells = family_cells(&row, family);
                prop_assert_eq!(cells.iter().filter(|&&v| v == 1.0).count(), 1);
                prop_assert!(cells.iter().all(|&v| v == 0.0 || v == 1.0));
            }
        }

        #[test]
        fn prop_encoding_is_deterministic(input in arb_input()) {
            let encoder = Encoder::default();
            let first = encoder.encode(&input).unwrap();
            let second = encoder.encode(&input).unwrap();
            let first_bits: Vec<u64> = first.as_slice().iter().map(|v| v.to_bits()).collect();
            let second_bits: Vec<u64> = second.as_slice().iter().map(|v| v.to_bits()).collect();
            prop_assert_eq!(first_bits, second_bits);
        }
    }
}
