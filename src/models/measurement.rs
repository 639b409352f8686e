use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::user::Gender;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeasurementField {
    Height,
    Weight,
    Chest,
    Bust,
    Underbust,
    Waist,
    Hips,
    Neck,
    ShoulderWidth,
    ArmLength,
    Inseam,
    Thigh,
    ShoeSize,
}

const MALE_FIELDS: &[MeasurementField] = &[
    MeasurementField::Height,
    MeasurementField::Weight,
    MeasurementField::Chest,
    MeasurementField::Waist,
    MeasurementField::Hips,
    MeasurementField::Neck,
    MeasurementField::ShoulderWidth,
    MeasurementField::ArmLength,
    MeasurementField::Inseam,
    MeasurementField::Thigh,
    MeasurementField::ShoeSize,
];

const FEMALE_FIELDS: &[MeasurementField] = &[
    MeasurementField::Height,
    MeasurementField::Weight,
    MeasurementField::Bust,
    MeasurementField::Underbust,
    MeasurementField::Waist,
    MeasurementField::Hips,
    MeasurementField::ShoulderWidth,
    MeasurementField::ArmLength,
    MeasurementField::Inseam,
    MeasurementField::Thigh,
    MeasurementField::ShoeSize,
];

pub fn allowed_fields(gender: Gender) -> &'static [MeasurementField] {
    match gender {
        Gender::Male => MALE_FIELDS,
        Gender::Female => FEMALE_FIELDS,
    }
}

const MAX_MEASUREMENT: f64 = 500.0;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Measurements {
    pub height: Option<f64>,
    pub weight: Option<f64>,
    pub chest: Option<f64>,
    pub bust: Option<f64>,
    pub underbust: Option<f64>,
    pub waist: Option<f64>,
    pub hips: Option<f64>,
    pub neck: Option<f64>,
    pub shoulder_width: Option<f64>,
    pub arm_length: Option<f64>,
    pub inseam: Option<f64>,
    pub thigh: Option<f64>,
    pub shoe_size: Option<f64>,
}

impl Measurements {
    pub fn get(&self, field: MeasurementField) -> Option<f64> {
        match field {
            MeasurementField::Height => self.height,
            MeasurementField::Weight => self.weight,
            MeasurementField::Chest => self.chest,
            MeasurementField::Bust => self.bust,
            MeasurementField::Underbust => self.underbust,
            MeasurementField::Waist => self.waist,
            MeasurementField::Hips => self.hips,
            MeasurementField::Neck => self.neck,
            MeasurementField::ShoulderWidth => self.shoulder_width,
            MeasurementField::ArmLength => self.arm_length,
            MeasurementField::Inseam => self.inseam,
            MeasurementField::Thigh => self.thigh,
            MeasurementField::ShoeSize => self.shoe_size,
        }
    }

    fn set(&mut self, field: MeasurementField, value: Option<f64>) {
        let slot = match field {
            MeasurementField::Height => &mut self.height,
            MeasurementField::Weight => &mut self.weight,
            MeasurementField::Chest => &mut self.chest,
            MeasurementField::Bust => &mut self.bust,
            MeasurementField::Underbust => &mut self.underbust,
            MeasurementField::Waist => &mut self.waist,
            MeasurementField::Hips => &mut self.hips,
            MeasurementField::Neck => &mut self.neck,
            MeasurementField::ShoulderWidth => &mut self.shoulder_width,
            MeasurementField::ArmLength => &mut self.arm_length,
            MeasurementField::Inseam => &mut self.inseam,
            MeasurementField::Thigh => &mut self.thigh,
            MeasurementField::ShoeSize => &mut self.shoe_size,
        };
        *slot = value;
    }

    /// 只保留该性别允许的字段，其余一律置空
    pub fn restricted_to(&self, gender: Gender) -> Measurements {
        let mut filtered = Measurements::default();
        for field in allowed_fields(gender) {
            filtered.set(*field, self.get(*field));
        }
        filtered
    }

    pub fn validate_values(&self) -> Result<()> {
        for field in MALE_FIELDS.iter().chain(FEMALE_FIELDS.iter()) {
            if let Some(value) = self.get(*field) {
                if !value.is_finite() || value <= 0.0 || value > MAX_MEASUREMENT {
                    return Err(AppError::Validation(format!(
                        "{:?} must be greater than 0 and at most {}",
                        field, MAX_MEASUREMENT
                    )));
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct MeasurementRecord {
    pub user_id: Uuid,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub values: Measurements,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn full_set() -> Measurements {
        Measurements {
            height: Some(170.0),
            weight: Some(65.0),
            chest: Some(96.0),
            bust: Some(90.0),
            underbust: Some(75.0),
            waist: Some(78.0),
            hips: Some(95.0),
            neck: Some(38.0),
            shoulder_width: Some(44.0),
            arm_length: Some(60.0),
            inseam: Some(80.0),
            thigh: Some(55.0),
            shoe_size: Some(42.0),
        }
    }

    #[test]
    fn test_male_filter_drops_female_only_fields() {
        let filtered = full_set().restricted_to(Gender::Male);

        assert_eq!(filtered.chest, Some(96.0));
        assert_eq!(filtered.neck, Some(38.0));
        assert_eq!(filtered.bust, None);
        assert_eq!(filtered.underbust, None);
    }

    #[test]
    fn test_female_filter_drops_male_only_fields() {
        let filtered = full_set().restricted_to(Gender::Female);

        assert_eq!(filtered.bust, Some(90.0));
        assert_eq!(filtered.underbust, Some(75.0));
        assert_eq!(filtered.chest, None);
        assert_eq!(filtered.neck, None);
        assert_eq!(filtered.waist, Some(78.0));
    }

    #[test]
    fn test_validate_values_bounds() {
        assert!(full_set().validate_values().is_ok());

        let negative = Measurements { waist: Some(-1.0), ..Default::default() };
        assert!(negative.validate_values().is_err());

        let huge = Measurements { height: Some(900.0), ..Default::default() };
        assert!(huge.validate_values().is_err());

        let nan = Measurements { hips: Some(f64::NAN), ..Default::default() };
        assert!(nan.validate_values().is_err());
    }

    fn gender_strategy() -> impl Strategy<Value = Gender> {
        prop_oneof![Just(Gender::Male), Just(Gender::Female)]
    }

    proptest! {
        #[test]
        fn prop_filter_is_idempotent_and_subset(
            gender in gender_strategy(),
            values in proptest::collection::vec(proptest::option::of(1.0f64..400.0), 13),
        ) {
            let input = Measurements {
                height: values[0], weight: values[1], chest: values[2], bust: values[3],
                underbust: values[4], waist: values[5], hips: values[6], neck: values[7],
                shoulder_width: values[8], arm_length: values[9], inseam: values[10],
                thigh: values[11], shoe_size: values[12],
            };

            let once = input.restricted_to(gender);
            prop_assert_eq!(once.restricted_to(gender), once.clone());

            let allowed = allowed_fields(gender);
            for field in MALE_FIELDS.iter().chain(FEMALE_FIELDS.iter()) {
                if allowed.contains(field) {
                    prop_assert_eq!(once.get(*field), input.get(*field));
                } else {
                    prop_assert_eq!(once.get(*field), None);
                }
            }
        }
    }
}
