//! The listing record and its input models.
//!
//! Inputs deserialize leniently (`serde_json::Value` per field) so that a
//! missing or mistyped field surfaces as a validation error naming the
//! field, not as a deserializer rejection.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::ServiceError;
use crate::sanitize;

/// Property offer kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PropertyType {
    Rent,
    Sale,
}

impl PropertyType {
    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "Rent" => Some(Self::Rent),
            "Sale" => Some(Self::Sale),
            _ => None,
        }
    }
}

/// One real-estate record, keyed by `PropertyID`. Field names on the wire
/// match the stored attribute names exactly.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    #[serde(rename = "PropertyID")]
    pub property_id: String,
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Description")]
    pub description: String,
    #[serde(rename = "PropertyType")]
    pub property_type: PropertyType,
    #[serde(rename = "Price")]
    pub price: f64,
    #[serde(rename = "PropertyLocation")]
    pub property_location: String,
}

/// Create payload. All six fields are required; [`ListingInput::validate`]
/// checks them in declaration order and reports the first offender.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ListingInput {
    #[serde(rename = "PropertyID", default)]
    pub property_id: Value,
    #[serde(rename = "Title", default)]
    pub title: Value,
    #[serde(rename = "Description", default)]
    pub description: Value,
    #[serde(rename = "PropertyType", default)]
    pub property_type: Value,
    #[serde(rename = "Price", default)]
    pub price: Value,
    #[serde(rename = "PropertyLocation", default)]
    pub property_location: Value,
}

impl ListingInput {
    /// Validate every field and build the record to persist. String fields
    /// are sanitized after validation, independent of it.
    pub fn validate(&self) -> Result<Listing, ServiceError> {
        let property_id = require_string("PropertyID", &self.property_id)?;
        let title = require_string("Title", &self.title)?;
        let description = require_string("Description", &self.description)?;
        let property_type = require_property_type(&self.property_type)?;
        let price = require_price(&self.price)?;
        let property_location = require_string("PropertyLocation", &self.property_location)?;

        Ok(Listing {
            property_id: sanitize::clean(&property_id),
            title: sanitize::clean(&title),
            description: sanitize::clean(&description),
            property_type,
            price,
            property_location: sanitize::clean(&property_location),
        })
    }
}

/// Partial update payload: only supplied fields are touched. `PropertyID`
/// is immutable and never part of an update.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ListingPatch {
    #[serde(rename = "PropertyID", default)]
    pub property_id: Option<Value>,
    #[serde(rename = "Title", default)]
    pub title: Option<Value>,
    #[serde(rename = "Description", default)]
    pub description: Option<Value>,
    #[serde(rename = "PropertyType", default)]
    pub property_type: Option<Value>,
    #[serde(rename = "Price", default)]
    pub price: Option<Value>,
    #[serde(rename = "PropertyLocation", default)]
    pub property_location: Option<Value>,
}

impl ListingPatch {
    /// A JSON `null` counts the same as an absent field.
    fn supplied(slot: &Option<Value>) -> Option<&Value> {
        slot.as_ref().filter(|v| !v.is_null())
    }

    pub fn is_empty(&self) -> bool {
        Self::supplied(&self.title).is_none()
            && Self::supplied(&self.description).is_none()
            && Self::supplied(&self.property_type).is_none()
            && Self::supplied(&self.price).is_none()
            && Self::supplied(&self.property_location).is_none()
    }

    /// Validate the supplied fields and overwrite them on `target`,
    /// sanitizing string values. Untouched fields keep their stored values.
    pub fn apply_to(&self, target: &mut Listing) -> Result<(), ServiceError> {
        if Self::supplied(&self.property_id).is_some() {
            return Err(ServiceError::Validation(
                "PropertyID is immutable and cannot be updated".into(),
            ));
        }
        if self.is_empty() {
            return Err(ServiceError::Validation(
                "update payload must supply at least one field".into(),
            ));
        }
        if let Some(v) = Self::supplied(&self.title) {
            target.title = sanitize::clean(&require_string("Title", v)?);
        }
        if let Some(v) = Self::supplied(&self.description) {
            target.description = sanitize::clean(&require_string("Description", v)?);
        }
        if let Some(v) = Self::supplied(&self.property_type) {
            target.property_type = require_property_type(v)?;
        }
        if let Some(v) = Self::supplied(&self.price) {
            target.price = require_price(v)?;
        }
        if let Some(v) = Self::supplied(&self.property_location) {
            target.property_location = sanitize::clean(&require_string("PropertyLocation", v)?);
        }
        Ok(())
    }
}

fn require_string(field: &str, value: &Value) -> Result<String, ServiceError> {
    match value.as_str() {
        Some(s) if !s.trim().is_empty() => Ok(s.to_string()),
        _ => Err(ServiceError::Validation(format!(
            "{field} is required and must be a non-empty string"
        ))),
    }
}

fn require_property_type(value: &Value) -> Result<PropertyType, ServiceError> {
    value
        .as_str()
        .and_then(PropertyType::parse)
        .ok_or_else(|| {
            ServiceError::Validation("PropertyType must be one of Rent, Sale".into())
        })
}

fn require_price(value: &Value) -> Result<f64, ServiceError> {
    match value.as_f64() {
        Some(p) if p.is_finite() && p >= 0.0 => Ok(p),
        _ => Err(ServiceError::Validation(
            "Price must be a non-negative number".into(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn full_input() -> ListingInput {
        serde_json::from_value(json!({
            "PropertyID": "p1",
            "Title": "Cozy flat",
            "Description": "Two rooms",
            "PropertyType": "Rent",
            "Price": 950,
            "PropertyLocation": "Old town"
        }))
        .expect("input deserializes")
    }

    #[test]
    fn valid_input_builds_listing() {
        let listing = full_input().validate().expect("valid");
        assert_eq!(listing.property_id, "p1");
        assert_eq!(listing.property_type, PropertyType::Rent);
        assert_eq!(listing.price, 950.0);
    }

    #[test]
    fn each_missing_field_names_itself() {
        for field in [
            "PropertyID",
            "Title",
            "Description",
            "PropertyType",
            "Price",
            "PropertyLocation",
        ] {
            let mut raw = json!({
                "PropertyID": "p1",
                "Title": "t",
                "Description": "d",
                "PropertyType": "Sale",
                "Price": 1,
                "PropertyLocation": "x"
            });
            raw.as_object_mut().expect("object").remove(field);
            let input: ListingInput = serde_json::from_value(raw).expect("deserializes");
            let err = input.validate().expect_err("must fail");
            assert!(
                err.to_string().contains(field),
                "error for missing {field} was: {err}"
            );
        }
    }

    #[test]
    fn mistyped_price_is_a_validation_error() {
        let mut input = full_input();
        input.price = json!("cheap");
        let err = input.validate().expect_err("must fail");
        assert!(err.to_string().contains("Price"));
    }

    #[test]
    fn negative_price_is_rejected() {
        let mut input = full_input();
        input.price = json!(-5);
        assert!(input.validate().is_err());
    }

    #[test]
    fn unknown_property_type_is_rejected() {
        let mut input = full_input();
        input.property_type = json!("Lease");
        let err = input.validate().expect_err("must fail");
        assert!(err.to_string().contains("PropertyType"));
    }

    #[test]
    fn create_sanitizes_string_fields() {
        let mut input = full_input();
        input.title = json!("<script>alert(1)</script>Nice view");
        let listing = input.validate().expect("valid");
        assert_eq!(listing.title, "Nice view");
    }

    #[test]
    fn patch_updates_only_supplied_fields() {
        let mut listing = full_input().validate().expect("valid");
        let patch: ListingPatch =
            serde_json::from_value(json!({ "Title": "Renovated" })).expect("patch");
        patch.apply_to(&mut listing).expect("applies");
        assert_eq!(listing.title, "Renovated");
        assert_eq!(listing.description, "Two rooms");
        assert_eq!(listing.price, 950.0);
    }

    #[test]
    fn empty_patch_is_rejected() {
        let mut listing = full_input().validate().expect("valid");
        let patch = ListingPatch::default();
        assert!(patch.apply_to(&mut listing).is_err());

        let nulls: ListingPatch =
            serde_json::from_value(json!({ "Title": null })).expect("patch");
        assert!(nulls.apply_to(&mut listing).is_err());
    }

    #[test]
    fn patch_cannot_touch_property_id() {
        let mut listing = full_input().validate().expect("valid");
        let patch: ListingPatch =
            serde_json::from_value(json!({ "PropertyID": "p2", "Title": "t" })).expect("patch");
        let err = patch.apply_to(&mut listing).expect_err("must fail");
        assert!(err.to_string().contains("PropertyID"));
        assert_eq!(listing.property_id, "p1");
    }

    #[test]
    fn patch_validates_supplied_values() {
        let mut listing = full_input().validate().expect("valid");
        let patch: ListingPatch =
            serde_json::from_value(json!({ "Price": -1 })).expect("patch");
        assert!(patch.apply_to(&mut listing).is_err());
        assert_eq!(listing.price, 950.0);
    }

    #[test]
    fn patch_sanitizes_string_fields() {
        let mut listing = full_input().validate().expect("valid");
        let patch: ListingPatch =
            serde_json::from_value(json!({ "Description": "<img src=x onerror=alert(1)>sea view" }))
                .expect("patch");
        patch.apply_to(&mut listing).expect("applies");
        assert_eq!(listing.description, "sea view");
    }
}
