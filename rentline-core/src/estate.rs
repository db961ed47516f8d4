use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::{CoreError, CoreResult, EstateId, UserId};

pub const TEXT_MAX_LEN: usize = 255;
const PRICE_DECIMAL_PLACES: u32 = 2;
const PRICE_MAX_DIGITS: u32 = 10;

/// A rentable listing. `owner` is always a plain user id on the wire.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Estate {
    pub id: EstateId,
    pub title: String,
    pub description: String,
    pub location: String,
    pub price: Decimal,
    pub is_active: bool,
    pub owner: UserId,
}

/// Full estate body, used for create and PUT.
#[derive(Debug, Clone, Deserialize)]
pub struct EstateInput {
    pub title: String,
    pub description: String,
    pub location: String,
    pub price: Decimal,
    /// Create defaults to active; PUT keeps the stored flag when absent.
    #[serde(default)]
    pub is_active: Option<bool>,
}

/// Partial estate body for PATCH. The owner is never writable.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EstatePatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub price: Option<Decimal>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct NewEstate {
    pub title: String,
    pub description: String,
    pub location: String,
    pub price: Decimal,
    pub is_active: bool,
    pub owner: UserId,
}

impl EstateInput {
    pub fn validate(&self) -> CoreResult<()> {
        validate_text("title", &self.title)?;
        validate_description(&self.description)?;
        validate_text("location", &self.location)?;
        validate_price(self.price)?;
        Ok(())
    }

    pub fn into_new(self, owner: UserId) -> NewEstate {
        NewEstate {
            title: self.title,
            description: self.description,
            location: self.location,
            price: normalize_price(self.price),
            is_active: self.is_active.unwrap_or(true),
            owner,
        }
    }
}

impl From<EstateInput> for EstatePatch {
    fn from(input: EstateInput) -> Self {
        Self {
            title: Some(input.title),
            description: Some(input.description),
            location: Some(input.location),
            price: Some(input.price),
            is_active: input.is_active,
        }
    }
}

impl EstatePatch {
    pub fn validate(&self) -> CoreResult<()> {
        if let Some(title) = &self.title {
            validate_text("title", title)?;
        }
        if let Some(description) = &self.description {
            validate_description(description)?;
        }
        if let Some(location) = &self.location {
            validate_text("location", location)?;
        }
        if let Some(price) = self.price {
            validate_price(price)?;
        }
        Ok(())
    }

    pub fn apply(&self, estate: &mut Estate) {
        if let Some(title) = &self.title {
            estate.title = title.clone();
        }
        if let Some(description) = &self.description {
            estate.description = description.clone();
        }
        if let Some(location) = &self.location {
            estate.location = location.clone();
        }
        if let Some(price) = self.price {
            estate.price = normalize_price(price);
        }
        if let Some(is_active) = self.is_active {
            estate.is_active = is_active;
        }
    }
}

fn validate_text(field: &str, value: &str) -> CoreResult<()> {
    if value.trim().is_empty() {
        return Err(CoreError::validation(format!("{}: This field may not be blank.", field)));
    }
    if value.chars().count() > TEXT_MAX_LEN {
        return Err(CoreError::validation(format!(
            "{}: Ensure this field has no more than {} characters.",
            field, TEXT_MAX_LEN
        )));
    }
    Ok(())
}

fn validate_description(value: &str) -> CoreResult<()> {
    if value.trim().is_empty() {
        return Err(CoreError::validation("description: This field may not be blank."));
    }
    Ok(())
}

/// NUMERIC(10, 2), non-negative.
pub fn validate_price(price: Decimal) -> CoreResult<()> {
    if price.is_sign_negative() && !price.is_zero() {
        return Err(CoreError::validation(
            "price: Ensure this value is greater than or equal to 0.",
        ));
    }
    if price.normalize().scale() > PRICE_DECIMAL_PLACES {
        return Err(CoreError::validation(format!(
            "price: Ensure that there are no more than {} decimal places.",
            PRICE_DECIMAL_PLACES
        )));
    }
    let limit = Decimal::from(10_i64.pow(PRICE_MAX_DIGITS - PRICE_DECIMAL_PLACES));
    if price >= limit {
        return Err(CoreError::validation(format!(
            "price: Ensure that there are no more than {} digits in total.",
            PRICE_MAX_DIGITS
        )));
    }
    Ok(())
}

pub fn normalize_price(price: Decimal) -> Decimal {
    let mut price = price.round_dp(PRICE_DECIMAL_PLACES);
    price.rescale(PRICE_DECIMAL_PLACES);
    price
}

/// Optional listing filters parsed from raw query parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EstateFilter {
    pub title: Option<String>,
    pub location: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
}

impl EstateFilter {
    pub fn from_query(params: &BTreeMap<String, String>) -> CoreResult<Self> {
        Ok(Self {
            title: non_empty(params.get("title")),
            location: non_empty(params.get("location")),
            min_price: parse_price_param(params, "min_price")?,
            max_price: parse_price_param(params, "max_price")?,
        })
    }

    pub fn matches(&self, estate: &Estate) -> bool {
        if !estate.is_active {
            return false;
        }
        if let Some(title) = &self.title {
            if !contains_ignore_case(&estate.title, title) {
                return false;
            }
        }
        if let Some(location) = &self.location {
            if !contains_ignore_case(&estate.location, location) {
                return false;
            }
        }
        if let Some(min) = self.min_price {
            if estate.price < min {
                return false;
            }
        }
        if let Some(max) = self.max_price {
            if estate.price > max {
                return false;
            }
        }
        true
    }
}

fn non_empty(value: Option<&String>) -> Option<String> {
    value.map(|v| v.trim()).filter(|v| !v.is_empty()).map(str::to_owned)
}

fn parse_price_param(params: &BTreeMap<String, String>, key: &str) -> CoreResult<Option<Decimal>> {
    match non_empty(params.get(key)) {
        None => Ok(None),
        Some(raw) => raw
            .parse::<Decimal>()
            .map(Some)
            .map_err(|_| CoreError::validation(format!("{}: A valid number is required.", key))),
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}
