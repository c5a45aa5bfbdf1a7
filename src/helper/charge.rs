//! Charge value objects.
//!
//! - [`ChargeType`]: which charge resource an operation targets
//! - [`ChargeReference`]: the positive id of an existing charge
//! - [`PlanDetails`]: everything needed to create a charge
//! - [`UsageChargeDetails`]: a usage charge against a recurring charge

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::helper::errors::ValidationError;

/// The kind of app charge.
///
/// # Example
///
/// ```rust
/// use shopify_app::ChargeType;
///
/// let charge_type: ChargeType = "RECURRING".parse().unwrap();
/// assert_eq!(charge_type.resource(), "recurring_application_charges");
/// assert_eq!(charge_type.singular(), "recurring_application_charge");
///
/// assert_eq!("CHARGE".parse::<ChargeType>().unwrap(), ChargeType::Charge);
/// assert!("MONTHLY".parse::<ChargeType>().is_err());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum ChargeType {
    /// A one-time application charge.
    #[serde(rename = "ONETIME")]
    Charge,
    /// A recurring application charge (subscription).
    #[serde(rename = "RECURRING")]
    Recurring,
}

impl ChargeType {
    /// The REST collection the charge lives under.
    #[must_use]
    pub const fn resource(&self) -> &'static str {
        match self {
            Self::Charge => "application_charges",
            Self::Recurring => "recurring_application_charges",
        }
    }

    /// The JSON envelope key of a single charge.
    #[must_use]
    pub const fn singular(&self) -> &'static str {
        match self {
            Self::Charge => "application_charge",
            Self::Recurring => "recurring_application_charge",
        }
    }

    /// The wire name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Charge => "ONETIME",
            Self::Recurring => "RECURRING",
        }
    }
}

impl fmt::Display for ChargeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChargeType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ONETIME" | "CHARGE" => Ok(Self::Charge),
            "RECURRING" => Ok(Self::Recurring),
            _ => Err(ValidationError::UnknownChargeType {
                value: s.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for ChargeType {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// The id of an existing charge. Always positive.
///
/// ```rust
/// use shopify_app::ChargeReference;
///
/// assert_eq!(ChargeReference::new(1234).unwrap().get(), 1234);
/// assert!(ChargeReference::new(0).is_err());
/// assert!("-5".parse::<ChargeReference>().is_err());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct ChargeReference(u64);

impl ChargeReference {
    /// Wraps a charge id.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidChargeReference`] for 0.
    pub fn new(id: u64) -> Result<Self, ValidationError> {
        if id == 0 {
            return Err(ValidationError::InvalidChargeReference {
                value: id.to_string(),
            });
        }
        Ok(Self(id))
    }

    /// Returns the id.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

impl TryFrom<u64> for ChargeReference {
    type Error = ValidationError;

    fn try_from(id: u64) -> Result<Self, Self::Error> {
        Self::new(id)
    }
}

impl TryFrom<i64> for ChargeReference {
    type Error = ValidationError;

    fn try_from(id: i64) -> Result<Self, Self::Error> {
        u64::try_from(id)
            .map_err(|_| ValidationError::InvalidChargeReference {
                value: id.to_string(),
            })
            .and_then(Self::new)
    }
}

impl From<ChargeReference> for u64 {
    fn from(reference: ChargeReference) -> Self {
        reference.0
    }
}

impl FromStr for ChargeReference {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .map_err(|_| ValidationError::InvalidChargeReference {
                value: s.to_string(),
            })
            .and_then(Self::new)
    }
}

impl fmt::Display for ChargeReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The terms of a charge to create.
///
/// # Example
///
/// ```rust
/// use shopify_app::{ChargeType, PlanDetails};
/// use rust_decimal::Decimal;
///
/// let plan = PlanDetails::builder("Pro", Decimal::new(1200, 2))
///     .test(true)
///     .trial_days(7)
///     .return_url("https://app.example.com/billing/process/1")
///     .build()
///     .unwrap();
///
/// let payload = plan.to_payload(ChargeType::Recurring);
/// assert_eq!(payload["price"], "12.00");
/// assert_eq!(payload["trial_days"], 7);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlanDetails {
    name: String,
    price: Decimal,
    test: bool,
    trial_days: u32,
    return_url: Option<String>,
    capped_amount: Option<Decimal>,
    terms: Option<String>,
}

impl PlanDetails {
    /// Starts a builder with the two required fields.
    #[must_use]
    pub fn builder(name: impl Into<String>, price: Decimal) -> PlanDetailsBuilder {
        PlanDetailsBuilder::new(name, price)
    }

    /// The plan name shown to the merchant.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The plan price.
    #[must_use]
    pub const fn price(&self) -> Decimal {
        self.price
    }

    /// Whether this is a test charge.
    #[must_use]
    pub const fn test(&self) -> bool {
        self.test
    }

    /// Trial length in days.
    #[must_use]
    pub const fn trial_days(&self) -> u32 {
        self.trial_days
    }

    /// Where Shopify sends the merchant after approval.
    #[must_use]
    pub fn return_url(&self) -> Option<&str> {
        self.return_url.as_deref()
    }

    /// Usage cap of a recurring charge.
    #[must_use]
    pub const fn capped_amount(&self) -> Option<Decimal> {
        self.capped_amount
    }

    /// Usage terms of a capped recurring charge.
    #[must_use]
    pub fn terms(&self) -> Option<&str> {
        self.terms.as_deref()
    }

    /// The request body of a create call for `charge_type`.
    ///
    /// One-time charges carry no trial or usage cap; recurring charges send
    /// `capped_amount` and `terms` only when a cap is set.
    #[must_use]
    pub fn to_payload(&self, charge_type: ChargeType) -> Value {
        let mut payload = Map::new();
        payload.insert("name".to_string(), Value::String(self.name.clone()));
        payload.insert("price".to_string(), Value::String(self.price.to_string()));
        payload.insert("test".to_string(), Value::Bool(self.test));
        if let Some(url) = &self.return_url {
            payload.insert("return_url".to_string(), Value::String(url.clone()));
        }

        if charge_type == ChargeType::Recurring {
            payload.insert("trial_days".to_string(), Value::from(self.trial_days));
            if let Some(cap) = self.capped_amount {
                payload.insert("capped_amount".to_string(), Value::String(cap.to_string()));
                payload.insert(
                    "terms".to_string(),
                    Value::String(self.terms.clone().unwrap_or_default()),
                );
            }
        }

        Value::Object(payload)
    }
}

/// Builder for [`PlanDetails`].
#[derive(Clone, Debug)]
pub struct PlanDetailsBuilder {
    plan: PlanDetails,
}

impl PlanDetailsBuilder {
    /// Creates a builder for a non-test plan with no trial.
    #[must_use]
    pub fn new(name: impl Into<String>, price: Decimal) -> Self {
        Self {
            plan: PlanDetails {
                name: name.into(),
                price,
                test: false,
                trial_days: 0,
                return_url: None,
                capped_amount: None,
                terms: None,
            },
        }
    }

    /// Marks the charge as a test charge.
    #[must_use]
    pub const fn test(mut self, test: bool) -> Self {
        self.plan.test = test;
        self
    }

    /// Sets the trial length.
    #[must_use]
    pub const fn trial_days(mut self, days: u32) -> Self {
        self.plan.trial_days = days;
        self
    }

    /// Sets the return URL.
    #[must_use]
    pub fn return_url(mut self, url: impl Into<String>) -> Self {
        self.plan.return_url = Some(url.into());
        self
    }

    /// Sets the usage cap.
    #[must_use]
    pub const fn capped_amount(mut self, amount: Decimal) -> Self {
        self.plan.capped_amount = Some(amount);
        self
    }

    /// Sets the usage terms.
    #[must_use]
    pub fn terms(mut self, terms: impl Into<String>) -> Self {
        self.plan.terms = Some(terms.into());
        self
    }

    /// Validates and returns the plan.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MissingField`] for an empty name and
    /// [`ValidationError::NegativePrice`] for a negative price or cap.
    pub fn build(self) -> Result<PlanDetails, ValidationError> {
        let plan = self.plan;
        if plan.name.trim().is_empty() {
            return Err(ValidationError::MissingField { field: "name" });
        }
        if plan.price < Decimal::ZERO {
            return Err(ValidationError::NegativePrice { field: "price" });
        }
        if plan.capped_amount.is_some_and(|cap| cap < Decimal::ZERO) {
            return Err(ValidationError::NegativePrice {
                field: "capped_amount",
            });
        }
        Ok(plan)
    }
}

/// A usage charge to record against a recurring charge.
///
/// Filled in field by field and checked by
/// [`create_usage_charge`](crate::ApiHelper::create_usage_charge).
///
/// ```rust
/// use shopify_app::{ChargeReference, UsageChargeDetails};
/// use rust_decimal::Decimal;
///
/// let mut details = UsageChargeDetails::default();
/// details.charge_reference = Some(ChargeReference::new(1).unwrap());
/// details.price = Decimal::new(1200, 2);
/// details.description = "Hello!".to_string();
/// assert!(details.validate().is_ok());
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UsageChargeDetails {
    /// The recurring charge the usage is billed against.
    pub charge_reference: Option<ChargeReference>,
    /// The amount to bill.
    pub price: Decimal,
    /// What the usage was for.
    pub description: String,
}

impl UsageChargeDetails {
    /// Checks that every field is usable.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] when the reference is missing, the price
    /// is negative or the description is empty.
    pub fn validate(&self) -> Result<ChargeReference, ValidationError> {
        let reference = self
            .charge_reference
            .ok_or(ValidationError::MissingField {
                field: "charge_reference",
            })?;
        if self.price < Decimal::ZERO {
            return Err(ValidationError::NegativePrice { field: "price" });
        }
        if self.description.trim().is_empty() {
            return Err(ValidationError::MissingField {
                field: "description",
            });
        }
        Ok(reference)
    }

    /// The request body of a usage charge.
    #[must_use]
    pub fn to_payload(&self) -> Value {
        serde_json::json!({
            "price": self.price.to_string(),
            "description": self.description,
        })
    }
}
