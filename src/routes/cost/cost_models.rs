use serde::Deserialize;

use crate::errors::ApiError;
use crate::routes::common_models::{require_name, require_optional_name};

#[derive(Debug, Deserialize)]
pub struct CreateCostRequest {
    pub name: String,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub currency: Option<String>,
    pub quantity: Option<i32>,
    pub sales_tax: Option<f64>,
    pub rn_number: Option<String>,
    pub serial_number: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateCostRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub currency: Option<String>,
    pub quantity: Option<i32>,
    pub sales_tax: Option<f64>,
    pub rn_number: Option<String>,
    pub serial_number: Option<String>,
}

fn check_amounts(price: Option<f64>, quantity: Option<i32>, sales_tax: Option<f64>) -> Result<(), ApiError> {
    if price.is_some_and(|p| p < 0.0 || !p.is_finite()) {
        return Err(ApiError::BadRequest("Cost price must be a non-negative number".into()));
    }
    if quantity.is_some_and(|q| q < 0) {
        return Err(ApiError::BadRequest("Cost quantity must not be negative".into()));
    }
    if sales_tax.is_some_and(|t| t < 0.0 || !t.is_finite()) {
        return Err(ApiError::BadRequest("Cost sales tax must be a non-negative number".into()));
    }
    Ok(())
}

impl CreateCostRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        require_name("Cost", &self.name)?;
        check_amounts(self.price, self.quantity, self.sales_tax)
    }
}

impl UpdateCostRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        require_optional_name("Cost", self.name.as_deref())?;
        check_amounts(self.price, self.quantity, self.sales_tax)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_name_is_rejected() {
        let request: CreateCostRequest = serde_json::from_str(r#"{"name": "  "}"#).unwrap();
        assert!(matches!(request.validate(), Err(ApiError::BadRequest(_))));
    }

    #[test]
    fn negative_amounts_are_rejected() {
        let request = UpdateCostRequest {
            quantity: Some(-1),
            ..Default::default()
        };
        assert!(request.validate().is_err());

        let request = UpdateCostRequest {
            price: Some(12.5),
            sales_tax: Some(0.07),
            ..Default::default()
        };
        assert!(request.validate().is_ok());
    }
}
