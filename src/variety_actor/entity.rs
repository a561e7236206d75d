use rust_decimal::Decimal;

use super::actions::{VarietyAction, VarietyActionResult};
use super::dtos::{VarietyCreate, VarietyPatch};
use crate::actor_framework::{Entity, EntityId};
use crate::domain::AppleVariety;
use crate::error::FarmError;

fn validate_cost(cost: Decimal) -> Result<Decimal, FarmError> {
    if cost <= Decimal::ZERO {
        return Err(FarmError::ValidationError(format!(
            "cost per pound must be positive, got {}",
            cost
        )));
    }
    Ok(cost)
}

fn validate_name(name: &str) -> Result<String, FarmError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(FarmError::ValidationError("variety name required".to_string()));
    }
    Ok(name.to_string())
}

impl Entity for AppleVariety {
    const KIND: &'static str = "AppleVariety";
    type CreateParams = VarietyCreate;
    type Patch = VarietyPatch;
    type Action = VarietyAction;
    type ActionResult = VarietyActionResult;
    type Error = FarmError;

    fn id(&self) -> EntityId {
        self.id
    }

    /// New varieties start out active.
    fn from_create_params(id: EntityId, params: VarietyCreate) -> Result<Self, FarmError> {
        Ok(Self {
            id,
            name: validate_name(&params.name)?,
            image_url: params.image_url.map(|url| url.trim().to_string()),
            cost_per_pound: validate_cost(params.cost_per_pound)?,
            is_active: true,
        })
    }

    fn on_update(&mut self, patch: VarietyPatch) -> Result<(), FarmError> {
        if let Some(name) = patch.name {
            self.name = validate_name(&name)?;
        }
        if let Some(url) = patch.image_url.filter(|url| !url.trim().is_empty()) {
            self.image_url = Some(url.trim().to_string());
        }
        if let Some(cost) = patch.cost_per_pound {
            self.cost_per_pound = validate_cost(cost)?;
        }
        if let Some(active) = patch.is_active {
            self.is_active = active;
        }
        Ok(())
    }

    fn handle_action(&mut self, action: VarietyAction) -> Result<VarietyActionResult, FarmError> {
        match action {
            VarietyAction::ToggleActive => {
                self.is_active = !self.is_active;
                Ok(VarietyActionResult::ToggleActive(self.is_active))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create(name: &str, cost: Decimal) -> Result<AppleVariety, FarmError> {
        AppleVariety::from_create_params(
            1,
            VarietyCreate {
                name: name.to_string(),
                image_url: None,
                cost_per_pound: cost,
            },
        )
    }

    #[test]
    fn test_create_trims_and_activates() {
        let variety = create("  Honeycrisp ", Decimal::new(249, 2)).unwrap();
        assert_eq!(variety.name, "Honeycrisp");
        assert!(variety.is_active);
    }

    #[test]
    fn test_create_rejects_bad_input() {
        assert!(matches!(create("   ", Decimal::ONE), Err(FarmError::ValidationError(_))));
        assert!(matches!(create("Gala", Decimal::ZERO), Err(FarmError::ValidationError(_))));
    }

    #[test]
    fn test_patch_keeps_blank_image() {
        let mut variety = create("Gala", Decimal::ONE).unwrap();
        variety.image_url = Some("gala.png".to_string());
        variety
            .on_update(VarietyPatch {
                image_url: Some("  ".to_string()),
                cost_per_pound: Some(Decimal::new(3, 0)),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(variety.image_url.as_deref(), Some("gala.png"));
        assert_eq!(variety.cost_per_pound, Decimal::new(3, 0));
    }
}
