use rust_decimal::Decimal;

#[derive(Debug, Clone)]
pub struct VarietyCreate {
    pub name: String,
    pub image_url: Option<String>,
    pub cost_per_pound: Decimal,
}

/// Only fields that are `Some` and differ from the stored value are applied.
#[derive(Debug, Clone, Default)]
pub struct VarietyPatch {
    pub name: Option<String>,
    pub image_url: Option<String>,
    pub cost_per_pound: Option<Decimal>,
    pub is_active: Option<bool>,
}
