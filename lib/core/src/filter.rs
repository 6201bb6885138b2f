// Payload filter used to scope similarity queries
use serde_json::Value;
use crate::Point;

pub trait Filter: Send + Sync {
    fn matches(&self, point: &Point) -> bool;
}

pub struct PayloadFilter {
    condition: FilterCondition,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FilterCondition {
    Equals { field: String, value: Value },
    And(Vec<FilterCondition>),
}

impl FilterCondition {
    /// Equality on a string-valued payload field
    pub fn eq(field: impl Into<String>, value: impl Into<String>) -> Self {
        FilterCondition::Equals {
            field: field.into(),
            value: Value::String(value.into()),
        }
    }
}

impl PayloadFilter {
    pub fn new(condition: FilterCondition) -> Self {
        Self { condition }
    }

    fn matches_condition(condition: &FilterCondition, point: &Point) -> bool {
        match condition {
            FilterCondition::Equals { field, value } => {
                point.field(field).map(|v| v == value).unwrap_or(false)
            }
            FilterCondition::And(conditions) => {
                conditions.iter().all(|c| Self::matches_condition(c, point))
            }
        }
    }
}

impl Filter for PayloadFilter {
    fn matches(&self, point: &Point) -> bool {
        Self::matches_condition(&self.condition, point)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Vector;
    use serde_json::json;

    fn point_with(payload: Value) -> Point {
        let map = payload.as_object().cloned().unwrap_or_default();
        Point::new("p", "doc", Vector::new(vec![1.0])).with_payload(map)
    }

    #[test]
    fn test_equals_matches_exact_value() {
        let filter = PayloadFilter::new(FilterCondition::eq("subcategory", "Laptops"));
        assert!(filter.matches(&point_with(json!({"subcategory": "Laptops"}))));
        assert!(!filter.matches(&point_with(json!({"subcategory": "laptops"}))));
        assert!(!filter.matches(&point_with(json!({"brand": "Laptops"}))));
    }

    #[test]
    fn test_missing_payload_never_matches() {
        let filter = PayloadFilter::new(FilterCondition::eq("subcategory", "Laptops"));
        let point = Point::new("p", "doc", Vector::new(vec![1.0]));
        assert!(!filter.matches(&point));
    }

    #[test]
    fn test_and_requires_all() {
        let filter = PayloadFilter::new(FilterCondition::And(vec![
            FilterCondition::eq("subcategory", "Laptops"),
            FilterCondition::eq("brand", "Acme"),
        ]));
        assert!(filter.matches(&point_with(json!({"subcategory": "Laptops", "brand": "Acme"}))));
        assert!(!filter.matches(&point_with(json!({"subcategory": "Laptops", "brand": "Other"}))));
    }
}
