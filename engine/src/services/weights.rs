//! Per-crop variable weights and sensitivities
//!
//! Fallback chain, every step recorded on the plan:
//! crop k value -> `default_k` for scoring; normalized k weights -> uniform weights.

use shared::{Crop, KSource, WeightScheme};

use crate::config::MatchingConfig;
use crate::services::scoring::FieldWeight;

/// Weights and sensitivities decided for one crop
#[derive(Debug, Clone, PartialEq)]
pub struct WeightPlan {
    pub scheme: WeightScheme,
    /// One entry per required field, in configuration order
    pub fields: Vec<FieldWeight>,
    pub warnings: Vec<String>,
}

impl WeightPlan {
    pub fn weight_sum(&self) -> f64 {
        self.fields.iter().map(|f| f.weight).sum()
    }
}

/// Derive the weight plan for a crop.
///
/// With at least one usable k value among the required fields, weights are
/// those k values divided by their sum; fields without one are scored with
/// `default_k` and weigh nothing. Without any usable k value every field gets
/// `1 / len(required_fields)`.
pub fn derive_weights(crop: &Crop, config: &MatchingConfig) -> WeightPlan {
    let mut warnings = Vec::new();
    let fields = &config.required_fields;

    let explicit: Vec<Option<f64>> = fields
        .iter()
        .map(|field| match crop.k_value(field) {
            Some(k) if k >= 0.0 => Some(k),
            Some(k) => {
                warnings.push(format!(
                    "Negative k value {} for {} ignored, will use default",
                    k, field
                ));
                None
            }
            None => None,
        })
        .collect();

    let present_sum: f64 = explicit.iter().flatten().sum();
    let any_present = explicit.iter().any(Option::is_some);

    if any_present && present_sum > 0.0 {
        let plan = fields
            .iter()
            .zip(&explicit)
            .map(|(field, k)| match k {
                Some(k) => FieldWeight {
                    variable: field.clone(),
                    k: KSource::Explicit(*k),
                    weight: k / present_sum,
                },
                None => {
                    warnings.push(format!("No k value for {}, will use default", field));
                    FieldWeight {
                        variable: field.clone(),
                        k: KSource::Defaulted(config.default_k),
                        weight: 0.0,
                    }
                }
            })
            .collect();

        return WeightPlan {
            scheme: WeightScheme::Normalized,
            fields: plan,
            warnings,
        };
    }

    if any_present {
        warnings.push("k values sum to zero, falling back to uniform weights".to_string());
    } else {
        warnings.push("No k values for required fields, using uniform weights".to_string());
    }

    let uniform = 1.0 / fields.len() as f64;
    let plan = fields
        .iter()
        .zip(&explicit)
        .map(|(field, k)| FieldWeight {
            variable: field.clone(),
            k: match k {
                Some(k) => KSource::Explicit(*k),
                None => KSource::Defaulted(config.default_k),
            },
            weight: uniform,
        })
        .collect();

    WeightPlan {
        scheme: WeightScheme::Uniform,
        fields: plan,
        warnings,
    }
}
