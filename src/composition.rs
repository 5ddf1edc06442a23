// ABOUTME: Recipe composition engine: reference partitioning, line formatting, ABV math
// ABOUTME: Pure functions; batched lookups against the store live in the recipe manager
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tipple

//! # Recipe Composition Engine
//!
//! A recipe arrives as an ordered list of requested lines, each referencing
//! an ingredient or another recipe by public id. The engine partitions the
//! references by kind for batched resolution, formats the lines into their
//! stored form (internal keys), and computes the recipe's ABV from the
//! resolved strengths. ABV is always derived here; clients never supply it.

use uuid::Uuid;

use crate::errors::{AppError, AppResult};
use crate::models::recipe::{IngredientLine, MixMethod};

/// Unit participating in ABV accumulation
///
/// Lines in any other unit (dashes, barspoons, ...) are excluded from the
/// calculation. TODO: convert ml and cl lines instead of skipping them.
const ABV_UNIT: &str = "oz";

/// A requested ingredient line, as supplied by the client
#[derive(Debug, Clone)]
pub struct LineInput {
    /// Public id of the referenced ingredient or recipe
    pub id: Uuid,
    /// Quantity in `unit`
    pub quantity: f64,
    /// Measurement unit
    pub unit: String,
    /// True when the reference targets a recipe (sub-recipe line)
    pub is_recipe: bool,
}

impl LineInput {
    /// Singular label of the referenced kind, for error messages
    #[must_use]
    pub const fn kind_label(&self) -> &'static str {
        if self.is_recipe {
            "Subrecipe"
        } else {
            "Ingredient"
        }
    }
}

/// A resolved line target: the fields of an ingredient or recipe document
/// that the engine needs
#[derive(Debug, Clone)]
pub struct ResolvedTarget {
    /// Internal surrogate key, stored into the formatted line
    pub key: Uuid,
    /// Public id, matched against [`LineInput::id`]
    pub id: Uuid,
    /// Display name
    pub name: String,
    /// Category string (ingredient kind or recipe kind)
    pub type_name: String,
    /// Strength, percent alcohol by volume
    pub abv: f64,
    /// Soft-delete flag, surfaced in full responses
    pub is_deleted: bool,
    /// Which table the target came from
    pub is_recipe: bool,
}

/// Split requested line references by kind for batched lookups
///
/// Returns `(ingredient_ids, subrecipe_ids)`, each order-preserving and
/// deduplicated, so the store issues at most two `IN` queries.
#[must_use]
pub fn partition_line_refs(lines: &[LineInput]) -> (Vec<Uuid>, Vec<Uuid>) {
    let mut ingredient_ids = Vec::new();
    let mut subrecipe_ids = Vec::new();
    for line in lines {
        let bucket = if line.is_recipe {
            &mut subrecipe_ids
        } else {
            &mut ingredient_ids
        };
        if !bucket.contains(&line.id) {
            bucket.push(line.id);
        }
    }
    (ingredient_ids, subrecipe_ids)
}

/// Find the resolved target for a line, re-checking kind and presence
///
/// The engine does not trust that resolution and formatting ran against the
/// same snapshot, so every line is re-checked here.
fn find_target<'a>(
    resolved: &'a [ResolvedTarget],
    line: &LineInput,
) -> AppResult<&'a ResolvedTarget> {
    resolved
        .iter()
        .find(|t| t.id == line.id && t.is_recipe == line.is_recipe)
        .ok_or_else(|| AppError::reference_not_found(line.kind_label(), line.id))
}

/// Map requested lines to their stored form, preserving input order
///
/// # Errors
///
/// Fails with `ReferenceNotFound` for any line whose id is absent from
/// `resolved`, and with a validation error for a negative or non-finite
/// quantity.
pub fn format_lines(
    resolved: &[ResolvedTarget],
    lines: &[LineInput],
) -> AppResult<Vec<IngredientLine>> {
    lines
        .iter()
        .map(|line| {
            if !line.quantity.is_finite() || line.quantity < 0.0 {
                return Err(AppError::validation(format!(
                    "Invalid quantity {} for {} {}",
                    line.quantity,
                    line.kind_label().to_lowercase(),
                    line.id
                )));
            }
            let target = find_target(resolved, line)?;
            Ok(IngredientLine {
                quantity: line.quantity,
                unit: line.unit.clone(),
                target_key: target.key,
                is_recipe: line.is_recipe,
            })
        })
        .collect()
}

/// Compute a recipe's ABV from its resolved lines and preparation method
///
/// Only oz-denominated lines participate. Total volume is scaled by the
/// method's dilution multiplier before the final division. A recipe with no
/// oz lines (syrups, garnishes) has an ABV of 0.
///
/// # Errors
///
/// Fails with `ReferenceNotFound` if an oz line's target is absent from
/// `resolved`.
pub fn compute_abv(
    resolved: &[ResolvedTarget],
    lines: &[LineInput],
    method: MixMethod,
) -> AppResult<f64> {
    let mut total_volume = 0.0;
    let mut total_alcohol = 0.0;

    for line in lines {
        if line.unit == ABV_UNIT {
            let target = find_target(resolved, line)?;
            total_volume += line.quantity;
            total_alcohol += target.abv * line.quantity / 100.0;
        }
    }

    if total_volume == 0.0 {
        return Ok(0.0);
    }

    total_volume *= method.dilution_factor();
    Ok(total_alcohol / total_volume * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(name: &str, abv: f64) -> ResolvedTarget {
        ResolvedTarget {
            key: Uuid::new_v4(),
            id: Uuid::new_v4(),
            name: name.into(),
            type_name: "liquor".into(),
            abv,
            is_deleted: false,
            is_recipe: false,
        }
    }

    fn line(target: &ResolvedTarget, quantity: f64, unit: &str) -> LineInput {
        LineInput {
            id: target.id,
            quantity,
            unit: unit.into(),
            is_recipe: target.is_recipe,
        }
    }

    /// Whiskey sour shape: 0.75 oz syrup + 1 oz juice + 2 oz whiskey (40%),
    /// shaken -> (40*2/100) / ((0.75+1+2)*1.25) * 100 = 17.0667%
    #[test]
    fn test_whiskey_sour_abv() {
        let honey = target("honey syrup", 0.0);
        let lemon = target("lemon juice", 0.0);
        let whiskey = target("whiskey", 40.0);
        let resolved = vec![honey.clone(), lemon.clone(), whiskey.clone()];
        let lines = vec![
            line(&honey, 0.75, "oz"),
            line(&lemon, 1.0, "oz"),
            line(&whiskey, 2.0, "oz"),
        ];

        let abv = compute_abv(&resolved, &lines, MixMethod::Shaken).unwrap();
        assert!((abv - 17.066_667).abs() < 1e-4, "got {abv}");
    }

    #[test]
    fn test_abv_invariant_under_quantity_scaling() {
        let gin = target("gin", 47.0);
        let vermouth = target("dry vermouth", 18.0);
        let resolved = vec![gin.clone(), vermouth.clone()];
        let single = vec![line(&gin, 2.5, "oz"), line(&vermouth, 0.5, "oz")];
        let double: Vec<LineInput> = single
            .iter()
            .map(|l| LineInput {
                quantity: l.quantity * 2.0,
                ..l.clone()
            })
            .collect();

        let a = compute_abv(&resolved, &single, MixMethod::Stirred).unwrap();
        let b = compute_abv(&resolved, &double, MixMethod::Stirred).unwrap();
        assert!((a - b).abs() < 1e-9);
    }

    #[test]
    fn test_more_dilution_means_lower_abv() {
        let rum = target("rum", 40.0);
        let resolved = vec![rum.clone()];
        let lines = vec![line(&rum, 2.0, "oz")];

        let neat = compute_abv(&resolved, &lines, MixMethod::Other).unwrap();
        let stirred = compute_abv(&resolved, &lines, MixMethod::Stirred).unwrap();
        let shaken = compute_abv(&resolved, &lines, MixMethod::Shaken).unwrap();
        assert!(shaken < stirred);
        assert!(stirred < neat);
    }

    #[test]
    fn test_non_oz_lines_excluded() {
        let bitters = target("angostura", 44.7);
        let gin = target("gin", 47.0);
        let resolved = vec![bitters.clone(), gin.clone()];
        let with_dashes = vec![line(&gin, 2.0, "oz"), line(&bitters, 2.0, "dash")];
        let without = vec![line(&gin, 2.0, "oz")];

        let a = compute_abv(&resolved, &with_dashes, MixMethod::Stirred).unwrap();
        let b = compute_abv(&resolved, &without, MixMethod::Stirred).unwrap();
        assert!((a - b).abs() < 1e-9);
    }

    #[test]
    fn test_no_oz_lines_yields_zero_abv() {
        let sugar = target("sugar", 0.0);
        let resolved = vec![sugar.clone()];
        let lines = vec![line(&sugar, 200.0, "g")];
        let abv = compute_abv(&resolved, &lines, MixMethod::Other).unwrap();
        assert!((abv - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_format_preserves_order_and_maps_keys() {
        let a = target("a", 0.0);
        let b = target("b", 40.0);
        let resolved = vec![b.clone(), a.clone()];
        let lines = vec![line(&a, 1.0, "oz"), line(&b, 2.0, "oz")];

        let formatted = format_lines(&resolved, &lines).unwrap();
        assert_eq!(formatted[0].target_key, a.key);
        assert_eq!(formatted[1].target_key, b.key);
    }

    #[test]
    fn test_missing_reference_names_the_id() {
        let gin = target("gin", 47.0);
        let missing = Uuid::new_v4();
        let lines = vec![
            line(&gin, 2.0, "oz"),
            LineInput {
                id: missing,
                quantity: 1.0,
                unit: "oz".into(),
                is_recipe: true,
            },
        ];

        let err = format_lines(&[gin.clone()], &lines).unwrap_err();
        assert!(err.message.contains(&missing.to_string()));
        assert!(err.message.starts_with("Subrecipe"));
    }

    #[test]
    fn test_kind_mismatch_is_a_missing_reference() {
        // Same id resolved as an ingredient but requested as a sub-recipe.
        let gin = target("gin", 47.0);
        let lines = vec![LineInput {
            id: gin.id,
            quantity: 1.0,
            unit: "oz".into(),
            is_recipe: true,
        }];
        assert!(format_lines(&[gin], &lines).is_err());
    }

    #[test]
    fn test_negative_quantity_rejected() {
        let gin = target("gin", 47.0);
        let lines = vec![line(&gin, -1.0, "oz")];
        assert!(format_lines(&[gin], &lines).is_err());
    }

    #[test]
    fn test_partition_dedupes_and_splits() {
        let gin = target("gin", 47.0);
        let syrup_recipe = ResolvedTarget {
            is_recipe: true,
            ..target("honey syrup", 0.0)
        };
        let lines = vec![
            line(&gin, 1.0, "oz"),
            line(&gin, 1.0, "oz"),
            line(&syrup_recipe, 0.5, "oz"),
        ];

        let (ingredient_ids, subrecipe_ids) = partition_line_refs(&lines);
        assert_eq!(ingredient_ids, vec![gin.id]);
        assert_eq!(subrecipe_ids, vec![syrup_recipe.id]);
    }
}
