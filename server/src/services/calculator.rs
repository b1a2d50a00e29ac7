//! Pricing calculator — the authoritative bill of materials for a roof.
//!
//! DESIGN
//! ======
//! Areas come from `wizard::geometry`, the same functions the canvas uses
//! for its immediate display values, so server and client figures can only
//! differ by presentation rounding. Money math runs in `rust_decimal`;
//! intermediate values keep full precision and every figure is rounded once
//! when the result is assembled.
//!
//! Quantity model, per the selected material's config:
//! battens run horizontally every `battens_spacing_cm` up the rafter on both
//! slopes; ten counter-battens per slope follow the rafter; membrane covers
//! the real area with 5% overlap; screws scale with the waste-adjusted area;
//! ridge tape runs the building length. Obstacles subtract covered area and
//! add per-unit flashing cost.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use wire::{CalculationResult, CostSummary, Dimensions, LineItem, MaterialSummary, ObstacleEntry, ObstacleKind};
use wizard::geometry::{self, GeometryError};

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum CalcError {
    #[error("quote has no verified dimensions")]
    MissingDimensions,
    #[error(transparent)]
    Geometry(#[from] GeometryError),
}

// =============================================================================
// CONFIG ACCESS
// =============================================================================

/// Typed access to the material's open-ended pricing config, with the
/// catalog defaults for absent keys.
struct Config<'a> {
    value: &'a serde_json::Value,
}

impl<'a> Config<'a> {
    fn new(value: &'a serde_json::Value) -> Self {
        Self { value }
    }

    fn f64_or(&self, key: &str, default: f64) -> f64 {
        self.value
            .get(key)
            .and_then(serde_json::Value::as_f64)
            .unwrap_or(default)
    }

    fn price_or(&self, key: &str, default: f64) -> Decimal {
        dec(self.f64_or(key, default))
    }

    fn battens_spacing_cm(&self) -> f64 {
        self.f64_or("battens_spacing_cm", 32.0)
    }

    fn screws_per_m2(&self) -> Decimal {
        dec(self.f64_or("screws_per_m2", 7.0))
    }

    fn membrane_price_m2(&self) -> Decimal {
        self.price_or("membrane_price_m2", 7.0)
    }

    fn battens_price_lm(&self) -> Decimal {
        self.price_or("battens_price_mb", 4.0)
    }

    fn counter_battens_price_lm(&self) -> Decimal {
        self.price_or("counter_battens_price_mb", 5.0)
    }

    fn screws_price_per_100(&self) -> Decimal {
        self.price_or("screws_price_per_100", 30.0)
    }

    fn ridge_tape_price_lm(&self) -> Decimal {
        self.price_or("ridge_tape_price_mb", 15.0)
    }
}

/// Flashing labor+material cost per obstacle unit.
fn flashing_cost(kind: ObstacleKind) -> Decimal {
    match kind {
        ObstacleKind::Chimney => Decimal::from(50),
        ObstacleKind::Skylight => Decimal::from(80),
        ObstacleKind::RoofHatch => Decimal::from(40),
        ObstacleKind::VentPipe => Decimal::from(35),
    }
}

fn dec(value: f64) -> Decimal {
    Decimal::from_f64_retain(value).unwrap_or_default()
}

// =============================================================================
// CALCULATION
// =============================================================================

/// Compute the full material breakdown and cost summary for a quote.
///
/// # Errors
///
/// [`CalcError::MissingDimensions`] when either dimension is non-positive;
/// geometry errors for a pitch outside its domain.
#[allow(clippy::too_many_lines)]
pub fn calculate(
    dimensions: &Dimensions,
    pitch_deg: i32,
    obstacles: &[ObstacleEntry],
    material: &MaterialSummary,
    margin_percent: i32,
    vat_rate: i32,
) -> Result<CalculationResult, CalcError> {
    if dimensions.length <= 0.0 || dimensions.width <= 0.0 {
        return Err(CalcError::MissingDimensions);
    }

    let config = Config::new(&material.config);
    let waste_factor = if material.waste_factor > Decimal::ZERO {
        material.waste_factor
    } else {
        dec(wizard::consts::DEFAULT_WASTE_FACTOR)
    };

    // Areas, shared with the canvas display path.
    let plan_area = geometry::plan_area(dimensions);
    let real_area = geometry::real_area(dimensions, pitch_deg)?;
    let material_needed = dec(real_area) * waste_factor;

    // Supporting structure follows the rafter run.
    let rafter = geometry::rafter_length(dimensions.width, pitch_deg)?;
    #[allow(clippy::cast_possible_truncation)]
    let battens_rows = (rafter * 100.0 / config.battens_spacing_cm()) as i64 + 1;
    let battens_meters = Decimal::from(battens_rows) * dec(dimensions.length) * Decimal::from(2);
    let counter_battens_meters = Decimal::from(10) * dec(rafter) * Decimal::from(2);
    let membrane_area = dec(real_area) * dec(1.05);
    let screws_quantity = (material_needed * config.screws_per_m2())
        .trunc()
        .to_i64()
        .unwrap_or(0);
    let ridge_length = dec(dimensions.length);

    // Obstacles shrink the covered area and add flashing work.
    let area_reduction = dec(geometry::obstacle_area_reduction(obstacles));
    let obstacles_extra_cost: Decimal = obstacles
        .iter()
        .map(|entry| flashing_cost(entry.kind) * Decimal::from(entry.quantity))
        .sum();
    let obstacle_count: u32 = obstacles.iter().map(|entry| entry.quantity).sum();
    let adjusted_material = material_needed - area_reduction;

    // Costs.
    let roofing_cost = adjusted_material * material.price_per_m2;
    let battens_cost = battens_meters * config.battens_price_lm();
    let counter_battens_cost = counter_battens_meters * config.counter_battens_price_lm();
    let membrane_cost = membrane_area * config.membrane_price_m2();
    let screws_cost = Decimal::from(screws_quantity) / Decimal::from(100) * config.screws_price_per_100();
    let ridge_tape_cost = ridge_length * config.ridge_tape_price_lm();

    let materials_net = roofing_cost
        + battens_cost
        + counter_battens_cost
        + membrane_cost
        + screws_cost
        + ridge_tape_cost
        + obstacles_extra_cost;
    let labor_net = materials_net * Decimal::from(margin_percent) / Decimal::from(100);
    let total_net = materials_net + labor_net;
    let vat = total_net * Decimal::from(vat_rate) / Decimal::from(100);
    let total_gross = total_net + vat;

    let mut materials = BTreeMap::new();
    materials.insert(
        "roofing".to_owned(),
        LineItem {
            name: material.name.clone(),
            quantity: adjusted_material.round_dp(1),
            unit: "m²".to_owned(),
            unit_price: Some(material.price_per_m2),
            total: roofing_cost.round_dp(2),
        },
    );
    materials.insert(
        "membrane".to_owned(),
        LineItem {
            name: "Roofing membrane".to_owned(),
            quantity: membrane_area.round_dp(1),
            unit: "m²".to_owned(),
            unit_price: Some(config.membrane_price_m2()),
            total: membrane_cost.round_dp(2),
        },
    );
    materials.insert(
        "counter_battens".to_owned(),
        LineItem {
            name: "Counter battens".to_owned(),
            quantity: counter_battens_meters.round_dp(1),
            unit: "lm".to_owned(),
            unit_price: Some(config.counter_battens_price_lm()),
            total: counter_battens_cost.round_dp(2),
        },
    );
    materials.insert(
        "battens".to_owned(),
        LineItem {
            name: "Battens".to_owned(),
            quantity: battens_meters.round_dp(1),
            unit: "lm".to_owned(),
            unit_price: Some(config.battens_price_lm()),
            total: battens_cost.round_dp(2),
        },
    );
    materials.insert(
        "screws".to_owned(),
        LineItem {
            name: "Fixing screws".to_owned(),
            quantity: Decimal::from(screws_quantity),
            unit: "pcs".to_owned(),
            unit_price: Some((config.screws_price_per_100() / Decimal::from(100)).round_dp(3)),
            total: screws_cost.round_dp(2),
        },
    );
    materials.insert(
        "ridge_tape".to_owned(),
        LineItem {
            name: "Ridge tape".to_owned(),
            quantity: ridge_length.round_dp(1),
            unit: "lm".to_owned(),
            unit_price: Some(config.ridge_tape_price_lm()),
            total: ridge_tape_cost.round_dp(2),
        },
    );
    if obstacles_extra_cost > Decimal::ZERO {
        materials.insert(
            "obstacles".to_owned(),
            LineItem {
                name: "Flashings (chimneys, skylights, hatches, vents)".to_owned(),
                quantity: Decimal::from(obstacle_count),
                unit: "pcs".to_owned(),
                unit_price: None,
                total: obstacles_extra_cost.round_dp(2),
            },
        );
    }

    Ok(CalculationResult {
        plan_area: round2(plan_area),
        real_area: round2(real_area),
        materials,
        summary: CostSummary {
            materials_net: materials_net.round_dp(2),
            labor_net: labor_net.round_dp(2),
            total_net: total_net.round_dp(2),
            vat: vat.round_dp(2),
            vat_rate,
            total_gross: total_gross.round_dp(2),
        },
    })
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;
    use wire::MaterialCategory;

    use super::*;

    fn material(price: &str, waste: &str, config: serde_json::Value) -> MaterialSummary {
        MaterialSummary {
            id: 1,
            name: "Test tile".to_owned(),
            category: MaterialCategory::MetalTile,
            description: String::new(),
            price_per_m2: price.parse().unwrap(),
            waste_factor: waste.parse().unwrap(),
            config,
        }
    }

    fn default_material() -> MaterialSummary {
        material("40.00", "1.12", serde_json::json!({}))
    }

    #[test]
    fn golden_ten_by_eight_at_thirty_five_degrees() {
        let result = calculate(&Dimensions::new(10.0, 8.0), 35, &[], &default_material(), 35, 23).unwrap();

        assert!((result.plan_area - 80.0).abs() < 1e-9);
        assert!((result.real_area - 97.66).abs() < 1e-9);

        let roofing = &result.materials["roofing"];
        assert_eq!(roofing.quantity, dec!(109.4));
        assert_eq!(roofing.total, dec!(4375.26));

        let battens = &result.materials["battens"];
        assert_eq!(battens.quantity, dec!(320.0));
        assert_eq!(battens.total, dec!(1280.00));

        let counter = &result.materials["counter_battens"];
        assert_eq!(counter.quantity, dec!(97.7));
        assert_eq!(counter.total, dec!(488.31));

        let membrane = &result.materials["membrane"];
        assert_eq!(membrane.quantity, dec!(102.5));
        assert_eq!(membrane.total, dec!(717.82));

        let screws = &result.materials["screws"];
        assert_eq!(screws.quantity, dec!(765));
        assert_eq!(screws.unit_price, Some(dec!(0.300)));
        assert_eq!(screws.total, dec!(229.50));

        let ridge = &result.materials["ridge_tape"];
        assert_eq!(ridge.quantity, dec!(10.0));
        assert_eq!(ridge.total, dec!(150.00));

        assert_eq!(result.summary.materials_net, dec!(7240.88));
        assert_eq!(result.summary.labor_net, dec!(2534.31));
        assert_eq!(result.summary.total_net, dec!(9775.19));
        assert_eq!(result.summary.vat, dec!(2248.29));
        assert_eq!(result.summary.vat_rate, 23);
        assert_eq!(result.summary.total_gross, dec!(12023.48));
    }

    #[test]
    fn obstacles_reduce_area_and_add_flashing() {
        let obstacles = [
            ObstacleEntry { kind: ObstacleKind::Chimney, quantity: 2 },
            ObstacleEntry { kind: ObstacleKind::VentPipe, quantity: 1 },
        ];
        let result =
            calculate(&Dimensions::new(10.0, 8.0), 35, &obstacles, &default_material(), 35, 23).unwrap();

        let roofing = &result.materials["roofing"];
        assert_eq!(roofing.quantity, dec!(107.3));
        assert_eq!(roofing.total, dec!(4291.26));

        let flashings = &result.materials["obstacles"];
        assert_eq!(flashings.quantity, dec!(3));
        assert_eq!(flashings.unit_price, None);
        assert_eq!(flashings.total, dec!(135.00));

        assert_eq!(result.summary.materials_net, dec!(7291.88));
    }

    #[test]
    fn no_obstacle_line_without_obstacles() {
        let result = calculate(&Dimensions::new(10.0, 8.0), 35, &[], &default_material(), 35, 23).unwrap();
        assert!(!result.materials.contains_key("obstacles"));
    }

    #[test]
    fn config_overrides_change_quantities() {
        let custom = material(
            "40.00",
            "1.12",
            serde_json::json!({"battens_spacing_cm": 50, "screws_per_m2": 2}),
        );
        let result = calculate(&Dimensions::new(10.0, 8.0), 35, &[], &custom, 35, 23).unwrap();

        // rafter ≈ 4.883 m → 488.3/50 → 9 + 1 = 10 rows → 200 lm.
        assert_eq!(result.materials["battens"].quantity, dec!(200.0));
        // 109.38 * 2 → 218 screws.
        assert_eq!(result.materials["screws"].quantity, dec!(218));
    }

    #[test]
    fn zero_waste_factor_falls_back_to_default() {
        let degenerate = material("40.00", "0.00", serde_json::json!({}));
        let with_default = calculate(&Dimensions::new(10.0, 8.0), 35, &[], &degenerate, 35, 23).unwrap();
        let explicit = calculate(&Dimensions::new(10.0, 8.0), 35, &[], &default_material(), 35, 23).unwrap();
        assert_eq!(
            with_default.materials["roofing"].quantity,
            explicit.materials["roofing"].quantity
        );
    }

    #[test]
    fn margin_and_vat_scale_the_summary() {
        let zero = calculate(&Dimensions::new(10.0, 8.0), 35, &[], &default_material(), 0, 0).unwrap();
        assert_eq!(zero.summary.labor_net, dec!(0.00));
        assert_eq!(zero.summary.vat, dec!(0.00));
        assert_eq!(zero.summary.total_gross, zero.summary.materials_net);
    }

    #[test]
    fn missing_dimensions_are_rejected() {
        let err = calculate(&Dimensions::new(0.0, 8.0), 35, &[], &default_material(), 35, 23).unwrap_err();
        assert!(matches!(err, CalcError::MissingDimensions));
    }

    #[test]
    fn out_of_domain_pitch_is_rejected() {
        let err = calculate(&Dimensions::new(10.0, 8.0), 90, &[], &default_material(), 35, 23).unwrap_err();
        assert!(matches!(err, CalcError::Geometry(GeometryError::PitchOutOfDomain(90))));
    }

    #[test]
    fn flat_pitch_keeps_plan_equal_to_real() {
        let result = calculate(&Dimensions::new(10.0, 8.0), 0, &[], &default_material(), 35, 23).unwrap();
        assert!((result.plan_area - result.real_area).abs() < 1e-9);
    }
}
