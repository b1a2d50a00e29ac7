use std::collections::BTreeMap;

use rust_decimal::Decimal;
use uuid::Uuid;

use super::*;

fn sample_summary() -> CostSummary {
    CostSummary {
        materials_net: Decimal::new(1234_56, 2),
        labor_net: Decimal::new(432_10, 2),
        total_net: Decimal::new(1666_66, 2),
        vat: Decimal::new(383_33, 2),
        vat_rate: 23,
        total_gross: Decimal::new(2049_99, 2),
    }
}

fn sample_calculation() -> CalculationResult {
    let mut materials = BTreeMap::new();
    materials.insert(
        "roofing".to_owned(),
        LineItem {
            name: "Clay tile".to_owned(),
            quantity: Decimal::new(1094, 1),
            unit: "m²".to_owned(),
            unit_price: Some(Decimal::new(45_00, 2)),
            total: Decimal::new(4923_00, 2),
        },
    );
    CalculationResult {
        plan_area: 80.0,
        real_area: 97.7,
        materials,
        summary: sample_summary(),
    }
}

// --- RoofType ---

#[test]
fn roof_type_serializes_lowercase() {
    let json = serde_json::to_string(&RoofType::Mansard).unwrap();
    assert_eq!(json, "\"mansard\"");
}

#[test]
fn roof_type_round_trips_all_variants() {
    for ty in [RoofType::Gable, RoofType::Hip, RoofType::Mansard, RoofType::Flat] {
        let json = serde_json::to_string(&ty).unwrap();
        let back: RoofType = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ty);
    }
}

#[test]
fn roof_type_str_mapping_is_inverse() {
    for ty in [RoofType::Gable, RoofType::Hip, RoofType::Mansard, RoofType::Flat] {
        assert_eq!(RoofType::from_str(ty.as_str()), Some(ty));
    }
    assert_eq!(RoofType::from_str("geodesic"), None);
}

// --- ObstacleKind ---

#[test]
fn obstacle_kind_serializes_snake_case() {
    let json = serde_json::to_string(&ObstacleKind::RoofHatch).unwrap();
    assert_eq!(json, "\"roof_hatch\"");
    let json = serde_json::to_string(&ObstacleKind::VentPipe).unwrap();
    assert_eq!(json, "\"vent_pipe\"");
}

#[test]
fn obstacle_entry_round_trips() {
    let entry = ObstacleEntry { kind: ObstacleKind::Chimney, quantity: 2 };
    let json = serde_json::to_string(&entry).unwrap();
    let back: ObstacleEntry = serde_json::from_str(&json).unwrap();
    assert_eq!(back, entry);
}

#[test]
fn obstacle_kind_all_covers_every_variant() {
    let all = ObstacleKind::all();
    assert_eq!(all.len(), 4);
    assert!(all.contains(&ObstacleKind::Chimney));
    assert!(all.contains(&ObstacleKind::Skylight));
    assert!(all.contains(&ObstacleKind::RoofHatch));
    assert!(all.contains(&ObstacleKind::VentPipe));
}

// --- QuoteStatus ---

#[test]
fn quote_status_default_is_draft() {
    assert_eq!(QuoteStatus::default(), QuoteStatus::Draft);
}

#[test]
fn quote_status_str_mapping_is_inverse() {
    for status in [QuoteStatus::Draft, QuoteStatus::Sent, QuoteStatus::Accepted, QuoteStatus::Rejected] {
        assert_eq!(QuoteStatus::from_str(status.as_str()), Some(status));
    }
    assert_eq!(QuoteStatus::from_str("archived"), None);
}

// --- CalculationResult ---

#[test]
fn calculation_round_trips_decimals_exactly() {
    let calc = sample_calculation();
    let json = serde_json::to_string(&calc).unwrap();
    let back: CalculationResult = serde_json::from_str(&json).unwrap();
    assert_eq!(back, calc);
    assert_eq!(back.summary.total_gross, Decimal::new(2049_99, 2));
}

#[test]
fn line_item_without_unit_price_omits_field() {
    let item = LineItem {
        name: "Flashing".to_owned(),
        quantity: Decimal::new(3, 0),
        unit: "pcs".to_owned(),
        unit_price: None,
        total: Decimal::new(150_00, 2),
    };
    let json = serde_json::to_string(&item).unwrap();
    assert!(!json.contains("unit_price"));
}

// --- QuoteDetail ---

#[test]
fn quote_detail_round_trips() {
    let detail = QuoteDetail {
        id: Uuid::new_v4(),
        number: "2026/08/0001".to_owned(),
        status: QuoteStatus::Draft,
        client: ClientDetails { name: "Jan Kowalski".to_owned(), ..ClientDetails::default() },
        roof_type: RoofType::Gable,
        pitch_angle: 35,
        dimensions: Some(Dimensions::new(10.0, 8.0)),
        obstacles: vec![ObstacleEntry { kind: ObstacleKind::Chimney, quantity: 1 }],
        plan_area: Some(80.0),
        real_area: None,
        image_url: Some("/media/quotes/abc/plan.png".to_owned()),
        ai_processed: true,
        ai_processing: false,
        ai_confidence: Some(0.7),
        ai_warnings: vec!["pitch angle not found on drawing".to_owned()],
        material: None,
        calculation: Some(sample_calculation()),
        margin_percent: 35,
        vat_rate: 23,
        offer: None,
    };
    let json = serde_json::to_string(&detail).unwrap();
    let back: QuoteDetail = serde_json::from_str(&json).unwrap();
    assert_eq!(back.id, detail.id);
    assert_eq!(back.number, "2026/08/0001");
    assert_eq!(back.dimensions.unwrap(), Dimensions::new(10.0, 8.0));
    assert_eq!(back.obstacles.len(), 1);
    assert!(back.ai_processed);
}

#[test]
fn quote_detail_tolerates_missing_optional_fields() {
    let json = serde_json::json!({
        "id": Uuid::new_v4(),
        "number": "2026/08/0002",
        "status": "draft",
        "client": {},
        "roof_type": "gable",
        "pitch_angle": 35,
        "ai_processed": false,
        "ai_processing": false,
        "margin_percent": 35,
        "vat_rate": 23
    });
    let detail: QuoteDetail = serde_json::from_value(json).unwrap();
    assert!(detail.dimensions.is_none());
    assert!(detail.obstacles.is_empty());
    assert!(detail.ai_warnings.is_empty());
    assert!(detail.calculation.is_none());
}

// --- MaterialSummary ---

#[test]
fn material_summary_round_trips_config() {
    let material = MaterialSummary {
        id: 1,
        name: "Steel tile".to_owned(),
        category: MaterialCategory::MetalTile,
        description: String::new(),
        price_per_m2: Decimal::new(38_50, 2),
        waste_factor: Decimal::new(112, 2),
        config: serde_json::json!({"battens_spacing_cm": 35, "screws_per_m2": 7}),
    };
    let json = serde_json::to_string(&material).unwrap();
    let back: MaterialSummary = serde_json::from_str(&json).unwrap();
    assert_eq!(back.price_per_m2, material.price_per_m2);
    assert_eq!(back.config["battens_spacing_cm"], 35);
}
