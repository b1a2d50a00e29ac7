use wizard::quote::ValidationError;

use super::*;

fn status_of(err: ApiError) -> StatusCode {
    err.0
}

// --- error mapping ---

#[test]
fn quote_errors_map_to_expected_statuses() {
    let id = Uuid::new_v4();
    assert_eq!(status_of(quote_error_to_response(QuoteError::NotFound(id))), StatusCode::NOT_FOUND);
    assert_eq!(
        status_of(quote_error_to_response(QuoteError::Validation(
            ValidationError::DimensionOutOfRange { value: 1.5 }
        ))),
        StatusCode::UNPROCESSABLE_ENTITY
    );
    assert_eq!(
        status_of(quote_error_to_response(QuoteError::Payload(PayloadError::TooLarge {
            size: 20_000_000
        }))),
        StatusCode::PAYLOAD_TOO_LARGE
    );
    assert_eq!(
        status_of(quote_error_to_response(QuoteError::Payload(PayloadError::UnsupportedType {
            file_name: "plan.svg".into()
        }))),
        StatusCode::UNSUPPORTED_MEDIA_TYPE
    );
}

#[test]
fn extraction_errors_map_to_expected_statuses() {
    assert_eq!(
        status_of(extraction_error_to_response(ExtractionError::NoImage)),
        StatusCode::BAD_REQUEST
    );
    assert_eq!(
        status_of(extraction_error_to_response(ExtractionError::Parse("bad json".into()))),
        StatusCode::BAD_GATEWAY
    );
    assert_eq!(
        status_of(extraction_error_to_response(ExtractionError::Quote(QuoteError::NotFound(
            Uuid::new_v4()
        )))),
        StatusCode::NOT_FOUND
    );
}

#[test]
fn calc_and_offer_errors_map_to_expected_statuses() {
    assert_eq!(
        status_of(calc_error_to_response(CalcError::MissingDimensions)),
        StatusCode::CONFLICT
    );
    assert_eq!(
        status_of(calc_error_to_response(CalcError::Geometry(
            wizard::geometry::GeometryError::PitchOutOfDomain(90)
        ))),
        StatusCode::UNPROCESSABLE_ENTITY
    );
    assert_eq!(
        status_of(offer_error_to_response(OfferError::MissingCalculation)),
        StatusCode::CONFLICT
    );
}

#[test]
fn error_body_carries_message() {
    let (_, Json(body)) = quote_error_to_response(QuoteError::Payload(PayloadError::TooLarge {
        size: 11_000_000,
    }));
    assert!(body.error.contains("11000000"));
}

// --- request body shapes ---

#[test]
fn calculate_body_accepts_optional_margin() {
    let body: CalculateBody = serde_json::from_str(r#"{"material_id": 3}"#).unwrap();
    assert_eq!(body.material_id, 3);
    assert_eq!(body.margin_percent, None);

    let body: CalculateBody =
        serde_json::from_str(r#"{"material_id": 3, "margin_percent": 40}"#).unwrap();
    assert_eq!(body.margin_percent, Some(40));
}

#[test]
fn obstacles_body_defaults_to_empty_list() {
    let body: ObstaclesBody = serde_json::from_str("{}").unwrap();
    assert!(body.obstacles.is_empty());

    let body: ObstaclesBody =
        serde_json::from_str(r#"{"obstacles": [{"kind": "chimney", "quantity": 2}]}"#).unwrap();
    assert_eq!(body.obstacles.len(), 1);
}
