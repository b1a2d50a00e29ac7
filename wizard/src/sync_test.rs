use super::*;

// --- validate_payload ---

#[test]
fn accepts_images_and_pdf_within_bound() {
    assert!(validate_payload("plan.jpg", 1024).is_ok());
    assert!(validate_payload("plan.JPEG", 1024).is_ok());
    assert!(validate_payload("plan.png", 10 * 1024 * 1024).is_ok());
    assert!(validate_payload("plan.webp", 0).is_ok());
    assert!(validate_payload("drawing.pdf", 512).is_ok());
}

#[test]
fn rejects_oversized_payload() {
    let size = 10 * 1024 * 1024 + 1;
    assert_eq!(
        validate_payload("plan.png", size),
        Err(PayloadError::TooLarge { size })
    );
}

#[test]
fn rejects_unsupported_extension() {
    assert!(matches!(
        validate_payload("plan.svg", 10),
        Err(PayloadError::UnsupportedType { .. })
    ));
    assert!(validate_payload("plan.txt", 10).is_err());
}

#[test]
fn rejects_names_without_extension() {
    assert!(matches!(
        validate_payload("plan", 10),
        Err(PayloadError::UnsupportedType { .. })
    ));
}

#[test]
fn size_check_runs_before_type_check() {
    // Oversized and wrong type: size wins so the user fixes the hard limit first.
    let size = 20 * 1024 * 1024;
    assert_eq!(
        validate_payload("plan.svg", size),
        Err(PayloadError::TooLarge { size })
    );
}
