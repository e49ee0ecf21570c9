use pagecap_lib::{CaptureError, ErrorCategory};

#[test]
fn config_error_display_includes_message() {
    let err = CaptureError::Config("missing viewport".to_string());

    assert_eq!(format!("{}", err), "Configuration error: missing viewport");
}

#[test]
fn io_error_display_wraps_source() {
    let io_err = std::io::Error::other("disk full");
    let err: CaptureError = io_err.into();
    let rendered = format!("{}", err);

    assert!(rendered.starts_with("IO error: "));
    assert!(rendered.contains("disk full"));
}

#[test]
fn not_found_and_interaction_render_distinct_messages() {
    let not_found = CaptureError::not_found("selector `div.x` (searched top document and 2 frames)");
    let interaction = CaptureError::interaction("all activation strategies exhausted for div.x");

    let nf = format!("{}", not_found);
    let ia = format!("{}", interaction);
    assert!(nf.contains("not found"));
    assert!(ia.contains("Interaction failed"));
    assert_ne!(nf, ia);
}

#[test]
fn session_payload_suggests_installing_a_browser() {
    let err = CaptureError::session("could not find a chrome executable");
    let payload = err.to_payload();

    assert_eq!(payload.category, ErrorCategory::Session);
    let remediation = payload.remediation.unwrap_or_default();
    assert!(
        remediation.contains("Chrome") || remediation.contains("Chromium"),
        "expected a browser install hint, got: {remediation}"
    );
}

#[test]
fn extraction_payload_explains_empty_output() {
    let err = CaptureError::extraction("inline snapshot of div.x came back empty");
    let payload = err.to_payload();

    assert_eq!(payload.category, ErrorCategory::Extraction);
    assert!(payload.message.contains("came back empty"));
}
