use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(XflError::parse("x").to_string().contains("parse error:"));
    assert!(
        XflError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(
        XflError::evaluation("x")
            .to_string()
            .contains("evaluation error:")
    );
    assert!(
        XflError::serde("x")
            .to_string()
            .contains("serialization error:")
    );
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = XflError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
