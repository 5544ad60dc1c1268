use uuid::Uuid;

/// Random id stored in a cookie to tell browsers apart in interaction logs. It carries no
/// information about the reader.
pub fn generate_browser_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Trims the string param, and converts to None if it is empty
pub fn empty_to_none(val: &mut Option<String>) {
    if let Some(val_) = val {
        *val_ = val_.trim().to_string();
        if val_.is_empty() {
            *val = None
        }
    }
}

#[test]
fn test_empty_to_none() {
    let mut val = Some("  ".to_string());
    empty_to_none(&mut val);
    assert_eq!(None, val);
    let mut val = Some(" R_1a ".to_string());
    empty_to_none(&mut val);
    assert_eq!(Some("R_1a".to_string()), val);
}
