use super::*;
use regions::SelectMode;

fn catalog() -> RegionCatalog {
    RegionCatalog::bundled().expect("catalog")
}

#[test]
fn login_requires_both_fields() {
    let report = LoginForm::default().validate();
    assert_eq!(report.get("username"), Some(FieldError::Required));
    assert_eq!(report.get("password"), Some(FieldError::Required));

    let request = LoginForm {
        username: "  dennis027 ".into(),
        password: "secret".into(),
    }
    .into_request()
    .expect("valid login");
    assert_eq!(request.identifier, "dennis027");
}

#[test]
fn register_reports_each_field_once() {
    let report = RegisterForm {
        username: "jane".into(),
        email: "jane.example.com".into(),
        password: "abc".into(),
        confirm_password: "abd".into(),
        account_type: AccountType::Supervisor,
    }
    .validate();

    assert_eq!(report.get("username"), None);
    assert_eq!(report.get("email"), Some(FieldError::InvalidEmail));
    assert_eq!(report.get("password"), Some(FieldError::TooShort));
    assert_eq!(report.get("confirm_password"), Some(FieldError::Mismatch));
    assert_eq!(
        report.to_string(),
        "confirm_password: mismatch, email: invalid_email, password: too_short"
    );
}

#[test]
fn register_accepts_matching_passwords() {
    let request = RegisterForm {
        username: "jane".into(),
        email: "jane.wanjiru@example.com".into(),
        password: "hunter22".into(),
        confirm_password: "hunter22".into(),
        account_type: AccountType::Worker,
    }
    .into_request()
    .expect("valid registration");
    assert_eq!(request.account_type, AccountType::Worker);
}

#[test]
fn phone_rules_follow_local_numbering() {
    assert!(is_valid_phone("254712345678"));
    assert!(is_valid_phone("0712 345-678"));
    assert!(is_valid_phone("712345678"));
    assert!(is_valid_phone("112345678"));
    assert!(!is_valid_phone("25471234567"));
    assert!(!is_valid_phone("+254712345678"));
    assert!(!is_valid_phone("812345678"));
    assert!(!is_valid_phone("07123a5678"));
}

#[test]
fn msisdn_normalization_covers_every_prefix() {
    assert_eq!(normalize_msisdn("0712345678").as_deref(), Some("254712345678"));
    assert_eq!(normalize_msisdn("+254712345678").as_deref(), Some("254712345678"));
    assert_eq!(normalize_msisdn("254712345678").as_deref(), Some("254712345678"));
    assert_eq!(normalize_msisdn("712 345 678").as_deref(), Some("254712345678"));
    assert_eq!(normalize_msisdn("12345"), None);
    assert_eq!(display_msisdn("254712345678"), "0712345678");
    assert_eq!(display_msisdn("0712345678"), "0712345678");
}

#[test]
fn payment_rejects_non_positive_amounts() {
    let report = PaymentForm {
        phone_number: "0712345678".into(),
        amount: "0".into(),
    }
    .validate();
    assert_eq!(report.get("amount"), Some(FieldError::InvalidAmount));

    let request = PaymentForm {
        phone_number: "+254712345678".into(),
        amount: "1500".into(),
    }
    .into_request()
    .expect("valid payment");
    assert_eq!(request.phone_number, "254712345678");
    assert_eq!(request.amount, 1500.0);
}

#[test]
fn site_location_is_optional_until_started() {
    let catalog = catalog();
    let mut form = SiteForm {
        name: "Westlands Construction".into(),
        phone_number: "0712345678".into(),
        ..SiteForm::default()
    };
    assert!(form.validate().is_valid());

    form.location
        .select_region(&catalog, "Nairobi", SelectMode::UserEdit);
    let report = form.validate();
    assert_eq!(report.get("constituency"), Some(FieldError::Required));
    assert_eq!(report.get("ward"), Some(FieldError::Required));

    form.location
        .select_sub_region(&catalog, "Westlands", SelectMode::UserEdit);
    form.location.select_ward("Parklands");
    let payload = form.into_payload().expect("complete site");
    assert_eq!(payload.location.ward, "Parklands");
}

#[test]
fn profile_form_prefills_from_saved_profile() {
    let catalog = catalog();
    let profile = UserProfile {
        username: "dennis027".into(),
        full_name: Some("Dennis Kimani".into()),
        national_id: Some("12345678".into()),
        phone: Some("0712345678".into()),
        county: Some("Lamu".into()),
        constituency: Some("Lamu West".into()),
        ward: Some("Hongwe".into()),
        ..UserProfile::default()
    };

    let form = ProfileForm::from_profile(&profile, &catalog);
    assert!(form.location.ward_enabled());
    assert_eq!(form.location.ward_options().len(), 7);

    let update = form.into_update().expect("complete profile");
    assert_eq!(update.county, "Lamu");
    assert_eq!(update.constituency, "Lamu West");
    assert_eq!(update.ward, "Hongwe");
}

#[test]
fn profile_form_flags_stale_location() {
    let catalog = catalog();
    let profile = UserProfile {
        full_name: Some("Dennis Kimani".into()),
        national_id: Some("12345678".into()),
        phone: Some("12".into()),
        county: Some("Lamu".into()),
        constituency: Some("Lamu West".into()),
        ward: Some("Parklands".into()),
        ..UserProfile::default()
    };

    let report = ProfileForm::from_profile(&profile, &catalog).validate();
    assert_eq!(report.get("phone"), Some(FieldError::InvalidPhone));
    assert_eq!(report.get("county"), None);
    assert_eq!(report.get("ward"), Some(FieldError::Required));
}
