//! Expiry is judged by the verifier's clock: valid strictly before `exp`,
//! denied at and after it.

use crate::claims::Capability;
use crate::e2e_tests::helpers::{Fixture, NOW, request};
use crate::registry_tokens::Authenticator;

#[test]
fn test_one_second_token_boundary() {
    let fixture = Fixture::new();
    let token = fixture.issue(&[Capability::Pull], &[], Some(1.0 / 60.0), None);
    let request = request("GET", "/v2/app/manifests/latest", &token);

    assert!(
        fixture
            .verifier_at(NOW)
            .check_credentials(&request)
            .is_verified()
    );
    assert!(
        !fixture
            .verifier_at(NOW + 1)
            .check_credentials(&request)
            .is_verified()
    );
    assert!(
        !fixture
            .verifier_at(NOW + 3600)
            .check_credentials(&request)
            .is_verified()
    );
}

#[test]
fn test_minutes_expiry() {
    let fixture = Fixture::new();
    let token = fixture.issue(&[Capability::Pull], &[], Some(30.0), None);
    let request = request("GET", "/v2/app/tags/list", &token);

    assert!(
        fixture
            .verifier_at(NOW + 30 * 60 - 1)
            .check_credentials(&request)
            .is_verified()
    );
    assert!(
        !fixture
            .verifier_at(NOW + 30 * 60)
            .check_credentials(&request)
            .is_verified()
    );
}

#[test]
fn test_token_without_expiry_never_expires() {
    let fixture = Fixture::new();
    let token = fixture.issue(&[Capability::Pull], &[], None, None);
    let request = request("GET", "/v2/app/tags/list", &token);

    assert!(
        fixture
            .verifier_at(u64::MAX)
            .check_credentials(&request)
            .is_verified()
    );
}

#[test]
fn test_verifier_before_issuance_still_accepts() {
    // Only `exp` is compared; a verifier clock behind the issuer's is fine.
    let fixture = Fixture::new();
    let token = fixture.issue(&[Capability::Pull], &[], Some(1.0), None);
    let request = request("GET", "/v2/app/tags/list", &token);

    assert!(
        fixture
            .verifier_at(NOW - 600)
            .check_credentials(&request)
            .is_verified()
    );
}

#[test]
fn test_zero_minute_token_is_already_expired() {
    let fixture = Fixture::new();
    let token = fixture.issue(&[Capability::Pull], &[], Some(0.0), None);

    assert!(!fixture.check("GET", "/v2/app/tags/list", &token).is_verified());
}
