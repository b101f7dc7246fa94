//! Shared constants for integration tests.

/// Base URL used for every scripted upstream.
pub const BASE_URL: &str = "https://vsphere.local";

/// `Authorization` value produced for `admin:secret`.
pub const BASIC_ADMIN: &str = "Basic YWRtaW46c2VjcmV0";
