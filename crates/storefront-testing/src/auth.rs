//! Identity helpers for router tests.
//!
//! Services behind the gateway trust `x-storefront-user-id` and
//! `x-storefront-user-role`. `MockAuth` produces those headers directly.

use axum::http::{HeaderMap, HeaderName, HeaderValue};
use uuid::Uuid;

use storefront_auth_types::identity::{USER_ID_HEADER, USER_ROLE_HEADER, UserRole};
use storefront_domain::id::UserId;

/// Identity injected into test requests.
pub struct MockAuth {
    pub user_id: UserId,
    pub role: UserRole,
}

impl MockAuth {
    pub fn customer() -> Self {
        Self {
            user_id: UserId(Uuid::new_v4()),
            role: UserRole::Customer,
        }
    }

    pub fn admin() -> Self {
        Self {
            user_id: UserId(Uuid::new_v4()),
            role: UserRole::Admin,
        }
    }

    /// Headers as the gateway would inject them.
    pub fn headers(&self) -> HeaderMap {
        let mut map = HeaderMap::new();
        map.insert(
            HeaderName::from_static(USER_ID_HEADER),
            HeaderValue::from_str(&self.user_id.to_string()).unwrap(),
        );
        map.insert(
            HeaderName::from_static(USER_ROLE_HEADER),
            HeaderValue::from(u16::from(self.role.code())),
        );
        map
    }
}
