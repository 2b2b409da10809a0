//! Current-user resolution.
//!
//! The identity provider sits in front of the BFF and forwards the signed-in user as
//! plain headers. Nothing here authenticates anyone; it only tells the upload gate and
//! the dashboard who is asking.

use ayush_core::ayush_types::CurrentUser;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_NAME_HEADER: &str = "x-user-name";
pub const USER_EMAIL_HEADER: &str = "x-user-email";

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Build the current user from forwarded identity values.
///
/// Returns `None` (anonymous) unless a non-blank uid is present.
pub fn current_user(
    uid: Option<&str>,
    display_name: Option<&str>,
    email: Option<&str>,
) -> Option<CurrentUser> {
    let uid = non_blank(uid)?;
    Some(CurrentUser {
        uid,
        display_name: non_blank(display_name),
        email: non_blank(email),
    })
}
