/// Maximum accepted upload size in bytes (10MB)
/// Robot pictures from phones are typically 2-5MB
pub const MAX_UPLOAD_SIZE_BYTES: usize = 10_485_760;

/// Relative URL prefix under which uploaded files are served
pub const UPLOADS_URL_PREFIX: &str = "/uploads/";

// =============================================================================
// Error Messages
// =============================================================================

/// Error message for requests with no resolved identity
pub const ERR_SIGN_IN: &str = "Sign in to continue.";

/// Error message for identities lacking the upload capability
pub const ERR_NEED_UPLOAD_ROLE: &str =
    "You do not have permission to submit or upload. Ask an admin to grant you access.";

/// Error message for identities lacking the admin capability
pub const ERR_NEED_ADMIN_ROLE: &str = "Admin access required.";

/// Error message for user creation/update with an unrecognized role
pub const ERR_INVALID_ROLE: &str = "Role must be \"admin\" or \"upload\"";
