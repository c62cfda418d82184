/// Request-level facts every nested document may need.
///
/// Passed explicitly through validation and serialization instead of walking
/// parent links up to the document root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootContext {
    pub authenticated_role: String,
}

pub const ADMINISTRATOR: &str = "Administrator";
pub const EDIT_ROLE: &str = "edit";
pub const CREATE_ROLE: &str = "create";

impl RootContext {
    pub fn new(authenticated_role: impl Into<String>) -> Self {
        Self {
            authenticated_role: authenticated_role.into(),
        }
    }

    /// Role used to serialize an edited document: administrators get their
    /// own view, everyone else gets `edit`.
    pub fn edit_role(&self) -> &'static str {
        if self.authenticated_role == ADMINISTRATOR {
            ADMINISTRATOR
        } else {
            EDIT_ROLE
        }
    }
}
