use serde::{Deserialize, Serialize};
use sqlx::Type;

/// Platform-wide capability of an account. Serialised as `Admin` / `Teacher` / `Student`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type)]
#[sqlx(type_name = "userrole", rename_all = "lowercase")]
pub(crate) enum UserRole {
    Admin,
    Teacher,
    Student,
}

impl UserRole {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "Admin",
            Self::Teacher => "Teacher",
            Self::Student => "Student",
        }
    }

    /// Admins and teachers manage rosters on behalf of students.
    pub(crate) fn is_staff(self) -> bool {
        match self {
            Self::Admin | Self::Teacher => true,
            Self::Student => false,
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
