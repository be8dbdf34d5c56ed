pub(crate) mod courses;
pub(crate) mod identity;
