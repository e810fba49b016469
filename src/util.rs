pub(crate) mod path;
pub(crate) mod str;
pub(crate) mod uri;
