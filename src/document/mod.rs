pub(crate) mod labels;
pub(crate) mod model;
pub(crate) mod setup;
