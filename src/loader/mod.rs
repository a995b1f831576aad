pub(crate) mod atlas;
pub(crate) mod parse;
pub(crate) mod xml;
