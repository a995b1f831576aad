pub(crate) mod overrides;
pub(crate) mod player;
pub(crate) mod track;
