pub(crate) mod evaluator;
pub(crate) mod events;
pub(crate) mod mask;
