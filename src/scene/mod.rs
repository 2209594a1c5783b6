//! Asset, layer, and data-source seams plus the JSON card boundary model.

pub(crate) mod validate;

pub mod compose;
pub mod model;
