use crate::foundation::error::{PlatenError, PlatenResult};
use crate::scene::validate::validate_card;
use crate::template::helpers::HelperFn;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// One row of an asset's tabular sample data.
pub type DataRow = Vec<serde_json::Value>;

/// A layer's self-contained markup and stylesheet text.
///
/// Fragments share no namespace; stacking order is the only isolation
/// mechanism between layers.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct LayerFragment {
    /// Layer-local stylesheet text (may contain template placeholders).
    #[serde(default)]
    pub css: String,
    /// Layer-local markup text (may contain template placeholders).
    #[serde(default)]
    pub html: String,
}

/// One layer of a renderable asset.
pub trait Layer {
    /// The layer's raw fragment, before template expansion.
    fn as_fragment(&self) -> LayerFragment;
}

impl Layer for LayerFragment {
    fn as_fragment(&self) -> LayerFragment {
        self.clone()
    }
}

/// A tabular data source backing an asset's templates.
pub trait DataSource {
    /// Fetch all rows. This is the one blocking step on the data path.
    fn fetch_rows(&self) -> PlatenResult<Vec<DataRow>>;
}

/// A renderable multi-layer asset, as consumed by the render pipeline.
///
/// Layers are ordered bottom-to-top: index 0 renders visually beneath the
/// last layer.
pub trait Asset {
    /// Snapshot of the asset's layers in ascending z-order.
    fn layers(&self) -> Vec<Box<dyn Layer>>;
    /// Target raster width in device pixels.
    fn width(&self) -> u32;
    /// Target raster height in device pixels.
    fn height(&self) -> u32;
    /// The asset's data source, when it has one.
    fn data(&self) -> Option<&dyn DataSource>;
    /// Helper functions declared on the asset, layered over the built-ins.
    fn helpers(&self) -> BTreeMap<String, HelperFn> {
        BTreeMap::new()
    }
}

/// JSON boundary model for a card design.
///
/// This is the human-edited representation: pixel dimensions, an ordered
/// layer stack of raw template fragments, and optional inline sample data.
/// JSON cards carry no helpers of their own (helpers are code); they get the
/// built-in set. Programmatic [`Asset`] implementations can add more.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct CardDef {
    /// Card width in device pixels.
    pub width: u32,
    /// Card height in device pixels.
    pub height: u32,
    /// Layer fragments in ascending z-order (index 0 is the bottom).
    pub layers: Vec<LayerFragment>,
    /// Inline sample rows; an empty table means the card has no data source.
    #[serde(default)]
    pub data: Vec<DataRow>,
}

impl CardDef {
    /// Parse a card from a JSON reader.
    pub fn from_reader<R: std::io::Read>(r: R) -> PlatenResult<Self> {
        let def: Self = serde_json::from_reader(r)
            .map_err(|e| PlatenError::validation(format!("parse card JSON: {e}")))?;
        Ok(def)
    }

    /// Parse a card from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> PlatenResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            PlatenError::validation(format!("open card JSON '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    /// Validate the card against the structural schema.
    pub fn validate(&self) -> PlatenResult<()> {
        validate_card(self)
            .map_err(|e| PlatenError::validation(format!("card validation failed: {e}")))
    }
}

impl Asset for CardDef {
    fn layers(&self) -> Vec<Box<dyn Layer>> {
        self.layers
            .iter()
            .cloned()
            .map(|l| Box::new(l) as Box<dyn Layer>)
            .collect()
    }

    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn data(&self) -> Option<&dyn DataSource> {
        if self.data.is_empty() {
            None
        } else {
            Some(self)
        }
    }
}

impl DataSource for CardDef {
    fn fetch_rows(&self) -> PlatenResult<Vec<DataRow>> {
        Ok(self.data.clone())
    }
}
