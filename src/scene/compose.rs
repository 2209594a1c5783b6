use crate::scene::model::Asset;

/// The single document produced by folding an asset's layer fragments.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ComposedDocument {
    /// Concatenated stylesheet text, bottom layer first.
    pub css: String,
    /// Concatenated markup text, bottom layer first.
    pub html: String,
}

/// Fold an asset's layers into one document, painter's-algorithm order.
///
/// Layers are visited in ascending z-order: index 0 contributes first and the
/// topmost layer contributes last in source order, so it visually occludes
/// everything beneath it.
pub fn compose_document(asset: &dyn Asset) -> ComposedDocument {
    let mut doc = ComposedDocument::default();
    for layer in asset.layers() {
        let frag = layer.as_fragment();
        doc.css.push_str(&frag.css);
        doc.html.push_str(&frag.html);
    }
    doc
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::model::{CardDef, LayerFragment};

    fn frag(css: &str, html: &str) -> LayerFragment {
        LayerFragment {
            css: css.to_owned(),
            html: html.to_owned(),
        }
    }

    #[test]
    fn folds_layers_bottom_to_top() {
        let card = CardDef {
            width: 10,
            height: 10,
            layers: vec![
                frag("c0", "<h0/>"),
                frag("c1", "<h1/>"),
                frag("c2", "<h2/>"),
            ],
            data: Vec::new(),
        };

        let doc = compose_document(&card);
        assert_eq!(doc.css, "c0c1c2");
        assert_eq!(doc.html, "<h0/><h1/><h2/>");
    }

    #[test]
    fn empty_stack_composes_empty_document() {
        let card = CardDef {
            width: 10,
            height: 10,
            layers: Vec::new(),
            data: Vec::new(),
        };
        assert_eq!(compose_document(&card), ComposedDocument::default());
    }
}
