use crate::scene::model::CardDef;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SchemaPathElem {
    Field(&'static str),
    Index(usize),
}

#[derive(Debug, Clone)]
pub(crate) struct SchemaError {
    pub(crate) path: Vec<SchemaPathElem>,
    pub(crate) message: String,
}

impl SchemaError {
    fn at(path: &[SchemaPathElem], message: impl Into<String>) -> Self {
        Self {
            path: path.to_vec(),
            message: message.into(),
        }
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            return write!(f, "{}", self.message);
        }
        write!(f, "{}: {}", format_path(&self.path), self.message)
    }
}

fn format_path(path: &[SchemaPathElem]) -> String {
    let mut s = String::from("$");
    for p in path {
        match *p {
            SchemaPathElem::Field(name) => {
                s.push('.');
                s.push_str(name);
            }
            SchemaPathElem::Index(i) => {
                s.push('[');
                s.push_str(&i.to_string());
                s.push(']');
            }
        }
    }
    s
}

#[derive(Debug, Clone)]
pub(crate) struct SchemaErrors {
    pub(crate) errors: Vec<SchemaError>,
}

impl fmt::Display for SchemaErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, e) in self.errors.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{e}")?;
        }
        Ok(())
    }
}

impl std::error::Error for SchemaErrors {}

pub(crate) fn validate_card(def: &CardDef) -> Result<(), SchemaErrors> {
    let mut errors = Vec::new();

    if def.width == 0 {
        errors.push(SchemaError::at(
            &[SchemaPathElem::Field("width")],
            "width must be > 0",
        ));
    }
    if def.height == 0 {
        errors.push(SchemaError::at(
            &[SchemaPathElem::Field("height")],
            "height must be > 0",
        ));
    }

    if def.layers.is_empty() {
        errors.push(SchemaError::at(
            &[SchemaPathElem::Field("layers")],
            "card must declare at least one layer",
        ));
    }
    for (i, layer) in def.layers.iter().enumerate() {
        if layer.css.trim().is_empty() && layer.html.trim().is_empty() {
            errors.push(SchemaError::at(
                &[SchemaPathElem::Field("layers"), SchemaPathElem::Index(i)],
                "layer must carry css or html",
            ));
        }
    }

    // Rows must agree on arity so a fixed column index means the same thing
    // for every row.
    if let Some(first) = def.data.first() {
        let arity = first.len();
        for (i, row) in def.data.iter().enumerate().skip(1) {
            if row.len() != arity {
                errors.push(SchemaError::at(
                    &[SchemaPathElem::Field("data"), SchemaPathElem::Index(i)],
                    format!("row arity {} must match first row arity {arity}", row.len()),
                ));
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(SchemaErrors { errors })
    }
}
