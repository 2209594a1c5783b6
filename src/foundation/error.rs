/// Crate-wide result alias.
pub type PlatenResult<T> = Result<T, PlatenError>;

/// Error type for all fallible platen operations.
#[derive(thiserror::Error, Debug)]
pub enum PlatenError {
    /// A boundary object (card definition, wire payload) failed structural validation.
    #[error("validation error: {0}")]
    Validation(String),

    /// A template failed to compile or evaluate.
    #[error("template error: {0}")]
    Template(String),

    /// The render channel misbehaved: closed peer, timed-out round trip, poisoned client.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The rendering surface could not produce pixels.
    #[error("raster error: {0}")]
    Raster(String),

    /// Anything else, preserved with its source chain.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PlatenError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn template(msg: impl Into<String>) -> Self {
        Self::Template(msg.into())
    }

    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol(msg.into())
    }

    pub fn raster(msg: impl Into<String>) -> Self {
        Self::Raster(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(
            PlatenError::validation("x")
                .to_string()
                .contains("validation error:")
        );
        assert!(
            PlatenError::template("x")
                .to_string()
                .contains("template error:")
        );
        assert!(
            PlatenError::protocol("x")
                .to_string()
                .contains("protocol error:")
        );
        assert!(PlatenError::raster("x").to_string().contains("raster error:"));
    }

    #[test]
    fn other_preserves_source() {
        let base = std::io::Error::other("boom");
        let err = PlatenError::Other(anyhow::Error::new(base));
        assert!(err.to_string().contains("boom"));
    }
}
