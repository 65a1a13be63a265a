use thiserror::Error;

pub type ParseResult<T> = Result<T, ParseError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("Unterminated tag <{tag}> at {pos}")]
    UnterminatedTag { pos: usize, tag: String },

    #[error("Unbalanced expression at {pos}")]
    UnbalancedExpression { pos: usize },

    #[error("No closing tag for <{tag}> opened at {pos}")]
    MissingClosingTag { pos: usize, tag: String },

    #[error("No markup found in component '{component}'")]
    NoMarkup { component: String },
}

impl ParseError {
    pub fn unterminated_tag(pos: usize, tag: impl Into<String>) -> Self {
        Self::UnterminatedTag {
            pos,
            tag: tag.into(),
        }
    }

    pub fn unbalanced_expression(pos: usize) -> Self {
        Self::UnbalancedExpression { pos }
    }

    pub fn missing_closing_tag(pos: usize, tag: impl Into<String>) -> Self {
        Self::MissingClosingTag {
            pos,
            tag: tag.into(),
        }
    }

    /// Byte offset the error points at, if any
    pub fn position(&self) -> Option<usize> {
        match self {
            ParseError::UnterminatedTag { pos, .. }
            | ParseError::UnbalancedExpression { pos }
            | ParseError::MissingClosingTag { pos, .. } => Some(*pos),
            ParseError::NoMarkup { .. } => None,
        }
    }

    /// Render the error against its source with ariadne
    #[cfg(feature = "pretty-errors")]
    pub fn report(&self, file_name: &str, source: &str) -> String {
        use ariadne::{Label, Report, ReportKind, Source};

        let pos = self.position().unwrap_or(0).min(source.len());
        let end = (pos + 1).min(source.len()).max(pos);
        let mut out = Vec::new();
        let written = Report::build(ReportKind::Error, file_name, pos)
            .with_message(self.to_string())
            .with_label(Label::new((file_name, pos..end)).with_message("here"))
            .finish()
            .write((file_name, Source::from(source)), &mut out);

        match written {
            Ok(()) => String::from_utf8_lossy(&out).into_owned(),
            Err(_) => self.to_string(),
        }
    }
}
