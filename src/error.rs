//! Error types for loading box documents

use ariadne::{Color, Label, Report, ReportKind, Source};
use thiserror::Error;

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("failed to parse document: {}", .0.message())]
    Parse(#[from] toml::de::Error),

    #[error("invalid document: {message}")]
    Invalid { message: String, span: Option<Span> },
}

impl DocumentError {
    pub(crate) fn invalid(message: impl Into<String>, span: Option<Span>) -> Self {
        DocumentError::Invalid {
            message: message.into(),
            span,
        }
    }

    /// Location of the error in the document source, if known
    pub fn span(&self) -> Option<Span> {
        match self {
            DocumentError::Parse(e) => e.span(),
            DocumentError::Invalid { span, .. } => span.clone(),
        }
    }

    fn message(&self) -> String {
        match self {
            DocumentError::Parse(e) => e.message().to_string(),
            DocumentError::Invalid { message, .. } => message.clone(),
        }
    }

    /// Format the error with source context using ariadne
    pub fn format(&self, source: &str, filename: &str) -> String {
        let Some(span) = self.span() else {
            return format!("Error: {}", self);
        };
        let message = self.message();

        let mut buf = Vec::new();
        let written = Report::build(ReportKind::Error, filename, span.start)
            .with_message(self.to_string())
            .with_label(
                Label::new((filename, span))
                    .with_message(message)
                    .with_color(Color::Red),
            )
            .finish()
            .write((filename, Source::from(source)), &mut buf);

        match written {
            Ok(()) => String::from_utf8_lossy(&buf).into_owned(),
            Err(_) => format!("Error: {}", self),
        }
    }
}
