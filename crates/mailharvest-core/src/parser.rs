use crate::date::DateParserChain;
use crate::error::{Error, Result};
use crate::extract::{HeaderExtractor, MboxArchiveExtractor};
use crate::types::ParsedMessage;

/// Every archived document starts with the mbox separator line.
pub const MESSAGE_MARKER: &str = "From ";

/// Split a raw document into its header block and body.
pub fn split_message(text: &str) -> Result<(&str, &str)> {
    if !text.starts_with(MESSAGE_MARKER) {
        return Err(Error::NotAMessage);
    }

    let pos = text.find("\n\n").ok_or(Error::MissingHeaderBreak)?;
    Ok((&text[..pos], &text[pos + 2..]))
}

/// Turns raw archive documents into [`ParsedMessage`]s.
pub struct MessageParser {
    extractor: Box<dyn HeaderExtractor>,
    dates: DateParserChain,
}

impl Default for MessageParser {
    fn default() -> Self {
        Self::new(MboxArchiveExtractor::new(), DateParserChain::default())
    }
}

impl MessageParser {
    pub fn new(extractor: impl HeaderExtractor + 'static, dates: DateParserChain) -> Self {
        Self {
            extractor: Box::new(extractor),
            dates,
        }
    }

    /// Parse a document.
    ///
    /// A missing marker, a missing header/body break, or a `Date:` value no
    /// strategy accepts is an error. Fields that cannot be extracted
    /// unambiguously are `None`.
    pub fn parse(&self, text: &str) -> Result<ParsedMessage> {
        let (headers, body) = split_message(text)?;

        let sent_at = match self.extractor.date_value(headers) {
            Some(value) => Some(self.dates.parse(&value)?),
            None => None,
        };

        Ok(ParsedMessage {
            email: self.extractor.email(headers),
            sent_at,
            subject: self.extractor.subject(headers),
            headers: headers.to_string(),
            body: body.to_string(),
        })
    }
}
