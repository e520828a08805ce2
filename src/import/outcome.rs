use serde::Serialize;

use super::{FileDecodeError, RowError};

/// At most this many row errors are spelled out in the summary messages.
pub const MAX_ERROR_DETAILS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowOutcome {
    Created,
    Updated,
}

#[derive(Debug)]
pub struct RowFailure {
    /// 1-based, counting the header as row 1.
    pub row: usize,
    pub error: RowError,
}

impl std::fmt::Display for RowFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Fila {}: {}", self.row, self.error)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageLevel {
    Success,
    Warning,
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlashMessage {
    pub level: MessageLevel,
    pub text: String,
}

impl FlashMessage {
    fn new(level: MessageLevel, text: impl Into<String>) -> Self {
        Self {
            level,
            text: text.into(),
        }
    }
}

/// Aggregate report of one import run.
#[derive(Debug, Default)]
pub struct ImportOutcome {
    pub created: usize,
    pub updated: usize,
    pub failures: Vec<RowFailure>,
}

impl ImportOutcome {
    pub fn record(&mut self, row: usize, result: Result<RowOutcome, RowError>) {
        match result {
            Ok(RowOutcome::Created) => self.created += 1,
            Ok(RowOutcome::Updated) => self.updated += 1,
            Err(error) => self.failures.push(RowFailure { row, error }),
        }
    }

    pub fn error_count(&self) -> usize {
        self.failures.len()
    }

    /// The first few failures, formatted for display.
    pub fn error_details(&self) -> Vec<String> {
        self.failures
            .iter()
            .take(MAX_ERROR_DETAILS)
            .map(ToString::to_string)
            .collect()
    }

    pub fn hidden_error_count(&self) -> usize {
        self.error_count().saturating_sub(MAX_ERROR_DETAILS)
    }

    pub fn messages(&self) -> Vec<FlashMessage> {
        let mut messages = Vec::new();

        if self.created > 0 || self.updated > 0 {
            messages.push(FlashMessage::new(
                MessageLevel::Success,
                format!(
                    "Import completed: {} created, {} updated",
                    self.created, self.updated
                ),
            ));
        }

        if self.error_count() > 0 {
            messages.push(FlashMessage::new(
                MessageLevel::Warning,
                format!("{} errors found", self.error_count()),
            ));
            messages.extend(
                self.error_details()
                    .into_iter()
                    .map(|detail| FlashMessage::new(MessageLevel::Warning, detail)),
            );
            let hidden = self.hidden_error_count();
            if hidden > 0 {
                messages.push(FlashMessage::new(
                    MessageLevel::Info,
                    format!("{hidden} more errors"),
                ));
            }
        }

        messages
    }
}

#[derive(Debug, Serialize)]
pub struct ImportResponse {
    pub created: usize,
    pub updated: usize,
    pub errors: usize,
    pub messages: Vec<FlashMessage>,
}

impl From<&ImportOutcome> for ImportResponse {
    fn from(outcome: &ImportOutcome) -> Self {
        Self {
            created: outcome.created,
            updated: outcome.updated,
            errors: outcome.error_count(),
            messages: outcome.messages(),
        }
    }
}

impl ImportResponse {
    /// Body for an upload that could not be read at all.
    pub fn file_error(error: &FileDecodeError) -> Self {
        Self {
            created: 0,
            updated: 0,
            errors: 0,
            messages: vec![FlashMessage::new(
                MessageLevel::Error,
                format!("Error processing CSV file: {error}"),
            )],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome_with_errors(n: usize) -> ImportOutcome {
        let mut outcome = ImportOutcome::default();
        outcome.record(2, Ok(RowOutcome::Created));
        for i in 0..n {
            outcome.record(i + 3, Err(RowError::MissingRequiredField("Name")));
        }
        outcome
    }

    #[test]
    fn failure_is_formatted_with_its_row_number() {
        let failure = RowFailure {
            row: 3,
            error: RowError::MissingRequiredField("Name"),
        };
        assert_eq!(failure.to_string(), "Fila 3: Name is required");
    }

    #[test]
    fn clean_run_only_reports_success() {
        let mut outcome = ImportOutcome::default();
        outcome.record(2, Ok(RowOutcome::Created));
        outcome.record(3, Ok(RowOutcome::Updated));

        assert_eq!(
            outcome.messages(),
            vec![FlashMessage::new(
                MessageLevel::Success,
                "Import completed: 1 created, 1 updated"
            )]
        );
    }

    #[test]
    fn empty_run_has_no_messages() {
        assert!(ImportOutcome::default().messages().is_empty());
    }

    #[test]
    fn up_to_three_errors_are_listed_verbatim() {
        let outcome = outcome_with_errors(3);
        let messages = outcome.messages();
        assert_eq!(messages.len(), 5);
        assert_eq!(messages[1].text, "3 errors found");
        assert_eq!(messages[4].text, "Fila 5: Name is required");
        assert!(messages.iter().all(|m| m.level != MessageLevel::Info));
    }

    #[test]
    fn extra_errors_collapse_into_a_count() {
        let outcome = outcome_with_errors(7);
        assert_eq!(outcome.error_details().len(), MAX_ERROR_DETAILS);
        assert_eq!(outcome.hidden_error_count(), 4);

        let messages = outcome.messages();
        let warnings = messages
            .iter()
            .filter(|m| m.level == MessageLevel::Warning)
            .count();
        assert_eq!(warnings, 1 + MAX_ERROR_DETAILS);
        assert_eq!(
            messages.last(),
            Some(&FlashMessage::new(MessageLevel::Info, "4 more errors"))
        );
    }
}
