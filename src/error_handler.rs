use std::collections::BTreeMap;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct ProcessingError {
    pub file_path: Option<PathBuf>,
    pub error_type: ErrorType,
    pub message: String,
    pub recoverable: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorType {
    FileNotFound,
    UnreadableFormat,
    InvalidUseCase,
    OutputError,
    ConfigurationError,
}

/// Decides whether a batch keeps going after a failed file.
pub struct ErrorHandler {
    continue_on_error: bool,
    skip_invalid: bool,
    errors: Vec<ProcessingError>,
    warnings: Vec<String>,
}

impl ErrorHandler {
    pub fn new(continue_on_error: bool, skip_invalid: bool) -> Self {
        Self {
            continue_on_error,
            skip_invalid,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Record `error` and report whether processing should continue.
    pub fn handle_error(&mut self, error: ProcessingError) -> bool {
        match error.error_type {
            ErrorType::FileNotFound | ErrorType::UnreadableFormat | ErrorType::InvalidUseCase => {
                if self.skip_invalid {
                    self.warnings
                        .push(format!("⚠️  Skipped invalid file: {} - {}", error.location(), error.message));
                    true
                } else if self.continue_on_error {
                    eprintln!("❌ Error processing {}: {}", error.location(), error.message);
                    self.errors.push(error);
                    true
                } else {
                    self.errors.push(error);
                    false
                }
            }
            ErrorType::OutputError => {
                if self.continue_on_error {
                    eprintln!("⚠️  Could not write output for {}: {}", error.location(), error.message);
                    self.errors.push(error);
                    true
                } else {
                    self.errors.push(error);
                    false
                }
            }
            // A broken rule table or config affects every file
            ErrorType::ConfigurationError => {
                self.errors.push(error);
                false
            }
        }
    }

    pub fn add_warning(&mut self, message: String) {
        self.warnings.push(message);
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn errors(&self) -> &[ProcessingError] {
        &self.errors
    }

    pub fn get_summary(&self) -> ErrorSummary {
        ErrorSummary {
            total_errors: self.errors.len(),
            total_warnings: self.warnings.len(),
            error_counts: self.error_counts(),
            warnings: self.warnings.clone(),
        }
    }

    fn error_counts(&self) -> BTreeMap<ErrorType, usize> {
        let mut counts = BTreeMap::new();
        for error in &self.errors {
            *counts.entry(error.error_type).or_insert(0) += 1;
        }
        counts
    }

    pub fn print_summary(&self) {
        if !self.has_errors() && !self.has_warnings() {
            return;
        }

        eprintln!("\n📊 Processing Summary");
        eprintln!("===================");

        if self.has_warnings() {
            eprintln!("⚠️  Warnings: {}", self.warnings.len());
            for warning in &self.warnings {
                eprintln!("   {}", warning);
            }
        }

        if self.has_errors() {
            eprintln!("❌ Errors: {}", self.errors.len());
            for (error_type, count) in self.error_counts() {
                eprintln!("   {:?}: {}", error_type, count);
            }
        }
    }
}

#[derive(Debug)]
pub struct ErrorSummary {
    pub total_errors: usize,
    pub total_warnings: usize,
    pub error_counts: BTreeMap<ErrorType, usize>,
    pub warnings: Vec<String>,
}

impl ProcessingError {
    fn location(&self) -> String {
        self.file_path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "unknown".to_string())
    }

    pub fn file_not_found(path: PathBuf) -> Self {
        Self {
            file_path: Some(path),
            error_type: ErrorType::FileNotFound,
            message: "File not found".to_string(),
            recoverable: true,
        }
    }

    pub fn unreadable_format(path: PathBuf, details: String) -> Self {
        Self {
            file_path: Some(path),
            error_type: ErrorType::UnreadableFormat,
            message: format!("Not a use case document: {}", details),
            recoverable: true,
        }
    }

    pub fn invalid_use_case(path: PathBuf, details: String) -> Self {
        Self {
            file_path: Some(path),
            error_type: ErrorType::InvalidUseCase,
            message: format!("Invalid use case: {}", details),
            recoverable: true,
        }
    }

    pub fn output_error(path: PathBuf, details: String) -> Self {
        Self {
            file_path: Some(path),
            error_type: ErrorType::OutputError,
            message: details,
            recoverable: true,
        }
    }

    pub fn config_error(message: String) -> Self {
        Self {
            file_path: None,
            error_type: ErrorType::ConfigurationError,
            message: format!("Configuration error: {}", message),
            recoverable: false,
        }
    }
}
