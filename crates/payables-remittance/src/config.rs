//! Configuration for remittance export.

/// Company and bank identification written to the remittance header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemittanceConfig {
    /// Paying company name.
    pub company_name: String,
    /// Paying company tax document. Punctuation is ignored on export.
    pub company_document: String,
    /// Bank code, up to three digits.
    pub bank_code: String,
    /// File sequence number, incremented by the caller for every file sent.
    pub file_sequence: u32,
}

impl Default for RemittanceConfig {
    fn default() -> Self {
        Self {
            company_name: String::new(),
            company_document: String::new(),
            bank_code: "000".to_string(),
            file_sequence: 1,
        }
    }
}

impl RemittanceConfig {
    /// Start building a config.
    #[must_use]
    pub fn builder() -> RemittanceConfigBuilder {
        RemittanceConfigBuilder::new()
    }
}

/// Builder for [`RemittanceConfig`].
#[derive(Debug, Clone, Default)]
pub struct RemittanceConfigBuilder {
    config: RemittanceConfig,
}

impl RemittanceConfigBuilder {
    /// Create a builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the company name.
    #[must_use]
    pub fn company_name(mut self, name: impl Into<String>) -> Self {
        self.config.company_name = name.into();
        self
    }

    /// Set the company document.
    #[must_use]
    pub fn company_document(mut self, document: impl Into<String>) -> Self {
        self.config.company_document = document.into();
        self
    }

    /// Set the bank code.
    #[must_use]
    pub fn bank_code(mut self, code: impl Into<String>) -> Self {
        self.config.bank_code = code.into();
        self
    }

    /// Set the file sequence number.
    #[must_use]
    pub fn file_sequence(mut self, sequence: u32) -> Self {
        self.config.file_sequence = sequence;
        self
    }

    /// Build the config.
    #[must_use]
    pub fn build(self) -> RemittanceConfig {
        self.config
    }
}
