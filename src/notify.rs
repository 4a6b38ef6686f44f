use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    /// Terminal failures, rendered as destructive toasts
    Error,
}

/// A dismissible, user facing message
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub severity: Severity,
}

impl Notification {
    pub fn info(title: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            description: None,
            severity: Severity::Info,
        }
    }

    pub fn error(title: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            ..Self::info(title)
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}
