use thiserror::Error;

#[derive(Debug, Error)]
pub enum VibecraftError {
    #[error("not initialized: run 'vibecraft init'")]
    NotInitialized,

    #[error("Module '{0}' not found")]
    ModuleNotFound(String),

    #[error("Module '{0}' already exists")]
    ModuleExists(String),

    #[error("Module name is invalid: {0}")]
    InvalidModuleName(String),

    #[error("Module '{module}' depends on non-existent module '{dependency}'")]
    MissingDependency { module: String, dependency: String },

    #[error("{0}")]
    CyclicDependency(String),

    #[error("Module path is invalid: {0}")]
    Security(String),

    #[error("invalid configuration: {0}")]
    Configuration(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid phase: {0}")]
    InvalidPhase(String),

    #[error("invalid module status '{0}': expected planned, in_progress, completed or blocked")]
    InvalidStatus(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl VibecraftError {
    /// Missing or cyclic dependency.
    pub fn is_dependency_error(&self) -> bool {
        matches!(
            self,
            VibecraftError::MissingDependency { .. } | VibecraftError::CyclicDependency(_)
        )
    }

    /// Anything module-related, dependency and security errors included.
    pub fn is_module_error(&self) -> bool {
        self.is_dependency_error()
            || matches!(
                self,
                VibecraftError::ModuleNotFound(_)
                    | VibecraftError::ModuleExists(_)
                    | VibecraftError::InvalidModuleName(_)
                    | VibecraftError::Security(_)
            )
    }

    pub fn is_security_error(&self) -> bool {
        matches!(self, VibecraftError::Security(_))
    }
}

pub type Result<T> = std::result::Result<T, VibecraftError>;
