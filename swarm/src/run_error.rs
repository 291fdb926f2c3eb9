use crate::exit_codes::ExitCode;

#[derive(Debug)]
pub enum RunError {
    InvalidInput(anyhow::Error),
    TargetUnreachable(anyhow::Error),
    RuntimeError(anyhow::Error),
}

impl RunError {
    #[must_use]
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Self::InvalidInput(_) => ExitCode::InvalidInput,
            Self::TargetUnreachable(_) => ExitCode::TargetUnreachable,
            Self::RuntimeError(_) => ExitCode::RuntimeError,
        }
    }

    #[must_use]
    pub fn anyhow(&self) -> &anyhow::Error {
        match self {
            Self::InvalidInput(e) | Self::TargetUnreachable(e) | Self::RuntimeError(e) => e,
        }
    }
}

impl From<swarm_core::Error> for RunError {
    fn from(err: swarm_core::Error) -> Self {
        use swarm_core::Error;
        match err {
            Error::TargetUnreachable { .. } => Self::TargetUnreachable(err.into()),
            Error::Io(_) | Error::Json(_) => Self::RuntimeError(err.into()),
            Error::InvalidBaseUrl(_)
            | Error::EmptyPopulation
            | Error::EmptyCohort(_)
            | Error::InvalidCoverage(_)
            | Error::InvalidConcurrency
            | Error::InvalidRetryAttempts
            | Error::InvalidTimeout => Self::InvalidInput(err.into()),
        }
    }
}

impl std::fmt::Display for RunError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#}", self.anyhow())
    }
}

impl std::error::Error for RunError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.anyhow().as_ref())
    }
}
