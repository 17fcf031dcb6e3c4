use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success,
    Failure,
    Usage,
    Io,
    Parse,
    Validation,
    Output,
}

/// How failures are mapped onto process exit codes.
///
/// `Collapsed` is the compatible default: every failure exits 1.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExitCodeStyle {
    #[default]
    Collapsed,
    Detailed,
}

impl ExitCode {
    pub const fn as_i32(self, style: ExitCodeStyle) -> i32 {
        match (self, style) {
            (ExitCode::Success, _) => 0,
            (_, ExitCodeStyle::Collapsed) => 1,
            (ExitCode::Failure, ExitCodeStyle::Detailed) => 1,
            (ExitCode::Usage, ExitCodeStyle::Detailed) => 2,
            (ExitCode::Io, ExitCodeStyle::Detailed) => 3,
            (ExitCode::Parse, ExitCodeStyle::Detailed) => 4,
            (ExitCode::Validation, ExitCodeStyle::Detailed) => 5,
            (ExitCode::Output, ExitCodeStyle::Detailed) => 6,
        }
    }
}

#[derive(Debug)]
pub struct ExitError {
    pub code: ExitCode,
    pub style: ExitCodeStyle,
    pub err: anyhow::Error,
}

impl ExitError {
    pub fn new(code: ExitCode, err: anyhow::Error) -> Self {
        Self {
            code,
            style: ExitCodeStyle::default(),
            err,
        }
    }
}

impl fmt::Display for ExitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.err.fmt(f)
    }
}

impl std::error::Error for ExitError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.err.source()
    }
}

pub fn exit_code(err: &anyhow::Error) -> i32 {
    if let Some(exit) = err.downcast_ref::<ExitError>() {
        return exit.code.as_i32(exit.style);
    }
    ExitCode::Failure.as_i32(ExitCodeStyle::Collapsed)
}

/// Stamps the exit code style onto `err`, tagging it as a generic failure if
/// nothing below classified it.
pub fn with_style(err: anyhow::Error, style: ExitCodeStyle) -> anyhow::Error {
    match err.downcast::<ExitError>() {
        Ok(mut exit) => {
            exit.style = style;
            exit.into()
        }
        Err(err) => {
            let mut exit = ExitError::new(ExitCode::Failure, err);
            exit.style = style;
            exit.into()
        }
    }
}

pub fn code_of(err: &anyhow::Error) -> ExitCode {
    err.downcast_ref::<ExitError>()
        .map(|exit| exit.code)
        .unwrap_or(ExitCode::Failure)
}

pub fn usage(message: impl Into<String>) -> anyhow::Error {
    ExitError::new(ExitCode::Usage, anyhow::anyhow!(message.into())).into()
}

pub fn usage_err(err: anyhow::Error) -> anyhow::Error {
    ExitError::new(ExitCode::Usage, err).into()
}

pub fn io_err(err: anyhow::Error) -> anyhow::Error {
    ExitError::new(ExitCode::Io, err).into()
}

pub fn parse_err(err: anyhow::Error) -> anyhow::Error {
    ExitError::new(ExitCode::Parse, err).into()
}

pub fn validation(message: impl Into<String>) -> anyhow::Error {
    ExitError::new(ExitCode::Validation, anyhow::anyhow!(message.into())).into()
}

pub fn output_err(err: anyhow::Error) -> anyhow::Error {
    ExitError::new(ExitCode::Output, err).into()
}
