use std::fmt::{Debug, Display};
use std::path::PathBuf;

use arcstr::ArcStr;
use thiserror::Error;

use crate::grid::GridError;
use crate::mos::error::MosError;

pub type Result<T> = std::result::Result<T, LaygenError>;

pub struct LaygenError {
    pub(crate) source: ErrorSource,
    pub(crate) context: Vec<ErrorContext>,
}

impl LaygenError {
    pub fn source(&self) -> &ErrorSource {
        &self.source
    }

    pub fn context(&self) -> &[ErrorContext] {
        &self.context
    }
}

impl std::error::Error for LaygenError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

impl Display for LaygenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Error:\n{}", self.source)?;
        if !self.context.is_empty() {
            writeln!(f, "\nError occurred:")?;
            for item in self.context.iter() {
                writeln!(f, "\twhile {}", item)?;
            }
        }
        Ok(())
    }
}

impl Debug for LaygenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.source)?;
        if !self.context.is_empty() {
            writeln!(f, "\nError occurred:")?;
            for (i, item) in self.context.iter().enumerate() {
                writeln!(f, "\t{}: {:?}", i, item)?;
            }
        }
        Ok(())
    }
}

impl<T> From<T> for LaygenError
where
    T: Into<ErrorSource>,
{
    fn from(value: T) -> Self {
        Self {
            source: value.into(),
            context: Vec::new(),
        }
    }
}

impl LaygenError {
    pub fn new(source: impl Into<ErrorSource>) -> Self {
        Self {
            source: source.into(),
            context: Vec::new(),
        }
    }

    pub fn from_context(source: impl Into<ErrorSource>, ctx: impl Into<ErrorContext>) -> Self {
        Self {
            source: source.into(),
            context: vec![ctx.into()],
        }
    }

    pub fn with_context(mut self, ctx: impl Into<ErrorContext>) -> Self {
        self.context.push(ctx.into());
        self
    }
}

#[inline]
pub fn with_err_context<T, E, C>(result: std::result::Result<T, E>, ctx: C) -> Result<T>
where
    C: FnOnce() -> ErrorContext,
    E: Into<LaygenError>,
{
    result.map_err(|err| err.into().with_context(ctx()))
}

#[derive(Debug, Clone, Eq, PartialEq)]
#[non_exhaustive]
pub enum ErrorContext {
    ReadFile(PathBuf),
    Task(ArcStr),
}

impl Display for ErrorContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use ErrorContext::*;
        match self {
            ReadFile(path) => write!(f, "reading file {path:?}"),
            Task(task) => write!(f, "{task}"),
        }
    }
}

impl From<&'static str> for ErrorContext {
    fn from(value: &'static str) -> Self {
        Self::Task(ArcStr::from(value))
    }
}

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ErrorSource {
    #[error("internal error: {0}")]
    Internal(String),

    #[error("not implemented: {0}")]
    NotImplemented(&'static str),

    #[error("error while generating MOSFET layout: {0}")]
    Mos(#[from] MosError),

    #[error("routing grid error: {0}")]
    Grid(#[from] GridError),

    #[error("invalid arguments: {0}")]
    InvalidArgs(String),

    #[error("invalid technology configuration: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
