use derive_more::{Display, Error};
use std::path::PathBuf;

pub type Error = exn::Exn<ErrorKind>;
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("invalid configuration")]
    Config,
    #[display("could not describe database: {}", _0.display())]
    Describe(#[error(not(source))] PathBuf),
    #[display("could not load hash databases")]
    Load,
    #[display("{_0} file(s) could not be checked")]
    Check(#[error(not(source))] usize),
    #[display("could not write output")]
    Output,
}
