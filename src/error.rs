//! CLI Error Types

use derive_more::{Display, Error};

pub type Error = exn::Exn<ErrorKind>;
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("could not load configuration")]
    Config,
    /// Neither `--repo` nor the configuration names a repository.
    #[display("no repository given; pass --repo or set `repository` in the configuration")]
    NoRepository,
    #[display("repository error")]
    Repository,
    #[display("package error")]
    Package,
    #[display("failed to apply package")]
    Apply,
}
