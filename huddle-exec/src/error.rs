use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Language not supported: {0}")]
    UnsupportedLanguage(String),

    #[error("Remote judge error: {0}")]
    Judge(#[from] judge_client::Error),

    #[error("Report delivery failed: {0}")]
    Delivery(String),

    #[error("System error: {0}")]
    System(String),
}
