//! Error taxonomy for the integration bridge (spec §7).

#[derive(Debug, thiserror::Error)]
pub enum EndpointError {
    #[error("gPTP provider error: {0}")]
    Gptp(#[from] gptp::GptpError),

    #[error("AVDECC provider error: {0}")]
    Avdecc(#[from] avdecc::AvdeccError),

    #[error("Milan profile error: {0}")]
    Milan(#[from] milan::MilanError),

    #[error("wire codec error: {0}")]
    Wire(#[from] tsn_types::WireError),

    /// Registration happened out of the fixed order (spec §4.11:
    /// "providers first, then Milan entity initialization, then start").
    #[error("providers and the Milan entity must be registered before start()")]
    StartedBeforeRegistration,

    #[error("no provider registered for slot {0:?}")]
    ProviderNotRegistered(&'static str),
}

pub type Result<T> = std::result::Result<T, EndpointError>;
