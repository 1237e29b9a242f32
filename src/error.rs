use crate::codec::{mdp::MdpError, sbr::SbrError};
use crate::{grism::GrismError, settings::SettingsError, spectra::SpectraError};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Error in the `mdp` codec")]
    Mdp(#[from] MdpError),
    #[error("Error in the `sbr` codec")]
    Sbr(#[from] SbrError),
    #[error("Error in the `grism` module")]
    Grism(#[from] GrismError),
    #[error("Error in the `settings` module")]
    Settings(#[from] SettingsError),
    #[error("Error in the `spectra` module")]
    Spectra(#[from] SpectraError),
}
