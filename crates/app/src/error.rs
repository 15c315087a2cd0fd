use dmview_api::ApiError;
use dmview_scroll::ControllerError;
use snafu::Snafu;

use crate::settings::SettingsError;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum CliError {
    #[snafu(display("failed to save settings on `{stage}`: {source}"))]
    Settings {
        stage: &'static str,
        source: SettingsError,
    },

    #[snafu(display("archive request failed on `{stage}`: {source}"))]
    Api {
        stage: &'static str,
        source: ApiError,
    },

    #[snafu(display("message list failed on `{stage}`: {source}"))]
    Controller {
        stage: &'static str,
        source: ControllerError,
    },

    #[snafu(display("invalid argument `{argument}` on `{stage}`: {reason}"))]
    InvalidArgument {
        stage: &'static str,
        argument: &'static str,
        reason: String,
    },
}
