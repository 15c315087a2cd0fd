use dmview_api::ApiError;
use snafu::Snafu;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ControllerError {
    #[snafu(display("message page failed to load at {stage}: {source}"))]
    Fetch {
        stage: &'static str,
        source: ApiError,
    },
}

pub type ControllerResult<T> = Result<T, ControllerError>;
