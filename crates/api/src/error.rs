use snafu::Snafu;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ApiError {
    #[snafu(display("failed to build archive http client on `{stage}`: {source}"))]
    BuildClient {
        stage: &'static str,
        source: reqwest::Error,
    },
    #[snafu(display("cookie value is not a valid header on `{stage}`: {source}"))]
    InvalidCookie {
        stage: &'static str,
        source: reqwest::header::InvalidHeaderValue,
    },
    #[snafu(display("request to {endpoint} failed on `{stage}`: {source}"))]
    Request {
        stage: &'static str,
        endpoint: String,
        source: reqwest::Error,
    },
    #[snafu(display("{endpoint} returned status {status}: {body}"))]
    Status {
        stage: &'static str,
        endpoint: String,
        status: u16,
        body: String,
    },
    #[snafu(display("failed to read response body from {endpoint}: {source}"))]
    ReadBody {
        stage: &'static str,
        endpoint: String,
        source: reqwest::Error,
    },
    #[snafu(display("failed to decode response from {endpoint} on `{stage}`: {source}"))]
    Decode {
        stage: &'static str,
        endpoint: String,
        source: serde_json::Error,
    },
    #[snafu(display("nickname is {length} characters, the archive allows at most {limit}"))]
    NicknameTooLong {
        stage: &'static str,
        length: usize,
        limit: usize,
    },
}

pub type ApiResult<T> = Result<T, ApiError>;
