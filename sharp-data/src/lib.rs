pub mod backend;
pub mod error;
pub mod input;
pub mod prediction;
pub mod preferences;
pub mod sharp_client;

pub use backend::StudioBackend;
pub use error::{StudioError, StudioResult, GENERIC_FAILURE, UNREACHABLE};
pub use input::{Device, InputFile, PredictRequest};
pub use prediction::{
    check_status, error_detail, parse_json_body, parse_predict_response, OutputItem,
    OutputRootPath, OutputRootSelection, PredictionResult,
};
pub use preferences::{default_server_url, Preferences};
pub use sharp_client::{ClientConfig, SharpClient};
