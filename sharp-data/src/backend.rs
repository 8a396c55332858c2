use futures::future::BoxFuture;

use crate::error::StudioResult;
use crate::input::PredictRequest;
use crate::prediction::{OutputRootSelection, PredictionResult};

/// The HTTP contract the page controllers talk to.
///
/// [`crate::SharpClient`] is the real implementation; tests plug in scripted
/// backends. Every future is `'static` so callers can hold it across their
/// own state mutations.
pub trait StudioBackend: Send + Sync {
    /// `POST /api/predict`
    fn predict(&self, request: PredictRequest) -> BoxFuture<'static, StudioResult<PredictionResult>>;

    /// `GET /api/output-root`
    fn output_root(&self) -> BoxFuture<'static, StudioResult<String>>;

    /// `POST /api/output-root/select`
    fn select_output_root(&self) -> BoxFuture<'static, StudioResult<OutputRootSelection>>;

    /// `POST /api/output-root/open`
    fn open_output_root(&self) -> BoxFuture<'static, StudioResult<()>>;
}
