use async_trait::async_trait;
use tonic::{
    Request,
    codegen::http::Uri,
    transport::{Channel, Endpoint},
};

use squall_model::AppKey;

use crate::error::AppError;
use crate::proto::{
    DescribeRequest, DescribeResponse, ExecuteResourceOperationRequest,
    ExecuteResourceOperationResponse, HealthCheckRequest, HealthCheckResponse,
    ListResourcesRequest, ListResourcesResponse, app_service_client::AppServiceClient,
};

/// RPC surface of one App version.
///
/// Implementations hold no per-call state, so one instance may serve the poll and
/// health loops concurrently.
#[async_trait]
pub trait AppClient: Send + Sync + 'static {
    async fn describe(&self) -> Result<DescribeResponse, AppError>;

    async fn execute_resource_operation(
        &self,
        request: ExecuteResourceOperationRequest,
    ) -> Result<ExecuteResourceOperationResponse, AppError>;

    async fn list_resources(
        &self,
        request: ListResourcesRequest,
    ) -> Result<ListResourcesResponse, AppError>;

    async fn health_check(
        &self,
        request: HealthCheckRequest,
    ) -> Result<HealthCheckResponse, AppError>;
}

/// gRPC client bound to `http://localhost:<port>/<app_id>-<version>`.
#[derive(Clone, Debug)]
pub struct GrpcAppClient {
    inner: AppServiceClient<Channel>,
    origin: String,
}

impl GrpcAppClient {
    /// Build a lazily connecting client; no I/O happens until the first call.
    pub fn new(port: u16, key: &AppKey) -> Result<Self, AppError> {
        let base = format!("http://localhost:{port}");
        let origin = format!("{base}/{}", key.path_segment());

        let channel = Endpoint::from_shared(base)
            .map_err(|e| AppError::InvalidEndpoint(e.to_string()))?
            .connect_lazy();
        let origin_uri: Uri = origin
            .parse()
            .map_err(|e: tonic::codegen::http::uri::InvalidUri| {
                AppError::InvalidEndpoint(format!("{origin}: {e}"))
            })?;

        Ok(Self {
            inner: AppServiceClient::with_origin(channel, origin_uri),
            origin,
        })
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }
}

#[async_trait]
impl AppClient for GrpcAppClient {
    async fn describe(&self) -> Result<DescribeResponse, AppError> {
        let mut client = self.inner.clone();
        let response = client.describe(Request::new(DescribeRequest {})).await?;
        Ok(response.into_inner())
    }

    async fn execute_resource_operation(
        &self,
        request: ExecuteResourceOperationRequest,
    ) -> Result<ExecuteResourceOperationResponse, AppError> {
        let mut client = self.inner.clone();
        let response = client
            .execute_resource_operation(Request::new(request))
            .await?;
        Ok(response.into_inner())
    }

    async fn list_resources(
        &self,
        request: ListResourcesRequest,
    ) -> Result<ListResourcesResponse, AppError> {
        let mut client = self.inner.clone();
        let response = client.list_resources(Request::new(request)).await?;
        Ok(response.into_inner())
    }

    async fn health_check(
        &self,
        request: HealthCheckRequest,
    ) -> Result<HealthCheckResponse, AppError> {
        let mut client = self.inner.clone();
        let response = client.health_check(Request::new(request)).await?;
        Ok(response.into_inner())
    }
}
